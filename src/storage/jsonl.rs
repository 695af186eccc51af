//! JSONL (JSON Lines) storage.
//!
//! Each line is a valid JSON object representing one entity.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{StorageConfig, StorageError};
use crate::models::OwnerId;

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Deck,
    Duel,
    Event,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Deck => "decks.jsonl",
            EntityType::Duel => "duels.jsonl",
            EntityType::Event => "events.jsonl",
        }
    }
}

/// Get the path for an owner's entity file.
pub fn entity_path(
    config: &StorageConfig,
    entity: EntityType,
    owner: &OwnerId,
) -> Result<PathBuf, StorageError> {
    Ok(config.owner_dir(owner)?.join(entity.filename()))
}

/// Contents of a JSONL file: the lines that parsed, and the ones that did not.
#[derive(Debug, Clone)]
pub struct JsonlContents<T> {
    pub entities: Vec<T>,

    /// Raw lines that failed to parse, kept so rewrites carry them through
    pub unparsed: Vec<String>,
}

impl<T> Default for JsonlContents<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            unparsed: Vec::new(),
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for a specific entity type and owner.
    pub fn for_owner(
        config: &StorageConfig,
        entity: EntityType,
        owner: &OwnerId,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(entity_path(config, entity, owner)?))
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single entity to the file.
    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(entity)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        debug!("Appended entity to {:?}", self.path);
        Ok(())
    }

    /// Write entities, replacing the entire file.
    ///
    /// Writes to a sibling temp file first and renames it into place so a
    /// crash never leaves a truncated file behind.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.write_lines(entities, &[])
    }

    /// Rewrite the file from previously read contents.
    ///
    /// Lines that failed to parse on read are written back unchanged after
    /// the entities.
    pub fn rewrite(&self, contents: &JsonlContents<T>) -> Result<usize, StorageError> {
        self.write_lines(&contents.entities, &contents.unparsed)
    }

    fn write_lines(&self, entities: &[T], raw: &[String]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let tmp_path = self.path.with_extension("jsonl.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }
        for line in raw {
            writeln!(writer, "{}", line)?;
        }

        writer.flush()?;
        drop(writer);
        fs::rename(&tmp_path, &self.path)?;
        debug!("Wrote {} entities to {:?}", count, self.path);

        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for a specific entity type and owner.
    pub fn for_owner(
        config: &StorageConfig,
        entity: EntityType,
        owner: &OwnerId,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(entity_path(config, entity, owner)?))
    }

    /// Read all entities from the file.
    ///
    /// Malformed lines are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        Ok(self.read_contents()?.entities)
    }

    /// Read the file, keeping malformed lines aside instead of dropping them.
    pub fn read_contents(&self) -> Result<JsonlContents<T>, StorageError> {
        if !self.path.exists() {
            return Ok(JsonlContents::default());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();
        let mut unparsed = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        idx + 1,
                        self.path,
                        e
                    );
                    unparsed.push(line);
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(JsonlContents { entities, unparsed })
    }
}

/// Find all owners with a partition directory.
pub fn list_owners(config: &StorageConfig) -> Result<Vec<OwnerId>, StorageError> {
    let dir = config.users_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut owners = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                owners.push(OwnerId::from(name));
            }
        }
    }

    owners.sort();
    Ok(owners)
}
