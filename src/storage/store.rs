//! Owner-partitioned CRUD over decks, duels and events.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    list_owners, EntityType, JsonlContents, JsonlReader, JsonlWriter, StorageConfig, StorageError,
};
use crate::models::{
    Deck, DeckId, DeckUpdate, DuelId, DuelRecord, DuelRow, DuelUpdate, Event, EventId, NewDeck,
    NewDuel, NewEvent, OwnerId,
};

/// Record store capability.
///
/// Implementors provide the primitive operations; the lookups and the
/// event-assignment rules for new duels are shared default methods.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Owners that have any stored data.
    async fn list_owners(&self) -> Result<Vec<OwnerId>, StorageError>;

    /// All decks of an owner, sorted by name.
    async fn list_decks(&self, owner: &OwnerId) -> Result<Vec<Deck>, StorageError>;

    async fn insert_deck(&self, owner: &OwnerId, deck: Deck) -> Result<Deck, StorageError>;

    async fn update_deck(
        &self,
        owner: &OwnerId,
        id: &DeckId,
        update: DeckUpdate,
    ) -> Result<Deck, StorageError>;

    /// Delete a deck. Duels that reference it are kept.
    async fn delete_deck(&self, owner: &OwnerId, id: &DeckId) -> Result<(), StorageError>;

    /// Raw duel rows, including legacy rows without an event.
    async fn list_duel_rows(&self, owner: &OwnerId) -> Result<Vec<DuelRow>, StorageError>;

    async fn insert_duel(
        &self,
        owner: &OwnerId,
        duel: DuelRecord,
    ) -> Result<DuelRecord, StorageError>;

    async fn update_duel(
        &self,
        owner: &OwnerId,
        id: &DuelId,
        update: DuelUpdate,
    ) -> Result<DuelRecord, StorageError>;

    async fn delete_duel(&self, owner: &OwnerId, id: &DuelId) -> Result<(), StorageError>;

    /// Set the event of the given duels. Returns how many rows changed.
    async fn assign_event(
        &self,
        owner: &OwnerId,
        duel_ids: &[DuelId],
        event_id: &EventId,
    ) -> Result<usize, StorageError>;

    /// All events of an owner, newest start first.
    async fn list_events(&self, owner: &OwnerId) -> Result<Vec<Event>, StorageError>;

    /// Insert an event.
    ///
    /// Inserting an active event deactivates every other event. Inserting
    /// an id that already exists returns the stored event unchanged.
    async fn insert_event(&self, owner: &OwnerId, event: Event) -> Result<Event, StorageError>;

    /// Make one event the only active event.
    async fn activate_event(&self, owner: &OwnerId, id: &EventId) -> Result<Event, StorageError>;

    /// Deactivate an event and stamp its end date.
    async fn end_event(&self, owner: &OwnerId, id: &EventId) -> Result<Event, StorageError>;

    async fn get_deck(&self, owner: &OwnerId, id: &DeckId) -> Result<Deck, StorageError> {
        self.list_decks(owner)
            .await?
            .into_iter()
            .find(|d| &d.id == id)
            .ok_or_else(|| StorageError::not_found("deck", id))
    }

    async fn add_deck(&self, owner: &OwnerId, input: NewDeck) -> Result<Deck, StorageError> {
        input.validate().map_err(StorageError::InvalidInput)?;
        self.insert_deck(owner, Deck::new(owner.clone(), input)).await
    }

    /// Duels carrying an event, newest first. Legacy rows are skipped.
    async fn list_duels(&self, owner: &OwnerId) -> Result<Vec<DuelRecord>, StorageError> {
        let rows = self.list_duel_rows(owner).await?;
        let total = rows.len();
        let mut records: Vec<DuelRecord> =
            rows.into_iter().filter_map(DuelRow::into_record).collect();

        let skipped = total - records.len();
        if skipped > 0 {
            warn!(
                "Skipping {} duel(s) without an event for owner {}; run the migration",
                skipped, owner
            );
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn list_deck_duels(
        &self,
        owner: &OwnerId,
        deck_id: &DeckId,
    ) -> Result<Vec<DuelRecord>, StorageError> {
        let mut duels = self.list_duels(owner).await?;
        duels.retain(|d| &d.own_deck_id == deck_id);
        Ok(duels)
    }

    async fn list_event_duels(
        &self,
        owner: &OwnerId,
        event_id: &EventId,
    ) -> Result<Vec<DuelRecord>, StorageError> {
        let mut duels = self.list_duels(owner).await?;
        duels.retain(|d| &d.event_id == event_id);
        Ok(duels)
    }

    async fn get_duel(&self, owner: &OwnerId, id: &DuelId) -> Result<DuelRecord, StorageError> {
        self.list_duels(owner)
            .await?
            .into_iter()
            .find(|d| &d.id == id)
            .ok_or_else(|| StorageError::not_found("duel", id))
    }

    /// Log a duel.
    ///
    /// Without an explicit event the duel goes to the active event, or to
    /// the default event when none is active.
    async fn add_duel(&self, owner: &OwnerId, input: NewDuel) -> Result<DuelRecord, StorageError> {
        input.validate().map_err(StorageError::InvalidInput)?;

        let event_id = match input.event_id {
            Some(id) => self.get_event(owner, &id).await?.id,
            None => match self.get_active_event(owner).await? {
                Some(active) => active.id,
                None => self.get_or_create_default_event(owner).await?.id,
            },
        };

        let mut record = DuelRecord::new(
            owner.clone(),
            event_id,
            input.own_deck_id,
            input.opponent_deck_name,
            input.turn_order,
            input.result,
        )
        .with_notes(input.notes);
        record.opponent_deck_id = input.opponent_deck_id;
        if let Some(ts) = input.timestamp {
            record.timestamp = ts;
        }

        self.insert_duel(owner, record).await
    }

    async fn get_event(&self, owner: &OwnerId, id: &EventId) -> Result<Event, StorageError> {
        self.list_events(owner)
            .await?
            .into_iter()
            .find(|e| &e.id == id)
            .ok_or_else(|| StorageError::not_found("event", id))
    }

    async fn get_active_event(&self, owner: &OwnerId) -> Result<Option<Event>, StorageError> {
        Ok(self
            .list_events(owner)
            .await?
            .into_iter()
            .find(|e| e.is_active))
    }

    /// Start a new event; it becomes the only active one.
    async fn create_event(&self, owner: &OwnerId, input: NewEvent) -> Result<Event, StorageError> {
        input.validate().map_err(StorageError::InvalidInput)?;
        let event = Event::new(
            owner.clone(),
            input.name.trim().to_string(),
            input.description,
        );
        self.insert_event(owner, event).await
    }

    /// The owner's default event, created on first use.
    ///
    /// A freshly created default event is active only if no other event is.
    async fn get_or_create_default_event(&self, owner: &OwnerId) -> Result<Event, StorageError> {
        let events = self.list_events(owner).await?;
        if let Some(existing) = events.iter().find(|e| e.is_default) {
            return Ok(existing.clone());
        }

        let any_active = events.iter().any(|e| e.is_active);
        let event = Event::default_for(owner.clone()).with_active(!any_active);
        info!("Creating default event {} for owner {}", event.id, owner);
        self.insert_event(owner, event).await
    }
}

/// `RecordStore` backed by per-owner JSONL files.
pub struct JsonlStore {
    config: StorageConfig,
    lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    fn read<T: DeserializeOwned>(
        &self,
        entity: EntityType,
        owner: &OwnerId,
    ) -> Result<Vec<T>, StorageError> {
        JsonlReader::for_owner(&self.config, entity, owner)?.read_all()
    }

    /// Read for a rewrite. Unparsable lines are kept for `save`.
    fn load<T: DeserializeOwned>(
        &self,
        entity: EntityType,
        owner: &OwnerId,
    ) -> Result<JsonlContents<T>, StorageError> {
        let contents = JsonlReader::for_owner(&self.config, entity, owner)?.read_contents()?;
        if !contents.unparsed.is_empty() {
            warn!(
                "Keeping {} unparsable {} line(s) for owner {}",
                contents.unparsed.len(),
                entity.filename(),
                owner
            );
        }
        Ok(contents)
    }

    fn save<T: Serialize>(
        &self,
        entity: EntityType,
        owner: &OwnerId,
        contents: &JsonlContents<T>,
    ) -> Result<(), StorageError> {
        JsonlWriter::for_owner(&self.config, entity, owner)?.rewrite(contents)?;
        Ok(())
    }

    fn append<T: Serialize>(
        &self,
        entity: EntityType,
        owner: &OwnerId,
        item: &T,
    ) -> Result<(), StorageError> {
        JsonlWriter::for_owner(&self.config, entity, owner)?.append(item)
    }
}

#[async_trait]
impl RecordStore for JsonlStore {
    async fn list_owners(&self) -> Result<Vec<OwnerId>, StorageError> {
        let _guard = self.lock.lock().await;
        list_owners(&self.config)
    }

    async fn list_decks(&self, owner: &OwnerId) -> Result<Vec<Deck>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut decks: Vec<Deck> = self.read(EntityType::Deck, owner)?;
        decks.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(decks)
    }

    async fn insert_deck(&self, owner: &OwnerId, deck: Deck) -> Result<Deck, StorageError> {
        let _guard = self.lock.lock().await;
        self.append(EntityType::Deck, owner, &deck)?;
        debug!("Added deck {} for owner {}", deck.id, owner);
        Ok(deck)
    }

    async fn update_deck(
        &self,
        owner: &OwnerId,
        id: &DeckId,
        update: DeckUpdate,
    ) -> Result<Deck, StorageError> {
        update.validate().map_err(StorageError::InvalidInput)?;

        let _guard = self.lock.lock().await;
        let mut decks: JsonlContents<Deck> = self.load(EntityType::Deck, owner)?;
        let deck = decks
            .entities
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| StorageError::not_found("deck", id))?;
        update.apply(deck);
        let updated = deck.clone();

        self.save(EntityType::Deck, owner, &decks)?;
        Ok(updated)
    }

    async fn delete_deck(&self, owner: &OwnerId, id: &DeckId) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut decks: JsonlContents<Deck> = self.load(EntityType::Deck, owner)?;
        let before = decks.entities.len();
        decks.entities.retain(|d| &d.id != id);
        if decks.entities.len() == before {
            return Err(StorageError::not_found("deck", id));
        }

        self.save(EntityType::Deck, owner, &decks)?;
        info!("Deleted deck {} for owner {}", id, owner);
        Ok(())
    }

    async fn list_duel_rows(&self, owner: &OwnerId) -> Result<Vec<DuelRow>, StorageError> {
        let _guard = self.lock.lock().await;
        self.read(EntityType::Duel, owner)
    }

    async fn insert_duel(
        &self,
        owner: &OwnerId,
        duel: DuelRecord,
    ) -> Result<DuelRecord, StorageError> {
        let _guard = self.lock.lock().await;
        self.append(EntityType::Duel, owner, &DuelRow::from(duel.clone()))?;
        debug!("Logged duel {} for owner {}", duel.id, owner);
        Ok(duel)
    }

    async fn update_duel(
        &self,
        owner: &OwnerId,
        id: &DuelId,
        update: DuelUpdate,
    ) -> Result<DuelRecord, StorageError> {
        update.validate().map_err(StorageError::InvalidInput)?;

        let _guard = self.lock.lock().await;
        if let Some(event_id) = &update.event_id {
            let events: Vec<Event> = self.read(EntityType::Event, owner)?;
            if !events.iter().any(|e| &e.id == event_id) {
                return Err(StorageError::not_found("event", event_id));
            }
        }

        let mut rows: JsonlContents<DuelRow> = self.load(EntityType::Duel, owner)?;
        let row = rows
            .entities
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StorageError::not_found("duel", id))?;
        update.apply(row);
        let record = row.clone().into_record().ok_or_else(|| {
            StorageError::InvalidInput(format!("duel {} has no event; run the migration", id))
        })?;

        self.save(EntityType::Duel, owner, &rows)?;
        Ok(record)
    }

    async fn delete_duel(&self, owner: &OwnerId, id: &DuelId) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut rows: JsonlContents<DuelRow> = self.load(EntityType::Duel, owner)?;
        let before = rows.entities.len();
        rows.entities.retain(|r| &r.id != id);
        if rows.entities.len() == before {
            return Err(StorageError::not_found("duel", id));
        }

        self.save(EntityType::Duel, owner, &rows)?;
        debug!("Deleted duel {} for owner {}", id, owner);
        Ok(())
    }

    async fn assign_event(
        &self,
        owner: &OwnerId,
        duel_ids: &[DuelId],
        event_id: &EventId,
    ) -> Result<usize, StorageError> {
        if duel_ids.is_empty() {
            return Ok(0);
        }

        let _guard = self.lock.lock().await;
        let wanted: HashSet<&DuelId> = duel_ids.iter().collect();
        let mut rows: JsonlContents<DuelRow> = self.load(EntityType::Duel, owner)?;
        let mut changed = 0;
        for row in rows.entities.iter_mut().filter(|r| wanted.contains(&r.id)) {
            if row.event_id.as_ref() != Some(event_id) {
                row.event_id = Some(event_id.clone());
                changed += 1;
            }
        }

        if changed > 0 {
            self.save(EntityType::Duel, owner, &rows)?;
        }
        Ok(changed)
    }

    async fn list_events(&self, owner: &OwnerId) -> Result<Vec<Event>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut events: Vec<Event> = self.read(EntityType::Event, owner)?;
        events.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(events)
    }

    async fn insert_event(&self, owner: &OwnerId, event: Event) -> Result<Event, StorageError> {
        let _guard = self.lock.lock().await;
        let mut events: JsonlContents<Event> = self.load(EntityType::Event, owner)?;
        if let Some(existing) = events.entities.iter().find(|e| e.id == event.id) {
            return Ok(existing.clone());
        }

        if event.is_active {
            for other in events.entities.iter_mut() {
                other.set_active(false);
            }
        }
        events.entities.push(event.clone());

        self.save(EntityType::Event, owner, &events)?;
        info!("Created event '{}' ({}) for owner {}", event.name, event.id, owner);
        Ok(event)
    }

    async fn activate_event(&self, owner: &OwnerId, id: &EventId) -> Result<Event, StorageError> {
        let _guard = self.lock.lock().await;
        let mut events: JsonlContents<Event> = self.load(EntityType::Event, owner)?;
        if !events.entities.iter().any(|e| &e.id == id) {
            return Err(StorageError::not_found("event", id));
        }

        let mut activated = None;
        for event in events.entities.iter_mut() {
            let is_target = &event.id == id;
            event.set_active(is_target);
            if is_target {
                activated = Some(event.clone());
            }
        }

        self.save(EntityType::Event, owner, &events)?;
        activated.ok_or_else(|| StorageError::not_found("event", id))
    }

    async fn end_event(&self, owner: &OwnerId, id: &EventId) -> Result<Event, StorageError> {
        let _guard = self.lock.lock().await;
        let mut events: JsonlContents<Event> = self.load(EntityType::Event, owner)?;
        let event = events
            .entities
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| StorageError::not_found("event", id))?;
        event.end(Utc::now());
        let ended = event.clone();

        self.save(EntityType::Event, owner, &events)?;
        info!("Ended event '{}' for owner {}", ended.name, owner);
        Ok(ended)
    }
}
