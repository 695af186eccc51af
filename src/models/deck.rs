//! Deck model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeckId, EntityId, OwnerId};

/// A named loadout owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub owner_id: OwnerId,
    pub name: String,

    /// Deck type (main/extra split, format, etc.)
    #[serde(default)]
    pub deck_type: String,

    #[serde(default)]
    pub archetype: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    /// Create a deck from user input with a fresh id.
    pub fn new(owner_id: OwnerId, input: NewDeck) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::random(),
            owner_id,
            name: input.name.trim().to_string(),
            deck_type: input.deck_type,
            archetype: input.archetype,
            tags: normalize_tags(input.tags),
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Drop blank tags and surrounding whitespace.
pub fn normalize_tags<I>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = String>,
{
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Input for registering a deck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDeck {
    pub name: String,
    #[serde(default)]
    pub deck_type: String,
    #[serde(default)]
    pub archetype: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl NewDeck {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("deck name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Partial deck update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckUpdate {
    pub name: Option<String>,
    pub deck_type: Option<String>,
    pub archetype: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl DeckUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err("deck name must not be empty".to_string());
        }
        Ok(())
    }

    /// Apply to a deck and bump `updated_at`.
    pub fn apply(self, deck: &mut Deck) {
        if let Some(v) = self.name {
            deck.name = v.trim().to_string();
        }
        if let Some(v) = self.deck_type {
            deck.deck_type = v;
        }
        if let Some(v) = self.archetype {
            deck.archetype = v;
        }
        if let Some(v) = self.tags {
            deck.tags = normalize_tags(v);
        }
        if let Some(v) = self.notes {
            deck.notes = v;
        }
        deck.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_creation_normalizes_tags() {
        let deck = Deck::new(
            "owner".into(),
            NewDeck {
                name: "  Blue-Eyes  ".to_string(),
                tags: vec![" dragon ".to_string(), "".to_string(), "dragon".to_string()],
                ..Default::default()
            },
        );

        assert_eq!(deck.name, "Blue-Eyes");
        assert_eq!(deck.tags.len(), 1);
        assert!(deck.tags.contains("dragon"));
        assert_eq!(deck.created_at, deck.updated_at);
    }

    #[test]
    fn test_new_deck_requires_name() {
        assert!(NewDeck::default().validate().is_err());
        let ok = NewDeck {
            name: "Sky Striker".to_string(),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_deck_update_bumps_timestamp() {
        let mut deck = Deck::new(
            "owner".into(),
            NewDeck {
                name: "Old".to_string(),
                ..Default::default()
            },
        );
        let created = deck.created_at;

        DeckUpdate {
            name: Some("New".to_string()),
            ..Default::default()
        }
        .apply(&mut deck);

        assert_eq!(deck.name, "New");
        assert_eq!(deck.created_at, created);
        assert!(deck.updated_at >= created);
    }

    #[test]
    fn test_deck_deserializes_with_missing_optional_fields() {
        let json = r#"{"id":"d","owner_id":"o","name":"N",
            "created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z"}"#;
        let deck: Deck = serde_json::from_str(json).unwrap();
        assert!(deck.tags.is_empty());
        assert_eq!(deck.archetype, "");
    }
}
