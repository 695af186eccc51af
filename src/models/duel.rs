//! Duel record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeckId, DuelId, EntityId, EventId, OwnerId};

/// Whether the owner acted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnOrder {
    First,
    Second,
}

impl std::fmt::Display for TurnOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnOrder::First => write!(f, "first"),
            TurnOrder::Second => write!(f, "second"),
        }
    }
}

/// Outcome of a duel from the owner's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelResult {
    Win,
    Lose,
}

impl DuelResult {
    pub fn is_win(&self) -> bool {
        matches!(self, DuelResult::Win)
    }
}

impl std::fmt::Display for DuelResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuelResult::Win => write!(f, "win"),
            DuelResult::Lose => write!(f, "lose"),
        }
    }
}

/// One completed match. Every record belongs to exactly one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelRecord {
    pub id: DuelId,
    pub owner_id: OwnerId,
    pub event_id: EventId,

    /// When the match was recorded
    pub timestamp: DateTime<Utc>,

    pub turn_order: TurnOrder,
    pub result: DuelResult,

    /// The owner's deck; may no longer exist
    pub own_deck_id: DeckId,

    /// Optional link to a registered deck, unused by aggregation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_deck_id: Option<DeckId>,

    /// Free-text opponent archetype, grouped verbatim
    pub opponent_deck_name: String,

    #[serde(default)]
    pub notes: String,
}

impl DuelRecord {
    /// Create a new record with a fresh id, stamped now.
    pub fn new(
        owner_id: OwnerId,
        event_id: EventId,
        own_deck_id: DeckId,
        opponent_deck_name: String,
        turn_order: TurnOrder,
        result: DuelResult,
    ) -> Self {
        Self {
            id: EntityId::random(),
            owner_id,
            event_id,
            timestamp: Utc::now(),
            turn_order,
            result,
            own_deck_id,
            opponent_deck_id: None,
            opponent_deck_name,
            notes: String::new(),
        }
    }

    /// Builder method to set the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Builder method to set notes.
    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = notes;
        self
    }

    pub fn is_win(&self) -> bool {
        self.result.is_win()
    }
}

/// Storage shape of a duel.
///
/// Rows written before events existed carry no `event_id`. They are valid
/// rows but not valid `DuelRecord`s until migrated into the default event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelRow {
    pub id: DuelId,
    pub owner_id: OwnerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    pub timestamp: DateTime<Utc>,
    pub turn_order: TurnOrder,
    pub result: DuelResult,
    pub own_deck_id: DeckId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_deck_id: Option<DeckId>,
    pub opponent_deck_name: String,
    #[serde(default)]
    pub notes: String,
}

impl DuelRow {
    /// Whether this row predates event assignment.
    pub fn is_legacy(&self) -> bool {
        self.event_id.as_ref().map_or(true, |id| id.is_empty())
    }

    /// Convert to a strict record; `None` for legacy rows.
    pub fn into_record(self) -> Option<DuelRecord> {
        if self.is_legacy() {
            return None;
        }
        let event_id = self.event_id?;
        Some(DuelRecord {
            id: self.id,
            owner_id: self.owner_id,
            event_id,
            timestamp: self.timestamp,
            turn_order: self.turn_order,
            result: self.result,
            own_deck_id: self.own_deck_id,
            opponent_deck_id: self.opponent_deck_id,
            opponent_deck_name: self.opponent_deck_name,
            notes: self.notes,
        })
    }
}

impl From<DuelRecord> for DuelRow {
    fn from(r: DuelRecord) -> Self {
        Self {
            id: r.id,
            owner_id: r.owner_id,
            event_id: Some(r.event_id),
            timestamp: r.timestamp,
            turn_order: r.turn_order,
            result: r.result,
            own_deck_id: r.own_deck_id,
            opponent_deck_id: r.opponent_deck_id,
            opponent_deck_name: r.opponent_deck_name,
            notes: r.notes,
        }
    }
}

/// Input for logging a new duel.
///
/// Without an `event_id` the store files the duel under the active event,
/// falling back to the default event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDuel {
    pub turn_order: TurnOrder,
    pub result: DuelResult,
    pub own_deck_id: DeckId,
    pub opponent_deck_name: String,
    #[serde(default)]
    pub opponent_deck_id: Option<DeckId>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub event_id: Option<EventId>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewDuel {
    /// Reject input the entry form would not accept.
    pub fn validate(&self) -> Result<(), String> {
        if self.own_deck_id.is_empty() {
            return Err("own_deck_id must not be empty".to_string());
        }
        if self.opponent_deck_name.trim().is_empty() {
            return Err("opponent_deck_name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Partial update of a duel. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuelUpdate {
    pub turn_order: Option<TurnOrder>,
    pub result: Option<DuelResult>,
    pub own_deck_id: Option<DeckId>,
    pub opponent_deck_name: Option<String>,
    pub opponent_deck_id: Option<DeckId>,
    pub notes: Option<String>,
    pub event_id: Option<EventId>,
}

impl DuelUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if self.own_deck_id.as_ref().is_some_and(|id| id.is_empty()) {
            return Err("own_deck_id must not be empty".to_string());
        }
        if self
            .opponent_deck_name
            .as_ref()
            .is_some_and(|n| n.trim().is_empty())
        {
            return Err("opponent_deck_name must not be empty".to_string());
        }
        Ok(())
    }

    /// Apply to a stored row. The timestamp is never changed.
    pub fn apply(self, row: &mut DuelRow) {
        if let Some(v) = self.turn_order {
            row.turn_order = v;
        }
        if let Some(v) = self.result {
            row.result = v;
        }
        if let Some(v) = self.own_deck_id {
            row.own_deck_id = v;
        }
        if let Some(v) = self.opponent_deck_name {
            row.opponent_deck_name = v;
        }
        if let Some(v) = self.opponent_deck_id {
            row.opponent_deck_id = Some(v);
        }
        if let Some(v) = self.notes {
            row.notes = v;
        }
        if let Some(v) = self.event_id {
            row.event_id = Some(v);
        }
    }
}
