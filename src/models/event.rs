//! Event (tournament / season) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, EventId, OwnerId};

/// Name given to the catch-all event legacy duels are migrated into.
pub const DEFAULT_EVENT_NAME: &str = "Ranked Play";

/// A named grouping of duel records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub owner_id: OwnerId,
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub start_date: DateTime<Utc>,

    /// Set when the event is ended
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,

    pub is_active: bool,

    /// Catch-all event for records logged before events existed
    pub is_default: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Create a new, active event starting now.
    pub fn new(owner_id: OwnerId, name: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::random(),
            owner_id,
            name,
            description,
            start_date: now,
            end_date: None,
            is_active: true,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the owner's default event.
    ///
    /// The id is derived from the owner so repeated creation attempts
    /// converge on the same event.
    pub fn default_for(owner_id: OwnerId) -> Self {
        let mut event = Self::new(
            owner_id.clone(),
            DEFAULT_EVENT_NAME.to_string(),
            String::new(),
        );
        event.id = Self::default_id(&owner_id);
        event.is_default = true;
        event
    }

    /// Stable id of an owner's default event.
    pub fn default_id(owner_id: &OwnerId) -> EventId {
        EntityId::generate(&["default-event", owner_id.as_str()])
    }

    /// Builder method to set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Mark ended at the given instant.
    pub fn end(&mut self, at: DateTime<Utc>) {
        self.is_active = false;
        self.end_date = Some(at);
        self.updated_at = at;
    }

    pub fn set_active(&mut self, active: bool) {
        if self.is_active != active {
            self.is_active = active;
            self.updated_at = Utc::now();
        }
    }
}

/// Input for creating an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("event name must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = Event::new("owner".into(), "Regional Qualifier".to_string(), String::new());

        assert_eq!(event.name, "Regional Qualifier");
        assert!(event.is_active);
        assert!(!event.is_default);
        assert!(event.end_date.is_none());
    }

    #[test]
    fn test_default_event_id_is_stable_per_owner() {
        let a = Event::default_for("owner-1".into());
        let b = Event::default_for("owner-1".into());
        let c = Event::default_for("owner-2".into());

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert!(a.is_default);
        assert_eq!(a.name, DEFAULT_EVENT_NAME);
    }

    #[test]
    fn test_end_event() {
        let mut event = Event::new("owner".into(), "Cup".to_string(), String::new());
        let at = Utc::now();
        event.end(at);

        assert!(!event.is_active);
        assert_eq!(event.end_date, Some(at));
    }

    #[test]
    fn test_new_event_validation() {
        assert!(NewEvent::default().validate().is_err());
        assert!(NewEvent {
            name: "Season 3".to_string(),
            description: String::new(),
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::new("owner".into(), "Cup".to_string(), "desc".to_string());
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
