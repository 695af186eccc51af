//! Derived statistics models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::EventId;

/// Win/loss counts for one group (a deck, an opponent archetype).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinLossStat {
    pub wins: u32,
    pub losses: u32,

    /// Win rate (0.0 to 100.0)
    pub win_rate: f64,
}

impl WinLossStat {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }
}

/// Aggregate report over a set of duel records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_duels: u32,
    pub wins: u32,
    pub losses: u32,

    /// Win rate (0.0 to 100.0)
    pub win_rate: f64,

    /// Duels where the owner went first
    pub first_player_duels: u32,

    /// Duels where the owner went second
    pub second_player_duels: u32,

    pub first_player_win_rate: f64,
    pub second_player_win_rate: f64,

    /// Keyed by own deck id (raw, may dangle)
    pub deck_stats: BTreeMap<String, WinLossStat>,

    /// Keyed by opponent deck name, verbatim
    pub opponent_stats: BTreeMap<String, WinLossStat>,
}

impl Statistics {
    pub fn is_empty(&self) -> bool {
        self.total_duels == 0
    }

    /// Share of duels played going first (0.0 to 100.0).
    pub fn first_player_share(&self) -> f64 {
        if self.total_duels == 0 {
            0.0
        } else {
            self.first_player_duels as f64 / self.total_duels as f64 * 100.0
        }
    }
}

/// Statistics tagged with the event they were computed over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStatistics {
    pub event_id: EventId,
    pub event_name: String,

    #[serde(flatten)]
    pub stats: Statistics,
}

/// Bucket size for per-period statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            other => Err(format!(
                "unknown granularity '{}', expected day, week or month",
                other
            )),
        }
    }
}

/// One row of the per-deck table with the deck's display name resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckBreakdown {
    pub deck_id: String,

    /// Deck name, or the raw id when the deck no longer exists
    pub deck_name: String,

    pub deck_exists: bool,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

/// One row of the per-opponent table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentBreakdown {
    pub opponent_deck_name: String,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}
