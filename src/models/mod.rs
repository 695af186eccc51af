//! Core data models for the duel tracker.

mod deck;
mod duel;
mod event;
mod ids;
mod stats;

pub use deck::*;
pub use duel::*;
pub use event::*;
pub use ids::*;
pub use stats::*;
