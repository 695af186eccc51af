pub mod decks;
pub mod duels;
pub mod events;
pub mod migration;
pub mod stats;
