//! # Duel Tracker
//!
//! Per-owner duel log for a trading card game, with win/loss statistics
//! by deck, opponent archetype, turn order, event and time period.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (duels, decks, events, statistics)
//! - **calculate**: Statistics computation over duel records
//! - **storage**: Filesystem JSONL store, one directory per owner
//! - **migration**: Backfill of duels logged before events existed
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod migration;
pub mod models;
pub mod storage;

pub use models::*;
