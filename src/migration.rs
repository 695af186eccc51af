//! Backfill of duels logged before events existed.
//!
//! Legacy duel rows carry no `event_id`. Migration files every such row
//! under the owner's default event, creating that event if needed. Running
//! it again is a no-op.

use serde::Serialize;
use tracing::info;

use crate::models::{DuelId, EventId, OwnerId};
use crate::storage::{RecordStore, StorageError};

/// Outcome of a migration run for one owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    pub owner_id: OwnerId,

    /// Rows that received an event
    pub migrated: usize,

    /// Set when there was something to migrate
    pub default_event_id: Option<EventId>,
}

/// Migration status for one owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationStatus {
    pub needed: bool,
    pub pending: usize,
}

async fn legacy_duel_ids(
    store: &dyn RecordStore,
    owner: &OwnerId,
) -> Result<Vec<DuelId>, StorageError> {
    Ok(store
        .list_duel_rows(owner)
        .await?
        .into_iter()
        .filter(|r| r.is_legacy())
        .map(|r| r.id)
        .collect())
}

/// Number of duel rows still lacking an event.
pub async fn migration_count(
    store: &dyn RecordStore,
    owner: &OwnerId,
) -> Result<usize, StorageError> {
    Ok(legacy_duel_ids(store, owner).await?.len())
}

/// Whether any duel row still lacks an event.
pub async fn check_migration_needed(
    store: &dyn RecordStore,
    owner: &OwnerId,
) -> Result<bool, StorageError> {
    Ok(migration_count(store, owner).await? > 0)
}

pub async fn migration_status(
    store: &dyn RecordStore,
    owner: &OwnerId,
) -> Result<MigrationStatus, StorageError> {
    let pending = migration_count(store, owner).await?;
    Ok(MigrationStatus {
        needed: pending > 0,
        pending,
    })
}

/// Assign every legacy duel of an owner to the default event.
pub async fn migrate_legacy_duels(
    store: &dyn RecordStore,
    owner: &OwnerId,
) -> Result<MigrationReport, StorageError> {
    let ids = legacy_duel_ids(store, owner).await?;
    if ids.is_empty() {
        return Ok(MigrationReport {
            owner_id: owner.clone(),
            migrated: 0,
            default_event_id: None,
        });
    }

    let default_event = store.get_or_create_default_event(owner).await?;
    let migrated = store.assign_event(owner, &ids, &default_event.id).await?;
    info!(
        "Migrated {} duel(s) into default event {} for owner {}",
        migrated, default_event.id, owner
    );

    Ok(MigrationReport {
        owner_id: owner.clone(),
        migrated,
        default_event_id: Some(default_event.id),
    })
}

/// Run the migration for every owner in the store.
///
/// Per-owner failures are collected rather than aborting the whole run.
pub async fn migrate_all(
    store: &dyn RecordStore,
) -> Result<(Vec<MigrationReport>, Vec<(OwnerId, StorageError)>), StorageError> {
    let mut reports = Vec::new();
    let mut failures = Vec::new();

    for owner in store.list_owners().await? {
        match migrate_legacy_duels(store, &owner).await {
            Ok(report) => reports.push(report),
            Err(e) => failures.push((owner, e)),
        }
    }

    Ok((reports, failures))
}
