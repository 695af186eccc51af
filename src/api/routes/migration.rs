use axum::extract::State;
use axum::Json;

use crate::api::auth::Owner;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::migration::{migrate_legacy_duels, migration_status, MigrationReport, MigrationStatus};

/// How many of the owner's duels still lack an event.
pub async fn status(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<MigrationStatus>, ApiError> {
    let status = migration_status(state.store.as_ref(), &owner).await?;
    Ok(Json(status))
}

/// File the owner's legacy duels under the default event.
pub async fn run(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<MigrationReport>, ApiError> {
    let report = migrate_legacy_duels(state.store.as_ref(), &owner).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use crate::api::routes::test_support::*;
    use crate::models::{DuelResult, DuelRow, TurnOrder};
    use crate::storage::{EntityType, JsonlWriter, StorageConfig};
    use axum::http::{Method, StatusCode};
    use chrono::Utc;

    fn seed_legacy(dir: &std::path::Path, ids: &[&str]) {
        let rows: Vec<DuelRow> = ids
            .iter()
            .map(|id| DuelRow {
                id: (*id).into(),
                owner_id: OWNER.into(),
                event_id: None,
                timestamp: Utc::now(),
                turn_order: TurnOrder::First,
                result: DuelResult::Lose,
                own_deck_id: "deck-1".into(),
                opponent_deck_id: None,
                opponent_deck_name: "Dragons".to_string(),
                notes: String::new(),
            })
            .collect();

        let config = StorageConfig::new(dir.to_path_buf());
        JsonlWriter::<DuelRow>::for_owner(&config, EntityType::Duel, &OWNER.into())
            .unwrap()
            .write_all(&rows)
            .unwrap();
    }

    #[tokio::test]
    async fn test_migration_status_and_run() {
        let tmp = tempfile::tempdir().unwrap();
        seed_legacy(tmp.path(), &["old-1", "old-2"]);
        let state = setup_state(tmp.path());

        let (status, body) = get_json(&state, "/api/migration").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["needed"], true);
        assert_eq!(body["pending"], 2);

        let (_, stats) = get_json(&state, "/api/stats").await;
        assert_eq!(stats["total_duels"], 0);

        let (status, report) = send(&state, Method::POST, "/api/migration", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["migrated"], 2);
        assert!(report["default_event_id"].is_string());

        let (_, after) = get_json(&state, "/api/migration").await;
        assert_eq!(after["needed"], false);

        let (_, stats) = get_json(&state, "/api/stats").await;
        assert_eq!(stats["total_duels"], 2);
        assert_eq!(stats["losses"], 2);
    }

    #[tokio::test]
    async fn test_migration_run_without_legacy_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path());

        let (status, report) = send(&state, Method::POST, "/api/migration", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["migrated"], 0);
        assert!(report["default_event_id"].is_null());
    }
}
