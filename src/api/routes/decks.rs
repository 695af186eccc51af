use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::auth::Owner;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{Deck, DeckId, DeckUpdate, NewDeck};

#[derive(Debug, Serialize)]
pub struct DeckListResponse {
    pub decks: Vec<Deck>,
}

pub async fn list_decks(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<DeckListResponse>, ApiError> {
    let decks = state.store.list_decks(&owner).await?;
    Ok(Json(DeckListResponse { decks }))
}

pub async fn create_deck(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(input): Json<NewDeck>,
) -> Result<(StatusCode, Json<Deck>), ApiError> {
    let deck = state.store.add_deck(&owner, input).await?;
    Ok((StatusCode::CREATED, Json(deck)))
}

pub async fn get_deck(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<Deck>, ApiError> {
    let deck = state.store.get_deck(&owner, &DeckId::from(id)).await?;
    Ok(Json(deck))
}

pub async fn update_deck(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(update): Json<DeckUpdate>,
) -> Result<Json<Deck>, ApiError> {
    let deck = state
        .store
        .update_deck(&owner, &DeckId::from(id), update)
        .await?;
    Ok(Json(deck))
}

/// Duels that used the deck are kept; their deck id just stops resolving.
pub async fn delete_deck(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_deck(&owner, &DeckId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::routes::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_deck_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path());

        let (status, created) = post_json(
            &state,
            "/api/decks",
            json!({"name": "Tenpai Dragon", "archetype": "Dragon", "tags": ["fire", " "]}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["tags"], json!(["fire"]));
        let id = created["id"].as_str().unwrap().to_string();

        let (status, listed) = get_json(&state, "/api/decks").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["decks"].as_array().unwrap().len(), 1);

        let (status, updated) = send(
            &state,
            Method::PUT,
            &format!("/api/decks/{}", id),
            Some(OWNER),
            Some(json!({"notes": "post-banlist"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["notes"], "post-banlist");
        assert_eq!(updated["name"], "Tenpai Dragon");

        let (status, _) = send(
            &state,
            Method::DELETE,
            &format!("/api/decks/{}", id),
            Some(OWNER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = get_json(&state, &format!("/api/decks/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_deck_requires_name() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path());

        let (status, body) = post_json(&state, "/api/decks", json!({"name": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_decks_require_owner() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path());

        let (status, body) = send(&state, Method::GET, "/api/decks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_decks_are_per_owner() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path());

        post_json(&state, "/api/decks", json!({"name": "Mine"})).await;
        let (_, other) = send(&state, Method::GET, "/api/decks", Some("bob"), None).await;
        assert!(other["decks"].as_array().unwrap().is_empty());
    }
}
