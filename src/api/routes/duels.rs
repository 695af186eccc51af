use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::auth::Owner;
use crate::api::state::AppState;
use crate::api::{non_empty, ApiError, Pagination, PaginationMeta};
use crate::calculate::opponent_deck_names;
use crate::models::{DeckId, DuelId, DuelRecord, DuelUpdate, EventId, NewDuel};

#[derive(Debug, Deserialize)]
pub struct ListDuelsParams {
    pub deck: Option<String>,
    pub event: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DuelListResponse {
    pub duels: Vec<DuelRecord>,
    pub pagination: PaginationMeta,
}

/// Duels newest first, optionally restricted to one deck and/or event.
pub async fn list_duels(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<ListDuelsParams>,
) -> Result<Json<DuelListResponse>, ApiError> {
    let mut duels = state.store.list_duels(&owner).await?;

    if let Some(deck) = non_empty(params.deck) {
        let deck = DeckId::from(deck);
        duels.retain(|d| d.own_deck_id == deck);
    }
    if let Some(event) = non_empty(params.event) {
        let event = EventId::from(event);
        duels.retain(|d| d.event_id == event);
    }

    let pagination = Pagination::new(params.page, params.page_size);
    let total = u32::try_from(duels.len()).unwrap_or(u32::MAX);
    let meta = PaginationMeta::new(&pagination, total);
    let page = pagination.slice(&duels).to_vec();

    Ok(Json(DuelListResponse {
        duels: page,
        pagination: meta,
    }))
}

pub async fn create_duel(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(input): Json<NewDuel>,
) -> Result<(StatusCode, Json<DuelRecord>), ApiError> {
    let duel = state.store.add_duel(&owner, input).await?;
    Ok((StatusCode::CREATED, Json(duel)))
}

pub async fn get_duel(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<DuelRecord>, ApiError> {
    let duel = state.store.get_duel(&owner, &DuelId::from(id)).await?;
    Ok(Json(duel))
}

pub async fn update_duel(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(update): Json<DuelUpdate>,
) -> Result<Json<DuelRecord>, ApiError> {
    let duel = state
        .store
        .update_duel(&owner, &DuelId::from(id), update)
        .await?;
    Ok(Json(duel))
}

pub async fn delete_duel(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_duel(&owner, &DuelId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct OpponentNamesParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpponentNamesResponse {
    pub names: Vec<String>,
}

/// Opponent deck names used before, for autocompletion.
pub async fn opponent_names(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<OpponentNamesParams>,
) -> Result<Json<OpponentNamesResponse>, ApiError> {
    let duels = state.store.list_duels(&owner).await?;
    let names = opponent_deck_names(&duels, params.q.as_deref());
    Ok(Json(OpponentNamesResponse { names }))
}
