use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::auth::Owner;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{Event, EventId, NewEvent};

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize)]
pub struct ActiveEventResponse {
    pub event: Option<Event>,
}

/// Events, most recently started first.
pub async fn list_events(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<EventListResponse>, ApiError> {
    let events = state.store.list_events(&owner).await?;
    Ok(Json(EventListResponse { events }))
}

/// A new event becomes the active one.
pub async fn create_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(input): Json<NewEvent>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = state.store.create_event(&owner, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn active_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<ActiveEventResponse>, ApiError> {
    let event = state.store.get_active_event(&owner).await?;
    Ok(Json(ActiveEventResponse { event }))
}

pub async fn activate_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .store
        .activate_event(&owner, &EventId::from(id))
        .await?;
    Ok(Json(event))
}

pub async fn end_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let event = state.store.end_event(&owner, &EventId::from(id)).await?;
    Ok(Json(event))
}
