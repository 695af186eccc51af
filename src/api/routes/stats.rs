//! Statistics endpoints.
//!
//! Every endpoint loads the owner's duels, narrows them by the optional
//! `deck` and `event` query parameters, then hands them to `calculate`.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::auth::Owner;
use crate::api::state::AppState;
use crate::api::{non_empty, ApiError};
use crate::calculate::{
    compute_by_period_in, compute_statistics, compute_statistics_by_event, deck_breakdown,
    opponent_breakdown,
};
use crate::models::{
    DeckBreakdown, DeckId, DuelRecord, EventId, EventStatistics, Granularity, OpponentBreakdown,
    OwnerId, Statistics,
};

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub deck: Option<String>,
    pub event: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: Statistics,

    /// Share of duels played going first (0.0 to 100.0)
    pub first_player_share: f64,

    pub decks: Vec<DeckBreakdown>,
    pub opponents: Vec<OpponentBreakdown>,
}

#[derive(Debug, Serialize)]
pub struct EventStatsResponse {
    pub events: Vec<EventStatistics>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodParams {
    pub granularity: Option<String>,
    pub deck: Option<String>,
    pub event: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PeriodStatsResponse {
    pub granularity: Granularity,
    pub utc_offset_hours: i32,
    pub periods: BTreeMap<String, Statistics>,
}

/// Load the owner's duels matching the deck/event filters.
async fn scoped_duels(
    state: &AppState,
    owner: &OwnerId,
    deck: Option<String>,
    event: Option<String>,
) -> Result<Vec<DuelRecord>, ApiError> {
    let mut duels = state.store.list_duels(owner).await?;

    if let Some(deck) = non_empty(deck) {
        let deck = DeckId::from(deck);
        duels.retain(|d| d.own_deck_id == deck);
    }
    if let Some(event) = non_empty(event) {
        let event = EventId::from(event);
        duels.retain(|d| d.event_id == event);
    }

    check_limit(state, duels.len())?;
    Ok(duels)
}

fn check_limit(state: &AppState, count: usize) -> Result<(), ApiError> {
    if count > state.stats.max_records {
        return Err(ApiError::TooLarge(format!(
            "{} records exceed the limit of {}",
            count, state.stats.max_records
        )));
    }
    Ok(())
}

/// Overall statistics with resolved deck names.
pub async fn overall(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse>, ApiError> {
    let (duels, decks) = tokio::join!(
        scoped_duels(&state, &owner, params.deck, params.event),
        state.store.list_decks(&owner),
    );
    let (duels, decks) = (duels?, decks?);

    let stats = compute_statistics(&duels);
    debug!("Computed statistics over {} duels for {}", duels.len(), owner);

    Ok(Json(StatsResponse {
        first_player_share: stats.first_player_share(),
        decks: deck_breakdown(&stats, &decks),
        opponents: opponent_breakdown(&stats),
        stats,
    }))
}

/// One statistics block per event, most recent event first.
pub async fn by_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<StatsParams>,
) -> Result<Json<EventStatsResponse>, ApiError> {
    let (duels, events) = tokio::join!(
        scoped_duels(&state, &owner, params.deck, None),
        state.store.list_events(&owner),
    );
    let (duels, mut events) = (duels?, events?);

    if let Some(event) = non_empty(params.event) {
        let event = EventId::from(event);
        events.retain(|e| e.id == event);
    }

    Ok(Json(EventStatsResponse {
        events: compute_statistics_by_event(&duels, &events),
    }))
}

/// Statistics bucketed by day, week or month in the configured time zone.
pub async fn by_period(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<PeriodParams>,
) -> Result<Json<PeriodStatsResponse>, ApiError> {
    let granularity = match non_empty(params.granularity) {
        Some(raw) => raw.parse::<Granularity>().map_err(ApiError::BadRequest)?,
        None => Granularity::Day,
    };
    let tz = state
        .stats
        .time_zone()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let duels = scoped_duels(&state, &owner, params.deck, params.event).await?;
    let periods = compute_by_period_in(&duels, granularity, &tz);

    Ok(Json(PeriodStatsResponse {
        granularity,
        utc_offset_hours: state.stats.utc_offset_hours,
        periods,
    }))
}
