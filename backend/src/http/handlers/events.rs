//! `/api/events`

use axum::extract::{Path, State};

use super::{created, done, ok, ok_with, CreatedResult, HandlerResult};
use crate::api::{Event, EventId};
use crate::http::extract::{parse_id, JsonRecord, QueryRecord};
use crate::http::state::AppState;
use crate::services::events;

/// GET /api/events
///
/// Filters: `status`, `city`, `active_only`, `limit`.
pub async fn list_events(
    State(state): State<AppState>,
    QueryRecord(query): QueryRecord,
) -> HandlerResult<Vec<Event>> {
    let filter = events::parse_filter(&query)?;
    ok(events::list_events(state.repo(), &filter).await?)
}

/// GET /api/events/{id}
pub async fn get_event(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult<Event> {
    let id: EventId = parse_id(&id)?;
    ok(events::get_event(state.repo(), id).await?)
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    JsonRecord(body): JsonRecord,
) -> CreatedResult<Event> {
    let event = events::create_event(state.repo(), &body).await?;
    created(event, "Event created successfully")
}

/// PUT /api/events/{id}
///
/// Partial update: only the fields present in the body change.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonRecord(body): JsonRecord,
) -> HandlerResult<Event> {
    let id: EventId = parse_id(&id)?;
    let event = events::update_event(state.repo(), id, &body).await?;
    ok_with(event, "Event updated successfully")
}

/// DELETE /api/events/{id}
pub async fn delete_event(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult<()> {
    let id: EventId = parse_id(&id)?;
    let event = events::delete_event(state.repo(), id).await?;
    done(format!("Event \"{}\" deleted successfully", event.event_name))
}
