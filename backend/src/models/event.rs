use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::EventId;
use crate::define_label_enum;

define_label_enum!(
    /// Lifecycle status of an event.
    EventStatus {
        Activo => "activo",
        Planificacion => "planificacion",
        Finalizado => "finalizado",
        Cancelado => "cancelado",
    }
);

impl EventStatus {
    /// Whether tickets for an event in this status may still be sold.
    pub fn is_sellable(&self) -> bool {
        matches!(self, EventStatus::Activo | EventStatus::Planificacion)
    }
}

impl Default for EventStatus {
    fn default() -> Self {
        EventStatus::Activo
    }
}

/// A festival event (`events` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_name: String,
    pub event_slug: String,
    pub event_date: NaiveDate,
    pub event_type: Option<String>,
    pub city: String,
    pub venue_name: Option<String>,
    pub capacity: Option<i32>,
    pub ticket_price: f64,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_name: String,
    pub event_slug: String,
    pub event_date: NaiveDate,
    pub event_type: Option<String>,
    pub city: String,
    pub venue_name: Option<String>,
    pub capacity: Option<i32>,
    pub ticket_price: f64,
    pub status: EventStatus,
}

/// Partial update for an event. `None` leaves the column untouched; for
/// nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_type: Option<Option<String>>,
    pub city: Option<String>,
    pub venue_name: Option<Option<String>>,
    pub capacity: Option<Option<i32>>,
    pub ticket_price: Option<f64>,
    pub status: Option<EventStatus>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        *self == EventChanges::default()
    }

    /// Apply the changes to an in-memory record.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(name) = &self.event_name {
            event.event_name = name.clone();
        }
        if let Some(date) = self.event_date {
            event.event_date = date;
        }
        if let Some(event_type) = &self.event_type {
            event.event_type = event_type.clone();
        }
        if let Some(city) = &self.city {
            event.city = city.clone();
        }
        if let Some(venue) = &self.venue_name {
            event.venue_name = venue.clone();
        }
        if let Some(capacity) = self.capacity {
            event.capacity = capacity;
        }
        if let Some(price) = self.ticket_price {
            event.ticket_price = price;
        }
        if let Some(status) = self.status {
            event.status = status;
        }
    }
}

/// Event fields embedded in sale, expense and calculation listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: EventId,
    pub event_name: String,
    pub event_date: NaiveDate,
    pub city: String,
    pub ticket_price: f64,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            event_name: event.event_name.clone(),
            event_date: event.event_date,
            city: event.city.clone(),
            ticket_price: event.ticket_price,
        }
    }
}

/// Filters for listing events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub city: Option<String>,
    /// Only `activo` events; combined with `status` both must match.
    pub active_only: bool,
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.status.map_or(true, |s| event.status == s)
            && self.city.as_deref().map_or(true, |c| event.city == c)
            && (!self.active_only || event.status == EventStatus::Activo)
    }
}
