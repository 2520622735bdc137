use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CalculationId, EventId};
use crate::define_label_enum;
use crate::models::event::EventSummary;

define_label_enum!(
    /// Planning stance a projection was made under.
    ScenarioType {
        Pesimista => "pesimista",
        Realista => "realista",
        Optimista => "optimista",
    }
);

impl Default for ScenarioType {
    fn default() -> Self {
        ScenarioType::Realista
    }
}

/// A stored financial projection (`event_calculations` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub id: CalculationId,
    pub event_id: Option<EventId>,
    pub calculation_name: String,
    pub total_capacity: i32,
    pub expected_attendance: i32,
    pub ticket_price_general: f64,
    pub ticket_price_vip: f64,
    pub venue_cost: f64,
    pub production_cost: f64,
    pub marketing_cost: f64,
    pub staff_cost: f64,
    pub other_costs: f64,
    pub total_costs: f64,
    pub projected_revenue: f64,
    pub projected_profit: f64,
    /// `None` when costs are positive but the average ticket price is zero.
    pub break_even_tickets: Option<i64>,
    pub profit_margin: f64,
    pub scenario_type: ScenarioType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCalculation {
    pub event_id: Option<EventId>,
    pub calculation_name: String,
    pub total_capacity: i32,
    pub expected_attendance: i32,
    pub ticket_price_general: f64,
    pub ticket_price_vip: f64,
    pub venue_cost: f64,
    pub production_cost: f64,
    pub marketing_cost: f64,
    pub staff_cost: f64,
    pub other_costs: f64,
    pub total_costs: f64,
    pub projected_revenue: f64,
    pub projected_profit: f64,
    pub break_even_tickets: Option<i64>,
    pub profit_margin: f64,
    pub scenario_type: ScenarioType,
}

/// A calculation with its event resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDetails {
    #[serde(flatten)]
    pub calculation: Calculation,
    pub event: Option<EventSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct CalculationFilter {
    pub event_id: Option<EventId>,
    pub scenario_type: Option<ScenarioType>,
    pub limit: Option<usize>,
}

impl CalculationFilter {
    pub fn matches(&self, calculation: &Calculation) -> bool {
        self.event_id.map_or(true, |id| calculation.event_id == Some(id))
            && self.scenario_type.map_or(true, |s| calculation.scenario_type == s)
    }
}
