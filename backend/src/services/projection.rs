//! Financial projection engine.
//!
//! Turns a validated [`Scenario`] into revenue, cost, profit, margin and
//! break-even figures, and ranks several [`NamedScenario`]s by revenue.
//! Everything here is pure arithmetic; nothing is persisted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::validators::ValidationFailure;

/// Share of the attendance sold as general admission; the rest is VIP.
pub const GENERAL_TICKET_SHARE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("At least 2 scenarios are required to compare (got {provided})")]
    InsufficientScenarios { provided: usize },

    #[error(transparent)]
    InvalidScenario(#[from] ValidationFailure),
}

/// Cost lines of an event. All amounts are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub venue: f64,
    pub production: f64,
    pub marketing: f64,
    pub staff: f64,
    pub other: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.venue + self.production + self.marketing + self.staff + self.other
    }

    fn validate(&self) -> Result<(), ValidationFailure> {
        let lines = [
            (self.venue, "Venue cost"),
            (self.production, "Production cost"),
            (self.marketing, "Marketing cost"),
            (self.staff, "Staff cost"),
            (self.other, "Other costs"),
        ];
        for (amount, label) in lines {
            check_amount(amount, label)?;
        }
        Ok(())
    }
}

/// Attendance, prices and costs for one projection.
///
/// Only constructible through [`Scenario::new`], so a held value always has
/// `0 < expected_attendance <= capacity` and non-negative prices and costs.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    capacity: i32,
    expected_attendance: i32,
    general_price: f64,
    vip_price: f64,
    costs: CostBreakdown,
}

impl Scenario {
    pub fn new(
        capacity: i32,
        expected_attendance: i32,
        general_price: f64,
        vip_price: f64,
        costs: CostBreakdown,
    ) -> Result<Self, ValidationFailure> {
        if capacity <= 0 {
            return Err(ValidationFailure::NotPositive("Total capacity".to_string()));
        }
        if expected_attendance <= 0 {
            return Err(ValidationFailure::NotPositive("Expected attendance".to_string()));
        }
        if expected_attendance > capacity {
            return Err(ValidationFailure::ExceedsLimit {
                label: "Expected attendance".to_string(),
                limit: "total capacity".to_string(),
            });
        }
        check_amount(general_price, "General ticket price")?;
        check_amount(vip_price, "VIP ticket price")?;
        costs.validate()?;

        Ok(Self {
            capacity,
            expected_attendance,
            general_price,
            vip_price,
            costs,
        })
    }

    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    pub fn expected_attendance(&self) -> i32 {
        self.expected_attendance
    }

    pub fn general_price(&self) -> f64 {
        self.general_price
    }

    pub fn vip_price(&self) -> f64 {
        self.vip_price
    }

    pub fn costs(&self) -> &CostBreakdown {
        &self.costs
    }
}

fn check_amount(amount: f64, label: &str) -> Result<(), ValidationFailure> {
    if !amount.is_finite() {
        return Err(ValidationFailure::NotANumber(label.to_string()));
    }
    if amount < 0.0 {
        return Err(ValidationFailure::Negative(label.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TicketsBreakdown {
    pub general_tickets: i64,
    pub vip_tickets: i64,
    pub total_tickets: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub general_revenue: f64,
    pub vip_revenue: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialAnalysis {
    pub total_costs: f64,
    pub projected_profit: f64,
    /// Percentage of revenue; 0 when there is no revenue.
    pub profit_margin: f64,
    /// `None` when costs are positive but tickets earn nothing.
    pub break_even_tickets: Option<i64>,
    pub avg_ticket_price: f64,
}

/// Output of [`project`], serialized as the `calculation_details` block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub tickets_breakdown: TicketsBreakdown,
    pub revenue_breakdown: RevenueBreakdown,
    pub costs_breakdown: CostBreakdown,
    pub financial_analysis: FinancialAnalysis,
}

impl ProjectionResult {
    pub fn total_revenue(&self) -> f64 {
        self.revenue_breakdown.total_revenue
    }

    pub fn total_costs(&self) -> f64 {
        self.financial_analysis.total_costs
    }

    pub fn projected_profit(&self) -> f64 {
        self.financial_analysis.projected_profit
    }

    pub fn profit_margin(&self) -> f64 {
        self.financial_analysis.profit_margin
    }

    pub fn break_even_tickets(&self) -> Option<i64> {
        self.financial_analysis.break_even_tickets
    }
}

/// Split an attendance into (general, vip) tickets using the fixed share.
pub fn split_tickets(attendance: i64) -> (i64, i64) {
    let general = (attendance as f64 * GENERAL_TICKET_SHARE).round() as i64;
    (general, attendance - general)
}

fn revenue(attendance: i64, general_price: f64, vip_price: f64) -> (TicketsBreakdown, RevenueBreakdown) {
    let (general_tickets, vip_tickets) = split_tickets(attendance);
    let general_revenue = general_tickets as f64 * general_price;
    let vip_revenue = vip_tickets as f64 * vip_price;
    (
        TicketsBreakdown {
            general_tickets,
            vip_tickets,
            total_tickets: attendance,
        },
        RevenueBreakdown {
            general_revenue,
            vip_revenue,
            total_revenue: general_revenue + vip_revenue,
        },
    )
}

/// Compute the full projection for a scenario.
pub fn project(scenario: &Scenario) -> ProjectionResult {
    let attendance = i64::from(scenario.expected_attendance);
    let (tickets, revenue) = revenue(attendance, scenario.general_price, scenario.vip_price);

    let total_costs = scenario.costs.total();
    let projected_profit = revenue.total_revenue - total_costs;
    let profit_margin = if revenue.total_revenue > 0.0 {
        projected_profit / revenue.total_revenue * 100.0
    } else {
        0.0
    };
    let avg_ticket_price = revenue.total_revenue / attendance as f64;
    let break_even_tickets = if total_costs <= 0.0 {
        Some(0)
    } else if avg_ticket_price > 0.0 {
        Some((total_costs / avg_ticket_price).ceil() as i64)
    } else {
        None
    };

    ProjectionResult {
        tickets_breakdown: tickets,
        revenue_breakdown: revenue,
        costs_breakdown: scenario.costs,
        financial_analysis: FinancialAnalysis {
            total_costs,
            projected_profit,
            profit_margin,
            break_even_tickets,
            avg_ticket_price,
        },
    }
}

/// A scenario submitted for comparison. Costs are not part of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedScenario {
    pub name: Option<String>,
    pub expected_attendance: i32,
    pub general_price: f64,
    pub vip_price: f64,
}

impl NamedScenario {
    pub fn new(
        name: Option<String>,
        expected_attendance: i32,
        general_price: f64,
        vip_price: f64,
    ) -> Result<Self, ValidationFailure> {
        if expected_attendance <= 0 {
            return Err(ValidationFailure::NotPositive("Expected attendance".to_string()));
        }
        check_amount(general_price, "General ticket price")?;
        check_amount(vip_price, "VIP ticket price")?;
        Ok(Self {
            name,
            expected_attendance,
            general_price,
            vip_price,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TicketSplit {
    pub general: i64,
    pub vip: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario_name: Option<String>,
    pub attendance: i64,
    pub total_revenue: f64,
    pub revenue_per_person: f64,
    pub tickets_breakdown: TicketSplit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_scenarios: usize,
    pub revenue_range: RevenueRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub comparisons: Vec<ScenarioSummary>,
    pub best_scenario: ScenarioSummary,
    pub summary: ComparisonSummary,
}

pub fn summarize(scenario: &NamedScenario) -> ScenarioSummary {
    let attendance = i64::from(scenario.expected_attendance);
    let (tickets, revenue) = revenue(attendance, scenario.general_price, scenario.vip_price);
    ScenarioSummary {
        scenario_name: scenario.name.clone(),
        attendance,
        total_revenue: revenue.total_revenue,
        revenue_per_person: revenue.total_revenue / attendance as f64,
        tickets_breakdown: TicketSplit {
            general: tickets.general_tickets,
            vip: tickets.vip_tickets,
        },
    }
}

/// Summarize each scenario and pick the one with the highest revenue.
/// On ties the earliest scenario wins.
pub fn compare(scenarios: &[NamedScenario]) -> Result<ComparisonResult, ProjectionError> {
    if scenarios.len() < 2 {
        return Err(ProjectionError::InsufficientScenarios {
            provided: scenarios.len(),
        });
    }

    let comparisons: Vec<ScenarioSummary> = scenarios.iter().map(summarize).collect();

    let mut best = &comparisons[0];
    for current in &comparisons[1..] {
        if current.total_revenue > best.total_revenue {
            best = current;
        }
    }
    let best_scenario = best.clone();

    let (min, max) = comparisons.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.total_revenue), hi.max(s.total_revenue))
    });

    Ok(ComparisonResult {
        summary: ComparisonSummary {
            total_scenarios: comparisons.len(),
            revenue_range: RevenueRange { min, max },
        },
        comparisons,
        best_scenario,
    })
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod projection_tests;
