//! Stored financial projections and scenario comparison.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::*;
use crate::db::repository::FullRepository;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::projection::{self, CostBreakdown, NamedScenario, ProjectionResult, Scenario};
use crate::services::validators::*;
use crate::services::list_limit;

pub const DEFAULT_LIST_LIMIT: usize = 50;
/// Capacity assumed for a compared scenario that does not state one.
pub const DEFAULT_COMPARE_CAPACITY: i32 = 1000;

/// A newly stored projection together with its full breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedCalculation {
    #[serde(flatten)]
    pub calculation: CalculationDetails,
    pub calculation_details: ProjectionResult,
}

pub fn parse_filter(query: &Record) -> ValidationResult<CalculationFilter> {
    Ok(CalculationFilter {
        event_id: field(query, "event_id")
            .map(|v| require_id(v, "event_id").map(EventId::new))
            .transpose()?,
        scenario_type: field(query, "scenario_type")
            .map(|v| require_choice::<ScenarioType>(v, "scenario_type", &ScenarioType::labels()))
            .transpose()?,
        limit: Some(list_limit(query, DEFAULT_LIST_LIMIT)?),
    })
}

pub async fn list_calculations(
    repo: &dyn FullRepository,
    filter: &CalculationFilter,
) -> ServiceResult<Vec<CalculationDetails>> {
    Ok(repo.list_calculations(filter).await?)
}

pub async fn get_calculation(
    repo: &dyn FullRepository,
    id: CalculationId,
) -> ServiceResult<CalculationDetails> {
    repo.get_calculation(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Calculation not found"))
}

fn optional_amount(body: &Record, name: &str, label: &str) -> ValidationResult<f64> {
    field(body, name).map_or(Ok(0.0), |v| require_non_negative_number(v, label))
}

struct CalculationRequest {
    event_id: Option<EventId>,
    name: String,
    scenario: Scenario,
    scenario_type: ScenarioType,
}

fn parse_request(body: &Record) -> ValidationResult<CalculationRequest> {
    require_fields(
        body,
        &[
            "calculation_name",
            "total_capacity",
            "expected_attendance",
            "ticket_price_general",
        ],
    )?;

    let name = require_string(required(body, "calculation_name")?, "Calculation name", 3, 200)?;
    let capacity = require_positive_integer(required(body, "total_capacity")?, "Total capacity")?;
    let attendance =
        require_positive_integer(required(body, "expected_attendance")?, "Expected attendance")?;
    let general_price =
        require_positive_number(required(body, "ticket_price_general")?, "General ticket price")?;
    if attendance > capacity {
        return Err(ValidationFailure::ExceedsLimit {
            label: "Expected attendance".to_string(),
            limit: "total capacity".to_string(),
        });
    }

    let vip_price = optional_amount(body, "ticket_price_vip", "VIP ticket price")?;
    let costs = CostBreakdown {
        venue: optional_amount(body, "venue_cost", "Venue cost")?,
        production: optional_amount(body, "production_cost", "Production cost")?,
        marketing: optional_amount(body, "marketing_cost", "Marketing cost")?,
        staff: optional_amount(body, "staff_cost", "Staff cost")?,
        other: optional_amount(body, "other_costs", "Other costs")?,
    };
    let scenario_type = field(body, "scenario_type")
        .map(|v| require_choice::<ScenarioType>(v, "Scenario type", &ScenarioType::labels()))
        .transpose()?
        .unwrap_or_default();
    let event_id = field(body, "event_id")
        .map(|v| require_id(v, "event_id").map(EventId::new))
        .transpose()?;

    Ok(CalculationRequest {
        event_id,
        name,
        scenario: Scenario::new(capacity, attendance, general_price, vip_price, costs)?,
        scenario_type,
    })
}

/// Validate a projection request, compute it and store the result.
pub async fn create_calculation(
    repo: &dyn FullRepository,
    body: &Record,
) -> ServiceResult<CreatedCalculation> {
    let request = parse_request(body)?;
    let result = projection::project(&request.scenario);

    let event = match request.event_id {
        Some(id) => Some(
            repo.get_event(id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Event not found"))?,
        ),
        None => None,
    };

    let scenario = &request.scenario;
    let costs = scenario.costs();
    let stored = repo
        .insert_calculation(NewCalculation {
            event_id: request.event_id,
            calculation_name: request.name,
            total_capacity: scenario.capacity(),
            expected_attendance: scenario.expected_attendance(),
            ticket_price_general: scenario.general_price(),
            ticket_price_vip: scenario.vip_price(),
            venue_cost: costs.venue,
            production_cost: costs.production,
            marketing_cost: costs.marketing,
            staff_cost: costs.staff,
            other_costs: costs.other,
            total_costs: result.total_costs(),
            projected_revenue: result.total_revenue(),
            projected_profit: result.projected_profit(),
            break_even_tickets: result.break_even_tickets(),
            profit_margin: result.profit_margin(),
            scenario_type: request.scenario_type,
        })
        .await?;

    log::info!(
        "Stored calculation {} ({}, revenue {:.2})",
        stored.id,
        stored.scenario_type,
        stored.projected_revenue
    );

    Ok(CreatedCalculation {
        calculation: CalculationDetails {
            calculation: stored,
            event: event.as_ref().map(EventSummary::from),
        },
        calculation_details: result,
    })
}

fn parse_scenario(index: usize, value: &Value) -> ValidationResult<NamedScenario> {
    let label = |name: &str| format!("scenarios[{}].{}", index, name);
    let Value::Object(scenario) = value else {
        return Err(ValidationFailure::WrongType(format!("scenarios[{}]", index)));
    };

    let name = optional_string(scenario, "scenario_name", &label("scenario_name"), 200)?;
    let attendance = require_positive_integer(
        required(scenario, "expected_attendance")
            .map_err(|_| ValidationFailure::MissingField(label("expected_attendance")))?,
        &label("expected_attendance"),
    )?;
    let general_price = require_non_negative_number(
        required(scenario, "ticket_price_general")
            .map_err(|_| ValidationFailure::MissingField(label("ticket_price_general")))?,
        &label("ticket_price_general"),
    )?;
    let vip_price = field(scenario, "ticket_price_vip")
        .map_or(Ok(0.0), |v| require_non_negative_number(v, &label("ticket_price_vip")))?;
    // Parsed so a malformed value is still reported; it does not cap attendance.
    field(scenario, "total_capacity")
        .map_or(Ok(DEFAULT_COMPARE_CAPACITY), |v| {
            require_positive_integer(v, &label("total_capacity"))
        })?;

    NamedScenario::new(name, attendance, general_price, vip_price)
}

/// Rank the submitted scenarios by projected ticket revenue.
pub fn compare_scenarios(body: &Record) -> ServiceResult<ComparisonResult> {
    let scenarios = match field(body, "scenarios") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| parse_scenario(i, v))
            .collect::<ValidationResult<Vec<_>>>()?,
        Some(_) => return Err(ValidationFailure::EmptyList("scenarios".to_string()).into()),
        None => Vec::new(),
    };
    Ok(projection::compare(&scenarios)?)
}

pub async fn delete_calculation(repo: &dyn FullRepository, id: CalculationId) -> ServiceResult<()> {
    if repo.delete_calculation(id).await? {
        Ok(())
    } else {
        Err(ServiceError::not_found("Calculation not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use serde_json::json;

    fn body(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn reference_body() -> Record {
        body(json!({
            "calculation_name": "Summer Fest baseline",
            "total_capacity": 1000,
            "expected_attendance": "500",
            "ticket_price_general": 100,
            "ticket_price_vip": "200"
        }))
    }

    #[tokio::test]
    async fn test_create_reference_calculation() {
        let repo = LocalRepository::new();
        let created = create_calculation(&repo, &reference_body()).await.unwrap();

        let stored = &created.calculation.calculation;
        assert_eq!(stored.projected_revenue, 60_000.0);
        assert_eq!(stored.projected_profit, 60_000.0);
        assert_eq!(stored.profit_margin, 100.0);
        assert_eq!(stored.break_even_tickets, Some(0));
        assert_eq!(stored.scenario_type, ScenarioType::Realista);
        assert_eq!(created.calculation_details.tickets_breakdown.general_tickets, 400);
        assert_eq!(created.calculation_details.tickets_breakdown.vip_tickets, 100);

        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["calculation_name"], "Summer Fest baseline");
        assert_eq!(
            json["calculation_details"]["financial_analysis"]["avg_ticket_price"],
            120.0
        );
    }

    #[tokio::test]
    async fn test_attendance_above_capacity_rejected_before_storage() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        let mut request = reference_body();
        request.insert("expected_attendance".to_string(), json!(1001));

        let err = create_calculation(&repo, &request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
        assert_eq!(err.to_string(), "Expected attendance cannot exceed total capacity");
    }

    #[tokio::test]
    async fn test_missing_and_invalid_fields() {
        let repo = LocalRepository::new();
        let err = create_calculation(&repo, &body(json!({"calculation_name": "abc"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Field 'total_capacity' is required");

        let mut request = reference_body();
        request.insert("scenario_type".to_string(), json!("extremo"));
        assert!(create_calculation(&repo, &request).await.is_err());

        let mut request = reference_body();
        request.insert("venue_cost".to_string(), json!(-1));
        assert_eq!(
            create_calculation(&repo, &request).await.unwrap_err().to_string(),
            "Venue cost cannot be negative"
        );
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let repo = LocalRepository::new();
        let mut request = reference_body();
        request.insert("event_id".to_string(), json!(99));
        assert!(matches!(
            create_calculation(&repo, &request).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(list_calculations(&repo, &CalculationFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let repo = LocalRepository::new();
        let created = create_calculation(&repo, &reference_body()).await.unwrap();
        let id = created.calculation.calculation.id;

        assert_eq!(get_calculation(&repo, id).await.unwrap().calculation.id, id);
        delete_calculation(&repo, id).await.unwrap();
        assert!(matches!(
            delete_calculation(&repo, id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            get_calculation(&repo, id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_compare_picks_first_of_tied_best() {
        let result = compare_scenarios(&body(json!({
            "scenarios": [
                {"scenario_name": "low", "expected_attendance": 1, "ticket_price_general": 100},
                {"scenario_name": "high", "expected_attendance": 3, "ticket_price_general": 100},
                {"scenario_name": "high again", "expected_attendance": "3", "ticket_price_general": "100"}
            ]
        })))
        .unwrap();

        assert_eq!(result.best_scenario.scenario_name.as_deref(), Some("high"));
        assert_eq!(result.summary.total_scenarios, 3);
        assert_eq!(result.summary.revenue_range.min, 100.0);
        assert_eq!(result.summary.revenue_range.max, 300.0);
    }

    #[test]
    fn test_compare_needs_two_scenarios() {
        let one = body(json!({"scenarios": [{"expected_attendance": 10, "ticket_price_general": 5}]}));
        assert!(matches!(compare_scenarios(&one), Err(ServiceError::Validation { .. })));
        assert!(compare_scenarios(&body(json!({}))).is_err());
        assert!(compare_scenarios(&body(json!({"scenarios": "two"}))).is_err());
    }

    #[test]
    fn test_compare_reports_scenario_field() {
        let err = compare_scenarios(&body(json!({
            "scenarios": [
                {"expected_attendance": 10, "ticket_price_general": 5},
                {"expected_attendance": 0, "ticket_price_general": 5}
            ]
        })))
        .unwrap_err();
        assert_eq!(err.to_string(), "scenarios[1].expected_attendance must be greater than 0");
    }

    #[test]
    fn test_parse_filter() {
        let filter = parse_filter(&body(json!({"event_id": "4", "scenario_type": "optimista"}))).unwrap();
        assert_eq!(filter.event_id, Some(EventId::new(4)));
        assert_eq!(filter.scenario_type, Some(ScenarioType::Optimista));
        assert_eq!(filter.limit, Some(DEFAULT_LIST_LIMIT));
        assert!(parse_filter(&body(json!({"scenario_type": "x"}))).is_err());
    }
}
