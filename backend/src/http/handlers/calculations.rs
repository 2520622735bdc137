//! `/api/calculations`

use axum::extract::{Path, State};

use super::{created, done, ok, CreatedResult, HandlerResult};
use crate::api::{CalculationDetails, CalculationId, ComparisonResult};
use crate::http::extract::{parse_id, JsonRecord, QueryRecord};
use crate::http::state::AppState;
use crate::services::calculations::{self, CreatedCalculation};
use crate::services::stats::{self, CalculationSummary};

/// GET /api/calculations
///
/// Filters: `event_id`, `scenario_type`, `limit` (default 50).
pub async fn list_calculations(
    State(state): State<AppState>,
    QueryRecord(query): QueryRecord,
) -> HandlerResult<Vec<CalculationDetails>> {
    let filter = calculations::parse_filter(&query)?;
    ok(calculations::list_calculations(state.repo(), &filter).await?)
}

/// GET /api/calculations/{id}
pub async fn get_calculation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<CalculationDetails> {
    let id: CalculationId = parse_id(&id)?;
    ok(calculations::get_calculation(state.repo(), id).await?)
}

/// POST /api/calculations
///
/// Compute a projection and store it.
pub async fn create_calculation(
    State(state): State<AppState>,
    JsonRecord(body): JsonRecord,
) -> CreatedResult<CreatedCalculation> {
    let calculation = calculations::create_calculation(state.repo(), &body).await?;
    created(calculation, "Financial projection created successfully")
}

/// POST /api/calculations/compare
///
/// Project two or more scenarios without storing them.
pub async fn compare_scenarios(JsonRecord(body): JsonRecord) -> HandlerResult<ComparisonResult> {
    ok(calculations::compare_scenarios(&body)?)
}

/// GET /api/calculations/stats/summary
pub async fn calculation_summary(State(state): State<AppState>) -> HandlerResult<CalculationSummary> {
    ok(stats::load_calculation_summary(state.repo()).await?)
}

/// DELETE /api/calculations/{id}
pub async fn delete_calculation(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult<()> {
    let id: CalculationId = parse_id(&id)?;
    calculations::delete_calculation(state.repo(), id).await?;
    done("Calculation deleted successfully")
}
