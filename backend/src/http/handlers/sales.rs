//! `/api/sales`

use axum::extract::{Path, State};

use super::{created, done, ok, ok_with, CreatedResult, HandlerResult};
use crate::api::{Sale, SaleDetails, SaleId};
use crate::http::extract::{parse_id, Form, JsonRecord, QueryRecord};
use crate::http::state::AppState;
use crate::services::sales;
use crate::services::stats::{self, SalesStats};

/// GET /api/sales
///
/// Filters: `sale_type`, `city`, `payment_status`, `limit`.
pub async fn list_sales(
    State(state): State<AppState>,
    QueryRecord(query): QueryRecord,
) -> HandlerResult<Vec<SaleDetails>> {
    let filter = sales::parse_filter(&query)?;
    ok(sales::list_sales(state.repo(), state.store(), &filter).await?)
}

/// GET /api/sales/stats
pub async fn sales_stats(State(state): State<AppState>) -> HandlerResult<SalesStats> {
    ok(stats::load_sales_stats(state.repo()).await?)
}

/// GET /api/sales/{id}
pub async fn get_sale(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult<SaleDetails> {
    let id: SaleId = parse_id(&id)?;
    ok(sales::get_sale(state.repo(), state.store(), id).await?)
}

/// POST /api/sales/package
///
/// JSON or multipart with an optional `receipt` file.
pub async fn create_package_sale(
    State(state): State<AppState>,
    Form(submission): Form,
) -> CreatedResult<SaleDetails> {
    let sale = sales::create_package_sale(
        state.repo(),
        state.store(),
        submission,
        state.config.max_upload_bytes,
    )
    .await?;
    created(sale, "Package sale registered successfully")
}

/// POST /api/sales/individual
///
/// `event_ids` may be a JSON array or, in a form, a JSON-encoded string.
pub async fn create_individual_sale(
    State(state): State<AppState>,
    Form(submission): Form,
) -> CreatedResult<SaleDetails> {
    let sale = sales::create_individual_sale(
        state.repo(),
        state.store(),
        submission,
        state.config.max_upload_bytes,
    )
    .await?;
    created(sale, "Individual sale registered successfully")
}

/// PATCH /api/sales/{id}/delivery
pub async fn set_delivery(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonRecord(body): JsonRecord,
) -> HandlerResult<Sale> {
    let id: SaleId = parse_id(&id)?;
    let sale = sales::set_delivery(state.repo(), id, &body).await?;
    let message = if sale.tickets_delivered {
        "Tickets marked as delivered"
    } else {
        "Tickets marked as not delivered"
    };
    ok_with(sale, message)
}

/// PATCH /api/sales/{id}/payment
pub async fn set_payment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonRecord(body): JsonRecord,
) -> HandlerResult<Sale> {
    let id: SaleId = parse_id(&id)?;
    let sale = sales::set_payment_status(state.repo(), id, &body).await?;
    let message = format!("Payment status updated to: {}", sale.payment_status);
    ok_with(sale, message)
}

/// DELETE /api/sales/{id}
pub async fn delete_sale(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult<()> {
    let id: SaleId = parse_id(&id)?;
    sales::delete_sale(state.repo(), state.store(), id).await?;
    done("Sale deleted successfully")
}
