//! `/api/expenses`

use axum::extract::{Path, State};

use super::{created, done, ok, ok_with, CreatedResult, HandlerResult};
use crate::api::{ExpenseCategory, ExpenseDetails, ExpenseId};
use crate::http::extract::{parse_id, Form, JsonRecord, QueryRecord};
use crate::http::state::AppState;
use crate::services::expenses;
use crate::services::stats::{self, ExpenseStats};

/// GET /api/expenses
///
/// Filters: `category_id`, `status`, `event_id`, `limit`.
pub async fn list_expenses(
    State(state): State<AppState>,
    QueryRecord(query): QueryRecord,
) -> HandlerResult<Vec<ExpenseDetails>> {
    let filter = expenses::parse_filter(&query)?;
    ok(expenses::list_expenses(state.repo(), state.store(), &filter).await?)
}

/// GET /api/expenses/stats
pub async fn expense_stats(State(state): State<AppState>) -> HandlerResult<ExpenseStats> {
    ok(stats::load_expense_stats(state.repo()).await?)
}

/// GET /api/expenses/categories
///
/// Categories in display order, each with its subcategories.
pub async fn list_categories(State(state): State<AppState>) -> HandlerResult<Vec<ExpenseCategory>> {
    ok(expenses::list_categories(state.repo()).await?)
}

/// GET /api/expenses/{id}
pub async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<ExpenseDetails> {
    let id: ExpenseId = parse_id(&id)?;
    ok(expenses::get_expense(state.repo(), state.store(), id).await?)
}

/// POST /api/expenses
///
/// JSON or multipart with an optional `receipt` file.
pub async fn create_expense(
    State(state): State<AppState>,
    Form(submission): Form,
) -> CreatedResult<ExpenseDetails> {
    let expense = expenses::create_expense(
        state.repo(),
        state.store(),
        submission,
        state.config.max_upload_bytes,
    )
    .await?;
    created(expense, "Expense recorded successfully")
}

/// PATCH /api/expenses/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonRecord(body): JsonRecord,
) -> HandlerResult<ExpenseDetails> {
    let id: ExpenseId = parse_id(&id)?;
    let expense = expenses::set_status(state.repo(), state.store(), id, &body).await?;
    let message = format!("Expense {}", expense.expense.status);
    ok_with(expense, message)
}

/// DELETE /api/expenses/{id}
pub async fn delete_expense(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult<()> {
    let id: ExpenseId = parse_id(&id)?;
    expenses::delete_expense(state.repo(), state.store(), id).await?;
    done("Expense deleted successfully")
}
