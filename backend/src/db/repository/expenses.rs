//! Expense repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::api::*;

/// Repository trait for expense categories and expenses.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// All categories by sort order, each with its subcategories.
    async fn list_categories(&self) -> RepositoryResult<Vec<ExpenseCategory>>;

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Option<ExpenseCategory>>;

    async fn get_subcategory(
        &self,
        id: SubcategoryId,
    ) -> RepositoryResult<Option<ExpenseSubcategory>>;

    /// List expenses newest first with category, subcategory and event names.
    async fn list_expenses(&self, filter: &ExpenseFilter) -> RepositoryResult<Vec<ExpenseDetails>>;

    async fn get_expense(&self, id: ExpenseId) -> RepositoryResult<Option<ExpenseDetails>>;

    async fn insert_expense(&self, expense: NewExpense) -> RepositoryResult<Expense>;

    /// Set the status. `payment_date` overwrites the stored date only when `Some`.
    async fn set_expense_status(
        &self,
        id: ExpenseId,
        status: ExpenseStatus,
        payment_date: Option<NaiveDate>,
    ) -> RepositoryResult<Option<Expense>>;

    /// Delete an expense, returning the removed row.
    async fn delete_expense(&self, id: ExpenseId) -> RepositoryResult<Option<Expense>>;
}
