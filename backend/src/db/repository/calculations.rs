//! Calculation repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::*;

/// Repository trait for stored financial projections.
#[async_trait]
pub trait CalculationRepository: Send + Sync {
    /// List calculations newest first, each with its event summary.
    async fn list_calculations(
        &self,
        filter: &CalculationFilter,
    ) -> RepositoryResult<Vec<CalculationDetails>>;

    async fn get_calculation(
        &self,
        id: CalculationId,
    ) -> RepositoryResult<Option<CalculationDetails>>;

    async fn insert_calculation(&self, calculation: NewCalculation) -> RepositoryResult<Calculation>;

    /// Delete a calculation, returning whether a row was removed.
    async fn delete_calculation(&self, id: CalculationId) -> RepositoryResult<bool>;
}
