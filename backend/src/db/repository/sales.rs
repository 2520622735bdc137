//! Sales repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::api::*;

/// Repository trait for ticket sales and their event links.
#[async_trait]
pub trait SalesRepository: Send + Sync {
    /// List sales newest first, each with its package and linked events.
    async fn list_sales(&self, filter: &SaleFilter) -> RepositoryResult<Vec<SaleDetails>>;

    async fn get_sale(&self, id: SaleId) -> RepositoryResult<Option<SaleDetails>>;

    async fn insert_sale(&self, sale: NewSale) -> RepositoryResult<Sale>;

    /// Link a sale to the events it grants access to.
    async fn link_sale_events(&self, id: SaleId, event_ids: &[EventId]) -> RepositoryResult<()>;

    /// Set the delivery flag and date. `Ok(None)` if the sale does not exist.
    async fn set_delivery(
        &self,
        id: SaleId,
        delivered: bool,
        delivery_date: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Option<Sale>>;

    async fn set_payment_status(
        &self,
        id: SaleId,
        status: PaymentStatus,
    ) -> RepositoryResult<Option<Sale>>;

    /// Delete a sale and its event links, returning the removed row.
    async fn delete_sale(&self, id: SaleId) -> RepositoryResult<Option<Sale>>;

    /// Whether any sale is linked to the event.
    async fn event_has_sales(&self, event_id: EventId) -> RepositoryResult<bool>;

    /// Whether any sale references the package.
    async fn package_has_sales(&self, package_id: PackageId) -> RepositoryResult<bool>;
}
