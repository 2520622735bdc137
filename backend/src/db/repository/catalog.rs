//! Catalog repository trait: events and package bundles.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::*;

/// Repository trait for events, packages and the package/event links.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is healthy
    /// - `Ok(false)` if it is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Events ====================

    /// List events ordered by date, earliest first.
    ///
    /// # Arguments
    /// * `filter` - Status / city / active-only filters and an optional limit
    async fn list_events(&self, filter: &EventFilter) -> RepositoryResult<Vec<Event>>;

    /// Fetch one event, `Ok(None)` if it does not exist.
    async fn get_event(&self, id: EventId) -> RepositoryResult<Option<Event>>;

    /// Fetch every event whose id is in `ids`. Missing ids are skipped, so
    /// callers compare the length to detect them.
    async fn get_events(&self, ids: &[EventId]) -> RepositoryResult<Vec<Event>>;

    async fn event_slug_exists(&self, slug: &str) -> RepositoryResult<bool>;

    /// Insert an event.
    ///
    /// # Returns
    /// * `Ok(Event)` - The stored row with its assigned id
    /// * `Err(RepositoryError::ConflictError)` - If the slug is already taken
    async fn insert_event(&self, event: NewEvent) -> RepositoryResult<Event>;

    /// Apply a partial update. `Ok(None)` if the event does not exist.
    async fn update_event(&self, id: EventId, changes: &EventChanges) -> RepositoryResult<Option<Event>>;

    /// Delete an event, returning whether a row was removed.
    async fn delete_event(&self, id: EventId) -> RepositoryResult<bool>;

    // ==================== Packages ====================

    /// List packages, newest first.
    async fn list_packages(&self, active_only: bool) -> RepositoryResult<Vec<Package>>;

    async fn get_package(&self, id: PackageId) -> RepositoryResult<Option<Package>>;

    async fn package_slug_exists(&self, slug: &str) -> RepositoryResult<bool>;

    async fn insert_package(&self, package: NewPackage) -> RepositoryResult<Package>;

    async fn update_package(
        &self,
        id: PackageId,
        changes: &PackageChanges,
    ) -> RepositoryResult<Option<Package>>;

    /// Delete a package and its event links, returning whether a row was removed.
    async fn delete_package(&self, id: PackageId) -> RepositoryResult<bool>;

    /// Events linked to a package, in link order.
    async fn package_events(&self, id: PackageId) -> RepositoryResult<Vec<Event>>;

    /// Replace the package's event links with `event_ids`.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ConflictError)` - If an id references no event
    async fn replace_package_events(
        &self,
        id: PackageId,
        event_ids: &[EventId],
    ) -> RepositoryResult<()>;
}
