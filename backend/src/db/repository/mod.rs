//! Repository trait definitions for database operations.
//!
//! This module provides a collection of focused repository traits that abstract
//! database operations. By splitting responsibilities across multiple traits,
//! implementations can be more focused and testable.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`catalog`]: Events, packages and package/event links
//! - [`sales`]: Ticket sales and sale/event links
//! - [`expenses`]: Expense categories and expenses
//! - [`calculations`]: Stored financial projections
//!
//! # Convenience Trait Bound
//!
//! For code that needs all repository capabilities, use [`FullRepository`]:
//!
//! ```ignore
//! async fn my_service(repo: &dyn FullRepository) -> RepositoryResult<()> {
//!     let events = repo.list_events(&EventFilter::default()).await?;
//!     let sales = repo.list_sales(&SaleFilter::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod calculations;
pub mod catalog;
pub mod error;
pub mod expenses;
pub mod sales;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use calculations::CalculationRepository;
pub use catalog::CatalogRepository;
pub use expenses::ExpenseRepository;
pub use sales::SalesRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all four
/// repository traits.
pub trait FullRepository:
    CatalogRepository + SalesRepository + ExpenseRepository + CalculationRepository
{
}

impl<T> FullRepository for T where
    T: CatalogRepository + SalesRepository + ExpenseRepository + CalculationRepository
{
}
