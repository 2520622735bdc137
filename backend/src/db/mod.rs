//! Persistence layer for the back-office data.
//!
//! This module provides abstractions for database operations via the Repository
//! pattern, allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (crate::services) - Business Rules       │
//! │  - Request validation                                    │
//! │  - Pricing and receipt orchestration                     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────────┐
//!     │                                      │
//! ┌───▼──────────────────┐   ┌───────────────▼──────────────┐
//! │ Postgres Repository  │   │ Local Repository             │
//! │ (Diesel + r2d2)      │   │ (in-memory)                  │
//! └──────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! The repository is built once at startup by [`RepositoryFactory`] and passed
//! to the HTTP state as an `Arc<dyn FullRepository>`.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod seed;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    CalculationRepository, CatalogRepository, ErrorContext, ExpenseRepository, FullRepository,
    RepositoryError, RepositoryResult, SalesRepository,
};
