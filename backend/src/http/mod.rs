//! HTTP server module for the back-office API.
//!
//! An axum router exposing the service layer as a JSON REST API under
//! `/api`. Handlers stay thin: they extract the raw request, call one service
//! function and wrap the result in the response envelope.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Multipart / JSON / query extraction                    │
//! │  - Response envelope and status mapping                   │
//! │  - CORS, compression, tracing, body limit                 │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (crate::services)                          │
//! │  - Validation and business rules                          │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Gateways (crate::db, crate::storage)                     │
//! │  - LocalRepository / PostgresRepository                   │
//! │  - LocalStorage / SupabaseStorage                         │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::AppError;
pub use router::create_router;
pub use state::AppState;
