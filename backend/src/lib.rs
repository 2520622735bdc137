//! # Summer Back-Office Backend
//!
//! Ticket sales, expense tracking and event financial projections for a
//! festival operator, exposed as a JSON REST API.
//!
//! ## Features
//!
//! - **Validation**: Uniform field, number, text, contact and upload checks
//! - **Projections**: Deterministic revenue / cost / break-even figures for an event scenario
//! - **Scenario comparison**: Rank several attendance and price scenarios by revenue
//! - **Sales**: Package and individual ticket sales with receipt uploads
//! - **Expenses**: Categorized expenses with an approval workflow
//! - **Catalog**: Events and package bundles
//! - **HTTP API**: RESTful endpoints served by Axum
//!
//! ## Architecture
//!
//! - [`api`]: Identifier types and the public DTO surface
//! - [`models`]: Persistence records and their status enums
//! - [`services`]: Validators, the projection engine, reporting and per-endpoint orchestration
//! - [`db`]: Repository traits (persistence gateway) and their implementations
//! - [`storage`]: Object storage gateway for receipts and documents
//! - [`http`]: Axum router, handlers and error mapping
//!

// RepositoryError carries an ErrorContext for diagnostics
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;

pub mod db;
pub mod models;

pub mod services;
pub mod storage;

#[cfg(feature = "http-server")]
pub mod http;
