//! Persistence records.
//!
//! One module per table family. Records are what the repository layer reads
//! and writes; the `New*` structs are insert payloads and the `*Changes`
//! structs are partial updates.

pub mod macros;

pub mod calculation;
pub mod event;
pub mod expense;
pub mod package;
pub mod sale;
