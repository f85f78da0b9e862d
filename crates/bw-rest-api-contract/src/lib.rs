//! BuildWise REST API contract types and validation
//!
//! This crate defines the request/response bodies exchanged with the
//! BuildWise backend while a trade (milestone) moves through its completion
//! and acceptance workflow. The types are shared between the HTTP client,
//! the scenario-driven mock client and the workflow core.

pub mod error;
pub mod types;
pub mod validation;

pub use error::*;
pub use types::*;
pub use validation::*;
