//! `nutriplan-core` — shared foundation types.
//!
//! This crate contains **pure** primitives (no infrastructure concerns) used by
//! the forecasting crates: tenant identity and the domain error model.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::TenantId;
