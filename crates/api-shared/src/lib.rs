//! # API Shared
//!
//! Shared definitions for the civic intake APIs.
//!
//! Contains:
//! - Request/response DTOs with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//!
//! The DTOs carry no domain logic; `api-rest` converts between them and `civic-core` types.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
