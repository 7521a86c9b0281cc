//! Shared utilities, configuration, and error handling for the thrift marketplace
//!
//! This crate provides common functionality used across the domain crates:
//! - Configuration management following 12-factor principles
//! - The shared error taxonomy and its HTTP rendering
//! - Request extractors (validated JSON, pagination)
//! - Server-side clocks used to stamp records

pub mod clock;
pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
