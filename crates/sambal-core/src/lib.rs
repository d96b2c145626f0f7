//! # Sambal Core
//!
//! The domain layer of the storefront backend.
//! Rate-limit policies, campaign definitions, catalog and form submissions,
//! plus the ports infrastructure must implement. No I/O lives here.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::DomainError;
