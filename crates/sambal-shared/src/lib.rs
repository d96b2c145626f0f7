//! # Sambal Shared
//!
//! Wire types shared between the storefront frontend and the API server:
//! request bodies for the website forms, the JSON response envelope and
//! field validation.

pub mod dto;
pub mod response;
pub mod validation;

pub use response::{ApiResponse, ErrorResponse};
pub use validation::FieldErrors;
