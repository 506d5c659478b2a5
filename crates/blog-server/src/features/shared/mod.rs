//! Shared utilities and types for feature modules
//!
//! - **pagination**: limit/offset query parameters and list metadata
//! - **validation**: input validation utilities
//! - **error_helpers**: database error handling utilities

pub mod error_helpers;
pub mod pagination;
pub mod validation;

// Re-export commonly used types
pub use pagination::{Page, PageMeta, PageParams};
pub use validation::{parse_id, IdValidationError};
