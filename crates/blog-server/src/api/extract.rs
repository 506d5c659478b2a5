//! Request extractors

use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` body extractor whose rejection is a 400 in the standard error
/// envelope instead of axum's plain-text response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
