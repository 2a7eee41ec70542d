//! HTTP client for the Subtext backend.

mod client;
mod error;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind, ApiResult};
