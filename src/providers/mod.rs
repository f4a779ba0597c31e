//! Generation Provider Module
//!
//! Defines the `LanguageModel` trait the adapter drives, the provider error
//! type, and the concrete Gemini implementation.

pub mod gemini;
pub mod types;

use std::future::Future;
use std::pin::Pin;

use crate::providers::types::{
    GenerateObjectRequest, GenerateObjectResponse, GenerateTextRequest, GenerateTextResponse,
};

pub use self::gemini::GeminiProvider;

// ---------------------------------------------------------------------------
// ProviderError
// ---------------------------------------------------------------------------

/// Errors that can occur during provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No API key available for {provider}")]
    NoToken { provider: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Generated object does not match schema: {message}")]
    SchemaValidation { message: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("{0}")]
    Other(String),
}

/// Boxed future returned by [`LanguageModel`] methods.
pub type ProviderFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

// ---------------------------------------------------------------------------
// LanguageModel trait
// ---------------------------------------------------------------------------

/// A generation provider bound to one model.
///
/// Async methods return boxed futures so the trait is dyn-compatible (can be
/// used as `Arc<dyn LanguageModel>`).
pub trait LanguageModel: Send + Sync {
    /// Provider identifier (e.g. "gemini").
    fn provider(&self) -> &str;

    /// Model identifier (e.g. "gemini-2.0-flash").
    fn model_id(&self) -> &str;

    /// Free-form generation, optionally tool-augmented.
    fn generate_text<'a>(
        &'a self,
        request: &'a GenerateTextRequest,
    ) -> ProviderFuture<'a, GenerateTextResponse>;

    /// Schema-constrained generation. Fails with
    /// [`ProviderError::SchemaValidation`] when the output does not conform.
    fn generate_object<'a>(
        &'a self,
        request: &'a GenerateObjectRequest,
    ) -> ProviderFuture<'a, GenerateObjectResponse>;
}
