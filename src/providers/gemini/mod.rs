//! Gemini (Google) Provider
//!
//! Implements [`LanguageModel`] over the Generative Language REST API
//! (`models/{model}:generateContent`). Free-form generation maps tools to
//! function declarations; object generation uses JSON mode with a sanitized
//! `responseSchema` and validates the parsed output against the caller's
//! schema.

pub mod request;
pub mod response;
pub mod schema;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{Instrument, debug, debug_span, warn};
use url::Url;

use crate::config::ProviderConfig;
use crate::providers::types::{
    GenerateObjectRequest, GenerateObjectResponse, GenerateTextRequest, GenerateTextResponse,
};
use crate::providers::{LanguageModel, ProviderError, ProviderFuture};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PROVIDER_ID: &str = "gemini";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Gemini Provider
// ---------------------------------------------------------------------------

/// Language model backed by the Google Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::default()
    }

    /// Build a provider from configuration; fails without an API key.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut builder = Self::builder()
            .model(&config.model)
            .base_url(&config.base_url)
            .timeout(Duration::from_secs(config.timeout_secs));
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key);
        }
        builder.build()
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// POST a request body and return the parsed JSON response.
    async fn post(&self, body: &Value) -> Result<Value, ProviderError> {
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let text = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), model = %self.model, "Gemini request failed");

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::Authentication(error_message(&text))
            }
            _ => ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            },
        })
    }
}

/// Prefer the `error.message` field of a Google error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// LanguageModel implementation
// ---------------------------------------------------------------------------

impl LanguageModel for GeminiProvider {
    fn provider(&self) -> &str {
        PROVIDER_ID
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn generate_text<'a>(
        &'a self,
        request: &'a GenerateTextRequest,
    ) -> ProviderFuture<'a, GenerateTextResponse> {
        Box::pin(async move {
            let body = request::build_text_body(
                &request.messages,
                request.tools.as_ref(),
                &request.settings,
            );
            let raw = self.post(&body).await?;
            let parsed = response::parse_text_response(&raw)?;
            debug!(
                tool_calls = parsed.tool_calls.len(),
                finish_reason = ?parsed.finish_reason,
                "Gemini text generation complete"
            );
            Ok(parsed)
        }
        .instrument(debug_span!("gemini.generate_text", model = %self.model)))
    }

    fn generate_object<'a>(
        &'a self,
        request: &'a GenerateObjectRequest,
    ) -> ProviderFuture<'a, GenerateObjectResponse> {
        Box::pin(async move {
            let body = request::build_object_body(&request.messages, &request.schema, &request.settings);
            let raw = self.post(&body).await?;
            let parsed = response::parse_text_response(&raw)?;

            let object = response::parse_json_text(&parsed.text)?;
            schema::validate(&object, &request.schema)
                .map_err(|message| ProviderError::SchemaValidation { message })?;
            debug!(
                schema = request.schema_name.as_deref().unwrap_or("<unnamed>"),
                "Gemini object generation complete"
            );

            Ok(GenerateObjectResponse {
                object,
                finish_reason: parsed.finish_reason,
                usage: parsed.usage,
            })
        }
        .instrument(debug_span!("gemini.generate_object", model = %self.model)))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiProviderBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<GeminiProvider, ProviderError> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::NoToken {
                provider: PROVIDER_ID.to_string(),
            })?;

        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url)
            .map_err(|e| ProviderError::Other(format!("Invalid base URL {base_url}: {e}")))?;

        let http = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(GeminiProvider {
            http,
            api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}
