//! Chat-completion adapter for browser-automation agents.
//!
//! Translates OpenAI-style chat requests into calls on a generic
//! [`LanguageModel`], with a Google Gemini implementation included.

pub mod adapter;
pub mod config;
pub mod error;
pub mod logging;
pub mod providers;

pub use crate::adapter::{AiSdkClient, ChatCompletionResult, CreateChatCompletionOptions};
pub use crate::config::Config;
pub use crate::error::AdapterError;
pub use crate::logging::{LogLine, Logger};
pub use crate::providers::{GeminiProvider, LanguageModel, ProviderError};
