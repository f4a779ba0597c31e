//! Chat-completion adapter.
//!
//! [`AiSdkClient`] accepts a chat-completion style request, normalizes its
//! messages, and drives exactly one primitive of a [`LanguageModel`]:
//! schema-constrained object generation when a response model is requested,
//! free-form text/tool-call generation otherwise.

pub mod normalize;
pub mod tools;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::AdapterError;
use crate::logging::{AuxiliaryValue, LogLine, Logger};
use crate::providers::LanguageModel;
use crate::providers::types::{
    CallSettings, ChatCompletionOptions, ChatResponse, GenerateObjectRequest, GenerateTextRequest,
    GenerateTextResponse,
};

pub use self::normalize::{IMAGE_PLACEHOLDER, normalize_message, normalize_messages};
pub use self::tools::build_tool_set;

/// Category label attached to every log line the adapter emits.
pub const LOG_CATEGORY: &str = "aisdk";

const DEFAULT_RETRIES: u32 = 3;

/// Arguments to [`AiSdkClient::create_chat_completion`].
#[derive(Clone)]
pub struct CreateChatCompletionOptions {
    pub options: ChatCompletionOptions,
    /// Informational only; the adapter never retries.
    pub retries: u32,
    pub logger: Option<Logger>,
}

impl CreateChatCompletionOptions {
    pub fn new(options: ChatCompletionOptions) -> Self {
        Self {
            options,
            retries: DEFAULT_RETRIES,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

impl fmt::Debug for CreateChatCompletionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateChatCompletionOptions")
            .field("options", &self.options)
            .field("retries", &self.retries)
            .field("logger", &self.logger.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Result of one chat completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatCompletionResult {
    /// Schema-mode output, exactly as the provider produced it.
    Object(serde_json::Value),
    /// Free-form text and tool calls.
    Text(GenerateTextResponse),
}

impl ChatCompletionResult {
    pub fn as_object(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Object(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&GenerateTextResponse> {
        match self {
            Self::Text(response) => Some(response),
            Self::Object(_) => None,
        }
    }

    pub fn into_object(self) -> Option<serde_json::Value> {
        match self {
            Self::Object(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// OpenAI-shaped view of a free-form result.
    pub fn into_chat_response(self, model: &str) -> Option<ChatResponse> {
        match self {
            Self::Text(response) => Some(response.into_chat_response(model)),
            Self::Object(_) => None,
        }
    }
}

/// LLM client that adapts chat-completion requests to a [`LanguageModel`].
///
/// Stateless apart from the model handle, so one client can serve concurrent
/// requests.
#[derive(Clone)]
pub struct AiSdkClient {
    model: Arc<dyn LanguageModel>,
    model_name: String,
}

impl AiSdkClient {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        let model_name = model.model_id().to_string();
        Self { model, model_name }
    }

    /// Client kind reported to the automation layer.
    pub fn client_type(&self) -> &'static str {
        LOG_CATEGORY
    }

    /// Identifier of the model this client was constructed with.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Run one chat completion.
    ///
    /// Calls exactly one provider primitive. Provider failures are returned
    /// unchanged; a content part that is neither text nor image fails with
    /// [`AdapterError::MalformedRequest`] before the provider is contacted.
    #[instrument(skip_all, fields(model = %self.model_name))]
    pub async fn create_chat_completion(
        &self,
        request: CreateChatCompletionOptions,
    ) -> Result<ChatCompletionResult, AdapterError> {
        let CreateChatCompletionOptions {
            options,
            retries,
            logger,
        } = request;

        if let Some(logger) = &logger {
            let line = LogLine::new(LOG_CATEGORY, "creating chat completion", 1)
                .with_auxiliary("options", AuxiliaryValue::object(to_json(&options)))
                .with_auxiliary("modelName", AuxiliaryValue::string(self.model_name.as_str()));
            logger(&line);
        }

        let messages = normalize_messages(&options.messages)?;
        let settings = CallSettings::from(&options);

        let result = if let Some(response_model) = options.response_model {
            debug!(
                schema = %response_model.name,
                messages = messages.len(),
                retries,
                "Dispatching object generation"
            );
            let request = GenerateObjectRequest {
                messages,
                schema: response_model.schema,
                schema_name: Some(response_model.name),
                settings,
            };
            let response = self.model.generate_object(&request).await?;
            ChatCompletionResult::Object(response.object)
        } else {
            let tools = build_tool_set(options.tools.as_deref());
            debug!(
                tools = tools.as_ref().map_or(0, |t| t.len()),
                messages = messages.len(),
                retries,
                "Dispatching text generation"
            );
            let request = GenerateTextRequest {
                messages,
                tools,
                settings,
            };
            let response = self.model.generate_text(&request).await?;
            ChatCompletionResult::Text(response)
        };

        if let Some(logger) = &logger {
            let line = LogLine::new(LOG_CATEGORY, "response", 1)
                .with_auxiliary("response", AuxiliaryValue::object(to_json(&result)));
            logger(&line);
        }

        Ok(result)
    }
}

impl fmt::Debug for AiSdkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiSdkClient")
            .field("provider", &self.model.provider())
            .field("model_name", &self.model_name)
            .finish()
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
