use crate::providers::ProviderError;

/// Errors returned by [`AiSdkClient::create_chat_completion`](crate::adapter::AiSdkClient::create_chat_completion).
///
/// Provider failures pass through unchanged; the adapter only adds the
/// request-shape check it performs itself.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AdapterError {
    /// The underlying provider error, if this failure came from the provider.
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(err) => Some(err),
            Self::MalformedRequest(_) => None,
        }
    }

    /// True when the provider could not produce schema-conforming output.
    pub fn is_schema_validation(&self) -> bool {
        matches!(
            self,
            Self::Provider(ProviderError::SchemaValidation { .. })
        )
    }
}
