//! Structured log lines and tracing setup.
//!
//! The adapter reports to a caller-supplied [`Logger`] callback using the
//! automation layer's `LogLine` shape. [`tracing_logger`] bridges that callback
//! into `tracing`, and [`init_tracing`] installs the global subscriber.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Caller-supplied log sink. Must not panic; the adapter does not guard it.
pub type Logger = Arc<dyn Fn(&LogLine) + Send + Sync>;

/// Verbosity of a log line: 0 = errors, 1 = info, 2 = debug.
pub type LogLevel = u8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<IndexMap<String, AuxiliaryValue>>,
}

impl LogLine {
    pub fn new(category: impl Into<String>, message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            category: Some(category.into()),
            message: message.into(),
            level: Some(level),
            timestamp: None,
            auxiliary: None,
        }
    }

    pub fn with_auxiliary(mut self, key: impl Into<String>, value: AuxiliaryValue) -> Self {
        self.auxiliary
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn auxiliary_value(&self, key: &str) -> Option<&str> {
        self.auxiliary
            .as_ref()
            .and_then(|aux| aux.get(key))
            .map(|v| v.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryValue {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: AuxiliaryType,
}

impl AuxiliaryValue {
    pub fn object(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: AuxiliaryType::Object,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: AuxiliaryType::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuxiliaryType {
    Object,
    String,
    Html,
    Integer,
    Float,
    Boolean,
}

/// Render a log line as
/// `{timestamp}::[stagehand:{category}] {message} {auxiliary-json}`.
///
/// Lines carrying an `error` auxiliary entry render the error value and the
/// `trace` entry on their own lines instead.
pub fn log_line_to_string(line: &LogLine, hide_auxiliary: bool) -> String {
    let timestamp = line
        .timestamp
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
    let category = line.category.as_deref().unwrap_or_default();

    if let Some(error) = line.auxiliary_value("error") {
        let trace = line.auxiliary_value("trace").unwrap_or_default();
        return format!(
            "{timestamp}::[stagehand:{category}] {}\n {error}\n {trace}",
            line.message
        );
    }

    let auxiliary = match (&line.auxiliary, hide_auxiliary) {
        (Some(aux), false) => match serde_json::to_string(aux) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to serialize log auxiliary");
                return "error logging line".to_string();
            }
        },
        _ => String::new(),
    };

    format!(
        "{timestamp}::[stagehand:{category}] {} {auxiliary}",
        line.message
    )
}

/// A [`Logger`] that re-emits each line as a `tracing` event.
pub fn tracing_logger(hide_auxiliary: bool) -> Logger {
    Arc::new(move |line: &LogLine| {
        let category = line.category.as_deref().unwrap_or_default();
        let auxiliary = if hide_auxiliary {
            String::new()
        } else {
            line.auxiliary
                .as_ref()
                .and_then(|aux| serde_json::to_string(aux).ok())
                .unwrap_or_default()
        };

        match line.level.unwrap_or(1) {
            0 => tracing::error!(category = %category, auxiliary = %auxiliary, "{}", line.message),
            1 => tracing::info!(category = %category, auxiliary = %auxiliary, "{}", line.message),
            _ => tracing::debug!(category = %category, auxiliary = %auxiliary, "{}", line.message),
        }
    })
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.level;
        EnvFilter::new(format!("chatbridge={level},warn"))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let result = if config.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}
