use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the generation provider backing the adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    /// Drop the auxiliary payload (request/response JSON) from rendered log lines.
    #[serde(default)]
    pub hide_auxiliary: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            hide_auxiliary: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
const fn default_timeout_secs() -> u64 {
    120
}
fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file (defaults when the file is absent),
    /// then apply overrides from the process environment. A `.env` file in the
    /// working directory is loaded into the environment first.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_file.display());
        }
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Like [`Config::load`], with overrides read through `lookup` instead of
    /// the process environment.
    pub fn load_with<F>(path: &Path, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides(lookup);
        config.check();
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    ///
    /// | Setting                | Variable                          |
    /// |------------------------|-----------------------------------|
    /// | provider.api_key       | `GOOGLE_GENERATIVE_AI_API_KEY`    |
    /// | provider.model         | `CHATBRIDGE_MODEL`                |
    /// | provider.base_url      | `CHATBRIDGE_BASE_URL`             |
    /// | provider.timeout_secs  | `CHATBRIDGE_TIMEOUT_SECS`         |
    /// | logging.level          | `CHATBRIDGE_LOG_LEVEL`            |
    /// | logging.json           | `CHATBRIDGE_LOG_JSON`             |
    /// | logging.hide_auxiliary | `CHATBRIDGE_HIDE_AUXILIARY`       |
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        macro_rules! env_str {
            ($env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = val;
                }
            };
        }
        macro_rules! env_bool {
            ($env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                }
            };
        }
        macro_rules! env_parse {
            ($env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    match val.parse() {
                        Ok(parsed) => $field = parsed,
                        Err(_) => tracing::warn!(var = $env, value = %val, "Ignoring unparsable override"),
                    }
                }
            };
        }

        if let Some(key) = lookup("GOOGLE_GENERATIVE_AI_API_KEY") {
            self.provider.api_key = Some(key);
        }
        env_str!("CHATBRIDGE_MODEL", self.provider.model);
        env_str!("CHATBRIDGE_BASE_URL", self.provider.base_url);
        env_parse!("CHATBRIDGE_TIMEOUT_SECS", self.provider.timeout_secs);
        env_str!("CHATBRIDGE_LOG_LEVEL", self.logging.level);
        env_bool!("CHATBRIDGE_LOG_JSON", self.logging.json);
        env_bool!("CHATBRIDGE_HIDE_AUXILIARY", self.logging.hide_auxiliary);
    }

    fn check(&self) {
        if self.provider.api_key.as_deref().is_none_or(str::is_empty) {
            tracing::warn!(
                "GOOGLE_GENERATIVE_AI_API_KEY not found in environment variables or config"
            );
        }
    }
}
