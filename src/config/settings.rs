//! Application settings and configuration
//!
//! Settings come from a YAML/TOML/JSON file (format chosen by extension),
//! overridden by `KEY_ROTATOR__*` environment variables. A `.env` file is
//! loaded first if present.

use crate::services::adapters::TargetKind;
use crate::services::key_pool::{CredentialPool, DEFAULT_MASK_PREFIX};
use crate::services::providers::{ProviderError, DEFAULT_RETRYABLE_STATUSES, DEFAULT_TIMEOUT_SECS};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

/// Config file read when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

/// Prefix of environment variables overriding file values
pub const ENV_PREFIX: &str = "KEY_ROTATOR";

/// Separator between nested keys in environment variable names
pub const ENV_SEPARATOR: &str = "__";

/// Separator between keys in an `API_KEYS` environment override
pub const ENV_LIST_SEPARATOR: &str = ",";

/// One named target: where to send requests and which keys to rotate through
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Adapter shape; inferred from the target name when omitted
    #[serde(default)]
    pub kind: Option<TargetKind>,

    /// Base URL of the API (provider default when omitted)
    #[serde(default)]
    pub base_url: Option<String>,

    /// OpenAI organization header
    #[serde(default)]
    pub organization: Option<String>,

    /// Model ID sent with every request
    pub model: String,

    /// One key or a list of keys, tried in order
    pub api_keys: CredentialPool,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// HTTP statuses that switch to the next key
    #[serde(default = "default_retry_on_status")]
    pub retry_on_status: Vec<u16>,
}

impl TargetConfig {
    /// Explicit kind, or the one implied by the target name
    pub fn resolved_kind(&self, name: &str) -> Result<TargetKind, ProviderError> {
        match self.kind {
            Some(kind) => Ok(kind),
            None => TargetKind::infer_from_name(name),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Leading key characters shown in logs
    #[serde(default = "default_mask_prefix")]
    pub mask_prefix: usize,

    /// Targets by name
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mask_prefix() -> usize {
    DEFAULT_MASK_PREFIX
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_retry_on_status() -> Vec<u16> {
    DEFAULT_RETRYABLE_STATUSES.to_vec()
}

impl Settings {
    /// Load settings from `path` (or [`DEFAULT_CONFIG_PATH`]) plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let mut settings = Self::from_file(path)?;

        if let Ok(level) = env::var("LOG_LEVEL") {
            settings.log_level = level;
        }

        settings.validate()?;

        Ok(settings)
    }

    /// Read a config file and apply `KEY_ROTATOR__*` overrides, without validating
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_env(path, env::vars().collect())
    }

    /// Same as [`Settings::from_file`], reading overrides from `vars` instead of the process environment
    pub fn from_file_with_env(path: &Path, vars: config::Map<String, String>) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let mut environment = config::Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true);

        // `KEY_ROTATOR__TARGETS__<NAME>__API_KEYS=k1,k2` is a list. Only those
        // keys are split; without a parse key list every value would be.
        let list_keys = api_key_list_keys(vars.keys());
        if !list_keys.is_empty() {
            environment = environment.list_separator(ENV_LIST_SEPARATOR);
            for key in &list_keys {
                environment = environment.with_list_parse_key(key);
            }
        }

        let raw = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(environment.source(Some(vars)))
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        raw.try_deserialize()
            .with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            anyhow::bail!("At least one target must be configured");
        }

        if self.mask_prefix == 0 {
            anyhow::bail!("mask_prefix must be > 0");
        }

        for (name, target) in &self.targets {
            target
                .resolved_kind(name)
                .with_context(|| format!("Target '{}' has no kind and its name implies none", name))?;

            if target.model.trim().is_empty() {
                anyhow::bail!("Target '{}': model must not be empty", name);
            }

            if let Some(base_url) = &target.base_url {
                reqwest::Url::parse(base_url)
                    .with_context(|| format!("Target '{}': invalid base_url '{}'", name, base_url))?;
            }

            if target.timeout_seconds == 0 {
                anyhow::bail!("Target '{}': timeout_seconds must be > 0", name);
            }

            if let Some(status) = target
                .retry_on_status
                .iter()
                .find(|s| !(400..=599).contains(*s))
            {
                anyhow::bail!(
                    "Target '{}': retry_on_status entry {} is not an HTTP error status",
                    name,
                    status
                );
            }
        }

        Ok(())
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.get(name)
    }

    /// Target names in sorted order
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }
}

/// Config keys (`targets.<name>.api_keys`) of every `API_KEYS` override in `vars`
fn api_key_list_keys<'a>(vars: impl Iterator<Item = &'a String>) -> Vec<String> {
    let prefix = format!("{}{}", ENV_PREFIX, ENV_SEPARATOR);
    let targets = format!("TARGETS{}", ENV_SEPARATOR);
    let suffix = format!("{}API_KEYS", ENV_SEPARATOR);

    vars.filter_map(|name| {
        let upper = name.to_uppercase();
        let rest = upper.strip_prefix(&prefix)?;
        if !rest.starts_with(&targets) || !rest.ends_with(&suffix) {
            return None;
        }
        Some(rest.to_lowercase().replace(ENV_SEPARATOR, "."))
    })
    .collect()
}
