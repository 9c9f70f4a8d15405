//! Configuration management module
//!
//! This module handles loading and validating application configuration
//! from config files, environment variables and .env files.

pub mod settings;

pub use settings::{
    Settings, TargetConfig, DEFAULT_CONFIG_PATH, ENV_LIST_SEPARATOR, ENV_PREFIX, ENV_SEPARATOR,
};
