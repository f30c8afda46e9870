mod schema;

pub use schema::{
    EngineConfig, DEFAULT_MAX_CONDITION_DEPTH, DEFAULT_PATTERN_TIMEOUT_MS,
    DEFAULT_SUGGESTION_THRESHOLD,
};

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "FORMRULES_CONFIG";

const MAX_PATTERN_TIMEOUT_MS: u64 = 10_000;
const MAX_CONDITION_DEPTH_LIMIT: usize = 256;

/// path named by `FORMRULES_CONFIG`, if set
pub fn get_config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_ENV_VAR).map(PathBuf::from)
}

/// load the config named by `FORMRULES_CONFIG`, or defaults when unset
pub fn load_from_env() -> Result<EngineConfig> {
    match get_config_path() {
        Some(path) => load(&path),
        None => Ok(EngineConfig::default()),
    }
}

pub fn load(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Err(anyhow!("config file not found: {}", path.display()));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: EngineConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    let errors = verify(&config);
    if !errors.is_empty() {
        return Err(anyhow!(
            "invalid config file {}: {}",
            path.display(),
            errors.join("; ")
        ));
    }

    Ok(config)
}

/// Verify configuration values and return a list of errors
pub fn verify(config: &EngineConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.pattern_timeout_ms == 0 || config.pattern_timeout_ms > MAX_PATTERN_TIMEOUT_MS {
        errors.push(format!(
            "pattern_timeout_ms {} out of range (1-{})",
            config.pattern_timeout_ms, MAX_PATTERN_TIMEOUT_MS
        ));
    }

    if config.max_condition_depth == 0 || config.max_condition_depth > MAX_CONDITION_DEPTH_LIMIT {
        errors.push(format!(
            "max_condition_depth {} out of range (1-{})",
            config.max_condition_depth, MAX_CONDITION_DEPTH_LIMIT
        ));
    }

    errors
}
