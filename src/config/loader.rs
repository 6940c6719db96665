use std::{collections::HashMap, fs, path::Path};

use log::info;
use serde::Deserialize;

use crate::client::Query;
use crate::error::{AppError, Context, Result};
use crate::inspect::View;

use super::{validator, ApiConfig, CheckConfig, Config};

/// Environment variable that replaces `api.base_url` when set.
pub const BASE_URL_ENV: &str = "API_PROBE_BASE_URL";

/// Read a JSON probe configuration. Omitted sections fall back to the builtin values.
pub fn load_config(path: &Path) -> Result<Config> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read probe config JSON at {}", path.display()))?;

    let raw: RawConfig = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse probe config JSON at {}", path.display()))?;

    raw.into_config()
}

/// Builtin or file config, with environment overrides applied and validated.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            info!("Loading probe config from {}", path.display());
            load_config(path)?
        }
        None => Config::builtin(),
    };

    apply_env_overrides(&mut config);
    validator::validate_config(&config)?;
    Ok(config)
}

pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        if !base_url.trim().is_empty() {
            info!("Using {} from {}", base_url, BASE_URL_ENV);
            config.api.base_url = base_url.trim().to_string();
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    api: Option<RawApiConfig>,
    #[serde(default)]
    checks: Option<Vec<RawCheckConfig>>,
}

impl RawConfig {
    fn into_config(self) -> Result<Config> {
        let builtin = Config::builtin();

        let api = match self.api {
            Some(raw) => raw.into_api_config(builtin.api),
            None => builtin.api,
        };

        let checks = match self.checks {
            Some(raw) => raw
                .into_iter()
                .map(RawCheckConfig::into_check_config)
                .collect::<Result<Vec<_>>>()?,
            None => builtin.checks,
        };

        Ok(Config { api, checks })
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawApiConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    #[serde(default)]
    dump_limit: Option<usize>,
}

impl RawApiConfig {
    fn into_api_config(self, defaults: ApiConfig) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            headers: self.headers.unwrap_or(defaults.headers),
            dump_limit: self.dump_limit.unwrap_or(defaults.dump_limit),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCheckConfig {
    name: String,
    endpoint: String,
    #[serde(default)]
    query: Query,
    view: String,
}

impl RawCheckConfig {
    fn into_check_config(self) -> Result<CheckConfig> {
        let view: View = self.view.parse().map_err(|err: AppError| {
            AppError::message(format!("check `{}`: {}", self.name, err))
        })?;

        Ok(CheckConfig {
            name: self.name,
            endpoint: self.endpoint,
            query: self.query,
            view,
        })
    }
}
