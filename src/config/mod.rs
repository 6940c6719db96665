use std::collections::HashMap;

use serde_json::json;

use crate::client::Query;
use crate::inspect::{View, RAW_DUMP_LIMIT};

pub mod loader;
pub mod validator;

pub use loader::{load_config, BASE_URL_ENV};
pub use validator::validate_config;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how the gateway is reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Header values may reference `${ENV_VAR}` placeholders.
    pub headers: HashMap<String, String>,
    pub dump_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: HashMap::from([("Accept".to_string(), "application/json".to_string())]),
            dump_limit: RAW_DUMP_LIMIT,
        }
    }
}

/// A named call plus the view used to judge its response.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub name: String,
    pub endpoint: String,
    pub query: Query,
    pub view: View,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api: ApiConfig,
    pub checks: Vec<CheckConfig>,
}

impl Config {
    /// Chart, insights and holders checks for AAPL against the default gateway.
    pub fn builtin() -> Self {
        Config {
            api: ApiConfig::default(),
            checks: builtin_checks(),
        }
    }

    pub fn check(&self, name: &str) -> Option<&CheckConfig> {
        self.checks
            .iter()
            .find(|check| check.name.eq_ignore_ascii_case(name))
    }

    /// Replace the `symbol` parameter of every check that sends one.
    pub fn override_symbol(&mut self, symbol: &str) {
        for check in &mut self.checks {
            if check.query.contains_key("symbol") {
                check
                    .query
                    .insert("symbol".to_string(), json!(symbol.to_uppercase()));
            }
        }
    }

    /// Keep only the named checks, preserving configured order.
    pub fn retain_checks(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        self.checks.retain(|check| {
            names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&check.name))
        });
    }
}

fn builtin_checks() -> Vec<CheckConfig> {
    vec![
        CheckConfig {
            name: "chart".to_string(),
            endpoint: "YahooFinance/get_stock_chart".to_string(),
            query: query(json!({
                "symbol": "AAPL",
                "region": "US",
                "interval": "1d",
                "range": "5d",
                "includeAdjustedClose": true,
                "events": "div,split"
            })),
            view: View::ChartSummary,
        },
        CheckConfig {
            name: "insights".to_string(),
            endpoint: "YahooFinance/get_stock_insights".to_string(),
            query: query(json!({ "symbol": "AAPL" })),
            view: View::InsightsSummary,
        },
        CheckConfig {
            name: "holders".to_string(),
            endpoint: "YahooFinance/get_stock_holders".to_string(),
            query: query(json!({
                "symbol": "AAPL",
                "region": "US",
                "lang": "en-US"
            })),
            view: View::HoldersSummary,
        },
    ]
}

fn query(value: serde_json::Value) -> Query {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Query::new(),
    }
}
