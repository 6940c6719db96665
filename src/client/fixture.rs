use std::fs;
use std::path::PathBuf;

use futures::future::{self, BoxFuture, FutureExt};
use log::debug;
use serde_json::Value;

use crate::error::{AppError, Context, Result};

use super::{ApiClient, Query};

/// Offline client answering every call from a recorded JSON file.
///
/// `YahooFinance/get_stock_chart` resolves to `<dir>/YahooFinance_get_stock_chart.json`.
/// The query is ignored.
#[derive(Debug, Clone)]
pub struct FixtureClient {
    dir: PathBuf,
}

impl FixtureClient {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn fixture_path(&self, endpoint: &str) -> PathBuf {
        self.dir.join(format!("{}.json", fixture_stem(endpoint)))
    }

    fn load(&self, endpoint: &str) -> Result<Value> {
        let path = self.fixture_path(endpoint);
        if !path.exists() {
            return Err(AppError::message(format!(
                "no recorded fixture for {} at {}",
                endpoint,
                path.display()
            )));
        }
        debug!("Serving {} from {}", endpoint, path.display());

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse fixture {}", path.display()))?;
        Ok(value)
    }
}

impl ApiClient for FixtureClient {
    fn call<'a>(&'a self, endpoint: &'a str, _query: &'a Query) -> BoxFuture<'a, Result<Value>> {
        future::ready(self.load(endpoint)).boxed()
    }
}

fn fixture_stem(endpoint: &str) -> String {
    endpoint
        .trim_matches('/')
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
