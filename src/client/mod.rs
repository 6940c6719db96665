use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::error::Result;

pub mod fixture;
pub mod http;

pub use fixture::FixtureClient;
pub use http::HttpApiClient;

/// Query parameters keyed by name, kept in insertion order.
pub type Query = Map<String, Value>;

/// External financial-data API. Implementations own transport and authentication.
pub trait ApiClient: Send + Sync {
    fn call<'a>(&'a self, endpoint: &'a str, query: &'a Query) -> BoxFuture<'a, Result<Value>>;
}

/// Render a query value the way it goes on the wire: strings unquoted, everything else as JSON.
pub fn query_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
