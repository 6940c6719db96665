use std::collections::HashMap;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{AppError, Context, Result};

use super::{query_value_to_string, ApiClient, Query};

/// Gateway client issuing `GET {base_url}/{endpoint}?{query}`.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    base_url: String,
    client: Client,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let headers = build_headers(&config.headers)?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to construct HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn fetch(&self, endpoint: &str, query: &Query) -> Result<Value> {
        let url = self.endpoint_url(endpoint);
        let params = encode_query(query);
        debug!("GET {} with {} query parameter(s)", url, params.len());

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", endpoint))?;

        let status = response.status();
        debug!("{} answered with status {}", endpoint, status);
        if !status.is_success() {
            return Err(AppError::message(format!(
                "Request to {} failed with status {}",
                endpoint, status
            )));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", endpoint))?;

        let value: Value = serde_json::from_str(&body)
            .with_context(|| format!("Response from {} is not valid JSON", endpoint))?;
        Ok(value)
    }
}

impl ApiClient for HttpApiClient {
    fn call<'a>(&'a self, endpoint: &'a str, query: &'a Query) -> BoxFuture<'a, Result<Value>> {
        self.fetch(endpoint, query).boxed()
    }
}

pub fn encode_query(query: &Query) -> Vec<(String, String)> {
    query
        .iter()
        .map(|(key, value)| (key.clone(), query_value_to_string(value)))
        .collect()
}

/// Expand `${NAME}` placeholders from the process environment.
pub fn expand_env_vars(value: &str) -> Result<String> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            for next in chars.by_ref() {
                if next == '}' {
                    closed = true;
                    break;
                }
                name.push(next);
            }

            if !closed {
                return Err(AppError::message(
                    "Unterminated environment placeholder in header",
                ));
            }

            if name.is_empty() {
                return Err(AppError::message(
                    "Encountered empty environment placeholder in header",
                ));
            }

            let value = std::env::var(&name).with_context(|| {
                format!(
                    "Environment variable {} required by request header is not set",
                    name
                )
            })?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .with_context(|| format!("Invalid header name: {}", key))?;
        let expanded = expand_env_vars(value)?;
        let header_value = HeaderValue::from_str(&expanded)
            .with_context(|| format!("Invalid header value for {}", key))?;
        map.insert(name, header_value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use crate::config::CheckConfig;
    use crate::inspect::View;
    use crate::probe::{CheckOutcome, ProbeRunner};

    /// Answer a single request with a canned response and hand back the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let (request_tx, request_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept connection");
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = socket.read(&mut buf).await.expect("read request");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }

            let head = format!("HTTP/1.1 {status}\r\nContent-Type: application/json\r\n");
            let response = format!(
                "{head}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = socket.shutdown().await;
            let _ = request_tx.send(String::from_utf8_lossy(&request).into_owned());
        });

        (format!("http://{addr}/api"), request_rx)
    }

    fn gateway_config(base_url: String) -> ApiConfig {
        ApiConfig {
            base_url,
            timeout_secs: 5,
            ..ApiConfig::default()
        }
    }

    fn chart_check() -> CheckConfig {
        CheckConfig {
            name: "chart".to_string(),
            endpoint: "YahooFinance/get_stock_chart".to_string(),
            query: json!({ "symbol": "AAPL", "includeAdjustedClose": true })
                .as_object()
                .cloned()
                .unwrap_or_default(),
            view: View::ChartSummary,
        }
    }

    async fn run_chart_check(config: &ApiConfig) -> CheckOutcome {
        let client = HttpApiClient::new(config).expect("client builds");
        ProbeRunner::new(&client).run_check(&chart_check()).await
    }

    fn failure_message(outcome: &CheckOutcome) -> String {
        assert!(!outcome.passed(), "expected failure: {:?}", outcome.result);
        outcome.result.error_message.clone().unwrap_or_default()
    }

    #[test]
    fn encodes_query_values_as_text() {
        let query = json!({
            "symbol": "AAPL",
            "includeAdjustedClose": true,
            "limit": 5
        });
        let params = encode_query(query.as_object().expect("object"));

        assert_eq!(
            params,
            vec![
                ("symbol".to_string(), "AAPL".to_string()),
                ("includeAdjustedClose".to_string(), "true".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn expands_environment_placeholders() {
        std::env::set_var("API_PROBE_TEST_TOKEN", "secret");
        let expanded = expand_env_vars("Bearer ${API_PROBE_TEST_TOKEN}").expect("expands");
        assert_eq!(expanded, "Bearer secret");
    }

    #[test]
    fn rejects_bad_placeholders() {
        assert!(expand_env_vars("${}").is_err());
        assert!(expand_env_vars("${UNTERMINATED").is_err());
        assert!(expand_env_vars("${API_PROBE_SURELY_UNSET_VARIABLE}").is_err());
        assert_eq!(expand_env_vars("$plain").expect("no placeholder"), "$plain");
    }

    #[test]
    fn joins_base_url_and_endpoint() {
        let config = ApiConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            ..ApiConfig::default()
        };
        let client = HttpApiClient::new(&config).expect("client builds");
        assert_eq!(
            client.endpoint_url("/YahooFinance/get_stock_chart"),
            "http://localhost:8080/api/YahooFinance/get_stock_chart"
        );
    }

    #[tokio::test]
    async fn sends_query_and_expanded_headers() {
        std::env::set_var("API_PROBE_GATEWAY_TOKEN", "s3cret");
        let (base_url, request_rx) = serve_once(
            "200 OK",
            r#"{"chart":{"result":[{"meta":{"symbol":"AAPL","regularMarketPrice":229.874}}]}}"#,
        )
        .await;
        let mut config = gateway_config(base_url);
        config.headers.insert(
            "X-Api-Token".to_string(),
            "Token ${API_PROBE_GATEWAY_TOKEN}".to_string(),
        );

        let outcome = run_chart_check(&config).await;

        assert!(outcome.passed(), "unexpected failure: {:?}", outcome.result);
        assert_eq!(outcome.result.field("regularMarketPrice"), Some("229.87"));

        let request = request_rx.await.expect("request captured").to_lowercase();
        assert!(
            request.starts_with(
                "get /api/yahoofinance/get_stock_chart?symbol=aapl&includeadjustedclose=true "
            ),
            "unexpected request: {request}"
        );
        assert!(request.contains("x-api-token: token s3cret"), "unexpected request: {request}");
    }

    #[test]
    fn missing_header_variable_fails_client_construction() {
        let mut config = ApiConfig::default();
        config.headers.insert(
            "Authorization".to_string(),
            "Bearer ${API_PROBE_SURELY_UNSET_TOKEN}".to_string(),
        );

        let err = HttpApiClient::new(&config).expect_err("variable is unset");
        assert!(err.to_string().contains("API_PROBE_SURELY_UNSET_TOKEN"));
    }

    #[tokio::test]
    async fn server_error_status_is_a_failed_outcome() {
        let (base_url, _request_rx) =
            serve_once("500 Internal Server Error", r#"{"error":"upstream"}"#).await;

        let outcome = run_chart_check(&gateway_config(base_url)).await;

        let message = failure_message(&outcome);
        assert!(message.starts_with("API error:"), "unexpected message: {message}");
        assert!(message.contains("500"), "unexpected message: {message}");
    }

    #[tokio::test]
    async fn non_json_body_is_a_failed_outcome() {
        let (base_url, _request_rx) = serve_once("200 OK", "<html>maintenance</html>").await;

        let outcome = run_chart_check(&gateway_config(base_url)).await;

        let message = failure_message(&outcome);
        assert!(message.starts_with("API error:"), "unexpected message: {message}");
        assert!(message.contains("not valid JSON"), "unexpected message: {message}");
        assert!(message.contains("expected value"), "unexpected message: {message}");
    }

    #[tokio::test]
    async fn refused_connection_keeps_the_cause() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let outcome = run_chart_check(&gateway_config(format!("http://{addr}/api"))).await;

        let message = failure_message(&outcome);
        assert!(
            message.starts_with("API error: Request to YahooFinance/get_stock_chart failed: "),
            "unexpected message: {message}"
        );
        assert!(message.contains("error sending request"), "unexpected message: {message}");
    }
}
