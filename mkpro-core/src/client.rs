//! JSON-over-HTTP client shared by every view controller.
//!
//! The client mirrors how the backend reports problems: a failed request
//! surfaces the body's `detail`, then `error`, then `HTTP <status>`. Bodies
//! that are not JSON are wrapped as `{"error": <text>}` so callers always
//! receive a JSON value.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{MkproError, MkproResult};

/// Header carrying the optional static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Per-request options. Defaults to a bodiless `GET` with the client timeout.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    /// `POST` without a body, for endpoints driven only by query parameters.
    pub fn post_empty() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::PUT,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn delete(body: Value) -> Self {
        Self {
            method: Method::DELETE,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn serialized_body(&self) -> MkproResult<Option<Vec<u8>>> {
        match &self.body {
            Some(body) if !body.is_null() => Ok(Some(serde_json::to_vec(body)?)),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> MkproResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| MkproError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            timeout: config.timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    fn url_for(&self, path: &str, query: &[(String, String)]) -> MkproResult<Url> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };

        let mut url = Url::parse(&joined).map_err(|e| MkproError::InvalidConfigValue {
            key: "api.base_url".to_string(),
            message: format!("'{}' is not a valid URL: {}", joined, e),
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Send a request and return the parsed JSON body.
    pub async fn request(&self, path: &str, options: RequestOptions) -> MkproResult<Value> {
        let url = self.url_for(path, &options.query)?;
        let timeout = options.timeout.unwrap_or(self.timeout);

        let mut builder = self.client.request(options.method.clone(), url);

        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key.as_str());
        }

        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = options.serialized_body()? {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        debug!(method = %options.method, path, "API request");

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<(StatusCode, String), MkproError>((status, text))
        };

        let (status, text) = match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(method = %options.method, path, error = %e, "API request failed");
                return Err(e);
            }
            Err(_) => {
                warn!(
                    method = %options.method,
                    path,
                    timeout_ms = timeout.as_millis() as u64,
                    "API request timed out"
                );
                return Err(MkproError::Timeout);
            }
        };

        let payload = parse_body(&text);

        if !status.is_success() {
            let message = error_message(&payload, status.as_u16());
            warn!(
                method = %options.method,
                path,
                status = status.as_u16(),
                "API returned error: {}",
                message
            );
            return Err(MkproError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(payload)
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> MkproResult<T> {
        let value = self.request(path, options).await?;
        decode(value)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> MkproResult<T> {
        let mut options = RequestOptions::get();
        for (key, value) in query {
            options = options.query(key, value);
        }
        self.send_json(path, options).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> MkproResult<T> {
        let body = serde_json::to_value(body)?;
        self.send_json(path, RequestOptions::post(body)).await
    }
}

/// Decode a response value into a typed model at the API boundary.
pub fn decode<T: DeserializeOwned>(value: Value) -> MkproResult<T> {
    serde_json::from_value(value).map_err(|e| MkproError::ResponseSchema(e.to_string()))
}

/// Empty text becomes `{}`; unparseable text is wrapped as `{"error": text}`.
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(_) => json!({ "error": text }),
    }
}

/// `detail`, then `error`, then `HTTP <status>`.
pub fn error_message(payload: &Value, status: u16) -> String {
    ["detail", "error"]
        .iter()
        .filter_map(|field| payload.get(field))
        .find_map(message_from_field)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

fn message_from_field(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_shapes() {
        assert_eq!(parse_body(""), json!({}));
        assert_eq!(parse_body("   "), json!({}));
        assert_eq!(parse_body("[1,2]"), json!([1, 2]));
        assert_eq!(
            parse_body("<html>bad gateway</html>"),
            json!({ "error": "<html>bad gateway</html>" })
        );
    }

    #[test]
    fn test_error_message_priority() {
        let both = json!({ "detail": "brand missing", "error": "ignored" });
        assert_eq!(error_message(&both, 404), "brand missing");

        let only_error = json!({ "error": "instance already exists" });
        assert_eq!(error_message(&only_error, 403), "instance already exists");

        assert_eq!(error_message(&json!({}), 502), "HTTP 502");
        assert_eq!(error_message(&json!({ "detail": "" }), 500), "HTTP 500");
        assert_eq!(error_message(&json!([1]), 500), "HTTP 500");

        let zero_detail = json!({ "detail": 0, "error": "quota exceeded" });
        assert_eq!(error_message(&zero_detail, 429), "quota exceeded");
        assert_eq!(error_message(&json!({ "detail": 7 }), 400), "7");
    }

    #[test]
    fn test_error_message_structured_detail() {
        let payload = json!({ "detail": [{ "loc": ["body", "name"], "msg": "field required" }] });
        let message = error_message(&payload, 422);
        assert!(message.contains("field required"));
    }

    #[test]
    fn test_request_options_builders() {
        let opts = RequestOptions::post(json!({ "a": 1 }))
            .query("brand_id", 7)
            .with_header("x-trace", "abc")
            .with_timeout(Duration::from_secs(2));

        assert_eq!(opts.method, Method::POST);
        assert_eq!(opts.query, vec![("brand_id".to_string(), "7".to_string())]);
        assert_eq!(opts.timeout, Some(Duration::from_secs(2)));
        assert!(opts.serialized_body().unwrap().is_some());

        assert!(RequestOptions::get().serialized_body().unwrap().is_none());
        assert!(RequestOptions::post(Value::Null)
            .serialized_body()
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_url_building() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            api_key: Some("  ".to_string()),
            timeout_ms: 1000,
        })
        .unwrap();

        assert_eq!(client.base_url(), "http://localhost:8000");
        assert!(!client.has_api_key());

        let url = client
            .url_for(
                "/api/wa/board",
                &[
                    ("brand_id".to_string(), "3".to_string()),
                    ("q".to_string(), "hola mundo".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/wa/board?brand_id=3&q=hola+mundo"
        );

        let url = client.url_for("api/health", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/health");
    }

    #[test]
    fn test_decode_reports_schema_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Brand {
            id: i64,
        }

        let err = decode::<Brand>(json!({ "id": "not-a-number" })).unwrap_err();
        assert!(matches!(err, MkproError::ResponseSchema(_)));
    }
}
