//! HTTP save transport.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use horizon_grid::{SaveApi, SaveError, SaveTransport};
use horizon_grid_core::logging::targets;
use serde_json::Value;
use url::Url;

use crate::error::{NetworkError, Result};

/// Configuration for [`HttpSaveTransport`].
#[derive(Clone, Debug)]
pub struct HttpSaveTransportConfig {
    /// Base URL relative API URLs are joined onto.
    pub base_url: Option<Url>,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Default user agent.
    pub user_agent: Option<String>,
}

impl Default for HttpSaveTransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Some(Duration::from_secs(30)),
            user_agent: Some(format!("HorizonGrid/{} (Rust)", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// Builder for [`HttpSaveTransport`].
pub struct HttpSaveTransportBuilder {
    config: HttpSaveTransportConfig,
    default_headers: http::HeaderMap,
}

impl Default for HttpSaveTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpSaveTransportBuilder {
    pub fn new() -> Self {
        Self {
            config: HttpSaveTransportConfig::default(),
            default_headers: http::HeaderMap::new(),
        }
    }

    /// Join relative API URLs onto `base_url`.
    pub fn base_url(mut self, base_url: impl AsRef<str>) -> Result<Self> {
        let mut url = Url::parse(base_url.as_ref())?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.config.base_url = Some(url);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Send `Authorization: Bearer <token>` with every save.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Result<Self> {
        let value = format!("Bearer {}", token.as_ref());
        self.default_header(http::header::AUTHORIZATION, value.as_str())
    }

    /// Add a header sent with every save.
    pub fn default_header(
        mut self,
        name: impl TryInto<http::HeaderName>,
        value: impl TryInto<http::HeaderValue>,
    ) -> Result<Self> {
        let name = name
            .try_into()
            .map_err(|_| NetworkError::InvalidHeader("Invalid header name".to_string()))?;
        let value = value
            .try_into()
            .map_err(|_| NetworkError::InvalidHeader("Invalid header value".to_string()))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    pub fn build(self) -> Result<HttpSaveTransport> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }
        builder = builder.default_headers(self.default_headers);

        let client = builder.build()?;

        Ok(HttpSaveTransport {
            inner: Arc::new(TransportInner {
                client,
                config: self.config,
            }),
        })
    }
}

struct TransportInner {
    client: reqwest::Client,
    config: HttpSaveTransportConfig,
}

/// Sends quick-save payloads as JSON over HTTP.
///
/// The payload is the request body for methods that carry one; `GET`,
/// `HEAD` and `JSONP` APIs send the payload's scalar fields as query
/// parameters instead. A save fails on a non-2xx status or when the JSON
/// body carries a non-zero `status`, with the body's `msg` as the message.
/// On success the body's `data` field is returned, or the whole body.
///
/// Cheaply cloneable; clones share one connection pool.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use horizon_grid::TableStore;
/// use horizon_grid_net::HttpSaveTransport;
///
/// let transport = HttpSaveTransport::builder()
///     .base_url("https://api.example.com")?
///     .bearer_auth("token")?
///     .build()?;
/// let store = TableStore::with_transport(Arc::new(transport));
/// ```
#[derive(Clone)]
pub struct HttpSaveTransport {
    inner: Arc<TransportInner>,
}

impl std::fmt::Debug for HttpSaveTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSaveTransport")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl HttpSaveTransport {
    pub fn builder() -> HttpSaveTransportBuilder {
        HttpSaveTransportBuilder::new()
    }

    pub fn config(&self) -> &HttpSaveTransportConfig {
        &self.inner.config
    }

    /// Absolute URL of `api`.
    pub fn resolve(&self, api: &SaveApi) -> Result<Url> {
        match &self.inner.config.base_url {
            Some(base) => Ok(base.join(api.url().trim_start_matches('/'))?),
            None => Ok(Url::parse(api.url())?),
        }
    }

    /// Submit `payload` to `api`.
    pub async fn send(&self, api: &SaveApi, payload: Value) -> Result<Value> {
        let url = self.resolve(api)?;
        let method = match api.method() {
            "JSONP" => http::Method::GET,
            other => http::Method::from_bytes(other.as_bytes())
                .map_err(|_| NetworkError::InvalidMethod(other.to_string()))?,
        };

        tracing::debug!(target: targets::NET_SAVE, %method, %url, "sending save");

        let mut request = self.inner.client.request(method.clone(), url.clone());
        if method == http::Method::GET || method == http::Method::HEAD {
            request = request.query(&query_pairs(&payload));
        } else {
            request = request.json(&payload);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        let message = body.get("msg").and_then(Value::as_str).map(str::to_string);

        if !status.is_success() {
            tracing::warn!(target: targets::NET_SAVE, %url, status = status.as_u16(), "save failed");
            return Err(NetworkError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let code = body.get("status").map(status_code).unwrap_or_default();
        if code != 0 {
            tracing::warn!(target: targets::NET_SAVE, %url, code, "save rejected");
            return Err(NetworkError::Rejected {
                status: code,
                message,
            });
        }

        Ok(match body {
            Value::Object(mut fields) if fields.contains_key("data") => {
                fields.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        })
    }
}

impl SaveTransport for HttpSaveTransport {
    fn save(&self, api: &SaveApi, payload: Value) -> BoxFuture<'static, std::result::Result<Value, SaveError>> {
        let transport = self.clone();
        let api = api.clone();
        Box::pin(async move { transport.send(&api, payload).await.map_err(SaveError::from) })
    }
}

fn status_code(status: &Value) -> i64 {
    match status {
        Value::Number(n) => n.as_i64().unwrap_or(1),
        Value::String(s) => s.trim().parse().unwrap_or(1),
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        _ => 1,
    }
}

fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    let Value::Object(fields) = payload else {
        return Vec::new();
    };
    fields
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key.clone(), s.clone())),
            Value::Number(n) => Some((key.clone(), n.to_string())),
            Value::Bool(b) => Some((key.clone(), b.to_string())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_against_base() {
        let transport = HttpSaveTransport::builder()
            .base_url("https://api.example.com/v1")
            .unwrap()
            .build()
            .unwrap();
        let url = transport.resolve(&SaveApi::parse("post:/rows/save")).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/rows/save");
    }

    #[test]
    fn test_resolve_without_base_requires_absolute() {
        let transport = HttpSaveTransport::builder().build().unwrap();
        assert!(matches!(
            transport.resolve(&SaveApi::parse("/rows")),
            Err(NetworkError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_code(&json!(0)), 0);
        assert_eq!(status_code(&json!("0")), 0);
        assert_eq!(status_code(&json!(422)), 422);
        assert_eq!(status_code(&Value::Null), 0);
    }

    #[test]
    fn test_query_pairs_skip_nested() {
        let pairs = query_pairs(&json!({"id": 1, "name": "a", "rows": [1]}));
        assert_eq!(pairs.len(), 2);
    }
}
