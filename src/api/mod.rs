// API client module: a small blocking HTTP client that talks to one
// platform instance. Endpoint wrappers live in the submodules, one
// `impl ApiClient` block per resource, and all of them funnel through the
// generic request helpers below so retries, auth headers and error shaping
// happen in a single place.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{normalize_instance_url, Config};
use crate::error::{MigrateError, Result};

pub mod auth;
pub mod clients;
pub mod evidence;
pub mod findings;
pub mod reports;
pub mod templates;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Blocking client bound to one instance. Holds the reqwest client, the
/// normalized base URL, the retry budget and the session token once the
/// auth handler has logged in.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    retries: u32,
    token: Option<String>,
}

/// Status plus parsed body of a successful call. Bodies that are empty come
/// back as `null`; bodies that are not JSON come back as a JSON string.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub json: Value,
}

#[derive(Debug)]
pub struct ApiClientBuilder {
    base_url: String,
    retries: u32,
    verify_ssl: bool,
    timeout: Duration,
}

impl ApiClientBuilder {
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .build()
            .map_err(|source| MigrateError::Network {
                name: "HTTP client setup".into(),
                source,
            })?;
        Ok(ApiClient {
            client,
            base_url: normalize_instance_url(&self.base_url),
            retries: self.retries,
            token: None,
        })
    }
}

impl ApiClient {
    pub fn builder(base_url: &str) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.to_string(),
            retries: 0,
            verify_ssl: true,
            timeout: Duration::from_secs(60),
        }
    }

    /// Build a client for `instance_url` using the request settings from
    /// the loaded configuration.
    pub fn from_config(config: &Config, instance_url: &str) -> Result<Self> {
        Self::builder(instance_url)
            .retries(config.retries)
            .verify_ssl(config.verify_ssl)
            .timeout(config.timeout())
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Store a session token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(t) = &self.token {
            let val = HeaderValue::from_str(&format!("Bearer {}", t))
                .map_err(|_| MigrateError::Auth("session token is not a valid header".into()))?;
            headers.insert(AUTHORIZATION, val);
        }
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, name: &str, path: &str) -> Result<ApiResponse> {
        let url = self.url(path);
        self.send(name, || self.client.request(Method::GET, &url))
    }

    pub fn post<B: Serialize + ?Sized>(&self, name: &str, path: &str, body: &B) -> Result<ApiResponse> {
        let url = self.url(path);
        self.send(name, || self.client.request(Method::POST, &url).json(body))
    }

    pub fn put<B: Serialize + ?Sized>(&self, name: &str, path: &str, body: &B) -> Result<ApiResponse> {
        let url = self.url(path);
        self.send(name, || self.client.request(Method::PUT, &url).json(body))
    }

    /// Upload `bytes` as a single multipart/form-data file field. The form
    /// is rebuilt per attempt since a multipart body cannot be replayed.
    pub fn post_multipart(
        &self,
        name: &str,
        path: &str,
        field: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        self.send(name, || {
            let part = multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
            let form = multipart::Form::new().part(field.to_string(), part);
            self.client.request(Method::POST, &url).multipart(form)
        })
    }

    /// Send a request, retrying network failures and 5xx answers up to the
    /// configured retry count. Only the last error is returned.
    fn send<F>(&self, name: &str, build: F) -> Result<ApiResponse>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempts = self.retries.saturating_add(1);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let request = build().headers(self.auth_headers()?);
            debug!(endpoint = name, attempt, "sending request");

            let failure = match request.send() {
                Ok(res) => {
                    let status = res.status();
                    debug!(endpoint = name, attempt, %status, "received response");
                    if status.is_success() {
                        let text = res.text().map_err(|source| MigrateError::Network {
                            name: name.to_string(),
                            source,
                        })?;
                        return Ok(ApiResponse {
                            status,
                            json: parse_body(&text),
                        });
                    }
                    let body = res.text().unwrap_or_default();
                    let err = MigrateError::Http {
                        name: name.to_string(),
                        status,
                        body,
                    };
                    if !status.is_server_error() {
                        return Err(err);
                    }
                    err
                }
                Err(source) => MigrateError::Network {
                    name: name.to_string(),
                    source,
                },
            };

            if attempt >= attempts {
                return Err(failure);
            }
            warn!(endpoint = name, attempt, error = %failure, "request failed, retrying");
            thread::sleep(RETRY_BACKOFF * attempt);
        }
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_normalizes_base_url() {
        let api = ApiClient::builder("acme.example.com/").build().unwrap();
        assert_eq!(api.base_url(), "https://acme.example.com");
        assert_eq!(api.url("/api/v1/client/list"), "https://acme.example.com/api/v1/client/list");
    }

    #[test]
    fn token_becomes_bearer_header() {
        let mut api = ApiClient::builder("http://localhost").build().unwrap();
        assert!(api.auth_headers().unwrap().get(AUTHORIZATION).is_none());
        api.set_token("abc.def");
        let headers = api.auth_headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc.def");
        assert!(api.has_token());
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let mut api = ApiClient::builder("http://localhost").build().unwrap();
        api.set_token("bad\ntoken");
        assert!(matches!(api.auth_headers(), Err(MigrateError::Auth(_))));
    }

    #[test]
    fn body_parsing_is_lenient() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_body("OK"), json!("OK"));
    }
}
