use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use crate::api_types::{TokenPair, TokenRequest};
use crate::error::{Result, StretchError};

pub const TOKENS_PATH: &str = "/v1/tokens";

/// RFC 3986 unreserved characters stay as-is.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encode an opaque id for use as a single path segment.
pub fn path_segment(id: &str) -> String {
    utf8_percent_encode(id, SEGMENT).to_string()
}

/// Authorized JSON calls against the management API.
///
/// Every non-2xx status surfaces as [`StretchError::Http`]; nothing is retried.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;
    async fn patch(&self, path: &str, body: &Value) -> Result<Value>;
}

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// `insecure` turns off certificate verification for self-signed appliances.
    pub fn new(base_url: &str, timeout: Duration, insecure: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(insecure)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange SSO credentials for a bearer token. The session lives for one run.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        debug!(method = "POST", path = TOKENS_PATH, "requesting access token");
        let resp = self
            .http
            .post(self.url(TOKENS_PATH))
            .json(&TokenRequest { username, password })
            .send()
            .await
            .map_err(|e| StretchError::Auth(format!("token endpoint unreachable: {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StretchError::Auth(format!("failed to read token response: {}", e)))?;
        debug!(path = TOKENS_PATH, status = status.as_u16(), "token response");
        if !status.is_success() {
            return Err(StretchError::Auth(format!(
                "status={} body={}",
                status.as_u16(),
                body
            )));
        }

        let pair: TokenPair = serde_json::from_str(&body)
            .map_err(|e| StretchError::Auth(format!("malformed token response: {}", e)))?;
        let token = pair
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StretchError::Auth("token response has no accessToken".to_string()))?;

        Ok(Session {
            client: self.clone(),
            token,
        })
    }
}

/// Bearer-authorized view of a [`Client`].
pub struct Session {
    client: Client,
    token: String,
}

impl Session {
    async fn send_json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        debug!(method = %method, path, "request");
        let mut req = self
            .client
            .http
            .request(method.clone(), self.client.url(path))
            .bearer_auth(&self.token);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        debug!(method = %method, path, status = status.as_u16(), "response");
        trace!(path, body = %String::from_utf8_lossy(&bytes), "response body");

        if !status.is_success() {
            return Err(StretchError::Http {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        if bytes.is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_slice(&bytes).map_err(|e| StretchError::UnexpectedResponse {
            path: path.to_string(),
            reason: format!("invalid JSON: {}", e),
        })
    }
}

#[async_trait]
impl RemoteApi for Session {
    async fn get(&self, path: &str) -> Result<Value> {
        self.send_json(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send_json(Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.send_json(Method::PATCH, path, Some(body)).await
    }
}
