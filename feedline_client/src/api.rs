use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://dev.codeleap.co.uk/careers/";

fn absolute_url() -> &'static Regex {
    static ABSOLUTE_URL: OnceLock<Regex> = OnceLock::new();
    ABSOLUTE_URL.get_or_init(|| Regex::new(r"(?i)^https?://").expect("static pattern"))
}

/// Whether `path` already names a full `http(s)://` URL.
pub fn is_absolute_url(path: &str) -> bool {
    absolute_url().is_match(path)
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    RequestFailed { status: StatusCode, message: String },
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Attaches a JSON body. A body that serializes to `null` counts as no body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.body = (!value.is_null()).then_some(value);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base = sanitize_base_url(base_url.into())?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Performs one HTTP exchange and decodes the JSON answer as `T`.
    ///
    /// A `204 No Content` answer is not parsed; it decodes as an empty value
    /// (`()`, `None`, or an all-default struct).
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let method = options.method.clone();
        let mut headers = HeaderMap::new();
        let mut builder = self.client.request(method.clone(), url.clone());
        if let Some(body) = &options.body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            builder = builder.body(serde_json::to_vec(body).map_err(ApiError::Encode)?);
        }
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }

        tracing::debug!(%method, %url, "sending request");
        let response = builder
            .headers(headers)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            tracing::warn!(%method, %url, status = status.as_u16(), "request rejected");
            let message = if text.is_empty() {
                format!("Request failed with status {}", status.as_u16())
            } else {
                text
            };
            return Err(ApiError::RequestFailed { status, message });
        }

        if status == StatusCode::NO_CONTENT {
            return empty_value(url.as_str());
        }

        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Cursors and relative paths go through `Url::parse`, which keeps
    /// existing percent escapes and query order as they are. Only characters
    /// that cannot appear in a URL (spaces, raw non-ASCII) get escaped, and
    /// the host is lowercased.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let raw = if is_absolute_url(path) {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        };
        Url::parse(&raw).map_err(|err| ApiError::InvalidUrl {
            url: raw,
            reason: err.to_string(),
        })
    }
}

fn empty_value<T: DeserializeOwned>(url: &str) -> Result<T, ApiError> {
    serde_json::from_value(Value::Null)
        .or_else(|_| serde_json::from_value(Value::Object(Default::default())))
        .map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
}

/// Relative paths are appended verbatim, so the base always ends in `/`.
fn sanitize_base_url(mut base: String) -> Result<String> {
    base = base.trim().to_string();
    if !is_absolute_url(&base) {
        base = format!("http://{base}");
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    let _ = Url::parse(&base).with_context(|| format!("invalid base URL '{base}'"))?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_absolute_urls_case_insensitively() {
        assert!(is_absolute_url("https://example.test/careers/?offset=10"));
        assert!(is_absolute_url("HTTP://example.test/"));
        assert!(!is_absolute_url("5/"));
        assert!(!is_absolute_url(""));
        assert!(!is_absolute_url("ftp://example.test/"));
    }

    #[test]
    fn relative_paths_concatenate_onto_base() {
        let client = ApiClient::new("https://example.test/careers/", Duration::from_secs(1))
            .expect("client");
        assert_eq!(
            client.url("").expect("url").as_str(),
            "https://example.test/careers/"
        );
        assert_eq!(
            client.url("12/").expect("url").as_str(),
            "https://example.test/careers/12/"
        );
        assert_eq!(
            client
                .url("https://other.test/careers/?offset=10")
                .expect("url")
                .as_str(),
            "https://other.test/careers/?offset=10"
        );
    }

    #[test]
    fn cursors_keep_their_encoding() {
        let client = ApiClient::new("https://example.test/careers/", Duration::from_secs(1))
            .expect("client");
        let cursor = "https://example.test/careers/?offset=10&q=a%2Fb%20c&tag=%E2%9C%93";
        assert_eq!(client.url(cursor).expect("url").as_str(), cursor);

        assert_eq!(
            client
                .url("https://Example.TEST/careers/?q=a b")
                .expect("url")
                .as_str(),
            "https://example.test/careers/?q=a%20b"
        );
    }

    #[test]
    fn base_url_gets_scheme_and_trailing_slash() {
        let client = ApiClient::new("localhost:8000/careers", Duration::from_secs(1))
            .expect("client");
        assert_eq!(client.base_url(), "http://localhost:8000/careers/");
    }

    #[test]
    fn null_body_counts_as_absent() {
        let options = RequestOptions::new(Method::POST)
            .json(&Option::<u8>::None)
            .expect("encode");
        assert!(options.body.is_none());
        let options = RequestOptions::new(Method::POST)
            .json(&serde_json::json!({ "title": "t" }))
            .expect("encode");
        assert!(options.body.is_some());
    }

    #[test]
    fn empty_value_decodes_unit_and_defaults() {
        empty_value::<()>("http://x/").expect("unit");
        assert_eq!(empty_value::<Option<u8>>("http://x/").expect("option"), None);
        let page: crate::models::Page = empty_value("http://x/").expect("page");
        assert!(page.results.is_empty());
    }
}
