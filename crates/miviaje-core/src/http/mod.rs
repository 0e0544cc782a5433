//! HTTP request/response model shared by the page and the service worker.
//!
//! Requests are identified by method + absolute URL. Responses carry the
//! platform's response type (`basic`, `cors`, `opaque`) because the worker's
//! caching decision depends on it.

pub mod client;
pub mod error;

use serde::{Deserialize, Serialize};
use url::Url;

pub use client::{HttpNetwork, Network};
pub use error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }

    /// Parse a method name case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            _ => None,
        }
    }
}

/// Request mode, deciding how cross-origin responses are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    #[default]
    Cors,
    NoCors,
    SameOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    #[serde(default)]
    pub mode: RequestMode,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, mut url: Url) -> Self {
        url.set_fragment(None);
        Self {
            method,
            url,
            mode: RequestMode::default(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Build a GET request for `path`, resolved against `origin` when relative.
    pub fn resolve(origin: &Url, path: &str) -> Result<Self, FetchError> {
        let url = origin
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))?;
        Ok(Self::get(url))
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Identity used to key cache entries.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method.as_str(), self.url)
    }

    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }
}

/// Platform response type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response, fully readable
    Basic,
    /// Cross-origin response exposed through CORS
    Cors,
    /// Cross-origin no-cors response, body and status hidden
    Opaque,
    /// Network error response
    Error,
}

impl ResponseType {
    /// Response type the platform assigns to a response for `request`.
    pub fn classify(origin: &Url, request: &Request) -> Self {
        Self::for_url(origin, &request.url, request.mode)
    }

    /// Response type for a response served from `url`, which differs from
    /// the request URL when redirects were followed.
    pub fn for_url(origin: &Url, url: &Url, mode: RequestMode) -> Self {
        if url.origin() == origin.origin() {
            ResponseType::Basic
        } else {
            match mode {
                RequestMode::NoCors => ResponseType::Opaque,
                RequestMode::Cors => ResponseType::Cors,
                RequestMode::SameOrigin => ResponseType::Error,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub response_type: ResponseType,
    pub url: String,
}

impl Response {
    pub fn new(status: u16, response_type: ResponseType, url: impl Into<String>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
            response_type,
            url: url.into(),
        }
    }

    /// Cross-origin no-cors response: status and body are hidden.
    pub fn opaque() -> Self {
        Self::new(0, ResponseType::Opaque, "")
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for any 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
