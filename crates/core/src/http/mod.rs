//! Request and response values exchanged between the worker, the network and
//! the cache store.
//!
//! ### Read-once bodies
//! - `Response` is deliberately not `Clone`.
//! - Reading the body consumes the response (`into_body`, `text`).
//! - `Response::split` is the only way to get two readable copies, which is what
//!   the cache-first path does before handing one copy to the cache writer.

pub mod url;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use self::url::{UrlError, resolve, same_origin};

/// HTTP request method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::str::FromStr for Method {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "OPTIONS" => Ok(Self::Options),
            other => Err(crate::Error::InvalidInput(format!("unsupported method: {other}"))),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: ::url::Url,
}

impl Request {
    /// A GET request for an already-resolved URL.
    pub fn get(url: ::url::Url) -> Self {
        Self { method: Method::Get, url }
    }

    /// Resolve `input` against `scope` and build a GET request for it.
    pub fn resolve(scope: &::url::Url, input: &str) -> Result<Self, crate::Error> {
        let url = resolve(scope, input).map_err(|e| crate::Error::InvalidUrl(e.to_string()))?;
        Ok(Self::get(url))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Key used to address this request inside a cache generation.
    pub fn cache_key(&self) -> &str {
        self.url.as_str()
    }

    /// Only GET requests can be stored in or matched from a cache.
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::Get
    }
}

/// Response type, mirroring the fetch tainting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response; the only kind that may be cached opportunistically.
    Basic,
    /// Cross-origin response whose body is readable.
    Cors,
    /// Cross-origin response whose body and status cannot be inspected.
    Opaque,
    /// Network error placeholder.
    Error,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Opaque => "opaque",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for ResponseType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "cors" => Ok(Self::Cors),
            "opaque" => Ok(Self::Opaque),
            "error" => Ok(Self::Error),
            other => Err(crate::Error::CorruptEntry(format!("unknown response type: {other}"))),
        }
    }
}

/// Where a response handed back by the worker came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
}

/// A response with a read-once body.
#[derive(Debug)]
pub struct Response {
    status: u16,
    kind: ResponseType,
    url: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    source: ResponseSource,
}

impl Response {
    /// A response as it arrived from the network.
    pub fn new(status: u16, kind: ResponseType, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            kind,
            url: url.into(),
            headers: Vec::new(),
            body: body.into(),
            source: ResponseSource::Network,
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub(crate) fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn kind(&self) -> ResponseType {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn source(&self) -> ResponseSource {
        self.source
    }

    /// Status in the 200-299 range.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// A plain 200 same-origin response; the only shape written on a cache-first miss.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseType::Basic
    }

    /// Duplicate the response into two independently readable handles.
    pub fn split(self) -> (Self, Self) {
        let copy = Self {
            status: self.status,
            kind: self.kind,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            source: self.source,
        };
        (self, copy)
    }

    /// Consume the response and return its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Consume the response and decode its body as UTF-8 (lossy).
    pub fn text(self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub(crate) fn into_parts(self) -> (u16, ResponseType, String, Vec<(String, String)>, Bytes) {
        (self.status, self.kind, self.url, self.headers, self.body)
    }
}
