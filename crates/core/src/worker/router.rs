//! Request classification.
//!
//! A single predicate over the full request URL decides which strategy
//! handles a request. Classification is synchronous and stateless.

use regex::Regex;

use crate::http::Request;

/// Rule identifying requests that must always go to the network first.
#[derive(Debug, Clone)]
pub enum ExclusionRule {
    /// Plain substring match on the URL, e.g. `/album/`.
    Contains(String),
    /// Regular expression searched anywhere in the URL.
    Pattern(Regex),
}

impl ExclusionRule {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Contains(needle) => url.contains(needle.as_str()),
            Self::Pattern(re) => re.is_match(url),
        }
    }
}

impl Default for ExclusionRule {
    fn default() -> Self {
        Self::Contains("/album/".into())
    }
}

/// Strategy a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Excluded dynamic content: network, then any cached copy, never written.
    NetworkFirst,
    /// Cacheable static content: current generation, then network with write-back.
    CacheFirst,
}

/// Stateless URL router.
#[derive(Debug, Clone, Default)]
pub struct Router {
    exclusion: ExclusionRule,
}

impl Router {
    pub fn new(exclusion: ExclusionRule) -> Self {
        Self { exclusion }
    }

    pub fn classify(&self, request: &Request) -> Route {
        if self.is_excluded(request.url.as_str()) { Route::NetworkFirst } else { Route::CacheFirst }
    }

    /// Whether responses for `url` must never be persisted.
    pub fn is_excluded(&self, url: &str) -> bool {
        self.exclusion.matches(url)
    }
}
