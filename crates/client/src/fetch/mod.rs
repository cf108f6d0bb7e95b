//! HTTP fetch pipeline behind the worker's `Network` trait.
//!
//! ### Status handling
//! - Every status is returned as a response; strategies decide what a 404 or
//!   a 500 means. Only transport failures are errors.
//!
//! ### Response type
//! - `basic` when the final URL (after redirects) shares the scope's origin.
//! - `cors` otherwise. Opaque responses cannot arise outside a browser.
//!
//! ### Limits
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 5MB (configurable)

use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::{Duration, Instant};
use url::Url;

use swproxy_core::http::same_origin;
use swproxy_core::{AppConfig, Error, Method, Network, Request, Response, ResponseType};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin that counts as same-origin (`basic`) for responses.
    pub scope: Url,

    /// User agent string (default: "swproxy/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Defaults for an application served from `scope`.
    pub fn new(scope: Url) -> Self {
        Self {
            scope,
            user_agent: "swproxy/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }

    /// Build from loaded application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let scope = config.scope_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            scope,
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        })
    }
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

fn header_pairs(headers: &header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

fn map_send_error(url: &Url, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::Network(format!("{url}: {err}"))
    }
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Response type for a response whose final URL is `final_url`.
    pub fn response_type(&self, final_url: &Url) -> ResponseType {
        if same_origin(&self.config.scope, final_url) { ResponseType::Basic } else { ResponseType::Cors }
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let url = &request.url;

        let response = self
            .http
            .request(to_reqwest_method(request.method), url.as_str())
            .send()
            .await
            .map_err(|e| map_send_error(url, &e))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers = header_pairs(response.headers());

        let bytes = response.bytes().await.map_err(|e| map_send_error(url, &e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let kind = self.response_type(&final_url);

        tracing::debug!(
            "fetched {} {} -> {} ({}, {}) in {}ms ({} bytes)",
            request.method,
            url,
            final_url,
            status.as_u16(),
            kind.as_str(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(Response::new(status.as_u16(), kind, final_url.to_string(), bytes).with_headers(headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Url {
        Url::parse("https://app.test/").unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::new(scope());
        assert_eq!(config.user_agent, "swproxy/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig {
            scope: "https://calendar.example/".into(),
            user_agent: "calendar-sw/2".into(),
            timeout_ms: 1_500,
            ..Default::default()
        };
        let config = FetchConfig::from_app_config(&app).unwrap();
        assert_eq!(config.scope.as_str(), "https://calendar.example/");
        assert_eq!(config.user_agent, "calendar-sw/2");
        assert_eq!(config.timeout, Duration::from_millis(1_500));
    }

    #[test]
    fn test_fetch_config_from_bad_scope() {
        let app = AppConfig { scope: "not a url".into(), ..Default::default() };
        assert!(matches!(FetchConfig::from_app_config(&app), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::new(scope()));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_response_type_by_origin() {
        let client = FetchClient::new(FetchConfig::new(scope())).unwrap();
        assert_eq!(client.response_type(&Url::parse("https://app.test/logo.png").unwrap()), ResponseType::Basic);
        assert_eq!(client.response_type(&Url::parse("https://cdn.test/logo.png").unwrap()), ResponseType::Cors);
        assert_eq!(client.response_type(&Url::parse("http://app.test/logo.png").unwrap()), ResponseType::Cors);
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest_method(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest_method(Method::Options), reqwest::Method::OPTIONS);
    }

    #[test]
    fn test_header_pairs() {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/css"));
        let pairs = header_pairs(&headers);
        assert_eq!(pairs, vec![("content-type".to_string(), "text/css".to_string())]);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let mut config = FetchConfig::new(Url::parse("http://127.0.0.1:9/").unwrap());
        config.timeout = Duration::from_millis(500);
        let client = FetchClient::new(config).unwrap();

        let request = Request::get(Url::parse("http://127.0.0.1:9/").unwrap());
        let result = client.fetch(&request).await;
        assert!(matches!(result, Err(Error::Network(_)) | Err(Error::FetchTimeout(_))));
    }
}
