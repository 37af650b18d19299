//! In-memory transport for adapter tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rustc_hash::FxHashMap;
use url::Url;

use super::transport::{FetchRequest, FetchResponse, Transport, TransportError, parse_set_cookies};

#[derive(Debug, Clone)]
pub struct Fixture {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
    final_url: Option<Url>,
}

impl Fixture {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: Vec::new(),
            final_url: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn final_url(mut self, url: &str) -> Self {
        self.final_url = Some(Url::parse(url).unwrap());
        self
    }
}

#[derive(Default)]
struct Inner {
    fixtures: FxHashMap<(Method, String), Fixture>,
    requests: Vec<FetchRequest>,
}

/// Serves canned responses keyed by method and URL and records every request.
/// Unknown URLs fail like a network error.
#[derive(Clone, Default)]
pub struct FixtureTransport {
    inner: Arc<Mutex<Inner>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, method: Method, url: &str, fixture: Fixture) -> Self {
        let key = (method, Url::parse(url).unwrap().to_string());
        self.inner.lock().unwrap().fixtures.insert(key, fixture);
        self
    }

    pub fn with_get(self, url: &str, status: u16, body: &str) -> Self {
        self.with(Method::GET, url, Fixture::new(status, body))
    }

    pub fn with_post(self, url: &str, status: u16, body: &str) -> Self {
        self.with(Method::POST, url, Fixture::new(status, body))
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(request.clone());

        let key = (request.method.clone(), request.url.to_string());
        let fixture = inner.fixtures.get(&key).cloned().ok_or_else(|| {
            TransportError::Other(format!("no fixture for {} {}", request.method, request.url))
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &fixture.headers {
            headers.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }

        Ok(FetchResponse {
            status: fixture.status,
            cookies: parse_set_cookies(&headers),
            headers,
            body: fixture.body,
            final_url: fixture.final_url.unwrap_or(request.url),
        })
    }
}
