use std::sync::Arc;

use crate::extractor::default::DEFAULT_UA;
use crate::media::{RequestHeaders, StreamDescriptor};

use super::error::ExtractorError;
use super::transport::{FetchRequest, FetchResponse, Transport};
use async_trait::async_trait;
use reqwest::header;
use tracing::debug;
use url::{Url, form_urlencoded};

/// Shared state and request helpers for every site adapter.
///
/// An `Extractor` is configured once at construction (site name, accepted
/// domain suffixes, default headers) and never mutated afterwards; per-call
/// headers are merged on top of the defaults for each request.
#[derive(Clone)]
pub struct Extractor {
    // name of the site, e.g. "vidoza", "vk"...
    pub site: &'static str,
    domains: &'static [&'static str],
    default_headers: RequestHeaders,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("site", &self.site)
            .field("domains", &self.domains)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    pub fn new(
        site: &'static str,
        domains: &'static [&'static str],
        transport: Arc<dyn Transport>,
    ) -> Self {
        let default_headers = RequestHeaders::new()
            .with(header::USER_AGENT, DEFAULT_UA)
            .with(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .with(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");

        Self {
            site,
            domains,
            default_headers,
            transport,
        }
    }

    /// Overrides a default header. Only meant for use while building an adapter.
    pub fn with_header<K: AsRef<str>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.default_headers.insert(key, value);
        self
    }

    pub fn domains(&self) -> &'static [&'static str] {
        self.domains
    }

    pub fn default_headers(&self) -> &RequestHeaders {
        &self.default_headers
    }

    /// Default headers with `site_headers` applied on top.
    pub fn headers_with(&self, site_headers: &RequestHeaders) -> RequestHeaders {
        self.default_headers.merged(site_headers)
    }

    pub fn accepts(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host_matches(host, self.domains))
    }

    /// Parses an input URL and checks it belongs to this site.
    pub fn parse_url(&self, input: &str) -> Result<Url, ExtractorError> {
        let url = Url::parse(input.trim())
            .map_err(|e| ExtractorError::invalid_url(self.site, format!("'{input}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExtractorError::invalid_url(
                self.site,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        self.ensure_accepted(&url)?;
        Ok(url)
    }

    pub fn ensure_accepted(&self, url: &Url) -> Result<(), ExtractorError> {
        if self.accepts(url) {
            Ok(())
        } else {
            Err(ExtractorError::domain_rejected(
                self.site,
                url.host_str().unwrap_or_default(),
            ))
        }
    }

    /// Sends `request` with the default headers merged in, whatever status
    /// comes back. Only transport failures are errors.
    pub async fn send(
        &self,
        stage: &str,
        request: FetchRequest,
    ) -> Result<FetchResponse, ExtractorError> {
        let headers = self.headers_with(&request.headers);
        let request = request.headers(headers);

        debug!("[{}] {}: {} {}", self.site, stage, request.method, request.url);

        self.transport
            .fetch(request)
            .await
            .map_err(|e| ExtractorError::fetch(self.site, format!("{stage}: {e}")))
    }

    /// Like [`Extractor::send`], but non-2xx statuses are errors, except 3xx
    /// when redirects are not followed.
    pub async fn fetch(
        &self,
        stage: &str,
        request: FetchRequest,
    ) -> Result<FetchResponse, ExtractorError> {
        let follow_redirects = request.follow_redirects;
        let url = request.url.clone();
        let response = self.send(stage, request).await?;

        if response.is_success() || (!follow_redirects && response.is_redirect()) {
            Ok(response)
        } else {
            Err(ExtractorError::fetch(
                self.site,
                format!("{stage}: status {} from {url}", response.status),
            ))
        }
    }

    pub async fn get(
        &self,
        stage: &str,
        url: &Url,
        headers: RequestHeaders,
    ) -> Result<FetchResponse, ExtractorError> {
        self.fetch(stage, FetchRequest::get(url.clone()).headers(headers))
            .await
    }

    /// GETs `url` without following redirects. Any status is returned to the
    /// caller.
    pub async fn get_no_redirect(
        &self,
        stage: &str,
        url: &Url,
        headers: RequestHeaders,
    ) -> Result<FetchResponse, ExtractorError> {
        self.send(
            stage,
            FetchRequest::get(url.clone()).headers(headers).no_redirects(),
        )
        .await
    }

    /// POSTs `form` url-encoded.
    pub async fn post_form(
        &self,
        stage: &str,
        url: &Url,
        headers: RequestHeaders,
        form: &[(&str, &str)],
    ) -> Result<FetchResponse, ExtractorError> {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let headers = headers.with(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.fetch(stage, FetchRequest::post(url.clone(), body).headers(headers))
            .await
    }
}

/// Suffix match of `host` against `domains` on label boundaries.
pub fn host_matches(host: &str, domains: &[&str]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    domains.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Turns a scraped locator into an absolute http(s) URL relative to `base`.
///
/// Handles `\/` escapes, `&amp;` entities, protocol-relative (`//host/x`) and
/// root-relative (`/x`) forms.
pub fn normalize_locator(raw: &str, base: &Url) -> Option<Url> {
    let cleaned = raw.trim().replace("\\/", "/").replace("&amp;", "&");
    if cleaned.is_empty() {
        return None;
    }
    let url = base.join(&cleaned).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Builds a `Cookie` header value from an existing header and freshly set
/// cookies. Later values replace earlier ones with the same name.
pub fn fold_cookies(existing: Option<&str>, cookies: &[(String, String)]) -> Option<String> {
    let mut pairs: Vec<(String, String)> = existing
        .unwrap_or_default()
        .split(';')
        .filter_map(|c| c.trim().split_once('='))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    for (name, value) in cookies {
        match pairs.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.clone(),
            None => pairs.push((name.clone(), value.clone())),
        }
    }

    if pairs.is_empty() {
        return None;
    }

    Some(
        pairs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    fn get_extractor(&self) -> &Extractor;

    fn site(&self) -> &'static str {
        self.get_extractor().site
    }

    fn accepted_domains(&self) -> &'static [&'static str] {
        self.get_extractor().domains()
    }

    fn accepts(&self, url: &Url) -> bool {
        self.get_extractor().accepts(url)
    }

    /// Site-specific resolution of an already domain-checked URL.
    async fn extract(&self, url: Url) -> Result<StreamDescriptor, ExtractorError>;

    /// Resolves `url` into a descriptor.
    ///
    /// The domain check runs before any network access.
    async fn resolve(&self, url: &str) -> Result<StreamDescriptor, ExtractorError> {
        let url = self.get_extractor().parse_url(url)?;
        debug!("[{}] resolving {}", self.site(), url);
        let descriptor = self.extract(url).await?;
        debug!("[{}] resolved {}", self.site(), descriptor);
        Ok(descriptor)
    }
}
