use async_trait::async_trait;
use regex::Regex;
use reqwest::header;
use std::sync::{Arc, LazyLock};
use tracing::debug;
use url::Url;

use crate::{
    extractor::{
        error::ExtractorError,
        platform_extractor::{Extractor, PlatformExtractor, fold_cookies, normalize_locator},
        transport::Transport,
    },
    media::{EndpointKind, RequestHeaders, StreamDescriptor},
};

/// Video id from `/embed-<id>.html` or `/<id>.html`.
pub static VIDEO_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:embed-)?([A-Za-z0-9]+)\.html?").unwrap());

/// `file`/`src` assignment in the player setup, followed by its `res` label.
pub static SOURCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)["'\s](?:file|src)["'\s:]*["'](?P<url>[^"']+)(?:[^}\]]+)["']\s*res["'\s:]*["']?(?P<label>[^"']+)"#,
    )
    .unwrap()
});

pub struct Vidoza {
    extractor: Extractor,
}

impl Vidoza {
    const SITE: &'static str = "vidoza";

    pub const DOMAINS: &'static [&'static str] = &["vidoza.net", "vidoza.co", "videzz.net"];

    const BASE_URL: &'static str = "https://vidoza.net";

    const WATCH_URL: &'static str = "https://videzz.net/{video_id}.html";

    const USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let extractor = Extractor::new(Self::SITE, Self::DOMAINS, transport)
            .with_header(header::REFERER, format!("{}/", Self::BASE_URL))
            .with_header(header::ORIGIN, Self::BASE_URL)
            .with_header(header::USER_AGENT, Self::USER_AGENT)
            .with_header(header::ACCEPT, "*/*")
            .with_header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        Self { extractor }
    }

    /// Canonical watch page for an embed or watch link.
    pub fn watch_url(&self, url: &Url) -> Result<Url, ExtractorError> {
        let video_id = VIDEO_ID_REGEX
            .captures(url.path())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| {
                ExtractorError::invalid_url(Self::SITE, format!("invalid Vidoza URL: {url}"))
            })?;

        Url::parse(&Self::WATCH_URL.replace("{video_id}", video_id))
            .map_err(|e| ExtractorError::invalid_url(Self::SITE, e.to_string()))
    }
}

#[async_trait]
impl PlatformExtractor for Vidoza {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn extract(&self, url: Url) -> Result<StreamDescriptor, ExtractorError> {
        let watch_url = self.watch_url(&url)?;
        debug!("watch url: {}", watch_url);

        let response = self
            .extractor
            .get("watch page", &watch_url, RequestHeaders::new())
            .await?;
        self.extractor.ensure_accepted(&response.final_url)?;

        if response.body.trim().is_empty() {
            return Err(ExtractorError::empty_payload(Self::SITE, "empty watch page"));
        }

        let caps = SOURCE_REGEX.captures(&response.body).ok_or_else(|| {
            ExtractorError::not_found(
                Self::SITE,
                "unable to extract video and label from player script",
            )
        })?;

        let raw_url = &caps["url"];
        let label = caps["label"].trim();
        let video_url = normalize_locator(raw_url, &response.final_url).ok_or_else(|| {
            ExtractorError::not_found(Self::SITE, format!("invalid video locator '{raw_url}'"))
        })?;
        debug!("video url: {} ({})", video_url, label);

        let mut headers = self.extractor.default_headers().clone();
        let cookie = fold_cookies(headers.get(header::COOKIE.as_str()), &response.cookies);
        if let Some(cookie) = cookie {
            headers.insert(header::COOKIE, cookie);
        }

        Ok(StreamDescriptor::new(video_url, EndpointKind::RawStream, headers)
            .with_metadata("label", label))
    }
}
