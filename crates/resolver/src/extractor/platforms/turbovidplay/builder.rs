use async_trait::async_trait;
use regex::Regex;
use reqwest::header;
use std::sync::{Arc, LazyLock};
use tracing::debug;
use url::Url;

use crate::{
    extractor::{
        error::ExtractorError,
        hls_extractor::{HlsExtractor, hls_descriptor},
        platform_extractor::{Extractor, PlatformExtractor, fold_cookies, normalize_locator},
        transport::Transport,
    },
    media::{RequestHeaders, StreamDescriptor},
};

/// Intermediate playlist locator on the embed page.
pub static MEDIA_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:urlPlay|data-hash)\s*=\s*['"]([^'"]+)"#).unwrap());

/// First absolute playlist URL inside the intermediate playlist.
pub static PLAYLIST_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^'"\s]+\.m3u8"#).unwrap());

pub struct TurboVidPlay {
    extractor: Extractor,
}

impl TurboVidPlay {
    const SITE: &'static str = "turbovidplay";

    pub const DOMAINS: &'static [&'static str] = &[
        "turboviplay.com",
        "emturbovid.com",
        "tuborstb.co",
        "javggvideo.xyz",
        "stbturbo.xyz",
        "turbovidhls.com",
    ];

    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            extractor: Extractor::new(Self::SITE, Self::DOMAINS, transport),
        }
    }

    /// Headers for the playlist hops and the final stream. Every hop is
    /// referred by the input page.
    fn referred_headers(&self, referer: &Url, cookies: &[(String, String)]) -> RequestHeaders {
        let mut headers = RequestHeaders::new().with(header::REFERER, referer.as_str());
        let user_agent = self.extractor.default_headers().get(header::USER_AGENT.as_str());
        if let Some(user_agent) = user_agent {
            headers.insert(header::USER_AGENT, user_agent);
        }
        if let Some(cookie) = fold_cookies(None, cookies) {
            headers.insert(header::COOKIE, cookie);
        }
        headers
    }
}

#[async_trait]
impl PlatformExtractor for TurboVidPlay {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn extract(&self, url: Url) -> Result<StreamDescriptor, ExtractorError> {
        let page = self
            .extractor
            .get("embed page", &url, RequestHeaders::new())
            .await?;
        self.extractor.ensure_accepted(&page.final_url)?;

        let raw_media_url = MEDIA_URL_REGEX
            .captures(&page.body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| ExtractorError::not_found(Self::SITE, "no media URL found"))?;

        let media_url = normalize_locator(raw_media_url, &page.final_url).ok_or_else(|| {
            ExtractorError::not_found(Self::SITE, format!("invalid media URL '{raw_media_url}'"))
        })?;
        debug!("intermediate playlist: {}", media_url);

        let headers = self.referred_headers(&url, &page.cookies);
        let intermediate = self
            .extractor
            .get("intermediate playlist", &media_url, headers.clone())
            .await?;

        let playlist_url = PLAYLIST_URL_REGEX
            .find(&intermediate.body)
            .and_then(|m| Url::parse(m.as_str()).ok())
            .ok_or_else(|| {
                ExtractorError::not_found(Self::SITE, "unable to extract real playlist URL")
            })?;
        debug!("real playlist: {}", playlist_url);

        let probe = self.probe_hls_stream(&playlist_url, headers.clone()).await?;

        Ok(hls_descriptor(playlist_url, headers, probe))
    }
}

impl HlsExtractor for TurboVidPlay {}
