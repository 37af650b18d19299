use async_trait::async_trait;
use regex::Regex;
use reqwest::header;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};
use url::Url;

use crate::{
    extractor::{
        classifier::{
            Candidate, LocatorClass, Rejection, Selection, StreamTechnology, classify_locator,
            select_candidate,
        },
        error::ExtractorError,
        hls_extractor::{HlsExtractor, hls_descriptor},
        payload::{find_field, nodes_with_key, parse_tree},
        platform_extractor::{
            Extractor, PlatformExtractor, fold_cookies, host_matches, normalize_locator,
        },
        platforms::vk::models::PLAYER_FIELDS,
        transport::Transport,
    },
    media::{EndpointKind, RequestHeaders, StreamDescriptor},
};

pub static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"video(-?\d+)_(\d+)").unwrap());

pub struct Vk {
    extractor: Extractor,
}

/// Where the embed request leaves the resolution.
enum EmbedOutcome {
    /// The embed redirected straight to a manifest.
    Resolved(StreamDescriptor),
    /// The AJAX payload is needed. Carries the cookies set by the embed.
    Payload(Vec<(String, String)>),
}

impl Vk {
    const SITE: &'static str = "vk";

    pub const DOMAINS: &'static [&'static str] = &["vk.com", "vk.ru", "vkvideo.ru"];

    const BASE_URL: &'static str = "https://vkvideo.ru";

    const DEFAULT_COOKIES: &'static str = "remixlang=0";

    /// Redirecting here means the embed needs a session; use the AJAX payload.
    const LOGIN_HOSTS: &'static [&'static str] = &["login.vk.com", "id.vk.com", "oauth.vk.com"];

    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let extractor = Extractor::new(Self::SITE, Self::DOMAINS, transport)
            .with_header(header::REFERER, format!("{}/", Self::BASE_URL))
            .with_header(header::ORIGIN, Self::BASE_URL)
            .with_header(header::COOKIE, Self::DEFAULT_COOKIES);
        Self { extractor }
    }

    /// Rewrites `/video-1_2` style links to `video_ext.php?oid=-1&id=2` on the
    /// same host; embed URLs are kept as they are.
    pub fn embed_url(&self, url: &Url) -> Result<Url, ExtractorError> {
        if url.path().contains("video_ext.php") {
            return Ok(url.clone());
        }

        let caps = URL_REGEX.captures(url.as_str()).ok_or_else(|| {
            ExtractorError::invalid_url(Self::SITE, format!("invalid video URL: {url}"))
        })?;
        let host = url.host_str().unwrap_or_default();

        Url::parse(&format!(
            "https://{host}/video_ext.php?oid={}&id={}",
            &caps[1], &caps[2]
        ))
        .map_err(|e| ExtractorError::invalid_url(Self::SITE, e.to_string()))
    }

    /// `<oid>_<id>` as expected by `al_video.php`.
    pub fn video_id(embed_url: &Url) -> Result<String, ExtractorError> {
        let param = |name: &str| {
            embed_url
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };

        match (param("oid"), param("id")) {
            (Some(oid), Some(id)) => Ok(format!("{oid}_{id}")),
            _ => Err(ExtractorError::invalid_url(
                Self::SITE,
                format!("embed URL lacks oid/id: {embed_url}"),
            )),
        }
    }

    fn session_cookie(&self, cookies: &[(String, String)]) -> Option<String> {
        let defaults = self.extractor.default_headers();
        fold_cookies(defaults.get(header::COOKIE.as_str()), cookies)
    }

    /// Headers for the downstream fetch.
    fn stream_headers(&self, cookies: &[(String, String)]) -> RequestHeaders {
        let defaults = self.extractor.default_headers();
        let mut headers = RequestHeaders::new();
        for name in [header::USER_AGENT, header::REFERER, header::ORIGIN] {
            if let Some(value) = defaults.get(name.as_str()) {
                headers.insert(name, value);
            }
        }
        if let Some(cookie) = self.session_cookie(cookies) {
            headers.insert(header::COOKIE, cookie);
        }
        headers
    }

    /// Requests the embed without following redirects. A redirect straight to
    /// a manifest is the destination. Any other status, including 4xx and
    /// 5xx, means the AJAX payload has to be used.
    async fn follow_embed(&self, embed_url: &Url) -> Result<EmbedOutcome, ExtractorError> {
        let response = self
            .extractor
            .get_no_redirect("embed redirect", embed_url, RequestHeaders::new())
            .await?;
        let fallback = EmbedOutcome::Payload(response.cookies.clone());

        if !response.is_redirect() {
            debug!("embed answered {} without redirect", response.status);
            return Ok(fallback);
        }

        let Some(target) = response
            .location()
            .and_then(|location| normalize_locator(location, embed_url))
        else {
            debug!("redirect without usable location");
            return Ok(fallback);
        };

        let to_login = target
            .host_str()
            .is_some_and(|host| host_matches(host, Self::LOGIN_HOSTS))
            || target.path().starts_with("/login");
        if to_login {
            debug!("embed redirects to login ({}), using AJAX payload", target);
            return Ok(fallback);
        }

        let headers = self.stream_headers(&response.cookies);
        let descriptor = match classify_locator(&target) {
            LocatorClass::Hls => {
                let probe = self.probe_hls_stream(&target, headers.clone()).await?;
                hls_descriptor(target, headers, probe)
            }
            LocatorClass::Dash => {
                StreamDescriptor::new(target, EndpointKind::DashManifest, headers)
            }
            LocatorClass::FullFile => {
                warn!("redirect target is a full-file variant: {}", target);
                return Ok(fallback);
            }
            LocatorClass::Raw => {
                debug!("redirect to {} is not a manifest", target);
                return Ok(fallback);
            }
        };

        Ok(EmbedOutcome::Resolved(
            descriptor.with_metadata("source_field", "redirect"),
        ))
    }

    /// Posts to `al_video.php` with the embed cookies and returns the parsed
    /// payload along with the cookies it set.
    async fn fetch_payload(
        &self,
        embed_url: &Url,
        cookies: &[(String, String)],
    ) -> Result<(Value, Vec<(String, String)>), ExtractorError> {
        let video = Self::video_id(embed_url)?;
        let host = embed_url.host_str().unwrap_or_default();
        let ajax_url = Url::parse(&format!("https://{host}/al_video.php?act=show"))
            .map_err(|e| ExtractorError::invalid_url(Self::SITE, e.to_string()))?;

        let mut headers = RequestHeaders::new().with("X-Requested-With", "XMLHttpRequest");
        if let Some(cookie) = self.session_cookie(cookies) {
            headers.insert(header::COOKIE, cookie);
        }
        let response = self
            .extractor
            .post_form(
                "video payload",
                &ajax_url,
                headers,
                &[("act", "show"), ("al", "1"), ("video", video.as_str())],
            )
            .await?;

        if response.body.trim().is_empty() {
            return Err(ExtractorError::empty_payload(Self::SITE, "empty video payload"));
        }

        let tree = parse_tree(&response.body).map_err(|e| {
            ExtractorError::invalid_payload(Self::SITE, format!("invalid JSON payload: {e}"))
        })?;

        Ok((tree, response.cookies))
    }

    fn player_candidates(player: &Value) -> Vec<Candidate> {
        PLAYER_FIELDS
            .iter()
            .filter_map(|field| {
                let locator = find_field(player, &[field.pointer])?;
                let source = field.pointer.trim_start_matches('/').replace('/', ".");
                Some(match field.quality {
                    Some(quality) => Candidate::progressive(source, locator, quality),
                    None => Candidate::new(source, field.technology, locator),
                })
            })
            .collect()
    }

    /// Scans every player node; the first one with a playable candidate wins.
    pub fn select_from_payload(
        &self,
        tree: &Value,
        base: &Url,
    ) -> Result<Selection, ExtractorError> {
        let players = nodes_with_key(tree, "payload", "player");
        debug!("found {} player node(s)", players.len());

        let mut disallowed = false;
        for player in players {
            let candidates = Self::player_candidates(player);
            match select_candidate(&candidates, base) {
                Ok(selection) => return Ok(selection),
                Err(Rejection::AllDisallowed) => disallowed = true,
                Err(Rejection::NoCandidates) => continue,
            }
        }

        if disallowed {
            Err(ExtractorError::disallowed(
                Self::SITE,
                "manifest is a full-file variant and no fallback stream exists",
            ))
        } else {
            Err(ExtractorError::not_found(Self::SITE, "no playable stream found in payload"))
        }
    }
}

impl HlsExtractor for Vk {}

#[async_trait]
impl PlatformExtractor for Vk {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn extract(&self, url: Url) -> Result<StreamDescriptor, ExtractorError> {
        let embed_url = self.embed_url(&url)?;
        debug!("embed url: {}", embed_url);

        let mut cookies = match self.follow_embed(&embed_url).await? {
            EmbedOutcome::Resolved(descriptor) => return Ok(descriptor),
            EmbedOutcome::Payload(cookies) => cookies,
        };

        let (tree, payload_cookies) = self.fetch_payload(&embed_url, &cookies).await?;
        cookies.extend(payload_cookies);
        let selection = self.select_from_payload(&tree, &embed_url)?;
        let headers = self.stream_headers(&cookies);

        let descriptor = match selection.technology {
            StreamTechnology::Hls => {
                let probe = self.probe_hls_stream(&selection.url, headers.clone()).await?;
                hls_descriptor(selection.url.clone(), headers, probe)
            }
            StreamTechnology::Dash => {
                StreamDescriptor::new(selection.url.clone(), EndpointKind::DashManifest, headers)
            }
            StreamTechnology::Progressive => {
                StreamDescriptor::new(selection.url.clone(), EndpointKind::RawStream, headers)
            }
        };

        let descriptor = descriptor.with_metadata("source_field", selection.source.as_str());
        Ok(match selection.quality_label() {
            Some(quality) => descriptor.with_metadata("quality", quality),
            None => descriptor,
        })
    }
}
