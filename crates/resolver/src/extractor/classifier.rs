//! Candidate ranking and stream-type classification shared by all sites.
//!
//! Priority is fixed: HLS, then DASH, then progressive files from the highest
//! resolution down. DASH candidates carrying a full-file marker in their query
//! are download links rather than manifests and are skipped.

use std::cmp::Reverse;

use m3u8_rs::Playlist;
use tracing::{debug, warn};
use url::Url;

use super::platform_extractor::normalize_locator;
use crate::media::{EndpointKind, PlaylistKind};

/// Stream technologies in priority order; the derived `Ord` is the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamTechnology {
    Hls,
    Dash,
    Progressive,
}

/// Progressive resolutions, best first.
pub const PROGRESSIVE_QUALITIES: &[u32] = &[2160, 1440, 1080, 720, 480, 360, 240, 144];

/// Query markers of full-file transcodes served from manifest endpoints.
/// `None` matches the key with any value.
pub const FULL_FILE_MARKERS: &[(&str, Option<&str>)] = &[
    ("fromCache", Some("1")),
    ("ch", None),
    ("appId", None),
    ("type", Some("1")),
    ("type", Some("3")),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Payload field the locator was read from.
    pub source: String,
    pub technology: StreamTechnology,
    pub locator: String,
    pub quality: Option<u32>,
}

impl Candidate {
    pub fn new<S: Into<String>, L: Into<String>>(
        source: S,
        technology: StreamTechnology,
        locator: L,
    ) -> Self {
        Self {
            source: source.into(),
            technology,
            locator: locator.into(),
            quality: None,
        }
    }

    pub fn progressive<S: Into<String>, L: Into<String>>(
        source: S,
        locator: L,
        quality: u32,
    ) -> Self {
        Self {
            quality: Some(quality),
            ..Self::new(source, StreamTechnology::Progressive, locator)
        }
    }
}

/// The winning candidate, with its locator made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub url: Url,
    pub technology: StreamTechnology,
    pub source: String,
    pub quality: Option<u32>,
}

impl Selection {
    pub fn quality_label(&self) -> Option<String> {
        self.quality.map(|q| format!("{q}p"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoCandidates,
    /// At least one candidate existed, all were full-file variants.
    AllDisallowed,
}

/// What a bare URL looks like, judged from its path and query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorClass {
    Hls,
    Dash,
    FullFile,
    Raw,
}

pub fn is_full_file_variant(url: &Url) -> bool {
    url.query_pairs().any(|(key, value)| {
        FULL_FILE_MARKERS
            .iter()
            .any(|(k, v)| key == *k && v.is_none_or(|v| value == v))
    })
}

pub fn classify_locator(url: &Url) -> LocatorClass {
    let path = url.path().to_ascii_lowercase();
    if path.ends_with(".m3u8") || path.ends_with(".m3u") {
        LocatorClass::Hls
    } else if path.ends_with(".mpd") {
        if is_full_file_variant(url) {
            LocatorClass::FullFile
        } else {
            LocatorClass::Dash
        }
    } else {
        LocatorClass::Raw
    }
}

/// Picks the best playable candidate.
///
/// Candidates are ordered by technology, then by descending quality; ties keep
/// the caller's order. Empty or non-http locators are skipped, as are DASH
/// locators with full-file markers.
pub fn select_candidate(candidates: &[Candidate], base: &Url) -> Result<Selection, Rejection> {
    let mut ordered = candidates.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|c| (c.technology, Reverse(c.quality.unwrap_or(0))));

    let mut disallowed = 0usize;
    for candidate in ordered {
        let Some(url) = normalize_locator(&candidate.locator, base) else {
            debug!("skipping unusable locator in '{}'", candidate.source);
            continue;
        };

        if candidate.technology == StreamTechnology::Dash && is_full_file_variant(&url) {
            warn!("'{}' is a full-file variant, skipping: {}", candidate.source, url);
            disallowed += 1;
            continue;
        }

        debug!("selected '{}' ({:?}): {}", candidate.source, candidate.technology, url);
        return Ok(Selection {
            url,
            technology: candidate.technology,
            source: candidate.source.clone(),
            quality: candidate.quality,
        });
    }

    if disallowed > 0 {
        Err(Rejection::AllDisallowed)
    } else {
        Err(Rejection::NoCandidates)
    }
}

/// Result of inspecting a fetched HLS body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistProbe {
    pub kind: PlaylistKind,
    /// Variants for a master playlist, segments for a media playlist.
    pub entries: usize,
}

impl PlaylistProbe {
    pub fn endpoint_kind(&self) -> EndpointKind {
        EndpointKind::HlsPlaylist(self.kind)
    }
}

/// Classifies an HLS body as master or media; `None` if it is not HLS at all.
///
/// Presence of `#EXTINF` decides the kind; `m3u8-rs` supplies the entry count.
pub fn classify_playlist(body: &str) -> Option<PlaylistProbe> {
    let trimmed = body.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("#EXTM3U") {
        return None;
    }

    let kind = if trimmed.contains("#EXTINF") {
        PlaylistKind::Media
    } else {
        PlaylistKind::Master
    };

    let entries = match (kind, m3u8_rs::parse_playlist_res(trimmed.as_bytes())) {
        (PlaylistKind::Master, Ok(Playlist::MasterPlaylist(pl))) => pl.variants.len(),
        (PlaylistKind::Media, Ok(Playlist::MediaPlaylist(pl))) => pl.segments.len(),
        _ => trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .count(),
    };

    Some(PlaylistProbe { kind, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://vk.com/video_ext.php?oid=1&id=2").unwrap()
    }

    #[test]
    fn prefers_hls_over_dash() {
        let candidates = vec![
            Candidate::new("dash", StreamTechnology::Dash, "https://cdn.example/v.mpd"),
            Candidate::progressive("url1080", "https://cdn.example/1080.mp4", 1080),
            Candidate::new("hls", StreamTechnology::Hls, "https://cdn.example/v.m3u8"),
        ];

        let selection = select_candidate(&candidates, &base()).unwrap();
        assert_eq!(selection.technology, StreamTechnology::Hls);
        assert_eq!(selection.url.as_str(), "https://cdn.example/v.m3u8");
    }

    #[test]
    fn full_file_dash_falls_through_to_progressive() {
        let candidates = vec![
            Candidate::new("dash", StreamTechnology::Dash, "https://cdn.example/v.mpd?type=3"),
            Candidate::progressive("url360", "https://cdn.example/360.mp4", 360),
            Candidate::progressive("url720", "https://cdn.example/720.mp4", 720),
        ];

        let selection = select_candidate(&candidates, &base()).unwrap();
        assert_eq!(selection.technology, StreamTechnology::Progressive);
        assert_eq!(selection.url.as_str(), "https://cdn.example/720.mp4");
        assert_eq!(selection.quality_label().as_deref(), Some("720p"));
    }

    #[test]
    fn only_disallowed_candidates_are_reported() {
        let candidates = vec![
            Candidate::new("dash", StreamTechnology::Dash, "https://cdn.example/a.mpd?appId=9"),
            Candidate::new(
                "cache",
                StreamTechnology::Dash,
                "https://cdn.example/b.mpd?fromCache=1",
            ),
        ];
        assert_eq!(
            select_candidate(&candidates, &base()),
            Err(Rejection::AllDisallowed)
        );
        assert_eq!(select_candidate(&[], &base()), Err(Rejection::NoCandidates));
    }

    #[test]
    fn empty_locators_are_skipped() {
        let candidates = vec![
            Candidate::progressive("url1080", "", 1080),
            Candidate::progressive("url480", "//cdn.example/480.mp4", 480),
        ];
        let selection = select_candidate(&candidates, &base()).unwrap();
        assert_eq!(selection.url.as_str(), "https://cdn.example/480.mp4");
    }

    #[test]
    fn denylist_matches_exact_query_pairs() {
        let url = |s: &str| Url::parse(s).unwrap();
        assert!(is_full_file_variant(&url("https://a.example/v.mpd?type=1")));
        assert!(is_full_file_variant(&url("https://a.example/v.mpd?x=2&ch=5")));
        assert!(!is_full_file_variant(&url("https://a.example/v.mpd?type=2")));
        assert!(!is_full_file_variant(&url("https://a.example/v.mpd?search=ch")));
    }

    #[test]
    fn classifies_locators_by_extension() {
        let url = |s: &str| Url::parse(s).unwrap();
        let class = |s: &str| classify_locator(&url(s));
        assert_eq!(class("https://a.example/x/master.m3u8?t=1"), LocatorClass::Hls);
        assert_eq!(class("https://a.example/x.mpd"), LocatorClass::Dash);
        assert_eq!(class("https://a.example/x.mpd?fromCache=1"), LocatorClass::FullFile);
        assert_eq!(class("https://a.example/x.mp4"), LocatorClass::Raw);
    }

    #[test]
    fn classifies_master_and_media_playlists() {
        let master = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1280000,RESOLUTION=1280x720\n720/index.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=640000,RESOLUTION=640x360\n360/index.m3u8\n";
        let probe = classify_playlist(master).unwrap();
        assert_eq!(probe.kind, PlaylistKind::Master);
        assert_eq!(probe.entries, 2);
        assert_eq!(probe.endpoint_kind().endpoint(), "hls_manifest_proxy");

        let media = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n#EXTINF:6.0,\nseg0.ts\n#EXTINF:6.0,\nseg1.ts\n#EXT-X-ENDLIST\n";
        let probe = classify_playlist(media).unwrap();
        assert_eq!(probe.kind, PlaylistKind::Media);
        assert_eq!(probe.entries, 2);

        assert!(classify_playlist("<html>not found</html>").is_none());
    }
}
