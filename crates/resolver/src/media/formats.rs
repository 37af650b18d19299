use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two shapes an HLS playlist can take.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistKind {
    /// Lists variant streams.
    Master,
    /// Lists segments directly (`#EXTINF`).
    Media,
}

impl PlaylistKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistKind::Master => "master",
            PlaylistKind::Media => "media",
        }
    }
}

/// How the downstream proxy must treat the destination payload.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "playlist", rename_all = "snake_case")]
pub enum EndpointKind {
    RawStream,
    HlsPlaylist(PlaylistKind),
    DashManifest,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::RawStream => "raw",
            EndpointKind::HlsPlaylist(_) => "hls",
            EndpointKind::DashManifest => "dash",
        }
    }

    /// Endpoint tag the streaming proxy routes on.
    pub fn endpoint(&self) -> &'static str {
        match self {
            EndpointKind::RawStream => "proxy_stream_endpoint",
            EndpointKind::HlsPlaylist(PlaylistKind::Master) => "hls_manifest_proxy",
            EndpointKind::HlsPlaylist(PlaylistKind::Media) => "hls_playlist_proxy",
            EndpointKind::DashManifest => "mpd_manifest_proxy",
        }
    }
}

impl Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::HlsPlaylist(kind) => write!(f, "hls/{}", kind.as_str()),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl FromStr for EndpointKind {
    type Err = ();

    /// Parses an endpoint tag as produced by [`EndpointKind::endpoint`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proxy_stream_endpoint" => Ok(EndpointKind::RawStream),
            "hls_manifest_proxy" => Ok(EndpointKind::HlsPlaylist(PlaylistKind::Master)),
            "hls_playlist_proxy" => Ok(EndpointKind::HlsPlaylist(PlaylistKind::Media)),
            "mpd_manifest_proxy" => Ok(EndpointKind::DashManifest),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tags_round_trip() {
        for kind in [
            EndpointKind::RawStream,
            EndpointKind::HlsPlaylist(PlaylistKind::Master),
            EndpointKind::HlsPlaylist(PlaylistKind::Media),
            EndpointKind::DashManifest,
        ] {
            assert_eq!(kind.endpoint().parse::<EndpointKind>(), Ok(kind));
        }
        assert!("hls".parse::<EndpointKind>().is_err());
    }

    #[test]
    fn serializes_with_playlist_kind() {
        let json = serde_json::to_value(EndpointKind::HlsPlaylist(PlaylistKind::Media)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "hls_playlist", "playlist": "media"}));

        let json = serde_json::to_value(EndpointKind::RawStream).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "raw_stream"}));
    }
}
