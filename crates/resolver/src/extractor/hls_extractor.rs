use async_trait::async_trait;
use url::Url;

use super::classifier::{PlaylistProbe, classify_playlist};
use super::error::ExtractorError;
use super::platform_extractor::PlatformExtractor;
use crate::media::{PlaylistKind, RequestHeaders, StreamDescriptor};

#[async_trait]
pub trait HlsExtractor: PlatformExtractor {
    /// Fetches `m3u8_url` and tells a master playlist from a media playlist.
    async fn probe_hls_stream(
        &self,
        m3u8_url: &Url,
        headers: RequestHeaders,
    ) -> Result<PlaylistProbe, ExtractorError> {
        let extractor = self.get_extractor();
        let response = extractor.get("playlist", m3u8_url, headers).await?;

        if response.body.trim().is_empty() {
            return Err(ExtractorError::empty_payload(
                extractor.site,
                format!("empty playlist at {m3u8_url}"),
            ));
        }

        classify_playlist(&response.body).ok_or_else(|| {
            ExtractorError::invalid_payload(
                extractor.site,
                format!("not an HLS playlist: {m3u8_url}"),
            )
        })
    }
}

/// Descriptor for a probed playlist, recording the variant/segment count.
pub fn hls_descriptor(url: Url, headers: RequestHeaders, probe: PlaylistProbe) -> StreamDescriptor {
    let count_key = match probe.kind {
        PlaylistKind::Master => "variants",
        PlaylistKind::Media => "segments",
    };
    StreamDescriptor::new(url, probe.endpoint_kind(), headers)
        .with_metadata(count_key, probe.entries.to_string())
}
