use std::sync::Arc;

use tracing::debug;
use url::Url;

use super::error::ExtractorError;
use super::platform_extractor::PlatformExtractor;
use super::transport::Transport;
use crate::extractor::platforms::{turbovidplay::TurboVidPlay, vidoza::Vidoza, vk::Vk};
use crate::media::StreamDescriptor;

// A type alias for a thread-safe constructor function.
type ExtractorConstructor = fn(Arc<dyn Transport>) -> Box<dyn PlatformExtractor>;

// Macro to create a constructor function for a given site
macro_rules! create_constructor {
    ($name:ident, $builder:expr) => {
        fn $name(transport: Arc<dyn Transport>) -> Box<dyn PlatformExtractor> {
            Box::new($builder(transport))
        }
    };
}

create_constructor!(new_vidoza, Vidoza::new);
create_constructor!(new_turbovidplay, TurboVidPlay::new);
create_constructor!(new_vk, Vk::new);

// Static site registry, in dispatch order
static SITES: &[ExtractorConstructor] = &[new_vidoza, new_turbovidplay, new_vk];

/// Dispatches page URLs to the site adapter whose domains match the host.
pub struct ExtractorFactory {
    extractors: Vec<Arc<dyn PlatformExtractor>>,
}

impl ExtractorFactory {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let extractors = SITES
            .iter()
            .map(|constructor| Arc::from(constructor(transport.clone())))
            .collect();
        Self { extractors }
    }

    /// The adapter accepting `url`'s host.
    pub fn find_extractor(&self, url: &str) -> Result<Arc<dyn PlatformExtractor>, ExtractorError> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| ExtractorError::invalid_url("dispatcher", format!("'{url}': {e}")))?;

        self.extractors
            .iter()
            .find(|extractor| extractor.accepts(&parsed))
            .cloned()
            .ok_or_else(|| ExtractorError::unsupported(url))
    }

    pub async fn resolve(&self, url: &str) -> Result<StreamDescriptor, ExtractorError> {
        let extractor = self.find_extractor(url)?;
        debug!("dispatching {} to {}", url, extractor.site());
        extractor.resolve(url).await
    }

    /// Registered sites with their accepted domain suffixes.
    pub fn supported_sites(&self) -> Vec<(&'static str, &'static [&'static str])> {
        self.extractors
            .iter()
            .map(|extractor| (extractor.site(), extractor.accepted_domains()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{ErrorKind, testing::FixtureTransport};
    use crate::media::EndpointKind;

    fn factory(transport: &FixtureTransport) -> ExtractorFactory {
        ExtractorFactory::new(Arc::new(transport.clone()))
    }

    #[test]
    fn picks_adapter_by_host_suffix() {
        let factory = factory(&FixtureTransport::new());
        let cases = [
            ("https://vidoza.net/embed-abc.html", "vidoza"),
            ("https://www.videzz.net/abc.html", "vidoza"),
            ("https://emturbovid.com/t/abc", "turbovidplay"),
            ("https://m.vk.com/video-1_2", "vk"),
            ("https://vkvideo.ru/video-1_2", "vk"),
        ];
        for (url, site) in cases {
            assert_eq!(factory.find_extractor(url).unwrap().site(), site, "{url}");
        }
    }

    #[test]
    fn rejects_unknown_and_malformed_urls() {
        let factory = factory(&FixtureTransport::new());

        let err = factory.find_extractor("https://notvk.com/video-1_2").err().unwrap();
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert_eq!(err.site, "dispatcher");

        let err = factory.find_extractor("not a url").err().unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidUrl);
    }

    #[test]
    fn lists_every_site() {
        let sites = factory(&FixtureTransport::new()).supported_sites();
        let names: Vec<_> = sites.iter().map(|(site, _)| *site).collect();
        assert_eq!(names, ["vidoza", "turbovidplay", "vk"]);
        assert!(sites[2].1.contains(&"vkvideo.ru"));
    }

    #[tokio::test]
    async fn resolve_goes_through_the_matching_adapter() {
        let page = r#"<script>player.setup({ sources: [{ file: "https:\/\/str1.vidoza.net\/v.mp4", "res":"480"}] })</script>"#;
        let transport =
            FixtureTransport::new().with_get("https://videzz.net/abc.html", 200, page);

        let descriptor = factory(&transport)
            .resolve("https://vidoza.co/embed-abc.html")
            .await
            .unwrap();
        assert_eq!(descriptor.destination_url.as_str(), "https://str1.vidoza.net/v.mp4");
        assert_eq!(descriptor.endpoint_kind, EndpointKind::RawStream);
        assert_eq!(descriptor.metadata_value("label"), Some("480"));
    }
}
