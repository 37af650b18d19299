//! Resolution of video-hosting page URLs into [`StreamDescriptor`]s.
//!
//! A [`StreamDescriptor`] names the absolute media URL, the headers needed to
//! fetch it and the downstream handling mode (progressive file, HLS playlist
//! or DASH manifest). Site adapters live under [`extractor::platforms`] and are
//! selected by host through [`extractor::factory::ExtractorFactory`].

pub mod extractor;
pub mod media;

pub use extractor::error::{ErrorKind, ExtractorError};
pub use media::{EndpointKind, PlaylistKind, RequestHeaders, StreamDescriptor};
