mod builder;

pub use builder::TurboVidPlay;
pub use builder::{MEDIA_URL_REGEX, PLAYLIST_URL_REGEX};
