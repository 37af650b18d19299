mod builder;

pub use builder::Vidoza;
pub use builder::{SOURCE_REGEX, VIDEO_ID_REGEX};
