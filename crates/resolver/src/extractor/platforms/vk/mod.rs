mod builder;
mod models;

pub use builder::URL_REGEX;
pub use builder::Vk;
pub use models::{PLAYER_FIELDS, PlayerField};
