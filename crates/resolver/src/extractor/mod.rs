pub mod classifier;
mod default;
pub mod error;
pub mod factory;
pub mod hls_extractor;
pub mod payload;
pub mod platform_extractor;
pub mod platforms;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use default::{
    ProxyConfig, TransportConfig, create_client, default_factory, default_transport,
    factory_with_config,
};
pub use error::{ErrorKind, ExtractorError};
