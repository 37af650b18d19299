use super::factory::ExtractorFactory;
use super::transport::{HttpTransport, Transport, TransportError};
use reqwest::Client;
use reqwest::redirect::Policy;
use rustls::{ClientConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Total time allowed for one fetch, body included.
    pub timeout: Duration,
    pub proxy: Option<ProxyConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            proxy: None,
        }
    }
}

pub fn create_client(
    config: &TransportConfig,
    follow_redirects: bool,
) -> Result<Client, TransportError> {
    let provider = Arc::new(ring::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(e.to_string()))?
        .with_platform_verifier()
        .map_err(|e| TransportError::Tls(e.to_string()))?
        .with_no_client_auth();

    let redirect = if follow_redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    };

    let mut builder = Client::builder()
        .use_preconfigured_tls(tls_config)
        .redirect(redirect)
        .timeout(config.timeout);

    if let Some(proxy_config) = &config.proxy {
        let mut proxy = reqwest::Proxy::all(&proxy_config.url)?;
        if let (Some(username), Some(password)) = (&proxy_config.username, &proxy_config.password)
        {
            proxy = proxy.basic_auth(username, password);
        }
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

pub fn default_transport() -> Result<Arc<dyn Transport>, TransportError> {
    Ok(Arc::new(HttpTransport::new(&TransportConfig::default())?))
}

/// Returns a new `ExtractorFactory` populated with all the supported sites.
pub fn default_factory() -> Result<ExtractorFactory, TransportError> {
    Ok(ExtractorFactory::new(default_transport()?))
}

/// Returns a new `ExtractorFactory` whose transport uses `config`.
pub fn factory_with_config(config: &TransportConfig) -> Result<ExtractorFactory, TransportError> {
    let transport = HttpTransport::new(config)?;
    Ok(ExtractorFactory::new(Arc::new(transport)))
}
