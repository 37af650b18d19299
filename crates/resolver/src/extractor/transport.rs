use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION, SET_COOKIE};
use reqwest::{Client, Method};
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::default::{TransportConfig, create_client};
use crate::media::RequestHeaders;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
    #[error("tls error: {0}")]
    Tls(String),
    #[error("{0}")]
    Other(String),
}

/// A single outbound request issued by an extractor.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub method: Method,
    pub headers: RequestHeaders,
    pub body: Option<String>,
    pub follow_redirects: bool,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: RequestHeaders::new(),
            body: None,
            follow_redirects: true,
        }
    }

    pub fn post(url: Url, body: String) -> Self {
        Self {
            url,
            method: Method::POST,
            headers: RequestHeaders::new(),
            body: Some(body),
            follow_redirects: true,
        }
    }

    pub fn headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// The raw upstream response, with the body already read as text.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
    /// URL after redirects were followed.
    pub final_url: Url,
    /// `(name, value)` pairs from `Set-Cookie`, in response order.
    pub cookies: Vec<(String, String)>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// The HTTP capability extractors are built on.
///
/// Retries, TLS, pooling and timeouts belong to the implementation; callers
/// only choose whether redirects are followed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError>;
}

/// Parses `Set-Cookie` headers into `(name, value)` pairs, dropping attributes.
pub fn parse_set_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie_str| cookie_str.split(';').next())
        .filter_map(|cookie_part| cookie_part.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

fn to_header_map(headers: &RequestHeaders) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::InvalidHeader(name.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// [`Transport`] backed by two `reqwest` clients, one of which never follows
/// redirects.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    no_redirect_client: Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: create_client(config, true)?,
            no_redirect_client: create_client(config, false)?,
        })
    }

    pub fn from_clients(client: Client, no_redirect_client: Client) -> Self {
        Self {
            client,
            no_redirect_client,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        let client = if request.follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        debug!(
            "{} {} (follow redirects: {})",
            request.method, request.url, request.follow_redirects
        );

        let mut builder = client
            .request(request.method, request.url)
            .headers(to_header_map(&request.headers)?);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let cookies = parse_set_cookies(&headers);
        let body = response.text().await?;

        debug!("{} -> {} ({} bytes)", final_url, status, body.len());

        Ok(FetchResponse {
            status,
            headers,
            body,
            final_url,
            cookies,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> HttpTransport {
        let follow = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let no_follow = Client::builder()
            .timeout(Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        HttpTransport::from_clients(follow, no_follow)
    }

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_body_and_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch.html"))
            .and(header("referer", "https://vidoza.net/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "token=abc123; Path=/; HttpOnly")
                    .append_header("set-cookie", "lang=en")
                    .set_body_string("<html>player</html>"),
            )
            .mount(&server)
            .await;

        let request = FetchRequest::get(url(&server, "/watch.html"))
            .headers(RequestHeaders::new().with("Referer", "https://vidoza.net/"));
        let response = transport().fetch(request).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, "<html>player</html>");
        assert_eq!(
            response.cookies,
            vec![
                ("token".to_string(), "abc123".to_string()),
                ("lang".to_string(), "en".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn no_redirect_mode_exposes_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video_ext.php"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "https://login.vk.com/?act=x"),
            )
            .mount(&server)
            .await;

        let request = FetchRequest::get(url(&server, "/video_ext.php")).no_redirects();
        let response = transport().fetch(request).await.unwrap();

        assert!(response.is_redirect());
        assert_eq!(response.location(), Some("https://login.vk.com/?act=x"));
    }

    #[tokio::test]
    async fn follows_redirects_and_reports_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let response = transport()
            .fetch(FetchRequest::get(url(&server, "/old")))
            .await
            .unwrap();

        assert_eq!(response.body, "moved");
        assert_eq!(response.final_url.path(), "/new");
    }

    #[tokio::test]
    async fn post_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/al_video.php"))
            .and(body_string("act=show&al=1&video=-1_2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<!--{}"))
            .mount(&server)
            .await;

        let request = FetchRequest::post(
            url(&server, "/al_video.php?act=show"),
            "act=show&al=1&video=-1_2".to_string(),
        );
        let response = transport().fetch(request).await.unwrap();
        assert_eq!(response.body, "<!--{}");
    }

    #[test]
    fn rejects_invalid_header_values() {
        let headers = RequestHeaders::new().with("referer", "bad\nvalue");
        assert!(matches!(
            to_header_map(&headers),
            Err(TransportError::InvalidHeader(_))
        ));
    }
}
