use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use url::Url;

use super::{EndpointKind, RequestHeaders};

/// The resolved, proxy-ready description of a media resource.
///
/// `destination_url` is always absolute; `request_headers` carry everything
/// needed to replay the fetch (cookies included) without any session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub destination_url: Url,
    pub request_headers: RequestHeaders,
    pub endpoint_kind: EndpointKind,
    pub metadata: Option<FxHashMap<String, String>>,
}

impl StreamDescriptor {
    pub fn new(
        destination_url: Url,
        endpoint_kind: EndpointKind,
        request_headers: RequestHeaders,
    ) -> Self {
        Self {
            destination_url,
            request_headers,
            endpoint_kind,
            metadata: None,
        }
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata
            .get_or_insert_with(FxHashMap::default)
            .insert(key.into(), value.into());
        self
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint_kind.endpoint()
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }
}

// The wire form adds the endpoint tag next to the kind.
impl Serialize for StreamDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            destination_url: &'a str,
            request_headers: &'a RequestHeaders,
            endpoint_kind: EndpointKind,
            endpoint: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            metadata: Option<&'a FxHashMap<String, String>>,
        }

        Wire {
            destination_url: self.destination_url.as_str(),
            request_headers: &self.request_headers,
            endpoint_kind: self.endpoint_kind,
            endpoint: self.endpoint(),
            metadata: self.metadata.as_ref(),
        }
        .serialize(serializer)
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self
            .metadata_value("label")
            .or_else(|| self.metadata_value("quality"))
        {
            Some(label) => write!(
                f,
                "{} ({}) - {} [{}]",
                self.endpoint_kind,
                self.endpoint(),
                self.destination_url,
                label
            ),
            None => write!(
                f,
                "{} ({}) - {}",
                self.endpoint_kind,
                self.endpoint(),
                self.destination_url
            ),
        }
    }
}
