use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Header set attached to a [`StreamDescriptor`](super::StreamDescriptor) and to
/// every outbound request.
///
/// Names are case-insensitive and stored lower-cased, so `Referer` and
/// `referer` address the same entry.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct RequestHeaders(FxHashMap<String, String>);

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: AsRef<str>, V: Into<String>>(&mut self, name: K, value: V) -> Option<String> {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into())
    }

    pub fn with<K: AsRef<str>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns a new set with `overrides` applied on top of `self`.
    pub fn merged(&self, overrides: &RequestHeaders) -> RequestHeaders {
        let mut merged = self.clone();
        merged
            .0
            .extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries sorted by name, for stable output.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries = self.iter().collect::<Vec<_>>();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        let mut headers = RequestHeaders::new();
        headers.insert("Referer", "https://a.example/");
        headers.insert("REFERER", "https://b.example/");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("referer"), Some("https://b.example/"));
        assert!(headers.contains("ReFeReR"));
    }

    #[test]
    fn merged_prefers_overrides() {
        let defaults = RequestHeaders::new().with("User-Agent", "ua").with("Accept", "*/*");
        let site = RequestHeaders::new().with("accept", "text/html");

        let merged = defaults.merged(&site);
        assert_eq!(merged.get("accept"), Some("text/html"));
        assert_eq!(merged.get("user-agent"), Some("ua"));
        // the originals stay untouched
        assert_eq!(defaults.get("accept"), Some("*/*"));
    }
}
