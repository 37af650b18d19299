use std::fmt;

use thiserror::Error;

/// The resolution stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Host is outside the adapter's accepted domains.
    DomainRejected,
    /// Input is not an http(s) URL or lacks the site's video identifier.
    InvalidUrl,
    /// Transport failure or non-success status.
    Fetch,
    EmptyPayload,
    InvalidPayload,
    LocatorNotFound,
    /// Candidates were found but every one was denylisted.
    DisallowedCandidate,
    /// No adapter accepts the host.
    Unsupported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DomainRejected => "domain rejected",
            ErrorKind::InvalidUrl => "invalid url",
            ErrorKind::Fetch => "upstream fetch failed",
            ErrorKind::EmptyPayload => "empty payload",
            ErrorKind::InvalidPayload => "invalid payload",
            ErrorKind::LocatorNotFound => "locator not found",
            ErrorKind::DisallowedCandidate => "disallowed candidate",
            ErrorKind::Unsupported => "unsupported site",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolution failure, always attributed to a site and a stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{site}: {reason}")]
pub struct ExtractorError {
    pub site: &'static str,
    pub kind: ErrorKind,
    pub reason: String,
}

impl ExtractorError {
    pub fn new<R: Into<String>>(site: &'static str, kind: ErrorKind, reason: R) -> Self {
        Self {
            site,
            kind,
            reason: reason.into(),
        }
    }

    pub fn domain_rejected(site: &'static str, host: &str) -> Self {
        Self::new(
            site,
            ErrorKind::DomainRejected,
            format!("domain '{host}' is not handled by this site"),
        )
    }

    pub fn invalid_url<R: Into<String>>(site: &'static str, reason: R) -> Self {
        Self::new(site, ErrorKind::InvalidUrl, reason)
    }

    pub fn fetch<R: Into<String>>(site: &'static str, reason: R) -> Self {
        Self::new(site, ErrorKind::Fetch, reason)
    }

    pub fn empty_payload<R: Into<String>>(site: &'static str, reason: R) -> Self {
        Self::new(site, ErrorKind::EmptyPayload, reason)
    }

    pub fn invalid_payload<R: Into<String>>(site: &'static str, reason: R) -> Self {
        Self::new(site, ErrorKind::InvalidPayload, reason)
    }

    pub fn not_found<R: Into<String>>(site: &'static str, reason: R) -> Self {
        Self::new(site, ErrorKind::LocatorNotFound, reason)
    }

    pub fn disallowed<R: Into<String>>(site: &'static str, reason: R) -> Self {
        Self::new(site, ErrorKind::DisallowedCandidate, reason)
    }

    pub fn unsupported(url: &str) -> Self {
        Self::new(
            "dispatcher",
            ErrorKind::Unsupported,
            format!("no extractor accepts '{url}'"),
        )
    }
}
