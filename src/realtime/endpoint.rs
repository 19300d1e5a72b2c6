//! Notification endpoint derivation.
//!
//! The notification server lives on the same host as the page, on a fixed
//! alternate port, with the WebSocket scheme mirroring the page's own:
//! `https:` pages connect over `wss:`, plain `http:` pages over `ws:`.
//! Tests and staging deployments override the derived endpoint through
//! [`Endpoint::custom`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::{Host, Url};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Fixed port the notification server listens on.
pub const NOTIFICATION_PORT: u16 = 8080;

// ============================================================================
// PageScheme
// ============================================================================

/// Scheme the hosting page was loaded over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageScheme {
    /// Plain transport; mirrors to `ws:`.
    Http,
    /// Encrypted transport; mirrors to `wss:`.
    Https,
}

impl PageScheme {
    /// Returns the WebSocket scheme mirroring this page scheme.
    #[inline]
    #[must_use]
    pub const fn ws_scheme(self) -> &'static str {
        match self {
            Self::Http => "ws",
            Self::Https => "wss",
        }
    }
}

// ============================================================================
// PageOrigin
// ============================================================================

/// Origin of the hosting page (scheme + host).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrigin {
    scheme: PageScheme,
    host: String,
}

impl PageOrigin {
    /// Creates an origin from parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the host is empty or not a
    /// valid host name.
    pub fn new(scheme: PageScheme, host: impl Into<String>) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(Error::invalid_argument("page host must not be empty"));
        }
        Host::parse(&host)
            .map_err(|e| Error::invalid_argument(format!("invalid page host: {e}")))?;
        Ok(Self { scheme, host })
    }

    /// Parses an origin string such as `https://pledgeboard.example`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for unparseable origins, non-http
    /// schemes, or origins without a host.
    pub fn parse(origin: &str) -> Result<Self> {
        let url = Url::parse(origin)
            .map_err(|e| Error::invalid_argument(format!("invalid page origin: {e}")))?;

        let scheme = match url.scheme() {
            "http" => PageScheme::Http,
            "https" => PageScheme::Https,
            other => {
                return Err(Error::invalid_argument(format!(
                    "unsupported page scheme: {other}"
                )));
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| Error::invalid_argument("page origin has no host"))?;

        Self::new(scheme, host)
    }

    /// Returns the page scheme.
    #[inline]
    #[must_use]
    pub fn scheme(&self) -> PageScheme {
        self.scheme
    }

    /// Returns the page host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// A resolved notification-server endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
}

impl Endpoint {
    /// Derives the well-known endpoint for a page origin.
    ///
    /// Same host, port [`NOTIFICATION_PORT`], scheme mirrored per
    /// [`PageScheme::ws_scheme`].
    #[must_use]
    pub fn from_origin(origin: &PageOrigin) -> Self {
        Self {
            url: format!(
                "{}://{}:{}",
                origin.scheme().ws_scheme(),
                origin.host(),
                NOTIFICATION_PORT
            ),
        }
    }

    /// Uses an explicit WebSocket URL instead of the derived endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless the URL parses and uses the
    /// `ws:` or `wss:` scheme.
    pub fn custom(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::invalid_argument(format!("invalid endpoint url: {e}")))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(Error::invalid_argument(format!(
                "endpoint must use ws or wss, got {}",
                parsed.scheme()
            )));
        }
        Ok(Self {
            url: url.to_string(),
        })
    }

    /// Returns the endpoint as a URL string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_mirroring() {
        let plain = PageOrigin::new(PageScheme::Http, "pledgeboard.example").expect("origin");
        let secure = PageOrigin::new(PageScheme::Https, "pledgeboard.example").expect("origin");

        assert_eq!(
            Endpoint::from_origin(&plain).as_str(),
            "ws://pledgeboard.example:8080"
        );
        assert_eq!(
            Endpoint::from_origin(&secure).as_str(),
            "wss://pledgeboard.example:8080"
        );
    }

    #[test]
    fn test_parse_origin() {
        let origin = PageOrigin::parse("https://pledgeboard.example/projects/42").expect("parse");
        assert_eq!(origin.scheme(), PageScheme::Https);
        assert_eq!(origin.host(), "pledgeboard.example");
    }

    #[test]
    fn test_parse_origin_rejects_other_schemes() {
        assert!(PageOrigin::parse("ftp://pledgeboard.example").is_err());
        assert!(PageOrigin::parse("not a url").is_err());
    }

    #[test]
    fn test_new_rejects_garbage_host() {
        assert!(PageOrigin::new(PageScheme::Http, "").is_err());
        assert!(PageOrigin::new(PageScheme::Http, "bad host").is_err());
    }

    #[test]
    fn test_custom_endpoint_validation() {
        assert!(Endpoint::custom("ws://127.0.0.1:9001").is_ok());
        assert!(Endpoint::custom("wss://staging.pledgeboard.example:8080").is_ok());
        assert!(Endpoint::custom("https://pledgeboard.example").is_err());
    }
}
