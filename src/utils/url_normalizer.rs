//! Target URL normalization.
//!
//! Every target URL is stored in canonical form so that redirects only ever
//! point at http(s) destinations outside this service.

use url::Url;

/// Why a target URL was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetUrlError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,

    #[error("URL points back at this service")]
    SelfReferencing,
}

/// Normalizes a target URL to canonical form.
///
/// - scheme must be `http` or `https`
/// - host is lowercased
/// - default ports (80/443) and the fragment are dropped
/// - path and query are kept as-is
///
/// When `service_host` is set, targets on that host are rejected: a short
/// link to another short link of this service would only chain redirects.
///
/// # Errors
///
/// Returns a [`TargetUrlError`] describing the first rule the input breaks.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_url("HTTPS://EXAMPLE.COM:443/Path#top", None).unwrap(),
///     "https://example.com/Path"
/// );
/// assert!(normalize_url("https://sho.rt/r/abc", Some("sho.rt")).is_err());
/// ```
pub fn normalize_url(input: &str, service_host: Option<&str>) -> Result<String, TargetUrlError> {
    let mut url = Url::parse(input.trim())
        .map_err(|e| TargetUrlError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TargetUrlError::UnsupportedProtocol);
    }

    let Some(host) = url.host_str() else {
        return Err(TargetUrlError::MissingHost);
    };
    if service_host.is_some_and(|own| own.eq_ignore_ascii_case(host)) {
        return Err(TargetUrlError::SelfReferencing);
    }

    // Parsing already lowercased the host and dropped a default port.
    url.set_fragment(None);

    Ok(url.into())
}

/// Host part of the public base URL, used to detect self-referencing targets.
pub fn service_host(public_base_url: &str) -> Option<String> {
    Url::parse(public_base_url)
        .ok()?
        .host_str()
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_host_port_and_fragment() {
        let cases = [
            ("http://example.com", "http://example.com/"),
            ("https://EXAMPLE.COM/Path", "https://example.com/Path"),
            ("http://example.com:80/a", "http://example.com/a"),
            ("https://example.com:443/a", "https://example.com/a"),
            ("http://example.com:8080/a", "http://example.com:8080/a"),
            ("https://example.com/p?k=V#top", "https://example.com/p?k=V"),
            ("  https://example.com/padded  ", "https://example.com/padded"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_url(input, None).unwrap(), expected, "input: {input}");
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["", "not a url", "example.com"] {
            assert!(matches!(
                normalize_url(input, None),
                Err(TargetUrlError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        for input in [
            "javascript:alert(1)",
            "data:text/plain,hi",
            "ftp://example.com/file",
            "mailto:someone@example.com",
        ] {
            assert_eq!(
                normalize_url(input, None),
                Err(TargetUrlError::UnsupportedProtocol)
            );
        }
    }

    #[test]
    fn test_rejects_own_host() {
        let own = Some("sho.rt");

        assert_eq!(
            normalize_url("https://SHO.RT/r/abc12", own),
            Err(TargetUrlError::SelfReferencing)
        );
        assert_eq!(
            normalize_url("http://sho.rt:8080/", own),
            Err(TargetUrlError::SelfReferencing)
        );
        assert!(normalize_url("https://docs.sho.rt/", own).is_ok());
        assert!(normalize_url("https://sho.rt/r/abc12", None).is_ok());
    }

    #[test]
    fn test_service_host() {
        assert_eq!(
            service_host("https://Sho.rt:8443/base"),
            Some("sho.rt".to_string())
        );
        assert_eq!(service_host("not a url"), None);
    }
}
