use sha2::{Digest, Sha256};
use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur while normalizing a feed URL.
///
/// These cover both parsing failures and security policy violations
/// designed to prevent SSRF (Server-Side Request Forgery) attacks when
/// probing user-supplied URLs server-side.
#[derive(Debug, Error)]
pub enum UrlError {
    /// The URL string could not be parsed.
    #[error("invalid URL: {0}")]
    Invalid(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL targets loopback, link-local, private-range, or local-domain hosts.
    #[error("unsafe host not allowed: {0}")]
    UnsafeHost(String),
}

/// Query parameters stripped during normalization (exact, case-insensitive
/// matches). `utm_*` is handled as a prefix in [`is_tracking_param`].
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "mc_cid", "mc_eid", "ref", "ref_src", "source", "igshid",
];

/// Normalizes and validates a user-supplied feed URL.
///
/// Canonical form: lowercase host, default port stripped, no fragment,
/// no trailing slash except on the root path, tracking query parameters
/// removed. Normalization is idempotent.
///
/// # Errors
///
/// Returns [`UrlError::Invalid`] / [`UrlError::UnsupportedScheme`] for
/// unparseable or non-http(s) input, and [`UrlError::UnsafeHost`] when the
/// host is localhost, a `.local`/`.localhost` domain, loopback, link-local,
/// or a private IP range. This is the primary SSRF defense for this engine.
///
/// # Examples
///
/// ```
/// use feedscout::util::normalize_feed_url;
///
/// let url = normalize_feed_url("https://Example.com:443/feed/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/feed");
///
/// assert!(normalize_feed_url("http://127.0.0.1/feed").is_err());
/// assert!(normalize_feed_url("file:///etc/passwd").is_err());
/// ```
pub fn normalize_feed_url(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_owned())),
    }

    if let Some(host) = url.host_str() {
        if is_unsafe_host(host) {
            return Err(UrlError::UnsafeHost(host.to_owned()));
        }
    }

    apply_shared_normalization(&mut url);
    Ok(url)
}

/// Best-effort normalization for content URLs (entry links, guids-as-URLs).
///
/// Resolves `raw` against `base` when relative. Returns `None` (never an
/// error) on unparseable input or a non-http(s) result. No host safety
/// check: content URLs are identity material, not fetch targets.
pub fn normalize_content_url(raw: &str, base: Option<&Url>) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(raw).ok()?,
        Err(_) => return None,
    };

    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    apply_shared_normalization(&mut url);
    Some(url)
}

/// Hex-encoded SHA-256 of `input`.
///
/// Used for cache keys and entry-identity fallback; collision resistance
/// matters for correctness of deduplication downstream.
pub fn hash_string(input: &str) -> String {
    let hash = Sha256::digest(input.as_bytes());
    format!("{:x}", hash)
}

/// The origin (scheme + host + non-default port) of a URL, used as the
/// discovery-cache partition key.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Shared canonicalization applied by both normalization entry points.
/// Host lowercasing and default-port stripping come from the `url` crate's
/// canonical form; the rest is applied here.
fn apply_shared_normalization(url: &mut Url) {
    url.set_fragment(None);

    // Trailing slashes are dropped everywhere except the root path
    let path = url.path().to_owned();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        url.set_path(if trimmed.is_empty() { "/" } else { trimmed });
    }

    if let Some(query) = url.query() {
        let kept: Vec<&str> = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| !is_tracking_param(pair.split('=').next().unwrap_or("")))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&kept.join("&")));
        }
    }
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

fn is_unsafe_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();

    if host == "localhost" || host.ends_with(".localhost") || host.ends_with(".local") {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(&host);

    match host_for_parse.parse::<IpAddr>() {
        Ok(ip) => is_private_ip(&ip),
        Err(_) => false,
    }
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}
