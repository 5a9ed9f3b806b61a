//! Pure utility functions shared across the engine.
//!
//! - **URL normalization**: canonical feed/content URLs with tracking-param
//!   stripping, plus security-focused host validation to prevent SSRF attacks
//! - **Hashing**: stable content identity and cache keys
//!
//! # Examples
//!
//! ```
//! use feedscout::util::{normalize_feed_url, origin_of, hash_string};
//!
//! let url = normalize_feed_url("https://Example.com/feed/?utm_source=x").unwrap();
//! assert_eq!(url.as_str(), "https://example.com/feed");
//! assert_eq!(origin_of(&url), "https://example.com");
//! assert_eq!(hash_string("a").len(), 64);
//! ```

mod url_norm;

pub use url_norm::{hash_string, normalize_content_url, normalize_feed_url, origin_of, UrlError};
