//! feedscout: feed discovery and parsing engine.
//!
//! Given a URL (an article page or a site), this crate discovers candidate
//! RSS/Atom/RDF endpoints, validates them by fetching and parsing, and
//! returns a canonical, deduplicated, ranked result. Probing is guarded
//! against SSRF and memoized per origin in a SQLite-backed cache so
//! repeated lookups stay cheap.
//!
//! # Example
//!
//! ```no_run
//! use feedscout::feed::{build_http_client, discover_feeds_for_url};
//! use feedscout::storage::Database;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let db = Database::open("discovery.db").await?;
//! let client = build_http_client()?;
//!
//! let outcome = discover_feeds_for_url(&db, &client, "https://blog.example.com/post/1", false).await?;
//! for candidate in &outcome.candidates {
//!     println!("{} (score {})", candidate.feed_url, candidate.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod feed;
pub mod storage;
pub mod util;

pub use feed::{
    build_http_client, discover_feeds_for_url, parse_rss_feed_xml, DiscoveredFeedCandidate,
    DiscoveryError, DiscoveryOutcome, DiscoverySource, ParseError, ParsedRssEntry, ParsedRssFeed,
};
pub use storage::{CacheStatus, Database};
pub use util::{hash_string, normalize_content_url, normalize_feed_url, UrlError};
