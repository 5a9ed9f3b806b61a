//! Feed discovery and parsing.
//!
//! This module implements the probing side of the engine:
//!
//! - **Discovery**: multi-strategy candidate generation (page links,
//!   homepage links, well-known paths), ranked validation, and per-origin
//!   result caching
//! - **Parsing**: format-agnostic conversion of RSS 2.0 / Atom / RDF XML
//!   into a canonical feed + entries structure with stable entry identity
//! - **Fetching**: bounded HTTP (fixed timeout, body cap, crawler identity)
//!
//! # Architecture
//!
//! - [`discovery`] - the orchestrator composing everything below
//! - [`parser`] - feed XML to [`ParsedRssFeed`], via a generic XML tree
//! - [`html_links`] - tolerant `<link rel="alternate">` extraction
//! - [`fetcher`] - the only module that touches the network

mod discovery;
mod fetcher;
mod html_links;
mod parser;
mod xml;

pub use discovery::{
    discover_feeds_for_url, DiscoveredFeedCandidate, DiscoveryError, DiscoveryOutcome,
    DiscoverySource,
};
pub use fetcher::{build_http_client, FetchError, USER_AGENT};
pub use html_links::extract_feed_links_from_html;
pub use parser::{parse_rss_feed_xml, ParseError, ParsedRssEntry, ParsedRssFeed};
