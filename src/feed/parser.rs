use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

use super::xml::{parse_xml_tree, XmlElement};
use crate::util::{hash_string, normalize_content_url};

/// Identity hashes are truncated to 40 hex chars.
const IDENTITY_HASH_LEN: usize = 40;

static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']?([^"'\s>]+)"#).expect("img regex compiles")
});

/// Errors from [`parse_rss_feed_xml`]. Both variants mean "this body is not
/// a feed we understand"; during candidate validation they reject one
/// candidate and the pipeline continues.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not well-formed XML.
    #[error("invalid feed: {0}")]
    InvalidXml(String),
    /// Well-formed XML whose root shape is not RSS, Atom, or RDF.
    #[error("invalid feed: unrecognized root element <{0}>")]
    UnrecognizedRoot(String),
}

/// Canonical representation of a parsed feed, format-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRssFeed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub site_url: Option<String>,
    pub image_url: Option<String>,
    pub entries: Vec<ParsedRssEntry>,
}

/// A single feed entry with resolved identity fields.
///
/// `title` and `provider_id` are always non-empty; entries that cannot
/// satisfy that are dropped during parsing. Identity fields are stable
/// across re-parses of the same logical entry, guid or not.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRssEntry {
    pub entry_id: String,
    pub provider_id: String,
    pub canonical_url: String,
    pub title: String,
    pub summary: Option<String>,
    pub creator: Option<String>,
    pub creator_image_url: Option<String>,
    /// Unix seconds; `None` when the feed's date is absent or unparseable.
    pub published_at: Option<i64>,
    pub image_url: Option<String>,
}

/// The three feed dialects this engine understands, resolved by a pure
/// detection function over the generic parsed tree.
enum FeedDialect<'a> {
    /// RSS 2.0: metadata and items both live under `rss > channel`.
    Rss(&'a XmlElement),
    /// Atom: the `feed` root carries everything.
    Atom(&'a XmlElement),
    /// RDF/RSS 1.0: channel metadata and the item list are siblings at the top level.
    Rdf(&'a XmlElement),
}

fn detect_dialect(root: &XmlElement) -> Option<FeedDialect<'_>> {
    match root.name.as_str() {
        "rss" => root.child("channel").map(FeedDialect::Rss),
        "feed" => Some(FeedDialect::Atom(root)),
        // Heuristic: namespace prefixes vary ("rdf:rdf", "ns0:rdf", bare "rdf")
        name if name.ends_with("rdf") || name == "rdf:rdf" => Some(FeedDialect::Rdf(root)),
        _ => None,
    }
}

/// Parses raw feed XML (RSS 2.0, Atom, or RDF/RSS 1.0) into a canonical
/// [`ParsedRssFeed`].
///
/// `feed_url` is the URL the body was fetched from; it anchors relative
/// link resolution and the identity-hash fallback.
///
/// # Errors
///
/// Returns [`ParseError`] when the XML fails to parse or its root shape is
/// unrecognized. Everything below the root degrades gracefully: malformed
/// entries are dropped, missing fields become `None`, bad dates parse to
/// `None`.
pub fn parse_rss_feed_xml(xml: &str, feed_url: &str) -> Result<ParsedRssFeed, ParseError> {
    let root = parse_xml_tree(xml).map_err(|e| ParseError::InvalidXml(e.to_string()))?;
    let base = Url::parse(feed_url).ok();
    let ctx = EntryContext {
        feed_url,
        base: base.as_ref(),
    };

    let feed = match detect_dialect(&root) {
        Some(FeedDialect::Rss(channel)) => {
            parse_rss_like(Some(channel), channel.children_named("item"), &ctx)
        }
        Some(FeedDialect::Atom(feed)) => parse_atom(feed, &ctx),
        // RDF separates the item list from channel metadata at the top
        // level; reshape and reuse the RSS mapping.
        Some(FeedDialect::Rdf(rdf)) => {
            parse_rss_like(rdf.child("channel"), rdf.children_named("item"), &ctx)
        }
        None => return Err(ParseError::UnrecognizedRoot(root.name.clone())),
    };

    Ok(feed)
}

struct EntryContext<'a> {
    feed_url: &'a str,
    base: Option<&'a Url>,
}

// ============================================================================
// Channel-level mapping
// ============================================================================

fn parse_rss_like<'a>(
    channel: Option<&XmlElement>,
    items: impl Iterator<Item = &'a XmlElement>,
    ctx: &EntryContext<'_>,
) -> ParsedRssFeed {
    let mut dropped = 0usize;
    let entries: Vec<ParsedRssEntry> = items
        .filter_map(|item| {
            let entry = parse_rss_item(item, ctx);
            if entry.is_none() {
                dropped += 1;
            }
            entry
        })
        .collect();
    if dropped > 0 {
        tracing::debug!(feed = %ctx.feed_url, dropped = dropped, "Entries without usable titles skipped");
    }

    let Some(channel) = channel else {
        return ParsedRssFeed {
            title: None,
            description: None,
            site_url: None,
            image_url: None,
            entries,
        };
    };

    ParsedRssFeed {
        title: channel.child_text("title").map(str::to_owned),
        description: channel
            .first_text(&["description", "subtitle"])
            .map(str::to_owned),
        site_url: resolve_link(channel).and_then(|raw| content_url_string(raw, ctx)),
        image_url: resolve_channel_image(channel, ctx),
        entries,
    }
}

fn parse_atom(feed: &XmlElement, ctx: &EntryContext<'_>) -> ParsedRssFeed {
    let mut dropped = 0usize;
    let entries: Vec<ParsedRssEntry> = feed
        .children_named("entry")
        .filter_map(|entry| {
            let parsed = parse_atom_entry(entry, ctx);
            if parsed.is_none() {
                dropped += 1;
            }
            parsed
        })
        .collect();
    if dropped > 0 {
        tracing::debug!(feed = %ctx.feed_url, dropped = dropped, "Entries without usable titles skipped");
    }

    ParsedRssFeed {
        title: feed.child_text("title").map(str::to_owned),
        description: feed
            .first_text(&["description", "subtitle"])
            .map(str::to_owned),
        site_url: resolve_link(feed).and_then(|raw| content_url_string(raw, ctx)),
        image_url: resolve_channel_image(feed, ctx),
        entries,
    }
}

/// Link resolution shared by channels and entries: prefer an explicit
/// `rel="alternate"` link element, else the first link's href or text.
fn resolve_link(el: &XmlElement) -> Option<&str> {
    let links: Vec<&XmlElement> = el
        .children
        .iter()
        .filter(|c| c.name == "link" || c.name == "atom:link")
        .collect();

    if let Some(href) = links
        .iter()
        .find(|l| l.attr("rel") == Some("alternate"))
        .and_then(|l| l.attr("href"))
    {
        return Some(href);
    }

    links
        .iter()
        .find_map(|l| l.attr("href").or_else(|| l.text_content()))
}

fn resolve_channel_image(channel: &XmlElement, ctx: &EntryContext<'_>) -> Option<String> {
    let raw = channel
        .child("image")
        .and_then(|image| image.child_text("url").or_else(|| image.text_content()))
        .or_else(|| channel.first_text(&["logo", "icon"]))
        .or_else(|| channel.child("itunes:image").and_then(|i| i.attr("href")))?;
    content_url_string(raw, ctx)
}

// ============================================================================
// Entry-level mapping
// ============================================================================

fn parse_rss_item(item: &XmlElement, ctx: &EntryContext<'_>) -> Option<ParsedRssEntry> {
    let title = item.child_text("title")?.to_owned();
    let link = resolve_link(item);
    let guid = item.first_text(&["guid", "id"]);
    let summary = item
        .first_text(&["description", "summary", "content:encoded", "content"])
        .map(str::to_owned);
    let published_at = item
        .first_text(&["pubdate", "published", "updated", "dc:date", "date"])
        .and_then(parse_date_permissive);

    build_entry(item, ctx, title, link, guid, summary, published_at)
}

fn parse_atom_entry(entry: &XmlElement, ctx: &EntryContext<'_>) -> Option<ParsedRssEntry> {
    let title = entry.child_text("title")?.to_owned();
    let link = resolve_link(entry);
    let guid = entry.first_text(&["id", "guid"]);
    let summary = entry
        .first_text(&["summary", "content", "description"])
        .map(str::to_owned);
    let published_at = entry
        .first_text(&["published", "updated", "dc:date"])
        .and_then(parse_date_permissive);

    build_entry(entry, ctx, title, link, guid, summary, published_at)
}

#[allow(clippy::too_many_arguments)]
fn build_entry(
    item: &XmlElement,
    ctx: &EntryContext<'_>,
    title: String,
    link: Option<&str>,
    guid: Option<&str>,
    summary: Option<String>,
    published_at: Option<i64>,
) -> Option<ParsedRssEntry> {
    let normalized_link = link.and_then(|raw| content_url_string(raw, ctx));
    // A guid only counts as a URL when it stands on its own; resolving a
    // bare "12345" against the feed URL would invent a link.
    let normalized_guid = guid.and_then(|raw| normalize_content_url(raw, None)).map(String::from);
    let raw_guid = guid.map(str::trim).filter(|g| !g.is_empty()).map(str::to_owned);

    let identity_hash = entry_identity_hash(ctx.feed_url, &title, summary.as_deref(), published_at);

    let canonical_url = normalized_link
        .clone()
        .or_else(|| normalized_guid.clone())
        .unwrap_or_else(|| format!("{}#entry-{}", ctx.feed_url, identity_hash));

    let entry_id = raw_guid
        .clone()
        .or_else(|| normalized_link.clone())
        .or_else(|| normalized_guid.clone())
        .unwrap_or_else(|| identity_hash.clone());

    let provider_id = normalized_link
        .or_else(|| normalized_guid)
        .or_else(|| raw_guid)
        .unwrap_or_else(|| identity_hash.clone());

    if provider_id.is_empty() {
        return None;
    }

    let image_url = resolve_entry_image(item, summary.as_deref(), ctx);
    let creator = resolve_creator(item);
    let creator_image_url = item
        .child("itunes:image")
        .and_then(|i| i.attr("href"))
        .and_then(|raw| content_url_string(raw, ctx));

    Some(ParsedRssEntry {
        entry_id,
        provider_id,
        canonical_url,
        title,
        summary,
        creator,
        creator_image_url,
        published_at,
        image_url,
    })
}

/// Stable identity for entries without a guid or link: the same logical
/// entry re-parsed later still maps to the same hash.
fn entry_identity_hash(
    feed_url: &str,
    title: &str,
    summary: Option<&str>,
    published_at: Option<i64>,
) -> String {
    let input = format!(
        "{}|{}|{}|{}",
        feed_url,
        title,
        summary.unwrap_or(""),
        published_at.map(|t| t.to_string()).unwrap_or_default()
    );
    let mut digest = hash_string(&input);
    digest.truncate(IDENTITY_HASH_LEN);
    digest
}

fn resolve_creator(item: &XmlElement) -> Option<String> {
    let author = item.first_child(&["dc:creator", "author", "creator"])?;
    // Atom nests <author><name>…</name></author>; RSS puts text directly
    author
        .child_text("name")
        .or_else(|| author.text_content())
        .map(str::to_owned)
}

/// Per-entry image fallback chain: media:content → media:thumbnail →
/// image-typed enclosure → explicit image field → `<img src>` scraped from
/// the summary HTML, retried once after entity decoding.
fn resolve_entry_image(
    item: &XmlElement,
    summary: Option<&str>,
    ctx: &EntryContext<'_>,
) -> Option<String> {
    let structured = item
        .children_named("media:content")
        .find_map(|e| e.attr("url"))
        .or_else(|| item.children_named("media:thumbnail").find_map(|e| e.attr("url")))
        .or_else(|| {
            item.children_named("enclosure")
                .find(|e| e.attr("type").is_some_and(|t| t.starts_with("image/")))
                .and_then(|e| e.attr("url"))
        })
        .or_else(|| {
            item.child("image")
                .and_then(|image| image.child_text("url").or_else(|| image.text_content()))
        });

    if let Some(raw) = structured {
        return content_url_string(raw, ctx);
    }

    let summary = summary?;
    scrape_img_src(summary)
        .or_else(|| scrape_img_src(&decode_basic_entities(summary)))
        .and_then(|raw| content_url_string(&raw, ctx))
}

fn scrape_img_src(html: &str) -> Option<String> {
    IMG_SRC_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Decodes the five predefined entities (with `&amp;` last so double-encoded
/// markup resolves in one pass, not two).
fn decode_basic_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn content_url_string(raw: &str, ctx: &EntryContext<'_>) -> Option<String> {
    normalize_content_url(raw, ctx.base).map(String::from)
}

/// Permissive date parsing: RFC 2822 (RSS), RFC 3339 (Atom), then a couple
/// of lenient fallbacks. Anything else is `None`, never an error.
fn parse_date_permissive(raw: &str) -> Option<i64> {
    let raw = raw.trim();

    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(raw) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().timestamp());
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FEED_URL: &str = "https://example.com/feed.xml";

    // --- dialect detection / rejection ---

    #[test]
    fn test_not_a_feed_is_rejected() {
        let result = parse_rss_feed_xml("<notafeed/>", FEED_URL);
        assert!(matches!(result, Err(ParseError::UnrecognizedRoot(_))));

        let result = parse_rss_feed_xml("<html><body>hi</body></html>", FEED_URL);
        assert!(matches!(result, Err(ParseError::UnrecognizedRoot(_))));
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        assert!(matches!(
            parse_rss_feed_xml("<rss><channel>", FEED_URL),
            Err(ParseError::InvalidXml(_))
        ));
        assert!(matches!(
            parse_rss_feed_xml("not xml at all", FEED_URL),
            Err(ParseError::InvalidXml(_))
        ));
    }

    #[test]
    fn test_rss_without_channel_is_rejected() {
        assert!(matches!(
            parse_rss_feed_xml("<rss version=\"2.0\"/>", FEED_URL),
            Err(ParseError::UnrecognizedRoot(_))
        ));
    }

    // --- RSS 2.0 ---

    #[test]
    fn test_minimal_rss_item_identity() {
        let xml = r#"<rss version="2.0"><channel>
            <item><title>A</title><link>https://x/a</link></item>
        </channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(feed.entries.len(), 1);
        let entry = &feed.entries[0];
        assert_eq!(entry.canonical_url, "https://x/a");
        assert_eq!(entry.provider_id, "https://x/a");
        // No guid: entry_id falls back to the normalized link
        assert_eq!(entry.entry_id, "https://x/a");
    }

    #[test]
    fn test_rss_channel_metadata() {
        let xml = r#"<rss version="2.0"><channel>
            <title>Example Blog</title>
            <link>https://example.com</link>
            <description>An example blog about things</description>
            <image><url>https://example.com/logo.png</url></image>
            <item><guid>1</guid><title>Post</title></item>
        </channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Example Blog"));
        assert_eq!(
            feed.description.as_deref(),
            Some("An example blog about things")
        );
        assert_eq!(feed.site_url.as_deref(), Some("https://example.com/"));
        assert_eq!(
            feed.image_url.as_deref(),
            Some("https://example.com/logo.png")
        );
    }

    #[test]
    fn test_rss_guid_used_for_entry_id_and_provider_fallback() {
        let xml = r#"<rss version="2.0"><channel>
            <item><guid isPermaLink="false">abc-123</guid><title>T</title></item>
        </channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        let entry = &feed.entries[0];
        // Raw guid wins for entry_id; non-URL guid falls through to raw for provider_id
        assert_eq!(entry.entry_id, "abc-123");
        assert_eq!(entry.provider_id, "abc-123");
        // No link and non-URL guid: canonical URL is synthesized
        assert!(entry
            .canonical_url
            .starts_with("https://example.com/feed.xml#entry-"));
    }

    #[test]
    fn test_rss_url_guid_becomes_canonical() {
        let xml = r#"<rss version="2.0"><channel>
            <item><guid>https://example.com/posts/9?utm_source=feed</guid><title>T</title></item>
        </channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        let entry = &feed.entries[0];
        assert_eq!(entry.canonical_url, "https://example.com/posts/9");
        assert_eq!(entry.provider_id, "https://example.com/posts/9");
        // entry_id keeps the raw guid
        assert_eq!(entry.entry_id, "https://example.com/posts/9?utm_source=feed");
    }

    #[test]
    fn test_relative_link_resolved_against_feed_url() {
        let xml = r#"<rss version="2.0"><channel>
            <item><title>T</title><link>/posts/1</link></item>
        </channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(feed.entries[0].canonical_url, "https://example.com/posts/1");
    }

    #[test]
    fn test_entries_without_titles_dropped() {
        let xml = r#"<rss version="2.0"><channel>
            <item><title>Kept</title><link>https://x/a</link></item>
            <item><link>https://x/b</link></item>
            <item><title>   </title><link>https://x/c</link></item>
        </channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(feed.entries.len(), 1);
        assert_eq!(feed.entries[0].title, "Kept");
    }

    #[test]
    fn test_hash_identity_is_deterministic() {
        let xml = r#"<rss version="2.0"><channel>
            <item><title>No Guid Here</title><description>Same body</description></item>
        </channel></rss>"#;
        let first = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        let second = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(first.entries[0].entry_id, second.entries[0].entry_id);
        assert_eq!(first.entries[0].entry_id.len(), IDENTITY_HASH_LEN);
        assert!(first.entries[0]
            .canonical_url
            .ends_with(&first.entries[0].entry_id));

        // Different feed URL means a different identity
        let other = parse_rss_feed_xml(xml, "https://other.example.com/feed").unwrap();
        assert_ne!(first.entries[0].entry_id, other.entries[0].entry_id);
    }

    #[test]
    fn test_creator_and_dates() {
        let xml = r#"<rss version="2.0"><channel>
            <item>
                <title>T</title>
                <dc:creator>Jane Doe</dc:creator>
                <pubDate>Mon, 06 Sep 2021 12:00:00 GMT</pubDate>
            </item>
        </channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        let entry = &feed.entries[0];
        assert_eq!(entry.creator.as_deref(), Some("Jane Doe"));
        assert_eq!(entry.published_at, Some(1630929600));
    }

    #[test]
    fn test_unparseable_date_is_none() {
        let xml = r#"<rss version="2.0"><channel>
            <item><title>T</title><pubDate>next Tuesday probably</pubDate></item>
        </channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(feed.entries[0].published_at, None);
    }

    #[test]
    fn test_image_fallback_chain_structured() {
        let media = r#"<rss version="2.0"><channel><item>
            <title>T</title>
            <media:content url="https://img.example.com/full.jpg" type="image/jpeg"/>
            <media:thumbnail url="https://img.example.com/thumb.jpg"/>
        </item></channel></rss>"#;
        let feed = parse_rss_feed_xml(media, FEED_URL).unwrap();
        assert_eq!(
            feed.entries[0].image_url.as_deref(),
            Some("https://img.example.com/full.jpg")
        );

        let enclosure = r#"<rss version="2.0"><channel><item>
            <title>T</title>
            <enclosure url="https://example.com/audio.mp3" type="audio/mpeg"/>
            <enclosure url="https://example.com/cover.png" type="image/png"/>
        </item></channel></rss>"#;
        let feed = parse_rss_feed_xml(enclosure, FEED_URL).unwrap();
        assert_eq!(
            feed.entries[0].image_url.as_deref(),
            Some("https://example.com/cover.png")
        );
    }

    #[test]
    fn test_image_scraped_from_summary_html() {
        let xml = r#"<rss version="2.0"><channel><item>
            <title>T</title>
            <description><![CDATA[<p>Hi</p><img src="https://example.com/inline.png" alt="">]]></description>
        </item></channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(
            feed.entries[0].image_url.as_deref(),
            Some("https://example.com/inline.png")
        );
    }

    #[test]
    fn test_image_scrape_retries_after_entity_decoding() {
        // Summary where the markup arrives double-escaped
        let xml = r#"<rss version="2.0"><channel><item>
            <title>T</title>
            <description>&amp;lt;img src="https://example.com/esc.png"&amp;gt;</description>
        </item></channel></rss>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(
            feed.entries[0].image_url.as_deref(),
            Some("https://example.com/esc.png")
        );
    }

    // --- Atom ---

    #[test]
    fn test_atom_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <title>Example Blog</title>
            <subtitle>Things happen</subtitle>
            <link href="https://example.com/" rel="alternate"/>
            <link href="https://example.com/feed.xml" rel="self"/>
            <entry>
                <id>tag:example.com,2024:1</id>
                <title>First Post</title>
                <link href="https://example.com/post/1" rel="alternate"/>
                <summary>Short</summary>
                <published>2024-01-01T00:00:00Z</published>
                <author><name>Jane</name></author>
            </entry>
        </feed>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Example Blog"));
        assert_eq!(feed.description.as_deref(), Some("Things happen"));
        // rel=alternate preferred over rel=self
        assert_eq!(feed.site_url.as_deref(), Some("https://example.com/"));

        let entry = &feed.entries[0];
        assert_eq!(entry.canonical_url, "https://example.com/post/1");
        assert_eq!(entry.provider_id, "https://example.com/post/1");
        assert_eq!(entry.entry_id, "tag:example.com,2024:1");
        assert_eq!(entry.creator.as_deref(), Some("Jane"));
        assert_eq!(entry.published_at, Some(1704067200));
        assert_eq!(entry.summary.as_deref(), Some("Short"));
    }

    #[test]
    fn test_atom_entry_without_alternate_uses_first_link() {
        let xml = r#"<feed>
            <title>F</title>
            <entry><id>1</id><title>T</title><link href="https://example.com/a"/></entry>
        </feed>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(feed.entries[0].canonical_url, "https://example.com/a");
    }

    // --- RDF / RSS 1.0 ---

    #[test]
    fn test_rdf_top_level_items() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
            <channel rdf:about="https://example.com/">
                <title>RDF Site</title>
                <link>https://example.com/</link>
                <description>An RSS 1.0 feed</description>
            </channel>
            <item rdf:about="https://example.com/one">
                <title>One</title>
                <link>https://example.com/one</link>
                <dc:date>2024-03-04T05:06:07Z</dc:date>
            </item>
            <item rdf:about="https://example.com/two">
                <title>Two</title>
                <link>https://example.com/two</link>
            </item>
        </rdf:RDF>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(feed.title.as_deref(), Some("RDF Site"));
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.entries[0].canonical_url, "https://example.com/one");
        assert_eq!(feed.entries[0].published_at, Some(1709528767));
    }

    #[test]
    fn test_rdf_detection_tolerates_prefixes() {
        let xml = r#"<RDF><item><title>T</title><link>https://x/a</link></item></RDF>"#;
        let feed = parse_rss_feed_xml(xml, FEED_URL).unwrap();
        assert_eq!(feed.entries.len(), 1);
        assert!(feed.title.is_none());
    }

    // --- shared sub-algorithms ---

    #[test]
    fn test_parse_date_permissive_formats() {
        assert_eq!(
            parse_date_permissive("Sat, 01 Jan 2022 00:00:00 +0000"),
            Some(1640995200)
        );
        assert_eq!(
            parse_date_permissive("2022-01-01T00:00:00Z"),
            Some(1640995200)
        );
        assert_eq!(
            parse_date_permissive("2022-01-01 00:00:00"),
            Some(1640995200)
        );
        assert_eq!(parse_date_permissive("2022-01-01"), Some(1640995200));
        assert_eq!(parse_date_permissive("garbage"), None);
        assert_eq!(parse_date_permissive(""), None);
    }

    #[test]
    fn test_decode_basic_entities_single_pass() {
        assert_eq!(decode_basic_entities("&lt;b&gt;"), "<b>");
        // &amp; decoded last: double-escaped input resolves one level per call
        assert_eq!(decode_basic_entities("&amp;lt;img&amp;gt;"), "&lt;img&gt;");
        assert_eq!(
            decode_basic_entities(&decode_basic_entities("&amp;lt;img&amp;gt;")),
            "<img>"
        );
    }
}
