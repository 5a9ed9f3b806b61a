use std::collections::HashSet;
use url::Url;

/// MIME types accepted as feed-flavored on a `<link rel="alternate">` tag.
const FEED_MIME_TYPES: &[&str] = &[
    "application/rss+xml",
    "application/atom+xml",
    "application/rdf+xml",
    "application/xml",
    "text/xml",
];

/// Scans raw HTML for `<link>` tags referencing syndication feeds and
/// returns the deduplicated absolute URLs in document order.
///
/// Uses simple string scanning (no HTML parser dependency) and never fails
/// on malformed markup. A tag qualifies when its `rel` contains the token
/// `alternate` (and not `stylesheet`), and either its `type` is a known
/// feed MIME type or, with no or an unknown `type`, its href looks
/// feed-like (contains `/feed`, `/rss`, `/atom`, or ends in `.xml`).
/// Hrefs are resolved against `base_url`; only http/https results are kept;
/// malformed hrefs are silently dropped.
pub fn extract_feed_links_from_html(html: &str, base_url: &Url) -> Vec<Url> {
    // ASCII-only lowering keeps byte offsets aligned with the original,
    // so href values can be extracted case-preserving.
    let html_lower = html.to_ascii_lowercase();

    let mut found = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut search_from = 0;

    while let Some(link_start) = html_lower[search_from..].find("<link") {
        let abs_start = search_from + link_start;
        let remaining = &html_lower[abs_start..];

        // Find the end of this <link> tag; an unterminated tag ends the scan
        let tag_end = match remaining.find('>') {
            Some(pos) => pos,
            None => break,
        };

        let tag_lower = &remaining[..=tag_end];
        let original_tag = &html[abs_start..abs_start + tag_end + 1];
        search_from = abs_start + tag_end + 1;

        if !is_alternate_link(tag_lower) {
            continue;
        }

        let href = match extract_attr_value(original_tag, "href") {
            Some(href) if !href.trim().is_empty() => href,
            _ => continue,
        };

        if !(has_feed_type(tag_lower) || looks_feed_like(href)) {
            continue;
        }

        // base.join handles absolute, relative and protocol-relative hrefs
        let Ok(resolved) = base_url.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        if seen.insert(resolved.as_str().to_owned()) {
            found.push(resolved);
        }
    }

    found
}

/// `rel` must contain the `alternate` token; `rel="alternate stylesheet"`
/// is a styling alternate, not a feed.
fn is_alternate_link(tag_lower: &str) -> bool {
    let Some(rel) = extract_attr_value(tag_lower, "rel") else {
        return false;
    };
    let mut tokens = rel.split_ascii_whitespace();
    tokens.clone().any(|t| t == "alternate") && !tokens.any(|t| t == "stylesheet")
}

/// Whether the tag carries a known feed MIME type (media-type parameters
/// like `; charset=utf-8` are ignored).
fn has_feed_type(tag_lower: &str) -> bool {
    match extract_attr_value(tag_lower, "type") {
        Some(value) => {
            let mime = value.split(';').next().unwrap_or("").trim();
            FEED_MIME_TYPES.contains(&mime)
        }
        None => false,
    }
}

/// Heuristic for untyped links: does the href path look like a feed endpoint?
fn looks_feed_like(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or("");
    path.contains("/feed") || path.contains("/rss") || path.contains("/atom") || path.ends_with(".xml")
}

/// Extracts an attribute value from a tag string, tolerating double-quoted,
/// single-quoted, and unquoted values. Attribute-name matching is
/// case-insensitive; the returned slice preserves the original case.
fn extract_attr_value<'a>(tag: &'a str, attr_name: &str) -> Option<&'a str> {
    let tag_lower = tag.to_ascii_lowercase();
    let pattern = format!("{attr_name}=");
    let mut from = 0;

    loop {
        let idx = tag_lower[from..].find(&pattern)? + from;
        from = idx + pattern.len();

        // Reject substring hits like `data-href=`
        if idx > 0 && !tag_lower.as_bytes()[idx - 1].is_ascii_whitespace() {
            continue;
        }

        let rest = &tag[from..];
        let first = *rest.as_bytes().first()?;

        if first == b'"' || first == b'\'' {
            let inner = &rest[1..];
            let end = inner.find(first as char)?;
            return Some(&inner[..end]);
        }

        // Unquoted value: runs to whitespace or the end of the tag
        let end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '>')
            .unwrap_or(rest.len());
        let mut value = &rest[..end];
        // `href=/feed.xml/>`: the slash belongs to the tag close
        if rest[end..].starts_with('>') {
            value = value.strip_suffix('/').unwrap_or(value);
        }
        return Some(value);
    }
}
