use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{hash_map::Entry, HashMap};
use thiserror::Error;
use url::Url;

use super::fetcher::{fetch_html, fetch_xml, FetchError};
use super::html_links::extract_feed_links_from_html;
use super::parser::parse_rss_feed_xml;
use crate::storage::{CacheStatus, Database, NewDiscoveryCacheEntry};
use crate::util::{normalize_feed_url, origin_of, UrlError};

/// Well-known feed endpoints probed against the origin, in conventional
/// order; ties between generated seeds favor earlier list positions.
const COMMON_FEED_PATHS: &[&str] = &[
    "/feed",
    "/rss",
    "/rss.xml",
    "/atom.xml",
    "/feed.xml",
    "/index.xml",
];

const PAGE_LINK_SCORE: u32 = 100;
const SITE_LINK_SCORE: u32 = 80;
const COMMON_PATH_BASE_SCORE: u32 = 50;

/// Ranked seeds beyond this cap are never fetched.
const MAX_CANDIDATES_TO_VALIDATE: usize = 12;
/// Validation stops early once this many candidates have been confirmed.
const MAX_VALIDATED_CANDIDATES: usize = 5;

/// Cache TTLs: success is trusted far longer; failure states retry sooner.
const SUCCESS_TTL_SECS: i64 = 7 * 24 * 3600;
const EMPTY_TTL_SECS: i64 = 24 * 3600;
const ERROR_TTL_SECS: i64 = 6 * 3600;

/// Which strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    /// `<link>` tag on the page the caller asked about
    PageLink,
    /// `<link>` tag on the origin's homepage
    SiteLink,
    /// Well-known path probe against the origin
    CommonPath,
}

/// A validated feed endpoint with metadata extracted from the feed itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredFeedCandidate {
    pub feed_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub site_url: Option<String>,
    pub discovered_from: DiscoverySource,
    pub score: u32,
}

/// Result of a discovery run (fresh or served from cache).
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub source_url: String,
    pub source_origin: String,
    /// Unix seconds at which this result was computed.
    pub checked_at: i64,
    pub cached: bool,
    /// Validated candidates in rank order, highest score first.
    pub candidates: Vec<DiscoveredFeedCandidate>,
}

/// The only error [`discover_feeds_for_url`] ever returns: the input URL
/// itself was unusable. Everything downstream degrades to a (possibly
/// empty) outcome; "no feed found" is never an error.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Url(#[from] UrlError),
}

/// A not-yet-validated candidate produced by some strategy.
#[derive(Debug, Clone)]
struct FeedCandidateSeed {
    feed_url: Url,
    discovered_from: DiscoverySource,
    score: u32,
}

/// Discovers, validates and ranks feed endpoints for a URL.
///
/// Results are cached per origin: a fresh cache row short-circuits the
/// entire probe (`cached = true`) unless `refresh` forces a re-probe.
/// On a miss, three strategies run (page links, homepage links, and
/// well-known paths), their merged seeds are ranked and validated
/// sequentially by fetching and parsing each candidate, and the outcome
/// is written back to the cache.
///
/// # Errors
///
/// Only input validation fails: [`UrlError::Invalid`] /
/// [`UrlError::UnsupportedScheme`] / [`UrlError::UnsafeHost`] propagate
/// uncached. Network and parse trouble during probing is swallowed,
/// logged, and reflected in the outcome's candidate list and the cached
/// row's `last_error`.
pub async fn discover_feeds_for_url(
    db: &Database,
    client: &reqwest::Client,
    raw_url: &str,
    refresh: bool,
) -> Result<DiscoveryOutcome, DiscoveryError> {
    let source_url = normalize_feed_url(raw_url)?;
    Ok(run_discovery(db, client, source_url, refresh).await)
}

/// Core pipeline over a pre-validated source URL. Infallible by contract:
/// any failure past input validation degrades to an outcome object.
async fn run_discovery(
    db: &Database,
    client: &reqwest::Client,
    source_url: Url,
    refresh: bool,
) -> DiscoveryOutcome {
    let origin = origin_of(&source_url);
    let now = Utc::now().timestamp();

    if !refresh {
        if let Some(outcome) = cached_outcome(db, &origin, now).await {
            return outcome;
        }
    }

    let result: anyhow::Result<DiscoveryOutcome> = async {
        let probe = probe_strategies(client, &source_url, &origin).await;
        let candidates = validate_candidates(client, ranked_seeds(probe.seeds)).await;

        let status = if candidates.is_empty() {
            CacheStatus::Empty
        } else {
            CacheStatus::Success
        };

        db.upsert_discovery_cache(&NewDiscoveryCacheEntry {
            source_origin: &origin,
            source_url: source_url.as_str(),
            candidates_json: &serde_json::to_string(&candidates)?,
            status,
            last_error: probe.last_error.as_deref(),
            checked_at: now,
            expires_at: now + ttl_for(status),
        })
        .await?;

        Ok(DiscoveryOutcome {
            source_url: source_url.to_string(),
            source_origin: origin.clone(),
            checked_at: now,
            cached: false,
            candidates,
        })
    }
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(url = %source_url, error = %err, "Discovery pipeline failed unexpectedly");
            // Best effort: the same store just failed once already
            let write = db
                .upsert_discovery_cache(&NewDiscoveryCacheEntry {
                    source_origin: &origin,
                    source_url: source_url.as_str(),
                    candidates_json: "[]",
                    status: CacheStatus::Error,
                    last_error: Some(&err.to_string()),
                    checked_at: now,
                    expires_at: now + ttl_for(CacheStatus::Error),
                })
                .await;
            if let Err(write_err) = write {
                tracing::error!(origin = %origin, error = %write_err, "Failed to record discovery error state");
            }

            DiscoveryOutcome {
                source_url: source_url.to_string(),
                source_origin: origin,
                checked_at: now,
                cached: false,
                candidates: Vec::new(),
            }
        }
    }
}

/// Serves a fresh cached row as an outcome, if one exists. Malformed
/// cached JSON and lookup failures are treated as cache misses.
async fn cached_outcome(db: &Database, origin: &str, now: i64) -> Option<DiscoveryOutcome> {
    let row = match db.get_discovery_cache(origin).await {
        Ok(row) => row?,
        Err(err) => {
            tracing::warn!(origin = %origin, error = %err, "Discovery cache lookup failed");
            return None;
        }
    };

    if row.expires_at <= now {
        return None;
    }

    let candidates: Vec<DiscoveredFeedCandidate> = match serde_json::from_str(&row.candidates_json)
    {
        Ok(candidates) => candidates,
        Err(err) => {
            tracing::warn!(origin = %origin, error = %err, "Dropping malformed cached candidates");
            return None;
        }
    };

    Some(DiscoveryOutcome {
        source_url: row.source_url,
        source_origin: row.source_origin,
        checked_at: row.checked_at,
        cached: true,
        candidates,
    })
}

struct ProbeRun {
    seeds: HashMap<String, FeedCandidateSeed>,
    /// First strategy-level fetch failure of the run, if any.
    last_error: Option<String>,
}

/// Runs the three candidate strategies into one seed map. Fetch failures
/// are swallowed and recorded; no strategy can abort another.
async fn probe_strategies(client: &reqwest::Client, source_url: &Url, origin: &str) -> ProbeRun {
    let mut seeds = HashMap::new();
    let mut last_error = None;

    match fetch_html(client, source_url.as_str()).await {
        Ok(html) => {
            for link in extract_feed_links_from_html(&html, source_url) {
                insert_seed(&mut seeds, &link, DiscoverySource::PageLink, PAGE_LINK_SCORE);
            }
        }
        Err(err) => record_strategy_error(&mut last_error, source_url.as_str(), err),
    }

    if let Ok(origin_root) = Url::parse(&format!("{origin}/")) {
        if source_url.as_str() != origin_root.as_str() {
            match fetch_html(client, origin_root.as_str()).await {
                Ok(html) => {
                    for link in extract_feed_links_from_html(&html, &origin_root) {
                        insert_seed(&mut seeds, &link, DiscoverySource::SiteLink, SITE_LINK_SCORE);
                    }
                }
                Err(err) => record_strategy_error(&mut last_error, origin_root.as_str(), err),
            }
        }
    }

    common_path_seeds(origin, &mut seeds);

    ProbeRun { seeds, last_error }
}

/// Seeds the fixed well-known paths against the origin, scores descending
/// by list position.
fn common_path_seeds(origin: &str, seeds: &mut HashMap<String, FeedCandidateSeed>) {
    for (position, path) in COMMON_FEED_PATHS.iter().enumerate() {
        if let Ok(url) = Url::parse(&format!("{origin}{path}")) {
            insert_seed(
                seeds,
                &url,
                DiscoverySource::CommonPath,
                COMMON_PATH_BASE_SCORE - position as u32,
            );
        }
    }
}

/// Inserts a candidate keyed by its normalized URL; on collision the
/// higher score wins regardless of strategy. Candidates that fail
/// normalization, unsafe hosts included, are silently dropped.
fn insert_seed(
    seeds: &mut HashMap<String, FeedCandidateSeed>,
    raw: &Url,
    discovered_from: DiscoverySource,
    score: u32,
) {
    let feed_url = match normalize_feed_url(raw.as_str()) {
        Ok(url) => url,
        Err(err) => {
            tracing::debug!(candidate = %raw, error = %err, "Dropping unusable candidate");
            return;
        }
    };

    let seed = FeedCandidateSeed {
        feed_url,
        discovered_from,
        score,
    };

    match seeds.entry(seed.feed_url.to_string()) {
        Entry::Occupied(mut occupied) => {
            if seed.score > occupied.get().score {
                occupied.insert(seed);
            }
        }
        Entry::Vacant(vacant) => {
            vacant.insert(seed);
        }
    }
}

fn record_strategy_error(last_error: &mut Option<String>, url: &str, err: FetchError) {
    tracing::debug!(url = %url, error = %err, "Probe strategy fetch failed");
    // First error wins: it names the strategy closest to the user's input
    if last_error.is_none() {
        *last_error = Some(err.to_string());
    }
}

/// Rank seeds by score descending (URL as a deterministic tie-break) and
/// cap how many will be fetched for validation.
fn ranked_seeds(seeds: HashMap<String, FeedCandidateSeed>) -> Vec<FeedCandidateSeed> {
    let mut seeds: Vec<_> = seeds.into_values().collect();
    seeds.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.feed_url.as_str().cmp(b.feed_url.as_str()))
    });
    seeds.truncate(MAX_CANDIDATES_TO_VALIDATE);
    seeds
}

/// Validates seeds one at a time, in rank order. Sequential on purpose,
/// to throttle load on the target origin and allow early stop. A failed
/// fetch or parse rejects that candidate with no retry.
async fn validate_candidates(
    client: &reqwest::Client,
    seeds: Vec<FeedCandidateSeed>,
) -> Vec<DiscoveredFeedCandidate> {
    let mut validated = Vec::new();

    for seed in seeds {
        if validated.len() >= MAX_VALIDATED_CANDIDATES {
            break;
        }

        let xml = match fetch_xml(client, seed.feed_url.as_str()).await {
            Ok(xml) => xml,
            Err(err) => {
                tracing::debug!(candidate = %seed.feed_url, error = %err, "Candidate fetch failed");
                continue;
            }
        };

        let feed = match parse_rss_feed_xml(&xml, seed.feed_url.as_str()) {
            Ok(feed) => feed,
            Err(err) => {
                tracing::debug!(candidate = %seed.feed_url, error = %err, "Candidate body is not a feed");
                continue;
            }
        };

        validated.push(DiscoveredFeedCandidate {
            feed_url: seed.feed_url.to_string(),
            title: feed.title,
            description: feed.description,
            site_url: feed.site_url,
            discovered_from: seed.discovered_from,
            score: seed.score,
        });
    }

    validated
}

fn ttl_for(status: CacheStatus) -> i64 {
    match status {
        CacheStatus::Success => SUCCESS_TTL_SECS,
        CacheStatus::Empty => EMPTY_TTL_SECS,
        CacheStatus::Error => ERROR_TTL_SECS,
    }
}
