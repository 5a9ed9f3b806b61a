use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Per-fetch deadline. Applies to every outbound request this engine makes.
pub(crate) const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Response body cap (1.5MB). Exceeding it fails only that fetch.
pub(crate) const MAX_FETCH_SIZE: usize = 1536 * 1024;

/// Descriptive crawler identity, sent on every request.
pub const USER_AGENT: &str = concat!(
    "feedscout/",
    env!("CARGO_PKG_VERSION"),
    " (feed discovery bot)"
);

/// Accept header for page probes: HTML preferred, feeds welcome.
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,\
    application/rss+xml;q=0.8,application/atom+xml;q=0.8,*/*;q=0.1";

/// Accept header for candidate validation: feed flavors preferred.
const FEED_ACCEPT: &str = "application/rss+xml,application/atom+xml,\
    application/rdf+xml;q=0.9,application/xml;q=0.8,text/xml;q=0.7,*/*;q=0.1";

/// Errors from a single bounded fetch. Always recovered locally by the
/// orchestrator: a failed fetch rejects one candidate or one strategy,
/// never the whole run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the 10-second deadline
    #[error("request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 1.5MB size limit
    #[error("response too large")]
    TooLarge,
}

/// Builds the HTTP client used for discovery probing: crawler User-Agent,
/// redirect following, and a request-wide timeout backstop.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(FETCH_TIMEOUT)
        .build()
}

/// Fetches a page for link scanning (HTML-flavored Accept header).
pub(crate) async fn fetch_html(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, FetchError> {
    fetch_with_accept(client, url, HTML_ACCEPT).await
}

/// Fetches a candidate feed body (feed-flavored Accept header).
pub(crate) async fn fetch_xml(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    fetch_with_accept(client, url, FEED_ACCEPT).await
}

async fn fetch_with_accept(
    client: &reqwest::Client,
    url: &str,
    accept: &str,
) -> Result<String, FetchError> {
    let response = tokio::time::timeout(
        FETCH_TIMEOUT,
        client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send(),
    )
    .await
    .map_err(|_| FetchError::Timeout)?
    .map_err(map_reqwest)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FETCH_SIZE).await?;
    // Feeds lie about encodings often enough that lossy decoding beats failing
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn map_reqwest(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err)
    }
}

/// Reads a response body with a size limit using stream-based reading.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::TooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_html_sends_crawler_identity() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("User-Agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = build_http_client().unwrap();
        let body = fetch_html(&client, &format!("{}/page", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_fetch_xml_prefers_feed_flavors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss/>"))
            .mount(&mock_server)
            .await;

        let client = build_http_client().unwrap();
        let body = fetch_xml(&client, &mock_server.uri()).await.unwrap();
        assert_eq!(body, "<rss/>");

        let requests = mock_server.received_requests().await.unwrap();
        let accept = requests[0].headers.get("accept").unwrap().to_str().unwrap();
        assert!(accept.starts_with("application/rss+xml"));
    }

    #[tokio::test]
    async fn test_non_2xx_is_http_status_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = build_http_client().unwrap();
        let result = fetch_xml(&client, &mock_server.uri()).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(404))));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mock_server = MockServer::start().await;
        let big = "x".repeat(MAX_FETCH_SIZE + 1);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(big))
            .mount(&mock_server)
            .await;

        let client = build_http_client().unwrap();
        let result = fetch_html(&client, &mock_server.uri()).await;
        assert!(matches!(result, Err(FetchError::TooLarge)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 1 on loopback is never listening
        let client = build_http_client().unwrap();
        let result = fetch_html(&client, "http://127.0.0.1:1/").await;
        assert!(matches!(
            result,
            Err(FetchError::Network(_)) | Err(FetchError::Timeout)
        ));
    }
}
