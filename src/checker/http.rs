// src/checker/http.rs
// =============================================================================
// This module checks external (http/https) links.
//
// Two modes:
// - Syntax-only (default): parse the URL with the `url` crate. No network,
//   always fast, never flaky - good for CI.
// - Live (--live): send an HTTP HEAD request and look at the status code.
//
// Key functionality of the live mode:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Falls back to GET if the server refuses HEAD (405 / 501)
// - Follows redirects (up to 10)
// - Gives every request its own timeout, so one dead host can't stall a scan
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - tokio::time::timeout: Wraps a future and gives up after a deadline;
//   the inner request is dropped (cancelled) when that happens
// - BoxFuture: a heap-allocated future, so a trait method can return one
// =============================================================================

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use url::Url;

use super::LinkProbe;
use crate::link::ValidationResult;

/// Default per-request timeout for live checks.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Sent with every request so site owners can tell what is calling them.
pub const USER_AGENT: &str = concat!(
    "link-checker/",
    env!("CARGO_PKG_VERSION"),
    " (+broken link scanner)"
);

// Checks that a URL is a well-formed absolute URL with a host
//
// Example:
//   "https://example.com" -> valid
//   "https://"            -> invalid ("Invalid URL format: empty host")
pub fn check_syntax(url: &str) -> ValidationResult {
    match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => ValidationResult::valid(),
        Ok(_) => ValidationResult::invalid("Invalid URL format: missing host"),
        Err(e) => ValidationResult::invalid(format!("Invalid URL format: {}", e)),
    }
}

/// The real network probe, built on one shared reqwest Client.
///
/// Client is cheap to clone (it's just a reference counter internally) and
/// keeps a connection pool, so one instance serves the whole scan.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    // Creates a probe with our default client settings
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(HttpProbe::with_client(HttpProbe::client_builder().build()?))
    }

    // Uses a caller-configured client (e.g. one without proxies in tests)
    pub fn with_client(client: Client) -> Self {
        HttpProbe { client }
    }

    // The settings every probe client should start from
    pub fn client_builder() -> ClientBuilder {
        Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
    }
}

impl LinkProbe for HttpProbe {
    fn probe<'a>(&'a self, url: &'a str, timeout: Duration) -> BoxFuture<'a, ValidationResult> {
        check_single_link(&self.client, url, timeout).boxed()
    }
}

// Checks a single link
//
// This function does the actual HTTP request and categorizes the result.
//
// Parameters:
//   client: reqwest HTTP client (borrowed, we don't own it)
//   url: the URL to check
//   timeout: how long to wait before giving up
//
// Returns: ValidationResult with status code and error details
async fn check_single_link(client: &Client, url: &str, timeout: Duration) -> ValidationResult {
    // No point asking the network about a URL that doesn't parse
    let syntax = check_syntax(url);
    if !syntax.is_valid {
        return syntax;
    }

    match tokio::time::timeout(timeout, fetch_status(client, url)).await {
        Ok(Ok(status)) => analyze_status(status),
        Ok(Err(e)) => categorize_error(&e, timeout),
        // The deadline passed; the request future has been dropped
        Err(_) => ValidationResult::invalid(timeout_message(timeout)),
    }
}

// HEAD first; some servers answer 405/501 to HEAD but serve GET fine
async fn fetch_status(client: &Client, url: &str) -> Result<StatusCode, reqwest::Error> {
    let response = client.head(url).send().await?;
    let status = response.status();

    if matches!(
        status,
        StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
    ) {
        log::debug!("{} rejected HEAD ({}), retrying with GET", url, status);
        // Only the status line is needed; the body is never read
        let response = client.get(url).send().await?;
        return Ok(response.status());
    }

    Ok(status)
}

// Maps an HTTP status code to a ValidationResult
//
// Only 2xx counts as valid. Redirects have already been followed by the
// client, so a 3xx here means the chain never ended somewhere useful.
fn analyze_status(status: StatusCode) -> ValidationResult {
    let code = status.as_u16();

    if status.is_success() {
        ValidationResult::valid().with_status(code)
    } else {
        let reason = status.canonical_reason().unwrap_or("Unknown Status");
        ValidationResult::invalid(format!("HTTP {}: {}", code, reason)).with_status(code)
    }
}

// Categorizes different error types from reqwest
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure / connection refused
// - SSL certificate issues
// - Too many redirects
// - etc.
fn categorize_error(error: &reqwest::Error, timeout: Duration) -> ValidationResult {
    let message = if error.is_timeout() {
        timeout_message(timeout)
    } else if error.is_redirect() {
        "Network error: too many redirects".to_string()
    } else if error.is_builder() {
        format!("Invalid URL format: {}", error)
    } else if error.is_connect() {
        format!("Network error: connection failed ({})", error)
    } else {
        format!("Network error: {}", error)
    };

    ValidationResult::invalid(message)
}

fn timeout_message(timeout: Duration) -> String {
    format!("Request timed out after {} ms", timeout.as_millis())
}
