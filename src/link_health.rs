//! Website Verification Module
//!
//! Confirms a declared website answers a liveness probe.
//!
//! Features:
//! - Single HEAD request under a bounded timeout, no retry
//! - URL sanity checks before any network call
//! - Classification: answered (2xx/3xx/most 4xx) is verified; 404/410, 5xx,
//!   timeouts and connection failures are not
//!
//! Failures never propagate: every path ends in a `WebsiteCheck`.

use crate::config::VerifierSettings;
use crate::types::WebsiteCheck;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Redirect hops followed before the answer is taken as-is
const MAX_REDIRECTS: usize = 5;

/// Transport seam for the liveness probe
#[async_trait]
pub trait WebsiteProbe: Send + Sync {
    async fn probe(&self, url: &str) -> WebsiteCheck;
}

/// Probe backed by a shared `reqwest` client
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(settings: &VerifierSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .connect_timeout(Duration::from_millis(settings.timeout_ms))
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        HttpProbe { client }
    }
}

#[async_trait]
impl WebsiteProbe for HttpProbe {
    async fn probe(&self, url: &str) -> WebsiteCheck {
        let url = match prepare_url(url) {
            Some(u) => u,
            None => return WebsiteCheck::Malformed,
        };

        match self.client.head(&url).send().await {
            Ok(resp) => {
                let check = classify_http_status(resp.status().as_u16());
                debug!(url = %url, result = %check, "website probed");
                check
            }
            Err(e) => {
                let check = classify_error(&e);
                debug!(url = %url, result = %check, error = %e, "website probe failed");
                check
            }
        }
    }
}

/// Turn a declared website into a probe-able URL.
///
/// Adds `https://` when no scheme is given. Returns `None` for anything that
/// cannot be an http(s) URL with a host.
pub fn prepare_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return None;
    }

    let url = match raw.find("://") {
        Some(pos) => {
            let scheme = raw[..pos].to_lowercase();
            if scheme != "http" && scheme != "https" {
                return None;
            }
            raw.to_string()
        }
        None => format!("https://{}", raw),
    };

    let rest = &url[url.find("://")? + 3..];
    let host = rest
        .split(|c: char| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or("");
    let host = host.rsplit('@').next().unwrap_or("");
    let host = host.split(':').next().unwrap_or("");

    if host.is_empty() || (!host.contains('.') && host != "localhost") {
        return None;
    }
    if !host.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '-') {
        return None;
    }

    Some(url)
}

/// Classify HTTP status code into a WebsiteCheck
///
/// Classification:
/// - Verified: 100-399 (alive, including redirects left unfollowed)
/// - Verified: 4xx other than 404/410 (server answered but refused the bot)
/// - BadStatus: 404/410 (gone) and 5xx (server failing)
pub fn classify_http_status(status_code: u16) -> WebsiteCheck {
    match status_code {
        100..=399 => WebsiteCheck::Verified(status_code),
        404 | 410 => WebsiteCheck::BadStatus(status_code),
        400..=499 => WebsiteCheck::Verified(status_code),
        _ => WebsiteCheck::BadStatus(status_code),
    }
}

/// Classify a transport error from reqwest
fn classify_error(e: &reqwest::Error) -> WebsiteCheck {
    if e.is_timeout() {
        WebsiteCheck::Timeout
    } else if e.is_builder() {
        WebsiteCheck::Malformed
    } else {
        WebsiteCheck::ConnectionFailed
    }
}

/// Warning attached to a record whose website did not verify
pub fn unverified_warning(url: &str, check: &WebsiteCheck) -> Option<String> {
    if check.is_verified() {
        None
    } else {
        Some(format!("UNVERIFIED_WEBSITE: {} ({})", url, check))
    }
}
