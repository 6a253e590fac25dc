//! Risk Heuristics
//!
//! Independent scorers, each returning a bounded [0,1] sub-score. The
//! engine combines them with fixed weights; no heuristic ever fails hard.

use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use crate::capabilities::ThreatFeed;
use crate::facts::RequestFacts;
use crate::ip::{is_private_or_loopback, parse_ip};

/// User-agent substrings indicating automation.
const BOT_INDICATORS: &[&str] = &[
    "bot", "crawler", "spider", "scraper", "curl", "wget", "python", "java", "postman", "test",
    "monitor",
];

/// Headers whose presence suggests the request traversed a proxy.
const PROXY_HEADERS: &[&str] = &["x-forwarded-for", "x-real-ip", "via", "forwarded"];

/// Additive point schedule over request-shape signals, clamped to 1.0.
pub(super) fn suspicious_patterns(facts: &RequestFacts) -> f64 {
    let mut score: f64 = 0.0;

    let user_agent = facts.user_agent().unwrap_or("");
    let ua_lower = user_agent.to_lowercase();

    if BOT_INDICATORS.iter().any(|b| ua_lower.contains(b)) {
        score += 0.3;
    }
    if user_agent.is_empty() {
        score += 0.2;
    }
    if facts.header("accept").is_none() {
        score += 0.1;
    }
    if facts.header("accept-language").is_none() {
        score += 0.1;
    }
    if PROXY_HEADERS.iter().any(|h| facts.header(h).is_some()) {
        score += 0.2;
    }

    score.min(1.0)
}

/// Threat-feed score for the client IP. Private and loopback addresses are
/// never looked up; an unparseable IP string is itself a moderate signal.
/// Feed errors and timeouts degrade to 0.0.
pub(super) async fn threat_intelligence(
    client_ip: &str,
    feed: Option<&dyn ThreatFeed>,
    lookup_timeout: Duration,
) -> f64 {
    let ip = match parse_ip(client_ip) {
        Some(ip) => ip,
        None => return 0.5,
    };
    if is_private_or_loopback(ip) {
        return 0.0;
    }

    let feed = match feed {
        Some(feed) => feed,
        None => return 0.0,
    };

    match timeout(lookup_timeout, feed.ip_risk(ip)).await {
        Ok(Ok(score)) => score.clamp(0.0, 1.0),
        Ok(Err(e)) => {
            warn!(ip = %ip, error = %e, "threat feed lookup failed");
            0.0
        }
        Err(_) => {
            warn!(ip = %ip, "threat feed lookup timed out");
            0.0
        }
    }
}

/// Step function over the request count in the trailing request window,
/// evaluated highest threshold first.
pub(super) fn rapid_requests(recent_count: usize) -> f64 {
    if recent_count > 30 {
        0.8
    } else if recent_count > 20 {
        0.6
    } else if recent_count > 10 {
        0.4
    } else if recent_count > 5 {
        0.2
    } else {
        0.0
    }
}

/// Country-risk extension point; constant until a risk list is wired in.
pub(super) fn geolocation_risk(_client_ip: &str) -> f64 {
    0.0
}
