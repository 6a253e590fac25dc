//! Risk Scoring and Abuse Control
//!
//! The second pipeline: per-request risk assessment combining weighted
//! heuristic sub-scores, a signature scan over the request surface, and
//! the per-client abuse state. Block decisions come from two independent
//! sources: block-set membership (forces risk 1.0, skips everything else)
//! and any signature match.

mod abuse;
mod heuristics;
mod signatures;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

pub use abuse::AbuseTracker;
pub use signatures::{SignatureCategory, SignatureSet, Threat, WafReport};

use crate::capabilities::ThreatFeed;
use crate::config::SecurityConfig;
use crate::facts::RequestFacts;

/// Per-request risk verdict. Lives for the request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub client_ip: String,
    pub blocked: bool,
    pub suspicious: bool,
    /// Weighted total, clamped to [0,1]. Forced to 1.0 for blocked clients.
    pub risk_score: f64,
    /// Sub-score per heuristic name. Empty when the block set short-circuits
    /// the assessment.
    pub checks: BTreeMap<String, f64>,
}

impl RiskAssessment {
    fn blocked_client(client_ip: String) -> Self {
        Self {
            client_ip,
            blocked: true,
            suspicious: false,
            risk_score: 1.0,
            checks: BTreeMap::new(),
        }
    }
}

/// Assesses request risk and owns the abuse state.
pub struct SecurityEngine {
    config: SecurityConfig,
    signatures: SignatureSet,
    tracker: Arc<AbuseTracker>,
    threat_feed: Option<Arc<dyn ThreatFeed>>,
}

impl SecurityEngine {
    pub fn new(config: SecurityConfig) -> anyhow::Result<Self> {
        let tracker = Arc::new(AbuseTracker::new(&config));
        Ok(Self {
            config,
            signatures: SignatureSet::new()?,
            tracker,
            threat_feed: None,
        })
    }

    /// Attach a threat-intelligence feed. Without one the heuristic scores
    /// a neutral 0.0 for every public IP.
    pub fn with_threat_feed(mut self, feed: Arc<dyn ThreatFeed>) -> Self {
        self.threat_feed = Some(feed);
        self
    }

    /// The abuse tracker, shared with auth and rate-limit call sites.
    pub fn tracker(&self) -> &Arc<AbuseTracker> {
        &self.tracker
    }

    /// Assess one request. `client_id` keys the abuse state; it is usually
    /// the resolved client IP but callers may key authenticated traffic by
    /// user identity instead.
    ///
    /// A client in the block set short-circuits: risk 1.0, no heuristics,
    /// no checks map. Otherwise four weighted heuristics and the signature
    /// scan run; a signature match blocks without touching the weighted
    /// score.
    pub async fn assess(&self, facts: &RequestFacts, client_id: &str) -> RiskAssessment {
        let client_ip = facts.client_ip.clone();

        if self.tracker.is_blocked(client_id) {
            return RiskAssessment::blocked_client(client_ip);
        }

        let mut checks = BTreeMap::new();

        let suspicious_score = heuristics::suspicious_patterns(facts);
        checks.insert("suspicious_patterns".to_string(), suspicious_score);

        let threat_score = heuristics::threat_intelligence(
            &client_ip,
            self.threat_feed.as_deref(),
            self.config.lookup_timeout(),
        )
        .await;
        checks.insert("threat_intelligence".to_string(), threat_score);

        let rapid_score = heuristics::rapid_requests(self.tracker.request_count(client_id));
        checks.insert("rapid_requests".to_string(), rapid_score);

        let geo_score = heuristics::geolocation_risk(&client_ip);
        checks.insert("geolocation_risk".to_string(), geo_score);

        let waf = self.signatures.scan(facts);
        checks.insert("waf_signatures".to_string(), waf.risk_score);

        let weights = &self.config.weights;
        let total = suspicious_score * weights.suspicious_patterns
            + threat_score * weights.threat_intelligence
            + rapid_score * weights.rapid_requests
            + geo_score * weights.geolocation_risk;

        if total > 0.7 {
            warn!(client_ip = %client_ip, risk_score = total, "high-risk client");
        }
        if waf.blocked {
            warn!(
                client_ip = %client_ip,
                threats = waf.threats.len(),
                "request blocked by signature scan"
            );
        }

        RiskAssessment {
            client_ip,
            blocked: waf.blocked,
            suspicious: total > 0.5,
            risk_score: total.min(1.0),
            checks,
        }
    }

    /// Run only the signature scan, with full threat detail.
    pub fn scan(&self, facts: &RequestFacts) -> WafReport {
        self.signatures.scan(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::net::IpAddr;

    fn engine() -> SecurityEngine {
        SecurityEngine::new(SecurityConfig::default()).unwrap()
    }

    fn browser_facts(ip: &str) -> RequestFacts {
        RequestFacts::builder()
            .client_ip(ip)
            .url("https://example.com/pricing")
            .header("user-agent", "Mozilla/5.0 (Windows NT 10.0) Chrome/115.0")
            .header("accept", "text/html")
            .header("accept-language", "en-US")
            .build()
    }

    #[tokio::test]
    async fn test_clean_request_low_risk() {
        let engine = engine();
        let assessment = engine.assess(&browser_facts("203.0.113.7"), "203.0.113.7").await;

        assert!(!assessment.blocked);
        assert!(!assessment.suspicious);
        assert_eq!(assessment.risk_score, 0.0);
        assert_eq!(assessment.checks.len(), 5);
        assert_eq!(assessment.checks["suspicious_patterns"], 0.0);
        assert_eq!(assessment.checks["geolocation_risk"], 0.0);
    }

    #[tokio::test]
    async fn test_blocked_client_short_circuits() {
        let engine = engine();
        for _ in 0..5 {
            engine.tracker().record_auth_attempt("203.0.113.7", false);
        }

        let assessment = engine.assess(&browser_facts("203.0.113.7"), "203.0.113.7").await;
        assert!(assessment.blocked);
        assert_eq!(assessment.risk_score, 1.0);
        assert!(assessment.checks.is_empty());

        // Other clients assess normally.
        let other = engine.assess(&browser_facts("203.0.113.8"), "203.0.113.8").await;
        assert!(!other.blocked);
    }

    #[tokio::test]
    async fn test_signature_match_blocks_without_inflating_score() {
        let engine = engine();
        let facts = RequestFacts::builder()
            .client_ip("203.0.113.7")
            .url("https://example.com/items?id=1 UNION SELECT password FROM users")
            .header("user-agent", "Mozilla/5.0 (Windows NT 10.0) Chrome/115.0")
            .header("accept", "text/html")
            .header("accept-language", "en-US")
            .build();

        let assessment = engine.assess(&facts, "203.0.113.7").await;
        assert!(assessment.blocked);
        assert!(assessment.checks["waf_signatures"] >= 0.3);
        // The weighted score only covers the four heuristics.
        assert_eq!(assessment.risk_score, 0.0);
    }

    struct HotFeed;

    #[async_trait]
    impl ThreatFeed for HotFeed {
        async fn ip_risk(&self, _ip: IpAddr) -> anyhow::Result<f64> {
            Ok(1.0)
        }
    }

    #[tokio::test]
    async fn test_weighted_combination() {
        let engine = engine().with_threat_feed(Arc::new(HotFeed));
        let facts = RequestFacts::builder()
            .client_ip("203.0.113.7")
            .url("https://example.com/")
            .header("user-agent", "curl/8.1.2")
            .build();

        let assessment = engine.assess(&facts, "203.0.113.7").await;
        // suspicious: curl 0.3 + no accept 0.1 + no accept-language 0.1 = 0.5
        // weighted: 0.5*0.3 + 1.0*0.4 + 0 + 0 = 0.55
        assert!((assessment.risk_score - 0.55).abs() < 1e-9);
        assert!(assessment.suspicious);
        assert!(!assessment.blocked);
    }

    struct BrokenFeed;

    #[async_trait]
    impl ThreatFeed for BrokenFeed {
        async fn ip_risk(&self, _ip: IpAddr) -> anyhow::Result<f64> {
            Err(anyhow!("feed offline"))
        }
    }

    #[tokio::test]
    async fn test_feed_failure_degrades_to_neutral() {
        let engine = engine().with_threat_feed(Arc::new(BrokenFeed));
        let assessment = engine.assess(&browser_facts("203.0.113.7"), "203.0.113.7").await;
        assert_eq!(assessment.checks["threat_intelligence"], 0.0);
        assert!(!assessment.blocked);
    }

    #[tokio::test]
    async fn test_rapid_requests_raise_score() {
        let engine = engine();
        for _ in 0..35 {
            engine.tracker().record_request("203.0.113.7");
        }

        let assessment = engine.assess(&browser_facts("203.0.113.7"), "203.0.113.7").await;
        assert_eq!(assessment.checks["rapid_requests"], 0.8);
        // 0.8 * 0.2 weight.
        assert!((assessment.risk_score - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_private_ip_helpers_agree_with_assessment() {
        // The heuristic and the geolocation skip share one classifier.
        assert!(ip::is_private_or_loopback("10.0.0.5".parse().unwrap()));
        assert!(!ip::is_private_or_loopback("203.0.113.7".parse().unwrap()));
    }
}
