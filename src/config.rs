//! Configuration Types
//!
//! Construction-time configuration for the collector and the security
//! engine. The crate owns no file or CLI surface; callers deserialize or
//! build these and pass them in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the aggregation collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CollectorConfig {
    /// Per-capability lookup timeout in milliseconds (UA parse, GeoIP).
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl CollectorConfig {
    /// Lookup timeout as a [`Duration`].
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

/// Relative weights of the risk heuristics. The weighted sum is clamped to
/// [0,1], so weights normally sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RiskWeights {
    #[serde(default = "default_suspicious_weight")]
    pub suspicious_patterns: f64,
    #[serde(default = "default_threat_weight")]
    pub threat_intelligence: f64,
    #[serde(default = "default_rapid_weight")]
    pub rapid_requests: f64,
    #[serde(default = "default_geo_weight")]
    pub geolocation_risk: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            suspicious_patterns: default_suspicious_weight(),
            threat_intelligence: default_threat_weight(),
            rapid_requests: default_rapid_weight(),
            geolocation_risk: default_geo_weight(),
        }
    }
}

/// Configuration for the security engine and abuse tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecurityConfig {
    /// Failed auth attempts within the failure window before lockout.
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: usize,
    /// Rolling window for failed auth attempts, in seconds.
    #[serde(default = "default_failure_window_secs")]
    pub failure_window_secs: u64,
    /// Rolling window for request-rate tracking, in seconds.
    #[serde(default = "default_request_window_secs")]
    pub request_window_secs: u64,
    /// Idle time after which the consecutive-failure counter resets,
    /// in seconds.
    #[serde(default = "default_auth_reset_secs")]
    pub auth_reset_secs: u64,
    /// Heuristic weights.
    #[serde(default)]
    pub weights: RiskWeights,
    /// Timeout for threat-feed lookups in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_failed_attempts(),
            failure_window_secs: default_failure_window_secs(),
            request_window_secs: default_request_window_secs(),
            auth_reset_secs: default_auth_reset_secs(),
            weights: RiskWeights::default(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl SecurityConfig {
    /// Failure window as a [`Duration`].
    pub fn failure_window(&self) -> Duration {
        Duration::from_secs(self.failure_window_secs)
    }

    /// Request window as a [`Duration`].
    pub fn request_window(&self) -> Duration {
        Duration::from_secs(self.request_window_secs)
    }

    /// Auth-counter reset window as a [`Duration`].
    pub fn auth_reset_window(&self) -> Duration {
        Duration::from_secs(self.auth_reset_secs)
    }

    /// Threat-feed lookup timeout as a [`Duration`].
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

fn default_lookup_timeout_ms() -> u64 {
    3000
}

fn default_max_failed_attempts() -> usize {
    5
}

fn default_failure_window_secs() -> u64 {
    900
}

fn default_request_window_secs() -> u64 {
    60
}

fn default_auth_reset_secs() -> u64 {
    300
}

fn default_suspicious_weight() -> f64 {
    0.3
}

fn default_threat_weight() -> f64 {
    0.4
}

fn default_rapid_weight() -> f64 {
    0.2
}

fn default_geo_weight() -> f64 {
    0.1
}
