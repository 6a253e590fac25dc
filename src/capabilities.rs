//! External Lookup Capabilities
//!
//! Seams for the optional databases the pipelines consult: user-agent
//! parsing, IP geolocation, and threat-intelligence feeds. Every capability
//! is optional; callers degrade deterministically when one is absent (the
//! fallback UA parser, an absent geolocation facet, a neutral threat score).
//! Implementations may do I/O; every invocation is wrapped in a bounded
//! timeout by the calling pipeline.

use std::net::IpAddr;

use anyhow::Result;
use async_trait::async_trait;

/// Structured result of a user-agent database lookup.
#[derive(Debug, Clone, Default)]
pub struct ParsedUserAgent {
    pub browser: Option<String>,
    pub browser_version: Option<String>,
    pub browser_major: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    /// Device family string (e.g. "iPhone", "Other").
    pub device_family: Option<String>,
    pub device_brand: Option<String>,
    pub device_model: Option<String>,
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_pc: bool,
}

/// User-agent database capability (e.g. a uap-core backed parser).
#[async_trait]
pub trait UserAgentParser: Send + Sync {
    /// Parse a raw user-agent string into structured attributes.
    async fn parse(&self, user_agent: &str) -> Result<ParsedUserAgent>;
}

/// City-level geolocation result.
#[derive(Debug, Clone, Default)]
pub struct GeoCity {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub accuracy_radius: Option<u32>,
}

/// ISP / autonomous-system attribution for an IP.
#[derive(Debug, Clone, Default)]
pub struct IspInfo {
    pub isp: Option<String>,
    pub organization: Option<String>,
    pub as_number: Option<String>,
}

/// GeoIP database capability (e.g. a MaxMind reader).
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Look up city-level geolocation. `Ok(None)` means the IP is simply
    /// not in the database.
    async fn city(&self, ip: IpAddr) -> Result<Option<GeoCity>>;

    /// Look up ISP attribution. Secondary to [`GeoProvider::city`]; callers
    /// treat any failure here as best-effort and keep the city result.
    async fn isp(&self, ip: IpAddr) -> Result<Option<IspInfo>>;
}

/// Threat-intelligence feed capability.
#[async_trait]
pub trait ThreatFeed: Send + Sync {
    /// Risk score in [0,1] for an IP according to the feed.
    async fn ip_risk(&self, ip: IpAddr) -> Result<f64>;
}
