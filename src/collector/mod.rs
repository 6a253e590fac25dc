//! Visitor Data Collector
//!
//! Fan-out aggregation pipeline: seven extraction tasks run concurrently
//! over one set of request facts and their outputs merge into a single
//! [`CompositeVisitorRecord`]. Extraction failures are isolated; a failed
//! task costs exactly its own facet, logged at warn level, and never
//! aborts the aggregate.

mod behavior;
mod browser;
mod device;
mod fingerprint;
mod geo;
mod network;
mod screen;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

pub use browser::{FallbackUa, FallbackUaParser};
pub use device::classify_user_agent;

use crate::capabilities::{GeoProvider, UserAgentParser};
use crate::config::CollectorConfig;
use crate::facts::RequestFacts;
use crate::record::{generate_visit_id, CompositeVisitorRecord, VisitType};

/// The aggregate itself could not be assembled. Facet-level failures are
/// absorbed; only unusable input reaches the caller.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid request facts: {0}")]
    InvalidFacts(&'static str),
}

/// Failure of a single extraction task.
#[derive(Debug, Error)]
pub(crate) enum ExtractError {
    #[error("lookup exceeded {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Capability(#[from] anyhow::Error),
}

/// Assembles composite visitor records from request facts.
pub struct Collector {
    config: CollectorConfig,
    fallback_ua: FallbackUaParser,
    ua_parser: Option<Arc<dyn UserAgentParser>>,
    geo: Option<Arc<dyn GeoProvider>>,
}

impl Collector {
    /// Create a collector with no external capabilities attached.
    pub fn new(config: CollectorConfig) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            fallback_ua: FallbackUaParser::new()?,
            ua_parser: None,
            geo: None,
        })
    }

    /// Attach a user-agent database. Without one, browser and device
    /// extraction fall back to the built-in substring classifier.
    pub fn with_ua_parser(mut self, parser: Arc<dyn UserAgentParser>) -> Self {
        self.ua_parser = Some(parser);
        self
    }

    /// Attach a GeoIP provider. Without one, the geolocation facet is
    /// always absent.
    pub fn with_geo_provider(mut self, geo: Arc<dyn GeoProvider>) -> Self {
        self.geo = Some(geo);
        self
    }

    /// Run all extraction tasks over one request and merge their outputs.
    ///
    /// Each facet slot in the record is written by exactly one task. A task
    /// that fails or times out leaves its slot `None` and the rest of the
    /// record intact.
    pub async fn aggregate(
        &self,
        facts: &RequestFacts,
    ) -> Result<CompositeVisitorRecord, CollectError> {
        if facts.client_ip.is_empty() {
            return Err(CollectError::InvalidFacts("client_ip is empty"));
        }
        if facts.url.is_empty() {
            return Err(CollectError::InvalidFacts("url is empty"));
        }
        let user_agent = facts
            .user_agent()
            .ok_or(CollectError::InvalidFacts("user-agent header missing"))?
            .to_string();

        let lookup_timeout = self.config.lookup_timeout();
        let ua_parser = self.ua_parser.as_deref();

        let (browser_os, device, screen, network, geolocation, fingerprint, behavior) = tokio::join!(
            browser::extract(facts, ua_parser, &self.fallback_ua, lookup_timeout),
            device::extract(facts, ua_parser, lookup_timeout),
            screen::extract(facts),
            network::extract(facts),
            geo::extract(facts, self.geo.as_deref(), lookup_timeout),
            fingerprint::extract(facts),
            behavior::extract(facts),
        );

        let (browser, os) = match settle("browser", browser_os) {
            Some((browser, os)) => (Some(browser), Some(os)),
            None => (None, None),
        };

        Ok(CompositeVisitorRecord {
            visit_id: generate_visit_id(),
            timestamp: Utc::now(),
            visit_type: if facts.is_form_submission {
                VisitType::FormSubmission
            } else {
                VisitType::PageVisit
            },
            is_form_submission: facts.is_form_submission,
            url: facts.url.clone(),
            referrer: facts.referrer.clone(),
            client_ip: facts.client_ip.clone(),
            user_agent,
            browser,
            os,
            device: settle("device", device),
            screen: settle("screen", screen),
            network: settle("network", network),
            geolocation: settle("geolocation", geolocation),
            fingerprint: settle("fingerprint", fingerprint),
            behavior: settle("behavior", behavior),
        })
    }
}

/// Merge one task outcome into its record slot. Failures become an absent
/// facet and a warning; they never propagate.
fn settle<T>(facet: &'static str, outcome: Result<Option<T>, ExtractError>) -> Option<T> {
    match outcome {
        Ok(value) => value,
        Err(e) => {
            warn!(facet, error = %e, "facet extraction failed");
            None
        }
    }
}

/// Typed accessors over the client-submitted JSON blobs. The blobs are
/// untrusted; anything of an unexpected shape reads as absent.
pub(crate) mod json {
    use serde_json::Value;

    pub fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
        value.get(key)?.as_str()
    }

    pub fn get_string(value: &Value, key: &str) -> Option<String> {
        get_str(value, key).map(str::to_string)
    }

    pub fn get_u32(value: &Value, key: &str) -> Option<u32> {
        value.get(key)?.as_u64().and_then(|n| u32::try_from(n).ok())
    }

    pub fn get_f64(value: &Value, key: &str) -> Option<f64> {
        value.get(key)?.as_f64()
    }

    pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
        value.get(key)?.as_bool()
    }

    pub fn get_string_vec(value: &Value, key: &str) -> Option<Vec<String>> {
        let items = value.get(key)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    }
}
