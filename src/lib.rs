//! Visitor Intelligence Library
//!
//! Turns one inbound client request into two independent outputs:
//!
//! - **Composite visitor record**: browser, device, network, geolocation,
//!   fingerprint, behavioral, and screen facets collected by a concurrent
//!   fan-out pipeline that tolerates any individual extractor failing.
//! - **Risk assessment**: a bounded [0,1] risk score combined from weighted
//!   heuristics, an attack-signature scan, and per-client sliding-window
//!   abuse state driving block/allow decisions.
//!
//! # Example
//!
//! ```ignore
//! use visitor_intel::{Collector, CollectorConfig, RequestFacts, SecurityConfig, SecurityEngine};
//!
//! let facts = RequestFacts::builder()
//!     .client_ip("203.0.113.7")
//!     .url("https://example.com/contact")
//!     .header("user-agent", "Mozilla/5.0 ... Chrome/115.0 ...")
//!     .build();
//!
//! let collector = Collector::new(CollectorConfig::default())?;
//! let record = collector.aggregate(&facts).await?;
//!
//! let engine = SecurityEngine::new(SecurityConfig::default())?;
//! let verdict = engine.assess(&facts, &facts.client_ip).await;
//! if verdict.blocked {
//!     // reject before storing or notifying
//! }
//! ```

pub mod capabilities;
pub mod collector;
pub mod config;
pub mod facts;
mod ip;
pub mod record;
pub mod security;

// Re-exports for convenience
pub use collector::{CollectError, Collector};
pub use config::{CollectorConfig, RiskWeights, SecurityConfig};
pub use facts::{RequestFacts, RequestFactsBuilder};
pub use record::CompositeVisitorRecord;
pub use security::{AbuseTracker, RiskAssessment, SecurityEngine, WafReport};
