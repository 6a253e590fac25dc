//! Composite Visitor Record
//!
//! The output of the aggregation pipeline: a fixed set of optional facets
//! plus required scalars. A facet is either fully populated by its extractor
//! or entirely absent; it never carries the half-written output of a failed
//! extraction. Individual fields inside a facet may still be `None` for
//! attributes the extractor could not determine.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the visit was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitType {
    PageVisit,
    FormSubmission,
}

/// Broad device class derived from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    Unknown,
}

/// Browser identity parsed from the user agent and client-hint headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub major_version: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub user_agent: Option<String>,
    /// Primary language from `Accept-Language`.
    pub language: Option<String>,
    /// Full `Accept-Language` preference list.
    pub languages: Option<Vec<String>>,
    /// Platform from `Sec-CH-UA-Platform`, quotes stripped.
    pub platform: Option<String>,
}

/// Operating system identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
}

/// Device classification and hardware signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_type: DeviceType,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_touch: bool,
    pub hardware_concurrency: Option<u32>,
    pub max_touch_points: Option<u32>,
    /// Device memory in GB.
    pub memory: Option<f64>,
    pub vendor: Option<String>,
    pub renderer: Option<String>,
}

/// Screen geometry reported by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub color_depth: Option<u32>,
    pub pixel_ratio: Option<f64>,
    pub available_width: Option<u32>,
    pub available_height: Option<u32>,
    pub orientation: Option<String>,
    pub inner_width: Option<u32>,
    pub inner_height: Option<u32>,
}

/// Network attributes derived from the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// `"IPv4"` or `"IPv6"`.
    pub ip_version: Option<String>,
    /// Raw `Connection` header value.
    pub connection_type: Option<String>,
}

/// Geolocation of the client IP, including best-effort ISP attribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeolocationInfo {
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
    pub isp: Option<String>,
    pub organization: Option<String>,
    pub as_number: Option<String>,
}

/// Client-side fingerprint signals, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalFingerprint {
    pub canvas_fingerprint: Option<String>,
    pub webgl_fingerprint: Option<String>,
    pub audio_fingerprint: Option<String>,
    pub font_fingerprint: Option<Vec<String>>,
    pub timezone_fingerprint: Option<String>,
    pub plugin_fingerprint: Option<Vec<String>>,
    pub webrtc_fingerprint: Option<serde_json::Value>,
    pub local_storage_enabled: Option<bool>,
    pub session_storage_enabled: Option<bool>,
    pub indexed_db_enabled: Option<bool>,
    pub do_not_track: Option<bool>,
    pub ad_blocker_detected: Option<bool>,
}

/// Summary of client-side interaction events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralSummary {
    /// Number of mouse-move events observed.
    pub mouse_moves: usize,
    /// Number of key-down events observed.
    pub key_downs: usize,
    /// Total interactions; `None` when no events were observed at all.
    pub interaction_count: Option<usize>,
    pub time_on_page: Option<f64>,
    pub form_completion_time: Option<f64>,
    pub page_load_time: Option<f64>,
}

/// One enriched record describing a visitor, assembled once by the
/// collector and handed to storage/notification collaborators unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeVisitorRecord {
    pub visit_id: String,
    pub timestamp: DateTime<Utc>,
    pub visit_type: VisitType,
    pub is_form_submission: bool,
    pub url: String,
    pub referrer: Option<String>,
    pub client_ip: String,
    pub user_agent: String,

    pub browser: Option<BrowserInfo>,
    pub os: Option<OsInfo>,
    pub device: Option<DeviceInfo>,
    pub screen: Option<ScreenInfo>,
    pub network: Option<NetworkInfo>,
    pub geolocation: Option<GeolocationInfo>,
    pub fingerprint: Option<TechnicalFingerprint>,
    pub behavior: Option<BehavioralSummary>,
}

/// Generate a unique visit identifier: `VISIT-<unix-ts>-<8 hex chars>`.
pub fn generate_visit_id() -> String {
    let timestamp = Utc::now().timestamp();
    let entropy: u32 = rand::thread_rng().gen();
    format!("VISIT-{}-{:08X}", timestamp, entropy)
}
