//! Device Extraction
//!
//! Classifies the device as mobile/tablet/desktop from UA-database signals
//! when available, else from substring heuristics on the lowercased user
//! agent. Touch capability is an independent keyword check, and hardware
//! attributes pass through from the client-submitted technical blob.

use std::time::Duration;

use tokio::time::timeout;

use super::{json, ExtractError};
use crate::capabilities::UserAgentParser;
use crate::facts::RequestFacts;
use crate::record::{DeviceInfo, DeviceType};

/// Keywords indicating a touch-capable device.
const TOUCH_INDICATORS: &[&str] = &[
    "touch", "mobile", "android", "iphone", "ipad", "tablet", "silk", "kindle",
];

/// Classify a device from the user agent alone.
pub fn classify_user_agent(user_agent: &str) -> DeviceType {
    let ua = user_agent.to_lowercase();
    if ["mobile", "android", "iphone"].iter().any(|t| ua.contains(t)) {
        DeviceType::Mobile
    } else if ["tablet", "ipad"].iter().any(|t| ua.contains(t)) {
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    }
}

fn is_touch_device(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    TOUCH_INDICATORS.iter().any(|t| ua.contains(t))
}

/// Extract the device facet for one request.
pub(super) async fn extract(
    facts: &RequestFacts,
    parser: Option<&dyn UserAgentParser>,
    lookup_timeout: Duration,
) -> Result<Option<DeviceInfo>, ExtractError> {
    let user_agent = facts.user_agent().unwrap_or("");

    let (device_type, brand, model) = match parser {
        Some(parser) => {
            let parsed = timeout(lookup_timeout, parser.parse(user_agent))
                .await
                .map_err(|_| ExtractError::Timeout(lookup_timeout))??;

            let device_type = if parsed.is_mobile {
                DeviceType::Mobile
            } else if parsed.is_tablet {
                DeviceType::Tablet
            } else if parsed.is_pc {
                DeviceType::Desktop
            } else {
                DeviceType::Unknown
            };
            (device_type, parsed.device_brand, parsed.device_model)
        }
        None => (classify_user_agent(user_agent), None, None),
    };

    let mut device = DeviceInfo {
        device_type,
        brand,
        model,
        is_mobile: device_type == DeviceType::Mobile,
        is_tablet: device_type == DeviceType::Tablet,
        is_touch: is_touch_device(user_agent),
        hardware_concurrency: None,
        max_touch_points: None,
        memory: None,
        vendor: None,
        renderer: None,
    };

    if let Some(technical) = facts.technical_data.as_ref() {
        device.hardware_concurrency = json::get_u32(technical, "hardwareConcurrency");
        device.max_touch_points = json::get_u32(technical, "maxTouchPoints");
        device.memory = json::get_f64(technical, "deviceMemory");
        device.vendor = json::get_string(technical, "vendor");
        device.renderer = json::get_string(technical, "renderer");
    }

    Ok(Some(device))
}
