//! Screen Extraction
//!
//! Reads the `screen` object out of the client-submitted technical blob.
//! No blob or no screen object means no facet.

use super::{json, ExtractError};
use crate::facts::RequestFacts;
use crate::record::ScreenInfo;

pub(super) async fn extract(facts: &RequestFacts) -> Result<Option<ScreenInfo>, ExtractError> {
    let screen = match facts.technical_data.as_ref().and_then(|t| t.get("screen")) {
        Some(screen) if screen.is_object() => screen,
        _ => return Ok(None),
    };

    Ok(Some(ScreenInfo {
        width: json::get_u32(screen, "width"),
        height: json::get_u32(screen, "height"),
        color_depth: json::get_u32(screen, "colorDepth"),
        pixel_ratio: json::get_f64(screen, "pixelRatio"),
        available_width: json::get_u32(screen, "availWidth"),
        available_height: json::get_u32(screen, "availHeight"),
        orientation: json::get_string(screen, "orientation"),
        inner_width: json::get_u32(screen, "innerWidth"),
        inner_height: json::get_u32(screen, "innerHeight"),
    }))
}
