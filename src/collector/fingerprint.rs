//! Fingerprint Extraction
//!
//! Passes client-side fingerprint signals through from the technical blob
//! without interpretation. The WebRTC entry keeps its raw JSON shape.

use super::{json, ExtractError};
use crate::facts::RequestFacts;
use crate::record::TechnicalFingerprint;

pub(super) async fn extract(
    facts: &RequestFacts,
) -> Result<Option<TechnicalFingerprint>, ExtractError> {
    let technical = match facts.technical_data.as_ref() {
        Some(technical) => technical,
        None => return Ok(None),
    };

    Ok(Some(TechnicalFingerprint {
        canvas_fingerprint: json::get_string(technical, "canvasFingerprint"),
        webgl_fingerprint: json::get_string(technical, "webglFingerprint"),
        audio_fingerprint: json::get_string(technical, "audioFingerprint"),
        font_fingerprint: json::get_string_vec(technical, "fontFingerprint"),
        timezone_fingerprint: json::get_string(technical, "timezoneFingerprint"),
        plugin_fingerprint: json::get_string_vec(technical, "pluginFingerprint"),
        webrtc_fingerprint: technical.get("webrtcFingerprint").cloned(),
        local_storage_enabled: json::get_bool(technical, "localStorageEnabled"),
        session_storage_enabled: json::get_bool(technical, "sessionStorageEnabled"),
        indexed_db_enabled: json::get_bool(technical, "indexedDbEnabled"),
        do_not_track: json::get_bool(technical, "doNotTrack"),
        ad_blocker_detected: json::get_bool(technical, "adBlockerDetected"),
    }))
}
