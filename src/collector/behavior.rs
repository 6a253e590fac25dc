//! Behavioral Extraction
//!
//! Summarizes the client-submitted event stream. Mouse-move and key-down
//! events under `recent` are counted separately; the interaction count is
//! their sum and is present whenever at least one event of either kind was
//! observed.

use super::{json, ExtractError};
use crate::facts::RequestFacts;
use crate::record::BehavioralSummary;

pub(super) async fn extract(
    facts: &RequestFacts,
) -> Result<Option<BehavioralSummary>, ExtractError> {
    let behavioral = match facts.behavioral_data.as_ref() {
        Some(behavioral) => behavioral,
        None => return Ok(None),
    };

    let (mouse_moves, key_downs) = match behavioral.get("recent").and_then(|r| r.as_array()) {
        Some(events) => {
            let count = |kind: &str| {
                events
                    .iter()
                    .filter(|e| e.get("type").and_then(|t| t.as_str()) == Some(kind))
                    .count()
            };
            (count("mousemove"), count("keydown"))
        }
        None => (0, 0),
    };

    let interaction_count = if mouse_moves > 0 || key_downs > 0 {
        Some(mouse_moves + key_downs)
    } else {
        None
    };

    Ok(Some(BehavioralSummary {
        mouse_moves,
        key_downs,
        interaction_count,
        time_on_page: json::get_f64(behavioral, "timeOnPage"),
        form_completion_time: json::get_f64(behavioral, "formCompletionTime"),
        page_load_time: json::get_f64(behavioral, "pageLoadTime"),
    }))
}
