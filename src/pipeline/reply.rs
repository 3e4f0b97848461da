//! Reply text sent back to the chat.

use crate::classify::DetectedObject;

/// Sent when a photo is accepted and stored.
pub const ACCEPTED_TEXT: &str = "Thanks! Your photo passed the content check and has been saved.";

/// Sent when the safety screen rejects a photo.
pub const REJECTED_TEXT: &str =
    "Sorry, this photo was flagged as explicit content and was not saved.";

/// Sent when a delivery is aborted after the chat is known.
pub const FAILURE_TEXT: &str = "Sorry, I couldn't process your photo.";

/// Entries listed per line before truncating.
const MAX_LISTED: usize = 3;

/// Build the acceptance reply with object and brand summaries.
pub fn compose_reply(objects: &[DetectedObject], brands: &[String]) -> String {
    let mut reply = ACCEPTED_TEXT.to_string();

    if !objects.is_empty() {
        let labels: Vec<String> = objects
            .iter()
            .map(|o| format!("{} ({}%)", o.label, percent(o.confidence)))
            .collect();
        reply.push_str("\n\nDetected objects: ");
        reply.push_str(&truncated_list(&labels));
    }

    if !brands.is_empty() {
        reply.push_str(if objects.is_empty() { "\n\n" } else { "\n" });
        reply.push_str("Recognized brands: ");
        reply.push_str(&truncated_list(brands));
    }

    reply
}

fn percent(confidence: f64) -> u32 {
    (confidence * 100.0).round().clamp(0.0, 100.0) as u32
}

/// First `MAX_LISTED` entries joined, with a "+N more" suffix.
fn truncated_list(items: &[String]) -> String {
    let shown = items[..items.len().min(MAX_LISTED)].join(", ");
    match items.len().saturating_sub(MAX_LISTED) {
        0 => shown,
        hidden => format!("{shown} +{hidden} more"),
    }
}
