//! Pipeline output types.

use uuid::Uuid;

/// How a webhook delivery ended, short of an aborting error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The update carried no photo; nothing was done.
    NoPhoto,
    /// The safety screen flagged the photo; nothing was stored.
    Rejected,
    /// The photo was enriched and stored.
    Accepted {
        record_id: Uuid,
        objects_detected: usize,
        brands_recognized: usize,
    },
}

impl WebhookOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoPhoto => "no_photo",
            Self::Rejected => "rejected",
            Self::Accepted { .. } => "accepted",
        }
    }
}
