use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::session::{ResultsView, SessionSnapshot, SubmissionSummary};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialised payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the session phase changes.
pub struct PhaseChangedEvent(pub SessionSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast every countdown second.
pub struct TickEvent {
    /// Seconds left.
    pub time_remaining: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a drop was recorded.
pub struct PlacementEvent {
    /// Item that was placed.
    pub item_id: u32,
    /// Bucket it landed in.
    pub category: String,
    /// Whether it was the right bucket.
    pub is_correct: bool,
    /// Running score after this placement.
    pub score: u32,
    /// Number of placements so far.
    pub placed_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast once when results are entered.
pub struct ResultsEvent(pub ResultsView);

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when a result submission finished.
pub struct SubmissionEvent(pub SubmissionSummary);
