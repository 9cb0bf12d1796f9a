use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        session::SessionSnapshot,
        sse::{
            PhaseChangedEvent, PlacementEvent, ResultsEvent, ServerEvent, SubmissionEvent,
            TickEvent,
        },
    },
    services::{scoring::ResultsSummary, submission::SubmissionRecord},
    state::{SharedState, controller::DropEvent},
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_TICK: &str = "tick";
const EVENT_PLACEMENT: &str = "placement";
const EVENT_RESULTS: &str = "results";
const EVENT_SUBMISSION: &str = "submission";

/// Broadcast the session view after a phase change.
pub fn broadcast_phase_changed(state: &SharedState, snapshot: &SessionSnapshot) {
    let payload = PhaseChangedEvent(snapshot.clone());
    send_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast the countdown value.
pub fn broadcast_tick(state: &SharedState, time_remaining: u32) {
    send_event(state, EVENT_TICK, &TickEvent { time_remaining });
}

/// Broadcast an accepted placement along with the running score.
pub fn broadcast_placement(
    state: &SharedState,
    drop: &DropEvent,
    is_correct: bool,
    score: u32,
    placed_count: usize,
) {
    let payload = PlacementEvent {
        item_id: drop.item_id,
        category: drop.category.clone(),
        is_correct,
        score,
        placed_count,
    };
    send_event(state, EVENT_PLACEMENT, &payload);
}

/// Broadcast the results breakdown.
pub fn broadcast_results(state: &SharedState, summary: ResultsSummary) {
    send_event(state, EVENT_RESULTS, &ResultsEvent(summary.into()));
}

/// Broadcast the outcome of a result submission.
pub fn broadcast_submission(state: &SharedState, record: SubmissionRecord) {
    send_event(state, EVENT_SUBMISSION, &SubmissionEvent(record.into()));
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::kv_store::MemoryKvStore,
        services::submission::{SubmissionClient, WebhookSink},
        state::AppState,
    };

    fn state() -> SharedState {
        let config = AppConfig::default();
        let sink = WebhookSink::new("http://127.0.0.1:9/", config.webhook.timeout).unwrap();
        let submissions = SubmissionClient::new(Arc::new(sink), config.webhook.template.clone());
        AppState::new(config, Arc::new(MemoryKvStore::new()), submissions, None)
    }

    #[tokio::test]
    async fn tick_and_placement_are_named() {
        let state = state();
        let mut receiver = state.sse().subscribe();

        broadcast_tick(&state, 42);
        let drop = DropEvent {
            item_id: 3,
            category: "ADVERTISING".into(),
        };
        broadcast_placement(&state, &drop, true, 1, 1);

        let tick = receiver.recv().await.unwrap();
        assert_eq!(tick.event.as_deref(), Some(EVENT_TICK));
        assert_eq!(tick.data, r#"{"time_remaining":42}"#);

        let placement = receiver.recv().await.unwrap();
        assert_eq!(placement.event.as_deref(), Some(EVENT_PLACEMENT));
        let body: serde_json::Value = serde_json::from_str(&placement.data).unwrap();
        assert_eq!(body["item_id"], 3);
        assert_eq!(body["category"], "ADVERTISING");
        assert_eq!(body["is_correct"], true);
    }

    #[tokio::test]
    async fn results_carry_the_message() {
        let state = state();
        let mut receiver = state.sse().subscribe();

        broadcast_results(&state, ResultsSummary::new(6, 90, 6, 180));

        let results = receiver.recv().await.unwrap();
        assert_eq!(results.event.as_deref(), Some(EVENT_RESULTS));
        let body: serde_json::Value = serde_json::from_str(&results.data).unwrap();
        assert_eq!(body["final_score"], 7.5);
        assert_eq!(body["performance"], "outstanding");
        assert_eq!(body["message"], "Outstanding Performance!");
    }
}
