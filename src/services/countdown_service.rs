use time::OffsetDateTime;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    services::{game_service, sse_events},
    state::{SharedState, controller::TickOutcome},
};

/// Start ticking for `session_id`, replacing any countdown still running.
pub async fn start(state: &SharedState, session_id: Uuid) {
    let period = state.settings().tick_interval;
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let outcome = task_state
                .controller()
                .await
                .tick(session_id, OffsetDateTime::now_utc());

            match outcome {
                TickOutcome::Running(remaining) => {
                    sse_events::broadcast_tick(&task_state, remaining);
                }
                TickOutcome::Expired(finished) => {
                    sse_events::broadcast_tick(&task_state, 0);
                    if let Some(finished) = finished {
                        info!(%session_id, "time is up");
                        // Hand off so that stopping the countdown cannot cancel the wrap-up.
                        let state = task_state.clone();
                        tokio::spawn(async move {
                            game_service::complete_session(&state, finished).await;
                        });
                    }
                    break;
                }
                TickOutcome::Stale => {
                    debug!(%session_id, "countdown no longer current; stopping");
                    break;
                }
            }
        }
    });

    if let Some((_, previous)) = state
        .countdown_task()
        .lock()
        .await
        .replace((session_id, handle))
    {
        previous.abort();
    }
}

/// Cancel the countdown of `session_id`. A countdown belonging to a newer
/// session is left running.
pub async fn stop_for(state: &SharedState, session_id: Uuid) {
    let mut slot = state.countdown_task().lock().await;
    if slot.as_ref().is_some_and(|(owner, _)| *owner == session_id) {
        if let Some((_, handle)) = slot.take() {
            handle.abort();
        }
    }
}
