//! Orchestration around the game controller: timers, persistence, submission
//! and event fan-out. The controller lock is held for the synchronous state
//! change and, on reset, while the previous session's traces are removed.
//! Deferred work is tagged with its session id or the reset version so it
//! cannot touch a newer session.

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::kv_store,
    dto::session::{CatalogResponse, SessionSnapshot},
    error::ServiceError,
    services::{countdown_service, sse_events},
    state::{
        SharedState,
        controller::{DropEvent, DropOutcome, FinishedSession},
        game::FinishReason,
    },
};

/// Accept the player's email and start the countdown.
pub async fn start_session(
    state: &SharedState,
    email: &str,
) -> Result<SessionSnapshot, ServiceError> {
    let started = {
        let mut controller = state.controller().await;
        let started = controller.start(email, OffsetDateTime::now_utc())?;
        // Before any drop can finish the session.
        state.submissions().begin(started.id).await;
        started
    };
    info!(session_id = %started.id, "player entered the game");

    countdown_service::start(state, started.id).await;
    kv_store::persist_session(state.store(), &started.email, started.start_time).await;

    let snapshot = session_snapshot(state).await;
    sse_events::broadcast_phase_changed(state, &snapshot);
    Ok(snapshot)
}

/// Route a drop to the placement ledger, scheduling results when it completes the set.
pub async fn drop_item(state: &SharedState, drop: DropEvent) -> Result<DropOutcome, ServiceError> {
    let (outcome, score, placed_count) = {
        let mut controller = state.controller().await;
        let outcome = controller.place(&drop)?;
        let session = controller.session();
        (outcome, session.score, session.ledger.len())
    };

    if outcome.accepted {
        sse_events::broadcast_placement(state, &drop, outcome.is_correct, score, placed_count);
    }

    if outcome.completed {
        info!(session_id = %outcome.session_id, "all items placed");
        schedule_completion(state, outcome.session_id).await;
    }

    Ok(outcome)
}

async fn schedule_completion(state: &SharedState, session_id: Uuid) {
    let delay = state.settings().completion_delay;
    if delay.is_zero() {
        finish_session(state, FinishReason::AllPlaced, session_id).await;
        return;
    }

    let state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        finish_session(&state, FinishReason::AllPlaced, session_id).await;
    });
}

/// Enter results for `session_id` unless another trigger already did.
///
/// Returns whether this call performed the transition.
pub async fn finish_session(state: &SharedState, reason: FinishReason, session_id: Uuid) -> bool {
    let finished = {
        let mut controller = state.controller().await;
        controller.finish(reason, session_id, OffsetDateTime::now_utc())
    };

    match finished {
        Some(finished) => {
            complete_session(state, finished).await;
            true
        }
        None => false,
    }
}

/// Wrap up a session that just entered results.
///
/// Stops the countdown, publishes the results, submits the score in the
/// background and arms the automatic reset.
pub async fn complete_session(state: &SharedState, finished: FinishedSession) {
    countdown_service::stop_for(state, finished.id).await;
    info!(
        session_id = %finished.id,
        reason = ?finished.reason,
        score = finished.final_score,
        "session finished"
    );

    let snapshot = session_snapshot(state).await;
    sse_events::broadcast_phase_changed(state, &snapshot);
    sse_events::broadcast_results(state, finished.summary);

    let submit_state = state.clone();
    let session_id = finished.id;
    let email = finished.email.clone();
    let score = finished.final_score;
    tokio::spawn(async move {
        let record = submit_state
            .submissions()
            .submit(session_id, &email, score)
            .await;
        let current = submit_state.controller().await.session().id == Some(session_id);
        if current {
            sse_events::broadcast_submission(&submit_state, record);
        }
    });

    if let Some(delay) = state.settings().results_auto_reset {
        let state = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let version = {
                let mut controller = state.controller().await;
                controller
                    .reset_if_current(session_id)
                    .then(|| controller.snapshot().version)
            };
            if let Some(version) = version {
                debug!(%session_id, "results shown long enough; resetting");
                after_reset(&state, Some(session_id), version).await;
            }
        });
    }
}

/// Play again: back to email entry with every trace of the last session removed.
pub async fn reset_session(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    let (previous, version) = {
        let mut controller = state.controller().await;
        let previous = controller.session().id;
        controller.reset()?;
        (previous, controller.snapshot().version)
    };
    Ok(after_reset(state, previous, version).await)
}

/// Remove the traces of `previous` left after the reset that produced `version`.
async fn after_reset(
    state: &SharedState,
    previous: Option<Uuid>,
    version: usize,
) -> SessionSnapshot {
    if let Some(previous) = previous {
        countdown_service::stop_for(state, previous).await;
    }

    {
        // Held so a session started in the meantime cannot lose its keys.
        let controller = state.controller().await;
        if controller.snapshot().version == version {
            kv_store::clear_session(state.store()).await;
            state.submissions().reset().await;
        } else {
            debug!(?previous, "a new session already started; keeping its state");
        }
    }

    let snapshot = session_snapshot(state).await;
    sse_events::broadcast_phase_changed(state, &snapshot);
    snapshot
}

/// Current session view.
pub async fn session_snapshot(state: &SharedState) -> SessionSnapshot {
    let submission = state.submission_status().await;
    let controller = state.controller().await;
    SessionSnapshot::capture(&controller, submission)
}

/// Items and buckets served to every session.
pub async fn catalog(state: &SharedState) -> CatalogResponse {
    let controller = state.controller().await;
    CatalogResponse::new(controller.catalog(), controller.duration_secs())
}
