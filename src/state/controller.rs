//! Game phase controller: the only code allowed to mutate a [`GameSession`].
//!
//! Every operation is synchronous and runs under the shared controller lock, so
//! the end-of-game guard (`GameSession::ended`) is enough to keep the timer and
//! the completion check from both producing a result.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    services::scoring::{ResultsSummary, weighted_score},
    state::{
        countdown::Tick,
        game::{Catalog, FinishReason, GameSession, Item},
        state_machine::{GameEvent, GamePhase, GameStateMachine, InvalidTransition, Snapshot},
    },
};

/// Why an email was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmailError {
    /// Nothing but whitespace was entered.
    #[error("Email address is required")]
    Missing,
    /// The address does not look like `local@domain.tld`.
    #[error("Please enter a valid email address")]
    Malformed,
}

/// Check that `email` has the `local@domain.tld` shape.
///
/// Whitespace is not allowed anywhere, there must be exactly one `@` with a
/// non-empty local part, and the domain must contain a dot that is neither its
/// first nor its last character.
pub fn check_email(email: &str) -> Result<(), EmailError> {
    if email.trim().is_empty() {
        return Err(EmailError::Missing);
    }
    if email.chars().any(char::is_whitespace) {
        return Err(EmailError::Malformed);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(EmailError::Malformed);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(EmailError::Malformed);
    }

    let inner_dot = domain
        .char_indices()
        .any(|(index, c)| c == '.' && index > 0 && index + 1 < domain.len());
    if !inner_dot {
        return Err(EmailError::Malformed);
    }

    Ok(())
}

/// Errors returned by controller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The submitted email was refused.
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),
    /// The operation is not allowed in the current phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// A drop arrived while no game was being played.
    #[error("items can only be dropped while playing (current phase {0:?})")]
    NotPlaying(GamePhase),
}

/// Drop gesture validated at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    /// Item being dropped.
    pub item_id: u32,
    /// Category of the bucket it was dropped on.
    pub category: String,
}

/// Why a drop did not produce a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRejection {
    /// The item already has a placement.
    AlreadyPlaced,
    /// No item with this id exists in the catalog.
    UnknownItem,
    /// No bucket with this category exists in the catalog.
    UnknownCategory,
}

/// Outcome of a drop while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropOutcome {
    /// Session the drop applied to.
    pub session_id: Uuid,
    /// Whether a placement was recorded.
    pub accepted: bool,
    /// Whether the recorded placement was correct.
    pub is_correct: bool,
    /// Reason a drop was ignored.
    pub rejection: Option<DropRejection>,
    /// Whether this drop placed the last item.
    pub completed: bool,
}

/// Data captured when the player enters the playing phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSession {
    /// Identifier carried by deferred work for this session.
    pub id: Uuid,
    /// Email of the player.
    pub email: String,
    /// When the countdown started.
    pub start_time: OffsetDateTime,
}

/// Data captured by the single transition into results.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSession {
    /// Session that ended.
    pub id: Uuid,
    /// Email the score is submitted for.
    pub email: String,
    /// What ended the session.
    pub reason: FinishReason,
    /// Weighted 0-10 score.
    pub final_score: f64,
    /// Breakdown for the results view.
    pub summary: ResultsSummary,
    /// When results were entered.
    pub end_time: OffsetDateTime,
}

/// Outcome of a countdown tick delivered to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The tick belonged to another session or the countdown is frozen.
    Stale,
    /// One second elapsed; carries the seconds left.
    Running(u32),
    /// The countdown expired. Carries the finished session when this tick ended it.
    Expired(Option<FinishedSession>),
}

/// Sequences email entry, play and results for one session at a time.
#[derive(Debug)]
pub struct GameController {
    catalog: Arc<Catalog>,
    duration_secs: u32,
    machine: GameStateMachine,
    session: GameSession,
}

impl GameController {
    /// Controller in the email phase with a countdown of `duration_secs`.
    pub fn new(catalog: Arc<Catalog>, duration_secs: u32) -> Self {
        Self {
            catalog,
            duration_secs,
            machine: GameStateMachine::new(),
            session: GameSession::new(duration_secs),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Phase and transition counter.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Item and bucket set.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Configured countdown length.
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Items that have not been placed yet, in catalog order.
    pub fn unplaced_items(&self) -> Vec<&Item> {
        self.catalog
            .items()
            .filter(|item| !self.session.ledger.contains(item.id))
            .collect()
    }

    /// Accept the player's email and start playing.
    pub fn start(
        &mut self,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<StartedSession, ControllerError> {
        self.machine.can_apply(GameEvent::EmailAccepted)?;
        check_email(email)?;
        self.machine.apply(GameEvent::EmailAccepted)?;

        let id = Uuid::new_v4();
        let email = email.to_string();
        self.session = GameSession::new(self.duration_secs);
        self.session.id = Some(id);
        self.session.email = Some(email.clone());
        self.session.start_time = Some(now);

        debug!(session_id = %id, "session started");
        Ok(StartedSession {
            id,
            email,
            start_time: now,
        })
    }

    /// Route a drop through the placement ledger.
    pub fn place(&mut self, drop: &DropEvent) -> Result<DropOutcome, ControllerError> {
        let phase = self.phase();
        let session_id = match (phase, self.session.id) {
            (GamePhase::Playing, Some(id)) if !self.session.ended => id,
            _ => return Err(ControllerError::NotPlaying(phase)),
        };

        let rejected = |reason| DropOutcome {
            session_id,
            accepted: false,
            is_correct: false,
            rejection: Some(reason),
            completed: false,
        };

        let Some(item) = self.catalog.item(drop.item_id) else {
            warn!(item_id = drop.item_id, "ignoring drop of unknown item");
            return Ok(rejected(DropRejection::UnknownItem));
        };
        if !self.catalog.has_bucket(&drop.category) {
            warn!(category = %drop.category, "ignoring drop on unknown bucket");
            return Ok(rejected(DropRejection::UnknownCategory));
        }

        let outcome = self.session.ledger.place(item, &drop.category);
        if !outcome.accepted {
            debug!(item_id = drop.item_id, "item already placed; drop ignored");
            return Ok(rejected(DropRejection::AlreadyPlaced));
        }
        if outcome.is_correct {
            self.session.score += 1;
        }

        let completed = self.session.ledger.is_complete(self.catalog.len());
        if completed {
            // Freeze the clock so the score uses the time left at the last drop.
            self.session.countdown.stop();
        }

        Ok(DropOutcome {
            session_id,
            accepted: true,
            is_correct: outcome.is_correct,
            rejection: None,
            completed,
        })
    }

    /// Deliver one countdown second for `session_id`.
    pub fn tick(&mut self, session_id: Uuid, now: OffsetDateTime) -> TickOutcome {
        if !self.is_live(session_id) {
            return TickOutcome::Stale;
        }

        match self.session.countdown.tick() {
            Tick::Running(remaining) => TickOutcome::Running(remaining),
            Tick::Expired => TickOutcome::Expired(self.finish(
                FinishReason::TimeUp,
                session_id,
                now,
            )),
            Tick::Inert => TickOutcome::Stale,
        }
    }

    /// Enter results for `session_id`, computing the final score.
    ///
    /// Returns `None` when the session already ended or is not the current one,
    /// so only the first of several triggers is acted upon.
    pub fn finish(
        &mut self,
        reason: FinishReason,
        session_id: Uuid,
        now: OffsetDateTime,
    ) -> Option<FinishedSession> {
        if !self.is_live(session_id) {
            debug!(%session_id, ?reason, "session already ended; ignoring trigger");
            return None;
        }
        let email = self.session.email.clone()?;
        self.machine.apply(GameEvent::Finish(reason)).ok()?;

        let correct = self.session.correct_count();
        let remaining = self.session.time_remaining();
        let total = self.catalog.len();
        let final_score = weighted_score(correct, remaining, total, self.duration_secs);
        let summary = ResultsSummary::new(correct, remaining, total, self.duration_secs);

        self.session.ended = true;
        self.session.countdown.stop();
        self.session.final_score = Some(final_score);
        self.session.finish_reason = Some(reason);
        self.session.end_time = Some(now);

        Some(FinishedSession {
            id: session_id,
            email,
            reason,
            final_score,
            summary,
            end_time: now,
        })
    }

    /// Return to the email phase with first-load defaults.
    pub fn reset(&mut self) -> Result<(), ControllerError> {
        self.machine.apply(GameEvent::Reset)?;
        self.session = GameSession::new(self.duration_secs);
        Ok(())
    }

    /// Reset only if `session_id` is still showing its results.
    pub fn reset_if_current(&mut self, session_id: Uuid) -> bool {
        if self.phase() != GamePhase::Results || self.session.id != Some(session_id) {
            return false;
        }
        self.reset().is_ok()
    }

    /// Summary of the finished session, if results are showing.
    pub fn results_summary(&self) -> Option<ResultsSummary> {
        if self.phase() != GamePhase::Results {
            return None;
        }
        Some(ResultsSummary::new(
            self.session.correct_count(),
            self.session.time_remaining(),
            self.catalog.len(),
            self.duration_secs,
        ))
    }

    fn is_live(&self, session_id: Uuid) -> bool {
        self.phase() == GamePhase::Playing
            && self.session.id == Some(session_id)
            && !self.session.ended
    }
}
