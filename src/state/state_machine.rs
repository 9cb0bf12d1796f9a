use thiserror::Error;

use crate::state::game::FinishReason;

/// High-level phases a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the player to enter their email.
    Email,
    /// Countdown running; items can be dropped into buckets.
    Playing,
    /// Final score displayed until the session is reset.
    Results,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A valid email was submitted.
    EmailAccepted,
    /// Playing ended because every item was placed or time ran out.
    Finish(FinishReason),
    /// Player asked to play again.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// State machine sequencing email entry, play and results.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Email,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine waiting for an email.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Check whether `event` is legal from the current phase without applying it.
    pub fn can_apply(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        self.compute_transition(event)
    }

    /// Apply `event`, returning the phase after the transition.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Email, GameEvent::EmailAccepted) => GamePhase::Playing,
            (GamePhase::Playing, GameEvent::Finish(_)) => GamePhase::Results,
            (GamePhase::Results, GameEvent::Reset) => GamePhase::Email,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
