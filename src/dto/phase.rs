use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{game::FinishReason, state_machine::GamePhase};

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for the player's email.
    Email,
    /// Countdown running, items can be dropped.
    Game,
    /// Final score displayed.
    Results,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Email => VisibleGamePhase::Email,
            GamePhase::Playing => VisibleGamePhase::Game,
            GamePhase::Results => VisibleGamePhase::Results,
        }
    }
}

/// What ended a session.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleFinishReason {
    /// Every item was placed.
    AllPlaced,
    /// The countdown expired.
    TimeUp,
}

impl From<FinishReason> for VisibleFinishReason {
    fn from(value: FinishReason) -> Self {
        match value {
            FinishReason::AllPlaced => VisibleFinishReason::AllPlaced,
            FinishReason::TimeUp => VisibleFinishReason::TimeUp,
        }
    }
}
