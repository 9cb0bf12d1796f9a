use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{
        format_time,
        phase::{VisibleFinishReason, VisibleGamePhase},
        validation::validate_email,
    },
    services::{
        scoring::{Performance, ResultsSummary},
        submission::{SubmissionOutcome, SubmissionRecord, SubmissionStatus},
    },
    state::{
        controller::{DropEvent, DropOutcome, DropRejection, GameController},
        game::{Bucket, Catalog, Item, Placement},
    },
};

/// Email form submission starting a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EmailRequest {
    /// Player email in `local@domain.tld` form.
    #[validate(custom(function = "validate_email"))]
    pub email: String,
}

/// Drop gesture reported by the front-end.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DropRequest {
    /// Identifier of the dragged item.
    pub item_id: u32,
    /// Category of the bucket it was released over.
    #[validate(length(min = 1))]
    pub category: String,
}

impl From<DropRequest> for DropEvent {
    fn from(value: DropRequest) -> Self {
        Self {
            item_id: value.item_id,
            category: value.category,
        }
    }
}

/// Why a drop was ignored.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleDropRejection {
    /// The item already sits in a bucket.
    AlreadyPlaced,
    /// The item id is not part of the catalog.
    UnknownItem,
    /// The bucket category is not part of the catalog.
    UnknownCategory,
}

impl From<DropRejection> for VisibleDropRejection {
    fn from(value: DropRejection) -> Self {
        match value {
            DropRejection::AlreadyPlaced => VisibleDropRejection::AlreadyPlaced,
            DropRejection::UnknownItem => VisibleDropRejection::UnknownItem,
            DropRejection::UnknownCategory => VisibleDropRejection::UnknownCategory,
        }
    }
}

/// Answer to a drop.
#[derive(Debug, Serialize, ToSchema)]
pub struct DropResponse {
    /// Whether a placement was recorded.
    pub accepted: bool,
    /// Whether the placement was correct.
    pub is_correct: bool,
    /// Reason the drop was ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<VisibleDropRejection>,
    /// Whether every item is now placed; results follow shortly.
    pub completed: bool,
}

impl From<DropOutcome> for DropResponse {
    fn from(value: DropOutcome) -> Self {
        Self {
            accepted: value.accepted,
            is_correct: value.is_correct,
            rejection: value.rejection.map(Into::into),
            completed: value.completed,
        }
    }
}

/// Draggable item as shown to the player.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ItemSummary {
    /// Identifier to send back on drop.
    pub id: u32,
    /// Text on the bubble.
    pub label: String,
}

impl From<&Item> for ItemSummary {
    fn from(value: &Item) -> Self {
        Self {
            id: value.id,
            label: value.label.clone(),
        }
    }
}

/// Drop target.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct BucketSummary {
    /// Category label to send back on drop.
    pub category: String,
}

impl From<&Bucket> for BucketSummary {
    fn from(value: &Bucket) -> Self {
        Self {
            category: value.category.clone(),
        }
    }
}

/// Recorded placement.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PlacementSummary {
    /// Item that was dropped.
    pub item_id: u32,
    /// Bucket it was dropped into.
    pub placed_category: String,
    /// Whether that was the right bucket.
    pub is_correct: bool,
}

impl From<&Placement> for PlacementSummary {
    fn from(value: &Placement) -> Self {
        Self {
            item_id: value.item_id,
            placed_category: value.placed_category.clone(),
            is_correct: value.is_correct,
        }
    }
}

/// Items and buckets of every session.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    /// All items in display order.
    pub items: Vec<ItemSummary>,
    /// All buckets in display order.
    pub buckets: Vec<BucketSummary>,
    /// Countdown length in seconds.
    pub session_duration: u32,
}

impl CatalogResponse {
    /// Describe `catalog` for a countdown of `session_duration` seconds.
    pub fn new(catalog: &Catalog, session_duration: u32) -> Self {
        Self {
            items: catalog.items().map(Into::into).collect(),
            buckets: catalog.buckets().iter().map(Into::into).collect(),
            session_duration,
        }
    }
}

/// Performance tier shown on the results screen.
#[derive(Debug, Serialize, ToSchema, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePerformance {
    /// 90% accuracy or more.
    Outstanding,
    /// 75% accuracy or more.
    Great,
    /// 60% accuracy or more.
    Good,
    /// Below 60% accuracy.
    KeepPracticing,
}

impl From<Performance> for VisiblePerformance {
    fn from(value: Performance) -> Self {
        match value {
            Performance::Outstanding => VisiblePerformance::Outstanding,
            Performance::Great => VisiblePerformance::Great,
            Performance::Good => VisiblePerformance::Good,
            Performance::KeepPracticing => VisiblePerformance::KeepPracticing,
        }
    }
}

/// Results screen content.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ResultsView {
    /// Weighted 0-10 score.
    pub final_score: f64,
    /// Correct placements.
    pub correct: u32,
    /// Items not placed correctly.
    pub incorrect: u32,
    /// Accuracy percentage.
    pub accuracy_percent: u32,
    /// Seconds left when the session ended.
    pub time_remaining: u32,
    /// Performance tier.
    pub performance: VisiblePerformance,
    /// Message for the tier.
    pub message: String,
}

impl From<ResultsSummary> for ResultsView {
    fn from(value: ResultsSummary) -> Self {
        Self {
            final_score: value.final_score,
            correct: value.correct,
            incorrect: value.incorrect,
            accuracy_percent: value.accuracy_percent,
            time_remaining: value.time_remaining_secs,
            performance: value.performance.into(),
            message: value.performance.message().to_string(),
        }
    }
}

/// Latest submission attempt.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct SubmissionSummary {
    /// Email that was submitted.
    pub email: String,
    /// Score that was submitted.
    pub score: f64,
    /// When the attempt finished, RFC 3339.
    pub timestamp: String,
    /// `success` or `error`.
    pub status: String,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SubmissionRecord> for SubmissionSummary {
    fn from(value: SubmissionRecord) -> Self {
        Self {
            email: value.email,
            score: value.score,
            timestamp: format_time(value.timestamp),
            status: match value.outcome {
                SubmissionOutcome::Success => "success",
                SubmissionOutcome::Error => "error",
            }
            .to_string(),
            error: value.error,
        }
    }
}

/// Submission state for optional UI feedback.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct SubmissionStatusView {
    /// A submission is in flight.
    pub is_submitting: bool,
    /// Last failure message.
    pub error: Option<String>,
    /// Latest finished attempt.
    pub last_submission: Option<SubmissionSummary>,
}

impl From<SubmissionStatus> for SubmissionStatusView {
    fn from(value: SubmissionStatus) -> Self {
        Self {
            is_submitting: value.is_submitting,
            error: value.error,
            last_submission: value.last_submission.map(Into::into),
        }
    }
}

/// Full view of the current session.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct SessionSnapshot {
    /// Current phase.
    pub phase: VisibleGamePhase,
    /// Transition counter.
    pub version: usize,
    /// Player email once entered.
    pub email: Option<String>,
    /// Start of play, RFC 3339.
    pub started_at: Option<String>,
    /// Entry into results, RFC 3339.
    pub ended_at: Option<String>,
    /// Seconds left on the countdown.
    pub time_remaining: u32,
    /// Countdown length in seconds.
    pub session_duration: u32,
    /// Running score (one point per correct placement).
    pub score: u32,
    /// Correct placements so far.
    pub correct_count: u32,
    /// Placements so far.
    pub placed_count: usize,
    /// Items in the catalog.
    pub total_items: usize,
    /// Items still waiting to be placed.
    pub items: Vec<ItemSummary>,
    /// Drop targets.
    pub buckets: Vec<BucketSummary>,
    /// Placements in drop order.
    pub placements: Vec<PlacementSummary>,
    /// Weighted score once results are showing.
    pub final_score: Option<f64>,
    /// What ended the session.
    pub finish_reason: Option<VisibleFinishReason>,
    /// Results breakdown once results are showing.
    pub results: Option<ResultsView>,
    /// Result submission state.
    pub submission: SubmissionStatusView,
}

impl SessionSnapshot {
    /// Capture the controller state alongside the submission status.
    pub fn capture(controller: &GameController, submission: SubmissionStatus) -> Self {
        let session = controller.session();
        let snapshot = controller.snapshot();
        Self {
            phase: snapshot.phase.into(),
            version: snapshot.version,
            email: session.email.clone(),
            started_at: session.start_time.map(format_time),
            ended_at: session.end_time.map(format_time),
            time_remaining: session.time_remaining(),
            session_duration: controller.duration_secs(),
            score: session.score,
            correct_count: session.correct_count(),
            placed_count: session.ledger.len(),
            total_items: controller.catalog().len(),
            items: controller
                .unplaced_items()
                .into_iter()
                .map(Into::into)
                .collect(),
            buckets: controller
                .catalog()
                .buckets()
                .iter()
                .map(Into::into)
                .collect(),
            placements: session.ledger.placements().map(Into::into).collect(),
            final_score: session.final_score,
            finish_reason: session.finish_reason.map(Into::into),
            results: controller.results_summary().map(Into::into),
            submission: submission.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::OffsetDateTime;

    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn snapshot_hides_placed_items() {
        let catalog = Arc::new(AppConfig::default().catalog);
        let mut controller = GameController::new(catalog, 180);
        controller
            .start("a@b.com", OffsetDateTime::UNIX_EPOCH)
            .unwrap();
        controller
            .place(&DropEvent {
                item_id: 1,
                category: "GROWTH".into(),
            })
            .unwrap();

        let snapshot = SessionSnapshot::capture(&controller, SubmissionStatus::default());
        assert_eq!(snapshot.phase, VisibleGamePhase::Game);
        assert_eq!(snapshot.items.len(), 5);
        assert!(snapshot.items.iter().all(|item| item.id != 1));
        assert_eq!(snapshot.placed_count, 1);
        assert_eq!(snapshot.correct_count, 1);
        assert_eq!(snapshot.started_at.as_deref(), Some("1970-01-01T00:00:00Z"));
        assert!(snapshot.results.is_none());
    }

    #[test]
    fn drop_request_rejects_empty_category() {
        let request = DropRequest {
            item_id: 1,
            category: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn email_request_uses_email_rules() {
        let valid = EmailRequest {
            email: "a@b.com".into(),
        };
        assert!(valid.validate().is_ok());
        let invalid = EmailRequest {
            email: "a@b".into(),
        };
        assert!(invalid.validate().is_err());
    }
}
