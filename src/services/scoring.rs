//! Weighted final score and the results breakdown derived from it.

/// Maximum points awarded by each half of the weighted score.
const COMPONENT_MAX: f64 = 5.0;

/// Blend accuracy and remaining time into a 0-10 score rounded to two decimals.
///
/// Half of the score comes from `correct_count / total_items`, the other half
/// from `time_remaining_secs / session_duration_secs`. A zero denominator
/// contributes nothing and ratios are clamped to `[0, 1]`.
pub fn weighted_score(
    correct_count: u32,
    time_remaining_secs: u32,
    total_items: usize,
    session_duration_secs: u32,
) -> f64 {
    let points = ratio(f64::from(correct_count), total_items as f64) * COMPONENT_MAX;
    let time = ratio(
        f64::from(time_remaining_secs),
        f64::from(session_duration_secs),
    ) * COMPONENT_MAX;
    round_to_cents(points + time)
}

fn ratio(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Performance tier shown alongside the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performance {
    /// Accuracy of 90% or more.
    Outstanding,
    /// Accuracy of 75% or more.
    Great,
    /// Accuracy of 60% or more.
    Good,
    /// Anything below.
    KeepPracticing,
}

impl Performance {
    /// Tier for an accuracy percentage.
    pub fn from_accuracy(accuracy_percent: u32) -> Self {
        if accuracy_percent >= 90 {
            Performance::Outstanding
        } else if accuracy_percent >= 75 {
            Performance::Great
        } else if accuracy_percent >= 60 {
            Performance::Good
        } else {
            Performance::KeepPracticing
        }
    }

    /// Message displayed to the player.
    pub fn message(self) -> &'static str {
        match self {
            Performance::Outstanding => "Outstanding Performance!",
            Performance::Great => "Great Job!",
            Performance::Good => "Good Effort!",
            Performance::KeepPracticing => "Keep Practicing!",
        }
    }
}

/// Breakdown of a finished session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultsSummary {
    /// Placements that matched their bucket.
    pub correct: u32,
    /// Items that were not placed correctly, including unplaced ones.
    pub incorrect: u32,
    /// Correct placements over total items, as a rounded percentage.
    pub accuracy_percent: u32,
    /// Seconds left when the session ended.
    pub time_remaining_secs: u32,
    /// Weighted 0-10 score.
    pub final_score: f64,
    /// Tier derived from the accuracy.
    pub performance: Performance,
}

impl ResultsSummary {
    /// Summarise a session that ended with the given counters.
    pub fn new(
        correct_count: u32,
        time_remaining_secs: u32,
        total_items: usize,
        session_duration_secs: u32,
    ) -> Self {
        let accuracy_percent =
            (ratio(f64::from(correct_count), total_items as f64) * 100.0).round() as u32;
        Self {
            correct: correct_count,
            incorrect: (total_items as u32).saturating_sub(correct_count),
            accuracy_percent,
            time_remaining_secs,
            final_score: weighted_score(
                correct_count,
                time_remaining_secs,
                total_items,
                session_duration_secs,
            ),
            performance: Performance::from_accuracy(accuracy_percent),
        }
    }
}
