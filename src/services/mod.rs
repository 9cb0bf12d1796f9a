/// Countdown task driving the playing phase.
pub mod countdown_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Session orchestration: start, drops, results and reset.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Weighted score and results breakdown.
pub mod scoring;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Result submission to the webhook.
pub mod submission;
