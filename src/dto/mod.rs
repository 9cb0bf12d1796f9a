use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Health check payloads.
pub mod health;
/// Client-facing phase names.
pub mod phase;
/// Session request and response bodies.
pub mod session;
/// SSE event payloads.
pub mod sse;
/// Custom validators.
pub mod validation;

fn format_time(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
