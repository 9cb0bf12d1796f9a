use serde::Serialize;
use utoipa::ToSchema;

use crate::{dao::kv_store::PersistedSession, dto::format_time};

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status (always "ok" while the process serves requests).
    pub status: String,
    /// Session keys left behind by a previous run that was never reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovered_session: Option<RecoveredSession>,
}

/// Previous run's persisted session keys.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecoveredSession {
    /// Stored `playerEmail`.
    pub email: String,
    /// Stored `gameStartTime`, RFC 3339.
    pub started_at: Option<String>,
}

impl From<&PersistedSession> for RecoveredSession {
    fn from(value: &PersistedSession) -> Self {
        Self {
            email: value.email.clone(),
            started_at: value.start_time.map(format_time),
        }
    }
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(recovered: Option<&PersistedSession>) -> Self {
        Self {
            status: "ok".to_string(),
            recovered_session: recovered.map(Into::into),
        }
    }
}
