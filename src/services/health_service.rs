use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness along with the session keys found at startup.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.recovered_session())
}
