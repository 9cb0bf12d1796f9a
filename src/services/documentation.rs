use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the bucket sorting backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::event_stream,
        crate::routes::game::catalog,
        crate::routes::game::session,
        crate::routes::game::submit_email,
        crate::routes::game::drop_item,
        crate::routes::game::reset,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::RecoveredSession,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::phase::VisibleFinishReason,
            crate::dto::session::EmailRequest,
            crate::dto::session::DropRequest,
            crate::dto::session::DropResponse,
            crate::dto::session::VisibleDropRejection,
            crate::dto::session::CatalogResponse,
            crate::dto::session::SessionSnapshot,
            crate::dto::session::ResultsView,
            crate::dto::session::SubmissionStatusView,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::TickEvent,
            crate::dto::sse::PlacementEvent,
            crate::dto::sse::ResultsEvent,
            crate::dto::sse::SubmissionEvent,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "game", description = "Email entry, drops, results and reset"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_session_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse/events",
            "/catalog",
            "/session",
            "/session/email",
            "/session/drop",
            "/session/reset",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
