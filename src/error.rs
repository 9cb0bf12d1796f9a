use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::state::{controller::ControllerError, state_machine::InvalidTransition};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<ControllerError> for ServiceError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::InvalidEmail(email) => ServiceError::InvalidInput(email.to_string()),
            ControllerError::InvalidTransition(invalid) => invalid.into(),
            not_playing @ ControllerError::NotPlaying(_) => {
                ServiceError::InvalidState(not_playing.to_string())
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid ({})", error.code),
                })
            })
            .collect();

        if messages.is_empty() {
            AppError::BadRequest(format!("validation failed: {err}"))
        } else {
            AppError::BadRequest(messages.join("; "))
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };

        let (AppError::BadRequest(message) | AppError::Conflict(message)) = self;
        let payload = Json(ErrorBody { message });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        controller::EmailError,
        game::FinishReason,
        state_machine::{GameEvent, GamePhase},
    };

    #[test]
    fn controller_errors_map_to_http_statuses() {
        let bad_email: AppError =
            ServiceError::from(ControllerError::InvalidEmail(EmailError::Missing)).into();
        assert_eq!(bad_email.into_response().status(), StatusCode::BAD_REQUEST);

        let wrong_phase: AppError = ServiceError::from(ControllerError::InvalidTransition(
            InvalidTransition {
                from: GamePhase::Email,
                event: GameEvent::Finish(FinishReason::TimeUp),
            },
        ))
        .into();
        assert_eq!(wrong_phase.into_response().status(), StatusCode::CONFLICT);

        let not_playing: AppError =
            ServiceError::from(ControllerError::NotPlaying(GamePhase::Results)).into();
        assert_eq!(not_playing.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_email_body_carries_field_message() {
        use axum::body::to_bytes;
        use validator::Validate;

        use crate::dto::session::EmailRequest;

        let request = EmailRequest {
            email: "a@b".into(),
        };
        let err: AppError = request.validate().unwrap_err().into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Please enter a valid email address");
    }

    #[tokio::test]
    async fn conflict_body_has_no_prefix() {
        use axum::body::to_bytes;

        let response = AppError::Conflict("results are not showing".into()).into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "results are not showing");
    }

    #[test]
    fn email_message_is_preserved() {
        let err = ServiceError::from(ControllerError::InvalidEmail(EmailError::Malformed));
        assert_eq!(
            err.to_string(),
            "invalid input: Please enter a valid email address"
        );
    }
}
