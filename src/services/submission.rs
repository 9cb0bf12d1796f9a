//! Fire-and-forget delivery of final scores to the results webhook.
//!
//! Nothing in here propagates an error to the game flow: every failure ends up
//! in the logs and in [`SubmissionStatus`] for optional UI feedback.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Serialize, Serializer};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Fixed fields sent with every result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadTemplate {
    /// Identifier of the installation element the game runs on.
    pub element_id: String,
    /// Name of the game as known by the results collector.
    pub game_name: String,
    /// Venue the game is deployed at.
    pub location: String,
}

/// JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    /// Player email.
    pub email: String,
    /// See [`PayloadTemplate::element_id`].
    pub element_id: String,
    /// See [`PayloadTemplate::game_name`].
    pub game_name: String,
    /// See [`PayloadTemplate::location`].
    pub location: String,
    /// Final score.
    #[serde(serialize_with = "serialize_score")]
    pub score: f64,
}

impl SubmissionPayload {
    /// Combine the player's result with the fixed fields.
    pub fn new(template: &PayloadTemplate, email: &str, score: f64) -> Self {
        Self {
            email: email.to_string(),
            element_id: template.element_id.clone(),
            game_name: template.game_name.clone(),
            location: template.location.clone(),
            score,
        }
    }
}

// Whole scores go out as JSON integers (`7`, not `7.0`).
fn serialize_score<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if score.fract() == 0.0 && score.abs() < u32::MAX as f64 {
        serializer.serialize_i64(*score as i64)
    } else {
        serializer.serialize_f64(*score)
    }
}

/// Failures while validating or delivering a result.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The email is empty.
    #[error("valid email is required")]
    InvalidEmail,
    /// The score is negative or not a number.
    #[error("valid score is required (got {0})")]
    InvalidScore(f64),
    /// The HTTP client could not be constructed.
    #[error("failed to build webhook client")]
    ClientBuilder(#[source] reqwest::Error),
    /// The request did not complete within the configured timeout.
    #[error("webhook request timed out")]
    Timeout,
    /// The request could not be sent.
    #[error("failed to reach webhook")]
    Request(#[source] reqwest::Error),
    /// The webhook answered with a non-success status.
    #[error("webhook returned HTTP status {0}")]
    Status(StatusCode),
}

/// Check the inputs before any network activity.
pub fn validate(email: &str, score: f64) -> Result<(), SubmissionError> {
    if email.trim().is_empty() {
        return Err(SubmissionError::InvalidEmail);
    }
    if !score.is_finite() || score < 0.0 {
        return Err(SubmissionError::InvalidScore(score));
    }
    Ok(())
}

/// Transport delivering a payload somewhere.
pub trait ResultSink: Send + Sync {
    /// Deliver `payload`, resolving once the receiver acknowledged it.
    fn send(&self, payload: SubmissionPayload) -> BoxFuture<'static, Result<(), SubmissionError>>;
}

/// Posts payloads as JSON to a fixed URL.
#[derive(Clone)]
pub struct WebhookSink {
    client: Client,
    endpoint: Arc<str>,
}

impl WebhookSink {
    /// Build a sink whose requests are aborted after `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SubmissionError::ClientBuilder)?;
        Ok(Self {
            client,
            endpoint: Arc::from(endpoint.into()),
        })
    }
}

impl ResultSink for WebhookSink {
    fn send(&self, payload: SubmissionPayload) -> BoxFuture<'static, Result<(), SubmissionError>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            let response = client
                .post(endpoint.as_ref())
                .json(&payload)
                .send()
                .await
                .map_err(|err| {
                    if err.is_timeout() {
                        SubmissionError::Timeout
                    } else {
                        SubmissionError::Request(err)
                    }
                })?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(SubmissionError::Status(status))
            }
        })
    }
}

/// How a submission attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The webhook acknowledged the result.
    Success,
    /// Validation or delivery failed.
    Error,
}

/// Record of the latest submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    /// Email that was submitted.
    pub email: String,
    /// Score that was submitted.
    pub score: f64,
    /// When the attempt finished.
    pub timestamp: OffsetDateTime,
    /// Result of the attempt.
    pub outcome: SubmissionOutcome,
    /// Failure message, if any.
    pub error: Option<String>,
}

/// Transient state exposed to the front-end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionStatus {
    /// A submission is in flight.
    pub is_submitting: bool,
    /// Message of the last failure.
    pub error: Option<String>,
    /// Latest finished attempt.
    pub last_submission: Option<SubmissionRecord>,
}

/// Validates, sends and tracks result submissions.
pub struct SubmissionClient {
    sink: Arc<dyn ResultSink>,
    template: PayloadTemplate,
    status: RwLock<TrackedStatus>,
}

// Only attempts made for `active` may touch `status`.
#[derive(Default)]
struct TrackedStatus {
    active: Option<Uuid>,
    status: SubmissionStatus,
}

impl SubmissionClient {
    /// Client delivering through `sink` with the given fixed fields.
    pub fn new(sink: Arc<dyn ResultSink>, template: PayloadTemplate) -> Self {
        Self {
            sink,
            template,
            status: RwLock::new(TrackedStatus::default()),
        }
    }

    /// Track submissions for `session_id` from now on, starting from a clean status.
    pub async fn begin(&self, session_id: Uuid) {
        let mut tracked = self.status.write().await;
        tracked.active = Some(session_id);
        tracked.status = SubmissionStatus::default();
    }

    /// Submit the result of `session_id`. Never fails; the returned record
    /// describes what happened.
    ///
    /// The status only reflects the attempt while `session_id` is the session
    /// passed to the last [`begin`](Self::begin) and no [`reset`](Self::reset)
    /// happened since.
    pub async fn submit(&self, session_id: Uuid, email: &str, score: f64) -> SubmissionRecord {
        {
            let mut tracked = self.status.write().await;
            if tracked.active == Some(session_id) {
                tracked.status.error = None;
                tracked.status.is_submitting = true;
            }
        }

        let result = match validate(email, score) {
            Ok(()) => {
                let payload = SubmissionPayload::new(&self.template, email, score);
                let sent = self.sink.send(payload.clone()).await;
                match &sent {
                    Ok(()) => info!(?payload, "game results submitted"),
                    Err(err) => error!(error = %err, ?payload, "failed to submit game results"),
                }
                sent
            }
            Err(err) => {
                warn!(error = %err, email, score, "game results not submitted: invalid data");
                Err(err)
            }
        };

        let record = SubmissionRecord {
            email: email.to_string(),
            score,
            timestamp: OffsetDateTime::now_utc(),
            outcome: if result.is_ok() {
                SubmissionOutcome::Success
            } else {
                SubmissionOutcome::Error
            },
            error: result.err().map(|err| err.to_string()),
        };

        let mut tracked = self.status.write().await;
        if tracked.active != Some(session_id) {
            debug!(%session_id, "session no longer active; submission status left untouched");
            return record;
        }
        tracked.status.is_submitting = false;
        tracked.status.error = record.error.clone();
        tracked.status.last_submission = Some(record.clone());
        record
    }

    /// Current submission state.
    pub async fn status(&self) -> SubmissionStatus {
        self.status.read().await.status.clone()
    }

    /// Forget previous attempts, including any still in flight.
    pub async fn reset(&self) {
        let mut tracked = self.status.write().await;
        tracked.active = None;
        tracked.status = SubmissionStatus::default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    fn template() -> PayloadTemplate {
        PayloadTemplate {
            element_id: "05".into(),
            game_name: "Bucket Sorting".into(),
            location: "surat".into(),
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<SubmissionPayload>>,
        fail_with: Option<StatusCode>,
    }

    impl ResultSink for RecordingSink {
        fn send(
            &self,
            payload: SubmissionPayload,
        ) -> BoxFuture<'static, Result<(), SubmissionError>> {
            self.sent.lock().unwrap().push(payload);
            let result = match self.fail_with {
                Some(status) => Err(SubmissionError::Status(status)),
                None => Ok(()),
            };
            Box::pin(async move { result })
        }
    }

    #[test]
    fn payload_has_fixed_shape() {
        let payload = SubmissionPayload::new(&template(), "a@b.com", 7.0);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "email": "a@b.com",
                "element_id": "05",
                "game_name": "Bucket Sorting",
                "location": "surat",
                "score": 7
            })
        );

        let fractional = SubmissionPayload::new(&template(), "a@b.com", 6.11);
        assert_eq!(serde_json::to_value(&fractional).unwrap()["score"], json!(6.11));
    }

    #[test]
    fn validation_rejects_bad_input() {
        assert!(validate("a@b.com", 0.0).is_ok());
        assert!(matches!(validate("", 5.0), Err(SubmissionError::InvalidEmail)));
        assert!(matches!(validate("   ", 5.0), Err(SubmissionError::InvalidEmail)));
        assert!(matches!(
            validate("a@b.com", -1.0),
            Err(SubmissionError::InvalidScore(_))
        ));
        assert!(validate("a@b.com", f64::NAN).is_err());
    }

    #[tokio::test]
    async fn empty_email_never_reaches_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let client = SubmissionClient::new(sink.clone(), template());
        let session_id = Uuid::new_v4();
        client.begin(session_id).await;

        let record = client.submit(session_id, "", 7.0).await;
        assert_eq!(record.outcome, SubmissionOutcome::Error);
        assert!(sink.sent.lock().unwrap().is_empty());

        let status = client.status().await;
        assert!(!status.is_submitting);
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn successful_submission_is_tracked() {
        let sink = Arc::new(RecordingSink::default());
        let client = SubmissionClient::new(sink.clone(), template());
        let session_id = Uuid::new_v4();
        client.begin(session_id).await;

        let record = client.submit(session_id, "a@b.com", 7.0).await;
        assert_eq!(record.outcome, SubmissionOutcome::Success);
        assert_eq!(
            sink.sent.lock().unwrap().as_slice(),
            &[SubmissionPayload::new(&template(), "a@b.com", 7.0)]
        );

        let status = client.status().await;
        assert_eq!(status.error, None);
        assert_eq!(status.last_submission, Some(record));

        client.reset().await;
        assert_eq!(client.status().await, SubmissionStatus::default());
    }

    struct SlowSink {
        delay: Duration,
    }

    impl ResultSink for SlowSink {
        fn send(
            &self,
            _payload: SubmissionPayload,
        ) -> BoxFuture<'static, Result<(), SubmissionError>> {
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn attempt_outliving_a_reset_leaves_status_clean() {
        let client = Arc::new(SubmissionClient::new(
            Arc::new(SlowSink {
                delay: Duration::from_millis(100),
            }),
            template(),
        ));

        let old_session = Uuid::new_v4();
        client.begin(old_session).await;

        let in_flight = {
            let client = client.clone();
            tokio::spawn(async move { client.submit(old_session, "old@b.com", 7.0).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(client.status().await.is_submitting);

        client.reset().await;
        assert_eq!(client.status().await, SubmissionStatus::default());

        let new_session = Uuid::new_v4();
        client.begin(new_session).await;
        let record = in_flight.await.unwrap();
        assert_eq!(record.outcome, SubmissionOutcome::Success);
        assert_eq!(client.status().await, SubmissionStatus::default());

        // Late for its own session: the reset already retired it.
        client.submit(old_session, "old@b.com", 7.0).await;
        assert_eq!(client.status().await, SubmissionStatus::default());

        let next = client.submit(new_session, "new@b.com", 9.0).await;
        assert_eq!(client.status().await.last_submission, Some(next));
    }

    #[tokio::test]
    async fn failed_delivery_is_absorbed() {
        let sink = Arc::new(RecordingSink {
            fail_with: Some(StatusCode::BAD_GATEWAY),
            ..RecordingSink::default()
        });
        let client = SubmissionClient::new(sink, template());
        let session_id = Uuid::new_v4();
        client.begin(session_id).await;

        let record = client.submit(session_id, "a@b.com", 3.5).await;
        assert_eq!(record.outcome, SubmissionOutcome::Error);
        assert!(record.error.unwrap().contains("502"));
        assert!(client.status().await.error.is_some());
    }

    async fn spawn_webhook(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/hook")
    }

    #[tokio::test]
    async fn webhook_sink_posts_json() {
        let received: Arc<Mutex<Vec<(Option<String>, Value)>>> = Arc::default();
        let captured = received.clone();
        let router = Router::new().route(
            "/hook",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    captured.lock().unwrap().push((content_type, body));
                    "ok"
                }
            }),
        );
        let url = spawn_webhook(router).await;

        let sink = WebhookSink::new(url, Duration::from_secs(10)).unwrap();
        sink.send(SubmissionPayload::new(&template(), "a@b.com", 7.0))
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0.as_deref(), Some("application/json"));
        assert_eq!(received[0].1["email"], json!("a@b.com"));
        assert_eq!(received[0].1["score"], json!(7));
    }

    #[tokio::test]
    async fn webhook_sink_reports_http_failures() {
        let router = Router::new().route(
            "/hook",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let url = spawn_webhook(router).await;

        let sink = WebhookSink::new(url, Duration::from_secs(10)).unwrap();
        let err = sink
            .send(SubmissionPayload::new(&template(), "a@b.com", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Status(StatusCode::INTERNAL_SERVER_ERROR)
        ));
    }

    #[tokio::test]
    async fn webhook_sink_aborts_slow_requests() {
        let router = Router::new().route(
            "/hook",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let url = spawn_webhook(router).await;

        let sink = WebhookSink::new(url, Duration::from_millis(100)).unwrap();
        let err = sink
            .send(SubmissionPayload::new(&template(), "a@b.com", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Timeout));
    }
}
