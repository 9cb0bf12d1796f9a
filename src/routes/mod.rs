use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router().merge(sse::router()).merge(game::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, sync::Arc};

    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::kv_store::MemoryKvStore,
        services::submission::{SubmissionClient, WebhookSink},
        state::AppState,
    };

    async fn serve() -> SocketAddr {
        let config = AppConfig::default();
        let sink = WebhookSink::new("http://127.0.0.1:9/", config.webhook.timeout).unwrap();
        let submissions = SubmissionClient::new(Arc::new(sink), config.webhook.template.clone());
        let state = AppState::new(config, Arc::new(MemoryKvStore::new()), submissions, None);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn session_lifecycle_status_codes() {
        let addr = serve().await;
        let client = reqwest::Client::new();
        let url = |path: &str| format!("http://{addr}{path}");

        let catalog: Value = client
            .get(url("/catalog"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(catalog["items"].as_array().unwrap().len(), 6);
        assert_eq!(catalog["session_duration"], 180);

        let early_drop = client
            .post(url("/session/drop"))
            .json(&json!({ "item_id": 1, "category": "GROWTH" }))
            .send()
            .await
            .unwrap();
        assert_eq!(early_drop.status(), StatusCode::CONFLICT);

        let bad_email = client
            .post(url("/session/email"))
            .json(&json!({ "email": "not-an-email" }))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);
        let body: Value = bad_email.json().await.unwrap();
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("Please enter a valid email address")
        );

        let started = client
            .post(url("/session/email"))
            .json(&json!({ "email": "a@b.com" }))
            .send()
            .await
            .unwrap();
        assert_eq!(started.status(), StatusCode::OK);
        let snapshot: Value = started.json().await.unwrap();
        assert_eq!(snapshot["phase"], "game");

        let again = client
            .post(url("/session/email"))
            .json(&json!({ "email": "c@d.com" }))
            .send()
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::CONFLICT);

        let drop: Value = client
            .post(url("/session/drop"))
            .json(&json!({ "item_id": 2, "category": "GROWTH" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(drop["accepted"], true);
        assert_eq!(drop["is_correct"], false);

        let repeat: Value = client
            .post(url("/session/drop"))
            .json(&json!({ "item_id": 2, "category": "SELECTION INSIGHTS" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(repeat["accepted"], false);
        assert_eq!(repeat["rejection"], "already_placed");

        let early_reset = client.post(url("/session/reset")).send().await.unwrap();
        assert_eq!(early_reset.status(), StatusCode::CONFLICT);

        let health: Value = client
            .get(url("/healthcheck"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
    }
}
