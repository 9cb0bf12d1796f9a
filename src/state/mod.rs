pub mod controller;
pub mod countdown;
pub mod game;
pub mod ledger;
mod sse;
pub mod state_machine;

use std::sync::Arc;

use tokio::{
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    config::{AppConfig, SessionSettings},
    dao::kv_store::{KeyValueStore, PersistedSession},
    services::submission::{SubmissionClient, SubmissionStatus},
    state::{controller::GameController, state_machine::GamePhase},
};

pub use self::sse::SseHub;

/// Cheaply clonable handle on the application state.
pub type SharedState = Arc<AppState>;

/// Capacity of the SSE broadcast channel; slow subscribers skip lagged events.
const SSE_CAPACITY: usize = 64;

/// Central application state: the game controller and its collaborators.
pub struct AppState {
    settings: SessionSettings,
    controller: Mutex<GameController>,
    countdown: Mutex<Option<(Uuid, JoinHandle<()>)>>,
    sse: SseHub,
    store: Arc<dyn KeyValueStore>,
    submissions: SubmissionClient,
    recovered: Option<PersistedSession>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The controller starts in the email phase.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        submissions: SubmissionClient,
        recovered: Option<PersistedSession>,
    ) -> SharedState {
        let controller =
            GameController::new(Arc::new(config.catalog), config.session.duration_secs);
        Arc::new(Self {
            settings: config.session,
            controller: Mutex::new(controller),
            countdown: Mutex::new(None),
            sse: SseHub::new(SSE_CAPACITY),
            store,
            submissions,
            recovered,
        })
    }

    /// Session timing.
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Lock the controller. Keep the guard short-lived and never hold it across I/O.
    pub async fn controller(&self) -> MutexGuard<'_, GameController> {
        self.controller.lock().await
    }

    /// Snapshot the current phase.
    pub async fn phase(&self) -> GamePhase {
        self.controller.lock().await.phase()
    }

    /// Slot holding the running countdown task and the session it belongs to.
    pub fn countdown_task(&self) -> &Mutex<Option<(Uuid, JoinHandle<()>)>> {
        &self.countdown
    }

    /// Broadcast hub used for the SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Key-value store holding the session recovery keys.
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Result submission client.
    pub fn submissions(&self) -> &SubmissionClient {
        &self.submissions
    }

    /// Current submission status.
    pub async fn submission_status(&self) -> SubmissionStatus {
        self.submissions.status().await
    }

    /// Session keys found in storage at startup.
    pub fn recovered_session(&self) -> Option<&PersistedSession> {
        self.recovered.as_ref()
    }
}
