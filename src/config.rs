//! Application-level configuration loading: session timing, catalog and results webhook.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    services::submission::PayloadTemplate,
    state::game::{Bucket, Catalog, Item, SESSION_DURATION_SECS},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BUCKET_SORT_CONFIG_PATH";
/// Default location of the session key-value file.
const DEFAULT_STORE_PATH: &str = "data/session.json";
/// Results collector receiving final scores.
const DEFAULT_WEBHOOK_URL: &str = "https://hook.eu1.make.com/4jtevja63bir17db4oqw267cvuxe5y98";
const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_millis(1_000);
const DEFAULT_RESULTS_AUTO_RESET: Duration = Duration::from_secs(5);

/// Timing of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Countdown length in seconds.
    pub duration_secs: u32,
    /// Wall-clock length of one countdown second.
    pub tick_interval: Duration,
    /// Pause between the last drop and the results transition.
    pub completion_delay: Duration,
    /// Automatic return to email entry after results, if enabled.
    pub results_auto_reset: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_secs: SESSION_DURATION_SECS,
            tick_interval: DEFAULT_TICK_INTERVAL,
            completion_delay: DEFAULT_COMPLETION_DELAY,
            results_auto_reset: Some(DEFAULT_RESULTS_AUTO_RESET),
        }
    }
}

/// Where and how results are submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSettings {
    /// URL receiving the JSON POST.
    pub endpoint: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Fixed payload fields.
    pub template: PayloadTemplate,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WEBHOOK_URL.into(),
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
            template: PayloadTemplate {
                element_id: "05".into(),
                game_name: "Bucket Sorting".into(),
                location: "surat".into(),
            },
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Session timing.
    pub session: SessionSettings,
    /// Results webhook.
    pub webhook: WebhookSettings,
    /// Key-value file path; `None` keeps the session keys in memory.
    pub store_path: Option<PathBuf>,
    /// Items and buckets served to every session.
    pub catalog: Catalog,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        items = app_config.catalog.len(),
                        buckets = app_config.catalog.buckets().len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; omitted fields keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        let config: Self = raw.into();
        config.warn_on_orphan_items();
        Ok(config)
    }

    fn warn_on_orphan_items(&self) {
        for item in self.catalog.items() {
            if !self.catalog.has_bucket(&item.correct_category) {
                warn!(
                    item_id = item.id,
                    category = %item.correct_category,
                    "item category has no matching bucket; it can never be placed correctly"
                );
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionSettings::default(),
            webhook: WebhookSettings::default(),
            store_path: Some(PathBuf::from(DEFAULT_STORE_PATH)),
            catalog: default_catalog(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    session_duration_secs: Option<u32>,
    tick_interval_ms: Option<u64>,
    completion_delay_ms: Option<u64>,
    // Outer `None`: keep default; inner `None`: disabled.
    #[serde(deserialize_with = "deserialize_some")]
    results_auto_reset_secs: Option<Option<u64>>,
    webhook: RawWebhook,
    #[serde(deserialize_with = "deserialize_some")]
    store_path: Option<Option<PathBuf>>,
    items: Option<Vec<RawItem>>,
    buckets: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the `webhook` section.
struct RawWebhook {
    url: Option<String>,
    timeout_ms: Option<u64>,
    element_id: Option<String>,
    game_name: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single draggable item.
struct RawItem {
    id: u32,
    label: String,
    category: String,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();

        let session = SessionSettings {
            duration_secs: match value.session_duration_secs {
                Some(0) => {
                    warn!("session_duration_secs must be positive; using the default");
                    defaults.session.duration_secs
                }
                Some(secs) => secs,
                None => defaults.session.duration_secs,
            },
            tick_interval: match value.tick_interval_ms {
                Some(0) => {
                    warn!("tick_interval_ms must be positive; using the default");
                    defaults.session.tick_interval
                }
                Some(ms) => Duration::from_millis(ms),
                None => defaults.session.tick_interval,
            },
            completion_delay: value
                .completion_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.session.completion_delay),
            results_auto_reset: value
                .results_auto_reset_secs
                .map(|secs| secs.map(Duration::from_secs))
                .unwrap_or(defaults.session.results_auto_reset),
        };

        let raw_webhook = value.webhook;
        let webhook = WebhookSettings {
            endpoint: raw_webhook.url.unwrap_or(defaults.webhook.endpoint),
            timeout: raw_webhook
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.webhook.timeout),
            template: PayloadTemplate {
                element_id: raw_webhook
                    .element_id
                    .unwrap_or(defaults.webhook.template.element_id),
                game_name: raw_webhook
                    .game_name
                    .unwrap_or(defaults.webhook.template.game_name),
                location: raw_webhook
                    .location
                    .unwrap_or(defaults.webhook.template.location),
            },
        };

        let catalog = match (value.items, value.buckets) {
            (None, None) => defaults.catalog,
            (items, buckets) => {
                let items = items
                    .map(|items| items.into_iter().map(Into::into).collect())
                    .unwrap_or_else(|| defaults.catalog.items().cloned().collect());
                let buckets = buckets
                    .map(|buckets| {
                        buckets
                            .into_iter()
                            .map(|category| Bucket { category })
                            .collect()
                    })
                    .unwrap_or_else(|| defaults.catalog.buckets().to_vec());
                Catalog::new(items, buckets)
            }
        };

        Self {
            session,
            webhook,
            store_path: value.store_path.unwrap_or(defaults.store_path),
            catalog,
        }
    }
}

impl From<RawItem> for Item {
    fn from(value: RawItem) -> Self {
        Self {
            id: value.id,
            label: value.label,
            correct_category: value.category,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in seller-hub catalog shipped with the binary.
fn default_catalog() -> Catalog {
    let items = [
        (1, "I want to onboard to FBF", "GROWTH"),
        (2, "I want to check return reasons", "SELECTION INSIGHTS"),
        (3, "I want to opt into Google Ads", "ADVERTISING"),
        (4, "I want to change settlement of my product", "PAYMENTS"),
        (5, "I want to understand new market trend", "SELECTION INSIGHTS"),
        (6, "I want to explore Dhamaka selection", "INVENTORY"),
    ]
    .into_iter()
    .map(|(id, label, category)| Item {
        id,
        label: label.into(),
        correct_category: category.into(),
    })
    .collect();

    let buckets = [
        "GROWTH",
        "SELECTION INSIGHTS",
        "INVENTORY",
        "PAYMENTS",
        "LISTINGS",
        "ADVERTISING",
    ]
    .into_iter()
    .map(|category| Bucket {
        category: category.into(),
    })
    .collect();

    Catalog::new(items, buckets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_session() {
        let config = AppConfig::default();
        assert_eq!(config.session.duration_secs, 180);
        assert_eq!(config.session.tick_interval, Duration::from_secs(1));
        assert_eq!(config.catalog.len(), 6);
        assert_eq!(config.catalog.buckets().len(), 6);
        assert_eq!(config.webhook.template.element_id, "05");
        assert_eq!(config.webhook.timeout, Duration::from_secs(10));
    }

    #[test]
    fn empty_document_keeps_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.session, SessionSettings::default());
        assert_eq!(config.webhook, WebhookSettings::default());
        assert_eq!(config.store_path, Some(PathBuf::from(DEFAULT_STORE_PATH)));
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = AppConfig::from_json(
            r#"{
                "session_duration_secs": 60,
                "completion_delay_ms": 0,
                "results_auto_reset_secs": null,
                "store_path": null,
                "webhook": { "url": "http://localhost:9000/hook", "location": "pune" },
                "buckets": ["A", "B"],
                "items": [{ "id": 7, "label": "seven", "category": "A" }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.session.duration_secs, 60);
        assert_eq!(config.session.completion_delay, Duration::ZERO);
        assert_eq!(config.session.results_auto_reset, None);
        assert_eq!(config.store_path, None);
        assert_eq!(config.webhook.endpoint, "http://localhost:9000/hook");
        assert_eq!(config.webhook.template.location, "pune");
        assert_eq!(config.webhook.template.game_name, "Bucket Sorting");
        assert_eq!(config.catalog.len(), 1);
        assert!(config.catalog.has_bucket("B"));
    }

    #[test]
    fn zero_timings_fall_back_to_defaults() {
        let config = AppConfig::from_json(
            r#"{ "session_duration_secs": 0, "tick_interval_ms": 0, "completion_delay_ms": 0 }"#,
        )
        .unwrap();

        assert_eq!(config.session.duration_secs, 180);
        assert_eq!(config.session.tick_interval, Duration::from_secs(1));
        assert_eq!(config.session.completion_delay, Duration::ZERO);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json("{ \"session_duration_secs\": \"long\" }").is_err());
    }
}
