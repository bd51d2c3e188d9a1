use serde::Deserialize;

/// Top-level configuration settings for the client.
///
/// Includes settings for the backend, the live feed and logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub backend: BackendSettings,
    pub feed: FeedSettings,
    pub log: LogSettings,
}

/// Where the pub/sub backend lives and which credentials the directory and
/// write calls present.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BackendSettings {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

/// Display and transport parameters for the live feed.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FeedSettings {
    /// Entries kept by the general feed view.
    pub capacity: usize,
    /// Entries kept by tighter views.
    pub compact_capacity: usize,
    /// Delay before the stream transport reconnects after an interruption.
    pub retry_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub backend: Option<PartialBackendSettings>,
    pub feed: Option<PartialFeedSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBackendSettings {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialFeedSettings {
    pub capacity: Option<usize>,
    pub compact_capacity: Option<usize>,
    pub retry_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendSettings {
                base_url: "http://127.0.0.1:8080".to_string(),
                username: "PubSubUI".to_string(),
                password: "public".to_string(),
            },
            feed: FeedSettings {
                capacity: 20,
                compact_capacity: 5,
                retry_ms: 3000,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Overlays whatever was provided on top of the defaults.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();
        let backend = self.backend;
        let feed = self.feed;
        let log = self.log;

        Settings {
            backend: BackendSettings {
                base_url: backend
                    .as_ref()
                    .and_then(|b| b.base_url.clone())
                    .unwrap_or(default.backend.base_url),
                username: backend
                    .as_ref()
                    .and_then(|b| b.username.clone())
                    .unwrap_or(default.backend.username),
                password: backend
                    .as_ref()
                    .and_then(|b| b.password.clone())
                    .unwrap_or(default.backend.password),
            },
            feed: FeedSettings {
                capacity: feed
                    .as_ref()
                    .and_then(|f| f.capacity)
                    .unwrap_or(default.feed.capacity),
                compact_capacity: feed
                    .as_ref()
                    .and_then(|f| f.compact_capacity)
                    .unwrap_or(default.feed.compact_capacity),
                retry_ms: feed
                    .as_ref()
                    .and_then(|f| f.retry_ms)
                    .unwrap_or(default.feed.retry_ms),
            },
            log: LogSettings {
                level: log
                    .and_then(|l| l.level)
                    .unwrap_or(default.log.level),
            },
        }
    }
}
