use reqwest::Client;
use url::Url;

use crate::config::BackendSettings;
use crate::utils::error::TransportError;

/// Connection details shared by every call against the backend.
#[derive(Debug, Clone)]
pub struct Backend {
    http: Client,
    base: Url,
    username: String,
    password: String,
}

impl Backend {
    /// Builds a backend with a fresh HTTP client.
    pub fn new(settings: &BackendSettings) -> Result<Self, TransportError> {
        Self::with_client(Client::new(), settings)
    }

    /// Builds a backend on a shared client. Fails when `base_url` does not parse.
    pub fn with_client(http: Client, settings: &BackendSettings) -> Result<Self, TransportError> {
        let mut base = Url::parse(&settings.base_url)?;
        // Keep any path prefix when joining relative routes.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http,
            base,
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Resolves a backend route such as `topics/fetch` against the base url.
    pub fn route(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// The streaming endpoint, without a topic filter.
    pub fn stream_endpoint(&self) -> Result<Url, TransportError> {
        self.route("sse")
    }
}
