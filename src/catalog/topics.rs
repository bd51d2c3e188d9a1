use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::backend::Backend;
use crate::subscription::Topic;
use crate::utils::error::TransportError;

/// Body of `GET /topics/fetch`. The backend omits `topics` when there are none.
#[derive(Debug, Deserialize)]
struct ListKeysResponse {
    #[serde(default)]
    topics: Vec<Topic>,
}

/// Looks up the topics known to the backend.
#[derive(Debug, Clone)]
pub struct TopicCatalog {
    backend: Backend,
}

impl TopicCatalog {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Fetches the current topic list. No retry, no caching.
    pub async fn fetch_topics(&self) -> Result<Vec<Topic>, TransportError> {
        let url = self.backend.route("topics/fetch")?;
        let response = self
            .backend
            .http()
            .get(url)
            .query(&[
                ("username", self.backend.username()),
                ("password", self.backend.password()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 && status != 201 {
            warn!("Fetching topics received {} status response", status);
            return Err(TransportError::Status(status));
        }

        let body = response.text().await?;
        let list: ListKeysResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        debug!("Fetched {} topics", list.topics.len());
        Ok(list.topics)
    }
}
