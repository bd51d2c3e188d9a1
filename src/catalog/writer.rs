use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::backend::Backend;
use crate::utils::error::TransportError;

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    username: &'a str,
    password: &'a str,
    topic: &'a str,
    message: &'a Value,
}

/// What the backend echoes back after a write.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WriteResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "topic_id")]
    pub topic: Option<String>,
    #[serde(default)]
    pub message: Option<Value>,
}

/// Publishes messages through the backend's authenticated write route.
#[derive(Debug, Clone)]
pub struct MessageWriter {
    backend: Backend,
}

impl MessageWriter {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub async fn write_message(
        &self,
        topic: &str,
        message: &Value,
    ) -> Result<WriteResponse, TransportError> {
        let url = self.backend.route("topics/topic/messages/write")?;
        let request = WriteRequest {
            username: self.backend.username(),
            password: self.backend.password(),
            topic,
            message,
        };

        let response = self.backend.http().post(url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
