//! History loader (spec.md §4.5): request-driven backfill over the capture
//! service's pull interface.

use crate::model::UpstreamMessage;
use crate::processor::MessageProcessor;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct BackfillResponse {
    messages: Vec<UpstreamMessage>,
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct HistoryLoadResult {
    pub loaded: usize,
    pub saved: usize,
    pub duplicates: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryLoadError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("response decode failed: {0}")]
    Decode(String),
}

pub struct HistoryLoader {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HistoryLoader {
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builds");
        Self {
            base_url,
            api_key,
            client,
        }
    }

    /// `limit` of `0` or `None` means "all available" (spec.md §4.5). Runs
    /// every fetched message through `processor`, which the caller must
    /// have configured with broadcasting disabled.
    pub async fn load(
        &self,
        chat_id: i64,
        limit: Option<u32>,
        processor: &MessageProcessor,
    ) -> Result<HistoryLoadResult, HistoryLoadError> {
        let mut url = format!("{}/messages?chat_id={chat_id}", self.base_url);
        if let Some(limit) = limit.filter(|l| *l > 0) {
            url.push_str(&format!("&limit={limit}"));
        }

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| HistoryLoadError::Request(e.to_string()))?;

        let body: BackfillResponse = response
            .json()
            .await
            .map_err(|e| HistoryLoadError::Decode(e.to_string()))?;

        let mut result = HistoryLoadResult {
            loaded: body.messages.len(),
            ..Default::default()
        };

        for message in body.messages {
            let outcome = processor.process(message).await;
            if outcome.persisted {
                result.saved += 1;
            } else {
                result.duplicates += 1;
            }
        }

        Ok(result)
    }
}
