use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use fridge_core::openrouter::{ChatResponse, receipt_request, response_text};
use fridge_core::receipt::{
    ExtractionError, ReceiptExtractor, ReceiptItem, image_data_url, parse_items,
};

const CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const REFERER: &str = "http://localhost:3001";
const TITLE: &str = "Fridge Inventory";

/// Receipt extractor backed by the `OpenRouter` chat-completions API.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "fridge-cli/{} (fridge inventory)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    async fn complete(&self, image_url: &str) -> Result<ChatResponse> {
        let resp = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&receipt_request(&self.model, image_url))
            .send()
            .await
            .context("Failed to reach OpenRouter API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenRouter API returned {status}: {}", body.trim());
        }

        resp.json()
            .await
            .context("Failed to parse OpenRouter response")
    }
}

#[async_trait]
impl ReceiptExtractor for OpenRouterClient {
    async fn extract(&self, image: &str) -> Result<Vec<ReceiptItem>, ExtractionError> {
        let image_url = image_data_url(image)?;
        let response = self.complete(&image_url).await.map_err(|e| {
            warn!(error = %format!("{e:#}"), "receipt extraction request failed");
            ExtractionError::Request(format!("{e:#}"))
        })?;
        let text = response_text(response).ok_or(ExtractionError::Unparseable)?;
        debug!(chars = text.len(), "received receipt analysis");
        parse_items(&text)
    }
}
