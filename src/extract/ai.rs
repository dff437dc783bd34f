//! AI-assisted extraction through an OpenAI-compatible chat completions API
//!
//! A bounded prefix of the page markup is sent with a fixed instruction; the
//! reply must be a JSON object. Every failure is logged and turns into "no
//! record", so the heuristic strategy runs next.

use crate::config::Config;
use crate::extract::images::{is_valid_image_src, ImageRules};
use crate::extract::text::{char_prefix, title_case};
use crate::extract::{ExtractError, ExtractionStrategy};
use crate::model::ProductRecord;
use crate::url::resolve_href;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const INSTRUCTION: &str = "Extract furniture product information from this HTML content. \
Return only a JSON object with these fields: \
\"name\" (product name), \"description\" (product description), \
\"designer\" (designer name), \"furnitureType\" (product category such as sofa, chair, table), \
\"imageUrls\" (list of image URLs of the product).";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Fields the model is asked to return
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtractedFields {
    name: String,
    description: String,
    designer: String,
    #[serde(rename = "furnitureType")]
    furniture_type: String,
    #[serde(rename = "imageUrls")]
    image_urls: Vec<String>,
}

/// Removes a Markdown code fence around a JSON reply
fn strip_code_fence(reply: &str) -> &str {
    let reply = reply.trim();
    let Some(inner) = reply.strip_prefix("```") else {
        return reply;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Extraction strategy backed by a text-generation service
#[derive(Debug, Clone)]
pub struct AiStrategy {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_markup_chars: usize,
    max_tokens: u32,
    images: ImageRules,
}

impl AiStrategy {
    pub fn new(client: Client, api_key: String, config: &Config) -> Self {
        Self {
            client,
            api_key,
            base_url: config.ai.base_url.trim_end_matches('/').to_string(),
            model: config.ai.model.clone(),
            max_markup_chars: config.ai.max_markup_chars,
            max_tokens: config.ai.max_tokens,
            images: ImageRules::from_config(config),
        }
    }

    /// Builds the strategy when AI extraction is enabled and a key is present
    pub fn from_env(client: Client, config: &Config) -> Option<Self> {
        if !config.ai.enabled {
            return None;
        }
        let api_key = std::env::var(&config.ai.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())?;
        Some(Self::new(client, api_key, config))
    }

    async fn complete(&self, markup: &str) -> Result<String, ExtractError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: format!(
                    "{}\n\n{}",
                    INSTRUCTION,
                    char_prefix(markup, self.max_markup_chars)
                ),
            }],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Parse(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ExtractError::Api("no choices in response".to_string()))
    }

    /// Turns the model reply into a record
    fn build_record(
        &self,
        reply: &str,
        page_url: &Url,
        category: &str,
    ) -> Result<Option<ProductRecord>, ExtractError> {
        let fields: ExtractedFields = serde_json::from_str(strip_code_fence(reply))
            .map_err(|e| ExtractError::Parse(e.to_string()))?;

        let product_name = fields.name.trim().to_string();
        if product_name.is_empty() {
            return Ok(None);
        }

        let mut image_urls: Vec<String> = Vec::new();
        for src in &fields.image_urls {
            let Some(url) = resolve_href(src, page_url) else {
                continue;
            };
            let url = url.to_string();
            if is_valid_image_src(&url, &product_name, &self.images.blacklist, self.images.filter)
                && !image_urls.contains(&url)
            {
                image_urls.push(url);
            }
        }

        let furniture_type = if fields.furniture_type.trim().is_empty() {
            category.trim()
        } else {
            fields.furniture_type.trim()
        };

        Ok(Some(ProductRecord {
            product_name,
            description: fields.description.trim().to_string(),
            product_url: page_url.to_string(),
            designer_name: fields.designer.trim().to_string(),
            image_urls,
            furniture_type: title_case(furniture_type),
        }))
    }
}

#[async_trait]
impl ExtractionStrategy for AiStrategy {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn extract(&self, markup: &str, page_url: &Url, category: &str) -> Option<ProductRecord> {
        let result = match self.complete(markup).await {
            Ok(reply) => self.build_record(&reply, page_url, category),
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("AI extraction failed for {}: {}", page_url, e);
                None
            }
        }
    }
}
