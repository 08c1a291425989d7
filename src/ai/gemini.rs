use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ai::image::ImagePayload;
use crate::ai::{TextResponder, VisionResponder};
use crate::config::AppConfig;

/// Every harm category the API lets us configure; all are set to `BLOCK_NONE`.
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HATE_SPEECH",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    text_model: String,
    vision_model: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.gemini_api_key.clone(),
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            text_model: config.gemini_text_model.clone(),
            vision_model: config.gemini_vision_model.clone(),
        }
    }

    fn safety_settings() -> Vec<SafetySetting> {
        HARM_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: "BLOCK_NONE",
            })
            .collect()
    }

    /// Send one user turn to `model` and return the generated text.
    /// No earlier turns are included: every call is a fresh conversation.
    async fn generate(&self, model: &str, parts: Vec<Part>) -> anyhow::Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            safety_settings: Self::safety_settings(),
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.api_base, model);
        let resp = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err_body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, err_body);
        }

        let parsed: GenerateResponse = resp.json().await?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            anyhow::bail!("Gemini blocked the prompt: {}", reason);
        }

        let candidate = parsed
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| anyhow::anyhow!("No candidates in Gemini response"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            anyhow::bail!(
                "Gemini returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            );
        }

        Ok(text)
    }
}

#[async_trait]
impl TextResponder for GeminiClient {
    async fn respond(&self, utterance: &str) -> anyhow::Result<String> {
        let parts = vec![Part {
            text: Some(utterance.to_string()),
            inline_data: None,
        }];
        self.generate(&self.text_model, parts).await
    }
}

#[async_trait]
impl VisionResponder for GeminiClient {
    async fn describe(&self, image: &[u8], prompt: &str) -> anyhow::Result<String> {
        let image = ImagePayload::decode(image)?;
        tracing::debug!(
            "Sending {} image ({} bytes) to Gemini",
            image.mime_type,
            image.bytes.len()
        );

        let parts = vec![
            Part {
                text: Some(prompt.to_string()),
                inline_data: None,
            },
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: image.mime_type.to_string(),
                    data: image.to_base64(),
                }),
            },
        ];
        self.generate(&self.vision_model, parts).await
    }
}
