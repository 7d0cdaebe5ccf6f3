use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use ango_core::data::prompt_model::{GenerationRequest, PromptModel};
use ango_core::domain::chat::{ChatMessage, ChatRole};
use ango_core::domain::error::DomainError;

use crate::error::{ClientError, ClientResult};
use crate::settings::Settings;

// ---------- DTO: запрос ----------

#[derive(Debug, Serialize)]
struct PartDto<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ContentDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<PartDto<'a>>,
}

#[derive(Debug, Serialize)]
struct GenerationConfigDto {
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequestDto<'a> {
    contents: Vec<ContentDto<'a>>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ContentDto<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfigDto>,
}

// ---------- DTO: ответ ----------

#[derive(Debug, Deserialize)]
struct ResponsePartDto {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContentDto {
    parts: Option<Vec<ResponsePartDto>>,
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    content: Option<ResponseContentDto>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponseDto {
    candidates: Option<Vec<CandidateDto>>,
}

#[derive(Debug, Deserialize)]
struct AiErrorDto {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiErrorResponseDto {
    error: Option<AiErrorDto>,
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    }
}

fn content_from(message: &ChatMessage) -> ContentDto<'_> {
    ContentDto {
        role: Some(role_name(message.role)),
        parts: vec![PartDto {
            text: &message.text,
        }],
    }
}

fn build_request(request: &GenerationRequest) -> GenerateContentRequestDto<'_> {
    GenerateContentRequestDto {
        contents: request.messages.iter().map(content_from).collect(),
        system_instruction: request.system_instruction.as_deref().map(|text| ContentDto {
            role: None,
            parts: vec![PartDto { text }],
        }),
        generation_config: request
            .temperature
            .map(|temperature| GenerationConfigDto { temperature }),
    }
}

fn extract_text(response: GenerateContentResponseDto) -> String {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("")
}

/// Клиент генеративного API текстовой модели.
#[derive(Debug, Clone)]
pub struct AiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AiClient {
    /// Создаёт клиента модели по конфигурации.
    pub fn new(settings: &Settings) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(settings.http_connect_timeout_secs))
            .timeout(Duration::from_secs(settings.http_request_timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        Self {
            http,
            base_url: settings.ai_base_url.trim_end_matches('/').to_string(),
            api_key: settings.ai_api_key.clone(),
            model: settings.ai_model.clone(),
        }
    }

    async fn generate_content(&self, request: &GenerationRequest) -> ClientResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = build_request(request);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<AiErrorResponseDto>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|error| error.message)
                .unwrap_or_else(|| format!("http status {status}"));
            return Err(ClientError::InvalidRequest(message));
        }

        let decoded = response.json::<GenerateContentResponseDto>().await?;
        Ok(extract_text(decoded))
    }
}

#[async_trait]
impl PromptModel for AiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, DomainError> {
        self.generate_content(&request)
            .await
            .map_err(|err| DomainError::Model(err.to_string()))
    }
}
