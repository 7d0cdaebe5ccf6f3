use async_trait::async_trait;

use crate::domain::chat::ChatMessage;
use crate::domain::error::DomainError;

/// Один запрос «сгенерируй текст» к размещённой модели.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
}

impl GenerationRequest {
    /// Однократный запрос без системной инструкции и истории.
    pub fn single_turn(prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            messages: vec![ChatMessage::user(prompt)],
            temperature: None,
        }
    }
}

#[async_trait]
pub trait PromptModel: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, DomainError>;
}
