use crate::data::prompt_model::{GenerationRequest, PromptModel};
use crate::domain::chat::ChatMessage;

/// Приветствие, с которого начинается каждая сессия ассистента.
pub const ASSISTANT_GREETING: &str =
    "Olá! Sou o assistente da ANGO – PROMPT PD. Como posso ajudar com os teus prompts hoje?";

/// Фиксированная системная инструкция каждого запроса.
pub const ASSISTANT_SYSTEM_INSTRUCTION: &str = "És o assistente de IA da plataforma ANGO – \
    PROMPT PD. O teu objetivo é ajudar os utilizadores com engenharia de prompts, navegação na \
    plataforma e conselhos de IA. Sê profissional, útil e utiliza um tom encorajador.";

/// Ответ, показываемый вместо сырой ошибки сервиса.
pub const ASSISTANT_FALLBACK: &str = "Erro de ligação. Verifica a tua chave de API.";

/// Ответ на пустую выдачу модели.
pub const ASSISTANT_EMPTY_REPLY: &str = "Desculpa, tive um problema a processar isso.";

const ASSISTANT_TEMPERATURE: f64 = 0.7;

/// Плавающий ассистент с линейной историей диалога.
///
/// На каждом ходе модель получает весь транскрипт целиком; окна или
/// суммаризации нет, так что длинная сессия растёт неограниченно — известный
/// разрыв, оставленный как есть.
pub struct ChatAssistant<M: PromptModel> {
    model: M,
    transcript: Vec<ChatMessage>,
}

impl<M: PromptModel> ChatAssistant<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            transcript: vec![ChatMessage::model(ASSISTANT_GREETING)],
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Один ход диалога: реплика пользователя и ответ модели (или
    /// фиксированный fallback — сырая ошибка в переписку не попадает).
    /// Пустой ввод игнорируется.
    pub async fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage::user(text));

        let request = GenerationRequest {
            system_instruction: Some(ASSISTANT_SYSTEM_INSTRUCTION.to_string()),
            messages: self.transcript.clone(),
            temperature: Some(ASSISTANT_TEMPERATURE),
        };

        let reply = match self.model.generate(request).await {
            Ok(reply) if reply.trim().is_empty() => ASSISTANT_EMPTY_REPLY.to_string(),
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(error = %err, "assistant turn failed");
                ASSISTANT_FALLBACK.to_string()
            }
        };

        self.transcript.push(ChatMessage::model(reply));
        self.transcript.last()
    }
}
