use ango_core::domain::error::DomainError;
use thiserror::Error;

/// Сообщение для пользователя при отказе политики row-level security.
pub const RLS_POLICY_HINT: &str = "Erro de RLS: Políticas de banco de dados não configuradas.";

const RLS_ERROR_CODE: &str = "42501";

#[derive(Debug, Error)]
/// Ошибки шлюза `ango-client`.
pub enum ClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ошибка realtime-соединения (`tungstenite`).
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    /// Требуется авторизация (отсутствует/некорректен токен).
    #[error("unauthorized")]
    Unauthorized,

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Backend отклонил запрос политикой row-level security (код `42501`).
    #[error("row-level security rejected the request: {0}")]
    RlsPolicy(String),

    /// Некорректный запрос или иная ошибка сервиса.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Ошибка конфигурации (переменные окружения).
    #[error("configuration error: {0}")]
    Config(String),
}

/// Результат операций `ango-client`.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Классифицирует неуспешный HTTP-ответ backend-сервиса.
    ///
    /// Код `42501` в теле распознаётся раньше статуса: отказ RLS приходит
    /// как 401/403, но для пользователя это ошибка конфигурации базы,
    /// а не его сессии.
    pub(crate) fn from_http_status(
        status: reqwest::StatusCode,
        code: Option<&str>,
        message: Option<String>,
    ) -> Self {
        if code == Some(RLS_ERROR_CODE) {
            return Self::RlsPolicy(RLS_POLICY_HINT.to_string());
        }

        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Unauthorized
            }
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                Self::InvalidRequest(message)
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None, None);
        }
        Self::Http(err)
    }
}

impl From<ClientError> for DomainError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized => DomainError::Unauthorized,
            ClientError::NotFound => DomainError::NotFound("resource".to_string()),
            ClientError::RlsPolicy(message) => DomainError::PolicyRejected(message),
            other => DomainError::Backend(other.to_string()),
        }
    }
}
