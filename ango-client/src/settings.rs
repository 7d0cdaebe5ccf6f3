use crate::error::{ClientError, ClientResult};

/// Конфигурация шлюза: адреса backend-сервиса, realtime-канала и модели.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Базовый URL backend-сервиса, например `https://xyz.supabase.co`.
    pub backend_url: String,
    /// Публичный (anon) API-ключ backend-сервиса.
    pub backend_key: String,
    /// URL websocket-endpoint'а realtime-канала.
    pub realtime_url: String,
    /// Базовый URL генеративного API.
    pub ai_base_url: String,
    /// API-ключ генеративного API.
    pub ai_api_key: String,
    /// Имя модели для генерации текста.
    pub ai_model: String,
    /// Таймаут установления HTTP-соединения, секунды.
    pub http_connect_timeout_secs: u64,
    /// Таймаут HTTP-запроса целиком, секунды.
    pub http_request_timeout_secs: u64,
}

const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_AI_MODEL: &str = "gemini-3-flash-preview";

impl Settings {
    /// Читает конфигурацию из окружения.
    ///
    /// Обязательны `ANGO_BACKEND_URL`, `ANGO_BACKEND_KEY` и `ANGO_AI_API_KEY`;
    /// остальное имеет значения по умолчанию.
    pub fn from_env() -> ClientResult<Self> {
        let backend_url = get_required("ANGO_BACKEND_URL")?;
        let backend_key = get_required("ANGO_BACKEND_KEY")?;
        let ai_api_key = get_required("ANGO_AI_API_KEY")?;

        let realtime_url = std::env::var("ANGO_REALTIME_URL")
            .unwrap_or_else(|_| derive_realtime_url(&backend_url));
        let ai_base_url =
            std::env::var("ANGO_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_AI_BASE_URL.to_string());
        let ai_model =
            std::env::var("ANGO_AI_MODEL").unwrap_or_else(|_| DEFAULT_AI_MODEL.to_string());

        let http_connect_timeout_secs = parse_u64_env("ANGO_HTTP_CONNECT_TIMEOUT_SECS", 5)?;
        let http_request_timeout_secs = parse_u64_env("ANGO_HTTP_REQUEST_TIMEOUT_SECS", 15)?;

        Ok(Self {
            backend_url,
            backend_key,
            realtime_url,
            ai_base_url,
            ai_api_key,
            ai_model,
            http_connect_timeout_secs,
            http_request_timeout_secs,
        })
    }
}

/// Realtime-endpoint по умолчанию выводится из адреса backend-сервиса.
fn derive_realtime_url(backend_url: &str) -> String {
    let base = backend_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("wss://{base}")
    };
    format!("{ws_base}/realtime/v1/websocket")
}

fn get_required(key: &str) -> ClientResult<String> {
    let value = std::env::var(key)
        .map_err(|_| ClientError::Config(format!("{key} is required")))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ClientError::Config(format!("{key} must not be empty")));
    }
    Ok(value)
}

fn parse_u64_env(key: &str, default: u64) -> ClientResult<u64> {
    let value = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .map_err(|_| ClientError::Config(format!("{key} must be a positive integer")))?;

    if value == 0 {
        return Err(ClientError::Config(format!("{key} must be > 0")));
    }
    Ok(value)
}
