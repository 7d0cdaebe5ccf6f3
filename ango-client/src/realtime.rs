use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use ango_core::data::message_repository::MessageSubscription;
use ango_core::domain::message::PrivateMessage;

use crate::error::ClientResult;
use crate::settings::Settings;

const MESSAGES_TOPIC: &str = "realtime:public:messages";
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Подписка на realtime-канал backend-сервиса (phoenix-протокол
/// поверх websocket).
///
/// Подписка оформляется на всю таблицу сообщений; отбор по паре
/// собеседников выполняет потребитель.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    url: String,
    api_key: String,
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug, Deserialize)]
struct FrameDto {
    event: String,
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MessageRowDto {
    id: String,
    sender_id: String,
    receiver_id: String,
    text: String,
    created_at: DateTime<Utc>,
    is_read: Option<bool>,
}

fn join_frame() -> String {
    json!({
        "topic": MESSAGES_TOPIC,
        "event": "phx_join",
        "payload": {
            "config": {
                "postgres_changes": [
                    { "event": "INSERT", "schema": "public", "table": "messages" }
                ]
            }
        },
        "ref": "1"
    })
    .to_string()
}

fn heartbeat_frame(reference: u64) -> String {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": reference.to_string()
    })
    .to_string()
}

/// Извлекает вставленную строку таблицы сообщений из кадра канала.
/// Кадры других событий (ответы на join, heartbeat, presence) дают `None`.
fn decode_insert(text: &str) -> Option<PrivateMessage> {
    let frame: FrameDto = serde_json::from_str(text).ok()?;
    if frame.event != "postgres_changes" {
        return None;
    }

    // сервер оборачивает изменение в payload.data, старые версии — нет
    let change = frame.payload.get("data").unwrap_or(&frame.payload);
    if change.get("type").and_then(|kind| kind.as_str()) != Some("INSERT") {
        return None;
    }

    let record = change.get("record")?;
    let row: MessageRowDto = serde_json::from_value(record.clone()).ok()?;
    Some(PrivateMessage {
        id: row.id,
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        text: row.text,
        created_at: row.created_at,
        is_read: row.is_read.unwrap_or(false),
    })
}

impl RealtimeClient {
    /// Создаёт клиента realtime-канала по конфигурации.
    pub fn new(settings: &Settings) -> Self {
        Self {
            url: settings.realtime_url.clone(),
            api_key: settings.backend_key.clone(),
        }
    }

    /// Открывает подписку на вставки в таблицу сообщений.
    ///
    /// Фоновая задача читает кадры и шлёт heartbeat; при сбросе подписки
    /// задача снимается, соединение закрывается.
    pub async fn subscribe_message_inserts(&self) -> ClientResult<MessageSubscription> {
        let endpoint = format!("{}?apikey={}&vsn=1.0.0", self.url, self.api_key);
        let (stream, _response) = connect_async(endpoint).await?;
        let (mut writer, mut reader) = stream.split();

        writer.send(Message::Text(join_frame().into())).await?;
        tracing::debug!(topic = MESSAGES_TOPIC, "realtime channel joined");

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await;
            let mut reference: u64 = 2;

            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        let frame = heartbeat_frame(reference);
                        reference += 1;
                        if writer.send(Message::Text(frame.into())).await.is_err() {
                            tracing::warn!("realtime heartbeat failed, closing subscription");
                            break;
                        }
                    }
                    incoming = reader.next() => {
                        match incoming {
                            Some(Ok(Message::Text(text))) => {
                                if let Some(message) = decode_insert(text.as_str())
                                    && tx.send(message).await.is_err()
                                {
                                    // подписку сбросили
                                    break;
                                }
                            }
                            Some(Ok(Message::Ping(payload))) => {
                                if writer.send(Message::Pong(payload)).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::warn!("realtime connection closed by server");
                                break;
                            }
                            Some(Err(err)) => {
                                tracing::warn!(error = %err, "realtime read failed");
                                break;
                            }
                            Some(Ok(_)) => {}
                        }
                    }
                }
            }
        });

        Ok(MessageSubscription::new(rx, Box::new(AbortOnDrop(handle))))
    }
}
