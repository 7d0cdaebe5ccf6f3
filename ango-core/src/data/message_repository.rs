use std::any::Any;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::error::DomainError;
use crate::domain::message::PrivateMessage;

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
}

/// Подписка на события вставки в таблицу сообщений.
///
/// Подписка общая на всю таблицу; фильтрация по активной паре собеседников
/// выполняется потребителем. Drop хэндла освобождает подписку — вместе с
/// `_release` завершается и задача, читающая поток событий.
pub struct MessageSubscription {
    receiver: mpsc::Receiver<PrivateMessage>,
    _release: Box<dyn Any + Send>,
}

impl MessageSubscription {
    pub fn new(receiver: mpsc::Receiver<PrivateMessage>, release: Box<dyn Any + Send>) -> Self {
        Self {
            receiver,
            _release: release,
        }
    }

    /// Неблокирующая выборка очередного события, если оно уже доставлено.
    pub fn try_next(&mut self) -> Option<PrivateMessage> {
        self.receiver.try_recv().ok()
    }

    /// Ожидание следующего события. `None` — поток завершён.
    pub async fn next_event(&mut self) -> Option<PrivateMessage> {
        self.receiver.recv().await
    }
}

impl std::fmt::Debug for MessageSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSubscription").finish_non_exhaustive()
    }
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Слияние обоих направлений переписки пары `{a, b}` по возрастанию времени.
    async fn list_conversation(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Vec<PrivateMessage>, DomainError>;
    async fn insert_message(&self, input: NewMessage) -> Result<(), DomainError>;
    async fn subscribe_inserts(&self) -> Result<MessageSubscription, DomainError>;
}
