use crate::data::message_repository::{MessageRepository, MessageSubscription, NewMessage};
use crate::domain::error::DomainError;
use crate::domain::message::{self, PrivateMessage};

/// Переписка активного пользователя с выбранным собеседником.
///
/// История загружается целиком одной выборкой; дальше транскрипт только
/// дополняется событиями подписки (без повторной загрузки — чтобы не мигал
/// экран и не терялась позиция скролла). Отправленное сообщение локально
/// не добавляется: пузырь появляется, когда вставка вернётся эхом через
/// подписку, поэтому дублей не бывает.
pub struct DirectMessageChannel<R: MessageRepository> {
    repo: R,
    self_id: String,
    peer_id: Option<String>,
    transcript: Vec<PrivateMessage>,
    subscription: Option<MessageSubscription>,
    draft: String,
    loading: bool,
}

impl<R: MessageRepository> DirectMessageChannel<R> {
    pub fn new(repo: R, self_id: impl Into<String>) -> Self {
        Self {
            repo,
            self_id: self_id.into(),
            peer_id: None,
            transcript: Vec::new(),
            subscription: None,
            draft: String::new(),
            loading: false,
        }
    }

    pub fn transcript(&self) -> &[PrivateMessage] {
        &self.transcript
    }

    pub fn peer_id(&self) -> Option<&str> {
        self.peer_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Открывает переписку с собеседником: сносит предыдущую подписку,
    /// целиком замещает транскрипт историей и держит новую подписку
    /// на вставки в таблицу сообщений.
    pub async fn open(&mut self, peer_id: &str) -> Result<(), DomainError> {
        self.close();
        self.peer_id = Some(peer_id.to_string());
        self.subscription = Some(self.repo.subscribe_inserts().await?);

        self.loading = true;
        let history = self
            .repo
            .list_conversation(&self.self_id, peer_id)
            .await;
        self.loading = false;

        match history {
            Ok(mut messages) => {
                message::sort_ascending(&mut messages);
                self.transcript = messages;
                Ok(())
            }
            Err(err) => {
                self.transcript.clear();
                tracing::error!(peer_id, error = %err, "conversation fetch failed");
                Err(err)
            }
        }
    }

    /// Выгребает накопившиеся события подписки и дописывает в транскрипт
    /// только сообщения активной пары. События чужих пар — в том числе
    /// отставшие от предыдущего собеседника — отбрасываются.
    pub fn pump(&mut self) -> usize {
        let Some(peer_id) = self.peer_id.clone() else {
            return 0;
        };
        let Some(subscription) = self.subscription.as_mut() else {
            return 0;
        };

        let mut appended = 0;
        while let Some(event) = subscription.try_next() {
            if event.is_between(&self.self_id, &peer_id) {
                self.transcript.push(event);
                appended += 1;
            }
        }
        appended
    }

    /// Отправляет черновик. Поле ввода очищается до round-trip'а;
    /// при ошибке текст восстанавливается и ошибка возвращается наружу.
    pub async fn send(&mut self) -> Result<(), DomainError> {
        let text = self.draft.trim().to_string();
        if text.is_empty() {
            return Ok(());
        }
        let Some(peer_id) = self.peer_id.clone() else {
            return Err(DomainError::Validation {
                field: "peer",
                message: "no conversation selected",
            });
        };

        self.draft.clear();
        let result = self
            .repo
            .insert_message(NewMessage {
                sender_id: self.self_id.clone(),
                receiver_id: peer_id,
                text: text.clone(),
            })
            .await;

        if let Err(err) = result {
            self.draft = text;
            tracing::error!(error = %err, "message send failed");
            return Err(err);
        }
        Ok(())
    }

    /// Закрывает переписку: drop подписки освобождает realtime-канал,
    /// после чего ни одно событие в транскрипт уже не попадёт.
    pub fn close(&mut self) {
        self.subscription = None;
        self.peer_id = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use tokio::sync::mpsc;

    use super::DirectMessageChannel;
    use crate::data::message_repository::{MessageRepository, MessageSubscription, NewMessage};
    use crate::domain::error::DomainError;
    use crate::domain::message::PrivateMessage;

    #[derive(Clone)]
    struct FakeMessageRepo {
        history: Arc<Mutex<Vec<PrivateMessage>>>,
        sent: Arc<Mutex<Vec<NewMessage>>>,
        fail_send: Arc<Mutex<bool>>,
        fail_fetch: Arc<Mutex<bool>>,
        event_tx: Arc<Mutex<Option<mpsc::Sender<PrivateMessage>>>>,
    }

    impl FakeMessageRepo {
        fn new() -> Self {
            Self {
                history: Arc::new(Mutex::new(Vec::new())),
                sent: Arc::new(Mutex::new(Vec::new())),
                fail_send: Arc::new(Mutex::new(false)),
                fail_fetch: Arc::new(Mutex::new(false)),
                event_tx: Arc::new(Mutex::new(None)),
            }
        }

        fn push_event(&self, event: PrivateMessage) {
            let tx = self
                .event_tx
                .lock()
                .expect("event_tx mutex poisoned")
                .clone()
                .expect("subscription must be open");
            tx.try_send(event).expect("event channel must accept");
        }

        fn current_sender(&self) -> mpsc::Sender<PrivateMessage> {
            self.event_tx
                .lock()
                .expect("event_tx mutex poisoned")
                .clone()
                .expect("subscription must be open")
        }
    }

    #[async_trait]
    impl MessageRepository for FakeMessageRepo {
        async fn list_conversation(
            &self,
            a: &str,
            b: &str,
        ) -> Result<Vec<PrivateMessage>, DomainError> {
            if *self.fail_fetch.lock().expect("fail_fetch mutex poisoned") {
                return Err(DomainError::Backend("history unavailable".to_string()));
            }
            Ok(self
                .history
                .lock()
                .expect("history mutex poisoned")
                .iter()
                .filter(|m| m.is_between(a, b))
                .cloned()
                .collect())
        }

        async fn insert_message(&self, input: NewMessage) -> Result<(), DomainError> {
            if *self.fail_send.lock().expect("fail_send mutex poisoned") {
                return Err(DomainError::Backend("insert rejected".to_string()));
            }
            self.sent.lock().expect("sent mutex poisoned").push(input);
            Ok(())
        }

        async fn subscribe_inserts(&self) -> Result<MessageSubscription, DomainError> {
            let (tx, rx) = mpsc::channel(16);
            *self.event_tx.lock().expect("event_tx mutex poisoned") = Some(tx);
            Ok(MessageSubscription::new(rx, Box::new(())))
        }
    }

    fn message(id: &str, sender: &str, receiver: &str, offset: i64) -> PrivateMessage {
        PrivateMessage {
            id: id.to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            text: id.to_string(),
            created_at: Utc::now() + Duration::seconds(offset),
            is_read: false,
        }
    }

    #[tokio::test]
    async fn open_replaces_transcript_with_ascending_pair_history() {
        let repo = FakeMessageRepo::new();
        *repo.history.lock().expect("history mutex poisoned") = vec![
            message("m2", "peer", "me", 20),
            message("m1", "me", "peer", 10),
            message("mx", "peer", "other", 15),
        ];

        let mut channel = DirectMessageChannel::new(repo, "me");
        channel.open("peer").await.expect("open must succeed");

        let ids: Vec<&str> = channel.transcript().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);
        assert!(!channel.is_loading());
    }

    #[tokio::test]
    async fn pump_appends_only_active_pair_events() {
        let repo = FakeMessageRepo::new();
        let mut channel = DirectMessageChannel::new(repo.clone(), "me");
        channel.open("peer").await.expect("open must succeed");

        repo.push_event(message("m1", "peer", "me", 1));
        repo.push_event(message("zz", "peer", "other", 2));
        repo.push_event(message("m2", "me", "peer", 3));

        assert_eq!(channel.pump(), 2);
        let ids: Vec<&str> = channel.transcript().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);
    }

    #[tokio::test]
    async fn switching_peers_reproduces_history_without_leakage() {
        let repo = FakeMessageRepo::new();
        *repo.history.lock().expect("history mutex poisoned") = vec![
            message("b1", "me", "bruno", 10),
            message("b2", "bruno", "me", 20),
            message("c1", "carla", "me", 15),
        ];

        let mut channel = DirectMessageChannel::new(repo.clone(), "me");
        channel.open("bruno").await.expect("open must succeed");

        // подписка первого открытия; при переключении она должна закрыться
        let bruno_sender = repo.current_sender();

        channel.open("carla").await.expect("switch must succeed");
        let ids: Vec<&str> = channel.transcript().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["c1"]);
        assert!(bruno_sender.is_closed());

        // отставшее событие чужой пары в живой подписке отфильтровывается
        repo.push_event(message("b3", "bruno", "me", 30));
        assert_eq!(channel.pump(), 0);

        channel.open("bruno").await.expect("switch back must succeed");
        let ids: Vec<&str> = channel.transcript().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["b1", "b2"]);
    }

    #[tokio::test]
    async fn sent_message_appears_exactly_once_via_echo() {
        let repo = FakeMessageRepo::new();
        let mut channel = DirectMessageChannel::new(repo.clone(), "me");
        channel.open("peer").await.expect("open must succeed");

        channel.set_draft("Olá");
        channel.send().await.expect("send must succeed");

        // пузыря ещё нет: вставка не отражается локально
        assert!(channel.transcript().is_empty());
        assert_eq!(channel.draft(), "");

        let sent = repo.sent.lock().expect("sent mutex poisoned").clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "Olá");

        // backend подтверждает вставку эхом через подписку
        repo.push_event(message("m1", "me", "peer", 1));
        channel.pump();

        let texts: Vec<&str> = channel.transcript().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["m1"]);
        assert_eq!(channel.transcript().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_restores_draft() {
        let repo = FakeMessageRepo::new();
        let mut channel = DirectMessageChannel::new(repo.clone(), "me");
        channel.open("peer").await.expect("open must succeed");

        *repo.fail_send.lock().expect("fail_send mutex poisoned") = true;
        channel.set_draft("mensagem importante");

        let err = channel.send().await.expect_err("send must fail");
        assert!(matches!(err, DomainError::Backend(_)));
        assert_eq!(channel.draft(), "mensagem importante");
    }

    #[tokio::test]
    async fn empty_draft_is_not_sent() {
        let repo = FakeMessageRepo::new();
        let mut channel = DirectMessageChannel::new(repo.clone(), "me");
        channel.open("peer").await.expect("open must succeed");

        channel.set_draft("   ");
        channel.send().await.expect("empty send is a no-op");
        assert!(repo.sent.lock().expect("sent mutex poisoned").is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_transcript_empty_and_loading_cleared() {
        let repo = FakeMessageRepo::new();
        *repo.fail_fetch.lock().expect("fail_fetch mutex poisoned") = true;

        let mut channel = DirectMessageChannel::new(repo, "me");
        let err = channel.open("peer").await.expect_err("open must fail");

        assert!(matches!(err, DomainError::Backend(_)));
        assert!(channel.transcript().is_empty());
        assert!(!channel.is_loading());
    }

    #[tokio::test]
    async fn close_releases_subscription_and_stops_appends() {
        let repo = FakeMessageRepo::new();
        let mut channel = DirectMessageChannel::new(repo.clone(), "me");
        channel.open("peer").await.expect("open must succeed");

        let sender = repo.current_sender();
        channel.close();

        assert!(sender.is_closed());
        assert_eq!(channel.pump(), 0);
        assert_eq!(channel.peer_id(), None);
    }
}
