use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl PrivateMessage {
    /// Принадлежит ли сообщение неупорядоченной паре собеседников `{a, b}`.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Порядок показа переписки: по времени создания, при равенстве — по id.
pub fn sort_ascending(messages: &mut [PrivateMessage]) {
    messages.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{PrivateMessage, sort_ascending};

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

    #[test]
    fn is_between_ignores_direction() {
        let m = message("m1", "a", "b", 0);

        assert!(m.is_between("a", "b"));
        assert!(m.is_between("b", "a"));
        assert!(!m.is_between("a", "c"));
        assert!(!m.is_between("c", "b"));
    }

    #[test]
    fn sort_ascending_orders_by_time_then_id() {
        let mut messages = vec![
            message("m3", "a", "b", 20),
            message("m1", "a", "b", 0),
            message("m2", "b", "a", 0),
        ];
        sort_ascending(&mut messages);

        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
    }
}
