use serde::{Deserialize, Serialize};

/// Уровень участника сообщества.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "PREMIUM")]
    Premium,
    #[serde(rename = "MEMBER")]
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Premium => "PREMIUM",
            UserRole::Member => "MEMBER",
        }
    }

    /// Неизвестное значение из таблицы трактуется как обычный участник.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "ADMIN" => UserRole::Admin,
            "PREMIUM" => UserRole::Premium,
            _ => UserRole::Member,
        }
    }
}

/// Детерминированный аватар по умолчанию для профиля без загруженного фото.
pub fn default_avatar_url(user_id: &str) -> String {
    format!("https://api.dicebear.com/7.x/bottts/svg?seed={user_id}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: String,
    pub following_ids: Vec<String>,
    pub bio: String,
    pub city: String,
    pub area: String,
    pub is_mentor: bool,
}

impl User {
    /// Профиль по умолчанию для аутентифицированного пользователя,
    /// которого ещё нет в таблице `profiles`.
    pub fn first_sight(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        let id = user_id.into();
        let avatar = default_avatar_url(&id);
        Self {
            id,
            name: "Novo Membro".to_string(),
            email: email.into(),
            role: UserRole::Member,
            avatar,
            following_ids: Vec::new(),
            bio: String::new(),
            city: String::new(),
            area: String::new(),
            is_mentor: false,
        }
    }

    pub fn follows(&self, user_id: &str) -> bool {
        self.following_ids.iter().any(|id| id == user_id)
    }
}
