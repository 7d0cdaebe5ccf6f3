use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::user::{User, UserRole};

#[derive(Debug, Clone)]
pub struct ProfileUpsert {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
}

impl ProfileUpsert {
    /// Минимальная запись, создаваемая при первом входе пользователя.
    pub fn first_sight(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            avatar: None,
            bio: None,
            city: None,
            area: None,
        }
    }

    /// Полная запись для сохранения отредактированного профиля.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            avatar: Some(user.avatar.clone()),
            bio: Some(user.bio.clone()),
            city: Some(user.city.clone()),
            area: Some(user.area.clone()),
        }
    }
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<User>, DomainError>;
    async fn upsert_profile(&self, input: ProfileUpsert) -> Result<(), DomainError>;
    async fn list_other_profiles(&self, excluding: &str) -> Result<Vec<User>, DomainError>;
    async fn set_avatar(&self, user_id: &str, url: &str) -> Result<(), DomainError>;
    /// Загружает картинку в бакет аватаров и возвращает её публичный URL.
    async fn upload_avatar(
        &self,
        user_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError>;
}
