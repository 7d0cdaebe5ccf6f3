use crate::data::profile_repository::{ProfileRepository, ProfileUpsert};
use crate::domain::error::DomainError;
use crate::domain::user::User;

/// Сопоставляет аутентифицированную сессию записи в `profiles`.
///
/// Для пользователя, которого таблица ещё не видела, возвращается профиль
/// по умолчанию; его сохранение — best-effort: неудачный upsert логируется,
/// но вход не блокирует.
pub struct ProfileResolver<R: ProfileRepository> {
    repo: R,
}

impl<R: ProfileRepository> ProfileResolver<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn resolve(&self, user_id: &str, email: &str) -> Result<User, DomainError> {
        if let Some(user) = self.repo.fetch_profile(user_id).await? {
            return Ok(user);
        }

        let user = User::first_sight(user_id, email);
        if let Err(err) = self
            .repo
            .upsert_profile(ProfileUpsert::first_sight(&user))
            .await
        {
            tracing::warn!(user_id, error = %err, "first-sight profile upsert failed");
        }
        Ok(user)
    }

    pub async fn save_profile(&self, user: &User) -> Result<(), DomainError> {
        self.repo
            .upsert_profile(ProfileUpsert::from_user(user))
            .await
    }

    /// Список остальных участников (для страницы членов и списка контактов).
    pub async fn members(&self, current_user_id: &str) -> Result<Vec<User>, DomainError> {
        self.repo.list_other_profiles(current_user_id).await
    }

    /// Загружает новый аватар и прописывает его публичный URL в профиль.
    pub async fn update_avatar(
        &self,
        user_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError> {
        if !content_type.starts_with("image/") {
            return Err(DomainError::Validation {
                field: "avatar",
                message: "must be an image",
            });
        }

        let url = self
            .repo
            .upload_avatar(user_id, file_name, content_type, bytes)
            .await?;
        self.repo.set_avatar(user_id, &url).await?;
        Ok(url)
    }
}
