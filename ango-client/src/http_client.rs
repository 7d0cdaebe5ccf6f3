use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use ango_core::data::message_repository::{
    MessageRepository, MessageSubscription, NewMessage,
};
use ango_core::data::post_repository::{NewComment, NewPost, PostRepository};
use ango_core::data::profile_repository::{ProfileRepository, ProfileUpsert};
use ango_core::domain::error::DomainError;
use ango_core::domain::message::PrivateMessage;
use ango_core::domain::post::{Comment, ContentType, Post, Visibility};
use ango_core::domain::user::{User, UserRole, default_avatar_url};

use crate::error::{ClientError, ClientResult};
use crate::realtime::RealtimeClient;
use crate::settings::Settings;

/// Денормализованная выборка ленты: публикации вместе с автором
/// и комментариями (у каждого комментария — свой автор).
const FEED_SELECT: &str =
    "*,author:profiles!posts_user_id_fkey(name,avatar),comments(*,author:profiles(name,avatar))";

const FALLBACK_MEMBER_NAME: &str = "Membro Elite";
const FALLBACK_COMMENT_AUTHOR: &str = "Membro";

// ---------- DTO: строки таблиц ----------

#[derive(Debug, Deserialize)]
struct ProfileDto {
    id: String,
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    avatar: Option<String>,
    following_ids: Option<Vec<String>>,
    bio: Option<String>,
    city: Option<String>,
    area: Option<String>,
    is_mentor: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct AuthorDto {
    name: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentDto {
    id: String,
    post_id: Option<String>,
    user_id: String,
    content: String,
    created_at: DateTime<Utc>,
    author: Option<AuthorDto>,
}

#[derive(Debug, Deserialize)]
struct PostDto {
    id: String,
    user_id: String,
    #[serde(rename = "type")]
    content_type: ContentType,
    content: String,
    media_url: Option<String>,
    created_at: DateTime<Utc>,
    visibility: Visibility,
    likes: Option<i64>,
    reactions: Option<std::collections::BTreeMap<String, i64>>,
    views: Option<i64>,
    author: Option<AuthorDto>,
    comments: Option<Vec<CommentDto>>,
}

#[derive(Debug, Deserialize)]
struct LikesRowDto {
    likes: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MessageDto {
    id: String,
    sender_id: String,
    receiver_id: String,
    text: String,
    created_at: DateTime<Utc>,
    is_read: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthUserDto {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponseDto {
    access_token: Option<String>,
    user: Option<AuthUserDto>,
}

// ---------- DTO: тела запросов ----------

#[derive(Debug, Serialize)]
struct CredentialsDto<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ProfileUpsertDto<'a> {
    id: &'a str,
    email: &'a str,
    name: &'a str,
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    area: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct AvatarPatchDto<'a> {
    avatar: &'a str,
}

#[derive(Debug, Serialize)]
struct NewPostDto<'a> {
    user_id: &'a str,
    #[serde(rename = "type")]
    content_type: ContentType,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_url: Option<&'a str>,
    visibility: Visibility,
}

#[derive(Debug, Serialize)]
struct LikesPatchDto {
    likes: i64,
}

#[derive(Debug, Serialize)]
struct NewCommentDto<'a> {
    post_id: &'a str,
    user_id: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CommentPatchDto<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct NewMessageDto<'a> {
    sender_id: &'a str,
    receiver_id: &'a str,
    text: &'a str,
}

// ---------- маппинг DTO -> домен ----------

impl ProfileDto {
    fn into_user(self) -> User {
        let avatar = self
            .avatar
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| default_avatar_url(&self.id));
        User {
            avatar,
            name: self
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| FALLBACK_MEMBER_NAME.to_string()),
            email: self.email.unwrap_or_default(),
            role: self
                .role
                .as_deref()
                .map(UserRole::from_wire)
                .unwrap_or(UserRole::Member),
            following_ids: self.following_ids.unwrap_or_default(),
            bio: self.bio.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            area: self.area.unwrap_or_default(),
            is_mentor: self.is_mentor.unwrap_or(false),
            id: self.id,
        }
    }
}

impl CommentDto {
    fn into_comment(self, post_id: &str) -> Comment {
        let author = self.author.unwrap_or(AuthorDto {
            name: None,
            avatar: None,
        });
        Comment {
            id: self.id,
            post_id: self.post_id.unwrap_or_else(|| post_id.to_string()),
            author_name: author
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| FALLBACK_COMMENT_AUTHOR.to_string()),
            author_avatar: author
                .avatar
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| default_avatar_url(&self.user_id)),
            author_id: self.user_id,
            body: self.content,
            created_at: self.created_at,
        }
    }
}

impl From<PostDto> for Post {
    fn from(dto: PostDto) -> Self {
        let author = dto.author.unwrap_or(AuthorDto {
            name: None,
            avatar: None,
        });
        let comments = dto
            .comments
            .unwrap_or_default()
            .into_iter()
            .map(|comment| comment.into_comment(&dto.id))
            .collect();
        Post {
            author_name: author
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| FALLBACK_MEMBER_NAME.to_string()),
            author_avatar: author
                .avatar
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| default_avatar_url(&dto.user_id)),
            author_id: dto.user_id,
            content_type: dto.content_type,
            body: dto.content,
            media_url: dto.media_url,
            created_at: dto.created_at,
            visibility: dto.visibility,
            likes: dto.likes.unwrap_or(0),
            reactions: dto.reactions.unwrap_or_else(Post::seeded_reactions),
            views: dto.views.unwrap_or(0),
            comments,
            id: dto.id,
        }
    }
}

impl From<MessageDto> for PrivateMessage {
    fn from(dto: MessageDto) -> Self {
        PrivateMessage {
            id: dto.id,
            sender_id: dto.sender_id,
            receiver_id: dto.receiver_id,
            text: dto.text,
            created_at: dto.created_at,
            is_read: dto.is_read.unwrap_or(false),
        }
    }
}

/// Активная сессия backend-сервиса.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer-токен сессии.
    pub access_token: String,
    /// Идентификатор аутентифицированного пользователя.
    pub user_id: String,
    /// Email аутентифицированного пользователя.
    pub email: String,
}

/// Значение фильтра `or=` для выборки переписки пары в обе стороны.
fn conversation_filter(a: &str, b: &str) -> String {
    format!(
        "(and(sender_id.eq.{a},receiver_id.eq.{b}),and(sender_id.eq.{b},receiver_id.eq.{a}))"
    )
}

#[derive(Debug, Clone)]
/// HTTP-шлюз к backend-сервису: таблицы, сессии, бакет аватаров,
/// realtime-подписка.
///
/// Клоны клиента разделяют одну сессию; её токен подставляется во все
/// запросы после входа.
pub struct BackendClient {
    base_url: String,
    api_key: String,
    http: Client,
    realtime: RealtimeClient,
    session: Arc<RwLock<Option<Session>>>,
}

impl BackendClient {
    /// Создаёт шлюз по конфигурации.
    pub fn new(settings: &Settings) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(settings.http_connect_timeout_secs))
            .timeout(Duration::from_secs(settings.http_request_timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: settings.backend_url.trim_end_matches('/').to_string(),
            api_key: settings.backend_key.clone(),
            http,
            realtime: RealtimeClient::new(settings),
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Текущая сессия, если вход выполнен.
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .expect("session lock poisoned")
            .clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn bearer_token(&self) -> String {
        self.session()
            .map(|session| session.access_token)
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer_token())
    }

    async fn decode_error(response: reqwest::Response) -> ClientError {
        let status = response.status();
        match response.json::<ErrorResponseDto>().await {
            Ok(body) => {
                let message = body.message.or(body.msg).or(body.error_description);
                ClientError::from_http_status(status, body.code.as_deref(), message)
            }
            Err(_) => ClientError::from_http_status(status, None, None),
        }
    }

    async fn expect_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response)
    }

    // ---------- таблицы ----------

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<Vec<T>> {
        let response = self
            .request(Method::GET, &format!("/rest/v1/{table}"))
            .query(query)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        let response = Self::expect_success(response).await?;
        response.json::<Vec<T>>().await.map_err(ClientError::from)
    }

    async fn insert_row<B: Serialize>(&self, table: &str, body: &B) -> ClientResult<()> {
        let response = self
            .request(Method::POST, &format!("/rest/v1/{table}"))
            .json(body)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn insert_row_returning<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(Method::POST, &format!("/rest/v1/{table}"))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        let response = Self::expect_success(response).await?;
        let mut rows = response.json::<Vec<T>>().await.map_err(ClientError::from)?;
        if rows.is_empty() {
            return Err(ClientError::InvalidRequest(
                "insert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    async fn upsert_row<B: Serialize>(&self, table: &str, body: &B) -> ClientResult<()> {
        let response = self
            .request(Method::POST, &format!("/rest/v1/{table}"))
            .header("Prefer", "resolution=merge-duplicates")
            .json(body)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn patch_rows<B: Serialize>(
        &self,
        table: &str,
        filter: &[(&str, &str)],
        body: &B,
    ) -> ClientResult<()> {
        let response = self
            .request(Method::PATCH, &format!("/rest/v1/{table}"))
            .query(filter)
            .json(body)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn delete_rows(&self, table: &str, filter: &[(&str, &str)]) -> ClientResult<()> {
        let response = self
            .request(Method::DELETE, &format!("/rest/v1/{table}"))
            .query(filter)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    // ---------- сессии ----------

    async fn auth_request(&self, path: &str, email: &str, password: &str) -> ClientResult<Session> {
        let response = self
            .request(Method::POST, path)
            .json(&CredentialsDto { email, password })
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        let response = Self::expect_success(response).await?;
        let dto = response
            .json::<AuthResponseDto>()
            .await
            .map_err(ClientError::from)?;

        let access_token = dto.access_token.ok_or_else(|| {
            ClientError::InvalidRequest("confirmação de email pendente".to_string())
        })?;
        let user = dto
            .user
            .ok_or_else(|| ClientError::InvalidRequest("auth response without user".to_string()))?;

        let session = Session {
            access_token,
            user_id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
        };
        *self.session.write().expect("session lock poisoned") = Some(session.clone());
        Ok(session)
    }

    /// Регистрирует пользователя и сохраняет сессию в клиенте.
    pub async fn sign_up(&self, email: &str, password: &str) -> ClientResult<Session> {
        self.auth_request("/auth/v1/signup", email, password).await
    }

    /// Вход по паролю; сессия сохраняется в клиенте.
    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Session> {
        self.auth_request("/auth/v1/token?grant_type=password", email, password)
            .await
    }

    /// Завершает сессию на сервере и забывает её локально.
    pub async fn sign_out(&self) -> ClientResult<()> {
        let response = self
            .request(Method::POST, "/auth/v1/logout")
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        Self::expect_success(response).await?;
        *self.session.write().expect("session lock poisoned") = None;
        Ok(())
    }

    // ---------- бакет аватаров ----------

    async fn upload_avatar_object(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<()> {
        let response = self
            .request(Method::POST, &format!("/storage/v1/object/avatars/{path}"))
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    fn avatar_public_url(&self, path: &str) -> String {
        self.endpoint(&format!("/storage/v1/object/public/avatars/{path}"))
    }
}

#[async_trait]
impl ProfileRepository for BackendClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<User>, DomainError> {
        let filter = format!("eq.{user_id}");
        let rows: Vec<ProfileDto> = self
            .get_rows("profiles", &[("select", "*"), ("id", &filter)])
            .await?;
        Ok(rows.into_iter().next().map(ProfileDto::into_user))
    }

    async fn upsert_profile(&self, input: ProfileUpsert) -> Result<(), DomainError> {
        let body = ProfileUpsertDto {
            id: &input.id,
            email: &input.email,
            name: &input.name,
            role: input.role.as_str(),
            avatar: input.avatar.as_deref(),
            bio: input.bio.as_deref(),
            city: input.city.as_deref(),
            area: input.area.as_deref(),
        };
        Ok(self.upsert_row("profiles", &body).await?)
    }

    async fn list_other_profiles(&self, excluding: &str) -> Result<Vec<User>, DomainError> {
        let filter = format!("neq.{excluding}");
        let rows: Vec<ProfileDto> = self
            .get_rows("profiles", &[("select", "*"), ("id", &filter)])
            .await?;
        Ok(rows.into_iter().map(ProfileDto::into_user).collect())
    }

    async fn set_avatar(&self, user_id: &str, url: &str) -> Result<(), DomainError> {
        let filter = format!("eq.{user_id}");
        Ok(self
            .patch_rows("profiles", &[("id", &filter)], &AvatarPatchDto { avatar: url })
            .await?)
    }

    async fn upload_avatar(
        &self,
        user_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError> {
        let extension = file_name.rsplit('.').next().unwrap_or("bin");
        let path = format!("{user_id}/{}.{extension}", Utc::now().timestamp_millis());

        self.upload_avatar_object(&path, content_type, bytes).await?;
        Ok(self.avatar_public_url(&path))
    }
}

#[async_trait]
impl PostRepository for BackendClient {
    async fn list_posts_with_comments(&self) -> Result<Vec<Post>, DomainError> {
        let rows: Vec<PostDto> = self
            .get_rows(
                "posts",
                &[("select", FEED_SELECT), ("order", "created_at.desc")],
            )
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn insert_post(&self, input: NewPost) -> Result<(), DomainError> {
        let body = NewPostDto {
            user_id: &input.author_id,
            content_type: input.content_type,
            content: &input.body,
            media_url: input.media_url.as_deref(),
            visibility: input.visibility,
        };
        Ok(self.insert_row("posts", &body).await?)
    }

    async fn fetch_likes(&self, post_id: &str) -> Result<i64, DomainError> {
        let filter = format!("eq.{post_id}");
        let rows: Vec<LikesRowDto> = self
            .get_rows("posts", &[("select", "likes"), ("id", &filter)])
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::NotFound(format!("post id: {post_id}")))?;
        Ok(row.likes.unwrap_or(0))
    }

    async fn store_likes(&self, post_id: &str, likes: i64) -> Result<(), DomainError> {
        let filter = format!("eq.{post_id}");
        Ok(self
            .patch_rows("posts", &[("id", &filter)], &LikesPatchDto { likes })
            .await?)
    }

    async fn insert_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let body = NewCommentDto {
            post_id: &input.post_id,
            user_id: &input.author_id,
            content: &input.body,
        };
        let dto: CommentDto = self.insert_row_returning("comments", &body).await?;
        Ok(dto.into_comment(&input.post_id))
    }

    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<(), DomainError> {
        let filter = format!("eq.{comment_id}");
        Ok(self
            .patch_rows(
                "comments",
                &[("id", &filter)],
                &CommentPatchDto { content: body },
            )
            .await?)
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), DomainError> {
        let filter = format!("eq.{comment_id}");
        Ok(self.delete_rows("comments", &[("id", &filter)]).await?)
    }
}

#[async_trait]
impl MessageRepository for BackendClient {
    async fn list_conversation(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Vec<PrivateMessage>, DomainError> {
        let filter = conversation_filter(a, b);
        let rows: Vec<MessageDto> = self
            .get_rows(
                "messages",
                &[
                    ("select", "*"),
                    ("or", &filter),
                    ("order", "created_at.asc"),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(PrivateMessage::from).collect())
    }

    async fn insert_message(&self, input: NewMessage) -> Result<(), DomainError> {
        let body = NewMessageDto {
            sender_id: &input.sender_id,
            receiver_id: &input.receiver_id,
            text: &input.text,
        };
        Ok(self.insert_row("messages", &body).await?)
    }

    async fn subscribe_inserts(&self) -> Result<MessageSubscription, DomainError> {
        Ok(self.realtime.subscribe_message_inserts().await?)
    }
}
