use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::post::{Comment, ContentType, Post, Visibility};

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: String,
    pub content_type: ContentType,
    pub body: String,
    pub media_url: Option<String>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: String,
    pub author_id: String,
    pub body: String,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Один денормализованный запрос: публикации вместе с авторами
    /// и вложенными комментариями.
    async fn list_posts_with_comments(&self) -> Result<Vec<Post>, DomainError>;
    async fn insert_post(&self, input: NewPost) -> Result<(), DomainError>;
    async fn fetch_likes(&self, post_id: &str) -> Result<i64, DomainError>;
    async fn store_likes(&self, post_id: &str, likes: i64) -> Result<(), DomainError>;
    async fn insert_comment(&self, input: NewComment) -> Result<Comment, DomainError>;
    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<(), DomainError>;
    async fn delete_comment(&self, comment_id: &str) -> Result<(), DomainError>;
}
