use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::{User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Video,
}

/// Уровень видимости публикации.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Members,
    Premium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: String,
    pub content_type: ContentType,
    pub body: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub visibility: Visibility,
    pub likes: i64,
    pub reactions: BTreeMap<String, i64>,
    pub views: i64,
    pub comments: Vec<Comment>,
}

/// Публикация, подготовленная к показу конкретному пользователю.
///
/// Для premium-публикации без полного доступа тело и медиа скрыты,
/// метаданные (автор, время, счётчики) остаются видимыми.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: String,
    pub content_type: ContentType,
    pub created_at: DateTime<Utc>,
    pub visibility: Visibility,
    pub locked: bool,
    pub body: Option<String>,
    pub media_url: Option<String>,
    pub likes: i64,
    pub views: i64,
    pub comment_count: usize,
}

impl Post {
    /// Стартовые счётчики реакций новой публикации.
    pub fn seeded_reactions() -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("like".to_string(), 0),
            ("love".to_string(), 0),
            ("fire".to_string(), 0),
        ])
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Комментарии внутри публикации упорядочены по времени создания.
    pub fn sort_comments(&mut self) {
        self.comments
            .sort_by(|a, b| a.created_at.cmp(&b.created_at));
    }

    fn has_full_access(&self, viewer: &User) -> bool {
        viewer.id == self.author_id
            || viewer.role == UserRole::Admin
            || viewer.role == UserRole::Premium
    }

    pub fn render_for(&self, viewer: &User) -> PostView {
        let locked = self.visibility == Visibility::Premium && !self.has_full_access(viewer);
        PostView {
            id: self.id.clone(),
            author_id: self.author_id.clone(),
            author_name: self.author_name.clone(),
            author_avatar: self.author_avatar.clone(),
            content_type: self.content_type,
            created_at: self.created_at,
            visibility: self.visibility,
            locked,
            body: (!locked).then(|| self.body.clone()),
            media_url: if locked { None } else { self.media_url.clone() },
            likes: self.likes,
            views: self.views,
            comment_count: self.comments.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ContentType, Post, Visibility};
    use crate::domain::user::{User, UserRole};

    fn premium_post(author_id: &str) -> Post {
        Post {
            id: "p1".to_string(),
            author_id: author_id.to_string(),
            author_name: "Autor".to_string(),
            author_avatar: "avatar".to_string(),
            content_type: ContentType::Image,
            body: "conteúdo exclusivo".to_string(),
            media_url: Some("https://cdn.example/p1.png".to_string()),
            created_at: Utc::now(),
            visibility: Visibility::Premium,
            likes: 3,
            reactions: Post::seeded_reactions(),
            views: 10,
            comments: Vec::new(),
        }
    }

    fn viewer(id: &str, role: UserRole) -> User {
        let mut user = User::first_sight(id, format!("{id}@example.com"));
        user.role = role;
        user
    }

    #[test]
    fn premium_post_is_locked_for_plain_member() {
        let post = premium_post("author");
        let view = post.render_for(&viewer("member", UserRole::Member));

        assert!(view.locked);
        assert_eq!(view.body, None);
        assert_eq!(view.media_url, None);
        // метаданные остаются видимыми
        assert_eq!(view.author_name, "Autor");
        assert_eq!(view.created_at, post.created_at);
        assert_eq!(view.likes, 3);
    }

    #[test]
    fn premium_post_is_full_for_author_admin_and_premium() {
        let post = premium_post("author");

        for user in [
            viewer("author", UserRole::Member),
            viewer("someone", UserRole::Admin),
            viewer("someone", UserRole::Premium),
        ] {
            let view = post.render_for(&user);
            assert!(!view.locked);
            assert_eq!(view.body.as_deref(), Some("conteúdo exclusivo"));
            assert_eq!(view.media_url.as_deref(), Some("https://cdn.example/p1.png"));
        }
    }

    #[test]
    fn members_post_is_never_locked() {
        let mut post = premium_post("author");
        post.visibility = Visibility::Members;

        let view = post.render_for(&viewer("member", UserRole::Member));
        assert!(!view.locked);
        assert!(view.body.is_some());
    }

    #[test]
    fn sort_comments_orders_ascending() {
        use super::Comment;
        use chrono::Duration;

        let base = Utc::now();
        let comment = |id: &str, offset: i64| Comment {
            id: id.to_string(),
            post_id: "p1".to_string(),
            author_id: "u".to_string(),
            author_name: "Membro".to_string(),
            author_avatar: String::new(),
            body: id.to_string(),
            created_at: base + Duration::seconds(offset),
        };

        let mut post = premium_post("author");
        post.comments = vec![comment("c3", 30), comment("c1", 10), comment("c2", 20)];
        post.sort_comments();

        let ids: Vec<&str> = post.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2", "c3"]);
    }
}
