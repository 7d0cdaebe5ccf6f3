use crate::data::post_repository::{NewComment, NewPost, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{ContentType, Post, PostView, Visibility};
use crate::domain::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedFilter {
    #[default]
    All,
    Following,
}

/// Черновик новой публикации из редактора.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub content_type: ContentType,
    pub body: String,
    pub media_url: Option<String>,
    pub visibility: Option<Visibility>,
}

/// Локальное состояние ленты сообщества.
///
/// Лайки и комментарии применяются оптимистично: локальная дельта сразу,
/// авторитетное состояние — при следующем полном `refresh()`. Гонка двух
/// одновременных лайков из разных сессий принята: по счётчику побеждает
/// последняя запись.
pub struct FeedService<R: PostRepository> {
    repo: R,
    viewer: User,
    posts: Vec<Post>,
    filter: FeedFilter,
    loading: bool,
}

impl<R: PostRepository> FeedService<R> {
    pub fn new(repo: R, viewer: User) -> Self {
        Self {
            repo,
            viewer,
            posts: Vec::new(),
            filter: FeedFilter::All,
            loading: false,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn viewer(&self) -> &User {
        &self.viewer
    }

    pub fn set_viewer(&mut self, viewer: User) {
        self.viewer = viewer;
    }

    /// Публикации под активным фильтром, в порядке показа.
    pub fn visible_posts(&self) -> Vec<&Post> {
        self.posts
            .iter()
            .filter(|post| match self.filter {
                FeedFilter::All => true,
                FeedFilter::Following => self.viewer.follows(&post.author_id),
            })
            .collect()
    }

    /// То же, но с применённой редакцией premium-контента для зрителя.
    pub fn rendered_posts(&self) -> Vec<PostView> {
        self.visible_posts()
            .into_iter()
            .map(|post| post.render_for(&self.viewer))
            .collect()
    }

    pub async fn set_filter(&mut self, filter: FeedFilter) -> Result<(), DomainError> {
        if self.filter == filter {
            return Ok(());
        }
        self.filter = filter;
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<(), DomainError> {
        self.loading = true;
        let fetched = self.repo.list_posts_with_comments().await;
        self.loading = false;

        match fetched {
            Ok(mut posts) => {
                posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                for post in &mut posts {
                    post.sort_comments();
                }
                self.posts = posts;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "feed fetch failed");
                Err(err)
            }
        }
    }

    pub async fn publish(&mut self, draft: PostDraft) -> Result<(), DomainError> {
        let body = draft.body.trim().to_string();
        if body.is_empty() {
            return Err(DomainError::Validation {
                field: "content",
                message: "must not be empty",
            });
        }

        self.repo
            .insert_post(NewPost {
                author_id: self.viewer.id.clone(),
                content_type: draft.content_type,
                body,
                media_url: draft.media_url,
                visibility: draft.visibility.unwrap_or(Visibility::Members),
            })
            .await?;
        self.refresh().await
    }

    /// Лайк по схеме read-then-increment: прочитать счётчик, записать
    /// `счётчик + 1`, затем отразить инкремент локально.
    pub async fn like(&mut self, post_id: &str) -> Result<i64, DomainError> {
        let current = self.repo.fetch_likes(post_id).await?;
        self.repo.store_likes(post_id, current + 1).await?;

        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.likes += 1;
        }
        Ok(current + 1)
    }

    pub async fn add_comment(&mut self, post_id: &str, body: &str) -> Result<(), DomainError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(DomainError::Validation {
                field: "comment",
                message: "must not be empty",
            });
        }

        let comment = self
            .repo
            .insert_comment(NewComment {
                post_id: post_id.to_string(),
                author_id: self.viewer.id.clone(),
                body: body.to_string(),
            })
            .await?;

        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.comments.push(comment);
        }
        Ok(())
    }

    pub async fn edit_comment(
        &mut self,
        post_id: &str,
        comment_id: &str,
        body: &str,
    ) -> Result<(), DomainError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(DomainError::Validation {
                field: "comment",
                message: "must not be empty",
            });
        }

        self.repo.update_comment(comment_id, body).await?;

        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            if let Some(comment) = post.comments.iter_mut().find(|c| c.id == comment_id) {
                comment.body = body.to_string();
            }
        }
        Ok(())
    }

    pub async fn delete_comment(
        &mut self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<(), DomainError> {
        self.repo.delete_comment(comment_id).await?;

        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.comments.retain(|c| c.id != comment_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use super::{FeedFilter, FeedService, PostDraft};
    use crate::data::post_repository::{NewComment, NewPost, PostRepository};
    use crate::domain::error::DomainError;
    use crate::domain::post::{Comment, ContentType, Post, Visibility};
    use crate::domain::user::{User, UserRole};

    #[derive(Clone)]
    struct FakePostRepo {
        list_result: Arc<Mutex<Vec<Post>>>,
        list_calls: Arc<Mutex<usize>>,
        inserted: Arc<Mutex<Vec<NewPost>>>,
        likes: Arc<Mutex<HashMap<String, i64>>>,
        stored_likes: Arc<Mutex<Vec<(String, i64)>>>,
        comments: Arc<Mutex<Vec<NewComment>>>,
        fail_list: Arc<Mutex<bool>>,
    }

    impl FakePostRepo {
        fn new() -> Self {
            Self {
                list_result: Arc::new(Mutex::new(Vec::new())),
                list_calls: Arc::new(Mutex::new(0)),
                inserted: Arc::new(Mutex::new(Vec::new())),
                likes: Arc::new(Mutex::new(HashMap::new())),
                stored_likes: Arc::new(Mutex::new(Vec::new())),
                comments: Arc::new(Mutex::new(Vec::new())),
                fail_list: Arc::new(Mutex::new(false)),
            }
        }
    }

    #[async_trait]
    impl PostRepository for FakePostRepo {
        async fn list_posts_with_comments(&self) -> Result<Vec<Post>, DomainError> {
            *self.list_calls.lock().expect("list_calls mutex poisoned") += 1;
            if *self.fail_list.lock().expect("fail_list mutex poisoned") {
                return Err(DomainError::Backend("feed unavailable".to_string()));
            }
            Ok(self
                .list_result
                .lock()
                .expect("list_result mutex poisoned")
                .clone())
        }

        async fn insert_post(&self, input: NewPost) -> Result<(), DomainError> {
            self.inserted
                .lock()
                .expect("inserted mutex poisoned")
                .push(input);
            Ok(())
        }

        async fn fetch_likes(&self, post_id: &str) -> Result<i64, DomainError> {
            Ok(self
                .likes
                .lock()
                .expect("likes mutex poisoned")
                .get(post_id)
                .copied()
                .unwrap_or(0))
        }

        async fn store_likes(&self, post_id: &str, likes: i64) -> Result<(), DomainError> {
            self.likes
                .lock()
                .expect("likes mutex poisoned")
                .insert(post_id.to_string(), likes);
            self.stored_likes
                .lock()
                .expect("stored_likes mutex poisoned")
                .push((post_id.to_string(), likes));
            Ok(())
        }

        async fn insert_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
            self.comments
                .lock()
                .expect("comments mutex poisoned")
                .push(input.clone());
            Ok(Comment {
                id: format!("c{}", self.comments.lock().expect("comments mutex poisoned").len()),
                post_id: input.post_id,
                author_id: input.author_id,
                author_name: "Membro".to_string(),
                author_avatar: String::new(),
                body: input.body,
                created_at: Utc::now(),
            })
        }

        async fn update_comment(&self, _comment_id: &str, _body: &str) -> Result<(), DomainError> {
            Ok(())
        }

        async fn delete_comment(&self, _comment_id: &str) -> Result<(), DomainError> {
            Ok(())
        }
    }

    fn viewer() -> User {
        User::first_sight("viewer", "viewer@example.com")
    }

    fn sample_post(id: &str, author_id: &str, offset_secs: i64) -> Post {
        Post {
            id: id.to_string(),
            author_id: author_id.to_string(),
            author_name: "Autor".to_string(),
            author_avatar: String::new(),
            content_type: ContentType::Text,
            body: format!("post {id}"),
            media_url: None,
            created_at: Utc::now() + Duration::seconds(offset_secs),
            visibility: Visibility::Members,
            likes: 0,
            reactions: Post::seeded_reactions(),
            views: 0,
            comments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn refresh_sorts_posts_descending_and_comments_ascending() {
        let repo = FakePostRepo::new();
        let mut older = sample_post("p1", "a1", 0);
        let newer = sample_post("p2", "a1", 60);
        let base = Utc::now();
        older.comments = vec![
            Comment {
                id: "c2".to_string(),
                post_id: "p1".to_string(),
                author_id: "a2".to_string(),
                author_name: "Membro".to_string(),
                author_avatar: String::new(),
                body: "depois".to_string(),
                created_at: base + Duration::seconds(20),
            },
            Comment {
                id: "c1".to_string(),
                post_id: "p1".to_string(),
                author_id: "a2".to_string(),
                author_name: "Membro".to_string(),
                author_avatar: String::new(),
                body: "antes".to_string(),
                created_at: base,
            },
        ];
        *repo.list_result.lock().expect("list_result mutex poisoned") = vec![older, newer];

        let mut feed = FeedService::new(repo, viewer());
        feed.refresh().await.expect("refresh must succeed");

        let ids: Vec<&str> = feed.posts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p2", "p1"]);

        let comment_ids: Vec<&str> = feed.posts()[1]
            .comments
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(comment_ids, ["c1", "c2"]);
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn refresh_failure_clears_loading_flag() {
        let repo = FakePostRepo::new();
        *repo.fail_list.lock().expect("fail_list mutex poisoned") = true;

        let mut feed = FeedService::new(repo, viewer());
        let err = feed.refresh().await.expect_err("refresh must fail");

        assert!(matches!(err, DomainError::Backend(_)));
        assert!(!feed.is_loading());
        assert!(feed.posts().is_empty());
    }

    #[tokio::test]
    async fn following_filter_keeps_only_followed_authors() {
        let repo = FakePostRepo::new();
        *repo.list_result.lock().expect("list_result mutex poisoned") = vec![
            sample_post("p1", "followed", 0),
            sample_post("p2", "stranger", 10),
        ];

        let mut user = viewer();
        user.following_ids = vec!["followed".to_string()];
        let mut feed = FeedService::new(repo.clone(), user);
        feed.refresh().await.expect("refresh must succeed");

        assert_eq!(feed.visible_posts().len(), 2);

        feed.set_filter(FeedFilter::Following)
            .await
            .expect("filter switch must succeed");
        let visible: Vec<&str> = feed.visible_posts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(visible, ["p1"]);

        // смена фильтра пересчитывает ленту заново
        assert_eq!(*repo.list_calls.lock().expect("list_calls mutex poisoned"), 2);
    }

    #[tokio::test]
    async fn double_like_increments_by_exactly_two() {
        let repo = FakePostRepo::new();
        *repo.list_result.lock().expect("list_result mutex poisoned") =
            vec![sample_post("p1", "a1", 0)];

        let mut feed = FeedService::new(repo.clone(), viewer());
        feed.refresh().await.expect("refresh must succeed");

        feed.like("p1").await.expect("first like must succeed");
        feed.like("p1").await.expect("second like must succeed");

        assert_eq!(feed.posts()[0].likes, 2);
        let stored = repo
            .stored_likes
            .lock()
            .expect("stored_likes mutex poisoned")
            .clone();
        assert_eq!(stored, vec![("p1".to_string(), 1), ("p1".to_string(), 2)]);
    }

    #[tokio::test]
    async fn publish_inserts_then_refreshes() {
        let repo = FakePostRepo::new();
        let mut feed = FeedService::new(repo.clone(), viewer());

        feed.publish(PostDraft {
            content_type: ContentType::Text,
            body: "  nova publicação  ".to_string(),
            media_url: None,
            visibility: None,
        })
        .await
        .expect("publish must succeed");

        let inserted = repo.inserted.lock().expect("inserted mutex poisoned");
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].body, "nova publicação");
        assert_eq!(inserted[0].visibility, Visibility::Members);
        assert_eq!(*repo.list_calls.lock().expect("list_calls mutex poisoned"), 1);
    }

    #[tokio::test]
    async fn publish_rejects_empty_body() {
        let repo = FakePostRepo::new();
        let mut feed = FeedService::new(repo.clone(), viewer());

        let err = feed
            .publish(PostDraft {
                content_type: ContentType::Text,
                body: "   ".to_string(),
                media_url: None,
                visibility: None,
            })
            .await
            .expect_err("empty body must be rejected");

        assert!(matches!(err, DomainError::Validation { field: "content", .. }));
        assert!(repo.inserted.lock().expect("inserted mutex poisoned").is_empty());
    }

    #[tokio::test]
    async fn add_comment_appends_locally_for_immediate_feedback() {
        let repo = FakePostRepo::new();
        *repo.list_result.lock().expect("list_result mutex poisoned") =
            vec![sample_post("p1", "a1", 0)];

        let mut feed = FeedService::new(repo, viewer());
        feed.refresh().await.expect("refresh must succeed");

        feed.add_comment("p1", "  boa ideia  ")
            .await
            .expect("comment must succeed");

        assert_eq!(feed.posts()[0].comments.len(), 1);
        assert_eq!(feed.posts()[0].comments[0].body, "boa ideia");
        assert_eq!(feed.posts()[0].comment_count(), 1);
    }

    #[tokio::test]
    async fn rendered_posts_redact_premium_for_plain_member() {
        let repo = FakePostRepo::new();
        let mut post = sample_post("p1", "author", 0);
        post.visibility = Visibility::Premium;
        *repo.list_result.lock().expect("list_result mutex poisoned") = vec![post];

        let mut member = viewer();
        member.role = UserRole::Member;
        let mut feed = FeedService::new(repo, member);
        feed.refresh().await.expect("refresh must succeed");

        let rendered = feed.rendered_posts();
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].locked);
        assert!(rendered[0].body.is_none());
    }
}
