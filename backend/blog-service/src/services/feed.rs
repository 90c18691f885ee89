use std::sync::Arc;

use crate::db::{FollowRepository, PostFilter, PostRepository};
use crate::error::Result;
use crate::middleware::Identity;
use crate::models::{Post, UserId};
use crate::pagination::{Page, PageWindow};

/// Which posts a feed shows
#[derive(Debug, Clone, PartialEq)]
pub enum FeedScope {
    All,
    Group(i64),
    Author(UserId),
    /// Posts by the authors the viewer follows
    Followed(Identity),
}

/// Builds paginated post listings, newest first. Read-only.
#[derive(Clone)]
pub struct FeedComposer {
    posts: Arc<dyn PostRepository>,
    follows: Arc<dyn FollowRepository>,
    page_size: i64,
}

impl FeedComposer {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        follows: Arc<dyn FollowRepository>,
        page_size: i64,
    ) -> Self {
        Self {
            posts,
            follows,
            page_size,
        }
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// `None` means the scope is empty by definition.
    async fn filter_for(&self, scope: &FeedScope) -> Result<Option<PostFilter>> {
        Ok(match scope {
            FeedScope::All => Some(PostFilter::All),
            FeedScope::Group(group) => Some(PostFilter::Group(*group)),
            FeedScope::Author(author) => Some(PostFilter::Author(*author)),
            FeedScope::Followed(viewer) => {
                let Some(viewer) = viewer.user_id() else {
                    return Ok(None);
                };
                let authors = self.follows.followees_of(viewer).await?;
                if authors.is_empty() {
                    None
                } else {
                    Some(PostFilter::Authors(authors))
                }
            }
        })
    }

    pub async fn compose(&self, scope: &FeedScope, page_number: i64) -> Result<Page<Post>> {
        let Some(filter) = self.filter_for(scope).await? else {
            return Ok(Page::empty());
        };

        let count = self.posts.count(&filter).await?;
        let window = PageWindow::resolve(count, self.page_size, page_number);
        let items = self
            .posts
            .list(&filter, window.offset, window.limit)
            .await?;

        tracing::debug!(?scope, page = window.number, count, "feed composed");
        Ok(Page::from_window(items, window, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::PostForm;
    use uuid::Uuid;

    fn user() -> UserId {
        UserId(Uuid::new_v4())
    }

    fn signed_in(id: UserId) -> Identity {
        Identity::User {
            id,
            is_staff: false,
        }
    }

    async fn write(store: &MemoryStore, author: UserId, text: &str) -> Post {
        PostRepository::create(
            store,
            author,
            &PostForm {
                text: text.to_string(),
                group: None,
                image: None,
            },
        )
        .await
        .unwrap()
    }

    fn composer(store: Arc<MemoryStore>, page_size: i64) -> FeedComposer {
        FeedComposer::new(store.clone(), store, page_size)
    }

    #[tokio::test]
    async fn all_posts_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let author = user();
        for text in ["first", "second", "third"] {
            write(&store, author, text).await;
        }

        let page = composer(store, 10).compose(&FeedScope::All, 1).await.unwrap();
        let texts: Vec<&str> = page.items.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn followed_feed_of_loner_is_empty() {
        let store = Arc::new(MemoryStore::new());
        write(&store, user(), "someone else's post").await;

        let page = composer(store, 10)
            .compose(&FeedScope::Followed(signed_in(user())), 1)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn anonymous_followed_feed_is_empty() {
        let store = Arc::new(MemoryStore::new());
        write(&store, user(), "post").await;

        let page = composer(store, 10)
            .compose(&FeedScope::Followed(Identity::Anonymous), 1)
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn followed_feed_only_shows_followees() {
        let store = Arc::new(MemoryStore::new());
        let (reader, followed, ignored) = (user(), user(), user());
        store.insert(reader, followed).await.unwrap();
        write(&store, followed, "visible").await;
        write(&store, ignored, "hidden").await;

        let page = composer(store, 10)
            .compose(&FeedScope::Followed(signed_in(reader)), 1)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].text, "visible");
    }

    #[tokio::test]
    async fn profile_scope_paginates() {
        let store = Arc::new(MemoryStore::new());
        let author = user();
        for i in 0..13 {
            write(&store, author, &format!("post {}", i)).await;
        }
        write(&store, user(), "other author").await;

        let composer = composer(store, 10);
        let first = composer.compose(&FeedScope::Author(author), 1).await.unwrap();
        let second = composer.compose(&FeedScope::Author(author), 2).await.unwrap();

        assert_eq!(first.items.len(), 10);
        assert!(first.has_next && !first.has_previous);
        assert_eq!(second.items.len(), 3);
        assert!(second.has_previous && !second.has_next);
        assert_eq!(second.count, 13);
    }
}
