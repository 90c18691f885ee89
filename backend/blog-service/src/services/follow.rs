use std::sync::Arc;

use crate::db::FollowRepository;
use crate::error::{AppError, Result};
use crate::metrics::FOLLOW_OUTCOMES;
use crate::models::{Follow, UserId};

/// Result of a follow attempt. Only `Created` changes state.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowOutcome {
    Created(Follow),
    AlreadyFollowing(Follow),
    SelfFollow,
}

impl FollowOutcome {
    fn label(&self) -> &'static str {
        match self {
            FollowOutcome::Created(_) => "created",
            FollowOutcome::AlreadyFollowing(_) => "already_following",
            FollowOutcome::SelfFollow => "self_follow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFound,
}

/// Directed user -> author relation. Pairs are unique and never reflexive.
#[derive(Clone)]
pub struct FollowGraph {
    repo: Arc<dyn FollowRepository>,
}

impl FollowGraph {
    pub fn new(repo: Arc<dyn FollowRepository>) -> Self {
        Self { repo }
    }

    pub async fn follow(&self, user: UserId, author: UserId) -> Result<FollowOutcome> {
        let outcome = self.try_follow(user, author).await?;
        FOLLOW_OUTCOMES
            .with_label_values(&["follow", outcome.label()])
            .inc();
        tracing::debug!(%user, %author, outcome = outcome.label(), "follow");
        Ok(outcome)
    }

    async fn try_follow(&self, user: UserId, author: UserId) -> Result<FollowOutcome> {
        if user == author {
            return Ok(FollowOutcome::SelfFollow);
        }

        // A concurrent unfollow can remove the conflicting row between the
        // insert and the lookup; one retry covers it.
        for _ in 0..2 {
            if let Some(created) = self.repo.insert(user, author).await? {
                return Ok(FollowOutcome::Created(created));
            }
            if let Some(existing) = self.repo.find(user, author).await? {
                return Ok(FollowOutcome::AlreadyFollowing(existing));
            }
        }

        Err(AppError::Internal(format!(
            "follow {} -> {} changed concurrently",
            user, author
        )))
    }

    pub async fn unfollow(&self, user: UserId, author: UserId) -> Result<UnfollowOutcome> {
        let outcome = if self.repo.delete(user, author).await? {
            UnfollowOutcome::Removed
        } else {
            UnfollowOutcome::NotFound
        };

        let label = match outcome {
            UnfollowOutcome::Removed => "removed",
            UnfollowOutcome::NotFound => "not_found",
        };
        FOLLOW_OUTCOMES.with_label_values(&["unfollow", label]).inc();
        Ok(outcome)
    }

    pub async fn is_following(&self, user: UserId, author: UserId) -> Result<bool> {
        Ok(self.repo.find(user, author).await?.is_some())
    }

    pub async fn followers_of(&self, author: UserId) -> Result<Vec<UserId>> {
        self.repo.followers_of(author).await
    }

    pub async fn followees_of(&self, user: UserId) -> Result<Vec<UserId>> {
        self.repo.followees_of(user).await
    }

    /// The user's follow records, optionally narrowed to those whose user or
    /// author id contains `search` (case-insensitive).
    pub async fn list(&self, user: UserId, search: Option<&str>) -> Result<Vec<Follow>> {
        let follows = self.repo.list_for_user(user).await?;
        let needle = search
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty());

        Ok(match needle {
            Some(needle) => follows
                .into_iter()
                .filter(|f| {
                    f.author.to_string().contains(&needle) || f.user.to_string().contains(&needle)
                })
                .collect(),
            None => follows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use uuid::Uuid;

    fn graph() -> FollowGraph {
        FollowGraph::new(Arc::new(MemoryStore::new()))
    }

    fn user() -> UserId {
        UserId(Uuid::new_v4())
    }

    #[tokio::test]
    async fn following_twice_keeps_one_record() {
        let graph = graph();
        let (reader, writer) = (user(), user());

        let first = graph.follow(reader, writer).await.unwrap();
        let second = graph.follow(reader, writer).await.unwrap();

        let created = match first {
            FollowOutcome::Created(f) => f,
            other => panic!("expected Created, got {other:?}"),
        };
        assert_eq!(second, FollowOutcome::AlreadyFollowing(created));
        assert_eq!(graph.list(reader, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn self_follow_creates_nothing() {
        let graph = graph();
        let me = user();

        assert_eq!(graph.follow(me, me).await.unwrap(), FollowOutcome::SelfFollow);
        assert!(graph.list(me, None).await.unwrap().is_empty());
        assert!(!graph.is_following(me, me).await.unwrap());
    }

    #[tokio::test]
    async fn unfollow_reports_missing_pair() {
        let graph = graph();
        let (reader, writer) = (user(), user());

        assert_eq!(
            graph.unfollow(reader, writer).await.unwrap(),
            UnfollowOutcome::NotFound
        );
        graph.follow(reader, writer).await.unwrap();
        assert_eq!(
            graph.unfollow(reader, writer).await.unwrap(),
            UnfollowOutcome::Removed
        );
        assert!(!graph.is_following(reader, writer).await.unwrap());
    }

    #[tokio::test]
    async fn relation_is_directed() {
        let graph = graph();
        let (reader, writer) = (user(), user());
        graph.follow(reader, writer).await.unwrap();

        assert_eq!(graph.followers_of(writer).await.unwrap(), vec![reader]);
        assert_eq!(graph.followees_of(reader).await.unwrap(), vec![writer]);
        assert!(graph.followers_of(reader).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_matches_substring_of_either_side() {
        let graph = graph();
        let reader = user();
        let (a, b) = (user(), user());
        graph.follow(reader, a).await.unwrap();
        graph.follow(reader, b).await.unwrap();

        let tail = a.to_string()[24..].to_ascii_uppercase();
        let found = graph.list(reader, Some(&tail)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].author, a);

        let own = reader.to_string()[9..23].to_string();
        assert_eq!(graph.list(reader, Some(&own)).await.unwrap().len(), 2);
    }
}
