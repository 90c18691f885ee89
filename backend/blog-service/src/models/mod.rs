/// Data models for the blog service
///
/// - Group: a community posts can be filed under
/// - Post: authored text with an optional group and image reference
/// - Comment: text attached to a post
/// - Follow: directed user -> author subscription
///
/// Request bodies (`*Form`, `*Patch`) carry the validation rules; stored rows
/// are plain `FromRow` structs serialized with references as identifiers.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const POST_TEXT_MAX: u64 = 3000;
pub const COMMENT_TEXT_MAX: u64 = 500;
pub const GROUP_TITLE_MAX: u64 = 200;
pub const GROUP_DESCRIPTION_MAX: u64 = 500;

/// Opaque identity issued by the authentication collaborator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        UserId(id)
    }
}

/// Anything with a single owning identity.
pub trait Owned {
    fn owner(&self) -> UserId;
}

// ============================================================================
// Groups
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GroupForm {
    #[validate(
        length(min = 1, max = 200, message = "title must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[validate(
        length(min = 1, max = 100, message = "slug must be 1-100 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "description exceeds 500 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GroupPatch {
    #[validate(
        length(min = 1, max = 200, message = "title must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "slug must be 1-100 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,
    #[validate(length(max = 500, message = "description exceeds 500 characters"))]
    pub description: Option<String>,
}

impl GroupPatch {
    /// Title or slug edits; these are frozen once posts reference the group.
    pub fn touches_identity(&self, current: &Group) -> bool {
        self.title.as_deref().is_some_and(|t| t != current.title)
            || self.slug.as_deref().is_some_and(|s| s != current.slug)
    }

    pub fn apply(&self, group: &mut Group) {
        if let Some(title) = &self.title {
            group.title = title.clone();
        }
        if let Some(slug) = &self.slug {
            group.slug = slug.clone();
        }
        if let Some(description) = &self.description {
            group.description = description.clone();
        }
    }
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "author_id")]
    pub author: UserId,
    #[sqlx(rename = "group_id")]
    pub group: Option<i64>,
    pub image: Option<String>,
}

impl Owned for Post {
    fn owner(&self) -> UserId {
        self.author
    }
}

/// Body for creating a post, or replacing its editable fields.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostForm {
    #[validate(
        length(min = 1, max = 3000, message = "text must be 1-3000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub text: String,
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "image reference must be 1-255 characters"))]
    pub image: Option<String>,
}

/// Partial post update; `group`/`image` distinguish "absent" from `null`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostPatch {
    #[validate(
        length(min = 1, max = 3000, message = "text must be 1-3000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub group: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 1, max = 255, message = "image reference must be 1-255 characters"))]
    pub image: Option<Option<String>>,
}

impl PostPatch {
    pub fn apply(&self, post: &mut Post) {
        if let Some(text) = &self.text {
            post.text = text.clone();
        }
        if let Some(group) = self.group {
            post.group = group;
        }
        if let Some(image) = &self.image {
            post.image = image.clone();
        }
    }

    /// The group the post will reference after the patch, if it changes.
    pub fn new_group(&self) -> Option<i64> {
        self.group.flatten()
    }

    pub fn image_reference(&self) -> Option<&str> {
        self.image.as_ref().and_then(|i| i.as_deref())
    }
}

impl From<PostForm> for PostPatch {
    fn from(form: PostForm) -> Self {
        PostPatch {
            text: Some(form.text),
            group: Some(form.group),
            image: Some(form.image),
        }
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    #[sqlx(rename = "post_id")]
    pub post: i64,
    #[sqlx(rename = "author_id")]
    pub author: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Owned for Comment {
    fn owner(&self) -> UserId {
        self.author
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(
        length(min = 1, max = 500, message = "text must be 1-500 characters"),
        custom(function = "validate_not_blank")
    )]
    pub text: String,
}

// ============================================================================
// Follows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    #[sqlx(rename = "user_id")]
    pub user: UserId,
    #[sqlx(rename = "author_id")]
    pub author: UserId,
    pub created_at: DateTime<Utc>,
}

impl Owned for Follow {
    fn owner(&self) -> UserId {
        self.user
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowForm {
    pub author: UserId,
}

/// Rows removed when a departed user's content is purged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub posts: u64,
    pub comments: u64,
    pub follows: u64,
}

// ============================================================================
// Validation helpers
// ============================================================================

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

fn validate_slug(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        let mut err = ValidationError::new("slug");
        err.message = Some("slug may contain only letters, digits, '-' and '_'".into());
        return Err(err);
    }
    Ok(())
}

/// Maps a present field (even `null`) to `Some`, leaving absence as `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_text_length_is_counted_in_characters() {
        let form = PostForm {
            text: "ж".repeat(POST_TEXT_MAX as usize),
            group: None,
            image: None,
        };
        assert!(form.validate().is_ok());

        let form = PostForm {
            text: "ж".repeat(POST_TEXT_MAX as usize + 1),
            group: None,
            image: None,
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn blank_comment_is_rejected() {
        let form = CommentForm {
            text: "   ".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("text"));
    }

    #[test]
    fn comment_over_limit_is_rejected() {
        let form = CommentForm {
            text: "a".repeat(COMMENT_TEXT_MAX as usize + 1),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn slug_rejects_spaces() {
        let form = GroupForm {
            title: "Cats".to_string(),
            slug: "cat lovers".to_string(),
            description: String::new(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let clear: PostPatch = serde_json::from_str(r#"{"group": null}"#).unwrap();
        assert_eq!(clear.group, Some(None));

        let untouched: PostPatch = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(untouched.group, None);
    }

    #[test]
    fn patch_apply_only_changes_present_fields() {
        let mut post = Post {
            id: 1,
            text: "old".to_string(),
            created_at: Utc::now(),
            author: UserId(Uuid::new_v4()),
            group: Some(4),
            image: Some("posts/a.gif".to_string()),
        };
        let patch: PostPatch = serde_json::from_str(r#"{"image": null}"#).unwrap();
        patch.apply(&mut post);

        assert_eq!(post.text, "old");
        assert_eq!(post.group, Some(4));
        assert_eq!(post.image, None);
    }

    #[test]
    fn post_serializes_references_as_identifiers() {
        let author = UserId(Uuid::new_v4());
        let post = Post {
            id: 9,
            text: "hello".to_string(),
            created_at: Utc::now(),
            author,
            group: Some(2),
            image: None,
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["author"], serde_json::json!(author.0.to_string()));
        assert_eq!(json["group"], serde_json::json!(2));
    }
}
