/// Site surface - page contexts a renderer consumes
///
/// Reads return JSON contexts; writes answer with redirects the way a form
/// post would. Follow conflicts and non-author edits redirect silently.
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use super::{redirect_found, redirect_see_other, AppState};
use crate::db::PostFilter;
use crate::error::{AppError, Result};
use crate::middleware::{AuthenticatedUser, Identity};
use crate::models::{CommentForm, PostForm, PostPatch, UserId};
use crate::pagination::PageQuery;
use crate::services::{FeedScope, UnfollowOutcome};

/// Home page: all posts, served through the home cache.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let number = query.number();
    let feed = state.feed.clone();

    let body = state
        .home_cache
        .get_or_render(number, || async move {
            let page = feed.compose(&FeedScope::All, number).await?;
            let body = serde_json::to_string(&json!({ "page": page }))?;
            Ok::<_, AppError>(body)
        })
        .await?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let group = state.groups.by_slug(&slug).await?;
    let page = state
        .feed
        .compose(&FeedScope::Group(group.id), query.number())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "group": group, "page": page })))
}

pub async fn profile(
    state: web::Data<AppState>,
    identity: Identity,
    user_id: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let author = UserId(user_id.into_inner());
    let page = state
        .feed
        .compose(&FeedScope::Author(author), query.number())
        .await?;

    let following = match identity.user_id() {
        Some(viewer) => Some(state.follows.is_following(viewer, author).await?),
        None => None,
    };
    let followers_count = state.follows.followers_of(author).await?.len();
    let following_count = state.follows.followees_of(author).await?.len();

    Ok(HttpResponse::Ok().json(json!({
        "author": author,
        "page": page,
        "following": following,
        "followers_count": followers_count,
        "following_count": following_count,
    })))
}

pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = state.posts.get(*post_id).await?;
    let comments = state.comments.list(post.id).await?;
    let author_posts = state
        .posts
        .count(&PostFilter::Author(post.author))
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "post": post,
        "comments_count": comments.len(),
        "comments": comments,
        "author_posts_count": author_posts,
    })))
}

/// New post; lands on the home page.
pub async fn post_create(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    form: web::Json<PostForm>,
) -> Result<HttpResponse> {
    state.posts.create(user.0, form.into_inner()).await?;
    Ok(redirect_see_other("/"))
}

/// Edit by the author; anyone else is sent back to the post untouched.
pub async fn post_edit(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    form: web::Json<PostForm>,
) -> Result<HttpResponse> {
    let post = state.posts.get(*post_id).await?;
    let location = format!("/posts/{}", post.id);

    if post.author != user.0 {
        tracing::debug!(post_id = post.id, user = %user.0, "non-author edit ignored");
        return Ok(redirect_found(&location));
    }

    state
        .posts
        .update(post, PostPatch::from(form.into_inner()))
        .await?;
    Ok(redirect_see_other(&location))
}

/// Invalid comments are dropped; the post view is shown either way.
pub async fn add_comment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    match state.comments.add(post_id, user.0, form.into_inner()).await {
        Ok(_) => {}
        Err(err) if err.is_validation() => {
            tracing::debug!(post_id, error = %err, "comment rejected");
        }
        Err(err) => return Err(err),
    }
    Ok(redirect_found(&format!("/posts/{}", post_id)))
}

/// Posts by the authors the caller follows.
pub async fn follow_index(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    if !identity.is_authenticated() {
        return Err(AppError::Unauthenticated("Login required".to_string()));
    }
    let page = state
        .feed
        .compose(&FeedScope::Followed(identity), query.number())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "page": page })))
}

/// Duplicate and self follows redirect like a successful one.
pub async fn profile_follow(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    author: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let author = UserId(author.into_inner());
    state.follows.follow(user.0, author).await?;
    Ok(redirect_found(&format!("/profile/{}", author)))
}

pub async fn profile_unfollow(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    author: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let author = UserId(author.into_inner());
    match state.follows.unfollow(user.0, author).await? {
        UnfollowOutcome::Removed => Ok(redirect_found(&format!("/profile/{}", author))),
        UnfollowOutcome::NotFound => Err(AppError::NotFound(format!(
            "not following {}",
            author
        ))),
    }
}

pub async fn about_author() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "page": "about/author",
        "title": "About the author",
    }))
}

pub async fn about_tech() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "page": "about/tech",
        "title": "Technologies",
    }))
}
