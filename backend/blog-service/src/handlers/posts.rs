/// Post handlers - REST endpoints under `/api/v1/posts`
use actix_web::{web, HttpRequest, HttpResponse};

use super::AppState;
use crate::db::PostFilter;
use crate::error::{AppError, Result};
use crate::middleware::{Action, Identity, ResourceKind};
use crate::models::{PostForm, PostPatch};
use crate::pagination::{LimitOffsetPage, LimitOffsetQuery};

/// List posts; paginated only when `limit` is given.
pub async fn list_posts(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<LimitOffsetQuery>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    state
        .permissions
        .authorize(ResourceKind::Posts, Action::List, &identity, None)?;

    let filter = PostFilter::All;
    match query.window() {
        Some((limit, offset)) => {
            let count = state.posts.count(&filter).await?;
            let results = state.posts.list(&filter, offset, limit).await?;
            Ok(HttpResponse::Ok().json(LimitOffsetPage::new(
                results,
                count,
                limit,
                offset,
                req.path(),
            )))
        }
        None => Ok(HttpResponse::Ok().json(state.posts.list_all(&filter).await?)),
    }
}

pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Json<PostForm>,
) -> Result<HttpResponse> {
    state
        .permissions
        .authorize(ResourceKind::Posts, Action::Create, &identity, None)?;
    let author = identity
        .user_id()
        .ok_or_else(|| AppError::Unauthenticated("Login required".to_string()))?;

    let post = state.posts.create(author, form.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn get_post(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = state.posts.get(*post_id).await?;
    state
        .permissions
        .authorize(ResourceKind::Posts, Action::Retrieve, &identity, Some(&post))?;
    Ok(HttpResponse::Ok().json(post))
}

async fn update(
    state: &AppState,
    identity: Identity,
    post_id: i64,
    patch: PostPatch,
) -> Result<HttpResponse> {
    let post = state.posts.get(post_id).await?;
    state
        .permissions
        .authorize(ResourceKind::Posts, Action::Update, &identity, Some(&post))?;

    let updated = state.posts.update(post, patch).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// PUT: every editable field is replaced.
pub async fn replace_post(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<i64>,
    form: web::Json<PostForm>,
) -> Result<HttpResponse> {
    update(&state, identity, *post_id, PostPatch::from(form.into_inner())).await
}

pub async fn patch_post(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<i64>,
    patch: web::Json<PostPatch>,
) -> Result<HttpResponse> {
    update(&state, identity, *post_id, patch.into_inner()).await
}

pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = state.posts.get(*post_id).await?;
    state
        .permissions
        .authorize(ResourceKind::Posts, Action::Delete, &identity, Some(&post))?;

    state.posts.delete(post.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
