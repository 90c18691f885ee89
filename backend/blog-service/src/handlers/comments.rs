/// Comment handlers - nested under `/api/v1/posts/{post_id}/comments`
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::error::{AppError, Result};
use crate::middleware::{Action, Identity, ResourceKind};
use crate::models::CommentForm;

#[derive(Debug, Deserialize)]
pub struct CommentPath {
    pub post_id: i64,
    pub comment_id: i64,
}

/// Partial comment update; an absent `text` leaves the comment as is.
#[derive(Debug, Deserialize)]
pub struct CommentPatch {
    pub text: Option<String>,
}

pub async fn list_comments(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    state
        .permissions
        .authorize(ResourceKind::Comments, Action::List, &identity, None)?;

    let comments = state.comments.list(*post_id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn create_comment(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<i64>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse> {
    state
        .permissions
        .authorize(ResourceKind::Comments, Action::Create, &identity, None)?;
    let author = identity
        .user_id()
        .ok_or_else(|| AppError::Unauthenticated("Login required".to_string()))?;

    let comment = state
        .comments
        .add(*post_id, author, form.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn get_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<CommentPath>,
) -> Result<HttpResponse> {
    let comment = state.comments.get(path.post_id, path.comment_id).await?;
    state.permissions.authorize(
        ResourceKind::Comments,
        Action::Retrieve,
        &identity,
        Some(&comment),
    )?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn replace_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<CommentPath>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse> {
    let comment = state.comments.get(path.post_id, path.comment_id).await?;
    state.permissions.authorize(
        ResourceKind::Comments,
        Action::Update,
        &identity,
        Some(&comment),
    )?;

    let updated = state.comments.update(&comment, form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn patch_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<CommentPath>,
    patch: web::Json<CommentPatch>,
) -> Result<HttpResponse> {
    let comment = state.comments.get(path.post_id, path.comment_id).await?;
    state.permissions.authorize(
        ResourceKind::Comments,
        Action::Update,
        &identity,
        Some(&comment),
    )?;

    match patch.into_inner().text {
        Some(text) => {
            let updated = state
                .comments
                .update(&comment, CommentForm { text })
                .await?;
            Ok(HttpResponse::Ok().json(updated))
        }
        None => Ok(HttpResponse::Ok().json(comment)),
    }
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<CommentPath>,
) -> Result<HttpResponse> {
    let comment = state.comments.get(path.post_id, path.comment_id).await?;
    state.permissions.authorize(
        ResourceKind::Comments,
        Action::Delete,
        &identity,
        Some(&comment),
    )?;

    state.comments.delete(&comment).await?;
    Ok(HttpResponse::NoContent().finish())
}
