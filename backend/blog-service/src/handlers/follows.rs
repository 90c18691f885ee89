/// Follow handlers - `/api/v1/follow`, private to signed-in users
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::error::{AppError, Result};
use crate::middleware::{Action, Identity, ResourceKind};
use crate::models::{FollowForm, UserId};
use crate::services::FollowOutcome;

#[derive(Debug, Default, Deserialize)]
pub struct FollowQuery {
    /// Author id prefix
    pub search: Option<String>,
}

fn acting_user(identity: &Identity) -> Result<UserId> {
    identity
        .user_id()
        .ok_or_else(|| AppError::Unauthenticated("Login required".to_string()))
}

pub async fn list_follows(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<FollowQuery>,
) -> Result<HttpResponse> {
    state
        .permissions
        .authorize(ResourceKind::Follows, Action::List, &identity, None)?;
    let user = acting_user(&identity)?;

    let follows = state.follows.list(user, query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(follows))
}

/// 201 for a new record, 200 with the existing one for a repeat, 204 for a
/// self follow. Only the first changes state.
pub async fn create_follow(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Json<FollowForm>,
) -> Result<HttpResponse> {
    state
        .permissions
        .authorize(ResourceKind::Follows, Action::Create, &identity, None)?;
    let user = acting_user(&identity)?;

    Ok(match state.follows.follow(user, form.author).await? {
        FollowOutcome::Created(follow) => HttpResponse::Created().json(follow),
        FollowOutcome::AlreadyFollowing(follow) => HttpResponse::Ok().json(follow),
        FollowOutcome::SelfFollow => HttpResponse::NoContent().finish(),
    })
}
