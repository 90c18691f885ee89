/// Group handlers - read-only REST endpoints; writes live under `/admin`
use actix_web::{web, HttpResponse};

use super::AppState;
use crate::error::Result;
use crate::middleware::{Action, Identity, ResourceKind};

pub async fn list_groups(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<HttpResponse> {
    state
        .permissions
        .authorize(ResourceKind::Groups, Action::List, &identity, None)?;
    Ok(HttpResponse::Ok().json(state.groups.list().await?))
}

pub async fn get_group(
    state: web::Data<AppState>,
    identity: Identity,
    group_id: web::Path<i64>,
) -> Result<HttpResponse> {
    state
        .permissions
        .authorize(ResourceKind::Groups, Action::Retrieve, &identity, None)?;
    Ok(HttpResponse::Ok().json(state.groups.get(*group_id).await?))
}
