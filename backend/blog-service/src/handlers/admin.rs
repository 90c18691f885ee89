/// Admin handlers - staff identities only
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::error::Result;
use crate::middleware::StaffUser;
use crate::models::{GroupForm, GroupPatch, UserId};

pub async fn create_group(
    state: web::Data<AppState>,
    staff: StaffUser,
    form: web::Json<GroupForm>,
) -> Result<HttpResponse> {
    let group = state.groups.create(form.into_inner()).await?;
    tracing::info!(staff = %staff.0, group_id = group.id, "admin created group");
    Ok(HttpResponse::Created().json(group))
}

pub async fn update_group(
    state: web::Data<AppState>,
    _staff: StaffUser,
    group_id: web::Path<i64>,
    patch: web::Json<GroupPatch>,
) -> Result<HttpResponse> {
    let group = state.groups.update(*group_id, patch.into_inner()).await?;
    Ok(HttpResponse::Ok().json(group))
}

pub async fn delete_group(
    state: web::Data<AppState>,
    staff: StaffUser,
    group_id: web::Path<i64>,
) -> Result<HttpResponse> {
    state.groups.delete(*group_id).await?;
    tracing::info!(staff = %staff.0, group_id = *group_id, "admin deleted group");
    Ok(HttpResponse::NoContent().finish())
}

/// Drop every cached home page.
pub async fn clear_cache(state: web::Data<AppState>, staff: StaffUser) -> Result<HttpResponse> {
    let removed = state.home_cache.invalidate().await?;
    tracing::info!(staff = %staff.0, removed, "home cache cleared");
    Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

/// Remove a departed user's posts, comments and follow records.
pub async fn purge_user(
    state: web::Data<AppState>,
    staff: StaffUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = UserId(user_id.into_inner());
    let report = state.maintenance.purge_user(user).await?;
    tracing::info!(staff = %staff.0, user_id = %user, "admin purged user");
    Ok(HttpResponse::Ok().json(report))
}
