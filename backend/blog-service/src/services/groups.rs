/// Group service - staff-managed communities
use std::sync::Arc;
use validator::Validate;

use crate::db::GroupRepository;
use crate::error::{AppError, Result};
use crate::models::{Group, GroupForm, GroupPatch};

#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupRepository>) -> Self {
        Self { groups }
    }

    pub async fn create(&self, form: GroupForm) -> Result<Group> {
        form.validate()?;
        let group = self.groups.create(&form).await?;
        tracing::info!(group_id = group.id, slug = %group.slug, "group created");
        Ok(group)
    }

    pub async fn get(&self, id: i64) -> Result<Group> {
        self.groups
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group {}", id)))
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Group> {
        self.groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group '{}'", slug)))
    }

    pub async fn list(&self) -> Result<Vec<Group>> {
        self.groups.list().await
    }

    /// Title and slug are frozen once any post references the group.
    pub async fn update(&self, id: i64, patch: GroupPatch) -> Result<Group> {
        patch.validate()?;
        let mut group = self.get(id).await?;

        if patch.touches_identity(&group) && self.groups.post_count(id).await? > 0 {
            let field = if patch.slug.as_deref().is_some_and(|s| s != group.slug) {
                "slug"
            } else {
                "title"
            };
            return Err(AppError::invalid_field(
                field,
                "cannot change once posts reference the group",
            ));
        }

        patch.apply(&mut group);
        self.groups.update(&group).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.groups.delete(id).await? {
            return Err(AppError::NotFound(format!("group {}", id)));
        }
        tracing::info!(group_id = id, "group deleted");
        Ok(())
    }
}
