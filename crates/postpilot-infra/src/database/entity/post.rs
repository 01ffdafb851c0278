//! Post entity for SeaORM. Versions live in [`super::post_version`].

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use postpilot_core::domain::{Post, PromptSpec, Version};
use postpilot_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    #[sea_orm(column_type = "Text")]
    pub brief: String,
    pub inspiration_link: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::post_version::Entity")]
    PostVersion,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::post_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostVersion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Assemble the aggregate from the post row and its version rows.
    pub fn into_domain(self, versions: Vec<super::post_version::Model>) -> Result<Post, RepoError> {
        let versions: Vec<Version> = versions.into_iter().map(Into::into).collect();
        let prompt = PromptSpec {
            topic: self.topic,
            brief: self.brief,
            link: self.inspiration_link,
        };
        Post::from_parts(
            self.id,
            self.user_id,
            prompt,
            versions,
            self.created_at.into(),
            self.updated_at.into(),
        )
        .map_err(|e| RepoError::Query(e.to_string()))
    }
}

impl From<&Post> for ActiveModel {
    fn from(post: &Post) -> Self {
        Self {
            id: Set(post.id),
            user_id: Set(post.user_id),
            topic: Set(post.prompt.topic.clone()),
            brief: Set(post.prompt.brief.clone()),
            inspiration_link: Set(post.prompt.link.clone()),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
