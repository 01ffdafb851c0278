//! One immutable version of a post. `(post_id, version)` is unique.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use postpilot_core::domain::{Version, VersionContent};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub version: i32,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    pub image_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Version {
    fn from(model: Model) -> Self {
        Self {
            version: model.version.max(0) as u32,
            content: VersionContent {
                text: model.text,
                image_url: model.image_url,
                image_id: model.image_id,
            },
            created_at: model.created_at.into(),
        }
    }
}

impl ActiveModel {
    pub fn for_post(post_id: Uuid, version: &Version) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            post_id: Set(post_id),
            version: Set(version.version as i32),
            text: Set(version.content.text.clone()),
            image_url: Set(version.content.image_url.clone()),
            image_id: Set(version.content.image_id.clone()),
            created_at: Set(version.created_at.into()),
        }
    }
}
