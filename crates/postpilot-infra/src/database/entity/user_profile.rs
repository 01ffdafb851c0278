//! Onboarding profile entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use postpilot_core::domain::{Tone, UserProfile};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub profession_title: String,
    pub linkedin_url: String,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub interests: Json,
    #[sea_orm(column_type = "Text")]
    pub bio: String,
    pub tone: String,
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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UserProfile {
    fn from(model: Model) -> Self {
        let interests = serde_json::from_value(model.interests).unwrap_or_default();
        Self {
            id: model.id,
            user_id: model.user_id,
            email: model.email,
            full_name: model.full_name,
            profession_title: model.profession_title,
            linkedin_url: model.linkedin_url,
            github_url: model.github_url,
            portfolio_url: model.portfolio_url,
            interests,
            bio: model.bio,
            tone: model.tone.parse().unwrap_or(Tone::Friendly),
        }
    }
}

impl From<UserProfile> for ActiveModel {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: Set(profile.id),
            user_id: Set(profile.user_id),
            email: Set(profile.email),
            full_name: Set(profile.full_name),
            profession_title: Set(profile.profession_title),
            linkedin_url: Set(profile.linkedin_url),
            github_url: Set(profile.github_url),
            portfolio_url: Set(profile.portfolio_url),
            interests: Set(serde_json::Value::from(profile.interests)),
            bio: Set(profile.bio),
            tone: Set(profile.tone.as_str().to_string()),
        }
    }
}
