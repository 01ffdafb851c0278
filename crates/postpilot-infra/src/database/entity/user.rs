//! User entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use postpilot_core::domain::{LinkedInCredential, SubscriptionTier, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub username: String,
    pub credits: i32,
    pub last_credit_reset: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub linkedin_access_token: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub linkedin_id_token: Option<String>,
    pub linkedin_expires_at: Option<DateTimeWithTimeZone>,
    pub subscription_tier: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        // A credential is only meaningful when all three parts were stored together.
        let linkedin = match (
            model.linkedin_access_token,
            model.linkedin_id_token,
            model.linkedin_expires_at,
        ) {
            (Some(access_token), Some(id_token), Some(expires_at)) => Some(LinkedInCredential {
                access_token,
                id_token,
                expires_at: expires_at.into(),
            }),
            _ => None,
        };

        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            credits: model.credits,
            last_credit_reset: model.last_credit_reset.map(Into::into),
            linkedin,
            tier: model
                .subscription_tier
                .parse()
                .unwrap_or(SubscriptionTier::Free),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        let (access_token, id_token, expires_at) = match user.linkedin {
            Some(c) => (
                Some(c.access_token),
                Some(c.id_token),
                Some(c.expires_at.into()),
            ),
            None => (None, None, None),
        };

        Self {
            id: Set(user.id),
            email: Set(user.email),
            username: Set(user.username),
            credits: Set(user.credits),
            last_credit_reset: Set(user.last_credit_reset.map(Into::into)),
            linkedin_access_token: Set(access_token),
            linkedin_id_token: Set(id_token),
            linkedin_expires_at: Set(expires_at),
            subscription_tier: Set(user.tier.as_str().to_string()),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        }
    }
}
