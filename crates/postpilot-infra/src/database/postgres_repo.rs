//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbConn, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use postpilot_core::domain::{LinkedInCredential, Post, User, UserProfile, Version, month_start};
use postpilot_core::error::RepoError;
use postpilot_core::ports::{PostRepository, ProfileRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_version::{self, Entity as PostVersionEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::entity::user_profile::{self, Entity as ProfileEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL profile repository.
pub type PostgresProfileRepository = PostgresBaseRepository<ProfileEntity>;

fn timestamp(at: DateTime<Utc>) -> sea_orm::prelude::DateTimeWithTimeZone {
    at.into()
}

/// Mask an email address for logging to avoid PII in logs.
pub(crate) fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = match local.chars().next() {
            Some(first) if local.len() > 1 => format!("{first}***"),
            _ => "***".to_string(),
        };
        format!("{}{}", masked_local, domain)
    } else {
        "***".to_string()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn reset_credits_if_stale(
        &self,
        id: Uuid,
        allowance: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        let stale = Condition::any()
            .add(user::Column::LastCreditReset.is_null())
            .add(user::Column::LastCreditReset.lt(timestamp(month_start(now))));

        let result = UserEntity::update_many()
            .col_expr(user::Column::Credits, Expr::value(allowance))
            .col_expr(
                user::Column::LastCreditReset,
                Expr::value(Some(timestamp(now))),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(timestamp(now)))
            .filter(user::Column::Id.eq(id))
            .filter(stale)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn decrement_credit_if_positive(&self, id: Uuid) -> Result<Option<i32>, RepoError> {
        let result = UserEntity::update_many()
            .col_expr(
                user::Column::Credits,
                Expr::col(user::Column::Credits).sub(1),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(timestamp(Utc::now())))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::Credits.gt(0))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let user = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        Ok(Some(user.credits))
    }

    async fn refund_credit(&self, id: Uuid) -> Result<(), RepoError> {
        let result = UserEntity::update_many()
            .col_expr(
                user::Column::Credits,
                Expr::col(user::Column::Credits).add(1),
            )
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn set_linkedin_credential(
        &self,
        id: Uuid,
        credential: Option<LinkedInCredential>,
    ) -> Result<(), RepoError> {
        let (access_token, id_token, expires_at) = match credential {
            Some(c) => (
                Some(c.access_token),
                Some(c.id_token),
                Some(timestamp(c.expires_at)),
            ),
            None => (None, None, None),
        };

        let result = UserEntity::update_many()
            .col_expr(user::Column::LinkedinAccessToken, Expr::value(access_token))
            .col_expr(user::Column::LinkedinIdToken, Expr::value(id_token))
            .col_expr(user::Column::LinkedinExpiresAt, Expr::value(expires_at))
            .col_expr(user::Column::UpdatedAt, Expr::value(timestamp(Utc::now())))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        let result = ProfileEntity::find()
            .filter(user_profile::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

/// PostgreSQL post repository. Posts and their versions are stored in two
/// tables and always read back together.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn versions_of<C: sea_orm::ConnectionTrait>(
        db: &C,
        post_id: Uuid,
    ) -> Result<Vec<post_version::Model>, RepoError> {
        PostVersionEntity::find()
            .filter(post_version::Column::PostId.eq(post_id))
            .order_by_asc(post_version::Column::Version)
            .all(db)
            .await
            .map_err(map_db_err)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        post::ActiveModel::from(&post)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
        for version in post.versions() {
            post_version::ActiveModel::for_post(post.id, version)
                .insert(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(post_id = %post.id, "Post inserted");
        Ok(post)
    }

    async fn find_for_user(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Post>, RepoError> {
        let Some(row) = PostEntity::find_by_id(post_id)
            .filter(post::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let versions = Self::versions_of(&self.db, post_id).await?;
        row.into_domain(versions).map(Some)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let rows = PostEntity::find()
            .filter(post::Column::UserId.eq(user_id))
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut by_post: HashMap<Uuid, Vec<post_version::Model>> = HashMap::new();
        for version in PostVersionEntity::find()
            .filter(post_version::Column::PostId.is_in(ids))
            .order_by_asc(post_version::Column::Version)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
        {
            by_post.entry(version.post_id).or_default().push(version);
        }

        rows.into_iter()
            .map(|row| {
                let versions = by_post.remove(&row.id).unwrap_or_default();
                row.into_domain(versions)
            })
            .collect()
    }

    async fn append_version(&self, post_id: Uuid, version: Version) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let row = PostEntity::find_by_id(post_id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let existing = PostVersionEntity::find()
            .filter(post_version::Column::PostId.eq(post_id))
            .count(&txn)
            .await
            .map_err(map_db_err)?;
        if existing + 1 != u64::from(version.version) {
            return Err(RepoError::Conflict(format!(
                "post {post_id} has {existing} versions, cannot append version {}",
                version.version
            )));
        }

        // The unique (post_id, version) index rejects a concurrent writer that
        // passed the count check at the same time.
        post_version::ActiveModel::for_post(post_id, &version)
            .insert(&txn)
            .await
            .map_err(|e| match map_db_err(e) {
                RepoError::Constraint(msg) => RepoError::Conflict(msg),
                other => other,
            })?;

        PostEntity::update_many()
            .col_expr(post::Column::UpdatedAt, Expr::value(timestamp(version.created_at)))
            .filter(post::Column::Id.eq(post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let versions = Self::versions_of(&txn, post_id).await?;
        txn.commit().await.map_err(map_db_err)?;

        let mut row = row;
        row.updated_at = timestamp(version.created_at);
        row.into_domain(versions)
    }

    async fn delete_for_user(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        // Versions go with the post through the ON DELETE CASCADE foreign key.
        let result = PostEntity::delete_many()
            .filter(post::Column::Id.eq(post_id))
            .filter(post::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }
}
