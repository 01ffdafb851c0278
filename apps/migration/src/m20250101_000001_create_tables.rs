//! Users, onboarding profiles, posts and their versions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Credits).integer().not_null().default(5))
                    .col(ColumnDef::new(Users::LastCreditReset).timestamp_with_time_zone())
                    .col(ColumnDef::new(Users::LinkedinAccessToken).text())
                    .col(ColumnDef::new(Users::LinkedinIdToken).text())
                    .col(ColumnDef::new(Users::LinkedinExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Users::SubscriptionTier)
                            .string()
                            .not_null()
                            .default("Free"),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserProfiles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UserProfiles::UserId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(UserProfiles::Email).string().not_null())
                    .col(ColumnDef::new(UserProfiles::FullName).string().not_null())
                    .col(ColumnDef::new(UserProfiles::ProfessionTitle).string().not_null())
                    .col(ColumnDef::new(UserProfiles::LinkedinUrl).string().not_null())
                    .col(ColumnDef::new(UserProfiles::GithubUrl).string())
                    .col(ColumnDef::new(UserProfiles::PortfolioUrl).string())
                    .col(
                        ColumnDef::new(UserProfiles::Interests)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(UserProfiles::Bio).text().not_null())
                    .col(
                        ColumnDef::new(UserProfiles::Tone)
                            .string()
                            .not_null()
                            .default("Friendly"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_profiles_user")
                            .from(UserProfiles::Table, UserProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Posts::UserId).uuid().not_null())
                    .col(ColumnDef::new(Posts::Topic).string().not_null())
                    .col(ColumnDef::new(Posts::Brief).text().not_null())
                    .col(ColumnDef::new(Posts::InspirationLink).string())
                    .col(
                        ColumnDef::new(Posts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Posts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_user")
                            .from(Posts::Table, Posts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_user_created")
                    .table(Posts::Table)
                    .col(Posts::UserId)
                    .col(Posts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostVersions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PostVersions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PostVersions::PostId).uuid().not_null())
                    .col(ColumnDef::new(PostVersions::Version).integer().not_null())
                    .col(ColumnDef::new(PostVersions::Text).text().not_null())
                    .col(ColumnDef::new(PostVersions::ImageUrl).text())
                    .col(ColumnDef::new(PostVersions::ImageId).string())
                    .col(
                        ColumnDef::new(PostVersions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_versions_post")
                            .from(PostVersions::Table, PostVersions::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Concurrent appends for the same slot collide here.
        manager
            .create_index(
                Index::create()
                    .name("uq_post_versions_post_version")
                    .table(PostVersions::Table)
                    .col(PostVersions::PostId)
                    .col(PostVersions::Version)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostVersions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Username,
    Credits,
    LastCreditReset,
    LinkedinAccessToken,
    LinkedinIdToken,
    LinkedinExpiresAt,
    SubscriptionTier,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserProfiles {
    Table,
    Id,
    UserId,
    Email,
    FullName,
    ProfessionTitle,
    LinkedinUrl,
    GithubUrl,
    PortfolioUrl,
    Interests,
    Bio,
    Tone,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    UserId,
    Topic,
    Brief,
    InspirationLink,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PostVersions {
    Table,
    Id,
    PostId,
    Version,
    Text,
    ImageUrl,
    ImageId,
    CreatedAt,
}
