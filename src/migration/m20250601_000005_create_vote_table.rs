use sea_orm::Schema;
use sea_orm_migration::prelude::*;
use crate::entity::vote::{Column, Entity};

const UNIQUE_USER_ISSUE: &str = "idx_votes_user_issue";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(
                schema
                    .create_table_from_entity(Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // one live vote per (user, issue)
        manager
            .create_index(
                Index::create()
                    .name(UNIQUE_USER_ISSUE)
                    .table(Entity)
                    .col(Column::UserId)
                    .col(Column::IssueId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(UNIQUE_USER_ISSUE).table(Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entity).if_exists().to_owned())
            .await
    }
}
