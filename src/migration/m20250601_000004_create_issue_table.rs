use sea_orm::Schema;
use sea_orm_migration::prelude::*;
use crate::entity::issue::{Column, Entity};

const IDX_STATUS: &str = "idx_issues_status";
const IDX_CREATED_AT: &str = "idx_issues_created_at";

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

        // dashboard histogram and recency window
        for (name, column) in [(IDX_STATUS, Column::Status), (IDX_CREATED_AT, Column::CreatedAt)] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Entity)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Entity).if_exists().to_owned())
            .await
    }
}
