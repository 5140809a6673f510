pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_user_table;
mod m20250601_000002_create_location_table;
mod m20250601_000003_create_category_table;
mod m20250601_000004_create_issue_table;
mod m20250601_000005_create_vote_table;
mod m20250601_000006_create_comment_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        // referenced tables first
        vec![
            Box::new(m20250601_000001_create_user_table::Migration),
            Box::new(m20250601_000002_create_location_table::Migration),
            Box::new(m20250601_000003_create_category_table::Migration),
            Box::new(m20250601_000004_create_issue_table::Migration),
            Box::new(m20250601_000005_create_vote_table::Migration),
            Box::new(m20250601_000006_create_comment_table::Migration),
        ]
    }
}
