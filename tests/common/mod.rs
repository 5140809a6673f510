#![allow(dead_code)]

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sunoaid::entity::issue::{self, IssueStatus};
use sunoaid::entity::user::{self, UserRole};
use sunoaid::migration::{Migrator, MigratorTrait};
use sunoaid::model::issue::IssueCreateRequest;
use sunoaid::service;

/// Fresh in-memory database with the schema applied.
///
/// One pooled connection: every pooled sqlite `:memory:` connection would otherwise be its own database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn create_user(db: &DatabaseConnection, name: &str, role: UserRole) -> user::Model {
    user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@example.ph", name.to_lowercase().replace(' ', "."))),
        password: Set("not-a-real-hash".to_string()),
        role: Set(role),
        is_active: Set(true),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn citizen(db: &DatabaseConnection, name: &str) -> user::Model {
    create_user(db, name, UserRole::Citizen).await
}

pub async fn admin(db: &DatabaseConnection, name: &str) -> user::Model {
    create_user(db, name, UserRole::Admin).await
}

pub fn issue_request(title: &str) -> IssueCreateRequest {
    IssueCreateRequest {
        title: title.to_string(),
        description: format!("{title} reported near the barangay hall"),
        ..Default::default()
    }
}

pub async fn create_issue(db: &DatabaseConnection, reporter_id: i32, title: &str) -> issue::Model {
    service::issue::create_issue(db, reporter_id, issue_request(title))
        .await
        .expect("create issue")
}

/// Inserts an issue row directly, bypassing the engine, for dashboard fixtures.
pub async fn insert_issue_at(
    db: &DatabaseConnection,
    reporter_id: i32,
    category_id: Option<i32>,
    status: IssueStatus,
    created_at: DateTime<Utc>,
) -> issue::Model {
    let mut active = issue::ActiveModel::from_request(&issue_request("fixture"), reporter_id);
    active.category_id = Set(category_id);
    active.status = Set(status);
    active.created_at = Set(created_at);
    active.insert(db).await.expect("insert issue")
}
