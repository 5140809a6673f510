use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::base_time::impl_time_behavior;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub issue_id: i32,
    pub user_id: i32,
    pub parent_id: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub state: CommentState,
    pub is_official: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i32>,
}

/// Deleted comments keep their row so replies stay attached to the thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "comment_state")]
#[serde(rename_all = "snake_case")]
pub enum CommentState {
    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "deleted")]
    Deleted,
}

impl Model {
    pub fn is_deleted(&self) -> bool {
        self.state == CommentState::Deleted
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::issue::Entity",
        from = "Column::IssueId",
        to = "super::issue::Column::Id",
        on_delete = "Cascade"
    )]
    Issue,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Parent,
}

impl Related<super::issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issue.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl_time_behavior!();

impl ActiveModel {
    pub fn new_reply(
        issue_id: i32,
        user_id: i32,
        parent_id: Option<i32>,
        content: String,
        is_official: bool,
    ) -> Self {
        Self {
            issue_id: Set(issue_id),
            user_id: Set(user_id),
            parent_id: Set(parent_id),
            content: Set(content),
            state: Set(CommentState::Active),
            is_official: Set(is_official),
            edited_at: Set(None),
            updated_at: Set(None),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        }
    }

    /// Redacts the content; the row and its links are kept.
    pub fn soft_delete(&mut self, deleted_by: i32) {
        self.state = Set(CommentState::Deleted);
        self.content = Set(String::new());
        self.deleted_at = Set(Some(Utc::now()));
        self.deleted_by = Set(Some(deleted_by));
    }
}
