use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::comment::{CommentState, Model as CommentModel};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreateRequest {
    pub content: String,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentUpdateRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i32,
    pub issue_id: i32,
    pub user_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub state: CommentState,
    pub is_official: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CommentModel> for CommentResponse {
    fn from(model: CommentModel) -> Self {
        Self {
            id: model.id,
            issue_id: model.issue_id,
            user_id: model.user_id,
            parent_id: model.parent_id,
            content: model.content,
            state: model.state,
            is_official: model.is_official,
            edited_at: model.edited_at,
            created_at: model.created_at,
        }
    }
}

/// One comment with its replies, deleted nodes included in redacted form.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentNode {
    pub comment: CommentResponse,
    #[schema(no_recursion)]
    pub replies: Vec<CommentNode>,
}
