use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::issue::{IssuePriority, IssueStatus, Model as IssueModel};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreateRequest {
    pub title: String,
    pub description: String,
    pub priority: Option<IssuePriority>,
    pub category_id: Option<i32>,
    pub location_id: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub is_anonymous: Option<bool>,
    pub is_urgent: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueStatusUpdateRequest {
    pub status: IssueStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<IssueStatus>,
    pub category_id: Option<i32>,
    pub location_id: Option<i32>,
    pub include_sublocations: Option<bool>,
    pub search: Option<String>,
}

/// Denormalized counters as recomputed from their source rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCounters {
    pub upvotes: i32,
    pub downvotes: i32,
    pub comments_count: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileSummary {
    pub corrected: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub reporter_id: Option<i32>,
    pub category_id: Option<i32>,
    pub location_id: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub views: i32,
    pub comments_count: i32,
    pub is_anonymous: bool,
    pub is_urgent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl From<IssueModel> for IssueResponse {
    fn from(model: IssueModel) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            status: model.status,
            priority: model.priority,
            reporter_id: (!model.is_anonymous).then_some(model.reporter_id),
            category_id: model.category_id,
            location_id: model.location_id,
            latitude: model.latitude,
            longitude: model.longitude,
            address: model.address,
            upvotes: model.upvotes,
            downvotes: model.downvotes,
            views: model.views,
            comments_count: model.comments_count,
            is_anonymous: model.is_anonymous,
            is_urgent: model.is_urgent,
            created_at: model.created_at,
            updated_at: model.updated_at,
            resolved_at: model.resolved_at,
            closed_at: model.closed_at,
        }
    }
}
