use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::issue::IssueStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistogram {
    pub open: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub closed: u64,
}

impl StatusHistogram {
    pub fn add(&mut self, status: IssueStatus, count: u64) {
        match status {
            IssueStatus::Open => self.open += count,
            IssueStatus::InProgress => self.in_progress += count,
            IssueStatus::Resolved => self.resolved += count,
            IssueStatus::Closed => self.closed += count,
        }
    }

    pub fn total(&self) -> u64 {
        self.open + self.in_progress + self.resolved + self.closed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category_id: i32,
    pub name: String,
    pub issue_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_issues: u64,
    pub total_users: u64,
    pub status_counts: StatusHistogram,
    pub issues_last_7_days: u64,
    pub top_categories: Vec<CategoryCount>,
}
