use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::vote::VoteType;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote_type: String, // "up" | "down"
}

/// Counters after a vote, plus the caller's resulting vote (None after a toggle-off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub upvotes: i32,
    pub downvotes: i32,
    pub user_vote: Option<VoteType>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserVoteResponse {
    pub issue_id: i32,
    pub user_vote: Option<VoteType>,
}
