use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::entity::vote::VoteType;
use crate::model::auth::Actor;
use crate::model::global_error::AppError;
use crate::model::vote::{UserVoteResponse, VoteRequest, VoteTally};
use crate::service::vote;

#[utoipa::path(
    post,
    path = "/api/issues/{id}/vote",
    summary = "Vote on an issue; repeating the same vote removes it",
    request_body = VoteRequest,
    params(("id", description = "Issue ID", example = 7)),
    responses(
        (status = 200, description = "Counters after the vote", body = VoteTally),
        (status = 400, description = "Vote type is not 'up' or 'down'"),
        (status = 404, description = "Issue not found"),
    ),
    security(("bearer" = [])),
    tag = "votes",
)]
#[post("/issues/{id}/vote")]
pub async fn cast_vote(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<VoteRequest>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    let vote_type: VoteType = body.vote_type.parse()?;
    let tally = vote::cast_vote(db.get_ref(), actor.user_id, path.into_inner(), vote_type).await?;
    Ok(HttpResponse::Ok().json(tally))
}

#[utoipa::path(
    get,
    path = "/api/issues/{id}/vote",
    summary = "The caller's current vote",
    params(("id", description = "Issue ID", example = 7)),
    responses(
        (status = 200, description = "Current vote, if any", body = UserVoteResponse),
    ),
    security(("bearer" = [])),
    tag = "votes",
)]
#[get("/issues/{id}/vote")]
pub async fn get_user_vote(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    let issue_id = path.into_inner();
    let user_vote = vote::user_vote(db.get_ref(), actor.user_id, issue_id).await?;
    Ok(HttpResponse::Ok().json(UserVoteResponse { issue_id, user_vote }))
}
