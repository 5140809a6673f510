use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::model::auth::Actor;
use crate::model::common::PaginationResponse;
use crate::model::global_error::AppError;
use crate::model::issue::{
    IssueCounters, IssueCreateRequest, IssueQuery, IssueResponse, IssueStatusUpdateRequest,
    ReconcileSummary,
};
use crate::service::issue;

#[utoipa::path(
    get,
    path = "/issues",
    summary = "List public issues",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("per_page" = Option<u64>, Query, description = "Page size, at most 100"),
        ("status" = Option<String>, Query, description = "open | in_progress | resolved | closed"),
        ("category_id" = Option<i32>, Query, description = "Category filter"),
        ("location_id" = Option<i32>, Query, description = "Location filter"),
        ("include_sublocations" = Option<bool>, Query, description = "Match the whole location subtree"),
        ("search" = Option<String>, Query, description = "Substring of title or description"),
    ),
    responses(
        (status = 200, description = "Issue page", body = PaginationResponse<IssueResponse>),
    ),
    tag = "issues",
)]
#[get("/issues")]
pub async fn list_issues(
    db: web::Data<DatabaseConnection>,
    query: web::Query<IssueQuery>,
) -> Result<HttpResponse, AppError> {
    let page = issue::list_issues(db.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(page.map(IssueResponse::from)))
}

#[utoipa::path(
    get,
    path = "/issues/{id}",
    summary = "Issue detail (records a view)",
    params(("id", description = "Issue ID", example = 1)),
    responses(
        (status = 200, description = "Issue found", body = IssueResponse),
        (status = 404, description = "Issue not found"),
    ),
    tag = "issues",
)]
#[get("/issues/{id}")]
pub async fn get_issue(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let issue_id = path.into_inner();
    issue::record_view(db.get_ref(), issue_id).await;
    let found = issue::get_issue(db.get_ref(), issue_id).await?;

    Ok(HttpResponse::Ok().json(IssueResponse::from(found)))
}

#[utoipa::path(
    post,
    path = "/api/issues",
    summary = "Report an issue",
    request_body = IssueCreateRequest,
    responses(
        (status = 201, description = "Issue created", body = IssueResponse),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer" = [])),
    tag = "issues",
)]
#[post("/issues")]
pub async fn create_issue(
    db: web::Data<DatabaseConnection>,
    body: web::Json<IssueCreateRequest>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    let created = issue::create_issue(db.get_ref(), actor.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(IssueResponse::from(created)))
}

#[utoipa::path(
    delete,
    path = "/api/issues/{id}",
    summary = "Delete an issue (reporter or admin)",
    params(("id", description = "Issue ID", example = 1)),
    responses(
        (status = 204, description = "Issue deleted"),
        (status = 403, description = "Not the reporter"),
    ),
    security(("bearer" = [])),
    tag = "issues",
)]
#[delete("/issues/{id}")]
pub async fn delete_issue(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    issue::delete_issue(db.get_ref(), path.into_inner(), *actor).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    path = "/api/issues/{id}/status",
    summary = "Change issue status (admin)",
    request_body = IssueStatusUpdateRequest,
    params(("id", description = "Issue ID", example = 1)),
    responses(
        (status = 200, description = "Status updated", body = IssueResponse),
    ),
    security(("bearer" = [])),
    tag = "issues",
)]
#[put("/issues/{id}/status")]
pub async fn update_status(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<IssueStatusUpdateRequest>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    let updated = issue::update_status(db.get_ref(), path.into_inner(), body.status).await?;
    Ok(HttpResponse::Ok().json(IssueResponse::from(updated)))
}

#[utoipa::path(
    post,
    path = "/api/issues/{id}/reconcile",
    summary = "Recompute issue counters from source rows (admin)",
    params(("id", description = "Issue ID", example = 1)),
    responses(
        (status = 200, description = "Counters after reconciliation", body = IssueCounters),
    ),
    security(("bearer" = [])),
    tag = "maintenance",
)]
#[post("/issues/{id}/reconcile")]
pub async fn reconcile_issue(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    let counters = issue::reconcile_counters(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(counters))
}

#[utoipa::path(
    post,
    path = "/api/maintenance/reconcile",
    summary = "Reconcile counters of every issue (admin)",
    responses(
        (status = 200, description = "Number of corrected issues", body = ReconcileSummary),
    ),
    security(("bearer" = [])),
    tag = "maintenance",
)]
#[post("/maintenance/reconcile")]
pub async fn reconcile_all(
    db: web::Data<DatabaseConnection>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    let corrected = issue::reconcile_all(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(ReconcileSummary { corrected }))
}
