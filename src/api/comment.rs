use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::model::auth::Actor;
use crate::model::comment::{CommentCreateRequest, CommentNode, CommentResponse, CommentUpdateRequest};
use crate::model::global_error::AppError;
use crate::service::comment;

#[utoipa::path(
    get,
    path = "/issues/{id}/comments",
    summary = "Top-level comments, newest first",
    params(("id", description = "Issue ID", example = 1)),
    responses(
        (status = 200, description = "Comments", body = Vec<CommentResponse>),
    ),
    tag = "comments",
)]
#[get("/issues/{id}/comments")]
pub async fn list_comments(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let comments = comment::list_top_level(db.get_ref(), path.into_inner()).await?;
    let response: Vec<CommentResponse> = comments.into_iter().map(CommentResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/issues/{id}/thread",
    summary = "Full reply tree of an issue",
    params(("id", description = "Issue ID", example = 1)),
    responses(
        (status = 200, description = "Comment forest", body = Vec<CommentNode>),
    ),
    tag = "comments",
)]
#[get("/issues/{id}/thread")]
pub async fn get_thread(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let thread = comment::load_thread(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(thread))
}

#[utoipa::path(
    get,
    path = "/comments/{id}/replies",
    summary = "Direct replies, oldest first",
    params(("id", description = "Comment ID", example = 1)),
    responses(
        (status = 200, description = "Replies", body = Vec<CommentResponse>),
    ),
    tag = "comments",
)]
#[get("/comments/{id}/replies")]
pub async fn list_replies(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let replies = comment::list_replies(db.get_ref(), path.into_inner()).await?;
    let response: Vec<CommentResponse> = replies.into_iter().map(CommentResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/issues/{id}/comments",
    summary = "Comment on an issue or reply to a comment",
    request_body = CommentCreateRequest,
    params(("id", description = "Issue ID", example = 1)),
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Parent belongs to another issue or is deleted"),
    ),
    security(("bearer" = [])),
    tag = "comments",
)]
#[post("/issues/{id}/comments")]
pub async fn add_comment(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<CommentCreateRequest>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    let created =
        comment::add_comment(db.get_ref(), *actor, path.into_inner(), &body.content, body.parent_id).await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/comments/{id}",
    summary = "Edit own comment",
    request_body = CommentUpdateRequest,
    params(("id", description = "Comment ID", example = 1)),
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 403, description = "Not the author"),
    ),
    security(("bearer" = [])),
    tag = "comments",
)]
#[put("/comments/{id}")]
pub async fn edit_comment(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<CommentUpdateRequest>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    let updated = comment::edit_comment(db.get_ref(), path.into_inner(), *actor, &body.content).await?;
    Ok(HttpResponse::Ok().json(CommentResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    summary = "Soft-delete a comment (author or admin)",
    params(("id", description = "Comment ID", example = 1)),
    responses(
        (status = 204, description = "Comment redacted"),
        (status = 403, description = "Not the author"),
    ),
    security(("bearer" = [])),
    tag = "comments",
)]
#[delete("/comments/{id}")]
pub async fn delete_comment(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    comment::soft_delete(db.get_ref(), path.into_inner(), *actor).await?;
    Ok(HttpResponse::NoContent().finish())
}
