use actix_web::{get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::entity::category::Entity as CategoryEntity;
use crate::model::auth::Actor;
use crate::model::global_error::AppError;
use crate::model::taxonomy::{CategoryCreateRequest, CategoryResponse, ReparentRequest, TreeQuery};
use crate::service::tree;

#[utoipa::path(
    get,
    path = "/categories",
    summary = "List categories",
    params(
        ("parent_id" = Option<i32>, Query, description = "Direct children of this category"),
        ("roots_only" = Option<bool>, Query, description = "Only top-level categories"),
        ("search" = Option<String>, Query, description = "Name substring"),
        ("include_inactive" = Option<bool>, Query, description = "Also list deactivated categories"),
    ),
    responses(
        (status = 200, description = "Categories in sort order", body = Vec<CategoryResponse>),
    ),
    tag = "categories",
)]
#[get("/categories")]
pub async fn list_categories(
    db: web::Data<DatabaseConnection>,
    query: web::Query<TreeQuery>,
) -> Result<HttpResponse, AppError> {
    let categories = tree::search::<CategoryEntity>(db.get_ref(), &query).await?;
    let response: Vec<CategoryResponse> = categories.into_iter().map(CategoryResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    summary = "Create a category (admin)",
    request_body = CategoryCreateRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 409, description = "Name already taken or parent inactive"),
    ),
    security(("bearer" = [])),
    tag = "categories",
)]
#[post("/categories")]
pub async fn create_category(
    db: web::Data<DatabaseConnection>,
    body: web::Json<CategoryCreateRequest>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    let created = tree::create_category(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(CategoryResponse::from(created)))
}

#[utoipa::path(
    post,
    path = "/api/categories/{id}/deactivate",
    summary = "Deactivate a category (admin)",
    params(("id", description = "Category ID", example = 1)),
    responses(
        (status = 204, description = "Category inactive"),
        (status = 409, description = "Category still has active children"),
    ),
    security(("bearer" = [])),
    tag = "categories",
)]
#[post("/categories/{id}/deactivate")]
pub async fn deactivate_category(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    tree::deactivate::<CategoryEntity>(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/categories/{id}/activate",
    summary = "Reactivate a category (admin)",
    params(("id", description = "Category ID", example = 1)),
    responses(
        (status = 204, description = "Category active"),
    ),
    security(("bearer" = [])),
    tag = "categories",
)]
#[post("/categories/{id}/activate")]
pub async fn activate_category(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    tree::activate::<CategoryEntity>(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}/parent",
    summary = "Move a category under another parent (admin)",
    request_body = ReparentRequest,
    params(("id", description = "Category ID", example = 1)),
    responses(
        (status = 200, description = "Category moved", body = CategoryResponse),
    ),
    security(("bearer" = [])),
    tag = "categories",
)]
#[put("/categories/{id}/parent")]
pub async fn reparent_category(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<ReparentRequest>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    let moved = tree::reparent::<CategoryEntity>(db.get_ref(), path.into_inner(), body.parent_id).await?;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(moved)))
}
