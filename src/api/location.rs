use actix_web::{get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::entity::location::Entity as LocationEntity;
use crate::model::auth::Actor;
use crate::model::global_error::AppError;
use crate::model::taxonomy::{LocationCreateRequest, LocationResponse, ReparentRequest, TreeQuery};
use crate::service::tree;

#[utoipa::path(
    get,
    path = "/locations",
    summary = "List locations",
    params(
        ("type" = Option<String>, Query, description = "province | city | barangay | street"),
        ("parent_id" = Option<i32>, Query, description = "Direct children of this location"),
        ("roots_only" = Option<bool>, Query, description = "Only top-level locations"),
        ("search" = Option<String>, Query, description = "Name substring"),
        ("include_inactive" = Option<bool>, Query, description = "Also list deactivated locations"),
    ),
    responses(
        (status = 200, description = "Locations", body = Vec<LocationResponse>),
    ),
    tag = "locations",
)]
#[get("/locations")]
pub async fn list_locations(
    db: web::Data<DatabaseConnection>,
    query: web::Query<TreeQuery>,
) -> Result<HttpResponse, AppError> {
    let locations = tree::search::<LocationEntity>(db.get_ref(), &query).await?;
    let response: Vec<LocationResponse> = locations.into_iter().map(LocationResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/locations",
    summary = "Create a location (admin)",
    request_body = LocationCreateRequest,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 409, description = "Parent is inactive"),
    ),
    security(("bearer" = [])),
    tag = "locations",
)]
#[post("/locations")]
pub async fn create_location(
    db: web::Data<DatabaseConnection>,
    body: web::Json<LocationCreateRequest>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    let created = tree::create_location(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(LocationResponse::from(created)))
}

#[utoipa::path(
    post,
    path = "/api/locations/{id}/deactivate",
    summary = "Deactivate a location (admin)",
    params(("id", description = "Location ID", example = 1)),
    responses(
        (status = 204, description = "Location inactive"),
        (status = 409, description = "Location still has active children"),
    ),
    security(("bearer" = [])),
    tag = "locations",
)]
#[post("/locations/{id}/deactivate")]
pub async fn deactivate_location(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    tree::deactivate::<LocationEntity>(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/locations/{id}/activate",
    summary = "Reactivate a location (admin)",
    params(("id", description = "Location ID", example = 1)),
    responses(
        (status = 204, description = "Location active"),
        (status = 409, description = "Parent is inactive"),
    ),
    security(("bearer" = [])),
    tag = "locations",
)]
#[post("/locations/{id}/activate")]
pub async fn activate_location(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    tree::activate::<LocationEntity>(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    path = "/api/locations/{id}/parent",
    summary = "Move a location under another parent (admin)",
    request_body = ReparentRequest,
    params(("id", description = "Location ID", example = 1)),
    responses(
        (status = 200, description = "Location moved", body = LocationResponse),
        (status = 409, description = "Move would create a cycle"),
    ),
    security(("bearer" = [])),
    tag = "locations",
)]
#[put("/locations/{id}/parent")]
pub async fn reparent_location(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<ReparentRequest>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    let moved = tree::reparent::<LocationEntity>(db.get_ref(), path.into_inner(), body.parent_id).await?;
    Ok(HttpResponse::Ok().json(LocationResponse::from(moved)))
}
