use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::model::auth::Actor;
use crate::model::dashboard::DashboardStats;
use crate::model::global_error::AppError;
use crate::service::dashboard::{self, DEFAULT_TOP_CATEGORIES};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub top: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    summary = "Issue and user rollups (admin)",
    params(("top" = Option<u64>, Query, description = "Number of top categories, default 5")),
    responses(
        (status = 200, description = "Dashboard snapshot", body = DashboardStats),
        (status = 403, description = "Not an administrator"),
    ),
    security(("bearer" = [])),
    tag = "dashboard",
)]
#[get("/dashboard/stats")]
pub async fn get_stats(
    db: web::Data<DatabaseConnection>,
    query: web::Query<DashboardQuery>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    actor.require_admin()?;
    let top_n = query.top.unwrap_or(DEFAULT_TOP_CATEGORIES).min(50);
    let stats = dashboard::dashboard_stats(db.get_ref(), top_n).await?;
    Ok(HttpResponse::Ok().json(stats))
}
