use actix_web::{get, web, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use tracing::warn;

#[utoipa::path(
    get,
    path = "/health-check",
    responses(
        (status = 200, description = "Server and database reachable", body = String),
        (status = 503, description = "Database unreachable"),
    ),
    tag = "health check",
)]
#[get("/health-check")]
pub async fn health_check(db: web::Data<DatabaseConnection>) -> impl Responder {
    match db.ping().await {
        Ok(()) => HttpResponse::Ok().body("OK"),
        Err(err) => {
            warn!(error = %err, "database ping failed");
            HttpResponse::ServiceUnavailable().body("DB UNAVAILABLE")
        }
    }
}
