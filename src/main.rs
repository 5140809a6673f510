use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use sunoaid::api::{self, ApiDoc};
use sunoaid::auth::JwtUtils;
use sunoaid::configuration::Settings;
use sunoaid::db::init_db;
use sunoaid::migration::{Migrator, MigratorTrait};
use sunoaid::telemetry::{get_subscriber, init_subscriber};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    let subscriber = get_subscriber("sunoaid".into(), settings.log_filter.clone(), std::io::stdout);
    init_subscriber(subscriber)?;

    info!("starting application");

    let db = init_db(&settings.database).await?;
    info!("running database migrations");
    Migrator::up(&db, None).await?;
    info!("migrations complete");

    let db_data = Data::new(db);
    let jwt = JwtUtils::new(settings.jwt_secret.clone());
    let openapi = ApiDoc::openapi();

    let address = (settings.application.host.clone(), settings.application.port);
    info!(host = %address.0, port = address.1, "starting http server");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(db_data.clone())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
            .configure(api::configure(jwt.clone()))
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
