pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod jsend;
pub mod openapi;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::OrderService;
use auth::JwtVerifier;
use domain::payment::PaymentRegistry;
use domain::ports::PaymentGateway;
use errors::AppError;
use infrastructure::order_repo::DieselOrderRepository;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};
pub use infrastructure::payment_gateway::HttpPaymentGateway;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

/// Malformed bodies get the same JSend `fail` envelope as any other bad input.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid request body: {err}")).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid query string: {err}")).into()
    })
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// `gateway` is the payment provider every checkout charges through; tests
/// pass a fake here. The caller is responsible for `.await`-ing (or
/// `tokio::spawn`-ing) the returned server.
pub fn build_server(
    pool: DbPool,
    gateway: Arc<dyn PaymentGateway>,
    jwt_secret: &str,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let orders = web::Data::new(OrderService::new(
        DieselOrderRepository::new(pool),
        PaymentRegistry::with_gateway(gateway),
    ));
    let verifier = web::Data::new(JwtVerifier::new(jwt_secret));
    let api_doc = openapi::ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(orders.clone())
            .app_data(verifier.clone())
            .app_data(json_config())
            .app_data(query_config())
            .wrap(Logger::default())
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", api_doc.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
