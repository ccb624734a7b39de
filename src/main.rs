use std::io;
use std::sync::Arc;

use checkout_service::{build_server, create_pool, run_migrations, AppConfig, HttpPaymentGateway};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config =
        AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let pool = create_pool(&config.database_url, config.db_pool_size)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    run_migrations(&pool);

    if config.payment.token.is_none() {
        log::warn!("FAKE_PAYMENT_TOKEN is not set; every checkout will fail at the payment step");
    }
    let gateway = Arc::new(HttpPaymentGateway::from_config(&config.payment));

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(pool, gateway, &config.jwt_secret, &config.host, config.port)?.await
}
