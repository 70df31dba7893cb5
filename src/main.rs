use actix_web::{web, App, HttpServer};
use log::{error, info};

use content_sync::api;
use content_sync::app_state::AppState;
use content_sync::config::AppConfig;
use content_sync::logging;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let (config, source) =
        AppConfig::load().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    logging::init(&config.logging);
    source.log();

    let app_state = AppState::from_config(config.clone()).map_err(|e| {
        error!("Failed to initialize application state: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let app_state = web::Data::new(app_state);

    info!("Starting server on {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(api::configure)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
