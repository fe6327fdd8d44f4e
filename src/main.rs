use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::services::dispatch_service::DispatchService;
use crate::services::session_log_service::SessionLogService;
use crate::services::smtp_transport::SmtpMailTransport;
use crate::services::status_service::StatusStore;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env().expect("Configuración inválida");

    // Conectarnos a la DB
    let db_pool = SessionLogService::connect(&config.database_path)
        .await
        .expect("No se pudo conectar a la base de datos SQLite.");

    let log_service = SessionLogService::new(db_pool, config.log_page_size_max);
    if let Err(e) = log_service.run_migrations().await {
        panic!("Fallo en migraciones de 'session_logs': {:?}", e);
    }

    // Un solo StatusStore por proceso, compartido por la sesión y los lectores
    let status_store = StatusStore::new();
    let transport = Arc::new(SmtpMailTransport::from_config(&config));
    let dispatch_service = DispatchService::new(
        status_store,
        log_service.clone(),
        transport,
        config.min_send_delay_secs,
    );

    log::info!(
        "Levantando servidor en {}:{} (relay {}:{})",
        config.host,
        config.port,
        config.smtp_host,
        config.smtp_port
    );
    HttpServer::new(move || {
        App::new()
            // listas de destinatarios grandes llegan en un solo JSON
            .app_data(web::JsonConfig::default().limit(50 * 1024 * 1024))
            .app_data(web::Data::new(log_service.clone()))
            .app_data(web::Data::new(dispatch_service.clone()))
            .configure(app::init_app)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
