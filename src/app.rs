//! app.rs
use crate::handlers::{dispatch_handler, log_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(log_handler::health_endpoint))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/dispatch")
                        .route("", web::post().to(dispatch_handler::start_dispatch_endpoint))
                        .route(
                            "/cancel",
                            web::post().to(dispatch_handler::cancel_dispatch_endpoint),
                        ),
                )
                .route("/status", web::get().to(dispatch_handler::status_endpoint))
                .service(
                    web::scope("/logs")
                        .route("", web::get().to(log_handler::list_logs_endpoint))
                        .route("/{id}", web::get().to(log_handler::get_log_endpoint)),
                ),
        );
}
