//! handlers/log_handler.rs
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::services::session_log_service::SessionLogService;

#[derive(Deserialize)]
pub struct PaginationQuery {
    page: Option<u64>,
    page_size: Option<u64>,
}

/// GET /api/logs
pub async fn list_logs_endpoint(
    log_service: web::Data<SessionLogService>,
    query: web::Query<PaginationQuery>,
) -> HttpResponse {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(10);

    match log_service.list_logs(page, page_size).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /api/logs/{id}
pub async fn get_log_endpoint(
    log_service: web::Data<SessionLogService>,
    path: web::Path<String>,
) -> HttpResponse {
    let log_id = path.into_inner();

    match log_service.get_log(&log_id).await {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Log not found",
            "id": log_id
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /health
pub async fn health_endpoint() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
