use actix_web::{http::StatusCode, web, HttpResponse};
use serde_json::json;

use crate::{
    models::dispatch_model::{DispatchRequest, DispatchResponse},
    services::dispatch_service::{DispatchError, DispatchService},
};

/// POST /api/dispatch
pub async fn start_dispatch_endpoint(
    dispatch_service: web::Data<DispatchService>,
    body: web::Json<DispatchRequest>,
) -> HttpResponse {
    let req_data = body.into_inner();
    log::info!(
        "Dispatch request received - filename: {}, sender: {}, recipients: {}, email_column: {}, delay: {}",
        req_data.filename,
        req_data.sender_email,
        req_data.recipients.len(),
        req_data.email_column,
        req_data.delay
    );

    // El JoinHandle se descarta: la sesión sigue sola en background
    match dispatch_service.start(req_data).await {
        Ok(started) => HttpResponse::Accepted().json(DispatchResponse {
            success: true,
            session_id: started.session_id,
            message: "Email sending started in background".to_string(),
        }),
        Err(e) => {
            log::error!("Dispatch rejected: {}", e);
            HttpResponse::build(dispatch_error_status(&e)).json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}

/// GET /api/status (resumen liviano para polling)
pub async fn status_endpoint(dispatch_service: web::Data<DispatchService>) -> HttpResponse {
    // sin listas completas: el detalle vive en /api/logs/{id}
    let summary = dispatch_service.status().summary().await;
    HttpResponse::Ok().json(summary)
}

/// POST /api/dispatch/cancel
pub async fn cancel_dispatch_endpoint(
    dispatch_service: web::Data<DispatchService>,
) -> HttpResponse {
    let cancelled = dispatch_service.cancel().await;
    HttpResponse::Ok().json(json!({
        "success": true,
        "cancelled": cancelled
    }))
}

fn dispatch_error_status(error: &DispatchError) -> StatusCode {
    match error {
        DispatchError::SessionAlreadyActive => StatusCode::CONFLICT,
        DispatchError::EmptyRecipientList
        | DispatchError::MissingEmailColumn { .. }
        | DispatchError::InvalidDelay { .. }
        | DispatchError::InvalidAttachment { .. } => StatusCode::BAD_REQUEST,
    }
}
