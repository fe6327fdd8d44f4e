//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod dispatch_service;
pub mod session_log_service;
pub mod smtp_transport;
pub mod status_service;
pub mod template_service;
pub mod transport_service;
