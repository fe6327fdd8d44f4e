//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod dispatch_model;
pub mod email_model;
pub mod recipient_model;
pub mod session_log_model;
pub mod status_model;
