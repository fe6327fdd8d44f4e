//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers (envíos, estado, logs).
pub mod dispatch_handler;
pub mod log_handler;
