//! tests/mod.rs
pub mod support;

mod session_log_tests;
mod status_tests;
