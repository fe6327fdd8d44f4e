//! config/app_config.rs
//! Configuración global del servicio, leída de variables de entorno (.env).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_timeout: Duration,
    /// delay mínimo permitido entre envíos (segundos)
    pub min_send_delay_secs: u64,
    pub log_page_size_max: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 5022,
            database_path: PathBuf::from("data").join("bulk_mailer.db"),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_timeout: Duration::from_secs(30),
            min_send_delay_secs: 0,
            log_page_size_max: 50,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la config a partir de una función de búsqueda (útil en tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let smtp_timeout_secs: u64 = parse_or(&lookup, "SMTP_TIMEOUT_SECS", 30)?;
        let log_page_size_max: u64 = parse_or(&lookup, "LOG_PAGE_SIZE_MAX", defaults.log_page_size_max)?;
        if log_page_size_max == 0 {
            anyhow::bail!("LOG_PAGE_SIZE_MAX debe ser mayor que 0");
        }

        Ok(AppConfig {
            host: lookup("APP_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "APP_PORT", defaults.port)?,
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            smtp_host: lookup("SMTP_HOST").unwrap_or(defaults.smtp_host),
            smtp_port: parse_or(&lookup, "SMTP_PORT", defaults.smtp_port)?,
            smtp_timeout: Duration::from_secs(smtp_timeout_secs),
            min_send_delay_secs: parse_or(&lookup, "MIN_SEND_DELAY_SECS", defaults.min_send_delay_secs)?,
            log_page_size_max,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Valor inválido para {key}: {raw:?}")),
        None => Ok(default),
    }
}
