use std::time::Duration;

use secrecy::Secret;
use serde::{Deserialize, Serialize};

use crate::models::{email_model::EmailAttachment, recipient_model::RecipientRow};

/// Plantilla con placeholders `{Columna}` en asunto y cuerpo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: String,
}

/// Resultado de aplicar la plantilla a una fila.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

fn default_delay() -> i64 {
    1
}

/// Request para POST /api/dispatch
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRequest {
    /// nombre del archivo subido (solo para el log)
    pub filename: String,
    pub recipients: Vec<RecipientRow>,
    pub email_column: String,
    pub subject: String,
    pub body: String,
    pub sender_email: String,
    pub sender_password: Secret<String>,
    /// segundos entre envíos
    #[serde(default = "default_delay")]
    pub delay: i64,
    #[serde(default)]
    pub cc_emails: Option<String>,
    #[serde(default)]
    pub bcc_emails: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<EmailAttachment>>,
}

/// Credenciales del remitente. Solo viven en memoria durante la sesión.
#[derive(Debug, Clone)]
pub struct SenderCredentials {
    pub email: String,
    pub password: Secret<String>,
}

/// Configuración inmutable de una sesión de envío.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub credentials: SenderCredentials,
    pub delay: Duration,
    pub email_column: String,
    pub cc_emails: Vec<String>,
    pub bcc_emails: Vec<String>,
    pub attachments: Vec<EmailAttachment>,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub session_id: String,
    pub message: String,
}
