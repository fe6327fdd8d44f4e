//! services/transport_service.rs
//! Puerto hacia el relay de correo: autenticar una vez, enviar uno por llamada.

use async_trait::async_trait;

use crate::models::{dispatch_model::SenderCredentials, email_model::EmailAttachment};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// El relay rechazó este destinatario (buzón lleno, no existe, ...)
    #[error("{0}")]
    Rejected(String),

    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("timed out waiting for the mail relay")]
    Timeout,

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

impl TransportError {
    /// Errores que invalidan toda la sesión, no solo al destinatario actual.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::Authentication(_) | TransportError::ConnectionLost(_)
        )
    }
}

/// Un mensaje ya renderizado para un destinatario. El remitente lo fija la conexión.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingEmail<'a> {
    pub to: &'a str,
    pub cc: &'a [String],
    pub bcc: &'a [String],
    pub subject: &'a str,
    pub body: &'a str,
    pub attachments: &'a [EmailAttachment],
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Abre y autentica la conexión para una sesión completa.
    async fn connect(
        &self,
        credentials: &SenderCredentials,
    ) -> Result<Box<dyn MailConnection>, TransportError>;
}

#[async_trait]
pub trait MailConnection: Send + Sync {
    async fn send(&self, email: &OutgoingEmail<'_>) -> Result<(), TransportError>;
}
