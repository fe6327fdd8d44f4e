//! services/status_service.rs
//! Estado en vivo de la sesión de envío. Un solo escritor (la sesión activa),
//! cualquier cantidad de lectores.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{
    models::status_model::{FailedEmail, SessionState, SessionStatus, StatusSummary},
    services::dispatch_service::DispatchError,
};

#[derive(Debug, Default)]
struct StatusInner {
    status: SessionStatus,
    cancel: Option<CancellationToken>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusStore {
    inner: Arc<RwLock<StatusInner>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot completo y consistente del estado actual.
    pub async fn read(&self) -> SessionStatus {
        self.inner.read().await.status.clone()
    }

    /// Contadores sin las listas de direcciones, para el polling.
    pub async fn summary(&self) -> StatusSummary {
        StatusSummary::from(&self.inner.read().await.status)
    }

    /// Reinicia el estado para una sesión nueva. Falla si ya hay una corriendo,
    /// sin tocar el estado de esa sesión.
    pub async fn begin(
        &self,
        session_id: &str,
        sender_email: &str,
        total_emails: usize,
        started_at: &str,
    ) -> Result<CancellationToken, DispatchError> {
        let mut inner = self.inner.write().await;
        if inner.status.is_sending {
            return Err(DispatchError::SessionAlreadyActive);
        }

        inner.status = SessionStatus {
            session_id: Some(session_id.to_string()),
            state: SessionState::Running,
            is_sending: true,
            sender_email: sender_email.to_string(),
            total_emails,
            started_at: Some(started_at.to_string()),
            ..SessionStatus::default()
        };

        let token = CancellationToken::new();
        inner.cancel = Some(token.clone());
        Ok(token)
    }

    pub async fn publish_current(&self, address: &str) {
        let mut inner = self.inner.write().await;
        inner.status.current_email = address.to_string();
    }

    pub async fn record_success(&self, address: &str) {
        let mut inner = self.inner.write().await;
        inner.status.sent_count += 1;
        inner.status.success_emails.push(address.to_string());
    }

    pub async fn record_failure(&self, failed: FailedEmail) {
        let mut inner = self.inner.write().await;
        inner.status.failed_count += 1;
        inner.status.failed_emails.push(failed);
    }

    /// Fila sin dirección: ningún envío en curso, así que se limpia el actual.
    pub async fn record_skipped(&self, failed: FailedEmail) {
        let mut inner = self.inner.write().await;
        inner.status.current_email.clear();
        inner.status.failed_count += 1;
        inner.status.failed_emails.push(failed);
    }

    /// Cierra la sesión: deja de enviar y limpia el destinatario actual.
    /// Devuelve el estado final tomado bajo el mismo lock.
    pub async fn finish(&self, state: SessionState, abort_reason: Option<String>) -> SessionStatus {
        let mut inner = self.inner.write().await;
        inner.status.is_sending = false;
        inner.status.current_email.clear();
        inner.status.state = state;
        inner.status.abort_reason = abort_reason;
        inner.cancel = None;
        inner.status.clone()
    }

    /// Resultado de persistir el log. Se ignora si ya empezó otra sesión.
    pub async fn attach_log_result(&self, session_id: &str, result: Result<String, String>) {
        let mut inner = self.inner.write().await;
        if inner.status.session_id.as_deref() != Some(session_id) {
            return;
        }
        match result {
            Ok(log_id) => inner.status.log_id = Some(log_id),
            Err(warning) => inner.status.log_warning = Some(warning),
        }
    }

    /// Pide cancelar la sesión activa. Devuelve false si no hay ninguna.
    pub async fn cancel(&self) -> bool {
        let inner = self.inner.read().await;
        match (&inner.cancel, inner.status.is_sending) {
            (Some(token), true) => {
                token.cancel();
                true
            }
            _ => false,
        }
    }
}
