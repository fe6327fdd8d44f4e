//! services/dispatch_service.rs
//! Sesión de envío masivo: valida la petición, recorre los destinatarios en
//! orden, publica el progreso en el `StatusStore` y guarda el log al final.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use lettre::message::header::ContentType;
use tokio::{task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    models::{
        dispatch_model::{DispatchConfig, DispatchRequest, MessageTemplate, SenderCredentials},
        email_model::parse_email_list,
        recipient_model::RecipientRow,
        session_log_model::SessionRecord,
        status_model::{FailedEmail, SessionState, SessionStatus},
    },
    services::{
        session_log_service::SessionLogService,
        status_service::StatusStore,
        template_service,
        transport_service::{MailConnection, MailTransport, OutgoingEmail},
    },
};

pub const INVALID_ADDRESS: &str = "invalid address";
pub const CANCELLED_REASON: &str = "cancelled by operator";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("recipient list is empty")]
    EmptyRecipientList,

    #[error("email column {column:?} is missing from row {row}")]
    MissingEmailColumn { column: String, row: usize },

    #[error("invalid delay {delay}s, minimum is {min}s")]
    InvalidDelay { delay: i64, min: u64 },

    #[error("attachment {filename:?} has an invalid content type {content_type:?}")]
    InvalidAttachment {
        filename: String,
        content_type: String,
    },

    #[error("a dispatch session is already running")]
    SessionAlreadyActive,
}

/// Todo lo que la sesión posee mientras corre.
struct DispatchSession {
    recipients: Vec<RecipientRow>,
    template: MessageTemplate,
    config: DispatchConfig,
}

pub struct StartedSession {
    pub session_id: String,
    pub handle: JoinHandle<SessionReport>,
}

/// Resultado final de una sesión, tras intentar guardar el log.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub record: SessionRecord,
    pub log_id: Option<String>,
    pub log_warning: Option<String>,
}

#[derive(Clone)]
pub struct DispatchService {
    status: StatusStore,
    log_service: SessionLogService,
    transport: Arc<dyn MailTransport>,
    min_delay_secs: u64,
}

impl DispatchService {
    pub fn new(
        status: StatusStore,
        log_service: SessionLogService,
        transport: Arc<dyn MailTransport>,
        min_delay_secs: u64,
    ) -> Self {
        Self {
            status,
            log_service,
            transport,
            min_delay_secs,
        }
    }

    pub fn status(&self) -> &StatusStore {
        &self.status
    }

    /// Valida y arranca una sesión en segundo plano. Devuelve en cuanto el
    /// estado quedó reiniciado; el progreso se consulta vía `StatusStore`.
    pub async fn start(&self, req: DispatchRequest) -> Result<StartedSession, DispatchError> {
        let session = self.validate(req)?;

        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let token = self
            .status
            .begin(
                &session_id,
                &session.config.credentials.email,
                session.recipients.len(),
                &started_at.to_rfc3339(),
            )
            .await?;

        log::info!(
            "Starting dispatch session {} from {}: {} recipients, delay {:?}, file {}",
            session_id,
            session.config.credentials.email,
            session.recipients.len(),
            session.config.delay,
            session.config.filename
        );
        warn_unknown_placeholders(&session);

        let service = self.clone();
        let id = session_id.clone();
        let handle = tokio::spawn(async move {
            service
                .run_session(id, started_at.to_rfc3339(), session, token)
                .await
        });

        Ok(StartedSession { session_id, handle })
    }

    /// Pide detener la sesión activa tras el envío en curso.
    pub async fn cancel(&self) -> bool {
        let cancelled = self.status.cancel().await;
        if cancelled {
            log::info!("Cancellation requested for the running dispatch session");
        }
        cancelled
    }

    fn validate(&self, req: DispatchRequest) -> Result<DispatchSession, DispatchError> {
        if req.recipients.is_empty() {
            return Err(DispatchError::EmptyRecipientList);
        }

        if let Some(index) = req
            .recipients
            .iter()
            .position(|row| !row.has_column(&req.email_column))
        {
            return Err(DispatchError::MissingEmailColumn {
                column: req.email_column,
                row: index + 1,
            });
        }

        if req.delay < 0 || (req.delay as u64) < self.min_delay_secs {
            return Err(DispatchError::InvalidDelay {
                delay: req.delay,
                min: self.min_delay_secs,
            });
        }

        let attachments = req.attachments.unwrap_or_default();
        if let Some(bad) = attachments
            .iter()
            .find(|a| ContentType::parse(&a.content_type).is_err())
        {
            return Err(DispatchError::InvalidAttachment {
                filename: bad.filename.clone(),
                content_type: bad.content_type.clone(),
            });
        }

        let config = DispatchConfig {
            credentials: SenderCredentials {
                email: req.sender_email.trim().to_string(),
                password: req.sender_password,
            },
            delay: Duration::from_secs(req.delay as u64),
            email_column: req.email_column,
            cc_emails: parse_email_list(req.cc_emails.as_deref().unwrap_or("")),
            bcc_emails: parse_email_list(req.bcc_emails.as_deref().unwrap_or("")),
            attachments,
            filename: req.filename,
        };

        Ok(DispatchSession {
            recipients: req.recipients,
            template: MessageTemplate {
                subject: req.subject,
                body: req.body,
            },
            config,
        })
    }

    async fn run_session(
        self,
        session_id: String,
        started_at: String,
        session: DispatchSession,
        token: CancellationToken,
    ) -> SessionReport {
        let clock = Instant::now();

        let (state, abort_reason) = match self.send_all(&session, &token).await {
            None => (SessionState::Completed, None),
            Some(reason) => (SessionState::Aborted, Some(reason)),
        };
        let final_status = self.status.finish(state, abort_reason).await;

        match state {
            SessionState::Completed => log::info!(
                "Dispatch session {} completed: {} sent, {} failed in {:.1}s",
                session_id,
                final_status.sent_count,
                final_status.failed_count,
                clock.elapsed().as_secs_f64()
            ),
            _ => log::error!(
                "Dispatch session {} aborted after {}/{} recipients: {}",
                session_id,
                final_status.attempted(),
                final_status.total_emails,
                final_status.abort_reason.as_deref().unwrap_or("unknown reason")
            ),
        }

        let record = build_record(
            session_id.clone(),
            started_at,
            clock.elapsed(),
            &session,
            final_status,
        );

        let (log_id, log_warning) = match self.log_service.commit(&record).await {
            Ok(id) => {
                self.status.attach_log_result(&session_id, Ok(id.clone())).await;
                (Some(id), None)
            }
            Err(e) => {
                let warning = format!("Session log could not be saved: {e:#}");
                log::warn!("Dispatch session {}: {}", session_id, warning);
                self.status
                    .attach_log_result(&session_id, Err(warning.clone()))
                    .await;
                (None, Some(warning))
            }
        };

        SessionReport {
            record,
            log_id,
            log_warning,
        }
    }

    /// Recorre los destinatarios. `None` = completada, `Some(motivo)` = abortada.
    async fn send_all(
        &self,
        session: &DispatchSession,
        token: &CancellationToken,
    ) -> Option<String> {
        let config = &session.config;

        let connection = match self.transport.connect(&config.credentials).await {
            Ok(connection) => connection,
            Err(e) => return Some(e.to_string()),
        };

        let total = session.recipients.len();
        for (index, row) in session.recipients.iter().enumerate() {
            if token.is_cancelled() {
                return Some(CANCELLED_REASON.to_string());
            }

            let address = row.get(&config.email_column).unwrap_or("").trim();
            if address.is_empty() {
                log::warn!("Row {} has a blank {} cell, skipping", index + 1, config.email_column);
                self.status
                    .record_skipped(FailedEmail::new(address, INVALID_ADDRESS))
                    .await;
                continue;
            }

            if let Some(reason) = self
                .send_one(connection.as_ref(), session, row, address)
                .await
            {
                return Some(reason);
            }

            if !config.delay.is_zero() && index + 1 < total {
                tokio::select! {
                    _ = tokio::time::sleep(config.delay) => {}
                    _ = token.cancelled() => return Some(CANCELLED_REASON.to_string()),
                }
            }
        }

        None
    }

    /// Un intento por destinatario. Devuelve un motivo solo si el error es fatal
    /// para la sesión.
    async fn send_one(
        &self,
        connection: &dyn MailConnection,
        session: &DispatchSession,
        row: &RecipientRow,
        address: &str,
    ) -> Option<String> {
        let rendered = template_service::render(&session.template, row);
        self.status.publish_current(address).await;

        let email = OutgoingEmail {
            to: address,
            cc: &session.config.cc_emails,
            bcc: &session.config.bcc_emails,
            subject: &rendered.subject,
            body: &rendered.body,
            attachments: &session.config.attachments,
        };

        match connection.send(&email).await {
            Ok(()) => {
                log::info!("Email sent successfully to {}", address);
                self.status.record_success(address).await;
                None
            }
            Err(e) if e.is_session_fatal() => {
                // el intento cuenta como fallido aunque aborte la sesión
                self.status
                    .record_failure(FailedEmail::new(address, e.to_string()))
                    .await;
                Some(format!("{address}: {e}"))
            }
            Err(e) => {
                log::warn!("Failed to send email to {}: {}", address, e);
                self.status
                    .record_failure(FailedEmail::new(address, e.to_string()))
                    .await;
                None
            }
        }
    }
}

fn build_record(
    session_id: String,
    started_at: String,
    elapsed: Duration,
    session: &DispatchSession,
    status: SessionStatus,
) -> SessionRecord {
    SessionRecord {
        session_id,
        timestamp: started_at,
        sender_email: status.sender_email,
        duration_seconds: elapsed.as_secs_f64(),
        subject: session.template.subject.clone(),
        total_emails: status.total_emails,
        sent_count: status.sent_count,
        failed_count: status.failed_count,
        success_emails: status.success_emails,
        failed_emails: status.failed_emails,
        filename: session.config.filename.clone(),
        outcome: status.state,
        abort_reason: status.abort_reason,
        cc_emails: session.config.cc_emails.clone(),
        bcc_emails: session.config.bcc_emails.clone(),
        attachment_names: session
            .config
            .attachments
            .iter()
            .map(|a| a.filename.clone())
            .collect(),
    }
}

// Un placeholder sin columna se sustituye por "", lo avisamos una vez por sesión
fn warn_unknown_placeholders(session: &DispatchSession) {
    let Some(first) = session.recipients.first() else {
        return;
    };
    log::debug!("Columns: {:?}", first.columns().collect::<Vec<_>>());
    let mut names = template_service::placeholders(&session.template.subject);
    for name in template_service::placeholders(&session.template.body) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    for name in names.iter().filter(|n| !first.has_column(n)) {
        log::warn!("Placeholder {{{}}} does not match any column", name);
    }
}
