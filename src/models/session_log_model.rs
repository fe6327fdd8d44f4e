use serde::{Deserialize, Serialize};

use crate::models::status_model::{FailedEmail, SessionState};

/// Registro final de una sesión, listo para persistir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    /// inicio de la sesión, RFC 3339
    pub timestamp: String,
    pub sender_email: String,
    pub duration_seconds: f64,
    pub subject: String,
    pub total_emails: usize,
    pub sent_count: usize,
    pub failed_count: usize,
    pub success_emails: Vec<String>,
    pub failed_emails: Vec<FailedEmail>,
    pub filename: String,
    pub outcome: SessionState, // "completed" o "aborted"
    pub abort_reason: Option<String>,
    pub cc_emails: Vec<String>,
    pub bcc_emails: Vec<String>,
    pub attachment_names: Vec<String>,
}

/// Registro leído de la base, con su id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSessionRecord {
    pub id: String,
    #[serde(flatten)]
    pub record: SessionRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionLogSummary {
    pub id: String,
    pub session_id: String,
    pub timestamp: String,
    pub sender_email: String,
    pub duration_seconds: f64,
    pub subject: String,
    pub total_emails: usize,
    pub sent_count: usize,
    pub failed_count: usize,
    pub filename: String,
    pub outcome: String,
    pub abort_reason: Option<String>,
}

/// Para listar logs con paginación
#[derive(Debug, Clone, Serialize)]
pub struct ListSessionLogsResponse {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<SessionLogSummary>,
}
