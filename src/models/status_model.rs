use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// nunca se ha ejecutado una sesión en este proceso
    Idle,
    Running,
    Completed,
    Aborted,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Completed => "completed",
            SessionState::Aborted => "aborted",
        }
    }
}

/// Destinatario fallido con el detalle del error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedEmail {
    pub address: String,
    pub error: String,
}

impl FailedEmail {
    pub fn new(address: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            error: error.into(),
        }
    }
}

/// Estado en vivo de la sesión actual (o la última).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub session_id: Option<String>,
    pub state: SessionState,
    pub is_sending: bool,
    pub sender_email: String,
    pub current_email: String,
    pub total_emails: usize,
    pub sent_count: usize,
    pub failed_count: usize,
    pub success_emails: Vec<String>,
    pub failed_emails: Vec<FailedEmail>,
    pub abort_reason: Option<String>,
    pub started_at: Option<String>,
    /// id del registro persistido, cuando el log se guardó
    pub log_id: Option<String>,
    /// aviso si no se pudo guardar el log
    pub log_warning: Option<String>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus {
            session_id: None,
            state: SessionState::Idle,
            is_sending: false,
            sender_email: String::new(),
            current_email: String::new(),
            total_emails: 0,
            sent_count: 0,
            failed_count: 0,
            success_emails: Vec::new(),
            failed_emails: Vec::new(),
            abort_reason: None,
            started_at: None,
            log_id: None,
            log_warning: None,
        }
    }
}

impl SessionStatus {
    pub fn attempted(&self) -> usize {
        self.sent_count + self.failed_count
    }
}

/// Vista de `SessionStatus` para GET /api/status: tamaño constante sin importar
/// cuántos destinatarios tenga la sesión.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    pub session_id: Option<String>,
    pub state: SessionState,
    pub is_sending: bool,
    pub sender_email: String,
    pub current_email: String,
    pub total_emails: usize,
    pub sent_count: usize,
    pub failed_count: usize,
    pub abort_reason: Option<String>,
    pub started_at: Option<String>,
    pub log_id: Option<String>,
    pub log_warning: Option<String>,
}

impl From<&SessionStatus> for StatusSummary {
    fn from(s: &SessionStatus) -> Self {
        StatusSummary {
            session_id: s.session_id.clone(),
            state: s.state,
            is_sending: s.is_sending,
            sender_email: s.sender_email.clone(),
            current_email: s.current_email.clone(),
            total_emails: s.total_emails,
            sent_count: s.sent_count,
            failed_count: s.failed_count,
            abort_reason: s.abort_reason.clone(),
            started_at: s.started_at.clone(),
            log_id: s.log_id.clone(),
            log_warning: s.log_warning.clone(),
        }
    }
}
