//! tests/support.rs
//! Helpers compartidos: transporte en memoria con guion, base temporal, requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::Secret;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::models::{
    dispatch_model::{DispatchRequest, SenderCredentials},
    recipient_model::RecipientRow,
};
use crate::services::{
    dispatch_service::DispatchService,
    session_log_service::SessionLogService,
    status_service::StatusStore,
    transport_service::{MailConnection, MailTransport, OutgoingEmail, TransportError},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub attachments: Vec<String>,
}

/// Punto de bloqueo: la conexión se detiene al enviar a `address` hasta `release()`.
#[derive(Clone)]
pub struct Gate {
    address: String,
    reached: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct Script {
    failures: HashMap<String, TransportError>,
    connect_error: Option<TransportError>,
    gates: Vec<Gate>,
    attempts: Vec<String>,
    attempted_at: Vec<Instant>,
    sent: Vec<SentEmail>,
    connects: usize,
}

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(self, address: &str, error: TransportError) -> Self {
        self.script
            .lock()
            .unwrap()
            .failures
            .insert(address.to_string(), error);
        self
    }

    pub fn fail_connect(self, error: TransportError) -> Self {
        self.script.lock().unwrap().connect_error = Some(error);
        self
    }

    pub fn gate(&self, address: &str) -> Gate {
        let gate = Gate {
            address: address.to_string(),
            reached: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        self.script.lock().unwrap().gates.push(gate.clone());
        gate
    }

    /// Direcciones que llegaron al transporte, en orden.
    pub fn attempts(&self) -> Vec<String> {
        self.script.lock().unwrap().attempts.clone()
    }

    /// Instante (reloj de tokio) de cada intento, en el mismo orden que `attempts`.
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.script.lock().unwrap().attempted_at.clone()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.script.lock().unwrap().sent.clone()
    }

    pub fn connects(&self) -> usize {
        self.script.lock().unwrap().connects
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    async fn connect(
        &self,
        _credentials: &SenderCredentials,
    ) -> Result<Box<dyn MailConnection>, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.connects += 1;
        if let Some(error) = script.connect_error.clone() {
            return Err(error);
        }
        Ok(Box::new(ScriptedConnection {
            script: self.script.clone(),
        }))
    }
}

struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl MailConnection for ScriptedConnection {
    async fn send(&self, email: &OutgoingEmail<'_>) -> Result<(), TransportError> {
        let gate = {
            let mut script = self.script.lock().unwrap();
            script.attempts.push(email.to.to_string());
            script.attempted_at.push(Instant::now());
            script.gates.iter().find(|g| g.address == email.to).cloned()
        };

        if let Some(gate) = gate {
            gate.reached.notify_one();
            gate.release.notified().await;
        }

        let mut script = self.script.lock().unwrap();
        if let Some(error) = script.failures.get(email.to).cloned() {
            return Err(error);
        }
        script.sent.push(SentEmail {
            to: email.to.to_string(),
            subject: email.subject.to_string(),
            body: email.body.to_string(),
            cc: email.cc.to_vec(),
            bcc: email.bcc.to_vec(),
            attachments: email.attachments.iter().map(|a| a.filename.clone()).collect(),
        });
        Ok(())
    }
}

pub fn row(cells: &[(&str, &str)]) -> RecipientRow {
    cells.iter().copied().collect()
}

/// Filas con columnas Name / Email.
pub fn recipients(emails: &[&str]) -> Vec<RecipientRow> {
    emails
        .iter()
        .enumerate()
        .map(|(i, email)| {
            let name = format!("User{}", i + 1);
            row(&[("Name", name.as_str()), ("Email", email)])
        })
        .collect()
}

pub fn dispatch_request(recipients: Vec<RecipientRow>) -> DispatchRequest {
    DispatchRequest {
        filename: "recipients.xlsx".to_string(),
        recipients,
        email_column: "Email".to_string(),
        subject: "Hola {Name}".to_string(),
        body: "Hi {Name}, this is for {Email}".to_string(),
        sender_email: "sender@example.com".to_string(),
        sender_password: Secret::new("app-password".to_string()),
        delay: 0,
        cc_emails: None,
        bcc_emails: None,
        attachments: None,
    }
}

/// Log service sobre una base SQLite temporal ya migrada.
pub async fn test_log_service() -> (SessionLogService, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let pool = SessionLogService::connect(&dir.path().join("logs.db"))
        .await
        .expect("Failed to open test database");
    let service = SessionLogService::new(pool, 50);
    service
        .run_migrations()
        .await
        .expect("Failed to run migrations");
    (service, dir)
}

pub async fn test_dispatch_service(
    transport: ScriptedTransport,
) -> (DispatchService, SessionLogService, TempDir) {
    let (log_service, dir) = test_log_service().await;
    let service = DispatchService::new(
        StatusStore::new(),
        log_service.clone(),
        Arc::new(transport),
        0,
    );
    (service, log_service, dir)
}
