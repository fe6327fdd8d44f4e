//! services/session_log_service.rs
//! Historial durable de sesiones de envío (escritura al terminar, lectura para el visor).

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::models::{
    session_log_model::{
        ListSessionLogsResponse, SessionLogSummary, SessionRecord, StoredSessionRecord,
    },
    status_model::{FailedEmail, SessionState},
};

#[derive(Clone, Debug)]
pub struct SessionLogService {
    db_pool: Pool<Sqlite>,
    max_page_size: u64,
}

#[derive(sqlx::FromRow)]
struct SessionLogRow {
    id: String,
    session_id: String,
    created_at: String,
    sender_email: String,
    duration_seconds: f64,
    subject: String,
    total_emails: i64,
    sent_count: i64,
    failed_count: i64,
    filename: String,
    outcome: String,
    abort_reason: Option<String>,
    cc_emails: String,
    bcc_emails: String,
    attachment_names: String,
}

#[derive(sqlx::FromRow)]
struct RecipientResultRow {
    status: String,
    recipient_email: String,
    error_message: Option<String>,
}

const SUMMARY_COLUMNS: &str = r#"
    id, session_id, created_at, sender_email, duration_seconds, subject,
    total_emails, sent_count, failed_count, filename, outcome, abort_reason,
    cc_emails, bcc_emails, attachment_names
"#;

impl SessionLogService {
    pub fn new(db_pool: Pool<Sqlite>, max_page_size: u64) -> Self {
        SessionLogService {
            db_pool,
            max_page_size: max_page_size.max(1),
        }
    }

    /// Abre (o crea) la base SQLite en `path`.
    pub async fn connect(path: &Path) -> Result<Pool<Sqlite>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("No se pudo crear directorio {:?}", parent))?;
        }

        log::info!("Conectando a SQLite en {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("No se pudo conectar a la base SQLite {}", path.display()))
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Failed to run session log migrations")?;
        Ok(())
    }

    /// Guarda un registro completo en una sola transacción y devuelve su id.
    pub async fn commit(&self, record: &SessionRecord) -> Result<String> {
        let log_id = Uuid::new_v4().to_string();

        let mut tx = self
            .db_pool
            .begin()
            .await
            .context("Fallo al abrir transacción de log")?;

        sqlx::query(
            r#"
            INSERT INTO session_logs (
                id, session_id, created_at, sender_email, duration_seconds, subject,
                total_emails, sent_count, failed_count, filename, outcome, abort_reason,
                cc_emails, bcc_emails, attachment_names
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&log_id)
        .bind(&record.session_id)
        .bind(&record.timestamp)
        .bind(&record.sender_email)
        .bind(record.duration_seconds)
        .bind(&record.subject)
        .bind(record.total_emails as i64)
        .bind(record.sent_count as i64)
        .bind(record.failed_count as i64)
        .bind(&record.filename)
        .bind(record.outcome.as_str())
        .bind(record.abort_reason.as_deref())
        .bind(serde_json::to_string(&record.cc_emails)?)
        .bind(serde_json::to_string(&record.bcc_emails)?)
        .bind(serde_json::to_string(&record.attachment_names)?)
        .execute(&mut *tx)
        .await
        .context("Fallo al insertar session_log")?;

        for (position, email) in record.success_emails.iter().enumerate() {
            insert_result(&mut tx, &log_id, "success", position, email, None).await?;
        }
        for (position, failed) in record.failed_emails.iter().enumerate() {
            insert_result(
                &mut tx,
                &log_id,
                "failed",
                position,
                &failed.address,
                Some(&failed.error),
            )
            .await?;
        }

        tx.commit()
            .await
            .context("Fallo al confirmar transacción de log")?;

        log::info!(
            "Saved session log {} (session {}, {} sent, {} failed)",
            log_id,
            record.session_id,
            record.sent_count,
            record.failed_count
        );
        Ok(log_id)
    }

    /// Lista logs del más reciente al más antiguo, con paginación
    pub async fn list_logs(&self, page: u64, page_size: u64) -> Result<ListSessionLogsResponse> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, self.max_page_size);
        let limit = i64::try_from(page_size).context("page_size fuera de rango")?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM session_logs")
            .fetch_one(&self.db_pool)
            .await
            .context("Fallo al contar session_logs")?;

        // Un offset que no cabe en i64 queda más allá de cualquier tabla: página vacía
        let offset = (page - 1)
            .checked_mul(page_size)
            .and_then(|offset| i64::try_from(offset).ok());

        let rows: Vec<SessionLogRow> = match offset {
            Some(offset) if offset < total => {
                let sql = format!(
                    "SELECT {SUMMARY_COLUMNS} FROM session_logs
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT ?1 OFFSET ?2"
                );
                sqlx::query_as(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.db_pool)
                    .await
                    .context("Fallo al listar session_logs")?
            }
            _ => Vec::new(),
        };

        Ok(ListSessionLogsResponse {
            total: total as u64,
            page,
            page_size,
            items: rows.into_iter().map(SessionLogSummary::from).collect(),
        })
    }

    /// Detalle completo, con todas las direcciones enviadas y fallidas.
    pub async fn get_log(&self, log_id: &str) -> Result<Option<StoredSessionRecord>> {
        let sql = format!("SELECT {SUMMARY_COLUMNS} FROM session_logs WHERE id = ?1");
        let Some(row) = sqlx::query_as::<_, SessionLogRow>(&sql)
            .bind(log_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Fallo al buscar session_log")?
        else {
            return Ok(None);
        };

        let results: Vec<RecipientResultRow> = sqlx::query_as(
            r#"
            SELECT status, recipient_email, error_message
            FROM recipient_results
            WHERE log_id = ?1
            ORDER BY status, position
            "#,
        )
        .bind(log_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al leer recipient_results")?;

        let mut success_emails = Vec::new();
        let mut failed_emails = Vec::new();
        for r in results {
            match r.status.as_str() {
                "success" => success_emails.push(r.recipient_email),
                _ => failed_emails.push(FailedEmail::new(
                    r.recipient_email,
                    r.error_message.unwrap_or_default(),
                )),
            }
        }

        Ok(Some(StoredSessionRecord {
            record: SessionRecord {
                session_id: row.session_id,
                timestamp: row.created_at,
                sender_email: row.sender_email,
                duration_seconds: row.duration_seconds,
                subject: row.subject,
                total_emails: row.total_emails as usize,
                sent_count: row.sent_count as usize,
                failed_count: row.failed_count as usize,
                success_emails,
                failed_emails,
                filename: row.filename,
                outcome: parse_outcome(&row.outcome)?,
                abort_reason: row.abort_reason,
                cc_emails: serde_json::from_str(&row.cc_emails)?,
                bcc_emails: serde_json::from_str(&row.bcc_emails)?,
                attachment_names: serde_json::from_str(&row.attachment_names)?,
            },
            id: row.id,
        }))
    }
}

async fn insert_result(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    log_id: &str,
    status: &str,
    position: usize,
    email: &str,
    error: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipient_results (log_id, status, position, recipient_email, error_message)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(log_id)
    .bind(status)
    .bind(position as i64)
    .bind(email)
    .bind(error)
    .execute(&mut **tx)
    .await
    .context("Fallo al insertar recipient_result")?;
    Ok(())
}

fn parse_outcome(raw: &str) -> Result<SessionState> {
    match raw {
        "completed" => Ok(SessionState::Completed),
        "aborted" => Ok(SessionState::Aborted),
        other => Err(anyhow!("Outcome desconocido en session_logs: {other}")),
    }
}

impl From<SessionLogRow> for SessionLogSummary {
    fn from(r: SessionLogRow) -> Self {
        SessionLogSummary {
            id: r.id,
            session_id: r.session_id,
            timestamp: r.created_at,
            sender_email: r.sender_email,
            duration_seconds: r.duration_seconds,
            subject: r.subject,
            total_emails: r.total_emails as usize,
            sent_count: r.sent_count as usize,
            failed_count: r.failed_count as usize,
            filename: r.filename,
            outcome: r.outcome,
            abort_reason: r.abort_reason,
        }
    }
}
