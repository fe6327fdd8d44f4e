//! services/smtp_transport.rs
//! Implementación SMTP (STARTTLS + auth) del transporte de correo.

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;

use crate::{
    config::app_config::AppConfig,
    models::dispatch_model::SenderCredentials,
    services::transport_service::{MailConnection, MailTransport, OutgoingEmail, TransportError},
};

#[derive(Debug, Clone)]
pub struct SmtpMailTransport {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SmtpMailTransport {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.smtp_host.clone(), config.smtp_port, config.smtp_timeout)
    }
}

struct SmtpConnection {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    timeout: Duration,
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn connect(
        &self,
        credentials: &SenderCredentials,
    ) -> Result<Box<dyn MailConnection>, TransportError> {
        let from: Mailbox = credentials.email.parse().map_err(|_| {
            TransportError::Authentication(format!("invalid sender address {}", credentials.email))
        })?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| TransportError::ConnectionLost(e.to_string()))?
            .port(self.port)
            .credentials(Credentials::new(
                credentials.email.clone(),
                credentials.password.expose_secret().clone(),
            ))
            .timeout(Some(self.timeout))
            .build();

        // test_connection hace connect + STARTTLS + AUTH, así detectamos
        // credenciales malas antes de tocar al primer destinatario
        match tokio::time::timeout(self.timeout, mailer.test_connection()).await {
            Ok(Ok(true)) => {
                log::info!("SMTP session opened on {}:{} as {}", self.host, self.port, from);
                Ok(Box::new(SmtpConnection {
                    mailer,
                    from,
                    timeout: self.timeout,
                }))
            }
            Ok(Ok(false)) => Err(TransportError::ConnectionLost(format!(
                "relay {} did not accept the connection",
                self.host
            ))),
            Ok(Err(e)) if e.is_permanent() => Err(TransportError::Authentication(e.to_string())),
            Ok(Err(e)) => Err(TransportError::ConnectionLost(e.to_string())),
            Err(_) => Err(TransportError::ConnectionLost(format!(
                "timed out connecting to {}",
                self.host
            ))),
        }
    }
}

#[async_trait]
impl MailConnection for SmtpConnection {
    async fn send(&self, email: &OutgoingEmail<'_>) -> Result<(), TransportError> {
        let message = build_message(&self.from, email)?;

        match tokio::time::timeout(self.timeout, self.mailer.send(message)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) if e.is_timeout() => Err(TransportError::Timeout),
            Ok(Err(e)) if e.is_permanent() || e.is_transient() => {
                Err(TransportError::Rejected(e.to_string()))
            }
            Ok(Err(e)) => Err(TransportError::ConnectionLost(e.to_string())),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse()
        .map_err(|_| TransportError::InvalidAddress(address.to_string()))
}

fn build_message(from: &Mailbox, email: &OutgoingEmail<'_>) -> Result<Message, TransportError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .to(parse_mailbox(email.to)?)
        .subject(email.subject);

    for cc in email.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }
    for bcc in email.bcc {
        builder = builder.bcc(parse_mailbox(bcc)?);
    }

    // texto plano primero, luego HTML
    let alternative =
        MultiPart::alternative_plain_html(email.body.to_string(), format_email_content(email.body));

    let result = if email.attachments.is_empty() {
        builder.multipart(alternative)
    } else {
        let mut mixed = MultiPart::mixed().multipart(alternative);
        for attach in email.attachments {
            let content_type = ContentType::parse(&attach.content_type).map_err(|_| {
                TransportError::Rejected(format!(
                    "invalid content type {:?} for attachment {}",
                    attach.content_type, attach.filename
                ))
            })?;
            mixed = mixed.singlepart(
                Attachment::new(attach.filename.clone()).body(attach.data.clone(), content_type),
            );
        }
        builder.multipart(mixed)
    };

    result.map_err(|e| TransportError::Rejected(format!("could not build message: {e}")))
}

/// Convierte texto plano a HTML respetando el formato tal como se escribió.
pub fn format_email_content(content: &str) -> String {
    let escaped = htmlescape::encode_minimal(content);
    let normalized = escaped.replace("\r\n", "\n").replace('\r', "\n");

    let html = normalized
        .replace('\n', "<br>")
        .replace("  ", "&nbsp;&nbsp;")
        .replace('\t', "&nbsp;&nbsp;&nbsp;&nbsp;");

    format!(
        concat!(
            "<div style=\"font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; ",
            "font-size: 14px; line-height: 1.2; color: #333333; margin: 0; padding: 0;\">",
            "{}</div>"
        ),
        html
    )
}
