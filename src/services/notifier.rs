//! SMTP alert delivery.

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Mailboxes};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailConfig;
use crate::error::{AppError, Result};
use crate::types::{AlertLevel, Signal};

/// Subject line for an alert email, e.g. `BTCUSDT LONG (HIGH CONF 75%)`.
pub fn alert_subject(
    symbol: &str,
    direction: crate::types::Direction,
    level: AlertLevel,
    normalized: f64,
) -> String {
    format!(
        "{} {} ({} CONF {:.0}%)",
        symbol,
        direction,
        level,
        normalized * 100.0
    )
}

/// Plain-text body summarizing the signal behind an alert.
pub fn alert_body(signal: &Signal, level: AlertLevel, normalized: f64) -> String {
    format!(
        "Signal: {}\nConfidence: {:.0}%\nLevel: {}\nStructure: {}\n4H Bias: {}\n1H Bias: {}\nPrice: {:.2}\nTime: {}",
        signal.direction,
        normalized * 100.0,
        level,
        signal.breakdown.structure_label(),
        signal.breakdown.htf_bias(),
        signal.breakdown.ltf_bias(),
        signal.price,
        signal.time.format("%Y-%m-%d %H:%M %Z"),
    )
}

/// Sends alert emails over STARTTLS. Addresses are parsed once at startup
/// so a typo in the config fails the process instead of the first alert.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    receivers: Vec<Mailbox>,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|e| AppError::Notify(format!("Invalid sender address: {}", e)))?;
        let mailboxes: Mailboxes = config
            .receiver
            .parse()
            .map_err(|e| AppError::Notify(format!("Invalid receiver address: {}", e)))?;
        let receivers: Vec<Mailbox> = mailboxes.into_iter().collect();
        if receivers.is_empty() {
            return Err(AppError::Notify("No receiver addresses".to_string()));
        }

        let password = config
            .password
            .clone()
            .ok_or_else(|| AppError::Notify("SMTP_PASSWORD is not set".to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(|e| AppError::Notify(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.sender.clone(), password))
            .build();

        Ok(Self {
            transport,
            sender,
            receivers,
        })
    }

    pub async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for mailbox in &self.receivers {
            builder = builder.to(mailbox.clone());
        }
        let email = builder
            .body(body.to_string())
            .map_err(|e| AppError::Notify(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Notify(e.to_string()))?;
        info!(receivers = self.receivers.len(), "Sent alert email: {}", subject);
        Ok(())
    }
}
