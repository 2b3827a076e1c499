use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::debug;

use crate::alerter::{Config, EmailConfig};
use crate::errors::{AlerterError, Result};

/// A delivery backend for one alert destination.
pub trait Sender: Send {
    fn send(&self, subject: &str, message: &str) -> Result<()>;
}

/// Instantiate the sender for a transport name.
pub(crate) fn sender_for(
    transport: &str,
    endpoint: &str,
    config: &Config,
) -> Result<Box<dyn Sender>> {
    match transport {
        "http" => Ok(Box::new(HttpSender::new(endpoint))),
        "smtp" => Ok(Box::new(SmtpSender::new(endpoint, config.email.clone()))),
        other => Err(AlerterError::UnknownTransport(other.to_string())),
    }
}

/// POSTs alerts as a JSON body. The payload shape matches what incoming
/// webhooks (e.g. Slack) expect.
pub struct HttpSender {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSender {
    pub fn new(url: impl Into<String>) -> Self {
        HttpSender {
            url: url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Sender for HttpSender {
    fn send(&self, subject: &str, message: &str) -> Result<()> {
        debug!(url = %self.url, "sending http alert");
        let payload = serde_json::json!({ "text": format!("{subject}\n{message}") });
        let response = self.client.post(self.url.as_str()).json(&payload).send()?;
        if !response.status().is_success() {
            return Err(AlerterError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Sends alerts as email through the configured SMTP relay.
pub struct SmtpSender {
    email: String,
    config: EmailConfig,
}

impl SmtpSender {
    pub fn new(email: impl Into<String>, config: EmailConfig) -> Self {
        SmtpSender {
            email: email.into(),
            config,
        }
    }
}

impl Sender for SmtpSender {
    fn send(&self, subject: &str, message: &str) -> Result<()> {
        debug!(to = %self.email, "sending smtp alert");
        let from: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email).parse()?;
        let to: Mailbox = self.email.parse()?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(message.to_string())?;

        let credentials = Credentials::new(
            self.config.smtp_user.clone(),
            self.config.smtp_password.clone(),
        );
        let mailer = SmtpTransport::builder_dangerous(self.config.smtp_host.as_str())
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build();

        mailer.send(&email)?;
        Ok(())
    }
}
