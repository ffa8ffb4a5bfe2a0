//! SMTP postal service implementation

use std::{fmt, sync::Arc, sync::OnceLock};

use anyhow::Result;
use chrono::Utc;
use lettre::{
    message::{
        header::{ContentType, HeaderName, HeaderValue},
        Mailbox,
    },
    transport::smtp::authentication::Credentials,
    Message,
};
use tracing::{debug, info, warn};

use crate::domain::mail::{Charset, Email, PostalService};

use super::{SmtpClient, SmtpConfig};

/// The protocol used to reach the SMTP server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    /// Plain SMTP
    Smtp,

    /// SMTP over implicit TLS
    Smtps,
}

impl Protocol {
    /// The protocol identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smtp => "smtp",
            Self::Smtps => "smtps",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection properties captured from the configuration on first use
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmtpSession {
    host: String,
    port: Option<u16>,
    auth_required: bool,
    protocol: Protocol,
}

impl SmtpSession {
    /// The SMTP host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The SMTP port, if overridden
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether connections authenticate
    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    /// The protocol connections use
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

impl From<&SmtpConfig> for SmtpSession {
    fn from(config: &SmtpConfig) -> Self {
        Self {
            host: config.host().to_string(),
            port: config.port(),
            auth_required: config.auth_required(),
            protocol: protocol_for(config),
        }
    }
}

fn protocol_for(config: &SmtpConfig) -> Protocol {
    if config.use_secure_smtp() {
        Protocol::Smtps
    } else {
        Protocol::Smtp
    }
}

/// Postal service that delivers emails over SMTP.
///
/// The [`SmtpSession`] is created from the configuration on the first send
/// and reused by every later send through the same service. To pick up a new
/// configuration, build a new service.
#[derive(Debug)]
pub struct SmtpPostalService<C>
where
    C: SmtpClient,
{
    config: SmtpConfig,
    client: Arc<C>,
    session: OnceLock<SmtpSession>,
}

impl<C> SmtpPostalService<C>
where
    C: SmtpClient,
{
    /// Create a new SMTP postal service
    pub fn new(config: SmtpConfig, client: Arc<C>) -> Self {
        Self {
            config,
            client,
            session: OnceLock::new(),
        }
    }

    /// The configuration this service was built with
    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    /// The protocol selected by the configuration
    pub fn protocol(&self) -> Protocol {
        protocol_for(&self.config)
    }

    /// Returns the session, creating it on first use.
    pub fn session(&self) -> &SmtpSession {
        self.session.get_or_init(|| {
            let session = SmtpSession::from(&self.config);
            debug!(host = session.host(), protocol = %session.protocol(), "created SMTP session");
            session
        })
    }

    /// Builds the outbound message for `email`.
    ///
    /// # Returns
    /// An [`Err`] if an address cannot be parsed, the charset is unsupported
    /// or cannot represent the subject or body, or a header name is invalid.
    pub fn create_message(&self, email: &Email) -> Result<Message> {
        let charset: Charset = email.charset().parse()?;

        let mut builder = Message::builder()
            .from(email.from_address().parse::<Mailbox>()?)
            .date(Utc::now().into());

        for to in email.to_addresses() {
            builder = builder.to(to.parse::<Mailbox>()?);
        }

        for cc in email.cc_addresses() {
            builder = builder.cc(cc.parse::<Mailbox>()?);
        }

        for bcc in email.bcc_addresses() {
            builder = builder.bcc(bcc.parse::<Mailbox>()?);
        }

        builder = builder
            .raw_header(HeaderValue::dangerous_new_pre_encoded(
                HeaderName::new_from_ascii_str("Subject"),
                email.subject().to_string(),
                charset.encode_words(email.subject())?,
            ))
            .header(ContentType::parse(&format!(
                "text/plain; charset={}",
                charset.name()
            ))?);

        for (name, value) in email.headers() {
            builder = builder.raw_header(HeaderValue::new(
                HeaderName::new_from_ascii(name.clone())?,
                value.clone(),
            ));
        }

        let message = match charset {
            Charset::Utf8 => builder.body(email.body().to_string())?,
            _ => builder.body(charset.encode(email.body())?)?,
        };

        Ok(message)
    }

    fn deliver(&self, email: &Email) -> Result<()> {
        let message = self.create_message(email)?;
        let session = self.session();

        let credentials = session.auth_required().then(|| {
            Credentials::new(
                self.config.username().to_string(),
                self.config.password().to_string(),
            )
        });

        let mut connection = self.client.connect(session, credentials)?;

        connection.send_message(&message)?;
        connection.close()?;

        Ok(())
    }
}

impl<C> PostalService for SmtpPostalService<C>
where
    C: SmtpClient,
{
    fn send(&self, email: &Email) -> Result<()> {
        match self.deliver(email) {
            Ok(()) => {
                info!(
                    from = email.from_address(),
                    recipients = email.to_addresses().len()
                        + email.cc_addresses().len()
                        + email.bcc_addresses().len(),
                    "email sent"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "email could not be sent");
                Err(e)
            }
        }
    }
}
