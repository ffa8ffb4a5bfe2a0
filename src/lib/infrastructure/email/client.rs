//! Low-level SMTP client backed by lettre

use anyhow::Result;
use lettre::{transport::smtp::authentication::Credentials, Message, SmtpTransport, Transport};
use tracing::debug;

#[cfg(test)]
use mockall::mock;

use super::{Protocol, SmtpSession};

/// Opens connections to an SMTP server
pub trait SmtpClient: Send + Sync + 'static {
    /// Connect to the server described by `session`.
    ///
    /// # Arguments
    /// * `session` - The [`SmtpSession`] holding the host, port and protocol.
    /// * `credentials` - Credentials to authenticate with, if any.
    fn connect(
        &self,
        session: &SmtpSession,
        credentials: Option<Credentials>,
    ) -> Result<Box<dyn SmtpConnection>>;
}

/// A single open connection
pub trait SmtpConnection: Send {
    /// Transmit `message` to every recipient in its envelope
    fn send_message(&mut self, message: &Message) -> Result<()>;

    /// Close the connection
    fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mock! {
    pub SmtpClient {}

    impl SmtpClient for SmtpClient {
        fn connect(
            &self,
            session: &SmtpSession,
            credentials: Option<Credentials>,
        ) -> Result<Box<dyn SmtpConnection>>;
    }
}

#[cfg(test)]
mock! {
    pub SmtpConnection {}

    impl SmtpConnection for SmtpConnection {
        fn send_message(&mut self, message: &Message) -> Result<()>;
        fn close(&mut self) -> Result<()>;
    }
}

/// [`SmtpClient`] that delivers through [`SmtpTransport`].
///
/// `connect` only validates the session and builds the transport; no network
/// traffic happens until the message is sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct LettreSmtpClient;

impl SmtpClient for LettreSmtpClient {
    fn connect(
        &self,
        session: &SmtpSession,
        credentials: Option<Credentials>,
    ) -> Result<Box<dyn SmtpConnection>> {
        let mut builder = match session.protocol() {
            Protocol::Smtps => SmtpTransport::relay(session.host())?,
            Protocol::Smtp => SmtpTransport::builder_dangerous(session.host()),
        };

        if let Some(port) = session.port() {
            builder = builder.port(port);
        }

        if let Some(credentials) = credentials {
            builder = builder.credentials(credentials);
        }

        debug!(host = session.host(), protocol = %session.protocol(), "opening SMTP transport");

        Ok(Box::new(LettreConnection {
            transport: builder.build(),
        }))
    }
}

/// A configured [`SmtpTransport`].
///
/// Without the `pool` feature lettre opens the TCP connection, runs TLS,
/// `EHLO` and `AUTH`, transmits and sends `QUIT` all inside one `send` call.
/// Connection refused, handshake and authentication failures are therefore
/// returned by [`SmtpConnection::send_message`], and closing has nothing left
/// to release.
struct LettreConnection {
    transport: SmtpTransport,
}

impl SmtpConnection for LettreConnection {
    fn send_message(&mut self, message: &Message) -> Result<()> {
        let response = self.transport.send(message)?;

        debug!(code = %response.code(), "message accepted");

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
