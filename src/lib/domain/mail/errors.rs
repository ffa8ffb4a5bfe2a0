//! Error types for sending an email

use thiserror::Error;

/// Errors that can occur when sending an [`EmailMessage`](super::EmailMessage)
#[derive(Debug, Error)]
pub enum SendEmailError {
    /// A required field is missing
    #[error("incomplete email: {0}")]
    IncompleteEmail(String),

    /// The sender or one of the `to` recipients is not a valid address
    #[error("invalid email address: {0}")]
    InvalidEmailAddress(String),

    /// The postal service failed to build or deliver the message
    #[error("{message}")]
    TransportError {
        /// Description of the failure
        message: String,

        /// The error raised by the postal service
        #[source]
        source: anyhow::Error,
    },
}

impl SendEmailError {
    pub(crate) fn transport(source: anyhow::Error) -> Self {
        SendEmailError::TransportError {
            message: format!("Email could not be sent: {:#}", source),
            source,
        }
    }
}
