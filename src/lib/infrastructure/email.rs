//! SMTP delivery of validated emails

pub mod client;
pub mod config;
pub mod smtp;

pub use client::{LettreSmtpClient, SmtpClient, SmtpConnection};
pub use config::SmtpConfig;
pub use smtp::{Protocol, SmtpPostalService, SmtpSession};
