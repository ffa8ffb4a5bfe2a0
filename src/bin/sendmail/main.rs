#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Sends a single email from the command line

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use fluent_mail::{
    domain::mail::{EmailMessage, RegexAddressValidator},
    infrastructure::email::{LettreSmtpClient, SmtpConfig, SmtpPostalService},
};
use tracing::debug;

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The SMTP configuration
    #[clap(flatten)]
    pub smtp: SmtpConfig,

    /// The sender address
    #[arg(long)]
    pub from: String,

    /// A `To` recipient (repeatable)
    #[arg(long, required = true)]
    pub to: Vec<String>,

    /// A `Cc` recipient (repeatable)
    #[arg(long)]
    pub cc: Vec<String>,

    /// A `Bcc` recipient (repeatable)
    #[arg(long)]
    pub bcc: Vec<String>,

    /// The subject
    #[arg(long)]
    pub subject: String,

    /// The plain text body
    #[arg(long)]
    pub body: String,

    /// The charset, defaults to the locale's
    #[arg(long)]
    pub charset: Option<String>,

    /// An extra header as `Name: value` (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("expected `Name: value`, got \"{}\"", raw))?;

    Ok((name.trim().to_string(), value.trim().to_string()))
}

#[mutants::skip]
fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load environment: {}", e);

            return Err(e.into());
        }
    }

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    debug!(host = args.smtp.host(), "sending email");

    let postal_service = SmtpPostalService::new(args.smtp, Arc::new(LettreSmtpClient));

    let mut message = EmailMessage::new(Arc::new(RegexAddressValidator), Arc::new(postal_service))
        .from(args.from)
        .to(args.to)
        .cc(args.cc)
        .bcc(args.bcc)
        .with_subject(args.subject)
        .with_body(args.body);

    if let Some(charset) = args.charset {
        message = message.with_charset(charset);
    }

    for (name, value) in args.headers {
        message = message.add_header(name, value);
    }

    message.send()?;

    Ok(())
}
