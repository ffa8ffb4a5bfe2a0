//! Email message builder

use std::{
    collections::{BTreeMap, BTreeSet},
    env,
    sync::Arc,
};

use tracing::debug;

use super::{AddressValidator, Charset, PostalService, SendEmailError};

/// Returns the host's default text encoding, taken from the locale.
///
/// `LC_ALL`, `LC_CTYPE` and `LANG` are checked in that order. The codeset is
/// the part after the `.` with any `@modifier` removed, so `de_DE.ISO-8859-1`
/// gives `ISO-8859-1`. The canonical [`Charset`] name is returned; a codeset
/// that is not a supported [`Charset`] falls back to `UTF-8`.
pub fn default_charset() -> String {
    charset_from_locale(|var| env::var(var).ok())
}

fn charset_from_locale(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|var| lookup(var))
        .find(|value| !value.is_empty())
        .and_then(|locale| codeset(&locale))
        .unwrap_or(Charset::Utf8)
        .name()
        .to_string()
}

fn codeset(locale: &str) -> Option<Charset> {
    let (_, rest) = locale.split_once('.')?;
    let codeset = rest.split('@').next().unwrap_or_default();

    match codeset.parse() {
        Ok(charset) => Some(charset),
        Err(_) => {
            debug!(codeset, "unsupported locale codeset");
            None
        }
    }
}

/// A validated, read-only email handed to a [`PostalService`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    from: String,
    to: BTreeSet<String>,
    cc: BTreeSet<String>,
    bcc: BTreeSet<String>,
    subject: String,
    body: String,
    charset: String,
    headers: BTreeMap<String, String>,
}

impl Email {
    /// The sender address
    pub fn from_address(&self) -> &str {
        &self.from
    }

    /// The `To` recipients
    pub fn to_addresses(&self) -> &BTreeSet<String> {
        &self.to
    }

    /// The `Cc` recipients
    pub fn cc_addresses(&self) -> &BTreeSet<String> {
        &self.cc
    }

    /// The `Bcc` recipients
    pub fn bcc_addresses(&self) -> &BTreeSet<String> {
        &self.bcc
    }

    /// The subject line
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The plain text body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The charset used to encode the subject and body
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Extra headers, keyed by their literal name
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// Fluent builder for an email.
///
/// Every setter consumes and returns the builder so calls can be chained.
/// [`EmailMessage::send`] validates the draft and hands a snapshot of it to
/// the postal service; the draft itself is never modified by sending.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use fluent_mail::domain::mail::{EmailMessage, PostalService, RegexAddressValidator};
/// # fn demo(postal: Arc<impl PostalService>) -> Result<(), Box<dyn std::error::Error>> {
/// EmailMessage::new(Arc::new(RegexAddressValidator), postal)
///     .from("sender@example.com")
///     .to(["one@example.com", "two@example.com"])
///     .with_subject("Hello")
///     .with_body("Hi there")
///     .send()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EmailMessage<V, P>
where
    V: AddressValidator,
    P: PostalService,
{
    validator: Arc<V>,
    postal_service: Arc<P>,
    from: Option<String>,
    to: BTreeSet<String>,
    cc: BTreeSet<String>,
    bcc: BTreeSet<String>,
    subject: Option<String>,
    body: Option<String>,
    charset: String,
    headers: BTreeMap<String, String>,
}

impl<V, P> EmailMessage<V, P>
where
    V: AddressValidator,
    P: PostalService,
{
    /// Creates an empty message using the host's [`default_charset`].
    pub fn new(validator: Arc<V>, postal_service: Arc<P>) -> Self {
        Self {
            validator,
            postal_service,
            from: None,
            to: BTreeSet::new(),
            cc: BTreeSet::new(),
            bcc: BTreeSet::new(),
            subject: None,
            body: None,
            charset: default_charset(),
            headers: BTreeMap::new(),
        }
    }

    /// Sets the sender
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Adds `To` recipients
    pub fn to<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Adds `Cc` recipients
    pub fn cc<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cc.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Adds `Bcc` recipients
    pub fn bcc<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bcc.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Sets the subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Overrides the charset
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Adds a header, replacing any previous value with the same name
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The sender, if set
    pub fn from_address(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// The `To` recipients
    pub fn to_addresses(&self) -> &BTreeSet<String> {
        &self.to
    }

    /// The `Cc` recipients
    pub fn cc_addresses(&self) -> &BTreeSet<String> {
        &self.cc
    }

    /// The `Bcc` recipients
    pub fn bcc_addresses(&self) -> &BTreeSet<String> {
        &self.bcc
    }

    /// The subject, if set
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The body, if set
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The charset
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// The extra headers
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Runs the completeness and address checks and returns the [`Email`]
    /// that would be sent.
    ///
    /// # Returns
    /// - [`Ok`] with the validated [`Email`].
    /// - [`Err`] with [`SendEmailError::IncompleteEmail`] for the first missing field, or
    ///   [`SendEmailError::InvalidEmailAddress`] for the first rejected address.
    pub fn validate(&self) -> Result<Email, SendEmailError> {
        let email = self.required_info()?;
        self.validate_addresses(&email)?;

        Ok(email)
    }

    /// Validates the message and sends it through the postal service.
    ///
    /// Errors from the postal service are wrapped in
    /// [`SendEmailError::TransportError`] with the original error as its source.
    pub fn send(&self) -> Result<(), SendEmailError> {
        let email = self.validate()?;

        self.postal_service
            .send(&email)
            .map_err(SendEmailError::transport)
    }

    fn required_info(&self) -> Result<Email, SendEmailError> {
        let incomplete = |reason: &str| {
            debug!(reason, "incomplete email");
            SendEmailError::IncompleteEmail(reason.to_string())
        };

        let from = self
            .from
            .clone()
            .ok_or_else(|| incomplete("From address is missing"))?;

        if self.to.is_empty() {
            return Err(incomplete("Email should have at least one to address"));
        }

        let subject = self
            .subject
            .clone()
            .ok_or_else(|| incomplete("Subject is missing"))?;

        let body = self
            .body
            .clone()
            .ok_or_else(|| incomplete("Body is missing"))?;

        Ok(Email {
            from,
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            subject,
            body,
            charset: self.charset.clone(),
            headers: self.headers.clone(),
        })
    }

    // cc and bcc are not checked
    fn validate_addresses(&self, email: &Email) -> Result<(), SendEmailError> {
        if !self.validator.validate(&email.from) {
            debug!(address = %email.from, "invalid sender address");
            return Err(SendEmailError::InvalidEmailAddress(format!(
                "From: {}",
                email.from
            )));
        }

        if let Some(invalid) = email.to.iter().find(|to| !self.validator.validate(to)) {
            debug!(address = %invalid, "invalid recipient address");
            return Err(SendEmailError::InvalidEmailAddress(format!(
                "To: {}",
                invalid
            )));
        }

        Ok(())
    }
}
