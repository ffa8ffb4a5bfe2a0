//! Postal service module

use anyhow::Result;

#[cfg(test)]
use mockall::mock;

use super::Email;

/// Delivers validated emails
pub trait PostalService: Send + Sync + 'static {
    /// Send an email
    ///
    /// # Arguments
    /// * `email` - The validated [`Email`] to deliver.
    ///
    /// # Returns
    /// A [`Result`] which is [`Ok`] once the message has been handed to the
    /// server, or an [`Err`] describing why building or delivering it failed.
    fn send(&self, email: &Email) -> Result<()>;
}

#[cfg(test)]
mock! {
    pub PostalService {}

    impl PostalService for PostalService {
        fn send(&self, email: &Email) -> Result<()>;
    }
}
