//! Email construction, validation and hand-off to a postal service.

mod charset;
mod errors;
mod message;
mod postal_service;
mod validator;

pub use charset::{Charset, CharsetError};
pub use errors::SendEmailError;
pub use message::{default_charset, Email, EmailMessage};
pub use postal_service::PostalService;
pub use validator::{AddressValidator, LettreAddressValidator, RegexAddressValidator};
