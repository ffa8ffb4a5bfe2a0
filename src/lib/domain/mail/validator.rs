//! Email address validation

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

#[cfg(test)]
use mockall::mock;

lazy_static! {
    // dot-atom local part, hostname labels; a subset of what lettre's `Mailbox` parses
    static ref EMAIL_REGEX: Regex = Regex::new(concat!(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
        r"@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?",
        r"(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    ))
    .expect("email regex is valid");
}

/// Checks the syntax of a single email address
pub trait AddressValidator: Send + Sync + 'static {
    /// Returns `true` if `address` is acceptable as a sender or recipient.
    fn validate(&self, address: &str) -> bool;
}

#[cfg(test)]
mock! {
    pub AddressValidator {}

    impl AddressValidator for AddressValidator {
        fn validate(&self, address: &str) -> bool;
    }
}

/// Validates addresses against a `local@domain.tld` pattern
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexAddressValidator;

impl AddressValidator for RegexAddressValidator {
    fn validate(&self, address: &str) -> bool {
        EMAIL_REGEX.is_match(address)
    }
}

/// Validates addresses with lettre's RFC 5321 address parser
#[derive(Debug, Default, Clone, Copy)]
pub struct LettreAddressValidator;

impl AddressValidator for LettreAddressValidator {
    fn validate(&self, address: &str) -> bool {
        lettre::Address::from_str(address).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_validator_accepts_plain_address() {
        assert!(RegexAddressValidator.validate("email@example.com"));
        assert!(RegexAddressValidator.validate("first.last+tag@mail.example.co.uk"));
    }

    #[test]
    fn test_regex_validator_rejects_malformed_addresses() {
        assert!(!RegexAddressValidator.validate(""));
        assert!(!RegexAddressValidator.validate("email"));
        assert!(!RegexAddressValidator.validate("email@example"));
        assert!(!RegexAddressValidator.validate("em ail@example.com"));
        assert!(!RegexAddressValidator.validate("a@b@example.com"));
    }

    #[test]
    fn test_regex_validator_rejects_what_lettre_cannot_parse() {
        for address in ["a(b)@x.com", "a@b..com", "a,b@x.com", "<a>@x.com", "a@x.com."] {
            assert!(!RegexAddressValidator.validate(address), "{address}");
            assert!(!LettreAddressValidator.validate(address), "{address}");
        }
    }

    #[test]
    fn test_regex_accepted_addresses_parse_as_mailboxes() {
        for address in [
            "email@example.com",
            "first.last+tag@mail.example.co.uk",
            "o'brien@example.ie",
            "x_y-z@sub-domain.example.org",
        ] {
            assert!(RegexAddressValidator.validate(address), "{address}");
            assert!(address.parse::<lettre::message::Mailbox>().is_ok(), "{address}");
        }
    }

    #[test]
    fn test_lettre_validator() {
        assert!(LettreAddressValidator.validate("email@example.com"));
        assert!(!LettreAddressValidator.validate("email"));
        assert!(!LettreAddressValidator.validate("@example.com"));
    }
}
