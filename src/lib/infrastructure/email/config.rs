//! SMTP transport configuration

use clap::Parser;

/// SMTP configuration
#[derive(Clone, Default, Debug, PartialEq, Eq, Parser)]
pub struct SmtpConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST")]
    host: String,

    /// The SMTP port, if not the protocol's default
    #[clap(long = "smtp-port", env = "SMTP_PORT")]
    port: Option<u16>,

    /// Authenticate with the username and password
    #[clap(long = "smtp-auth", env = "SMTP_AUTH")]
    auth_required: bool,

    /// Use SMTPS (implicit TLS) instead of plain SMTP
    #[clap(long = "smtp-secure", env = "SMTP_SECURE")]
    use_secure_smtp: bool,

    /// The SMTP username
    #[clap(long = "smtp-user", env = "SMTP_USER", default_value = "")]
    username: String,

    /// The SMTP password
    #[clap(
        long = "smtp-password",
        env = "SMTP_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    password: String,
}

impl SmtpConfig {
    /// Create a new SMTP configuration
    pub fn new(
        host: impl Into<String>,
        auth_required: bool,
        use_secure_smtp: bool,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            auth_required,
            use_secure_smtp,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Use a non-default port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// The SMTP host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The SMTP port, if overridden
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether the server requires authentication
    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    /// Whether to use SMTPS
    pub fn use_secure_smtp(&self) -> bool {
        self.use_secure_smtp
    }

    /// The SMTP username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The SMTP password
    pub fn password(&self) -> &str {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_new_config() {
        let config = SmtpConfig::new("smtp.server.com", true, false, "john", "doe");

        assert_eq!(config.host(), "smtp.server.com");
        assert_eq!(config.port(), None);
        assert!(config.auth_required());
        assert!(!config.use_secure_smtp());
        assert_eq!(config.username(), "john");
        assert_eq!(config.password(), "doe");
    }

    #[test]
    fn test_parse_from_args() -> TestResult {
        let config = SmtpConfig::try_parse_from([
            "sendmail",
            "--smtp-host",
            "smtp.server.com",
            "--smtp-port",
            "2525",
            "--smtp-auth",
            "--smtp-secure",
            "--smtp-user",
            "john",
            "--smtp-password",
            "doe",
        ])?;

        assert_eq!(
            config,
            SmtpConfig::new("smtp.server.com", true, true, "john", "doe").with_port(2525)
        );

        Ok(())
    }
}
