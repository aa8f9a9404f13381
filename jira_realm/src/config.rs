//! Configuration of the connection to Jira

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    request::{self, Credentials},
    tls::TrustPolicy,
    Password, Username, UsernameRef,
};

/// Timeout applied when none is configured
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Settings as supplied by an administrator
///
/// Convert into a [`ServiceConfig`] to validate them.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSettings {
    /// Base URL of the Jira instance, including any context path
    pub url: String,
    /// Username of the technical account used for group lookups
    pub technical_user: Username,
    /// Password of the technical account
    pub technical_password: Password,
    /// Timeout for each call to Jira, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Accept any TLS certificate presented by Jira
    #[serde(default)]
    pub insecure_tls: bool,
}

/// The settings do not describe a usable connection to Jira
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL could not be parsed
    #[error("invalid Jira URL")]
    InvalidUrl(#[from] url::ParseError),
    /// The base URL uses a scheme other than `http` or `https`
    #[error("unsupported URL scheme '{0}', expected 'http' or 'https'")]
    UnsupportedScheme(String),
    /// The timeout is zero
    #[error("timeout must be a positive number of milliseconds")]
    ZeroTimeout,
    /// The technical account has no username
    #[error("technical account username must not be empty")]
    MissingTechnicalUser,
    /// The technical account has no password
    #[error("technical account password must not be empty")]
    MissingTechnicalPassword,
}

/// Validated, immutable configuration for a
/// [`JiraAuthenticationService`][crate::JiraAuthenticationService]
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    base_url: Url,
    resource_url: Url,
    technical_user: Username,
    technical_password: Password,
    timeout: Duration,
    trust: TrustPolicy,
}

impl ServiceConfig {
    /// Validates a new configuration
    pub fn new(
        base_url: &str,
        technical_user: Username,
        technical_password: Password,
        timeout: Duration,
        trust: TrustPolicy,
    ) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.scheme().to_owned()));
        }
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if technical_user.as_str().is_empty() {
            return Err(ConfigError::MissingTechnicalUser);
        }
        if technical_password.as_str().is_empty() {
            return Err(ConfigError::MissingTechnicalPassword);
        }

        let resource_url = request::resource_url(&base_url, request::USER_RESOURCE_PATH)?;

        Ok(Self {
            base_url,
            resource_url,
            technical_user,
            technical_password,
            timeout,
            trust,
        })
    }

    /// The base URL of the Jira instance
    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The URL of the user resource
    #[inline]
    pub fn resource_url(&self) -> &Url {
        &self.resource_url
    }

    /// The username of the technical account
    #[inline]
    pub fn technical_user(&self) -> &UsernameRef {
        &self.technical_user
    }

    pub(crate) fn technical_credentials(&self) -> Credentials<'_> {
        Credentials::new(
            self.technical_user.as_str(),
            self.technical_password.as_str(),
        )
    }

    /// The timeout for each call to Jira
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// How certificates presented by Jira are validated
    #[inline]
    pub fn trust_policy(&self) -> TrustPolicy {
        self.trust
    }
}

impl TryFrom<ServiceSettings> for ServiceConfig {
    type Error = ConfigError;

    fn try_from(settings: ServiceSettings) -> Result<Self, Self::Error> {
        Self::new(
            &settings.url,
            settings.technical_user,
            settings.technical_password,
            Duration::from_millis(settings.timeout_ms),
            TrustPolicy::from_insecure_flag(settings.insecure_tls),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> Result<ServiceConfig, ConfigError> {
        ServiceConfig::new(
            url,
            Username::from_static("svc-jira"),
            Password::from_static("s3cret"),
            Duration::from_secs(5),
            TrustPolicy::PlatformDefault,
        )
    }

    #[test]
    fn resolves_resource_url_below_context_path() {
        let config = config("https://example.com/jira").unwrap();
        assert_eq!(
            config.resource_url().as_str(),
            "https://example.com/jira/rest/api/2/user/"
        );
        assert_eq!(config.base_url().as_str(), "https://example.com/jira");
    }

    #[test]
    fn rejects_unparseable_url() {
        assert!(matches!(
            config("not a url").unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(matches!(
            config("ftp://jira.example.com").unwrap_err(),
            ConfigError::UnsupportedScheme(s) if s == "ftp"
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let error = ServiceConfig::new(
            "https://jira.example.com",
            Username::from_static("svc-jira"),
            Password::from_static("s3cret"),
            Duration::ZERO,
            TrustPolicy::PlatformDefault,
        )
        .unwrap_err();

        assert!(matches!(error, ConfigError::ZeroTimeout));
    }

    #[test]
    fn rejects_empty_technical_credentials() {
        let error = ServiceConfig::new(
            "https://jira.example.com",
            Username::from_static(""),
            Password::from_static("s3cret"),
            Duration::from_secs(1),
            TrustPolicy::PlatformDefault,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::MissingTechnicalUser));

        let error = ServiceConfig::new(
            "https://jira.example.com",
            Username::from_static("svc-jira"),
            Password::from_static(""),
            Duration::from_secs(1),
            TrustPolicy::PlatformDefault,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::MissingTechnicalPassword));
    }

    #[test]
    fn debug_output_does_not_reveal_technical_password() {
        let debug = format!("{:?}", config("https://jira.example.com").unwrap());
        assert!(debug.contains("svc-jira"));
        assert!(!debug.contains("s3cret"));
    }

    mod from_settings {
        use super::*;

        #[test]
        fn applies_defaults() {
            let settings: ServiceSettings = serde_json::from_str(
                r#"{
                    "url": "https://jira.example.com",
                    "technical_user": "svc-jira",
                    "technical_password": "s3cret"
                }"#,
            )
            .unwrap();

            let config = ServiceConfig::try_from(settings).unwrap();

            assert_eq!(config.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
            assert_eq!(config.trust_policy(), TrustPolicy::PlatformDefault);
            assert_eq!(config.technical_user().as_str(), "svc-jira");
        }

        #[test]
        fn insecure_flag_selects_trust_all() {
            let settings: ServiceSettings = serde_json::from_str(
                r#"{
                    "url": "https://jira.internal",
                    "technical_user": "svc-jira",
                    "technical_password": "s3cret",
                    "timeout_ms": 2500,
                    "insecure_tls": true
                }"#,
            )
            .unwrap();

            let config = ServiceConfig::try_from(settings).unwrap();

            assert_eq!(config.timeout(), Duration::from_millis(2500));
            assert_eq!(config.trust_policy(), TrustPolicy::TrustAllCertificates);
        }

        #[test]
        fn unknown_fields_are_rejected() {
            let result = serde_json::from_str::<ServiceSettings>(
                r#"{
                    "url": "https://jira.example.com",
                    "technical_user": "svc-jira",
                    "technical_password": "s3cret",
                    "insecure": true
                }"#,
            );

            assert!(result.is_err());
        }
    }
}
