//! Authentication errors and the classification of failed calls

use std::{error::Error as StdError, fmt, time::Duration};

use reqwest::StatusCode;
use thiserror::Error;

use crate::{response::MalformedResponse, transport::TransportError};

/// Longest server response excerpt carried in an error
pub(crate) const MAX_BODY_CHARS: usize = 512;

/// The credentials that were placed on the wire for a call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialSubject {
    /// The end user's own credentials
    EndUser,
    /// The configured technical account's credentials
    TechnicalAccount,
}

impl CredentialSubject {
    /// A stable name for use in diagnostics
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EndUser => "end_user",
            Self::TechnicalAccount => "technical_account",
        }
    }
}

impl fmt::Display for CredentialSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error while authenticating a user or loading their groups
///
/// Only [`InvalidCredentials`][AuthError::InvalidCredentials] means that
/// Jira rejected an identity. Every other variant describes a problem with
/// the input, the local setup, or the remote service, and should not be
/// presented to an end user as a failed login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The caller supplied an empty username or password
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Jira explicitly rejected the credentials on the wire
    #[error("{reason} (HTTP {}): {username}", .status.as_u16())]
    InvalidCredentials {
        /// The username placed on the wire
        username: String,
        /// Whose credentials were placed on the wire
        subject: CredentialSubject,
        /// The status returned by Jira, either 401 or 403
        status: StatusCode,
        /// A short description of the rejection
        reason: &'static str,
    },

    /// Jira could not be reached or used
    #[error(transparent)]
    ServiceUnavailable(#[from] Unavailable),

    /// Jira answered successfully, but the body was unusable
    #[error("malformed response from Jira")]
    MalformedResponse(#[from] MalformedResponse),

    /// The HTTP transport could not be initialized
    #[error("unable to initialize the HTTP transport")]
    Configuration(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

/// The class of an [`AuthError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// See [`AuthError::InvalidInput`]
    InvalidInput,
    /// See [`AuthError::InvalidCredentials`]
    InvalidCredentials,
    /// See [`AuthError::ServiceUnavailable`]
    ServiceUnavailable,
    /// See [`AuthError::MalformedResponse`]
    MalformedResponse,
    /// See [`AuthError::Configuration`]
    Configuration,
}

/// Message shown to end users when a login is rejected
pub const LOGIN_FAILED: &str = "login failed";

/// Message shown to end users for every non-credential failure
pub const SERVICE_UNAVAILABLE: &str = "authentication service unavailable";

impl AuthError {
    /// The class of this error
    pub const fn kind(&self) -> AuthErrorKind {
        match self {
            Self::InvalidInput(_) => AuthErrorKind::InvalidInput,
            Self::InvalidCredentials { .. } => AuthErrorKind::InvalidCredentials,
            Self::ServiceUnavailable(_) => AuthErrorKind::ServiceUnavailable,
            Self::MalformedResponse(_) => AuthErrorKind::MalformedResponse,
            Self::Configuration(_) => AuthErrorKind::Configuration,
        }
    }

    /// Whether Jira explicitly rejected the credentials
    pub const fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials { .. })
    }

    /// The text that may be shown to an end user
    ///
    /// Diagnostic detail stays in logs and in this error's `Display` and
    /// source chain.
    pub const fn user_message(&self) -> &'static str {
        if self.is_invalid_credentials() {
            LOGIN_FAILED
        } else {
            SERVICE_UNAVAILABLE
        }
    }
}

/// Why Jira could not be reached or used
#[derive(Debug, Error)]
pub enum Unavailable {
    /// No response arrived within the configured timeout
    #[error("timeout limit reached while contacting Jira: {}ms", .timeout.as_millis())]
    Timeout {
        /// The configured timeout
        timeout: Duration,
        /// The underlying transport failure
        source: TransportError,
    },

    /// The connection could not be established or was broken
    #[error("unable to contact Jira: {source}")]
    Connection {
        /// The underlying transport failure
        source: TransportError,
    },

    /// Jira returned a non-success status other than 401 or 403
    #[error("response error (HTTP {}): {body}", .status.as_u16())]
    UnexpectedStatus {
        /// The status returned by Jira
        status: StatusCode,
        /// The start of the response body
        body: String,
    },

    /// A failure outside of any known category
    #[error("general error")]
    General {
        /// The underlying failure
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
}

impl Unavailable {
    /// The HTTP status returned by Jira, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Everything that can go wrong between building a request and holding a
/// parsed user
#[derive(Debug)]
pub enum Failure {
    /// The exchange with Jira did not complete
    Transport(TransportError),
    /// Jira answered with a non-success status
    Status {
        /// The returned status
        status: StatusCode,
        /// The returned body text
        body: String,
    },
    /// Jira answered with a success status, but the body was unusable
    Parse(MalformedResponse),
    /// Anything else
    Other(Box<dyn StdError + Send + Sync + 'static>),
}

/// The call a [`Failure`] belongs to
#[derive(Clone, Copy, Debug)]
pub struct FailureContext<'a> {
    username: &'a str,
    subject: CredentialSubject,
    timeout: Duration,
}

impl<'a> FailureContext<'a> {
    /// Describes a call made with `username` on the wire
    pub const fn new(username: &'a str, subject: CredentialSubject, timeout: Duration) -> Self {
        Self {
            username,
            subject,
            timeout,
        }
    }

    /// Maps a failure onto the authentication error taxonomy
    ///
    /// Only a 401 or 403 from Jira yields
    /// [`AuthError::InvalidCredentials`].
    pub fn classify(&self, failure: Failure) -> AuthError {
        match failure {
            Failure::Transport(source @ TransportError::Timeout(_)) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    credentials.subject = %self.subject,
                    "timeout limit reached while contacting Jira"
                );
                Unavailable::Timeout {
                    timeout: self.timeout,
                    source,
                }
                .into()
            }
            Failure::Transport(TransportError::Internal(source)) => self.general(source),
            Failure::Transport(source) => {
                tracing::warn!(
                    error = (&source as &dyn StdError),
                    credentials.subject = %self.subject,
                    "unable to contact Jira"
                );
                Unavailable::Connection { source }.into()
            }
            Failure::Status { status, .. } if status == StatusCode::FORBIDDEN => {
                self.rejected(status, "user does not exist or is forbidden")
            }
            Failure::Status { status, .. } if status == StatusCode::UNAUTHORIZED => {
                self.rejected(status, "user is not authorized")
            }
            Failure::Status { status, body } => {
                let body = truncate(&body, MAX_BODY_CHARS);
                tracing::warn!(
                    response.status = status.as_u16(),
                    response.body = %body,
                    credentials.subject = %self.subject,
                    "unexpected response from Jira"
                );
                Unavailable::UnexpectedStatus { status, body }.into()
            }
            Failure::Parse(error) => {
                tracing::warn!(
                    error = (&error as &dyn StdError),
                    credentials.subject = %self.subject,
                    "the answer from Jira is not a usable user document"
                );
                AuthError::MalformedResponse(error)
            }
            Failure::Other(source) => self.general(source),
        }
    }

    fn rejected(&self, status: StatusCode, reason: &'static str) -> AuthError {
        match self.subject {
            CredentialSubject::EndUser => tracing::info!(
                response.status = status.as_u16(),
                credentials.subject = %self.subject,
                credentials.username = self.username,
                "Jira rejected the user's credentials"
            ),
            CredentialSubject::TechnicalAccount => tracing::warn!(
                response.status = status.as_u16(),
                credentials.subject = %self.subject,
                credentials.username = self.username,
                "Jira rejected the technical account; check the realm configuration"
            ),
        }

        AuthError::InvalidCredentials {
            username: self.username.to_owned(),
            subject: self.subject,
            status,
            reason,
        }
    }

    fn general(&self, source: Box<dyn StdError + Send + Sync + 'static>) -> AuthError {
        tracing::warn!(
            error = (&*source as &dyn StdError),
            credentials.subject = %self.subject,
            "general error while contacting Jira"
        );
        Unavailable::General { source }.into()
    }
}

/// Cuts `text` down to at most `max_chars` characters, marking the cut
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let mut cut = String::with_capacity(idx + '…'.len_utf8());
            cut.push_str(&text[..idx]);
            cut.push('…');
            cut
        }
        None => text.to_owned(),
    }
}
