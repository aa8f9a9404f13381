//! Authentication and group lookup against Jira

use crate::{
    config::ServiceConfig,
    error::{CredentialSubject, Failure, FailureContext, MAX_BODY_CHARS},
    request::{self, Credentials, QueryParameters},
    response::{self, UserGroups},
    tls,
    transport::{ReqwestTransport, Transport},
    AuthError,
};

/// Validates credentials and looks up group memberships using Jira as the
/// source of truth
///
/// Each call is a single request with no retries. Calls share nothing but
/// the immutable configuration and the transport, so a service may be used
/// from many tasks at once.
#[derive(Debug)]
pub struct JiraAuthenticationService<T = ReqwestTransport> {
    config: ServiceConfig,
    transport: T,
}

impl JiraAuthenticationService<ReqwestTransport> {
    /// Constructs a new service using an HTTP transport built according to
    /// the configured trust policy
    pub fn new(config: ServiceConfig) -> Result<Self, AuthError> {
        let transport = tls::build_transport(config.trust_policy(), config.timeout())?;
        Ok(Self { config, transport })
    }
}

impl<T: Transport> JiraAuthenticationService<T> {
    /// Constructs a new service using a custom transport
    pub fn with_transport(config: ServiceConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// The service's configuration
    #[inline]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Authenticates a user with their own credentials
    ///
    /// Jira decides whether the credentials are valid. A rejection is
    /// reported as [`AuthError::InvalidCredentials`]. The returned user does
    /// not include group memberships; use
    /// [`load_groups_for_user()`][Self::load_groups_for_user()] for those.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserGroups, AuthError> {
        if username.is_empty() {
            return Err(AuthError::InvalidInput("no username provided"));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("no password provided"));
        }

        let params = QueryParameters::for_user(username);
        self.call_service(
            Credentials::new(username, password),
            CredentialSubject::EndUser,
            &params,
        )
        .await
    }

    /// Loads a user's group memberships using the technical account
    ///
    /// The user's own password is neither needed nor sent. A rejection
    /// here points to a misconfigured technical account.
    pub async fn load_groups_for_user(&self, username: &str) -> Result<UserGroups, AuthError> {
        if username.is_empty() {
            return Err(AuthError::InvalidInput("no username provided"));
        }

        let params = QueryParameters::for_user_with_groups(username);
        self.call_service(
            self.config.technical_credentials(),
            CredentialSubject::TechnicalAccount,
            &params,
        )
        .await
    }

    #[tracing::instrument(
        level = "debug",
        skip(self, credentials, subject, params),
        fields(
            url = %self.config.resource_url(),
            credentials.subject = %subject,
            credentials.username = credentials.username(),
        ),
    )]
    async fn call_service(
        &self,
        credentials: Credentials<'_>,
        subject: CredentialSubject,
        params: &QueryParameters,
    ) -> Result<UserGroups, AuthError> {
        let timeout = self.config.timeout();
        let request =
            request::build_request(self.config.resource_url(), params, credentials, timeout)?;
        let context = FailureContext::new(credentials.username(), subject, timeout);

        tracing::debug!("requesting user from Jira");

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| context.classify(Failure::Transport(e)))?;

        tracing::debug!(
            response.status = response.status().as_u16(),
            "received response from Jira"
        );

        if !response.status().is_success() {
            let status = response.status();
            return Err(context.classify(Failure::Status {
                status,
                body: response.into_body(),
            }));
        }

        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!(
                response.body = %crate::error::truncate(response.body(), MAX_BODY_CHARS),
                "response body"
            );
        }

        let user = response::parse(response.body())
            .map_err(|e| context.classify(Failure::Parse(e)))?;

        tracing::debug!(
            user.name = %user.username(),
            user.groups = user.groups().len(),
            "parsed Jira user"
        );

        Ok(user)
    }
}
