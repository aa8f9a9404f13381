//! TLS trust configuration for the connection to Jira

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::{transport::ReqwestTransport, AuthError};

/// How the certificate chain presented by Jira is validated
///
/// The default is [`PlatformDefault`][TrustPolicy::PlatformDefault]. Trusting
/// every certificate must be requested explicitly, either by naming
/// [`TrustAllCertificates`][TrustPolicy::TrustAllCertificates] or by an
/// administrator setting the `insecure_tls` flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrustPolicy {
    /// Validate certificates against the platform's trust store
    ///
    /// With `rustls-tls` the roots are loaded from the operating system's
    /// certificate store. With `default-tls` the native TLS implementation
    /// uses that store directly.
    #[default]
    PlatformDefault,
    /// Accept any certificate chain
    ///
    /// Intended for Jira instances behind self-signed or internal
    /// certificates. The connection is still encrypted and the certificate
    /// must still name the host being contacted, but the chain is not
    /// validated against any trust root.
    ///
    /// Requires the `rustls-tls` feature.
    TrustAllCertificates,
}

impl TrustPolicy {
    /// Maps the administrator-facing `insecure_tls` flag onto a policy
    pub const fn from_insecure_flag(insecure: bool) -> Self {
        if insecure {
            Self::TrustAllCertificates
        } else {
            Self::PlatformDefault
        }
    }

    /// Whether certificate chain validation is disabled
    pub const fn is_insecure(self) -> bool {
        matches!(self, Self::TrustAllCertificates)
    }
}

/// Builds the HTTP transport used for every call to Jira
///
/// `timeout` bounds connection establishment. Each request carries its own
/// overall timeout as well.
///
/// When `policy` trusts all certificates, a single warning is logged here.
/// Requests made over the resulting transport do not log it again.
pub fn build_transport(policy: TrustPolicy, timeout: Duration) -> Result<ReqwestTransport, AuthError> {
    let builder = Client::builder()
        .user_agent(concat!("jira_realm/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(timeout)
        .timeout(timeout);

    let builder = match policy {
        TrustPolicy::PlatformDefault => {
            tracing::trace!(tls.trust = "platform", "connection to Jira is secured");
            builder
        }
        TrustPolicy::TrustAllCertificates => {
            tracing::warn!(
                tls.trust = "all",
                "connection to Jira is insecure: certificate validation is disabled"
            );
            trust_all(builder)?
        }
    };

    let client = builder
        .build()
        .map_err(|error| AuthError::Configuration(error.into()))?;

    Ok(ReqwestTransport::new(client))
}

#[cfg(feature = "rustls-tls")]
fn trust_all(builder: ClientBuilder) -> Result<ClientBuilder, AuthError> {
    let config = any_chain::client_config()
        .map_err(|error| AuthError::Configuration(error.into()))?;

    Ok(builder.use_preconfigured_tls(config))
}

#[cfg(not(feature = "rustls-tls"))]
fn trust_all(_builder: ClientBuilder) -> Result<ClientBuilder, AuthError> {
    // native TLS backends drop hostname verification along with chain
    // validation, so there is no safe way to honor the policy here
    Err(AuthError::Configuration(
        "trusting all certificates requires the `rustls-tls` feature".into(),
    ))
}

/// Certificate verification that skips the chain but keeps the host name
#[cfg(feature = "rustls-tls")]
mod any_chain {
    use std::sync::Arc;

    use rustls::{
        client::{
            danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
            verify_server_name,
        },
        crypto::{self, WebPkiSupportedAlgorithms},
        pki_types::{CertificateDer, ServerName, UnixTime},
        server::ParsedCertificate,
        ClientConfig, DigitallySignedStruct, SignatureScheme,
    };

    pub(super) fn client_config() -> Result<ClientConfig, rustls::Error> {
        let provider = Arc::new(crypto::ring::default_provider());
        let verifier = AnyChainVerifier {
            algorithms: provider.signature_verification_algorithms,
        };

        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();

        Ok(config)
    }

    /// Accepts any chain, as long as the end-entity certificate names the
    /// server and the handshake is signed by its key
    #[derive(Debug)]
    struct AnyChainVerifier {
        algorithms: WebPkiSupportedAlgorithms,
    }

    impl ServerCertVerifier for AnyChainVerifier {
        fn verify_server_cert(
            &self,
            end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            let certificate = ParsedCertificate::try_from(end_entity)?;
            verify_server_name(&certificate, server_name)?;

            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.algorithms.supported_schemes()
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn insecure_flag_selects_trust_all() {
        assert_eq!(
            TrustPolicy::from_insecure_flag(true),
            TrustPolicy::TrustAllCertificates
        );
        assert!(TrustPolicy::from_insecure_flag(true).is_insecure());
    }

    #[test]
    fn default_policy_is_platform_trust() {
        assert_eq!(TrustPolicy::default(), TrustPolicy::PlatformDefault);
        assert_eq!(
            TrustPolicy::from_insecure_flag(false),
            TrustPolicy::PlatformDefault
        );
        assert!(!TrustPolicy::default().is_insecure());
    }

    #[cfg(feature = "rustls-tls")]
    #[test]
    #[traced_test]
    fn trust_all_transport_warns_on_construction() {
        build_transport(TrustPolicy::TrustAllCertificates, Duration::from_secs(1)).unwrap();

        assert!(logs_contain("certificate validation is disabled"));
    }

    #[test]
    #[traced_test]
    fn platform_transport_does_not_warn() {
        build_transport(TrustPolicy::PlatformDefault, Duration::from_secs(1)).unwrap();

        assert!(!logs_contain("certificate validation is disabled"));
    }

    #[cfg(not(feature = "rustls-tls"))]
    #[test]
    fn trust_all_without_rustls_is_refused() {
        let error = build_transport(TrustPolicy::TrustAllCertificates, Duration::from_secs(1))
            .unwrap_err();

        assert_eq!(error.kind(), crate::AuthErrorKind::Configuration);
    }
}
