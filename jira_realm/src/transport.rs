//! Execution of requests against Jira

use std::error;

use async_trait::async_trait;
use bytes::BytesMut;
use reqwest::{Request, StatusCode};
use thiserror::Error;

/// A response as received from Jira, before any interpretation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    status: StatusCode,
    body: String,
}

impl RawResponse {
    /// Constructs a new raw response
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The response status
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response body
    #[inline]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Takes ownership of the response body
    pub fn into_body(self) -> String {
        self.body
    }
}

/// The exchange with Jira did not produce a response
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request timed out, either while connecting or while waiting
    /// for the response
    #[error("request timed out")]
    Timeout(#[source] Box<dyn error::Error + Send + Sync + 'static>),
    /// A connection to Jira could not be established
    #[error("connection failed: {0}")]
    Connect(#[source] Box<dyn error::Error + Send + Sync + 'static>),
    /// The connection broke down during the exchange
    #[error("exchange failed: {0}")]
    Exchange(#[source] Box<dyn error::Error + Send + Sync + 'static>),
    /// The request could not be sent for local reasons
    #[error("request could not be sent")]
    Internal(#[source] Box<dyn error::Error + Send + Sync + 'static>),
    /// Jira sent more than the transport is willing to read
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge {
        /// The largest body accepted, in bytes
        limit: usize,
    },
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.into())
        } else if error.is_connect() {
            Self::Connect(error.into())
        } else if error.is_builder() {
            Self::Internal(error.into())
        } else {
            Self::Exchange(error.into())
        }
    }
}

/// A means of executing requests against Jira
///
/// Implementations must not carry state from one request to the next;
/// everything a request needs, including its credentials and timeout, is
/// part of the request itself.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes a single request and reads the complete response
    async fn execute(&self, request: Request) -> Result<RawResponse, TransportError>;
}

/// Largest response body read from Jira by default, in bytes
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// A transport backed by a [`reqwest::Client`]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    body_limit: usize,
}

impl ReqwestTransport {
    /// Constructs a new transport from an existing client
    ///
    /// Prefer [`tls::build_transport()`][crate::tls::build_transport()],
    /// which applies the configured trust policy.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            body_limit: MAX_BODY_BYTES,
        }
    }

    /// Sets the largest response body that will be read
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<RawResponse, TransportError> {
        let mut response = self.client.execute(request).await?;
        let status = response.status();

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.body_limit {
                return Err(TransportError::BodyTooLarge {
                    limit: self.body_limit,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(RawResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_response_exposes_status_and_body() {
        let response = RawResponse::new(StatusCode::OK, r#"{"name":"alice"}"#);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), r#"{"name":"alice"}"#);
        assert_eq!(response.into_body(), r#"{"name":"alice"}"#);
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_error() {
        let transport = ReqwestTransport::new(reqwest::Client::new());
        let request = Request::new(
            reqwest::Method::GET,
            "http://127.0.0.1:1/rest/api/2/user/".parse().unwrap(),
        );

        let error = transport.execute(request).await.unwrap_err();

        assert!(matches!(error, TransportError::Connect(_)), "{:?}", error);
    }

    #[tokio::test]
    async fn oversized_body_is_not_read_past_the_limit() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/rest/api/2/user/");
                then.status(200).body("x".repeat(1024));
            })
            .await;
        let transport = ReqwestTransport::new(reqwest::Client::new()).with_body_limit(100);
        let request = Request::new(
            reqwest::Method::GET,
            server.url("/rest/api/2/user/").parse().unwrap(),
        );

        let error = transport.execute(request).await.unwrap_err();

        assert!(
            matches!(error, TransportError::BodyTooLarge { limit: 100 }),
            "{:?}",
            error
        );
    }

    #[tokio::test]
    async fn body_within_the_limit_is_read_whole() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/rest/api/2/user/");
                then.status(200).body(r#"{"name":"alice"}"#);
            })
            .await;
        let transport = ReqwestTransport::new(reqwest::Client::new()).with_body_limit(16);
        let request = Request::new(
            reqwest::Method::GET,
            server.url("/rest/api/2/user/").parse().unwrap(),
        );

        let response = transport.execute(request).await.unwrap();

        assert_eq!(response.body(), r#"{"name":"alice"}"#);
    }
}
