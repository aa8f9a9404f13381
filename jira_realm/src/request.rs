//! Construction of requests against the Jira user resource

use std::{fmt, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::{BufMut, BytesMut};
use reqwest::{
    header::{self, HeaderValue},
    Method, Request, Url,
};

use crate::{error::Unavailable, AuthError};

/// Path of the "fetch user by name" resource, relative to the Jira base URL
pub const USER_RESOURCE_PATH: &str = "rest/api/2/user/";

const PARAM_USERNAME: &str = "username";
const PARAM_EXPAND: &str = "expand";
const EXPAND_GROUPS: &str = "groups";

/// A username and password to place on the wire
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl<'a> Credentials<'a> {
    /// Pairs a username with its password
    pub const fn new(username: &'a str, password: &'a str) -> Self {
        Self { username, password }
    }

    /// The username
    #[inline]
    pub const fn username(&self) -> &'a str {
        self.username
    }
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &format_args!("***PASSWORD***"))
            .finish()
    }
}

/// Query parameters in insertion order
///
/// Inserting a parameter that is already present replaces its value in
/// place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParameters {
    params: Vec<(&'static str, String)>,
}

impl QueryParameters {
    /// Constructs an empty set of parameters
    pub const fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Parameters for confirming that `username` exists
    pub fn for_user(username: &str) -> Self {
        let mut params = Self::new();
        params.insert(PARAM_USERNAME, username);
        params
    }

    /// Parameters for fetching `username` along with their groups
    pub fn for_user_with_groups(username: &str) -> Self {
        let mut params = Self::for_user(username);
        params.insert(PARAM_EXPAND, EXPAND_GROUPS);
        params
    }

    /// Sets a parameter, replacing any existing value
    pub fn insert(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((name, value)),
        }
    }

    /// Gets the value of a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.params.iter().map(|(n, v)| (*n, v.as_str()))
    }

    /// The number of parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether no parameters are set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Resolves `resource_path` against `base_url`
///
/// Any context path on the base URL is kept, whether or not it ends with
/// `/`.
pub fn resource_url(base_url: &Url, resource_path: &str) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.set_fragment(None);
    base.join(resource_path)
}

/// Builds an authenticated `GET` request for the user resource
///
/// Fails with [`AuthError::InvalidInput`] if either part of `credentials`
/// is empty. Nothing is sent by this function.
pub fn build_request(
    resource_url: &Url,
    params: &QueryParameters,
    credentials: Credentials<'_>,
    timeout: Duration,
) -> Result<Request, AuthError> {
    if credentials.username.is_empty() {
        return Err(AuthError::InvalidInput("no username provided"));
    }
    if credentials.password.is_empty() {
        return Err(AuthError::InvalidInput("no password provided"));
    }

    let mut url = resource_url.clone();
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter());
    }

    let authorization = basic_authorization(credentials)
        .map_err(|e| AuthError::from(Unavailable::General { source: e.into() }))?;

    let mut request = Request::new(Method::GET, url);
    let headers = request.headers_mut();
    headers.insert(header::AUTHORIZATION, authorization);
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json"),
    );
    *request.timeout_mut() = Some(timeout);

    Ok(request)
}

fn basic_authorization(
    credentials: Credentials<'_>,
) -> Result<HeaderValue, header::InvalidHeaderValue> {
    let mut plain =
        String::with_capacity(credentials.username.len() + credentials.password.len() + 1);
    plain.push_str(credentials.username);
    plain.push(':');
    plain.push_str(credentials.password);

    let encoded = STANDARD.encode(plain.as_bytes());

    let mut header_value = BytesMut::with_capacity(encoded.len() + 6);
    header_value.put_slice(b"Basic ");
    header_value.put_slice(encoded.as_bytes());

    let mut value = HeaderValue::from_maybe_shared(header_value.freeze())?;
    value.set_sensitive(true);
    Ok(value)
}
