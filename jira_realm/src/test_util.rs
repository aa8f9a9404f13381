use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{header, Request, StatusCode, Url};

use crate::transport::{RawResponse, Transport, TransportError};

/// What the fake transport saw of a request
#[derive(Clone, Debug)]
pub(crate) struct RecordedRequest {
    pub url: Url,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub timeout: Option<Duration>,
}

impl RecordedRequest {
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.into_owned())
    }
}

type Reply = Box<dyn Fn() -> Result<RawResponse, TransportError> + Send + Sync>;

/// A transport that answers every request the same way without touching
/// the network
pub(crate) struct FakeTransport {
    reply: Reply,
    calls: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn responding(status: u16, body: &'static str) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        Self::replying(move || Ok(RawResponse::new(status, body)))
    }

    pub fn failing(error: fn() -> TransportError) -> Self {
        Self::replying(move || Err(error()))
    }

    fn replying(
        reply: impl Fn() -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was executed")
    }
}

impl std::fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransport")
            .field("calls", &self.calls())
            .finish()
    }
}

fn header_text(request: &Request, name: header::HeaderName) -> Option<String> {
    request
        .headers()
        .get(name)
        .map(|v| v.to_str().unwrap().to_owned())
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: Request) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        self.requests.lock().unwrap().push(RecordedRequest {
            url: request.url().clone(),
            authorization: header_text(&request, header::AUTHORIZATION),
            accept: header_text(&request, header::ACCEPT),
            timeout: request.timeout().copied(),
        });

        (self.reply)()
    }
}
