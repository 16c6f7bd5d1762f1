//! In-memory transport for tests.
//!
//! `ScriptedTransport` replays queued responses in FIFO order and records
//! every request it sees, so tests can assert both what the client sent and
//! that nothing was sent at all.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::http::{canonical_reason, HttpRequest, HttpResponse};
use crate::session::SessionContext;
use crate::transport::{Transport, TransportError};

#[derive(Debug, Clone)]
enum Scripted {
    Response(HttpResponse),
    Failure(String),
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: HttpResponse) -> &Self {
        self.queue.lock().push_back(Scripted::Response(response));
        self
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push_response(HttpResponse::json(status, body.to_string()))
    }

    /// Queue a plain-text response with the given content type.
    pub fn push_text(&self, status: u16, content_type: &str, body: &str) -> &Self {
        self.push_response(HttpResponse {
            status,
            status_text: canonical_reason(status).to_string(),
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: body.to_string(),
        })
    }

    pub fn push_network_failure(&self, cause: &str) -> &Self {
        self.queue.lock().push_back(Scripted::Failure(cause.to_string()));
        self
    }

    /// Response returned whenever the queue is empty.
    pub fn always_json(&self, status: u16, body: Value) -> &Self {
        *self.fallback.lock() = Some(Scripted::Response(HttpResponse::json(status, body.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request.clone());
        let next = self.queue.lock().pop_front().or_else(|| self.fallback.lock().clone());
        match next {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Failure(cause)) => Err(TransportError(cause)),
            None => Err(TransportError(format!(
                "no scripted response for {} {}",
                request.method, request.endpoint
            ))),
        }
    }
}

/// Client wired to a fresh scripted transport and in-memory session.
pub fn scripted_client() -> (ApiClient, Arc<ScriptedTransport>, SessionContext) {
    let transport = Arc::new(ScriptedTransport::new());
    let session = SessionContext::in_memory();
    let client = ApiClient::new(
        ClientConfig::new("http://api.test"),
        session.clone(),
        transport.clone(),
    );
    (client, transport, session)
}
