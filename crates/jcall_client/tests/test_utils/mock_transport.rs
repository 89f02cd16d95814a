//! Scripted transport for exercising the request pipeline without a network.

use async_trait::async_trait;
use jcall_client::{HttpRequest, HttpResponse, Transport};
use jcall_error::ApiError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A response with this status, body and headers
    Reply(HttpResponse),
    /// A network-level failure
    TransportError(String),
}

impl MockResponse {
    /// JSON response without headers.
    pub fn json(status: u16, body: Value) -> Self {
        Self::json_with_headers(status, body, &[])
    }

    /// JSON response with headers.
    pub fn json_with_headers(status: u16, body: Value, headers: &[(&str, &str)]) -> Self {
        Self::Reply(HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            body: body.to_string().into_bytes(),
        })
    }

    /// Response with an arbitrary body.
    pub fn bytes(status: u16, body: &[u8]) -> Self {
        Self::Reply(HttpResponse {
            status,
            headers: HashMap::new(),
            body: body.to_vec(),
        })
    }

    /// Network failure.
    pub fn transport_error(message: &str) -> Self {
        Self::TransportError(message.to_string())
    }
}

/// Transport that plays back a script and records every request.
///
/// Once the script runs out, the last reply repeats.
#[derive(Debug, Clone)]
pub struct MockTransport {
    script: Arc<Mutex<Vec<MockResponse>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    open: Arc<AtomicBool>,
}

impl MockTransport {
    /// Replies in order.
    pub fn new_sequence(responses: Vec<MockResponse>) -> Self {
        assert!(!responses.is_empty(), "script needs at least one response");
        Self {
            script: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
            open: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The same reply every time.
    pub fn new_always(response: MockResponse) -> Self {
        Self::new_sequence(vec![response])
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests received, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.open.store(true, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                script[0].clone()
            }
        };

        match next {
            MockResponse::Reply(response) => Ok(response),
            MockResponse::TransportError(message) => Err(ApiError::transport(message)),
        }
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    async fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
