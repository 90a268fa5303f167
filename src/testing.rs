//! Stub transports for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use tokio::sync::Notify;

use crate::error::{TransportError, TransportErrorKind};
use crate::request::Request;
use crate::response::Response;
use crate::transport::Transport;

/// Header telling a scripted stub how long to wait, in milliseconds
pub(crate) const DELAY_HEADER: &str = "x-stub-delay-ms";
/// Header telling a scripted stub to fail when set to `fail`
pub(crate) const OUTCOME_HEADER: &str = "x-stub-outcome";

enum Outcome {
    Respond { status: StatusCode, body: &'static str },
    Fail { kind: TransportErrorKind, message: &'static str },
    Hang,
    Scripted,
}

pub(crate) struct StubTransport {
    outcome: Outcome,
    calls: AtomicUsize,
    cancellations: Arc<AtomicUsize>,
    started: Notify,
    last_request: Mutex<Option<Request>>,
}

impl StubTransport {
    fn with(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            cancellations: Arc::new(AtomicUsize::new(0)),
            started: Notify::new(),
            last_request: Mutex::new(None),
        })
    }

    /// Answers every request with `status` and `body`
    pub(crate) fn respond(status: StatusCode, body: &'static str) -> Arc<Self> {
        Self::with(Outcome::Respond { status, body })
    }

    /// Answers every request with 200 and `body`
    pub(crate) fn ok(body: &'static str) -> Arc<Self> {
        Self::respond(StatusCode::OK, body)
    }

    /// Fails every request
    pub(crate) fn fail(kind: TransportErrorKind, message: &'static str) -> Arc<Self> {
        Self::with(Outcome::Fail { kind, message })
    }

    /// Never answers
    pub(crate) fn hang() -> Arc<Self> {
        Self::with(Outcome::Hang)
    }

    /// Delays and fails according to the request's stub headers
    pub(crate) fn scripted() -> Arc<Self> {
        Self::with(Outcome::Scripted)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Exchanges dropped before they finished
    pub(crate) fn cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<Request> {
        self.last_request.lock().unwrap().clone()
    }

    /// Wait until an exchange has started
    pub(crate) async fn started(&self) {
        self.started.notified().await
    }

    /// Wait until `count` exchanges have been cancelled
    pub(crate) async fn wait_for_cancellations(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.cancellations() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("transport was not cancelled in time")
    }
}

struct CancelGuard {
    counter: Arc<AtomicUsize>,
    armed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        let mut guard = CancelGuard {
            counter: self.cancellations.clone(),
            armed: true,
        };
        self.started.notify_one();

        let url = request.url().clone();
        let result = match &self.outcome {
            Outcome::Respond { status, body } => {
                Ok(Response::builder(*status).url(url).body(*body).build())
            }
            Outcome::Fail { kind, message } => Err(TransportError::new(*kind, *message)),
            Outcome::Hang => futures::future::pending().await,
            Outcome::Scripted => {
                let delay = header_value(&request, DELAY_HEADER)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                if delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                if header_value(&request, OUTCOME_HEADER) == Some("fail") {
                    Err(TransportError::connect("scripted failure"))
                } else {
                    Ok(Response::ok().url(url).body("ok").build())
                }
            }
        };

        guard.armed = false;
        result
    }

    fn name(&self) -> &str {
        "stub"
    }
}
