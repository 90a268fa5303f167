use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::FutureExt;
use http::{HeaderMap, HeaderValue};
use tokio::runtime::{Handle, Runtime};
use tracing::Instrument;

use crate::deserializer::{Json, ResponseDeserializer};
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::pending::{CancelHandle, PendingRequest};
use crate::request::Request;
use crate::routing::Routing;
use crate::stream::SingleStream;
use crate::timeout::TimeoutConfig;
use crate::transport::{ReqwestTransport, Transport};

/// Dispatches requests and delivers their results
///
/// Every dispatch runs the request through the transport, pipes a successful
/// response through the deserializer given for that call, and produces
/// exactly one [`Result`]. The caller picks how that result arrives:
///
/// | style | entry point | result |
/// |---|---|---|
/// | blocking | [`blocking`](Self::blocking) | returned to the calling thread |
/// | callback | [`enqueue`](Self::enqueue) | passed to a callback on an [`Executor`] |
/// | async | [`send`](Self::send) | awaited as a [`PendingRequest`] |
/// | reactive | [`stream`](Self::stream) | emitted by a [`SingleStream`] |
///
/// The client is cheap to clone; clones share the transport.
///
/// # Examples
///
/// ```rust,no_run
/// use ferry::{deserializer::Json, Client, Request};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new()?;
///     let request = Request::get("https://httpbin.org/json").build()?;
///     let body: serde_json::Value = client.send(request, Json::new()).await?;
///     println!("{}", body);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    default_headers: HeaderMap,
    runtime: Option<Handle>,
    validate_status: bool,
}

impl Client {
    /// Create a client backed by reqwest with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a new client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client around an existing transport
    pub fn with_transport<T>(transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            transport: Arc::new(transport),
            default_headers: HeaderMap::new(),
            runtime: None,
            validate_status: false,
        }
    }

    /// Get the transport
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Dispatch and block the calling thread until the result is ready
    ///
    /// With a runtime configured on the builder the request is driven by that
    /// runtime. Otherwise it runs on a small runtime shared by every client in
    /// the process, started on first use.
    ///
    /// Without a configured runtime, calling this from inside a tokio runtime
    /// fails with [`Error::Config`] instead of stalling that runtime; use
    /// [`send`](Self::send) there.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async context while a runtime is
    /// configured, as [`Handle::block_on`] does.
    pub fn blocking<D>(&self, request: Request, deserializer: D) -> Result<D::Output>
    where
        D: ResponseDeserializer,
    {
        match &self.runtime {
            Some(runtime) => runtime.block_on(self.call(request, deserializer)),
            None => {
                if Handle::try_current().is_ok() {
                    return Err(Error::config(
                        "blocking dispatch inside a tokio runtime; use send instead",
                    ));
                }
                shared_runtime()?.block_on(self.call(request, deserializer))
            }
        }
    }

    /// Dispatch and await the result
    ///
    /// The request starts immediately. Dropping the returned future before it
    /// resolves cancels the request, including when the task awaiting it is
    /// itself cancelled. A panic in the transport or deserializer resumes in
    /// the task awaiting the result.
    pub fn send<D>(&self, request: Request, deserializer: D) -> PendingRequest<D::Output>
    where
        D: ResponseDeserializer,
    {
        match self.runtime_handle() {
            Ok(runtime) => PendingRequest::spawn(&runtime, self.call(request, deserializer)),
            Err(e) => PendingRequest::failed(e),
        }
    }

    /// Dispatch and hand the result to `callback`, run on `executor`
    ///
    /// Returns at once. The callback runs exactly once, unless the request is
    /// cancelled through the returned handle first, in which case it never
    /// runs. A panic in the transport or deserializer is delivered as
    /// [`Error::Panic`].
    ///
    /// The callback only runs if `executor` still accepts work when the result
    /// arrives: a [`ChannelExecutor`](crate::executor::ChannelExecutor) whose
    /// [`ExecutorLoop`](crate::executor::ExecutorLoop) has been dropped discards
    /// it with a warning.
    pub fn enqueue<D, E, F>(
        &self,
        request: Request,
        deserializer: D,
        executor: E,
        callback: F,
    ) -> CancelHandle
    where
        D: ResponseDeserializer,
        E: Executor,
        F: FnOnce(Result<D::Output>) + Send + 'static,
    {
        let runtime = match self.runtime_handle() {
            Ok(runtime) => runtime,
            Err(e) => {
                deliver(executor, callback, Err(e));
                return CancelHandle::completed();
            }
        };

        let pending = PendingRequest::spawn(&runtime, self.call(request, deserializer));
        let handle = pending.cancel_handle();
        runtime.spawn(async move {
            match AssertUnwindSafe(pending).catch_unwind().await {
                Ok(Err(Error::Cancelled)) => {
                    tracing::debug!("dispatch cancelled, callback dropped")
                }
                Ok(result) => deliver(executor, callback, result),
                Err(payload) => {
                    let message = panic_message(&*payload);
                    tracing::error!(panic = %message, "dispatch panicked");
                    deliver(executor, callback, Err(Error::Panic(message)));
                }
            }
        });
        handle
    }

    /// Dispatch and expose the result as a single-value stream
    ///
    /// The request starts immediately; dropping the stream before it yields
    /// cancels the request.
    pub fn stream<D>(&self, request: Request, deserializer: D) -> SingleStream<D::Output>
    where
        D: ResponseDeserializer,
    {
        SingleStream::new(self.send(request, deserializer))
    }

    /// Build the request for `route` and [`send`](Self::send) it
    ///
    /// An invalid route fails here, before anything is dispatched.
    pub fn route<R, D>(&self, route: &R, deserializer: D) -> Result<PendingRequest<D::Output>>
    where
        R: Routing + ?Sized,
        D: ResponseDeserializer,
    {
        let request = route.to_request()?;
        Ok(self.send(request, deserializer))
    }

    /// Send a GET request and decode the JSON response
    pub async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let request = Request::get(url)
            .header("Accept", "application/json")
            .build()?;
        self.send(request, Json::new()).await
    }

    /// Send a POST request with a JSON body and decode the JSON response
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let request = Request::post(url)
            .header("Accept", "application/json")
            .json(body)
            .build()?;
        self.send(request, Json::new()).await
    }

    fn runtime_handle(&self) -> Result<Handle> {
        match &self.runtime {
            Some(runtime) => Ok(runtime.clone()),
            None => Handle::try_current().map_err(|_| {
                Error::config(
                    "no tokio runtime; call from within a runtime or configure one on the builder",
                )
            }),
        }
    }

    /// The dispatch pipeline shared by every completion style
    fn call<D>(
        &self,
        request: Request,
        deserializer: D,
    ) -> impl Future<Output = Result<D::Output>> + Send + 'static
    where
        D: ResponseDeserializer,
    {
        let transport = self.transport.clone();
        let validate_status = self.validate_status;
        let request = request.with_default_headers(&self.default_headers);
        let span = tracing::debug_span!(
            "dispatch",
            method = %request.method(),
            url = %request.url(),
            transport = transport.name(),
        );

        async move {
            tracing::debug!("sending request");
            let response = transport.execute(request).await.map_err(|e| {
                tracing::debug!(error = %e, kind = ?e.kind(), "transport failed");
                Error::from(e)
            })?;

            let status = response.status();
            tracing::debug!(%status, bytes = response.body().len(), "response received");
            if validate_status && !(status.is_success() || status.is_redirection()) {
                return Err(Error::Status {
                    status,
                    body: response.into_body(),
                });
            }

            let body = response.body().clone();
            deserializer.deserialize(response).map_err(|e| {
                tracing::debug!(error = %e, "deserialization failed");
                Error::deserialization(e, body)
            })
        }
        .instrument(span)
    }
}

/// Runtime behind [`Client::blocking`] when none is configured
fn shared_runtime() -> Result<&'static Runtime> {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();

    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("ferry-blocking")
        .enable_all()
        .build()
        .map_err(|e| Error::config(format!("failed to start blocking runtime: {}", e)))?;
    Ok(RUNTIME.get_or_init(|| runtime))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn deliver<T, E, F>(executor: E, callback: F, result: Result<T>)
where
    T: Send + 'static,
    E: Executor,
    F: FnOnce(Result<T>) + Send + 'static,
{
    executor.execute(Box::new(move || callback(result)));
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport.name())
            .field("default_headers", &self.default_headers)
            .field("validate_status", &self.validate_status)
            .finish()
    }
}

/// Builder for creating clients with custom configuration
///
/// # Examples
///
/// ```rust
/// use ferry::ClientBuilder;
/// use std::time::Duration;
///
/// let client = ClientBuilder::new()
///     .timeout(Duration::from_secs(30))
///     .user_agent("MyApp/1.0")
///     .unwrap()
///     .build()
///     .unwrap();
/// ```
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    timeout_config: TimeoutConfig,
    default_headers: HeaderMap,
    runtime: Option<Handle>,
    validate_status: bool,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new() -> Self {
        Self {
            transport: None,
            timeout_config: TimeoutConfig::default(),
            default_headers: HeaderMap::new(),
            runtime: None,
            validate_status: false,
        }
    }

    /// Use a custom transport instead of reqwest
    ///
    /// Timeouts configured on this builder only apply to the default
    /// transport.
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share an existing transport
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the default timeout for all requests
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_config = self.timeout_config.timeout(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_config = self.timeout_config.connect_timeout(timeout);
        self
    }

    /// Set the pool idle timeout
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_config = self.timeout_config.pool_idle_timeout(timeout);
        self
    }

    /// Replace the whole timeout configuration
    pub fn timeout_config(mut self, config: TimeoutConfig) -> Self {
        self.timeout_config = config;
        self
    }

    /// Set a default header for all requests
    ///
    /// A header set on the request itself takes precedence.
    pub fn default_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = name.parse::<http::header::HeaderName>()?;
        let value = value.parse::<HeaderValue>()?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Set the user agent
    pub fn user_agent(self, user_agent: &str) -> Result<Self> {
        self.default_header("User-Agent", user_agent)
    }

    /// Run dispatches on this runtime instead of the ambient one
    ///
    /// Also lets [`Client::blocking`] drive transports that need tokio, such
    /// as the default reqwest transport, from threads outside the runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Turn responses outside 2xx and 3xx into [`Error::Status`]
    pub fn validate_status(mut self, validate: bool) -> Self {
        self.validate_status = validate;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<Client> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let transport = ReqwestTransport::with_timeouts(self.timeout_config)
                    .map_err(|e| Error::config(format!("failed to build HTTP transport: {}", e)))?;
                Arc::new(transport) as Arc<dyn Transport>
            }
        };

        Ok(Client {
            transport,
            default_headers: self.default_headers,
            runtime: self.runtime,
            validate_status: self.validate_status,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
