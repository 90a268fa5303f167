use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::Request;
use crate::response::Response;
use crate::timeout::TimeoutConfig;

/// Transport trait for HTTP operations
///
/// The transport performs the actual exchange: connections, TLS, redirects.
/// It is owned by the application and shared by every dispatch, so
/// implementations must not change global state per call.
///
/// Cancellation is dropping the future returned by [`execute`](Self::execute);
/// an implementation must stop the exchange when that happens.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and buffer the response
    async fn execute(&self, request: Request) -> Result<Response, TransportError>;

    /// Get the transport name/type
    fn name(&self) -> &str {
        "custom"
    }
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        (**self).execute(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Default transport backed by reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout_config: TimeoutConfig,
}

impl ReqwestTransport {
    /// Create a transport with the default timeouts
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeouts(TimeoutConfig::default())
    }

    /// Create a transport with custom timeouts
    pub fn with_timeouts(timeout_config: TimeoutConfig) -> Result<Self, TransportError> {
        let client = timeout_config
            .apply_to_builder(reqwest::Client::builder())
            .build()?;
        Ok(Self::from_client(client, timeout_config))
    }

    /// Wrap an existing reqwest client, sharing its connection pool
    pub fn from_client(client: reqwest::Client, timeout_config: TimeoutConfig) -> Self {
        Self {
            client,
            timeout_config,
        }
    }

    /// Get the underlying reqwest client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Get the timeout configuration
    pub fn timeout_config(&self) -> &TimeoutConfig {
        &self.timeout_config
    }

    async fn exchange(&self, request: reqwest::Request) -> Result<Response, TransportError> {
        let response = self.client.execute(request).await?;
        Ok(Response::from_reqwest_response(response).await?)
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("timeout_config", &self.timeout_config)
            .finish()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let timeout = self.timeout_config.effective_timeout(request.timeout());
        let request = request.to_reqwest_request();

        if let Some(timeout) = timeout {
            tokio::time::timeout(timeout, self.exchange(request))
                .await
                .map_err(|_| {
                    TransportError::timeout(format!("request timed out after {:?}", timeout))
                })?
        } else {
            self.exchange(request).await
        }
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
