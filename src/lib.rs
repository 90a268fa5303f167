//! Ferry - fluent HTTP requests with a choice of completion styles
//!
//! Ferry wraps an HTTP transport behind an immutable [`Request`] model and
//! lets each call decide how its result comes back:
//!
//! - **Blocking**: [`Client::blocking`] returns the result on the calling thread
//! - **Callback**: [`Client::enqueue`] runs a callback on an [`Executor`]
//! - **Async**: [`Client::send`] returns a [`PendingRequest`] to await
//! - **Reactive**: [`Client::stream`] returns a single-value [`SingleStream`]
//!
//! Whatever the style, a dispatch delivers exactly one [`Result`], and
//! cancelling it before then tears down the underlying HTTP exchange.
//! Responses are turned into values by a [`ResponseDeserializer`] picked per
//! call, and families of endpoints can be described once with [`Routing`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferry::{deserializer::Text, Client, Request};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new()?;
//!     let request = Request::get("https://httpbin.org/get")
//!         .parameter("page", "1")
//!         .build()?;
//!
//!     let body = client.send(request, Text).await?;
//!     println!("Body: {}", body);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod deserializer;
pub mod error;
pub mod executor;
pub mod pending;
pub mod request;
pub mod response;
pub mod routing;
pub mod stream;
pub mod timeout;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use client::{Client, ClientBuilder};
pub use deserializer::ResponseDeserializer;
pub use error::{Error, Result, TransportError, TransportErrorKind};
pub use executor::{ChannelExecutor, Executor, ExecutorLoop, Immediate};
pub use pending::{CancelHandle, PendingRequest};
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBuilder};
pub use routing::Routing;
pub use stream::SingleStream;
pub use timeout::TimeoutConfig;
pub use transport::{ReqwestTransport, Transport};

// Re-export common HTTP types
pub use http::{HeaderMap, HeaderValue, Method, StatusCode};

// Re-export URL types
pub use url::Url;

// Re-export common traits
pub use async_trait::async_trait;
