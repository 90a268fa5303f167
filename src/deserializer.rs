//! Response deserializers
//!
//! A deserializer turns a buffered [`Response`] into a value. It is chosen per
//! call and passed by value to the client, so several codecs can coexist
//! without any registry. Deserializers hold no mutable state and may be used
//! from many dispatches at once.

use std::convert::Infallible;
use std::marker::PhantomData;
use std::string::FromUtf8Error;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::response::Response;

/// Decodes a response into `Self::Output`
pub trait ResponseDeserializer: Send + Sync + 'static {
    /// The decoded value
    type Output: Send + 'static;

    /// The decoding failure
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decode the response
    fn deserialize(&self, response: Response) -> Result<Self::Output, Self::Error>;

    /// Keep the response next to the decoded value, see [`WithResponse`]
    fn with_response(self) -> WithResponse<Self>
    where
        Self: Sized,
    {
        WithResponse::new(self)
    }
}

/// Hands back the response untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl ResponseDeserializer for Raw {
    type Output = Response;
    type Error = Infallible;

    fn deserialize(&self, response: Response) -> Result<Response, Infallible> {
        Ok(response)
    }
}

/// The body as bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteArray;

impl ResponseDeserializer for ByteArray {
    type Output = Bytes;
    type Error = Infallible;

    fn deserialize(&self, response: Response) -> Result<Bytes, Infallible> {
        Ok(response.into_body())
    }
}

/// The body as a UTF-8 string
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl ResponseDeserializer for Text {
    type Output = String;
    type Error = FromUtf8Error;

    fn deserialize(&self, response: Response) -> Result<String, FromUtf8Error> {
        String::from_utf8(response.into_body().to_vec())
    }
}

/// Discards the body
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

impl ResponseDeserializer for Empty {
    type Output = ();
    type Error = Infallible;

    fn deserialize(&self, _response: Response) -> Result<(), Infallible> {
        Ok(())
    }
}

/// The body decoded as JSON with serde_json
///
/// Use `Json::<serde_json::Value>::new()` for untyped JSON.
pub struct Json<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Json<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for Json<T> {}

impl<T> std::fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Json<{}>", std::any::type_name::<T>())
    }
}

impl<T> ResponseDeserializer for Json<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;
    type Error = serde_json::Error;

    fn deserialize(&self, response: Response) -> Result<T, serde_json::Error> {
        serde_json::from_slice(response.body())
    }
}

/// Deserializer backed by a function, see [`from_fn`]
#[derive(Clone, Copy)]
pub struct FromFn<F> {
    f: F,
}

/// Use a function as a deserializer
///
/// ```rust
/// use ferry::deserializer::{from_fn, ResponseDeserializer};
/// use ferry::Response;
///
/// let length = from_fn(|response: Response| Ok::<_, std::io::Error>(response.body().len()));
/// let response = Response::ok().body("four").build();
/// assert_eq!(length.deserialize(response).unwrap(), 4);
/// ```
pub fn from_fn<F, T, E>(f: F) -> FromFn<F>
where
    F: Fn(Response) -> Result<T, E> + Send + Sync + 'static,
{
    FromFn { f }
}

impl<F, T, E> ResponseDeserializer for FromFn<F>
where
    F: Fn(Response) -> Result<T, E> + Send + Sync + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Output = T;
    type Error = E;

    fn deserialize(&self, response: Response) -> Result<T, E> {
        (self.f)(response)
    }
}

impl<F> std::fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}

/// Decodes with the wrapped deserializer and hands back the response too
///
/// Useful when the caller needs the status or headers as well as the value.
/// Fails exactly when the wrapped deserializer fails.
///
/// ```rust
/// use ferry::deserializer::{Json, ResponseDeserializer};
/// use ferry::{Response, StatusCode};
///
/// let response = Response::builder(StatusCode::CREATED).body(r#"{"id":7}"#).build();
/// let (response, body) = Json::<serde_json::Value>::new()
///     .with_response()
///     .deserialize(response)
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(body["id"], 7);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WithResponse<D> {
    inner: D,
}

impl<D> WithResponse<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// Get the wrapped deserializer back
    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D> ResponseDeserializer for WithResponse<D>
where
    D: ResponseDeserializer,
{
    type Output = (Response, D::Output);
    type Error = D::Error;

    fn deserialize(&self, response: Response) -> Result<Self::Output, D::Error> {
        let value = self.inner.deserialize(response.clone())?;
        Ok((response, value))
    }
}
