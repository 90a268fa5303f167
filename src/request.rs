use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use url::Url;

use crate::error::{Error, Result};

/// Methods a [`Request`] may carry
pub const SUPPORTED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
];

/// Immutable description of one HTTP call
///
/// A request is produced by [`RequestBuilder::build`] and never changes
/// afterwards. Retrying means dispatching the same value again (it is cheap
/// to clone, the body is reference counted).
#[derive(Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: Option<Duration>,
}

impl Request {
    /// Create a new request builder
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Start a GET request
    pub fn get(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new().method(Method::GET).url(url)
    }

    /// Start a POST request
    pub fn post(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new().method(Method::POST).url(url)
    }

    /// Start a PUT request
    pub fn put(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new().method(Method::PUT).url(url)
    }

    /// Start a PATCH request
    pub fn patch(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new().method(Method::PATCH).url(url)
    }

    /// Start a DELETE request
    pub fn delete(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new().method(Method::DELETE).url(url)
    }

    /// Start a HEAD request
    pub fn head(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new().method(Method::HEAD).url(url)
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the URL, query parameters included
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the body
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Get the per-request timeout, if one was set
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Return a copy carrying `defaults` for every header this request does not set
    pub(crate) fn with_default_headers(&self, defaults: &HeaderMap) -> Request {
        let mut request = self.clone();
        for (name, value) in defaults {
            if !request.headers.contains_key(name) {
                request.headers.insert(name.clone(), value.clone());
            }
        }
        request
    }

    /// Convert to a reqwest request
    pub fn to_reqwest_request(&self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        if let Some(body) = &self.body {
            *request.body_mut() = Some(body.clone().into());
        }
        if let Some(timeout) = self.timeout {
            *request.timeout_mut() = Some(timeout);
        }
        request
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|b| format!("{} bytes", b.len())))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for [`Request`]
///
/// Every setter returns the builder so calls chain. Problems such as an
/// invalid header are recorded and reported by [`build`](Self::build), which
/// is the only place a request can fail.
///
/// # Examples
///
/// ```rust
/// use ferry::Request;
///
/// let request = Request::get("https://example.test/search")
///     .header("Accept", "application/json")
///     .parameter("q", "rust")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.url().as_str(), "https://example.test/search?q=rust");
/// ```
#[derive(Debug, Default)]
pub struct RequestBuilder {
    url: Option<String>,
    method: Option<Method>,
    headers: HeaderMap,
    parameters: Vec<(String, String)>,
    body: Option<Bytes>,
    timeout: Option<Duration>,
    error: Option<Error>,
}

impl RequestBuilder {
    /// Create a new request builder; the method defaults to GET
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the URL to load
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set a header, replacing any previous value for the same name
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        match parse_header(name, value) {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Set multiple headers
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            self = self.header(name.as_ref(), value.as_ref());
        }
        self
    }

    /// Append a query parameter
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Append several query parameters
    pub fn parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters
            .extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a text body
    pub fn text(self, body: &str) -> Self {
        self.header("Content-Type", "text/plain; charset=utf-8")
            .body(body.to_string())
    }

    /// Set a JSON body
    pub fn json<T>(mut self, body: &T) -> Self
    where
        T: serde::Serialize + ?Sized,
    {
        match serde_json::to_vec(body) {
            Ok(json) => {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                self.body = Some(json.into());
            }
            Err(e) => {
                self.error.get_or_insert_with(|| {
                    Error::invalid_request(format!("Invalid JSON body: {}", e))
                });
            }
        }
        self
    }

    /// Set basic authentication
    pub fn basic_auth(self, username: &str, password: Option<&str>) -> Self {
        let credentials = format!("{}:{}", username, password.unwrap_or(""));
        let encoded = BASE64.encode(credentials.as_bytes());
        self.header(AUTHORIZATION.as_str(), &format!("Basic {}", encoded))
    }

    /// Set bearer token authentication
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header(AUTHORIZATION.as_str(), &format!("Bearer {}", token))
    }

    /// Set a timeout for this request only
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the request
    ///
    /// Fails with [`Error::InvalidRequest`] when the URL is missing, empty or
    /// malformed, the method is not supported, a header was rejected, or a
    /// POST, PUT or PATCH has no body.
    pub fn build(self) -> Result<Request> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let method = self.method.unwrap_or(Method::GET);
        if !SUPPORTED_METHODS.contains(&method) {
            return Err(Error::invalid_request(format!("Unsupported method: {}", method)));
        }

        let raw = self.url.unwrap_or_default();
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::invalid_request("URL must not be empty"));
        }
        let mut url = Url::parse(raw)?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_request(format!("Not an HTTP URL: {}", raw)));
        }
        if !self.parameters.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.parameters);
        }

        if requires_body(&method) && self.body.is_none() {
            return Err(Error::invalid_request(format!(
                "Body for method {} should not be empty",
                method
            )));
        }

        Ok(Request {
            method,
            url,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
        })
    }
}

fn requires_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = name.parse::<HeaderName>()?;
    let value = value.parse::<HeaderValue>()?;
    Ok((name, value))
}
