use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use url::Url;

use crate::error::Result;

/// HTTP response with a fully buffered body
///
/// This is what a [`Transport`](crate::transport::Transport) hands back and
/// what deserializers consume. Cloning is cheap: the body is reference counted.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    version: http::Version,
    body: Bytes,
}

impl Response {
    /// Create a response builder
    pub fn builder(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder::new(status)
    }

    /// Create a successful response builder
    pub fn ok() -> ResponseBuilder {
        ResponseBuilder::new(StatusCode::OK)
    }

    /// Buffer a reqwest response
    pub async fn from_reqwest_response(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let version = response.version();
        let body = response.bytes().await?;

        Ok(Self {
            status,
            headers,
            url,
            version,
            body,
        })
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the HTTP version
    pub fn version(&self) -> http::Version {
        self.version
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Get the content type
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Get the URL that produced this response (after redirects)
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Take the body
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Check if the response is successful (2xx status code)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the response is a client error (4xx status code)
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Check if the response is a server error (5xx status code)
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Check if the response indicates a redirect
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }
}

/// Builder for responses, mostly useful for stub transports
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
    url: Option<Url>,
    version: http::Version,
    body: Bytes,
}

impl ResponseBuilder {
    /// Create a new response builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url: None,
            version: http::Version::HTTP_11,
            body: Bytes::new(),
        }
    }

    /// Set the status code
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = name.parse::<http::header::HeaderName>()?;
        let value = value.parse::<HeaderValue>()?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set the URL
    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Set the HTTP version
    pub fn version(mut self, version: http::Version) -> Self {
        self.version = version;
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the response
    ///
    /// Without an explicit URL the response reports `http://localhost/`.
    pub fn build(self) -> Response {
        let url = self
            .url
            .unwrap_or_else(|| Url::parse("http://localhost/").expect("static URL is valid"));

        Response {
            status: self.status,
            headers: self.headers,
            url,
            version: self.version,
            body: self.body,
        }
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_creation() {
        let response = ResponseBuilder::new(StatusCode::OK)
            .header("Content-Type", "application/json")
            .unwrap()
            .body(r#"{"message": "Hello, World!"}"#)
            .build();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.url().as_str(), "http://localhost/");
        assert_eq!(response.body().len(), 28);
    }

    #[test]
    fn test_response_status_checks() {
        let response = Response::ok().build();
        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
        assert!(!response.is_redirect());

        let response = Response::builder(StatusCode::NOT_FOUND).build();
        assert!(!response.is_success());
        assert!(response.is_client_error());

        let response = Response::builder(StatusCode::INTERNAL_SERVER_ERROR).build();
        assert!(response.is_server_error());

        let response = Response::builder(StatusCode::FOUND).build();
        assert!(response.is_redirect());
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        assert!(Response::ok().header("bad header", "x").is_err());
    }
}
