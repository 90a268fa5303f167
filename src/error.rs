use bytes::Bytes;
use thiserror::Error;

/// Boxed error used for the causes carried by [`Error`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for ferry operations
///
/// Every completion style delivers exactly one of these per dispatch:
/// `Ok` is the success payload, `Err` the failure.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ferry
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be built (empty or malformed URL, unsupported
    /// method, bad header, missing body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connection, timeout or protocol failure reported by the transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The deserializer rejected a successfully received body
    #[error("Deserialization error: {source}")]
    Deserialization {
        #[source]
        source: BoxError,
        /// The body that failed to decode
        body: Bytes,
    },

    /// The response status was rejected by status validation
    #[error("Unacceptable status: {status}")]
    Status { status: http::StatusCode, body: Bytes },

    /// The consumer withdrew interest before a result was produced
    #[error("Request was cancelled")]
    Cancelled,

    /// The client is not set up to perform the requested dispatch
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transport or deserializer panicked; carries the panic message
    #[error("Dispatch panicked: {0}")]
    Panic(String),
}

impl Error {
    /// Create a new invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }

    /// Create a new deserialization error, keeping the offending body
    pub fn deserialization(source: impl Into<BoxError>, body: Bytes) -> Self {
        Error::Deserialization {
            source: source.into(),
            body,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Check if this is an invalid request error
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Error::InvalidRequest(_))
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this is a transport timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_timeout())
    }

    /// Check if this is a deserialization error
    pub fn is_deserialization(&self) -> bool {
        matches!(self, Error::Deserialization { .. })
    }

    /// Check if this is a status validation error
    pub fn is_status(&self) -> bool {
        matches!(self, Error::Status { .. })
    }

    /// Check if the dispatch was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Check if the dispatch panicked
    pub fn is_panic(&self) -> bool {
        matches!(self, Error::Panic(_))
    }

    /// Get the underlying transport error, if any
    pub fn as_transport_error(&self) -> Option<&TransportError> {
        match self {
            Error::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// Get the body that failed to decode or validate
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Error::Deserialization { body, .. } | Error::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidRequest(format!("Invalid URL: {}", err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Error::InvalidRequest(format!("Invalid header name: {}", err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::InvalidRequest(format!("Invalid header value: {}", err))
    }
}

/// Kind of transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The connection could not be established
    Connect,
    /// The call did not finish in time
    Timeout,
    /// The peer violated HTTP, or the body could not be read
    Protocol,
    /// Anything else the transport reports
    Other,
}

/// Failure reported by a [`Transport`](crate::transport::Transport)
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    /// Create a new transport error
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new connection error
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// Create a new timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    /// Create a new protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Protocol, message)
    }

    /// Create a new uncategorised transport error
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, message)
    }

    /// Attach the underlying cause
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the failure kind
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Get the failure message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }

    /// Check if this is a connection failure
    pub fn is_connect(&self) -> bool {
        self.kind == TransportErrorKind::Connect
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() || err.is_redirect() {
            TransportErrorKind::Protocol
        } else {
            TransportErrorKind::Other
        };
        let message = err.to_string();
        TransportError::new(kind, message).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display_is_message() {
        let err = TransportError::timeout("timeout");
        assert_eq!(err.to_string(), "timeout");
        assert!(err.is_timeout());
        assert!(!err.is_connect());
    }

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let transport = Error::from(TransportError::connect("refused"));
        assert!(transport.is_transport());
        assert!(!transport.is_timeout());
        assert_eq!(
            transport.as_transport_error().map(|e| e.kind()),
            Some(TransportErrorKind::Connect)
        );

        let decode = Error::deserialization("bad json", Bytes::from_static(b"{"));
        assert!(decode.is_deserialization());
        assert_eq!(decode.body().map(|b| b.as_ref()), Some(&b"{"[..]));

        assert!(Error::invalid_request("empty url").is_invalid_request());
        assert!(Error::Cancelled.is_cancelled());
    }

    #[test]
    fn test_timeout_predicate_through_error() {
        let err: Error = TransportError::timeout("timeout").into();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Transport error: timeout");
    }

    #[test]
    fn test_url_parse_error_is_invalid_request() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(err.is_invalid_request());
    }
}
