//! Endpoint families as closed enums
//!
//! An API is described by an enum whose variants are its endpoints. The enum
//! implements [`Routing`], answering each field with a `match`, so adding a
//! variant forces every field to handle it.
//!
//! ```rust
//! use ferry::{Method, Routing};
//!
//! enum Weather {
//!     Search { query: String },
//!     Location { id: u32 },
//! }
//!
//! impl Routing for Weather {
//!     fn base_path(&self) -> &str {
//!         "https://weather.example.test/api"
//!     }
//!
//!     fn method(&self) -> Method {
//!         match self {
//!             Weather::Search { .. } | Weather::Location { .. } => Method::GET,
//!         }
//!     }
//!
//!     fn path(&self) -> String {
//!         match self {
//!             Weather::Search { .. } => "location/search".to_string(),
//!             Weather::Location { id } => format!("location/{}", id),
//!         }
//!     }
//!
//!     fn parameters(&self) -> Vec<(String, String)> {
//!         match self {
//!             Weather::Search { query } => vec![("query".to_string(), query.clone())],
//!             Weather::Location { .. } => Vec::new(),
//!         }
//!     }
//! }
//!
//! let request = Weather::Location { id: 44418 }.to_request().unwrap();
//! assert_eq!(request.url().as_str(), "https://weather.example.test/api/location/44418");
//! ```

use bytes::Bytes;
use http::Method;

use crate::error::Result;
use crate::request::{Request, RequestBuilder};

/// A family of endpoints sharing a base path
pub trait Routing {
    /// Base path shared by every endpoint, e.g. `https://api.example.test/v1`
    fn base_path(&self) -> &str;

    /// HTTP method of this endpoint
    fn method(&self) -> Method;

    /// Path of this endpoint relative to the base path
    fn path(&self) -> String;

    /// Headers sent with this endpoint
    fn headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Query parameters sent with this endpoint
    fn parameters(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Body sent with this endpoint
    fn body(&self) -> Option<Bytes> {
        None
    }

    /// Build the request for this endpoint
    fn to_request(&self) -> Result<Request> {
        let mut builder = RequestBuilder::new()
            .url(join_path(self.base_path(), &self.path()))
            .method(self.method())
            .headers(self.headers())
            .parameters(self.parameters());
        if let Some(body) = self.body() {
            builder = builder.body(body);
        }
        builder.build()
    }
}

/// Join a base path and a relative path with exactly one `/`
pub fn join_path(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base, path)
}
