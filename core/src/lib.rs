//! Fluent HTTP request builder.
//!
//! # Overview
//! Chain calls to describe a request (path fragments, query parameters,
//! headers, basic auth and one body encoding), then execute it through an
//! injected `Transport` and take the raw response or a checked, decoded body.
//!
//! ```no_run
//! # fn main() -> Result<(), fluent_rest::ApiError> {
//! let repo: serde_json::Value = fluent_rest::get("https://api.github.com")
//!     .path("/repos")
//!     .path_fmt(format_args!("/{}/{}", "rust-lang", "rust"))
//!     .header("Accept", "application/vnd.github+json")
//!     .unmarshal()?;
//! # let _ = repo;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `RequestBuilder` accumulates state and never validates eagerly; every
//!   terminal call assembles a fresh `HttpRequest` from it.
//! - The body is a sum type (`json*`, `form_field*`, `multipart*` setters),
//!   so the content type always matches the payload. The last body family
//!   set wins.
//! - The transport is a trait; `UreqTransport` is the default when the
//!   `ureq` feature is enabled.

pub mod assemble;
pub mod body;
pub mod builder;
pub mod error;
pub mod executor;
pub mod http;
pub mod multipart;
pub mod transport;

pub use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};
pub use builder::{get, post, put, RequestBuilder};
pub use error::{ApiError, EncodingError, InvalidEndpoint, RequestBuildError, TransportError};
pub use executor::ResponseHook;
pub use multipart::{MultipartPart, PartSource};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
