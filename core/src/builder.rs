//! Chainable request builder.
//!
//! # Design
//! `RequestBuilder` owns everything needed for one logical request. Setters
//! take the builder by value and hand it back, so calls chain without
//! borrowing gymnastics. Nothing is validated here: bad URLs, failed JSON
//! marshals and unreadable multipart sources surface when the request is
//! assembled.

use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::body::Payload;
use crate::executor::ResponseHook;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::MultipartPart;
use crate::transport::Transport;
use crate::ApiError;

/// Start a GET request against `base_url`.
///
/// The base URL includes the scheme, e.g. `https://api.github.com/repos`.
pub fn get(base_url: impl Into<String>) -> RequestBuilder {
    RequestBuilder::new(HttpMethod::Get, base_url)
}

/// Start a POST request against `base_url`.
pub fn post(base_url: impl Into<String>) -> RequestBuilder {
    RequestBuilder::new(HttpMethod::Post, base_url)
}

/// Start a PUT request against `base_url`.
pub fn put(base_url: impl Into<String>) -> RequestBuilder {
    RequestBuilder::new(HttpMethod::Put, base_url)
}

/// Accumulated state of one request.
pub struct RequestBuilder {
    pub(crate) method: HttpMethod,
    pub(crate) base_url: String,
    pub(crate) paths: Vec<String>,
    pub(crate) url_params: Vec<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) basic_auth: Option<(String, String)>,
    pub(crate) payload: Payload,
    pub(crate) transport: Option<Arc<dyn Transport + Send + Sync>>,
    pub(crate) response_hook: Option<ResponseHook>,
}

impl RequestBuilder {
    pub fn new(method: HttpMethod, base_url: impl Into<String>) -> Self {
        Self {
            method,
            base_url: base_url.into(),
            paths: Vec::new(),
            url_params: Vec::new(),
            headers: Vec::new(),
            basic_auth: None,
            payload: Payload::Empty,
            transport: None,
            response_hook: None,
        }
    }

    // -----------------------------------------------------------------------
    // Endpoint
    // -----------------------------------------------------------------------

    /// Append a path fragment. Fragments are concatenated as-is, so include
    /// the leading `/`.
    pub fn path(mut self, fragment: impl Into<String>) -> Self {
        self.paths.push(fragment.into());
        self
    }

    /// Append a formatted path fragment, e.g.
    /// `.path_fmt(format_args!("/users/{}", name))`.
    pub fn path_fmt(mut self, args: fmt::Arguments<'_>) -> Self {
        self.paths.push(fmt::format(args));
        self
    }

    /// Append a `key=value` query parameter. Neither side is escaped.
    pub fn url_param(mut self, key: impl fmt::Display, value: impl fmt::Display) -> Self {
        self.url_params.push(format!("{key}={value}"));
        self
    }

    // -----------------------------------------------------------------------
    // Headers and auth
    // -----------------------------------------------------------------------

    /// Set a header. A second call with the exact same key overwrites the
    /// first value.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    // -----------------------------------------------------------------------
    // Body
    // -----------------------------------------------------------------------

    /// Send already encoded JSON bytes. Empty bytes send no body.
    pub fn json(mut self, json: impl Into<Vec<u8>>) -> Self {
        self.payload = Payload::Json(Ok(json.into()));
        self
    }

    /// Send already encoded JSON text. An empty string sends no body.
    pub fn json_string(self, json: impl Into<String>) -> Self {
        self.json(json.into().into_bytes())
    }

    /// Marshal `value` as the JSON body. A marshal failure is reported when
    /// the request is executed.
    pub fn json_struct<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.payload = Payload::json_struct(value);
        self
    }

    /// Add a value to a URL-encoded form field, keeping earlier values.
    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.push_form_field(key.into(), value.into());
        self
    }

    /// Replace all values of a URL-encoded form field.
    pub fn form_field_list<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.payload.replace_form_field(key.into(), values);
        self
    }

    /// Add a multipart part read from `reader`. Without `force_multipart` it
    /// is sent as a plain form field.
    pub fn multipart_data(
        self,
        key: impl Into<String>,
        reader: impl Read + Send + 'static,
        force_multipart: bool,
    ) -> Self {
        self.multipart_part(MultipartPart::reader(key, None, reader, force_multipart))
    }

    /// Add a multipart file part named `file_name` with content from `reader`.
    pub fn multipart_as_form_file(
        self,
        key: impl Into<String>,
        file_name: impl Into<String>,
        reader: impl Read + Send + 'static,
        force_multipart: bool,
    ) -> Self {
        self.multipart_part(MultipartPart::reader(
            key,
            Some(file_name.into()),
            reader,
            force_multipart,
        ))
    }

    /// Add a multipart file part read from `path`; the path is used as the
    /// filename.
    pub fn multipart_file(
        self,
        key: impl Into<String>,
        path: impl Into<PathBuf>,
        force_multipart: bool,
    ) -> Self {
        self.multipart_part(MultipartPart::file(key, path, force_multipart))
    }

    pub fn multipart_part(mut self, part: MultipartPart) -> Self {
        self.payload.push_part(part);
        self
    }

    // -----------------------------------------------------------------------
    // Execution collaborators
    // -----------------------------------------------------------------------

    /// Use `transport` instead of the default one.
    pub fn transport(mut self, transport: impl Transport + Send + Sync + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share a transport between builders.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport + Send + Sync>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register a hook run on every response in checked mode before the
    /// status is inspected. The hook owns the original response; if it
    /// returns a different one, the original is dropped and its body closed.
    pub fn handle_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HttpRequest, HttpResponse) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    {
        self.response_hook = Some(Box::new(hook));
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn url_params(&self) -> &[String] {
        &self.url_params
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn basic_auth_credentials(&self) -> Option<(&str, &str)> {
        self.basic_auth
            .as_ref()
            .map(|(user, pass)| (user.as_str(), pass.as_str()))
    }

    /// Media type of the active body strategy, if any.
    pub fn content_type(&self) -> Option<&'static str> {
        self.payload.content_type()
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("base_url", &self.base_url)
            .field("paths", &self.paths)
            .field("url_params", &self.url_params)
            .field("headers", &self.headers)
            .field("basic_auth", &self.basic_auth.as_ref().map(|(user, _)| user))
            .field("payload", &self.payload)
            .field("transport", &self.transport.is_some())
            .field("response_hook", &self.response_hook.is_some())
            .finish()
    }
}
