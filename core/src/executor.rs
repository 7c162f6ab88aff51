//! Terminal calls: dispatch an assembled request and consume the response.
//!
//! # Design
//! `execute` returns the live response and leaves the body to the caller.
//! The checked calls (`handle`, `unmarshal`) always read the whole body and
//! drop the response before returning, whichever way they return. Each call
//! assembles and dispatches once; nothing is retried.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::builder::RequestBuilder;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{default_transport, Transport};

/// Hook that may inspect or replace a response before its status is checked.
pub type ResponseHook =
    Box<dyn Fn(&HttpRequest, HttpResponse) -> Result<HttpResponse, ApiError> + Send + Sync>;

impl RequestBuilder {
    /// Assemble and send the request, returning the live response.
    ///
    /// Error statuses are not treated as failures here.
    pub fn execute(&mut self) -> Result<HttpResponse, ApiError> {
        let request = self.build_request()?;
        self.dispatch(&request)
    }

    /// Assemble and send the request, then hand the full body of a
    /// successful response to `consumer`.
    ///
    /// A status of 400 or above fails with `ApiError::Status` carrying the
    /// status and body. Whatever `consumer` returns is passed through as-is.
    pub fn handle<T, E, F>(&mut self, consumer: F) -> Result<T, E>
    where
        F: FnOnce(Vec<u8>) -> Result<T, E>,
        E: From<ApiError>,
    {
        let body = self.checked_body()?;
        consumer(body)
    }

    /// Decode a successful JSON response into `T`.
    pub fn unmarshal<T: DeserializeOwned>(&mut self) -> Result<T, ApiError> {
        self.handle(|body| serde_json::from_slice(&body).map_err(ApiError::from))
    }

    fn checked_body(&mut self) -> Result<Vec<u8>, ApiError> {
        let request = self.build_request()?;
        let mut response = self.dispatch(&request)?;
        if let Some(hook) = &self.response_hook {
            response = hook(&request, response)?;
        }

        let status = response.status;
        let body = response.body.read_to_vec().map_err(ApiError::ReadBody)?;
        drop(response);

        check_status(status, body)
    }

    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let transport: Arc<dyn Transport + Send + Sync> = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => default_transport()?,
        };
        let response = transport.execute(request)?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            "received response"
        );
        Ok(response)
    }
}

/// Map a status of 400 or above to `ApiError::Status`.
fn check_status(status: u16, body: Vec<u8>) -> Result<Vec<u8>, ApiError> {
    if status >= 400 {
        tracing::warn!(status, body_len = body.len(), "request failed");
        return Err(ApiError::Status { status, body });
    }
    Ok(body)
}
