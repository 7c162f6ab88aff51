//! Turns builder state into one `HttpRequest`.
//!
//! Header order is significant: the body strategy's `Content-Type` goes in
//! first and custom headers are applied over it, so a custom `Content-Type`
//! replaces the computed one.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::builder::RequestBuilder;
use crate::error::{InvalidEndpoint, RequestBuildError};
use crate::http::HttpRequest;

impl RequestBuilder {
    /// Base URL followed by every path fragment, then `?` and the query
    /// fragments joined with `&` when there are any.
    pub fn endpoint(&self) -> String {
        let mut endpoint = self.base_url.clone();
        for path in &self.paths {
            endpoint.push_str(path);
        }
        if !self.url_params.is_empty() {
            endpoint.push('?');
            endpoint.push_str(&self.url_params.join("&"));
        }
        endpoint
    }

    /// Assemble a fresh request from the current state.
    ///
    /// Reader-backed multipart sources are consumed by this call.
    pub fn build_request(&mut self) -> Result<HttpRequest, RequestBuildError> {
        let endpoint = self.endpoint();
        if let Err(source) = check_endpoint(&endpoint) {
            return Err(RequestBuildError::InvalidUrl { endpoint, source });
        }

        let encoded = self.payload.encode()?;

        let mut request = HttpRequest {
            method: self.method,
            url: endpoint,
            headers: Vec::new(),
            body: encoded.body,
        };
        if let Some(content_type) = &encoded.content_type {
            request.set_header("Content-Type", content_type);
        }
        for (key, value) in &self.headers {
            request.set_header(key, value);
        }
        if let Some((username, password)) = &self.basic_auth {
            let credentials = STANDARD.encode(format!("{username}:{password}"));
            request.set_header("Authorization", &format!("Basic {credentials}"));
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            content_type = ?request.content_type(),
            body_len = request.body.as_ref().map_or(0, Vec::len),
            "assembled request"
        );
        Ok(request)
    }
}

/// The endpoint must be an absolute URL that is also a valid request URI.
fn check_endpoint(endpoint: &str) -> Result<(), InvalidEndpoint> {
    url::Url::parse(endpoint)?;
    ::http::Uri::try_from(endpoint)?;
    Ok(())
}
