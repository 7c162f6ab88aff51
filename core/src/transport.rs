//! The injected transport seam.
//!
//! # Design
//! The core never opens sockets itself. A `Transport` takes an assembled
//! `HttpRequest` and returns the live `HttpResponse`; pooling, timeouts, TLS
//! and redirects are entirely its business. Closures implement the trait, so
//! tests can substitute a transport without a server.
//!
//! With the `ureq` feature (on by default) `UreqTransport` is used whenever a
//! builder has no transport of its own.

use std::sync::Arc;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes an assembled request and returns the response.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError>,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Transport used when a builder has none configured.
pub(crate) fn default_transport() -> Result<Arc<dyn Transport + Send + Sync>, TransportError> {
    #[cfg(feature = "ureq")]
    {
        Ok(Arc::new(UreqTransport::new()))
    }
    #[cfg(not(feature = "ureq"))]
    {
        Err(TransportError::new(
            "no transport configured and the `ureq` feature is disabled",
        ))
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use super::Transport;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};

    /// Blocking transport backed by a `ureq::Agent`.
    ///
    /// Status codes are never turned into errors here; the executor decides
    /// what a 4xx/5xx means.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        /// Wrap a preconfigured agent. Keep `http_status_as_error(false)` on
        /// it, or error statuses will come back as transport failures.
        pub fn with_agent(agent: ureq::Agent) -> Self {
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = request.url.as_str();
            let body = request.body.as_deref();

            let result = match request.method {
                HttpMethod::Get => {
                    let mut builder = self.agent.get(url);
                    for (key, value) in &request.headers {
                        builder = builder.header(key.as_str(), value.as_str());
                    }
                    match body {
                        Some(body) => builder.force_send_body().send(body),
                        None => builder.call(),
                    }
                }
                HttpMethod::Post | HttpMethod::Put => {
                    let mut builder = if request.method == HttpMethod::Post {
                        self.agent.post(url)
                    } else {
                        self.agent.put(url)
                    };
                    for (key, value) in &request.headers {
                        builder = builder.header(key.as_str(), value.as_str());
                    }
                    match body {
                        Some(body) => builder.send(body),
                        None => builder.send_empty(),
                    }
                }
            };
            let response = result.map_err(TransportError::new)?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = ResponseBody::from_reader(response.into_body().into_reader());

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
