//! HTTP delivery of encoded requests.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::encode::EncodedRequest;
use crate::{Error, Result};

/// Status and body returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Non-2xx statuses are returned as data, not errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &EncodedRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(allow_insecure_tls: bool) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("hipchat_notify/{}", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(allow_insecure_tls)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &EncodedRequest) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::Transport(format!("Invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(url = %request.url, bytes = request.body.len(), "Sending notification");
        let response = builder.body(request.body.clone()).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let response = HttpResponse { status, body };

        if !response.is_success() {
            warn!(status, "Notification endpoint returned an error status");
        }

        Ok(response)
    }
}
