use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, Uri};
use hyper_rustls::HttpsConnector;
use std::time::Duration;
use tokio::time::timeout;

use crate::errors::{FetchError, NetworkError, ProviderError};

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// One outbound GET. Implementations report timeouts and connection
/// failures as [`NetworkError`] so the pipeline can retry them.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<TransportResponse, FetchError>;
}

pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>>,
    request_timeout: Duration,
}

impl HyperTransport {
    pub fn new(request_timeout: Duration) -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build();
        Self {
            client: Client::builder().build(https),
            request_timeout,
        }
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<TransportResponse, FetchError> {
        let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| ProviderError::InvalidUri {
            uri: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut builder = Request::get(uri);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let req = builder
            .body(Body::empty())
            .map_err(|e| ProviderError::InvalidUri {
                uri: url.to_string(),
                reason: e.to_string(),
            })?;

        let response = match timeout(self.request_timeout, self.client.request(req)).await {
            Ok(result) => result.map_err(|e| NetworkError::Connection(e.to_string()))?,
            Err(_) => return Err(NetworkError::Timeout.into()),
        };

        let (parts, body) = response.into_parts();
        let body = match timeout(self.request_timeout, hyper::body::to_bytes(body)).await {
            Ok(result) => result.map_err(|e| NetworkError::Connection(e.to_string()))?,
            Err(_) => return Err(NetworkError::Timeout.into()),
        };

        Ok(TransportResponse {
            status: parts.status,
            body,
        })
    }
}
