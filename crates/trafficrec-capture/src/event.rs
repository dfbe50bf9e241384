//! Event payloads delivered by the host proxy
//!
//! The host emits one event per hook invocation. Over the ingest channel
//! they arrive as JSON objects tagged by `"event"`.

use serde::Deserialize;
use std::fmt;

use crate::multivalue::MultiValue;

/// Host-assigned identifier of one flow (a request and its response)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub String);

impl FlowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A client TLS handshake failed before any HTTP request was seen
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TlsFailure {
    #[serde(default)]
    pub flow_id: Option<FlowId>,
    /// Error reported by the TLS layer
    #[serde(default)]
    pub connection_error: Option<String>,
    #[serde(default)]
    pub server_name_indication: Option<String>,
}

/// An HTTP request was fully read by the proxy
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestObserved {
    #[serde(default)]
    pub flow_id: Option<FlowId>,
    /// Seconds since the Unix epoch
    pub timestamp_start: f64,
    /// Host the request is addressed to, taking the Host header into account
    pub host: String,
    pub port: u16,
    pub method: String,
    pub scheme: String,
    #[serde(default)]
    pub authority: String,
    pub path: String,
    pub http_version: String,
    #[serde(
        default,
        rename = "content_b64",
        deserialize_with = "crate::codec::base64_bytes_opt"
    )]
    pub content: Option<Vec<u8>>,
    #[serde(default)]
    pub headers: Option<MultiValue>,
    #[serde(default)]
    pub trailers: Option<MultiValue>,
}

/// An HTTP response was fully read by the proxy
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseObserved {
    #[serde(default)]
    pub flow_id: Option<FlowId>,
    pub timestamp_start: f64,
    pub http_version: String,
    pub status_code: u16,
    #[serde(default)]
    pub reason: String,
    #[serde(
        default,
        rename = "content_b64",
        deserialize_with = "crate::codec::base64_bytes_opt"
    )]
    pub content: Option<Vec<u8>>,
    #[serde(default)]
    pub headers: Option<MultiValue>,
    #[serde(default)]
    pub trailers: Option<MultiValue>,
    #[serde(default)]
    pub cookies: Option<MultiValue>,
}

/// Any event the pipeline accepts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    TlsFailedClient(TlsFailure),
    Request(RequestObserved),
    Response(ResponseObserved),
}

impl HostEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TlsFailedClient(_) => "tls_failed_client",
            Self::Request(_) => "request",
            Self::Response(_) => "response",
        }
    }

    pub fn flow_id(&self) -> Option<&FlowId> {
        match self {
            Self::TlsFailedClient(event) => event.flow_id.as_ref(),
            Self::Request(event) => event.flow_id.as_ref(),
            Self::Response(event) => event.flow_id.as_ref(),
        }
    }
}
