//! Per-event handlers
//!
//! Each handler writes the primary row first, then everything that needs
//! its id. A storage error aborts the event at the failing step; nothing
//! after it is written.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::codec::{decode_content, timestamp_to_utc};
use crate::correlation::{Correlation, CorrelationState, RunId};
use crate::error::CaptureError;
use crate::event::{HostEvent, RequestObserved, ResponseObserved, TlsFailure};
use crate::gateway::{
    NewRequest, NewResponse, PersistenceGateway, RequestChild, ResponseChild, RowId,
};
use crate::multivalue::normalize;

/// What an event turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    TlsFailure(RowId),
    Request(RowId),
    Response {
        id: RowId,
        correlation: Correlation,
    },
}

/// Records host events for one active run
pub struct EventProcessor<G> {
    gateway: G,
    correlation: Mutex<CorrelationState>,
}

impl<G: PersistenceGateway> EventProcessor<G> {
    pub fn new(gateway: G, correlation: CorrelationState) -> Self {
        Self {
            gateway,
            correlation: Mutex::new(correlation),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn run_id(&self) -> RunId {
        self.correlation().run_id()
    }

    fn correlation(&self) -> MutexGuard<'_, CorrelationState> {
        self.correlation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch an event to its handler
    pub async fn handle(&self, event: HostEvent) -> Result<Recorded, CaptureError> {
        match event {
            HostEvent::TlsFailedClient(event) => self
                .tls_failed_client(event)
                .await
                .map(Recorded::TlsFailure),
            HostEvent::Request(event) => self.request(event).await.map(Recorded::Request),
            HostEvent::Response(event) => {
                let (id, correlation) = self.response(event).await?;
                Ok(Recorded::Response { id, correlation })
            }
        }
    }

    /// Record a failed client handshake
    pub async fn tls_failed_client(&self, event: TlsFailure) -> Result<RowId, CaptureError> {
        let run = self.run_id();
        self.gateway
            .insert_tls_failure(run, event.server_name_indication, event.connection_error)
            .await
    }

    /// Record a request with its headers and trailers
    pub async fn request(&self, event: RequestObserved) -> Result<RowId, CaptureError> {
        let decoded = event.content.as_deref().and_then(decode_content);
        let new = NewRequest {
            run: self.run_id(),
            start_time: timestamp_to_utc(event.timestamp_start),
            host: Some(event.host),
            port: Some(event.port),
            method: Some(event.method),
            scheme: Some(event.scheme),
            authority: Some(event.authority),
            path: Some(event.path),
            http_version: Some(event.http_version),
            content_raw: event.content,
        };

        let request_id = self.gateway.insert_request(new).await?;
        self.correlation()
            .record_request(event.flow_id.as_ref(), request_id);

        match decoded {
            Some(text) => self.gateway.update_request_content(request_id, text).await?,
            None => debug!("Request {} content is not UTF-8 text", request_id),
        }

        let headers = normalize(event.headers.as_ref());
        if !headers.is_empty() {
            self.gateway
                .insert_request_children(RequestChild::Header, request_id, &headers)
                .await?;
        }

        let trailers = normalize(event.trailers.as_ref());
        if !trailers.is_empty() {
            self.gateway
                .insert_request_children(RequestChild::Trailer, request_id, &trailers)
                .await?;
        }

        Ok(request_id)
    }

    /// Record a response with its headers, trailers and cookies
    pub async fn response(
        &self,
        event: ResponseObserved,
    ) -> Result<(RowId, Correlation), CaptureError> {
        let correlation = self.correlation().parent_of(event.flow_id.as_ref());
        if let (Correlation::Unmatched, Some(flow_id)) = (correlation, event.flow_id.as_ref()) {
            warn!("No recorded request for flow {}, storing response unlinked", flow_id);
        }

        let decoded = event.content.as_deref().and_then(decode_content);
        let new = NewResponse {
            run: self.run_id(),
            request: correlation.request_id(),
            start_time: timestamp_to_utc(event.timestamp_start),
            http_version: Some(event.http_version),
            status_code: event.status_code,
            reason: Some(event.reason),
            content_raw: event.content,
        };

        let response_id = self.gateway.insert_response(new).await?;
        // The pending request stays matchable until its response row exists
        if let (Correlation::Flow(_), Some(flow_id)) = (correlation, event.flow_id.as_ref()) {
            self.correlation().complete(flow_id);
        }

        match decoded {
            Some(text) => {
                self.gateway
                    .update_response_content(response_id, text)
                    .await?
            }
            None => debug!("Response {} content is not UTF-8 text", response_id),
        }

        let children = [
            (ResponseChild::Header, normalize(event.headers.as_ref())),
            (ResponseChild::Trailer, normalize(event.trailers.as_ref())),
            (ResponseChild::Cookie, normalize(event.cookies.as_ref())),
        ];
        for (kind, fields) in children {
            if fields.is_empty() {
                continue;
            }
            self.gateway
                .insert_response_children(kind, response_id, &fields)
                .await?;
        }

        Ok((response_id, correlation))
    }
}
