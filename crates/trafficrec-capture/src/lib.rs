//! Capture-correlate-persist pipeline for intercepted proxy traffic
//!
//! The host proxy reports three kinds of events: a client TLS handshake
//! failed, a request was observed, a response was observed. This crate
//! turns each of them into rows of the capture schema in
//! [`trafficrec_db`], scoped to one run.
//!
//! # Usage
//!
//! ```ignore
//! use trafficrec_capture::{LifecycleController, SeaOrmGateway};
//!
//! let db = trafficrec_db::connect("sqlite::memory:").await?;
//! let mut lifecycle = LifecycleController::new();
//! lifecycle.load(SeaOrmGateway::new(db), "42")?;
//!
//! let processor = lifecycle.running()?;
//! processor.handle(event).await?;
//!
//! lifecycle.done();
//! ```

pub mod codec;
pub mod config;
pub mod correlation;
pub mod error;
pub mod event;
pub mod gateway;
pub mod ingest;
pub mod lifecycle;
pub mod multivalue;
pub mod processor;

pub use config::StoreConfig;
pub use correlation::{Correlation, CorrelationState, RunId};
pub use error::{CaptureError, ConfigError};
pub use event::{FlowId, HostEvent, RequestObserved, ResponseObserved, TlsFailure};
pub use gateway::{
    NewRequest, NewResponse, PersistenceGateway, RequestChild, ResponseChild, RowId,
    SeaOrmGateway,
};
pub use ingest::{drain_events, IngestStats};
pub use lifecycle::{LifecycleController, LifecycleState};
pub use multivalue::{normalize, Field, FieldEntry, FieldMap, MultiValue};
pub use processor::{EventProcessor, Recorded};
