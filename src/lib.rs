//! Distributed trace context propagation.
//!
//! This crate implements the trace-context protocol that links
//! transactions across process boundaries: one transaction mints a
//! portable [`TracePayload`] describing its place in a call chain, a
//! downstream transaction accepts that payload to join the same trip, and
//! the resulting linkage and sampling decision are projected into the
//! [`TraceIntrinsics`] attached to reported events.
//!
//! # Core Concepts
//!
//! Every instrumented transaction owns one [`TraceContext`], created at
//! transaction start and discarded with it. The context enforces the
//! at-most-once payload protocol, fuses upstream sampling intent with the
//! local [`SamplingSource`], and resolves the trip identity, including
//! the one-time takeover of lineage recorded from the predecessor
//! cross-process protocol ([`LegacyLineage`]).
//!
//! Contexts are never shared between transactions; the only state that
//! crosses a process or thread boundary is the serialized payload, which
//! is immutable after construction. Payloads travel in a compact
//! structured encoding ([`TracePayload::to_vec`]) or, where only ASCII
//! header values are permitted, a transport-safe text form
//! ([`TracePayload::to_http_safe`]).
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use distributed_trace::{TraceContext, TraceOptions, TransportType};
//!
//! let options = Arc::new(TraceOptions {
//!     application_id: "46954".into(),
//!     cross_process_id: "190#222".into(),
//!     ..Default::default()
//! });
//!
//! // caller side: mint a payload and send it along with the request
//! let mut caller = TraceContext::new(Arc::clone(&options));
//! let header = caller
//!     .create_payload()?
//!     .expect("tracing is enabled")
//!     .to_http_safe()?;
//!
//! // receiver side: accept the payload to join the caller's trip
//! let mut receiver = TraceContext::new(options);
//! receiver.accept_http_safe(&header, TransportType::Http)?;
//! assert_eq!(receiver.trip_id(), caller.trip_id());
//! # Ok::<(), distributed_trace::Error>(())
//! ```

#![warn(missing_docs)]

mod context;
mod error;
mod guid;
mod intrinsics;
mod options;
mod payload;
mod sampling;
mod utils;

pub use crate::context::{LegacyLineage, LinkState, TraceContext};
pub use crate::error::Error;
pub use crate::guid::Guid;
pub use crate::intrinsics::TraceIntrinsics;
pub use crate::options::TraceOptions;
pub use crate::payload::{
    CallerType, ParseTransportTypeError, ProtocolVersion, TracePayload, TransportType,
};
pub use crate::sampling::{FixedSampler, RateSampler, SamplingSource};
