//! Per-transaction trace context state.

use std::sync::Arc;

use crate::error::Error;
use crate::guid::Guid;
use crate::options::TraceOptions;
use crate::payload::{CallerType, ProtocolVersion, TracePayload, TransportType};
use crate::utils;

/// Protocol position of a [`TraceContext`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LinkState {
    /// No payload has been created or accepted yet.
    Fresh,
    /// The transaction minted its own payload without accepting one; it
    /// is the origin of its trip.
    Originated,
    /// The transaction accepted one inbound payload and is linked into an
    /// existing trip.
    Linked,
    /// The transaction finished; the context is read-only.
    Closed,
}

/// Lineage recorded from the predecessor cross-process protocol.
///
/// Present only when the legacy header was parsed before any distributed
/// trace payload was created or accepted on the transaction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LegacyLineage {
    /// Guid of the referring transaction.
    pub referring_guid: Guid,
    /// Trip identifier carried by the legacy header, if any.
    pub referring_trip_id: Option<Guid>,
    /// Whether the referrer asked for the transaction to be recorded.
    pub record_transaction: bool,
}

/// Per-transaction holder of distributed tracing state.
///
/// A context is owned by exactly one in-flight transaction: it is created
/// at transaction start, never shared across transactions, and discarded
/// at finalization. It enforces the at-most-once payload protocol: one
/// outbound payload may be created and one inbound payload accepted over
/// the context's lifetime, and repeated calls return the already-produced
/// value unchanged.
///
/// Cross-transaction communication happens only through the serialized
/// [`TracePayload`], which is immutable after construction.
#[derive(Debug)]
pub struct TraceContext {
    options: Arc<TraceOptions>,
    guid: Guid,
    trip_id: Guid,
    state: LinkState,
    inbound: Option<TracePayload>,
    created: Option<TracePayload>,
    sampled: Option<bool>,
    legacy: Option<LegacyLineage>,
}

impl TraceContext {
    /// Creates a context for a newly started transaction, assigning it a
    /// random guid.
    pub fn new(options: Arc<TraceOptions>) -> Self {
        Self::with_guid(options, Guid::new())
    }

    /// Creates a context for a transaction whose guid was assigned by the
    /// caller.
    pub fn with_guid(options: Arc<TraceOptions>, guid: Guid) -> Self {
        Self {
            options,
            guid,
            trip_id: guid,
            state: LinkState::Fresh,
            inbound: None,
            created: None,
            sampled: None,
            legacy: None,
        }
    }

    /// The owning transaction's guid.
    pub fn guid(&self) -> Guid {
        self.guid
    }

    /// The guid of the transaction that originated the trip this
    /// transaction belongs to.
    ///
    /// Equal to [`guid`](Self::guid) while the transaction is the trip
    /// origin; redirected by an accepted payload or a legacy lineage.
    pub fn trip_id(&self) -> Guid {
        self.trip_id
    }

    /// The context's current protocol position.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The accepted inbound payload, if any.
    pub fn inbound_payload(&self) -> Option<&TracePayload> {
        self.inbound.as_ref()
    }

    /// The payload this transaction minted, if any.
    pub fn created_payload(&self) -> Option<&TracePayload> {
        self.created.as_ref()
    }

    /// The recorded legacy lineage, if any.
    pub fn legacy_lineage(&self) -> Option<&LegacyLineage> {
        self.legacy.as_ref()
    }

    /// The sampling decision, if it has been resolved yet.
    ///
    /// Unlike [`sampled`](Self::sampled) this never consults the sampling
    /// source.
    pub fn sampled_decision(&self) -> Option<bool> {
        self.sampled
    }

    /// The transaction's sampling decision.
    ///
    /// Resolved at most once per transaction: an accepted upstream intent
    /// wins; otherwise the configured sampling source is consulted on
    /// first read and the answer is cached for the remainder of the
    /// transaction's life.
    pub fn sampled(&mut self) -> bool {
        if let Some(sampled) = self.sampled {
            return sampled;
        }
        let decision = self.options.sampler.decide();
        self.sampled = Some(decision);
        decision
    }

    /// Records lineage from the predecessor cross-process protocol.
    ///
    /// Honored only while the context is [`LinkState::Fresh`]; once a
    /// payload has been created or accepted the call is ignored. A legacy
    /// trip identifier takes over the context's trip identity until a
    /// distributed payload is minted.
    pub fn set_legacy_lineage(&mut self, lineage: LegacyLineage) {
        if self.state != LinkState::Fresh {
            log::debug!("ignoring legacy lineage on {:?} trace context", self.state);
            return;
        }
        if let Some(trip_id) = lineage.referring_trip_id {
            self.trip_id = trip_id;
        }
        self.legacy = Some(lineage);
    }

    /// Accepts an inbound payload in its canonical structured form.
    ///
    /// Valid once, before any payload has been created: the context links
    /// itself into the sender's trip, stamps the payload's transport from
    /// the receiver-observed `transport` argument and adopts a non-null
    /// upstream sampling intent. Returns `Ok(None)` when distributed
    /// tracing is disabled or when the call is ignored because a payload
    /// was already created; returns the previously accepted payload when
    /// called twice.
    ///
    /// A decode failure leaves the context untouched in
    /// [`LinkState::Fresh`], so the owning transaction proceeds without
    /// lineage.
    pub fn accept_payload(
        &mut self,
        bytes: &[u8],
        transport: TransportType,
    ) -> Result<Option<&TracePayload>, Error> {
        self.accept_with(|| TracePayload::from_slice(bytes), transport)
    }

    /// Accepts an inbound payload in its transport-safe text form.
    ///
    /// Same contract as [`accept_payload`](Self::accept_payload).
    pub fn accept_http_safe(
        &mut self,
        text: &str,
        transport: TransportType,
    ) -> Result<Option<&TracePayload>, Error> {
        self.accept_with(|| TracePayload::from_http_safe(text), transport)
    }

    fn accept_with<F>(
        &mut self,
        decode: F,
        transport: TransportType,
    ) -> Result<Option<&TracePayload>, Error>
    where
        F: FnOnce() -> Result<TracePayload, Error>,
    {
        if !self.options.enabled {
            return Ok(None);
        }
        match self.state {
            LinkState::Closed => return Err(Error::TransactionClosed),
            LinkState::Linked => {
                log::debug!("trace context already linked, keeping existing inbound payload");
                return Ok(self.inbound.as_ref());
            }
            LinkState::Originated => {
                log::debug!("ignoring inbound trace payload after outbound payload was created");
                return Ok(None);
            }
            LinkState::Fresh => {}
        }

        let mut payload = match decode() {
            Ok(payload) => payload,
            Err(err) => {
                log::debug!("dropping inbound trace payload: {}", err);
                return Err(err);
            }
        };

        // transport is a receiver-observed fact; never trust the sender
        payload.caller_transport_type = Some(transport);

        self.trip_id = payload.trip_id;
        if payload.sampled.is_some() {
            // upstream intent wins over any previously resolved decision
            self.sampled = payload.sampled;
        }
        self.state = LinkState::Linked;
        self.inbound = Some(payload);
        Ok(self.inbound.as_ref())
    }

    /// Mints the outbound payload describing this transaction's place in
    /// the trace.
    ///
    /// At most one payload is created per transaction; repeated calls
    /// return the memoized payload unchanged, timestamp included. When a
    /// legacy lineage was recorded and no payload has been accepted, the
    /// trip identity reverts to this transaction's own guid: distributed
    /// tracing identity supersedes legacy identity once a payload is
    /// minted. Returns `Ok(None)` when distributed tracing is disabled.
    ///
    /// Reading the sampling decision here resolves it as a side effect.
    pub fn create_payload(&mut self) -> Result<Option<&TracePayload>, Error> {
        if !self.options.enabled {
            return Ok(None);
        }
        if self.state == LinkState::Closed {
            return Err(Error::TransactionClosed);
        }
        if self.created.is_none() {
            if self.state == LinkState::Fresh {
                if self.legacy.is_some() {
                    self.trip_id = self.guid;
                }
                self.state = LinkState::Originated;
            }
            let sampled = self.sampled();
            let payload = TracePayload {
                version: ProtocolVersion::CURRENT,
                caller_type: CallerType::App,
                caller_app_id: self.options.application_id.clone(),
                caller_account_id: self.options.account_id().to_owned(),
                caller_transport_type: None,
                id: self.guid,
                trip_id: self.trip_id,
                parent_id: self.inbound.as_ref().map(|payload| payload.id),
                sampled: Some(sampled),
                timestamp: utils::now_millis(),
            };
            self.created = Some(payload);
        }
        Ok(self.created.as_ref())
    }

    /// Marks the owning transaction as finished.
    ///
    /// The sampling decision is pinned so reporting sees a definite value;
    /// afterwards the context is read-only, and further payload creation
    /// or acceptance fails with [`Error::TransactionClosed`].
    pub fn finish(&mut self) {
        self.sampled();
        self.state = LinkState::Closed;
    }
}
