//! The portable trace-context token and its wire encodings.

use std::fmt;
use std::str;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;
use crate::guid::Guid;

/// Protocol version of the payload encoding, as a `(major, minor)` pair.
///
/// Encoded as a two-element array on the wire. Receivers reject payloads
/// whose major component is newer than [`ProtocolVersion::CURRENT`];
/// differing minor components are accepted.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(pub u16, pub u16);

impl ProtocolVersion {
    /// The version this implementation speaks.
    pub const CURRENT: ProtocolVersion = ProtocolVersion(0, 0);

    /// The major component.
    pub fn major(self) -> u16 {
        self.0
    }

    /// The minor component.
    pub fn minor(self) -> u16 {
        self.1
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}.{}", self.0, self.1)
    }
}

/// The role of the entity that created a payload.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum CallerType {
    /// A monitored application.
    #[default]
    #[serde(rename = "App")]
    App,
}

impl fmt::Display for CallerType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerType::App => write!(fmt, "App"),
        }
    }
}

/// Raised if a transport type cannot be parsed from a string.
#[derive(Debug, Error)]
#[error("invalid transport type")]
pub struct ParseTransportTypeError;

/// The transport medium over which a payload reached the receiver.
///
/// Stamped by the receiving side from its own observation; a value encoded
/// by the sender is discarded on acceptance.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum TransportType {
    /// The transport could not be determined.
    #[default]
    #[serde(rename = "Unknown")]
    Unknown,
    /// Plain HTTP.
    #[serde(rename = "HTTP")]
    Http,
    /// HTTP over TLS.
    #[serde(rename = "HTTPS")]
    Https,
    /// A Kafka topic.
    #[serde(rename = "Kafka")]
    Kafka,
    /// A JMS queue or topic.
    #[serde(rename = "JMS")]
    Jms,
    /// An AMQP broker.
    #[serde(rename = "AMQP")]
    Amqp,
    /// An unspecified message queue.
    #[serde(rename = "Queue")]
    Queue,
    /// Any other transport.
    #[serde(rename = "Other")]
    Other,
}

impl TransportType {
    fn as_str(self) -> &'static str {
        match self {
            TransportType::Unknown => "Unknown",
            TransportType::Http => "HTTP",
            TransportType::Https => "HTTPS",
            TransportType::Kafka => "Kafka",
            TransportType::Jms => "JMS",
            TransportType::Amqp => "AMQP",
            TransportType::Queue => "Queue",
            TransportType::Other => "Other",
        }
    }
}

impl str::FromStr for TransportType {
    type Err = ParseTransportTypeError;

    fn from_str(s: &str) -> Result<TransportType, Self::Err> {
        Ok(match s {
            "Unknown" => TransportType::Unknown,
            "HTTP" => TransportType::Http,
            "HTTPS" => TransportType::Https,
            "Kafka" => TransportType::Kafka,
            "JMS" => TransportType::Jms,
            "AMQP" => TransportType::Amqp,
            "Queue" => TransportType::Queue,
            "Other" => TransportType::Other,
            _ => return Err(ParseTransportTypeError),
        })
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

/// A portable trace-context token.
///
/// Carries the identity, lineage, sampling intent and timing of one hop in
/// a distributed trace. A payload is immutable once constructed and is the
/// only state that crosses process boundaries, which makes it safe to hand
/// across threads after construction.
///
/// The chain invariant: `id` is always the creating transaction's own
/// guid, and `parent_id` is a copy of the `id` of whatever payload the
/// creator itself accepted (`None` at the trip origin). Each hop's
/// `parent_id` therefore equals the previous hop's `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePayload {
    /// Protocol version of the encoding.
    pub version: ProtocolVersion,
    /// Role of the originating entity.
    pub caller_type: CallerType,
    /// Identifier of the originating application.
    pub caller_app_id: String,
    /// Identifier of the originating account.
    pub caller_account_id: String,
    /// Transport medium the payload arrived over, as observed by the
    /// receiver. `None` on freshly minted payloads.
    pub caller_transport_type: Option<TransportType>,
    /// Guid of the transaction that created this payload.
    pub id: Guid,
    /// Guid of the transaction that originated the whole trace; constant
    /// across every hop.
    pub trip_id: Guid,
    /// The `id` the creator itself received when it accepted an inbound
    /// payload; `None` if the creator is the trip origin.
    pub parent_id: Option<Guid>,
    /// Upstream sampling intent; `None` defers to the receiver.
    pub sampled: Option<bool>,
    /// Creation time, in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

mod wire {
    use serde::{Deserialize, Serialize};

    use super::{CallerType, ProtocolVersion, TransportType};
    use crate::guid::Guid;

    #[derive(Serialize, Deserialize)]
    pub struct Envelope {
        pub v: ProtocolVersion,
        pub d: Data,
    }

    #[derive(Serialize, Deserialize)]
    pub struct Data {
        #[serde(default)]
        pub ty: CallerType,
        #[serde(default)]
        pub ac: String,
        #[serde(default)]
        pub ap: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub tp: Option<TransportType>,
        pub id: Guid,
        pub tr: Guid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub pa: Option<Guid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub sa: Option<bool>,
        #[serde(default)]
        pub ti: u64,
    }
}

impl From<&TracePayload> for wire::Envelope {
    fn from(payload: &TracePayload) -> Self {
        wire::Envelope {
            v: payload.version,
            d: wire::Data {
                ty: payload.caller_type,
                ac: payload.caller_account_id.clone(),
                ap: payload.caller_app_id.clone(),
                tp: payload.caller_transport_type,
                id: payload.id,
                tr: payload.trip_id,
                pa: payload.parent_id,
                sa: payload.sampled,
                ti: payload.timestamp,
            },
        }
    }
}

impl From<wire::Envelope> for TracePayload {
    fn from(envelope: wire::Envelope) -> Self {
        TracePayload {
            version: envelope.v,
            caller_type: envelope.d.ty,
            caller_app_id: envelope.d.ap,
            caller_account_id: envelope.d.ac,
            caller_transport_type: envelope.d.tp,
            id: envelope.d.id,
            trip_id: envelope.d.tr,
            parent_id: envelope.d.pa,
            sampled: envelope.d.sa,
            timestamp: envelope.d.ti,
        }
    }
}

impl TracePayload {
    /// Serializes the payload into its canonical structured form.
    pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(&wire::Envelope::from(self)).map_err(Error::Encode)
    }

    /// Deserializes a payload from its canonical structured form.
    ///
    /// Fails with [`Error::MalformedPayload`] on unparseable bytes or
    /// missing required fields, and with [`Error::UnsupportedVersion`] if
    /// the payload's major version is newer than
    /// [`ProtocolVersion::CURRENT`]. The version is probed before the body
    /// is decoded, so a newer-major payload is rejected as unsupported
    /// even if its body shape changed.
    pub fn from_slice(bytes: &[u8]) -> Result<TracePayload, Error> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(Error::MalformedPayload)?;

        let version: ProtocolVersion = match value.get("v") {
            Some(v) => serde_json::from_value(v.clone()).map_err(Error::MalformedPayload)?,
            None => return Err(Error::MissingField("v")),
        };
        if version.major() > ProtocolVersion::CURRENT.major() {
            return Err(Error::UnsupportedVersion(version));
        }

        let envelope: wire::Envelope =
            serde_json::from_value(value).map_err(Error::MalformedPayload)?;
        Ok(envelope.into())
    }

    /// Encodes the payload into a transport-safe ASCII text form, suitable
    /// for a single HTTP-header-like field.
    pub fn to_http_safe(&self) -> Result<String, Error> {
        Ok(BASE64.encode(self.to_vec()?))
    }

    /// Decodes a payload from the text form produced by
    /// [`to_http_safe`](Self::to_http_safe).
    ///
    /// Surrounding ASCII whitespace is tolerated, as header values are
    /// routinely trimmed in transit.
    pub fn from_http_safe(text: &str) -> Result<TracePayload, Error> {
        let bytes = BASE64.decode(text.trim()).map_err(Error::MalformedText)?;
        Self::from_slice(&bytes)
    }
}
