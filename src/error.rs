use thiserror::Error;

use crate::payload::ProtocolVersion;

/// Raised if a trace payload cannot be decoded or applied to a
/// transaction.
///
/// All variants are recoverable at the acceptance boundary: the owning
/// transaction continues without distributed-trace linkage rather than
/// aborting.
#[derive(Debug, Error)]
pub enum Error {
    /// The payload bytes are not valid structured data, or a required
    /// field is missing or has the wrong shape.
    #[error("malformed trace payload")]
    MalformedPayload(#[source] serde_json::Error),
    /// The portable text form is not a valid base64 encoding.
    #[error("malformed portable text encoding")]
    MalformedText(#[source] base64::DecodeError),
    /// A required payload field is absent.
    #[error("missing required payload field `{0}`")]
    MissingField(&'static str),
    /// The payload's major protocol version is newer than this
    /// implementation supports.
    #[error("unsupported trace payload version {0}")]
    UnsupportedVersion(ProtocolVersion),
    /// The owning transaction already finished; its trace context is
    /// read-only.
    #[error("transaction already finished")]
    TransactionClosed,
    /// The payload could not be serialized. This does not occur for
    /// well-formed in-memory state.
    #[error("trace payload could not be serialized")]
    Encode(#[source] serde_json::Error),
}
