//! Projection of trace state onto reportable event attributes.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::TraceContext;
use crate::guid::Guid;
use crate::payload::{CallerType, TransportType};

/// Intrinsic attributes derived from a transaction's trace context.
///
/// One projection is attached to each reporting destination (transaction
/// events and error events) at transaction finalization; both destinations
/// share the identical derivation. The serialized keys are wire-compatible
/// (downstream consumers key off these literal strings), and optional
/// attributes that are absent are not emitted at all, so consumers never
/// see a present-but-empty value.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TraceIntrinsics {
    /// The transaction's own guid.
    #[serde(rename = "nr.guid")]
    pub guid: Guid,
    /// The guid of the trip origin.
    #[serde(rename = "nr.tripId")]
    pub trip_id: Guid,
    /// The resolved sampling decision.
    #[serde(rename = "nr.sampled")]
    pub sampled: bool,
    /// The guid of the direct parent transaction.
    #[serde(rename = "nr.parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Guid>,
    /// The guid of the grandparent transaction.
    #[serde(rename = "nr.grandparentId", skip_serializing_if = "Option::is_none")]
    pub grandparent_id: Option<Guid>,
    /// The guid of the referring transaction, from the inbound payload or
    /// the legacy lineage.
    #[serde(
        rename = "nr.referringTransactionGuid",
        skip_serializing_if = "Option::is_none"
    )]
    pub referring_transaction_guid: Option<Guid>,
    /// The caller's role, copied from the inbound payload.
    #[serde(rename = "caller.type", skip_serializing_if = "Option::is_none")]
    pub caller_type: Option<CallerType>,
    /// The transport the inbound payload arrived over.
    #[serde(rename = "caller.transportType", skip_serializing_if = "Option::is_none")]
    pub caller_transport_type: Option<TransportType>,
    /// The caller's application identifier.
    #[serde(rename = "caller.app", skip_serializing_if = "Option::is_none")]
    pub caller_app: Option<String>,
    /// The caller's account identifier.
    #[serde(rename = "caller.account", skip_serializing_if = "Option::is_none")]
    pub caller_account: Option<String>,
}

impl TraceIntrinsics {
    /// Renders the attributes into an open key/value map, omitting absent
    /// attributes entirely.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl TraceContext {
    /// Projects the context onto the intrinsic attributes attached to
    /// reported events.
    ///
    /// Invoked at transaction finalization, once per destination. Reading
    /// the sampling state fixes it, which is why this takes the context
    /// mutably; a context that went through [`finish`](Self::finish) has
    /// the decision pinned already.
    pub fn intrinsics(&mut self) -> TraceIntrinsics {
        let sampled = self.sampled();
        let inbound = self.inbound_payload();
        TraceIntrinsics {
            guid: self.guid(),
            trip_id: self.trip_id(),
            sampled,
            parent_id: inbound.map(|payload| payload.id),
            grandparent_id: inbound.and_then(|payload| payload.parent_id),
            referring_transaction_guid: inbound
                .map(|payload| payload.id)
                .or_else(|| self.legacy_lineage().map(|legacy| legacy.referring_guid)),
            caller_type: inbound.map(|payload| payload.caller_type),
            caller_transport_type: inbound.and_then(|payload| payload.caller_transport_type),
            caller_app: inbound.map(|payload| payload.caller_app_id.clone()),
            caller_account: inbound.map(|payload| payload.caller_account_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use super::*;
    use crate::context::LegacyLineage;
    use crate::options::TraceOptions;
    use crate::sampling::FixedSampler;

    fn options(sampled: bool) -> Arc<TraceOptions> {
        Arc::new(TraceOptions {
            application_id: "46954".into(),
            cross_process_id: "190#222".into(),
            sampler: Arc::new(FixedSampler(sampled)),
            ..Default::default()
        })
    }

    #[test]
    fn origin_transaction_omits_lineage_attributes() {
        let mut context = TraceContext::new(options(true));
        context.create_payload().unwrap();
        context.finish();

        let intrinsics = context.intrinsics();
        assert_eq!(intrinsics.guid, context.guid());
        assert_eq!(intrinsics.trip_id, context.guid());
        assert!(intrinsics.sampled);
        assert_eq!(intrinsics.parent_id, None);
        assert_eq!(intrinsics.grandparent_id, None);
        assert_eq!(intrinsics.referring_transaction_guid, None);
        assert_eq!(intrinsics.caller_type, None);

        let map = intrinsics.to_map();
        assert!(!map.contains_key("nr.parentId"));
        assert!(!map.contains_key("nr.grandparentId"));
        assert!(!map.contains_key("nr.referringTransactionGuid"));
        assert!(!map.contains_key("caller.type"));
        assert!(!map.contains_key("caller.transportType"));
        assert!(!map.contains_key("caller.app"));
        assert!(!map.contains_key("caller.account"));
    }

    #[test]
    fn linked_transaction_reports_caller_attributes() {
        let mut origin = TraceContext::new(options(true));
        let bytes = origin.create_payload().unwrap().unwrap().to_vec().unwrap();

        let mut downstream = TraceContext::new(options(false));
        downstream
            .accept_payload(&bytes, TransportType::Http)
            .unwrap();
        downstream.finish();

        let intrinsics = downstream.intrinsics();
        assert_eq!(intrinsics.guid, downstream.guid());
        assert_eq!(intrinsics.trip_id, origin.guid());
        assert!(intrinsics.sampled);
        assert_eq!(intrinsics.parent_id, Some(origin.guid()));
        assert_eq!(intrinsics.grandparent_id, None);
        assert_eq!(intrinsics.referring_transaction_guid, Some(origin.guid()));
        assert_eq!(intrinsics.caller_type, Some(CallerType::App));
        assert_eq!(
            intrinsics.caller_transport_type,
            Some(TransportType::Http)
        );
        assert_eq!(intrinsics.caller_app.as_deref(), Some("46954"));
        assert_eq!(intrinsics.caller_account.as_deref(), Some("190"));
    }

    #[test]
    fn serializes_wire_compatible_keys() {
        let mut origin = TraceContext::new(options(true));
        let bytes = origin.create_payload().unwrap().unwrap().to_vec().unwrap();

        let mut downstream = TraceContext::new(options(true));
        downstream
            .accept_payload(&bytes, TransportType::Http)
            .unwrap();
        downstream.finish();

        let map = downstream.intrinsics().to_map();
        assert_eq!(map["nr.guid"], downstream.guid().to_string());
        assert_eq!(map["nr.tripId"], origin.guid().to_string());
        assert_eq!(map["nr.sampled"], true);
        assert_eq!(map["nr.parentId"], origin.guid().to_string());
        assert_eq!(
            map["nr.referringTransactionGuid"],
            origin.guid().to_string()
        );
        assert_eq!(map["caller.type"], "App");
        assert_eq!(map["caller.transportType"], "HTTP");
        assert_eq!(map["caller.app"], "46954");
        assert_eq!(map["caller.account"], "190");
    }

    #[test]
    fn legacy_lineage_supplies_referring_guid() {
        let referring = Guid::from_str("b854df4feb2b1f06").unwrap();
        let mut context = TraceContext::new(options(true));
        context.set_legacy_lineage(LegacyLineage {
            referring_guid: referring,
            referring_trip_id: None,
            record_transaction: false,
        });
        context.finish();

        let intrinsics = context.intrinsics();
        assert_eq!(intrinsics.referring_transaction_guid, Some(referring));
        assert_eq!(intrinsics.parent_id, None);
        assert_eq!(intrinsics.caller_type, None);
    }

    #[test]
    fn sampled_is_reported_without_any_payload() {
        let mut context = TraceContext::new(options(false));
        context.finish();
        let intrinsics = context.intrinsics();
        assert!(!intrinsics.sampled);
        assert_eq!(intrinsics.to_map()["nr.sampled"], false);
    }

    #[test]
    fn upstream_false_decision_is_reported() {
        let mut origin = TraceContext::new(options(false));
        let bytes = origin.create_payload().unwrap().unwrap().to_vec().unwrap();

        let mut downstream = TraceContext::new(options(true));
        downstream
            .accept_payload(&bytes, TransportType::Http)
            .unwrap();
        downstream.finish();

        assert!(!downstream.intrinsics().sampled);
    }
}
