//! Whop webhook event types.
//!
//! Whop delivers events as `{"type": "...", "data": {...}}` where the shape
//! of `data` depends on the event type. Only the envelope is typed here; the
//! handlers pick the fields they need out of the raw `data` value.

use serde::{Deserialize, Serialize};

/// Whop webhook event envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhopEvent {
    /// Type of event (e.g. "payment.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event-specific payload (polymorphic based on event type).
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WhopEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> WhopEventType {
        WhopEventType::from_tag(&self.event_type)
    }
}

/// Known Whop event types that we handle.
///
/// The dispatcher matches totally over this enum; anything Whop adds in the
/// future lands in `Unknown` and is acknowledged without processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhopEventType {
    /// User successfully subscribed to a plan.
    MembershipWentValid,
    /// Subscription is now active (fired instead of went_valid in some cases).
    MembershipActivated,
    /// User saved a card without being charged.
    SetupIntentSucceeded,
    /// A payment completed.
    PaymentSucceeded,
    /// A payment failed.
    PaymentFailed,
    /// Unknown or unhandled event type.
    Unknown,
}

impl WhopEventType {
    /// Parse an event type from its wire tag.
    pub fn from_tag(s: &str) -> Self {
        match s {
            "membership.went_valid" => Self::MembershipWentValid,
            "membership.activated" => Self::MembershipActivated,
            "setup_intent.succeeded" => Self::SetupIntentSucceeded,
            "payment.succeeded" => Self::PaymentSucceeded,
            "payment.failed" => Self::PaymentFailed,
            _ => Self::Unknown,
        }
    }

    /// Convert to the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MembershipWentValid => "membership.went_valid",
            Self::MembershipActivated => "membership.activated",
            Self::SetupIntentSucceeded => "setup_intent.succeeded",
            Self::PaymentSucceeded => "payment.succeeded",
            Self::PaymentFailed => "payment.failed",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_event_envelope() {
        let json = r#"{"type":"payment.succeeded","data":{"id":"pay_123","total":10.5}}"#;

        let event: WhopEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.event_type, "payment.succeeded");
        assert_eq!(event.data["id"], "pay_123");
    }

    #[test]
    fn deserialize_event_without_data_defaults_to_null() {
        let event: WhopEvent = serde_json::from_str(r#"{"type":"payment.failed"}"#).unwrap();

        assert_eq!(event.parsed_type(), WhopEventType::PaymentFailed);
        assert!(event.data.is_null());
    }

    #[test]
    fn event_type_from_tag_known_types() {
        assert_eq!(
            WhopEventType::from_tag("membership.went_valid"),
            WhopEventType::MembershipWentValid
        );
        assert_eq!(
            WhopEventType::from_tag("membership.activated"),
            WhopEventType::MembershipActivated
        );
        assert_eq!(
            WhopEventType::from_tag("setup_intent.succeeded"),
            WhopEventType::SetupIntentSucceeded
        );
        assert_eq!(
            WhopEventType::from_tag("payment.succeeded"),
            WhopEventType::PaymentSucceeded
        );
        assert_eq!(
            WhopEventType::from_tag("payment.failed"),
            WhopEventType::PaymentFailed
        );
    }

    #[test]
    fn event_type_from_tag_unknown() {
        assert_eq!(
            WhopEventType::from_tag("dispute.created"),
            WhopEventType::Unknown
        );
    }

    #[test]
    fn event_type_tag_roundtrip() {
        let types = [
            WhopEventType::MembershipWentValid,
            WhopEventType::MembershipActivated,
            WhopEventType::SetupIntentSucceeded,
            WhopEventType::PaymentSucceeded,
            WhopEventType::PaymentFailed,
        ];

        for event_type in types {
            assert_eq!(WhopEventType::from_tag(event_type.as_str()), event_type);
        }
    }

    #[test]
    fn parsed_type_reads_envelope_tag() {
        let event = WhopEvent {
            event_type: "setup_intent.succeeded".to_string(),
            data: json!({}),
        };

        assert_eq!(event.parsed_type(), WhopEventType::SetupIntentSucceeded);
    }
}
