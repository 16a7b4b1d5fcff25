//! Wire contracts: the notification payload, its type-tagged envelope and
//! the MQTT topics the relay speaks on.
//!
//! Destinations decode by the `$type` tag, so field names here are frozen.

use crate::models::Address;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type tag carried by every alarm notification.
pub const ALARM_MESSAGE_TYPE: &str = "AlarmMessage";

/// Notification sent to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub element: String,
    pub parameter: String,
    pub value: String,
    pub severity: String,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum EnvelopeBody {
    #[serde(rename = "AlarmMessage")]
    Alarm(NotificationMessage),
}

/// Self-describing single-object envelope.
///
/// `id` is fresh per envelope so a destination can drop redeliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    #[serde(flatten)]
    pub body: EnvelopeBody,
}

impl Envelope {
    pub fn alarm(message: NotificationMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            body: EnvelopeBody::Alarm(message),
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self.body {
            EnvelopeBody::Alarm(_) => ALARM_MESSAGE_TYPE,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Topic a destination listens on for inter-app messages.
/// Ex: "dataminer/interapp/12/345/9000000"
pub fn interapp_topic(prefix: &str, address: &Address) -> String {
    format!(
        "{}/interapp/{}/{}/{}",
        prefix, address.host_id, address.element_id, address.channel_id
    )
}

/// Raw descriptors published by the orchestration runtime.
pub fn descriptor_topic(prefix: &str) -> String {
    format!("{}/alarms/descriptor@v1", prefix)
}

pub fn directory_request_topic(prefix: &str) -> String {
    format!("{}/directory/request@v1", prefix)
}

pub fn directory_response_topic(prefix: &str) -> String {
    format!("{}/directory/response@v1", prefix)
}

/// Contract name from a topic.
/// Ex: "dataminer/alarms/descriptor@v1" -> "descriptor@v1"
pub fn contract_name(topic: &str) -> &str {
    topic.rsplit('/').next().unwrap_or(topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NotificationMessage {
        NotificationMessage {
            element: "Encoder 01".into(),
            parameter: "Signal Level - 3".into(),
            value: "-71".into(),
            severity: "Critical".into(),
            time: "2024-08-12 10:00:00".into(),
            kind: "Cleared".into(),
        }
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope::alarm(sample());
        let json: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

        assert_eq!(json["$type"], "AlarmMessage");
        assert_eq!(json["id"], envelope.id.to_string());
        assert_eq!(json["element"], "Encoder 01");
        assert_eq!(json["parameter"], "Signal Level - 3");
        assert_eq!(json["value"], "-71");
        assert_eq!(json["severity"], "Critical");
        assert_eq!(json["time"], "2024-08-12 10:00:00");
        assert_eq!(json["type"], "Cleared");
        assert_eq!(json.as_object().unwrap().len(), 8);
    }

    #[test]
    fn test_envelope_decodes_by_tag() {
        let envelope = Envelope::alarm(sample());
        let back: Envelope = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(back, envelope);
        assert_eq!(back.type_tag(), ALARM_MESSAGE_TYPE);
    }

    #[test]
    fn test_fresh_id_per_envelope() {
        assert_ne!(Envelope::alarm(sample()).id, Envelope::alarm(sample()).id);
    }

    #[test]
    fn test_topics() {
        let address = Address { host_id: 12, element_id: 345, channel_id: 9_000_000 };
        assert_eq!(interapp_topic("dataminer", &address), "dataminer/interapp/12/345/9000000");
        assert_eq!(contract_name(&descriptor_topic("dataminer")), "descriptor@v1");
        assert_eq!(contract_name("descriptor@v1"), "descriptor@v1");
        assert_eq!(contract_name(&directory_response_topic("lab")), "response@v1");
    }
}
