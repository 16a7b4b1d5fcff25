use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Typed view of one raw descriptor. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub source_host_id: i32,
    pub source_element_id: i32,
    pub parameter_id: i32,
    /// Table row / instance key, kept only when non-blank.
    pub parameter_instance: Option<String>,
    pub severity_label: String,
    pub type_label: String,
    pub alarm_value: String,
    pub alarm_time: NaiveDateTime,
}

/// Protocol identity of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolRef {
    pub name: String,
    pub version: String,
}

/// What the element-identity resolver knows about a source element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementIdentity {
    pub name: String,
    pub protocol_name: String,
    pub protocol_version: String,
}

impl ElementIdentity {
    pub fn protocol(&self) -> ProtocolRef {
        ProtocolRef {
            name: self.protocol_name.clone(),
            version: self.protocol_version.clone(),
        }
    }
}

/// One entry of a protocol's parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub id: i32,
    pub description: String,
}

/// Filter used to discover the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointFilter {
    pub name: String,
    pub protocol_name: String,
    pub protocol_version: String,
}

/// Addressable destination, identified by host/element coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointRef {
    pub host_id: i32,
    pub element_id: i32,
}

/// Discovery result entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub host_id: i32,
    pub element_id: i32,
}

impl Endpoint {
    pub fn reference(&self) -> EndpointRef {
        EndpointRef {
            host_id: self.host_id,
            element_id: self.element_id,
        }
    }
}

/// Decoded event plus everything resolved from the lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedEvent {
    pub event: DecodedEvent,
    pub element_name: String,
    /// Empty when the protocol exposes no parameter with that id.
    pub parameter_name: Option<String>,
    pub destination: EndpointRef,
}

/// Full transport address: destination coordinates plus inbound channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub host_id: i32,
    pub element_id: i32,
    pub channel_id: i32,
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.host_id, self.element_id, self.channel_id)
    }
}
