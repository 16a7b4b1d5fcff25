/*!
Collaborator ports.

The pipeline never talks to the platform directly: element identity,
protocol metadata, endpoint discovery and the message transport are all
reached through these traits. The agent implements them over MQTT, the
devkit implements them in memory.
*/

use crate::contracts::Envelope;
use crate::error::{LookupError, TransportError};
use crate::models::{Address, ElementIdentity, Endpoint, EndpointFilter, ParameterInfo, ProtocolRef};
use async_trait::async_trait;

/// Resolves `(host, element)` coordinates to the element's name and protocol.
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// `Ok(None)` means "no such element", a normal outcome.
    async fn resolve(&self, host_id: i32, element_id: i32) -> Result<Option<ElementIdentity>, LookupError>;
}

/// Protocol metadata service.
#[async_trait]
pub trait ProtocolCatalog: Send + Sync {
    /// Parameters of a protocol version, in definition order.
    async fn parameters(&self, protocol: &ProtocolRef) -> Result<Vec<ParameterInfo>, LookupError>;
}

/// Endpoint discovery service.
#[async_trait]
pub trait EndpointDirectory: Send + Sync {
    async fn find(&self, filter: &EndpointFilter) -> Result<Vec<Endpoint>, LookupError>;
}

/// Message transport. At-least-once delivery is its job, not the caller's.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: &Envelope, address: &Address) -> Result<(), TransportError>;
}
