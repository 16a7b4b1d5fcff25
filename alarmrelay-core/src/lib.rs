//! AlarmRelay core - alarm descriptor to notification pipeline
//!
//! Turns the platform's `|`-delimited alarm descriptor into a typed event,
//! enriches it with the source element's parameter name and the notification
//! sink's coordinates, and submits one type-tagged message to that sink.
//!
//! Every external system (element identity, protocol metadata, endpoint
//! discovery, transport) sits behind a trait in [`ports`].

pub mod codes;
pub mod config;
pub mod contracts;
pub mod decoder;
pub mod dispatcher;
pub mod enricher;
pub mod error;
pub mod models;
pub mod notification;
pub mod pipeline;
pub mod ports;

pub use config::{load_config, RelayConfig};
pub use contracts::{Envelope, EnvelopeBody, NotificationMessage};
pub use decoder::EventDecoder;
pub use dispatcher::{DispatchReceipt, Dispatcher};
pub use enricher::{Enrichment, MetadataEnricher, Miss};
pub use error::{ConfigError, DecodeError, LookupError, PipelineError, TransportError};
pub use models::{
    Address, DecodedEvent, ElementIdentity, Endpoint, EndpointFilter, EndpointRef, EnrichedEvent,
    ParameterInfo, ProtocolRef,
};
pub use notification::NotificationBuilder;
pub use pipeline::{AlarmPipeline, Collaborators, RunOutcome};
pub use ports::{ElementResolver, EndpointDirectory, ProtocolCatalog, Transport};
