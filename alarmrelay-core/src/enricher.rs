//! Metadata enrichment.
//!
//! The element lookup has to come first (it yields the protocol identity).
//! Parameter metadata and destination discovery are independent of each
//! other and run concurrently.

use crate::error::LookupError;
use crate::models::{DecodedEvent, EndpointFilter, EnrichedEvent, ParameterInfo};
use crate::ports::{ElementResolver, EndpointDirectory, ProtocolCatalog};
use std::sync::Arc;
use tracing::{debug, info};

/// A well-formed event referencing something that is not there right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    SourceElement { host_id: i32, element_id: i32 },
    Destination { name: String },
}

impl std::fmt::Display for Miss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Miss::SourceElement { host_id, element_id } => {
                write!(f, "source element {}/{} not found", host_id, element_id)
            }
            Miss::Destination { name } => write!(f, "no destination element named {:?} found", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    Ready(EnrichedEvent),
    Missing(Miss),
}

#[derive(Clone)]
pub struct MetadataEnricher {
    elements: Arc<dyn ElementResolver>,
    catalog: Arc<dyn ProtocolCatalog>,
    directory: Arc<dyn EndpointDirectory>,
    destination: EndpointFilter,
}

impl MetadataEnricher {
    pub fn new(
        elements: Arc<dyn ElementResolver>,
        catalog: Arc<dyn ProtocolCatalog>,
        directory: Arc<dyn EndpointDirectory>,
        destination: EndpointFilter,
    ) -> Self {
        Self { elements, catalog, directory, destination }
    }

    pub async fn enrich(&self, event: DecodedEvent) -> Result<Enrichment, LookupError> {
        let Some(element) = self
            .elements
            .resolve(event.source_host_id, event.source_element_id)
            .await?
        else {
            let miss = Miss::SourceElement {
                host_id: event.source_host_id,
                element_id: event.source_element_id,
            };
            info!("{}", miss);
            return Ok(Enrichment::Missing(miss));
        };

        let protocol = element.protocol();
        let (parameters, endpoints) = tokio::join!(
            self.catalog.parameters(&protocol),
            self.directory.find(&self.destination),
        );
        let (parameters, endpoints) = (parameters?, endpoints?);

        let Some(endpoint) = endpoints.into_iter().next() else {
            let miss = Miss::Destination { name: self.destination.name.clone() };
            info!("{}", miss);
            return Ok(Enrichment::Missing(miss));
        };

        let parameter_name = parameter_description(&parameters, event.parameter_id);
        if parameter_name.is_none() {
            debug!(
                protocol = %protocol.name,
                version = %protocol.version,
                parameter_id = event.parameter_id,
                "protocol exposes no such parameter"
            );
        }

        Ok(Enrichment::Ready(EnrichedEvent {
            event,
            element_name: element.name,
            parameter_name,
            destination: endpoint.reference(),
        }))
    }
}

/// First entry with a matching id, in definition order.
fn parameter_description(parameters: &[ParameterInfo], id: i32) -> Option<String> {
    parameters
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.description.clone())
}
