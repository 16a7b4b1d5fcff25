/*!
In-memory inventory standing in for the platform's lookup services

One `StaticInventory` answers all three lookups: element identity, protocol
parameter lists and endpoint discovery. Calls are counted per service and
an artificial latency or outage can be injected.
*/

use alarmrelay_core::{
    ElementIdentity, ElementResolver, Endpoint, EndpointDirectory, EndpointFilter, LookupError,
    ParameterInfo, ProtocolCatalog, ProtocolRef,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
struct RegisteredEndpoint {
    endpoint: Endpoint,
    protocol_name: String,
    protocol_version: String,
}

#[derive(Default)]
struct State {
    elements: HashMap<(i32, i32), ElementIdentity>,
    protocols: HashMap<ProtocolRef, Vec<ParameterInfo>>,
    endpoints: Vec<RegisteredEndpoint>,
    calls: HashMap<&'static str, usize>,
    outage: Option<&'static str>,
    latency: Option<Duration>,
}

/// Clones share the same inventory.
#[derive(Clone, Default)]
pub struct StaticInventory {
    state: Arc<Mutex<State>>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(self, host_id: i32, element_id: i32, name: &str, protocol: &str, version: &str) -> Self {
        self.state.lock().unwrap().elements.insert(
            (host_id, element_id),
            ElementIdentity {
                name: name.into(),
                protocol_name: protocol.into(),
                protocol_version: version.into(),
            },
        );
        self
    }

    /// Appends to the protocol's parameter list, preserving definition order.
    pub fn with_parameter(self, protocol: &str, version: &str, id: i32, description: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .protocols
            .entry(ProtocolRef { name: protocol.into(), version: version.into() })
            .or_default()
            .push(ParameterInfo { id, description: description.into() });
        self
    }

    pub fn with_endpoint(
        self,
        name: &str,
        protocol: &str,
        version: &str,
        host_id: i32,
        element_id: i32,
    ) -> Self {
        self.state.lock().unwrap().endpoints.push(RegisteredEndpoint {
            endpoint: Endpoint { name: name.into(), host_id, element_id },
            protocol_name: protocol.into(),
            protocol_version: version.into(),
        });
        self
    }

    /// Every lookup sleeps this long before answering.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().latency = Some(latency);
        self
    }

    /// Lookups against `service` ("elements", "protocols" or "directory") fail.
    pub fn with_outage(self, service: &'static str) -> Self {
        self.state.lock().unwrap().outage = Some(service);
        self
    }

    pub fn calls(&self, service: &str) -> usize {
        self.state.lock().unwrap().calls.get(service).copied().unwrap_or(0)
    }

    async fn enter(&self, service: &'static str) -> Result<(), LookupError> {
        let (latency, outage) = {
            let mut state = self.state.lock().unwrap();
            *state.calls.entry(service).or_insert(0) += 1;
            (state.latency, state.outage)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if outage == Some(service) {
            return Err(LookupError::Unavailable {
                service,
                reason: "simulated outage".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ElementResolver for StaticInventory {
    async fn resolve(&self, host_id: i32, element_id: i32) -> Result<Option<ElementIdentity>, LookupError> {
        self.enter("elements").await?;
        Ok(self.state.lock().unwrap().elements.get(&(host_id, element_id)).cloned())
    }
}

#[async_trait]
impl ProtocolCatalog for StaticInventory {
    async fn parameters(&self, protocol: &ProtocolRef) -> Result<Vec<ParameterInfo>, LookupError> {
        self.enter("protocols").await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .protocols
            .get(protocol)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl EndpointDirectory for StaticInventory {
    async fn find(&self, filter: &EndpointFilter) -> Result<Vec<Endpoint>, LookupError> {
        self.enter("directory").await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .endpoints
            .iter()
            .filter(|e| {
                e.endpoint.name == filter.name
                    && e.protocol_name == filter.protocol_name
                    && e.protocol_version == filter.protocol_version
            })
            .map(|e| e.endpoint.clone())
            .collect())
    }
}
