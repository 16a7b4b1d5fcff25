/**
 * DIRECTORY BRIDGE - lookup services over MQTT request/response
 *
 * ROLE:
 * Implements the three lookup ports (element identity, protocol metadata,
 * endpoint discovery) by publishing requests to the platform's directory
 * service and waiting for the correlated response.
 *
 * OPERATION:
 * - Each request carries a fresh request_id
 * - A oneshot sender waits in `pending` under that id
 * - The MQTT event loop hands every response to `handle_response`
 * - No answer within the lookup timeout -> LookupError::Timeout
 */

use alarmrelay_core::contracts::directory_request_topic;
use alarmrelay_core::{
    ElementIdentity, ElementResolver, Endpoint, EndpointDirectory, EndpointFilter, LookupError,
    ParameterInfo, ProtocolCatalog, ProtocolRef, RelayConfig,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rumqttc::{AsyncClient, QoS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

/// Requests sent to the directory service.
#[derive(Debug, Serialize)]
#[serde(tag = "action")]
pub enum DirectoryRequest {
    #[serde(rename = "resolve_element")]
    ResolveElement {
        request_id: String,
        host_id: i32,
        element_id: i32,
    },
    #[serde(rename = "protocol_parameters")]
    ProtocolParameters {
        request_id: String,
        protocol: String,
        version: String,
    },
    #[serde(rename = "find_elements")]
    FindElements {
        request_id: String,
        filter: EndpointFilter,
    },
}

/// Responses from the directory service.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum DirectoryResponse {
    #[serde(rename = "success")]
    Success { request_id: String, data: Value },
    #[serde(rename = "error")]
    Error { request_id: String, error: String },
}

impl DirectoryResponse {
    fn request_id(&self) -> &str {
        match self {
            DirectoryResponse::Success { request_id, .. } => request_id,
            DirectoryResponse::Error { request_id, .. } => request_id,
        }
    }
}

type PendingRequests = Arc<Mutex<HashMap<String, oneshot::Sender<DirectoryResponse>>>>;

/// Drops the pending entry however the request ends, caller cancellation included.
struct PendingGuard<'a> {
    pending: &'a PendingRequests,
    request_id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(self.request_id);
    }
}

pub struct DirectoryBridge {
    mqtt_client: AsyncClient,
    request_topic: String,
    lookup_timeout: Duration,
    version_prefix: String,
    /// Flips to true once the response topic is subscribed.
    ready: watch::Receiver<bool>,
    pending_requests: PendingRequests,
}

pub type SharedDirectoryBridge = Arc<DirectoryBridge>;

impl DirectoryBridge {
    pub fn new(mqtt_client: AsyncClient, config: &RelayConfig, ready: watch::Receiver<bool>) -> Self {
        Self {
            mqtt_client,
            request_topic: directory_request_topic(&config.topic_prefix),
            lookup_timeout: config.lookup_timeout(),
            version_prefix: config.protocol_version_prefix.clone(),
            ready,
            pending_requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Routes a raw response payload to whoever is waiting for it.
    pub fn handle_response(&self, payload: &[u8]) {
        let response: DirectoryResponse = match serde_json::from_slice(payload) {
            Ok(response) => response,
            Err(e) => {
                warn!("invalid directory response: {}", e);
                return;
            }
        };

        let request_id = response.request_id().to_string();
        match self.pending_requests.lock().remove(&request_id) {
            Some(sender) => {
                if sender.send(response).is_err() {
                    debug!(%request_id, "requester gone before response arrived");
                }
            }
            None => warn!(%request_id, "response for unknown request"),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending_requests.lock().len()
    }

    async fn request<T: DeserializeOwned>(
        &self,
        service: &'static str,
        build: impl FnOnce(String) -> DirectoryRequest,
    ) -> Result<T, LookupError> {
        let mut ready = self.ready.clone();
        let bus_ready = async move { ready.wait_for(|r| *r).await.map(|_| ()) };
        match timeout(self.lookup_timeout, bus_ready).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                return Err(LookupError::Unavailable {
                    service,
                    reason: "message bus stopped".into(),
                })
            }
            Err(_) => {
                return Err(LookupError::Timeout { service, timeout: self.lookup_timeout })
            }
        }

        let request_id = Uuid::new_v4().to_string();
        let command = build(request_id.clone());
        let payload = serde_json::to_string(&command).map_err(|e| LookupError::Unavailable {
            service,
            reason: format!("cannot encode request: {}", e),
        })?;

        let (tx, rx) = oneshot::channel();
        self.pending_requests.lock().insert(request_id.clone(), tx);
        let _pending = PendingGuard { pending: &self.pending_requests, request_id: &request_id };

        if let Err(e) = self
            .mqtt_client
            .publish(self.request_topic.as_str(), QoS::AtLeastOnce, false, payload)
            .await
        {
            return Err(LookupError::Unavailable { service, reason: e.to_string() });
        }
        debug!(%request_id, service, "directory request published");

        let response = match timeout(self.lookup_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(LookupError::Unavailable {
                    service,
                    reason: "response channel closed".into(),
                })
            }
            Err(_) => return Err(LookupError::Timeout { service, timeout: self.lookup_timeout }),
        };

        match response {
            DirectoryResponse::Success { data, .. } => serde_json::from_value(data)
                .map_err(|source| LookupError::InvalidResponse { service, source }),
            DirectoryResponse::Error { error, .. } => Err(LookupError::Rejected { service, reason: error }),
        }
    }
}

#[async_trait]
impl ElementResolver for DirectoryBridge {
    async fn resolve(&self, host_id: i32, element_id: i32) -> Result<Option<ElementIdentity>, LookupError> {
        self.request("elements", |request_id| DirectoryRequest::ResolveElement {
            request_id,
            host_id,
            element_id,
        })
        .await
    }
}

#[async_trait]
impl ProtocolCatalog for DirectoryBridge {
    async fn parameters(&self, protocol: &ProtocolRef) -> Result<Vec<ParameterInfo>, LookupError> {
        let version = format!("{}{}", self.version_prefix, protocol.version);
        self.request("protocols", |request_id| DirectoryRequest::ProtocolParameters {
            request_id,
            protocol: protocol.name.clone(),
            version,
        })
        .await
    }
}

#[async_trait]
impl EndpointDirectory for DirectoryBridge {
    async fn find(&self, filter: &EndpointFilter) -> Result<Vec<Endpoint>, LookupError> {
        self.request("directory", |request_id| DirectoryRequest::FindElements {
            request_id,
            filter: filter.clone(),
        })
        .await
    }
}
