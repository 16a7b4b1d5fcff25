use crate::contracts::{Envelope, NotificationMessage};
use crate::error::TransportError;
use crate::models::{Address, EndpointRef};
use crate::ports::Transport;
use std::sync::Arc;
use tracing::{error, info};

/// What was submitted, for the caller's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub envelope_id: uuid::Uuid,
    pub address: Address,
}

/// Wraps the message in its envelope and submits it once.
/// Retries belong to the transport, never to this component.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    channel_id: i32,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, channel_id: i32) -> Self {
        Self { transport, channel_id }
    }

    pub async fn dispatch(
        &self,
        message: NotificationMessage,
        destination: EndpointRef,
    ) -> Result<DispatchReceipt, TransportError> {
        let address = Address {
            host_id: destination.host_id,
            element_id: destination.element_id,
            channel_id: self.channel_id,
        };
        let envelope = Envelope::alarm(message);

        match self.transport.send(&envelope, &address).await {
            Ok(()) => {
                info!(envelope = %envelope.id, %address, "alarm notification submitted");
                Ok(DispatchReceipt { envelope_id: envelope.id, address })
            }
            Err(e) => {
                error!(envelope = %envelope.id, %address, "submission failed: {}", e);
                Err(e)
            }
        }
    }
}
