/*!
Mock transport for development without a broker

Records every submitted envelope so tests can assert on exactly what left
the pipeline, and how many times.
*/

use alarmrelay_core::{Address, Envelope, EnvelopeBody, NotificationMessage, Transport, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct SentEnvelope {
    pub address: Address,
    pub envelope: Envelope,
    /// Exactly what would have gone on the wire.
    pub payload: String,
}

impl SentEnvelope {
    pub fn message(&self) -> &NotificationMessage {
        match &self.envelope.body {
            EnvelopeBody::Alarm(message) => message,
        }
    }

    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.payload)
    }
}

/// Transport stand-in. Clones share the same record.
#[derive(Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<SentEnvelope>>>,
    calls: Arc<Mutex<usize>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subsequent submissions fail with `reason`.
    pub fn fail_with<S: Into<String>>(&self, reason: S) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    /// Number of `send` calls, failed ones included.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    /// Successfully submitted envelopes, oldest first.
    pub fn sent(&self) -> Vec<SentEnvelope> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> Option<SentEnvelope> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn sent_to(&self, host_id: i32, element_id: i32) -> Vec<SentEnvelope> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.address.host_id == host_id && s.address.element_id == element_id)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        *self.calls.lock().unwrap() = 0;
        *self.failure.lock().unwrap() = None;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, envelope: &Envelope, address: &Address) -> Result<(), TransportError> {
        *self.calls.lock().unwrap() += 1;

        if let Some(reason) = self.failure.lock().unwrap().clone() {
            tracing::info!("[MOCK] submission to {} rejected: {}", address, reason);
            return Err(TransportError::Submit {
                destination: address.to_string(),
                reason,
            });
        }

        let payload = envelope.to_json()?;
        tracing::info!("[MOCK] submitted to {}: {} bytes", address, payload.len());
        self.sent.lock().unwrap().push(SentEnvelope {
            address: *address,
            envelope: envelope.clone(),
            payload,
        });
        Ok(())
    }
}
