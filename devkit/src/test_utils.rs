/*!
Test harness for the alarm relay

Wires an `AlarmPipeline` to a `StaticInventory` and a `MockTransport` so a
test can describe the platform, feed a descriptor and assert on what was
(or was not) submitted.
*/

use crate::inventory::StaticInventory;
use crate::transport_stub::{MockTransport, SentEnvelope};
use alarmrelay_core::{AlarmPipeline, Collaborators, PipelineError, RelayConfig, RunOutcome};
use anyhow::Result;
use std::sync::Arc;

pub struct TestHarness {
    pub inventory: StaticInventory,
    pub transport: MockTransport,
    pub config: RelayConfig,
}

impl TestHarness {
    /// Empty inventory, default config.
    pub fn new() -> Self {
        tracing_subscriber::fmt().with_test_writer().try_init().ok();

        Self {
            inventory: StaticInventory::new(),
            transport: MockTransport::new(),
            config: RelayConfig::default(),
        }
    }

    /// Source element 1/2 running "Generic Encoder" 1.0.0.1 (parameter 3 is
    /// "Temperature") and the default notification sink at 7/8.
    pub fn with_platform() -> Self {
        let mut harness = Self::new();
        let sink = harness.config.destination.clone();
        harness.inventory = harness
            .inventory
            .with_element(1, 2, "Encoder 01", "Generic Encoder", "1.0.0.1")
            .with_parameter("Generic Encoder", "1.0.0.1", 2, "Input Level")
            .with_parameter("Generic Encoder", "1.0.0.1", 3, "Temperature")
            .with_endpoint(&sink.name, &sink.protocol_name, &sink.protocol_version, 7, 8);
        harness
    }

    pub fn pipeline(&self) -> AlarmPipeline {
        let inventory = Arc::new(self.inventory.clone());
        AlarmPipeline::new(
            &self.config,
            Collaborators {
                elements: inventory.clone(),
                catalog: inventory.clone(),
                directory: inventory,
                transport: Arc::new(self.transport.clone()),
            },
        )
    }

    pub async fn run(&self, raw: &str) -> Result<RunOutcome, PipelineError> {
        self.pipeline().run(Some(raw)).await
    }

    /// The single envelope submitted so far; fails on zero or several.
    pub fn single_sent(&self) -> Result<SentEnvelope> {
        let sent = self.transport.sent();
        match sent.as_slice() {
            [only] => Ok(only.clone()),
            other => anyhow::bail!("expected exactly one submission, got {}", other.len()),
        }
    }

    pub fn assert_nothing_sent(&self) -> Result<()> {
        let calls = self.transport.call_count();
        if calls != 0 {
            anyhow::bail!("expected no transport calls, got {}", calls);
        }
        Ok(())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
