//! Decode -> enrich -> build -> dispatch, one event per run.
//!
//! A run owns everything it produces; nothing mutable is shared between
//! runs, so independent descriptors can be processed concurrently on clones
//! of the same pipeline.

use crate::config::RelayConfig;
use crate::decoder::EventDecoder;
use crate::dispatcher::{DispatchReceipt, Dispatcher};
use crate::enricher::{Enrichment, MetadataEnricher, Miss};
use crate::error::PipelineError;
use crate::notification::NotificationBuilder;
use crate::ports::{ElementResolver, EndpointDirectory, ProtocolCatalog, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything the pipeline reaches outside itself.
#[derive(Clone)]
pub struct Collaborators {
    pub elements: Arc<dyn ElementResolver>,
    pub catalog: Arc<dyn ProtocolCatalog>,
    pub directory: Arc<dyn EndpointDirectory>,
    pub transport: Arc<dyn Transport>,
}

/// How a run completed without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Parameter absent, or not a delimited descriptor.
    NoInput,
    /// Well-formed event referencing an entity that is not known right now.
    Unresolved(Miss),
    Dispatched(DispatchReceipt),
}

#[derive(Clone)]
pub struct AlarmPipeline {
    decoder: EventDecoder,
    enricher: MetadataEnricher,
    builder: NotificationBuilder,
    dispatcher: Dispatcher,
    run_timeout: Duration,
}

impl AlarmPipeline {
    pub fn new(config: &RelayConfig, collaborators: Collaborators) -> Self {
        Self {
            decoder: EventDecoder::new(config.timestamp_formats.clone()),
            enricher: MetadataEnricher::new(
                collaborators.elements,
                collaborators.catalog,
                collaborators.directory,
                config.destination.clone(),
            ),
            builder: NotificationBuilder::new(config.time_format.clone()),
            dispatcher: Dispatcher::new(collaborators.transport, config.channel_id),
            run_timeout: config.run_timeout(),
        }
    }

    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    /// Runs one event. The whole run, lookups and submission included, is
    /// bounded by the run timeout; the dispatcher is called at most once.
    pub async fn run(&self, input: Option<&str>) -> Result<RunOutcome, PipelineError> {
        let Some(raw) = input else {
            debug!("no descriptor supplied");
            return Ok(RunOutcome::NoInput);
        };

        match tokio::time::timeout(self.run_timeout, self.process(raw)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.run_timeout, "run timed out");
                Err(PipelineError::Timeout(self.run_timeout))
            }
        }
    }

    async fn process(&self, raw: &str) -> Result<RunOutcome, PipelineError> {
        let event = match self.decoder.decode(raw) {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!("input is not a delimited descriptor");
                return Ok(RunOutcome::NoInput);
            }
            Err(e) => {
                warn!("rejecting descriptor: {}", e);
                return Err(e.into());
            }
        };
        debug!(
            host = event.source_host_id,
            element = event.source_element_id,
            parameter = event.parameter_id,
            severity = %event.severity_label,
            "descriptor decoded"
        );

        let enriched = match self.enricher.enrich(event).await? {
            Enrichment::Ready(enriched) => enriched,
            Enrichment::Missing(miss) => return Ok(RunOutcome::Unresolved(miss)),
        };

        let message = self.builder.build(&enriched);
        let receipt = self.dispatcher.dispatch(message, enriched.destination).await?;
        Ok(RunOutcome::Dispatched(receipt))
    }
}
