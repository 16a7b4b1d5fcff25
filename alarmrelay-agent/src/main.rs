//! AlarmRelay Agent - MQTT host for the alarm notification pipeline
//!
//! Two ways to run:
//! - `run`: process one descriptor handed over by the orchestration runtime,
//!   then flush and exit
//! - `listen`: stay connected and process every descriptor published on the
//!   descriptor topic, each on its own task

mod directory_bridge;
mod mqtt;

use alarmrelay_core::contracts::{descriptor_topic, directory_response_topic};
use alarmrelay_core::{load_config, AlarmPipeline, Collaborators, RelayConfig, RunOutcome};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directory_bridge::{DirectoryBridge, SharedDirectoryBridge};
use mqtt::{create_mqtt_client, spawn_mqtt_loop, MqttTransport, Routes};
use rumqttc::AsyncClient;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Time left for a queued notification to reach the broker before exit.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "alarmrelay-agent", version, about = "Relay platform alarms to the notification sink")]
struct Cli {
    /// YAML configuration file
    #[arg(long, env = "ALARMRELAY_CONFIG", default_value = "alarmrelay.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process a single descriptor
    Run {
        /// Raw `|`-delimited alarm descriptor
        #[arg(long, env = "ALARMRELAY_DESCRIPTOR")]
        descriptor: Option<String>,
        /// Overrides `run_timeout_secs`
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Process descriptors published on the bus until interrupted
    Listen,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("alarmrelay_core=info,alarmrelay_agent=info")),
        )
        .init();

    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run|Something went wrong: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)
        .await
        .context("Failed to load configuration")?;

    match cli.command {
        Command::Run { descriptor, timeout_secs } => run_once(config, descriptor, timeout_secs).await,
        Command::Listen => listen(config).await,
    }
}

fn build_pipeline(config: &RelayConfig, client: AsyncClient, bridge: SharedDirectoryBridge) -> AlarmPipeline {
    AlarmPipeline::new(
        config,
        Collaborators {
            elements: bridge.clone(),
            catalog: bridge.clone(),
            directory: bridge,
            transport: Arc::new(MqttTransport::new(client, config.topic_prefix.clone())),
        },
    )
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::NoInput => info!("nothing to do"),
        RunOutcome::Unresolved(miss) => info!("no notification sent: {}", miss),
        RunOutcome::Dispatched(receipt) => info!(
            envelope = %receipt.envelope_id,
            destination = %receipt.address,
            "notification dispatched"
        ),
    }
}

async fn run_once(config: RelayConfig, descriptor: Option<String>, timeout_secs: Option<u64>) -> Result<()> {
    let (client, eventloop) = create_mqtt_client(&config, "run");
    let (ready_tx, ready_rx) = watch::channel(false);
    let bridge = Arc::new(DirectoryBridge::new(client.clone(), &config, ready_rx));
    let routes = Routes {
        bridge: bridge.clone(),
        response_topic: directory_response_topic(&config.topic_prefix),
        descriptors: None,
    };
    let bus = spawn_mqtt_loop(client.clone(), eventloop, routes, ready_tx);

    let run_timeout = timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.run_timeout());
    let pipeline = build_pipeline(&config, client.clone(), bridge).with_run_timeout(run_timeout);

    let outcome = pipeline.run(descriptor.as_deref()).await;

    if matches!(outcome, Ok(RunOutcome::Dispatched(_))) {
        flush(&client, bus, FLUSH_TIMEOUT)
            .await
            .context("Notification queued but not delivered to the broker")?;
    } else {
        bus.abort();
    }

    let outcome = outcome.context("Alarm relay run failed")?;
    report(&outcome);
    Ok(())
}

/// Queues a disconnect behind the pending publish and waits for the loop to
/// send it. The loop only ends on an outgoing disconnect, so anything short
/// of that means the publish may still be sitting in the client queue.
async fn flush(client: &AsyncClient, bus: JoinHandle<()>, limit: Duration) -> Result<()> {
    client.disconnect().await.context("Failed to queue MQTT disconnect")?;
    match tokio::time::timeout(limit, bus).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(anyhow::anyhow!("MQTT loop failed: {}", e)),
        Err(_) => {
            warn!("MQTT flush did not complete within {:?}", limit);
            anyhow::bail!("MQTT flush timed out after {:?}", limit)
        }
    }
}

async fn listen(config: RelayConfig) -> Result<()> {
    let (client, eventloop) = create_mqtt_client(&config, "listen");
    let (ready_tx, ready_rx) = watch::channel(false);
    let (descriptor_tx, mut descriptor_rx) = mpsc::unbounded_channel();
    let bridge = Arc::new(DirectoryBridge::new(client.clone(), &config, ready_rx));
    let topic = descriptor_topic(&config.topic_prefix);
    let routes = Routes {
        bridge: bridge.clone(),
        response_topic: directory_response_topic(&config.topic_prefix),
        descriptors: Some((topic.clone(), descriptor_tx)),
    };
    let _bus = spawn_mqtt_loop(client.clone(), eventloop, routes, ready_tx);
    let pipeline = build_pipeline(&config, client.clone(), bridge);

    info!(%topic, "listening for alarm descriptors");
    loop {
        tokio::select! {
            received = descriptor_rx.recv() => {
                let Some(raw) = received else {
                    anyhow::bail!("MQTT loop stopped");
                };
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    match pipeline.run(Some(&raw)).await {
                        Ok(outcome) => report(&outcome),
                        Err(e) => error!("run failed: {}", e),
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    client.disconnect().await.ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_run_arguments() {
        let cli = Cli::try_parse_from([
            "alarmrelay-agent",
            "--config",
            "relay.yaml",
            "run",
            "--descriptor",
            "x|1|2|3||4|5|1|11|6|OK|2024-08-12T10:00:00",
            "--timeout-secs",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("relay.yaml"));
        match cli.command {
            Command::Run { descriptor, timeout_secs } => {
                assert!(descriptor.unwrap().starts_with("x|1|2"));
                assert_eq!(timeout_secs, Some(30));
            }
            Command::Listen => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_listen() {
        let cli = Cli::try_parse_from(["alarmrelay-agent", "listen"]).unwrap();
        assert!(matches!(cli.command, Command::Listen));
    }

    #[tokio::test]
    async fn test_flush_without_broker_fails() {
        let mut config = RelayConfig::default();
        config.mqtt.port = 1;
        let (client, eventloop) = create_mqtt_client(&config, "run");
        let (ready_tx, ready_rx) = watch::channel(false);
        let bridge = Arc::new(DirectoryBridge::new(client.clone(), &config, ready_rx));
        let routes = Routes {
            bridge,
            response_topic: directory_response_topic(&config.topic_prefix),
            descriptors: None,
        };
        let bus = spawn_mqtt_loop(client.clone(), eventloop, routes, ready_tx);

        let err = flush(&client, bus, Duration::from_millis(200)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_run_without_descriptor_is_noop() {
        let mut config = RelayConfig::default();
        config.mqtt.port = 1;
        run_once(config, None, Some(1)).await.unwrap();
    }
}
