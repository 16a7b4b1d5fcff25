use crate::directory_bridge::SharedDirectoryBridge;
use alarmrelay_core::contracts::{contract_name, interapp_topic};
use alarmrelay_core::{Address, Envelope, RelayConfig, Transport, TransportError};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, Outgoing, QoS};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Each process gets its own client id so concurrent one-shot runs do not
/// kick each other off the broker.
pub fn create_mqtt_client(config: &RelayConfig, role: &str) -> (AsyncClient, EventLoop) {
    let client_id = format!("{}-{}-{}", config.mqtt.client_id, role, Uuid::new_v4().simple());
    let mut opts = MqttOptions::new(client_id, &config.mqtt.host, config.mqtt.port);
    opts.set_keep_alive(Duration::from_secs(config.mqtt.keep_alive_secs));
    opts.set_clean_session(true);
    AsyncClient::new(opts, 64)
}

/// Publishes envelopes on the destination's inter-app topic, QoS 1.
pub struct MqttTransport {
    mqtt_client: AsyncClient,
    topic_prefix: String,
}

impl MqttTransport {
    pub fn new(mqtt_client: AsyncClient, topic_prefix: impl Into<String>) -> Self {
        Self { mqtt_client, topic_prefix: topic_prefix.into() }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn send(&self, envelope: &Envelope, address: &Address) -> Result<(), TransportError> {
        let topic = interapp_topic(&self.topic_prefix, address);
        let payload = envelope.to_json()?;
        self.mqtt_client
            .publish(topic.as_str(), QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| TransportError::Submit {
                destination: topic.clone(),
                reason: e.to_string(),
            })?;
        debug!(%topic, tag = envelope.type_tag(), "envelope queued");
        Ok(())
    }
}

/// Where incoming publishes go.
pub struct Routes {
    pub bridge: SharedDirectoryBridge,
    pub response_topic: String,
    /// Descriptor topic and its consumer, in listen mode only.
    pub descriptors: Option<(String, mpsc::UnboundedSender<String>)>,
}

impl Routes {
    fn subscriptions(&self) -> Vec<String> {
        let mut topics = vec![self.response_topic.clone()];
        if let Some((topic, _)) = &self.descriptors {
            topics.push(topic.clone());
        }
        topics
    }

    fn route(&self, topic: &str, payload: &[u8]) {
        if topic == self.response_topic {
            self.bridge.handle_response(payload);
            return;
        }
        match &self.descriptors {
            Some((descriptor_topic, tx)) if topic == descriptor_topic => {
                match String::from_utf8(payload.to_vec()) {
                    Ok(raw) => {
                        if tx.send(raw).is_err() {
                            warn!("descriptor consumer gone, dropping message");
                        }
                    }
                    Err(_) => warn!("[{}] payload is not UTF-8, ignored", contract_name(topic)),
                }
            }
            _ => debug!(%topic, "unrouted publish"),
        }
    }
}

/// Drives the MQTT connection until a disconnect goes out.
///
/// Subscriptions are (re)issued on every ConnAck since sessions are clean;
/// `ready` flips to true once the broker acknowledges them.
pub fn spawn_mqtt_loop(
    mqtt_client: AsyncClient,
    mut eventloop: EventLoop,
    routes: Routes,
    ready: watch::Sender<bool>,
) -> JoinHandle<()> {
    task::spawn(async move {
        let topics = routes.subscriptions();
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("connected to MQTT broker");
                    for topic in &topics {
                        if let Err(e) = mqtt_client.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
                            error!(%topic, "subscribe MQTT failed: {:?}", e);
                        }
                    }
                }
                Ok(Event::Incoming(Incoming::SubAck(_))) => {
                    ready.send_replace(true);
                }
                Ok(Event::Incoming(Incoming::Publish(p))) => routes.route(&p.topic, &p.payload),
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    debug!("MQTT disconnect sent");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    ready.send_replace(false);
                    warn!("MQTT error: {:?}", e);
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory_bridge::DirectoryBridge;
    use std::sync::Arc;

    fn routes(with_descriptors: bool) -> (Routes, Option<mpsc::UnboundedReceiver<String>>, EventLoop) {
        let config = RelayConfig::default();
        let (client, eventloop) = create_mqtt_client(&config, "test");
        let (_ready_tx, ready_rx) = watch::channel(true);
        let bridge = Arc::new(DirectoryBridge::new(client, &config, ready_rx));
        let (descriptors, rx) = if with_descriptors {
            let (tx, rx) = mpsc::unbounded_channel();
            (Some(("dataminer/alarms/descriptor@v1".to_string(), tx)), Some(rx))
        } else {
            (None, None)
        };
        let routes = Routes {
            bridge,
            response_topic: "dataminer/directory/response@v1".into(),
            descriptors,
        };
        (routes, rx, eventloop)
    }

    #[test]
    fn test_subscriptions_per_mode() {
        let (run_routes, _, _el) = routes(false);
        assert_eq!(run_routes.subscriptions(), vec!["dataminer/directory/response@v1"]);

        let (listen_routes, _, _el) = routes(true);
        assert_eq!(listen_routes.subscriptions().len(), 2);
    }

    #[test]
    fn test_descriptor_routed_to_consumer() {
        let (routes, rx, _el) = routes(true);
        let mut rx = rx.unwrap();

        routes.route("dataminer/alarms/descriptor@v1", b"x|1|2");
        routes.route("dataminer/alarms/descriptor@v1", &[0xff, 0xfe]);
        routes.route("elsewhere", b"ignored");

        assert_eq!(rx.try_recv().unwrap(), "x|1|2");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_client_ids_are_unique() {
        let config = RelayConfig::default();
        let (_a, el_a) = create_mqtt_client(&config, "run");
        let (_b, el_b) = create_mqtt_client(&config, "run");
        assert_ne!(el_a.mqtt_options.client_id(), el_b.mqtt_options.client_id());
        assert!(el_a.mqtt_options.client_id().starts_with("alarmrelay-agent-run-"));
    }

    #[tokio::test]
    async fn test_transport_publishes_once() {
        let config = RelayConfig::default();
        let (client, _eventloop) = create_mqtt_client(&config, "test");
        let transport = MqttTransport::new(client, "dataminer");
        let envelope = Envelope::alarm(alarmrelay_core::NotificationMessage {
            element: "Encoder 01".into(),
            parameter: "Temperature".into(),
            value: "81".into(),
            severity: "Major".into(),
            time: "2024-08-12 10:00:00".into(),
            kind: "Open".into(),
        });

        transport
            .send(&envelope, &Address { host_id: 7, element_id: 8, channel_id: 9_000_000 })
            .await
            .unwrap();
    }
}
