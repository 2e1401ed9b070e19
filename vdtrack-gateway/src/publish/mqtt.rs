use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::MqttConfig;

use super::LocationPublisher;

/// Publisher backed by an MQTT broker.
///
/// [`connect`] hands back the publisher together with its event loop; the
/// caller spawns [`run_event_loop`] and keeps it alive for as long as
/// publishing should work.
///
/// [`connect`]: MqttPublisher::connect
/// [`run_event_loop`]: MqttPublisher::run_event_loop
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    pub fn connect(config: &MqttConfig) -> (Self, EventLoop) {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(30));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 16);

        (Self { client }, event_loop)
    }

    /// Drives the MQTT connection until cancelled. Connection errors are
    /// retried after a short pause; rumqttc reconnects on the next poll.
    pub async fn run_event_loop(mut event_loop: EventLoop, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = event_loop.poll() => match event {
                    Ok(event) => debug!(?event, "mqtt event"),
                    Err(e) => {
                        warn!(error = ?e, "mqtt connection error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                },
            }
        }
    }
}

#[async_trait]
impl LocationPublisher for MqttPublisher {
    type Error = rumqttc::ClientError;

    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
    }
}
