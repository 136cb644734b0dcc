use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::MqttConfig;
use crate::error::{Error, Result};
use super::Transport;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Publishing half of a broker connection.
#[derive(Clone)]
pub struct MqttBus {
    client: AsyncClient,
}

/// Network half: must be polled for anything to move.
pub struct MqttEvents {
    eventloop: EventLoop,
    client: AsyncClient,
}

impl MqttBus {
    /// Build the client. No I/O happens until [`MqttEvents::run`] is polled.
    pub fn connect(config: &MqttConfig) -> (MqttBus, MqttEvents) {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
        let (client, eventloop) = AsyncClient::new(options, config.request_capacity.max(1));
        info!(host = %config.host, port = config.port, "mqtt client created");
        (MqttBus { client: client.clone() }, MqttEvents { eventloop, client })
    }

    /// Queue a disconnect, waiting at most `grace` for room in the request
    /// queue. A queue that stays full (broker unreachable) is an error.
    pub async fn disconnect(&self, grace: Duration) -> Result<()> {
        match tokio::time::timeout(grace, self.client.disconnect()).await {
            Ok(sent) => sent.map_err(|e| Error::Transport(e.to_string())),
            Err(_) => Err(Error::Transport(format!(
                "disconnect not queued within {} ms",
                grace.as_millis()
            ))),
        }
    }
}

impl Transport for MqttBus {
    fn publish(&self, topic: &str, payload: String) -> Result<()> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.into_bytes())
            .map_err(|e| Error::Transport(e.to_string()))
    }

    fn name(&self) -> &str {
        "mqtt"
    }
}

impl MqttEvents {
    /// Drive the connection until `shutdown` flips to true or a disconnect
    /// requested through [`MqttBus::disconnect`] has gone out.
    ///
    /// Subscriptions are (re)issued on every ConnAck, so they survive a
    /// reconnect. Incoming publishes go to `on_message`.
    pub async fn run<F>(
        mut self,
        subscriptions: Vec<String>,
        mut on_message: F,
        mut shutdown: watch::Receiver<bool>,
    ) where
        F: FnMut(&str, &[u8]),
    {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = self.eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("mqtt connected");
                        for topic in &subscriptions {
                            if let Err(e) = self.client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
                                warn!(%topic, error = %e, "subscribe failed");
                            }
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(p))) => on_message(&p.topic, &p.payload),
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(other) => debug!(?other, "mqtt event"),
                    Err(e) => {
                        warn!(error = %e, "mqtt connection error, retrying");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                },
            }
        }
        debug!("mqtt event loop stopped");
    }
}
