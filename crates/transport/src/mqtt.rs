// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MQTT transport over the synchronous `rumqttc` client.

use crate::{ConnectOptions, Inbound, QoS, Transport, TransportError};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

fn to_rumqttc(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

struct Inner {
    client: Client,
    connection: Connection,
    connected: bool,
}

/// [`Transport`] backed by a real MQTT session.
///
/// The rumqttc event loop runs on its own thread; this adapter only ever
/// polls it non-blockingly from [`Transport::drain`], so the runtime's
/// cooperative scheduling is preserved.
#[derive(Default)]
pub struct MqttTransport {
    inner: Option<Inner>,
}

impl MqttTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for MqttTransport {
    fn connect(&mut self, opts: &ConnectOptions) -> Result<(), TransportError> {
        let mut mqtt_opts = MqttOptions::new(&opts.client_id, &opts.host, opts.port);
        mqtt_opts.set_keep_alive(Duration::from_secs(30));
        if let (Some(user), Some(pass)) = (&opts.username, &opts.password) {
            mqtt_opts.set_credentials(user, pass);
        }
        if let Some(will) = &opts.last_will {
            mqtt_opts.set_last_will(rumqttc::LastWill::new(
                &will.topic,
                will.payload.clone(),
                to_rumqttc(will.qos),
                will.retained,
            ));
        }

        let (client, mut connection) = Client::new(mqtt_opts, 64);

        // Block until the broker acknowledges the session or the timeout
        // elapses; rumqttc would otherwise retry in the background forever.
        let deadline = Instant::now() + Duration::from_millis(opts.timeout_ms);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::ConnectFailed("connect timed out".into()));
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(_)))) => break,
                Ok(Ok(event)) => debug!(?event, "pre-connack event"),
                Ok(Err(e)) => return Err(TransportError::ConnectFailed(e.to_string())),
                Err(_) => {
                    return Err(TransportError::ConnectFailed("connect timed out".into()))
                }
            }
        }

        self.inner = Some(Inner { client, connection, connected: true });
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(inner) = self.inner.take() {
            if let Err(e) = inner.client.disconnect() {
                debug!(error = %e, "disconnect while already down");
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.inner.as_ref().is_some_and(|i| i.connected)
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retained: bool,
    ) -> Result<(), TransportError> {
        let Some(inner) = self.inner.as_mut().filter(|i| i.connected) else {
            return Err(TransportError::Disconnected);
        };
        inner
            .client
            .publish(topic, to_rumqttc(qos), retained, payload.to_vec())
            .map_err(|e| TransportError::PublishFailed(e.to_string()))
    }

    fn subscribe(&mut self, filter: &str, qos: QoS) -> Result<(), TransportError> {
        let Some(inner) = self.inner.as_mut().filter(|i| i.connected) else {
            return Err(TransportError::Disconnected);
        };
        inner
            .client
            .subscribe(filter, to_rumqttc(qos))
            .map_err(|e| TransportError::SubscribeFailed(e.to_string()))
    }

    fn unsubscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        let Some(inner) = self.inner.as_mut().filter(|i| i.connected) else {
            return Err(TransportError::Disconnected);
        };
        inner
            .client
            .unsubscribe(filter)
            .map_err(|e| TransportError::SubscribeFailed(e.to_string()))
    }

    fn drain(&mut self) -> Vec<Inbound> {
        let mut out = Vec::new();
        let Some(inner) = self.inner.as_mut() else { return out };
        loop {
            match inner.connection.try_recv() {
                Ok(Ok(Event::Incoming(Packet::Publish(p)))) => out.push(Inbound {
                    topic: p.topic.clone(),
                    payload: p.payload.to_vec(),
                    retained: p.retain,
                }),
                Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                    inner.connected = false;
                    break;
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "connection error");
                    inner.connected = false;
                    break;
                }
                // queue empty (or event loop gone; surfaced as an error above)
                Err(_) => break,
            }
        }
        out
    }
}
