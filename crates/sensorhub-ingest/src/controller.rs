//! The ingestion controller: the connect/subscribe/consume state machine.
//!
//! One controller owns one broker subscription and drives every inbound
//! message through decode, append, and broadcast, strictly in arrival
//! order. The controller is designed to run indefinitely against a broker
//! that will be intermittently unreachable: every failure either ends the
//! current connection epoch (reconnect with backoff) or drops the single
//! affected message (storage outage), and nothing in the loop is fatal.
//!
//! ```text
//! Disconnected -> Connecting -> Subscribed -> (message loop) -> Disconnected
//! ```
//!
//! A connection epoch is one contiguous live session, numbered only for
//! log correlation; nothing about epochs is persisted, and no ordering or
//! deduplication guarantee spans them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::decode::decode;
use crate::hub::BroadcastHub;
use crate::store::ReadingStore;
use crate::transport::{BrokerConnection, BrokerTransport, InboundMessage, MessageStream};

/// Configuration for an ingestion controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// The broker topic to subscribe to.
    pub topic: String,
    /// First reconnect delay after a drop.
    pub initial_backoff: Duration,
    /// Fixed ceiling the reconnect delay settles into.
    pub max_backoff: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            topic: String::from("telemetry.readings"),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Owns the broker connection lifecycle and the decode/append/publish
/// pipeline.
///
/// Collaborators are injected: any [`BrokerTransport`] (a fake in tests),
/// any [`ReadingStore`], and a [`BroadcastHub`] handle. Multiple
/// independent controllers can coexist; there is no ambient global state.
pub struct IngestController<T: BrokerTransport> {
    transport: T,
    store: Arc<dyn ReadingStore>,
    hub: BroadcastHub,
    config: ControllerConfig,
    shutdown: CancellationToken,
}

impl<T: BrokerTransport> IngestController<T> {
    /// Create a controller. It does nothing until [`run`](Self::run).
    pub fn new(
        transport: T,
        store: Arc<dyn ReadingStore>,
        hub: BroadcastHub,
        config: ControllerConfig,
    ) -> Self {
        Self {
            transport,
            store,
            hub,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// A handle that stops the controller when cancelled.
    ///
    /// Cancelling is cooperative (checked at every suspension point) and
    /// idempotent.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the controller until shutdown.
    ///
    /// Loops forever through connect, subscribe, and the message loop,
    /// reconnecting with bounded backoff after any drop. Returns only when
    /// the shutdown token is cancelled.
    pub async fn run(self) {
        let mut backoff = Backoff::new(self.config.initial_backoff, self.config.max_backoff);
        let mut epoch: u64 = 0;

        'reconnect: loop {
            // Disconnected -> Connecting
            let connection = tokio::select! {
                () = self.shutdown.cancelled() => break 'reconnect,
                result = self.transport.connect() => match result {
                    Ok(connection) => connection,
                    Err(e) => {
                        warn!(error = %e, "broker connect failed");
                        if !self.pause(&mut backoff).await {
                            break 'reconnect;
                        }
                        continue 'reconnect;
                    }
                },
            };

            // Connecting -> Subscribed. A refused subscribe is equivalent
            // to a dropped connection.
            let mut stream = tokio::select! {
                () = self.shutdown.cancelled() => break 'reconnect,
                result = connection.subscribe(&self.config.topic) => match result {
                    Ok(stream) => stream,
                    Err(e) => {
                        warn!(topic = %self.config.topic, error = %e, "subscribe rejected");
                        if !self.pause(&mut backoff).await {
                            break 'reconnect;
                        }
                        continue 'reconnect;
                    }
                },
            };

            epoch = epoch.saturating_add(1);
            backoff.reset();
            info!(topic = %self.config.topic, epoch, "subscribed, connection epoch started");

            // Subscribed: the message loop. One message is fully processed
            // (or abandoned on store failure) before the next is taken, so
            // arrival order is preserved through append and broadcast.
            loop {
                tokio::select! {
                    () = self.shutdown.cancelled() => {
                        stream.unsubscribe().await;
                        break 'reconnect;
                    }
                    message = stream.next_message() => match message {
                        Some(message) => self.process(epoch, message).await,
                        None => {
                            warn!(epoch, "broker connection dropped, epoch ended");
                            if !self.pause(&mut backoff).await {
                                break 'reconnect;
                            }
                            continue 'reconnect;
                        }
                    },
                }
            }
        }

        info!("ingestion controller stopped");
    }

    /// Handle one inbound message: decode, append, publish.
    async fn process(&self, epoch: u64, message: InboundMessage) {
        // The receipt time is assigned here, exactly once, and never
        // recomputed downstream.
        let received_at = Utc::now();
        let reading = decode(&message.payload, &message.topic, received_at);
        let degraded = reading.raw_fallback.is_some();

        match self.store.append(reading).await {
            Ok(stored) => {
                // Write-before-publish: only durably stored readings reach
                // the hub.
                let delivered = self.hub.publish(&stored);
                debug!(
                    id = %stored.id,
                    topic = %stored.topic,
                    epoch,
                    delivered,
                    degraded,
                    "reading stored and broadcast"
                );
            }
            Err(e) => {
                // There is no redelivery channel from the broker, so this
                // message is lost. The subscription keeps consuming.
                error!(
                    topic = %message.topic,
                    epoch,
                    error = %e,
                    "storage unavailable, reading dropped"
                );
            }
        }
    }

    /// Sleep for the next backoff delay, or return `false` if shutdown was
    /// requested while waiting.
    async fn pause(&self, backoff: &mut Backoff) -> bool {
        let delay = backoff.next_delay();
        debug!(?delay, "waiting before reconnect");
        tokio::select! {
            () = self.shutdown.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}

impl<T: BrokerTransport + std::fmt::Debug> std::fmt::Debug for IngestController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestController")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = ControllerConfig::default();
        assert_eq!(config.topic, "telemetry.readings");
        assert!(config.initial_backoff < config.max_backoff);
    }
}
