//! NATS implementation of the broker transport ports.
//!
//! Core NATS subjects map one-to-one onto the pipeline's topics and carry
//! the same at-most-once contract the spec assumes: no acknowledgments,
//! messages in flight during a disconnect are lost.
//!
//! The client performs its own short-lived reconnect attempts for an
//! established session; when it gives up the subscriber stream ends and
//! the controller's own backoff takes over with a fresh connect.

use async_trait::async_trait;
use futures::StreamExt;
use rand::Rng;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::transport::{BrokerConnection, BrokerTransport, InboundMessage, MessageStream};

/// Connects to a NATS server by URL.
#[derive(Debug, Clone)]
pub struct NatsTransport {
    url: String,
}

impl NatsTransport {
    /// Create a transport for the given server URL
    /// (e.g. `nats://localhost:4222`).
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl BrokerTransport for NatsTransport {
    type Connection = NatsConnection;

    async fn connect(&self) -> Result<Self::Connection, TransportError> {
        // A per-session connection name keeps concurrent instances
        // distinguishable in broker-side monitoring.
        let name = format!("sensorhub-ingest-{:08x}", rand::rng().random::<u32>());
        let client = async_nats::ConnectOptions::new()
            .name(&name)
            .connect(self.url.as_str())
            .await
            .map_err(|e| {
                TransportError::Connect(format!("failed to connect to {}: {e}", self.url))
            })?;
        info!(url = %self.url, name, "connected to NATS server");
        Ok(NatsConnection { client })
    }
}

/// A live NATS session.
pub struct NatsConnection {
    client: async_nats::Client,
}

#[async_trait]
impl BrokerConnection for NatsConnection {
    type Subscription = NatsSubscription;

    async fn subscribe(self, topic: &str) -> Result<Self::Subscription, TransportError> {
        let subscriber = self
            .client
            .subscribe(topic.to_owned())
            .await
            .map_err(|e| TransportError::Subscribe(format!("subscribe to {topic} failed: {e}")))?;
        info!(topic, "subscribed");
        Ok(NatsSubscription {
            // Keep the client alive alongside the subscriber; dropping the
            // last handle would tear the connection down.
            _client: self.client,
            subscriber,
        })
    }
}

/// The message stream of one NATS subscription.
pub struct NatsSubscription {
    _client: async_nats::Client,
    subscriber: async_nats::Subscriber,
}

#[async_trait]
impl MessageStream for NatsSubscription {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        let message = self.subscriber.next().await?;
        Some(InboundMessage {
            topic: message.subject.to_string(),
            payload: message.payload.to_vec(),
        })
    }

    async fn unsubscribe(mut self) {
        if let Err(e) = self.subscriber.unsubscribe().await {
            debug!(error = %e, "best-effort unsubscribe failed");
        }
    }
}

impl std::fmt::Debug for NatsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsConnection").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for NatsSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsSubscription").finish_non_exhaustive()
    }
}
