//! Broker transport ports.
//!
//! The controller is written against these traits rather than a concrete
//! client so its state machine can be driven by a scripted fake in tests.
//! The NATS implementation lives in [`crate::nats`].
//!
//! The upstream feed is best-effort: at-most-once delivery, no
//! acknowledgments, reconnect is the consumer's responsibility.

use async_trait::async_trait;

use crate::error::TransportError;

/// One raw message received from the broker.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// The topic the message was published on.
    pub topic: String,
    /// The raw payload bytes. No schema is guaranteed.
    pub payload: Vec<u8>,
}

/// Factory for broker connections.
///
/// Each successful [`connect`](Self::connect) starts a fresh session; the
/// controller calls it again after every drop.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// The connection type produced by this transport.
    type Connection: BrokerConnection;

    /// Establish a session with the broker.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the broker is unreachable or
    /// the handshake fails.
    async fn connect(&self) -> Result<Self::Connection, TransportError>;
}

/// A live broker session awaiting subscription.
#[async_trait]
pub trait BrokerConnection: Send {
    /// The subscription type produced by this connection.
    type Subscription: MessageStream;

    /// Subscribe to a topic at best-effort delivery.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Subscribe`] if the broker refuses; the
    /// controller treats that exactly like a dropped connection.
    async fn subscribe(self, topic: &str) -> Result<Self::Subscription, TransportError>;
}

/// The inbound message stream of one subscription.
#[async_trait]
pub trait MessageStream: Send {
    /// Wait for the next message.
    ///
    /// Returns `None` when the connection is gone, ending the current
    /// connection epoch. Messages in flight at that moment are lost
    /// (at-most-once upstream semantics).
    async fn next_message(&mut self) -> Option<InboundMessage>;

    /// Best-effort unsubscribe, used during graceful shutdown. Failures
    /// are logged, never propagated.
    async fn unsubscribe(self);
}
