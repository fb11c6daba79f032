//! Ingestion core for the sensorhub telemetry pipeline.
//!
//! This crate owns the only part of the system with real failure-handling
//! and ordering concerns: the path from a raw broker message to a durably
//! stored reading fanned out to live observers.
//!
//! # Architecture
//!
//! ```text
//! broker --> IngestController --> decode --> ReadingStore --> BroadcastHub --> observers
//! ```
//!
//! The controller holds the single broker subscription and processes
//! messages strictly in arrival order; the hub decouples every observer
//! behind its own bounded mailbox so a slow consumer can never push
//! backpressure into the ingestion path.
//!
//! # Modules
//!
//! - [`decode`] -- total, degrading payload decoder for untrusted producers
//! - [`store`] -- the [`ReadingStore`] port the controller writes through
//! - [`hub`] -- observer registry and non-blocking fan-out
//! - [`transport`] -- broker transport ports (injectable for tests)
//! - [`nats`] -- NATS implementation of the transport ports
//! - [`backoff`] -- bounded exponential reconnect delays
//! - [`controller`] -- the connect/subscribe/consume state machine
//! - [`error`] -- shared error types

pub mod backoff;
pub mod controller;
pub mod decode;
pub mod error;
pub mod hub;
pub mod nats;
pub mod store;
pub mod transport;

// Re-export primary types for convenience.
pub use backoff::Backoff;
pub use controller::{ControllerConfig, IngestController};
pub use decode::decode;
pub use error::{StoreError, TransportError};
pub use hub::{BroadcastHub, DEFAULT_MAILBOX_CAPACITY, ObserverFeed};
pub use nats::NatsTransport;
pub use store::{
    DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT, MIN_RECENT_LIMIT, ReadingStore, clamp_limit,
};
pub use transport::{BrokerConnection, BrokerTransport, InboundMessage, MessageStream};
