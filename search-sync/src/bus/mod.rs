//! In-process broadcast bus and change publisher.
//!
//! Channels are named per (entity kind, operation) and carry UTF-8 payloads:
//! the full denormalized document as JSON for create/update, the bare id for
//! delete. Delivery is fire-and-forget: a message published while no
//! subscriber is running is lost, there is no acknowledgment and no replay.
//! The only recovery from lost deliveries is an explicit destructive resync
//! of the affected index.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::errors::SyncError;
use search_sync_shared::{ChangeEnvelope, ChangeOp, DocumentKind};

/// Default per-channel buffer capacity.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Named broadcast topics, one per (kind, operation).
///
/// Topics are created lazily on first publish or subscribe. Within one
/// channel, messages reach a subscriber in publish order; across channels
/// there is no ordering guarantee.
pub struct ChannelBus {
    topics: Mutex<Option<HashMap<String, broadcast::Sender<String>>>>,
    capacity: usize,
}

impl ChannelBus {
    /// Create a bus with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a custom per-channel buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Mutex::new(Some(HashMap::new())),
            capacity,
        }
    }

    /// Publish one payload on a named channel.
    ///
    /// Returns the number of subscribers the message reached. Zero is a
    /// valid outcome: with nobody listening the message is simply lost,
    /// which is this bus's contract.
    pub fn publish(&self, channel: &str, payload: String) -> Result<usize, SyncError> {
        let sender = {
            let mut guard = self
                .topics
                .lock()
                .map_err(|_| SyncError::channel("bus lock poisoned"))?;
            let topics = guard
                .as_mut()
                .ok_or_else(|| SyncError::channel("bus is closed"))?;
            topics
                .entry(channel.to_string())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .clone()
        };

        match sender.send(payload) {
            Ok(receivers) => {
                debug!(channel = %channel, receivers, "Published change event");
                Ok(receivers)
            }
            Err(_) => {
                // No active subscriber: the delivery is lost by design.
                debug!(channel = %channel, "Published change event with no subscribers");
                Ok(0)
            }
        }
    }

    /// Subscribe to a named channel. Only messages published after this call
    /// are received; there is no replay of earlier traffic.
    pub fn subscribe(&self, channel: &str) -> Result<broadcast::Receiver<String>, SyncError> {
        let mut guard = self
            .topics
            .lock()
            .map_err(|_| SyncError::channel("bus lock poisoned"))?;
        let topics = guard
            .as_mut()
            .ok_or_else(|| SyncError::channel("bus is closed"))?;
        Ok(topics
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe())
    }

    /// Close the bus: drop every topic sender so all subscribers observe a
    /// closed channel and their loops exit. Publishing afterwards fails.
    pub fn close(&self) {
        if let Ok(mut guard) = self.topics.lock() {
            if guard.take().is_some() {
                warn!("Channel bus closed; all listeners will drain and stop");
            }
        }
    }
}

impl Default for ChannelBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Publisher held by an owning CRUD service for one entity kind.
///
/// Invoked synchronously after a committed relational mutation: exactly one
/// publish per successful mutation, no retry, no buffering. A publish
/// failure surfaces to the caller of the original mutation; it never rolls
/// the relational write back.
pub struct ChangePublisher {
    bus: std::sync::Arc<ChannelBus>,
    kind: DocumentKind,
}

impl ChangePublisher {
    /// Create a publisher for one entity kind.
    pub fn new(bus: std::sync::Arc<ChannelBus>, kind: DocumentKind) -> Self {
        Self { bus, kind }
    }

    /// Publish the post-mutation denormalized document on the created channel.
    pub fn publish_created<T: Serialize>(&self, document: &T) -> Result<(), SyncError> {
        self.publish_document(ChangeOp::Created, document)
    }

    /// Publish the post-mutation denormalized document on the updated channel.
    pub fn publish_updated<T: Serialize>(&self, document: &T) -> Result<(), SyncError> {
        self.publish_document(ChangeOp::Updated, document)
    }

    /// Publish the bare stable id on the deleted channel.
    pub fn publish_deleted(&self, id: &str) -> Result<(), SyncError> {
        if id.trim().is_empty() {
            return Err(SyncError::channel("cannot publish delete with empty id"));
        }
        self.bus
            .publish(&self.kind.channel(ChangeOp::Deleted), ChangeEnvelope::encode_delete(id))?;
        Ok(())
    }

    fn publish_document<T: Serialize>(&self, op: ChangeOp, document: &T) -> Result<(), SyncError> {
        let payload = ChangeEnvelope::encode_upsert(document, self.kind)?;
        self.bus.publish(&self.kind.channel(op), payload)?;
        Ok(())
    }
}
