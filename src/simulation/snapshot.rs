// Read-only views handed to renderers, loggers and anything else outside the
// engine. They are owned copies; nothing here points back into live state.

use super::clock::ClockState;
use crate::metrics::StatsSnapshot;
use crate::network::{Contact, Message, MessageId, Node, NodeId, Role};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub role: Role,
    pub held: Vec<MessageId>,
}

impl NodeView {
    pub fn is_carrier(&self) -> bool {
        !self.held.is_empty()
    }
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            x: node.x,
            y: node.y,
            radius: node.radius,
            role: node.role(),
            held: node.held().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: MessageId,
    pub source: NodeId,
    pub destination: NodeId,
    pub created_at: u64,
    pub delivered: bool,
    pub delivered_at: Option<u64>,
    /// Route of the first delivering copy, `[source]` until then
    pub path: Vec<NodeId>,
    /// Every node reached so far, in arrival order
    pub visited: Vec<NodeId>,
    pub transfers: u32,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            source: message.source,
            destination: message.destination,
            created_at: message.created_at,
            delivered: message.is_delivered(),
            delivered_at: message.delivered_at(),
            path: message.path().to_vec(),
            visited: message.visited().to_vec(),
            transfers: message.transfers(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub tick: u64,
    pub state: ClockState,
    pub nodes: Vec<NodeView>,
    pub messages: Vec<MessageView>,
    pub contacts: Vec<Contact>,
    pub stats: StatsSnapshot,
}

impl SimSnapshot {
    pub fn node(&self, id: NodeId) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn message(&self, id: MessageId) -> Option<&MessageView> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// Shared handle onto the last snapshot published between ticks.
/// Readers on other threads only ever see whole ticks.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle {
    inner: Arc<RwLock<Arc<SimSnapshot>>>,
}

impl SnapshotHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Arc<SimSnapshot> {
        self.inner.read().clone()
    }

    pub(crate) fn publish(&self, snapshot: SimSnapshot) {
        *self.inner.write() = Arc::new(snapshot);
    }

    /// Someone besides the engine holds a clone
    pub(crate) fn is_observed(&self) -> bool {
        Arc::strong_count(&self.inner) > 1
    }
}
