use crate::network::{MessageId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    Created { source: NodeId, destination: NodeId },
    Transfer { from: NodeId, to: NodeId, distance: f64 },
    Delivered { from: NodeId, to: NodeId, delay: u64 },
}

/// Structured record of something that happened during a tick.
/// Formatting for humans is left to whoever consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub message: MessageId,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl SimEvent {
    pub fn created(tick: u64, message: MessageId, source: NodeId, destination: NodeId) -> Self {
        Self {
            tick,
            message,
            kind: EventKind::Created { source, destination },
        }
    }

    pub fn transfer(tick: u64, message: MessageId, from: NodeId, to: NodeId, distance: f64) -> Self {
        Self {
            tick,
            message,
            kind: EventKind::Transfer { from, to, distance },
        }
    }

    pub fn delivered(tick: u64, message: MessageId, from: NodeId, to: NodeId, delay: u64) -> Self {
        Self {
            tick,
            message,
            kind: EventKind::Delivered { from, to, delay },
        }
    }

    pub fn from_node(&self) -> NodeId {
        match self.kind {
            EventKind::Created { source, .. } => source,
            EventKind::Transfer { from, .. } | EventKind::Delivered { from, .. } => from,
        }
    }

    pub fn to_node(&self) -> NodeId {
        match self.kind {
            EventKind::Created { destination, .. } => destination,
            EventKind::Transfer { to, .. } | EventKind::Delivered { to, .. } => to,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self.kind, EventKind::Transfer { .. })
    }

    pub fn is_delivery(&self) -> bool {
        matches!(self.kind, EventKind::Delivered { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EventKind::Created { .. } => "created",
            EventKind::Transfer { .. } => "transfer",
            EventKind::Delivered { .. } => "delivered",
        }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::Created { source, destination } => write!(
                f,
                "[t={}] message {} created: node {} -> node {}",
                self.tick, self.message, source, destination
            ),
            EventKind::Transfer { from, to, distance } => write!(
                f,
                "[t={}] message {}: node {} -> node {} (distance {:.0})",
                self.tick, self.message, from, to, distance
            ),
            EventKind::Delivered { to, delay, .. } => write!(
                f,
                "[t={}] message {} delivered to node {} after {} ticks",
                self.tick, self.message, to, delay
            ),
        }
    }
}
