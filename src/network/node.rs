use super::MessageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Ordinary,
    Sender,
    Receiver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub radius: f64, // boundary/draw hint only, never the contact distance
    role: Role,
    held: BTreeSet<MessageId>,
}

impl Node {
    pub fn new(id: NodeId, x: f64, y: f64, radius: f64, role: Role) -> Self {
        Self {
            id,
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            radius,
            role,
            held: BTreeSet::new(),
        }
    }

    pub fn with_velocity(mut self, dx: f64, dy: f64) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn holds(&self, message: MessageId) -> bool {
        self.held.contains(&message)
    }

    pub fn held(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.held.iter().copied()
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Returns false when the node already had the message
    pub(crate) fn accept(&mut self, message: MessageId) -> bool {
        self.held.insert(message)
    }

    pub fn speed(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_is_idempotent() {
        let mut node = Node::new(0, 10.0, 10.0, 5.0, Role::Ordinary);
        assert!(node.accept(MessageId::new(3)));
        assert!(!node.accept(MessageId::new(3)));
        assert_eq!(node.held_count(), 1);
        assert!(node.holds(MessageId::new(3)));
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Node::new(0, 0.0, 0.0, 1.0, Role::Sender);
        let b = Node::new(1, 3.0, 4.0, 1.0, Role::Receiver);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }
}
