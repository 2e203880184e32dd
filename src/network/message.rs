use super::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    // Messages are never deleted, so the id doubles as the arena index
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub source: NodeId,
    pub destination: NodeId,
    pub created_at: u64,
    delivered_at: Option<u64>,
    path: Vec<NodeId>,
    // every node that received a copy, in arrival order, source first
    visited: Vec<NodeId>,
    // receiver -> node it got its copy from; the replication tree
    lineage: BTreeMap<NodeId, NodeId>,
    transfers: u32,
}

impl Message {
    pub fn new(id: MessageId, source: NodeId, destination: NodeId, created_at: u64) -> Self {
        Self {
            id,
            source,
            destination,
            created_at,
            delivered_at: None,
            path: vec![source],
            visited: vec![source],
            lineage: BTreeMap::new(),
            transfers: 0,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }

    pub fn delivered_at(&self) -> Option<u64> {
        self.delivered_at
    }

    /// `[source]` until delivered, then the route the first delivering copy took
    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    /// Nodes reached so far, in the order the copies arrived.
    /// Grows with every transfer, delivered or not.
    pub fn visited(&self) -> &[NodeId] {
        &self.visited
    }

    /// Successful transfers of this message across the whole replication tree
    pub fn transfers(&self) -> u32 {
        self.transfers
    }

    pub fn delay(&self) -> Option<u64> {
        self.delivered_at
            .map(|at| at.saturating_sub(self.created_at))
    }

    /// Route from the source to `node`, empty if `node` never got a copy
    pub fn route_to(&self, node: NodeId) -> Vec<NodeId> {
        let mut route = vec![node];
        let mut current = node;

        // lineage is a tree rooted at the source, the bound only guards against corruption
        for _ in 0..=self.lineage.len() {
            if current == self.source {
                route.reverse();
                return route;
            }
            match self.lineage.get(&current) {
                Some(&parent) => {
                    route.push(parent);
                    current = parent;
                }
                None => break,
            }
        }

        Vec::new()
    }

    pub(crate) fn record_transfer(&mut self, from: NodeId, to: NodeId) {
        if to != self.source && !self.lineage.contains_key(&to) {
            self.visited.push(to);
        }
        self.lineage.entry(to).or_insert(from);
        self.transfers += 1;
    }

    /// First delivery wins; returns the delay only for that one
    pub(crate) fn mark_delivered(&mut self, tick: u64) -> Option<u64> {
        if self.is_delivered() {
            return None;
        }

        let at = tick.max(self.created_at);
        self.delivered_at = Some(at);

        let route = self.route_to(self.destination);
        if route.len() > self.path.len() {
            self.path = route;
        }

        Some(at - self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_follows_lineage_back_to_source() {
        let mut msg = Message::new(MessageId::new(0), 0, 3, 0);
        msg.record_transfer(0, 1);
        msg.record_transfer(1, 2);
        msg.record_transfer(2, 3);

        assert_eq!(msg.route_to(3), vec![0, 1, 2, 3]);
        assert_eq!(msg.route_to(0), vec![0]);
        assert!(msg.route_to(7).is_empty());
    }

    #[test]
    fn delivery_is_stamped_once() {
        let mut msg = Message::new(MessageId::new(1), 0, 2, 5);
        msg.record_transfer(0, 2);

        assert_eq!(msg.mark_delivered(9), Some(4));
        assert_eq!(msg.mark_delivered(12), None);
        assert_eq!(msg.delivered_at(), Some(9));
        assert_eq!(msg.path(), &[0, 2]);
    }

    #[test]
    fn lineage_keeps_first_giver() {
        let mut msg = Message::new(MessageId::new(0), 0, 1, 0);
        msg.record_transfer(0, 1);
        msg.record_transfer(2, 1);
        assert_eq!(msg.route_to(1), vec![0, 1]);
        assert_eq!(msg.transfers(), 2);
        assert_eq!(msg.visited(), &[0, 1]);
    }

    #[test]
    fn journey_grows_before_delivery() {
        let mut msg = Message::new(MessageId::new(0), 0, 4, 0);
        assert_eq!(msg.visited(), &[0]);

        msg.record_transfer(0, 2);
        msg.record_transfer(2, 1);
        msg.record_transfer(0, 3);

        assert!(!msg.is_delivered());
        assert_eq!(msg.visited(), &[0, 2, 1, 3]);
        assert_eq!(msg.path(), &[0]);

        msg.record_transfer(1, 4);
        msg.mark_delivered(3);
        assert_eq!(msg.visited(), &[0, 2, 1, 3, 4]);
        assert_eq!(msg.path(), &[0, 2, 1, 4]);
    }
}
