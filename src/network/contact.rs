// Pairwise proximity, recomputed from scratch every tick. O(n^2) is fine for the
// tens to low hundreds of nodes this is meant for.

use super::{Node, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub a: NodeId,
    pub b: NodeId,
    pub distance: f64,
}

impl Contact {
    /// Canonicalises so that `a < b`
    pub fn new(first: NodeId, second: NodeId, distance: f64) -> Self {
        let (a, b) = if first <= second { (first, second) } else { (second, first) };
        Self { a, b, distance }
    }

    pub fn involves(&self, id: NodeId) -> bool {
        self.a == id || self.b == id
    }

    pub fn peer_of(&self, id: NodeId) -> Option<NodeId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Contacts of one tick, sorted by `(a, b)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactSet {
    contacts: Vec<Contact>,
}

impl ContactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = Contact>) -> Self {
        let mut contacts: Vec<Contact> = pairs.into_iter().filter(|c| c.a != c.b).collect();
        contacts.sort_by_key(|c| (c.a, c.b));
        contacts.dedup_by_key(|c| (c.a, c.b));
        Self { contacts }
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    pub fn contains(&self, x: NodeId, y: NodeId) -> bool {
        let key = if x <= y { (x, y) } else { (y, x) };
        self.contacts
            .binary_search_by_key(&key, |c| (c.a, c.b))
            .is_ok()
    }

    /// Peers of `id` with their distance, in contact-set order
    pub fn neighbours_of(&self, id: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.contacts
            .iter()
            .filter_map(move |c| c.peer_of(id).map(|peer| (peer, c.distance)))
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContactDetector {
    range: f64,
}

impl ContactDetector {
    pub fn new(range: f64) -> Self {
        Self { range }
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    /// A pair is in contact iff its distance is strictly below the range
    pub fn detect(&self, nodes: &[Node]) -> ContactSet {
        let mut contacts = Vec::new();

        for (i, first) in nodes.iter().enumerate() {
            for second in &nodes[i + 1..] {
                if first.id == second.id {
                    continue;
                }
                let distance = first.distance_to(second);
                if distance < self.range {
                    contacts.push(Contact::new(first.id, second.id, distance));
                }
            }
        }

        ContactSet::from_pairs(contacts)
    }
}
