// Single-target epidemic routing with anti-replay.
//
// Each carrier hands a message to at most one new neighbour per tick, and never
// offers the same message to the same neighbour twice. Carriers are fixed at the
// start of the tick so a fresh copy can't hop again in the same tick.

use super::{ReplicationContext, ReplicationStrategy};
use crate::network::{ContactSet, MessageId, NodeId};
use crate::simulation::event::SimEvent;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SingleTarget {
    // (message, carrier) -> neighbours already offered that message
    offered: BTreeMap<(MessageId, NodeId), BTreeSet<NodeId>>,
}

impl SingleTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn already_offered(&self, message: MessageId, carrier: NodeId, peer: NodeId) -> bool {
        self.offered
            .get(&(message, carrier))
            .is_some_and(|peers| peers.contains(&peer))
    }

    fn carriers(ctx: &ReplicationContext<'_>, message: MessageId, destination: NodeId) -> Vec<NodeId> {
        ctx.node_ids()
            .filter(|&id| id != destination && ctx.holds(id, message))
            .collect()
    }
}

impl ReplicationStrategy for SingleTarget {
    fn replicate(
        &mut self,
        ctx: &mut ReplicationContext<'_>,
        contacts: &ContactSet,
        tick: u64,
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();

        let pending: Vec<(MessageId, NodeId)> = ctx
            .messages()
            .filter(|m| !m.is_delivered())
            .map(|m| (m.id, m.destination))
            .collect();

        for (message, destination) in pending {
            for carrier in Self::carriers(ctx, message, destination) {
                if ctx.is_delivered(message) {
                    break;
                }

                let target = contacts.neighbours_of(carrier).find(|&(peer, _)| {
                    !ctx.holds(peer, message) && !self.already_offered(message, carrier, peer)
                });

                if let Some((peer, distance)) = target {
                    self.offered.entry((message, carrier)).or_default().insert(peer);
                    events.extend(ctx.transfer(message, carrier, peer, tick, distance));
                }
            }

            if ctx.is_delivered(message) {
                debug!("message {} reached node {} at t={}", message, destination, tick);
            }
        }

        events
    }

    fn name(&self) -> &str {
        "SingleTarget"
    }

    fn reset(&mut self) {
        self.offered.clear();
    }
}
