// Epidemic flooding: every contact swaps every message one side has and the
// other doesn't, every tick.

use super::{ReplicationContext, ReplicationStrategy};
use crate::network::{ContactSet, MessageId, NodeId};
use crate::simulation::event::SimEvent;

#[derive(Debug, Clone)]
pub struct Flooding {
    continue_after_delivery: bool,
}

impl Flooding {
    pub fn new(continue_after_delivery: bool) -> Self {
        Self {
            continue_after_delivery,
        }
    }

    fn candidates(&self, ctx: &ReplicationContext<'_>, carrier: NodeId) -> Vec<MessageId> {
        ctx.held_by(carrier)
            .into_iter()
            .filter(|id| self.continue_after_delivery || !ctx.is_delivered(*id))
            .collect()
    }
}

impl Default for Flooding {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReplicationStrategy for Flooding {
    fn replicate(
        &mut self,
        ctx: &mut ReplicationContext<'_>,
        contacts: &ContactSet,
        tick: u64,
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();

        for contact in contacts.iter() {
            for id in self.candidates(ctx, contact.a) {
                events.extend(ctx.transfer(id, contact.a, contact.b, tick, contact.distance));
            }
            for id in self.candidates(ctx, contact.b) {
                events.extend(ctx.transfer(id, contact.b, contact.a, tick, contact.distance));
            }
        }

        events
    }

    fn name(&self) -> &str {
        "Flooding"
    }

    fn reset(&mut self) {}
}
