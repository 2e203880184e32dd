pub mod flooding;
pub mod single_target;

use crate::network::{ContactSet, Message, MessageId, Node, NodeId};
use crate::simulation::event::SimEvent;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::trace;

/// Decides which messages cross which contacts in one tick.
pub trait ReplicationStrategy: Send + Sync + fmt::Debug {
    fn replicate(
        &mut self,
        ctx: &mut ReplicationContext<'_>,
        contacts: &ContactSet,
        tick: u64,
    ) -> Vec<SimEvent>;
    fn name(&self) -> &str;
    /// Drop any per-run state (called on start from idle and on reset)
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyParams {
    pub continue_after_delivery: bool,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            continue_after_delivery: true,
        }
    }
}

/// Mutable view over the node and message arenas for the duration of one
/// replication pass.
pub struct ReplicationContext<'a> {
    nodes: &'a mut [Node],
    messages: &'a mut [Message],
}

impl<'a> ReplicationContext<'a> {
    pub fn new(nodes: &'a mut [Node], messages: &'a mut [Message]) -> Self {
        Self { nodes, messages }
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(id.index())
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn holds(&self, node: NodeId, message: MessageId) -> bool {
        self.nodes
            .get(node as usize)
            .is_some_and(|n| n.holds(message))
    }

    pub fn held_by(&self, node: NodeId) -> Vec<MessageId> {
        self.nodes
            .get(node as usize)
            .map(|n| n.held().collect())
            .unwrap_or_default()
    }

    pub fn is_delivered(&self, message: MessageId) -> bool {
        self.message(message).is_some_and(Message::is_delivered)
    }

    /// Copy `message` from `from` into `to`'s holdings.
    ///
    /// A no-op (no events, no state change) when `to` already holds it. The
    /// first copy that lands on the destination marks the message delivered.
    pub fn transfer(
        &mut self,
        message: MessageId,
        from: NodeId,
        to: NodeId,
        tick: u64,
        distance: f64,
    ) -> Vec<SimEvent> {
        if from == to || !self.holds(from, message) {
            return Vec::new();
        }
        let Some(msg) = self.messages.get_mut(message.index()) else {
            return Vec::new();
        };
        let Some(receiver) = self.nodes.get_mut(to as usize) else {
            return Vec::new();
        };
        if !receiver.accept(message) {
            return Vec::new();
        }

        msg.record_transfer(from, to);
        trace!("message {} copied {} -> {} at t={}", message, from, to, tick);

        let mut events = vec![SimEvent::transfer(tick, message, from, to, distance)];
        if to == msg.destination {
            if let Some(delay) = msg.mark_delivered(tick) {
                events.push(SimEvent::delivered(tick, message, from, to, delay));
            }
        }
        events
    }
}

type StrategyFactory = Box<dyn Fn(StrategyParams) -> Box<dyn ReplicationStrategy> + Send + Sync>;

struct StrategyEntry {
    summary: &'static str,
    factory: StrategyFactory,
}

/// Replication strategies by canonical name, plus the alternative names the
/// routing literature uses for the same behaviour.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyEntry>,
    aliases: HashMap<String, String>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: BTreeMap::new(),
            aliases: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register(
            "flooding",
            "copy every held message across every contact",
            |p| Box::new(flooding::Flooding::new(p.continue_after_delivery)),
        );
        self.register(
            "single-target",
            "one new neighbour per carrier per tick, never the same one twice",
            |_| Box::new(single_target::SingleTarget::new()),
        );

        self.alias("epidemic", "flooding");
        self.alias("anti-replay", "single-target");
    }

    pub fn register<F>(&mut self, name: &str, summary: &'static str, factory: F)
    where
        F: Fn(StrategyParams) -> Box<dyn ReplicationStrategy> + Send + Sync + 'static,
    {
        let name = name.to_lowercase();
        self.aliases.remove(&name);
        self.strategies.insert(
            name,
            StrategyEntry {
                summary,
                factory: Box::new(factory),
            },
        );
    }

    /// Returns false (and records nothing) when `target` isn't registered
    pub fn alias(&mut self, alias: &str, target: &str) -> bool {
        let target = target.to_lowercase();
        if !self.strategies.contains_key(&target) {
            return false;
        }
        self.aliases.insert(alias.to_lowercase(), target);
        true
    }

    /// Canonical name for a registered name or alias
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        let canonical = self.aliases.get(&name).unwrap_or(&name);
        self.strategies
            .get_key_value(canonical)
            .map(|(key, _)| key.as_str())
    }

    pub fn create(&self, name: &str, params: StrategyParams) -> Option<Box<dyn ReplicationStrategy>> {
        let entry = self.strategies.get(self.resolve(name)?)?;
        Some((entry.factory)(params))
    }

    /// Canonical names, sorted
    pub fn list(&self) -> Vec<String> {
        self.strategies.keys().cloned().collect()
    }

    pub fn summary(&self, name: &str) -> Option<&'static str> {
        self.strategies.get(self.resolve(name)?).map(|e| e.summary)
    }

    pub fn aliases_of(&self, name: &str) -> Vec<&str> {
        let mut aliases: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(alias, _)| alias.as_str())
            .collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn global() -> &'static StrategyRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<StrategyRegistry> = OnceLock::new();
        REGISTRY.get_or_init(StrategyRegistry::new)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
