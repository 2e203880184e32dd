pub mod clock;
pub mod config;
pub mod event;
pub mod runner;
pub mod snapshot;

pub use clock::{ClockState, Command, FramePacer};
pub use config::{Placement, Scenario, SimConfig};
pub use event::{EventKind, SimEvent};
pub use snapshot::{MessageView, NodeView, SimSnapshot, SnapshotHandle};

use crate::error::{SimError, SimResult};
use crate::metrics::{StatsAggregator, StatsSnapshot};
use crate::mobility::MobilityModel;
use crate::network::{ContactDetector, ContactSet, Message, MessageId, Node, NodeId, Role};
use crate::strategies::{ReplicationContext, ReplicationStrategy, StrategyParams, StrategyRegistry};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    pub tick: u64,
    pub events: Vec<SimEvent>,
    pub contacts: ContactSet,
}

/// The simulation core. Owns every node and message; the outside world gets
/// snapshots and per-tick event lists.
pub struct Simulation {
    config: SimConfig,
    state: ClockState,
    tick: u64,
    nodes: Vec<Node>,
    messages: Vec<Message>,
    contacts: ContactSet,
    stats: StatsAggregator,
    strategy: Box<dyn ReplicationStrategy>,
    mobility: MobilityModel,
    detector: ContactDetector,
    rng: StdRng,
    pacer: FramePacer,
    // created between ticks, handed out with the next tick
    pending: Vec<SimEvent>,
    published: SnapshotHandle,
}

impl Simulation {
    pub fn initialize(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let params = StrategyParams {
            continue_after_delivery: config.continue_after_delivery,
        };
        let strategy = StrategyRegistry::global()
            .create(config.scenario.strategy_name(), params)
            .ok_or_else(|| {
                SimError::InvalidConfiguration(format!("no strategy for scenario {}", config.scenario))
            })?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut sim = Self {
            mobility: MobilityModel::new(config.speed),
            detector: ContactDetector::new(config.range),
            config,
            state: ClockState::Idle,
            tick: 0,
            nodes: Vec::new(),
            messages: Vec::new(),
            contacts: ContactSet::new(),
            stats: StatsAggregator::new(),
            strategy,
            rng,
            pacer: FramePacer::default(),
            pending: Vec::new(),
            published: SnapshotHandle::new(),
        };
        sim.populate();

        info!(
            "Initialized {}: {} nodes, {} scenario, range {}, area {}x{}",
            sim.config.name,
            sim.config.node_count,
            sim.config.scenario,
            sim.config.range,
            sim.config.area_width,
            sim.config.area_height
        );

        Ok(sim)
    }

    /// Replace mobility defaults (speed scale, turn probability, ...)
    pub fn with_mobility(mut self, mobility: MobilityModel) -> Self {
        self.mobility = mobility;
        self
    }

    /// Keep one stats row per tick for export
    pub fn with_history(mut self) -> Self {
        self.stats.set_history(true);
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn history(&self) -> &[StatsSnapshot] {
        self.stats.get_snapshots()
    }

    pub fn control(&mut self, command: Command) -> SimResult<()> {
        let from = self.state;
        let to = from.next(command)?;

        let rebuild = matches!(
            (from, command),
            (ClockState::Idle, Command::Start) | (_, Command::Reset)
        );
        if rebuild {
            self.populate();
        }

        self.state = to;
        self.pacer.reset();
        info!("Simulation {}: {} -> {}", command, from, to);

        self.publish();
        Ok(())
    }

    pub fn start(&mut self) -> SimResult<()> {
        self.control(Command::Start)
    }

    pub fn pause(&mut self) -> SimResult<()> {
        self.control(Command::Pause)
    }

    pub fn reset(&mut self) -> SimResult<()> {
        self.control(Command::Reset)
    }

    pub fn set_speed_setting(&mut self, setting: u32) {
        self.pacer = FramePacer::from_speed_setting(setting);
    }

    pub fn set_pacer(&mut self, pacer: FramePacer) {
        self.pacer = pacer;
    }

    /// Frame callback for an external render loop. Ticks at most once per
    /// pacer interval and does nothing unless running.
    pub fn on_frame(&mut self, now: Instant) -> SimResult<Option<TickResult>> {
        if !self.state.can_tick() || !self.pacer.ready(now) {
            return Ok(None);
        }
        self.tick().map(Some)
    }

    /// One atomic step: move, detect contacts, replicate, fold stats
    pub fn tick(&mut self) -> SimResult<TickResult> {
        if !self.state.can_tick() {
            return Err(SimError::InvalidStateTransition {
                from: self.state,
                action: "tick".to_string(),
            });
        }

        self.tick += 1;
        let (width, height) = self.area();

        for node in &mut self.nodes {
            self.mobility.step(node, width, height, &mut self.rng);
        }

        self.contacts = self.detector.detect(&self.nodes);

        let mut ctx = ReplicationContext::new(&mut self.nodes, &mut self.messages);
        let produced = self.strategy.replicate(&mut ctx, &self.contacts, self.tick);

        for event in &produced {
            self.stats.record(event);
            if event.is_delivery() {
                info!("{}", event);
            } else {
                debug!("{}", event);
            }
        }

        let carriers = self.nodes.iter().filter(|n| n.held_count() > 0).count();
        self.stats.observe_tick(self.tick, self.contacts.len(), carriers);

        if self.config.scenario.completes()
            && !self.messages.is_empty()
            && self.messages.iter().all(Message::is_delivered)
        {
            self.state = ClockState::Completed;
            info!("All tracked messages delivered at tick {}", self.tick);
        }

        let mut events = std::mem::take(&mut self.pending);
        events.extend(produced);

        self.publish();

        Ok(TickResult {
            tick: self.tick,
            events,
            contacts: self.contacts.clone(),
        })
    }

    /// Only while running or paused; an idle simulation is rebuilt on start
    pub fn inject_message(&mut self, source: NodeId, target: NodeId) -> SimResult<MessageId> {
        self.ensure_injectable()?;

        let count = self.nodes.len() as u32;
        if source >= count || target >= count || source == target {
            return Err(SimError::InvalidNodeId {
                origin: source,
                target,
                node_count: count,
            });
        }

        let id = self.create_message(source, target);
        self.publish();
        Ok(id)
    }

    /// Random distinct source and target
    pub fn inject_random_message(&mut self) -> SimResult<MessageId> {
        self.ensure_injectable()?;
        let count = self.nodes.len() as u32;
        let source = self.rng.gen_range(0..count);
        let mut target = self.rng.gen_range(0..count - 1);
        if target >= source {
            target += 1;
        }
        self.inject_message(source, target)
    }

    /// Creation events not yet handed out by a tick. Lets a driver that
    /// stops right after injecting still account for every message.
    pub fn drain_pending_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            tick: self.tick,
            state: self.state,
            nodes: self.nodes.iter().map(NodeView::from).collect(),
            messages: self.messages.iter().map(MessageView::from).collect(),
            contacts: self.contacts.iter().copied().collect(),
            stats: self.stats.snapshot(),
        }
    }

    /// Handle for readers on other threads; refreshed after every tick and command
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        let handle = self.published.clone();
        handle.publish(self.snapshot());
        handle
    }

    fn publish(&self) {
        if self.published.is_observed() {
            self.published.publish(self.snapshot());
        }
    }

    fn ensure_injectable(&self) -> SimResult<()> {
        if !self.config.scenario.allows_injection() {
            return Err(SimError::UnsupportedScenario {
                scenario: self.config.scenario.to_string(),
                operation: "message injection".to_string(),
            });
        }
        match self.state {
            ClockState::Running | ClockState::Paused => Ok(()),
            from => Err(SimError::InvalidStateTransition {
                from,
                action: "inject".to_string(),
            }),
        }
    }

    fn area(&self) -> (f64, f64) {
        (self.config.area_width as f64, self.config.area_height as f64)
    }

    fn create_message(&mut self, source: NodeId, target: NodeId) -> MessageId {
        let id = MessageId::new(self.messages.len() as u64);
        self.messages.push(Message::new(id, source, target, self.tick));
        self.nodes[source as usize].accept(id);

        let event = SimEvent::created(self.tick, id, source, target);
        info!("{}", event);
        self.stats.record(&event);
        self.pending.push(event);
        id
    }

    /// Fresh nodes (and the tracked message) from the configuration
    fn populate(&mut self) {
        let radius = self.config.radius();
        let (width, height) = self.area();
        let count = self.config.node_count;
        let tracked = self.config.scenario.completes();

        let mut nodes = Vec::with_capacity(count as usize);
        for id in 0..count {
            let role = match id {
                _ if !tracked => Role::Ordinary,
                0 => Role::Sender,
                id if id == count - 1 => Role::Receiver,
                _ => Role::Ordinary,
            };

            let node = match self.config.placements.as_ref().and_then(|p| p.get(id as usize)) {
                Some(p) => Node::new(id, p.x, p.y, radius, role).with_velocity(p.dx, p.dy),
                None => {
                    let (x, y) = self.mobility.spawn_position(radius, width, height, &mut self.rng);
                    let (dx, dy) = self.mobility.random_velocity(&mut self.rng);
                    Node::new(id, x, y, radius, role).with_velocity(dx, dy)
                }
            };
            nodes.push(node);
        }

        self.nodes = nodes;
        self.messages.clear();
        self.contacts.clear();
        self.pending.clear();
        self.stats.reset();
        self.strategy.reset();
        self.tick = 0;

        if tracked {
            self.create_message(0, count - 1);
        }
    }
}
