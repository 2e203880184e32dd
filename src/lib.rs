pub mod error;
pub mod mobility;
pub mod network;
pub mod strategies;
pub mod metrics;
pub mod simulation;

pub use error::{SimError, SimResult};
pub use mobility::MobilityModel;
pub use strategies::ReplicationStrategy;
pub use simulation::{Simulation, SimConfig};
pub use metrics::StatsAggregator;

pub mod prelude {
    pub use crate::error::{SimError, SimResult};
    pub use crate::network::{Contact, ContactDetector, ContactSet, MessageId, NodeId, Role};
    pub use crate::strategies::{ReplicationStrategy, StrategyRegistry};
    pub use crate::simulation::{
        ClockState, Command, EventKind, Placement, Scenario, SimConfig, SimEvent, SimSnapshot,
        Simulation, TickResult,
    };
    pub use crate::metrics::StatsSnapshot;
}
