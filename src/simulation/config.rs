use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Many independent messages, unrestricted epidemic flooding, runs forever
    Flooding,
    /// One tracked message from node 0 to the last node, anti-replay forwarding
    #[default]
    SingleTarget,
}

impl Scenario {
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Scenario::Flooding => "flooding",
            Scenario::SingleTarget => "single-target",
        }
    }

    /// Whether delivering every message ends the run
    pub fn completes(&self) -> bool {
        matches!(self, Scenario::SingleTarget)
    }

    pub fn allows_injection(&self) -> bool {
        matches!(self, Scenario::Flooding)
    }

    pub fn all() -> [Scenario; 2] {
        [Scenario::Flooding, Scenario::SingleTarget]
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.strategy_name())
    }
}

impl FromStr for Scenario {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flooding" | "flood" | "epidemic" => Ok(Scenario::Flooding),
            "single-target" | "single" | "anti-replay" => Ok(Scenario::SingleTarget),
            other => Err(SimError::InvalidConfiguration(format!("unknown scenario: {}", other))),
        }
    }
}

/// Fixed starting position and velocity for one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Placement {
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, dx: 0.0, dy: 0.0 }
    }

    pub fn moving(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        Self { x, y, dx, dy }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub name: String,
    pub scenario: Scenario,
    pub node_count: u32,
    pub speed: f64,
    pub range: f64,
    pub area_width: u32,
    pub area_height: u32,
    /// Flooding only: keep copying a message after it reached its destination
    pub continue_after_delivery: bool,
    pub seed: Option<u64>,
    pub node_radius: Option<f64>,
    /// Overrides random placement, one entry per node
    pub placements: Option<Vec<Placement>>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::single_target()
    }
}

impl SimConfig {
    pub fn single_target() -> Self {
        Self {
            name: "single_target".to_string(),
            scenario: Scenario::SingleTarget,
            node_count: 15,
            speed: 1.5,
            range: 70.0,
            area_width: 1200,
            area_height: 700,
            continue_after_delivery: true,
            seed: None,
            node_radius: None,
            placements: None,
        }
    }

    pub fn flooding() -> Self {
        Self {
            name: "flooding".to_string(),
            scenario: Scenario::Flooding,
            node_count: 6,
            speed: 1.0,
            range: 100.0,
            area_width: 800,
            area_height: 600,
            ..Self::single_target()
        }
    }

    pub fn for_scenario(scenario: Scenario) -> Self {
        match scenario {
            Scenario::Flooding => Self::flooding(),
            Scenario::SingleTarget => Self::single_target(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_nodes(mut self, count: u32) -> Self {
        self.node_count = count;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    pub fn with_area(mut self, width: u32, height: u32) -> Self {
        self.area_width = width;
        self.area_height = height;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.node_radius = Some(radius);
        self
    }

    pub fn with_continue_after_delivery(mut self, keep_going: bool) -> Self {
        self.continue_after_delivery = keep_going;
        self
    }

    /// Also sets the node count to the number of placements
    pub fn with_placements(mut self, placements: Vec<Placement>) -> Self {
        self.node_count = placements.len() as u32;
        self.placements = Some(placements);
        self
    }

    /// Nodes get smaller in crowded runs
    pub fn radius(&self) -> f64 {
        self.node_radius
            .unwrap_or(if self.node_count > 50 { 7.0 } else { 10.0 })
    }

    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: String| Err(SimError::InvalidConfiguration(msg));

        if self.node_count < 2 {
            return invalid(format!("need at least 2 nodes, got {}", self.node_count));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return invalid(format!("speed must be positive, got {}", self.speed));
        }
        if !self.range.is_finite() || self.range <= 0.0 {
            return invalid(format!("range must be positive, got {}", self.range));
        }
        if self.area_width == 0 || self.area_height == 0 {
            return invalid(format!(
                "area must be non-empty, got {}x{}",
                self.area_width, self.area_height
            ));
        }

        let radius = self.radius();
        if !radius.is_finite() || radius < 0.0 {
            return invalid(format!("node radius must be non-negative, got {}", radius));
        }
        let (width, height) = (self.area_width as f64, self.area_height as f64);
        if width < 2.0 * radius || height < 2.0 * radius {
            return invalid(format!(
                "a node of radius {} does not fit in {}x{}",
                radius, self.area_width, self.area_height
            ));
        }

        if let Some(placements) = &self.placements {
            if placements.len() != self.node_count as usize {
                return invalid(format!(
                    "{} placements for {} nodes",
                    placements.len(),
                    self.node_count
                ));
            }
            for (id, p) in placements.iter().enumerate() {
                let inside = (radius..=width - radius).contains(&p.x)
                    && (radius..=height - radius).contains(&p.y);
                if !inside || !p.dx.is_finite() || !p.dy.is_finite() {
                    return invalid(format!("placement of node {} is outside the area", id));
                }
            }
        }

        Ok(())
    }
}
