// Random-direction mobility with wall reflection.
// The small random heading changes keep nodes out of periodic orbits so the
// contact graph keeps churning over long runs.

use crate::network::Node;
use rand::Rng;
use rand_distr::{Distribution, UnitCircle};

pub const TURN_PROBABILITY: f64 = 0.02;
pub const HEADING_JITTER: f64 = 0.5;
/// Absolute ceiling after a heading change, raised to the base speed when that is faster
pub const MAX_SPEED: f64 = 3.0;
pub const SPAWN_MARGIN: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct MobilityModel {
    speed: f64,
    speed_scale: f64,
    max_speed: f64,
    turn_probability: f64,
    jitter: f64,
}

impl MobilityModel {
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            speed_scale: 1.0,
            max_speed: MAX_SPEED.max(speed),
            turn_probability: TURN_PROBABILITY,
            jitter: HEADING_JITTER,
        }
    }

    pub fn with_speed_scale(mut self, scale: f64) -> Self {
        self.speed_scale = scale;
        self
    }

    pub fn with_turn_probability(mut self, probability: f64) -> Self {
        self.turn_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = max_speed;
        self
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Uniform heading at the configured speed
    pub fn random_velocity<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let [x, y]: [f64; 2] = UnitCircle.sample(rng);
        (x * self.speed, y * self.speed)
    }

    /// Uniform position that keeps the whole node circle inside the area
    pub fn spawn_position<R: Rng + ?Sized>(
        &self,
        radius: f64,
        area_width: f64,
        area_height: f64,
        rng: &mut R,
    ) -> (f64, f64) {
        (
            spawn_coordinate(radius, area_width, rng),
            spawn_coordinate(radius, area_height, rng),
        )
    }

    pub fn step<R: Rng + ?Sized>(
        &self,
        node: &mut Node,
        area_width: f64,
        area_height: f64,
        rng: &mut R,
    ) {
        if rng.r#gen::<f64>() < self.turn_probability {
            self.perturb(node, rng);
        }

        node.x += node.dx * self.speed_scale;
        node.y += node.dy * self.speed_scale;

        reflect(&mut node.x, &mut node.dx, node.radius, area_width);
        reflect(&mut node.y, &mut node.dy, node.radius, area_height);
    }

    fn perturb<R: Rng + ?Sized>(&self, node: &mut Node, rng: &mut R) {
        node.dx += (rng.r#gen::<f64>() - 0.5) * self.jitter;
        node.dy += (rng.r#gen::<f64>() - 0.5) * self.jitter;

        let speed = node.speed();
        if speed > self.max_speed {
            node.dx = node.dx / speed * self.max_speed;
            node.dy = node.dy / speed * self.max_speed;
        } else if speed < f64::EPSILON {
            // a node that stalls would never meet anyone again
            let (dx, dy) = self.random_velocity(rng);
            node.dx = dx;
            node.dy = dy;
        }
    }
}

fn spawn_coordinate<R: Rng + ?Sized>(radius: f64, extent: f64, rng: &mut R) -> f64 {
    let (mut lo, mut hi) = (radius + SPAWN_MARGIN, extent - radius - SPAWN_MARGIN);
    if hi <= lo {
        lo = radius;
        hi = extent - radius;
    }
    if hi <= lo {
        return extent / 2.0;
    }
    rng.gen_range(lo..hi)
}

fn reflect(position: &mut f64, velocity: &mut f64, radius: f64, extent: f64) {
    if *position - radius < 0.0 {
        *velocity = velocity.abs();
        *position = radius;
    } else if *position + radius > extent {
        *velocity = -velocity.abs();
        *position = extent - radius;
    }
}
