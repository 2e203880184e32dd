use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    #[default]
    Idle,
    Running,
    Paused,
    /// Terminal; only reached when the scenario tracks a single message
    Completed,
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClockState::Idle => "idle",
            ClockState::Running => "running",
            ClockState::Paused => "paused",
            ClockState::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Pause,
    Reset,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Reset => "reset",
        };
        f.write_str(name)
    }
}

impl ClockState {
    /// Transition table. Whether state gets rebuilt is up to the caller.
    pub fn next(self, command: Command) -> SimResult<ClockState> {
        match (self, command) {
            (ClockState::Idle | ClockState::Paused, Command::Start) => Ok(ClockState::Running),
            (ClockState::Running, Command::Pause) => Ok(ClockState::Paused),
            (_, Command::Reset) => Ok(ClockState::Idle),
            (from, command) => Err(SimError::InvalidStateTransition {
                from,
                action: command.to_string(),
            }),
        }
    }

    pub fn can_tick(self) -> bool {
        self == ClockState::Running
    }
}

pub const DEFAULT_SPEED_SETTING: u32 = 5;

/// Turns externally driven frames into ticks no closer together than
/// `min_interval`, so the simulated step rate doesn't follow the frame rate.
#[derive(Debug, Clone)]
pub struct FramePacer {
    min_interval: Duration,
    last: Option<Instant>,
}

impl FramePacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Speed slider 1..=10 -> 1000 / (10 + 5 * speed) ms between ticks
    pub fn from_speed_setting(setting: u32) -> Self {
        let setting = setting.clamp(1, 10) as f64;
        Self::new(Duration::from_secs_f64(1.0 / (10.0 + 5.0 * setting)))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Next frame ticks immediately
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::from_speed_setting(DEFAULT_SPEED_SETTING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_resume() {
        assert_eq!(ClockState::Idle.next(Command::Start), Ok(ClockState::Running));
        assert_eq!(ClockState::Paused.next(Command::Start), Ok(ClockState::Running));
        assert_eq!(ClockState::Running.next(Command::Pause), Ok(ClockState::Paused));
    }

    #[test]
    fn reset_from_anywhere() {
        for state in [ClockState::Idle, ClockState::Running, ClockState::Paused, ClockState::Completed] {
            assert_eq!(state.next(Command::Reset), Ok(ClockState::Idle));
        }
    }

    #[test]
    fn illegal_transitions() {
        let cases = [
            (ClockState::Running, Command::Start),
            (ClockState::Completed, Command::Start),
            (ClockState::Idle, Command::Pause),
            (ClockState::Paused, Command::Pause),
            (ClockState::Completed, Command::Pause),
        ];
        for (state, command) in cases {
            assert!(matches!(
                state.next(command),
                Err(SimError::InvalidStateTransition { .. })
            ));
        }
    }

    #[test]
    fn pacer_skips_frames_inside_interval() {
        let mut pacer = FramePacer::new(Duration::from_millis(50));
        let t0 = Instant::now();

        assert!(pacer.ready(t0));
        assert!(!pacer.ready(t0 + Duration::from_millis(16)));
        assert!(!pacer.ready(t0 + Duration::from_millis(49)));
        assert!(pacer.ready(t0 + Duration::from_millis(50)));
        assert!(!pacer.ready(t0 + Duration::from_millis(60)));

        pacer.reset();
        assert!(pacer.ready(t0 + Duration::from_millis(61)));
    }

    #[test]
    fn speed_setting_maps_to_interval() {
        assert_eq!(FramePacer::from_speed_setting(1).min_interval(), Duration::from_secs_f64(1.0 / 15.0));
        assert_eq!(FramePacer::from_speed_setting(10).min_interval(), Duration::from_secs_f64(1.0 / 60.0));
        // out of range clamps
        assert_eq!(
            FramePacer::from_speed_setting(0).min_interval(),
            FramePacer::from_speed_setting(1).min_interval()
        );
    }
}
