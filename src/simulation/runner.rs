use super::{ClockState, Simulation, SimConfig, SimEvent, SimSnapshot};
use crate::metrics::analyzer::{self, AnalysisReport};
use crate::metrics::logger::CsvLog;
use crate::metrics::StatsSnapshot;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const FRAME_INTERVAL: Duration = Duration::from_millis(16); // ~60fps

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: AnalysisReport,
    pub final_state: SimSnapshot,
    pub history: Vec<StatsSnapshot>,
    pub events: Vec<SimEvent>,
}

/// Drives a `Simulation` for a fixed number of ticks, headless or frame-paced,
/// and collects what the CLI needs to report on it.
pub struct Runner {
    sim: Simulation,
    ticks: u64,
    inject_every: Option<u64>,
    show_progress: bool,
    events: Vec<SimEvent>,
}

impl Runner {
    pub fn new(config: SimConfig, ticks: u64) -> Result<Self> {
        let sim = Simulation::initialize(config)?.with_history();
        Ok(Self {
            sim,
            ticks,
            inject_every: None,
            show_progress: false,
            events: Vec::new(),
        })
    }

    /// Flooding only: inject a random message at tick 0 and every `every` ticks
    pub fn with_injection_interval(mut self, every: u64) -> Self {
        self.inject_every = (every > 0).then_some(every);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_speed_setting(mut self, setting: u32) -> Self {
        self.sim.set_speed_setting(setting);
        self
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// As fast as possible, stops early on completion
    pub fn run(mut self) -> Result<RunOutcome> {
        let pb = self.progress_bar()?;
        self.sim.start()?;
        self.maybe_inject()?;

        while self.sim.current_tick() < self.ticks && self.sim.state() == ClockState::Running {
            let result = self.sim.tick()?;
            self.events.extend(result.events);
            self.maybe_inject()?;
            self.update_progress(&pb);
        }

        pb.finish_with_message(self.finish_message());
        Ok(self.finish())
    }

    /// Paced by a frame timer and the simulation's own frame pacer; stops on
    /// cancellation between frames.
    pub async fn run_realtime(mut self, cancel: CancellationToken) -> Result<RunOutcome> {
        let pb = self.progress_bar()?;
        self.sim.start()?;
        self.maybe_inject()?;

        let mut frames = interval(FRAME_INTERVAL);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.sim.current_tick() < self.ticks && self.sim.state() == ClockState::Running {
            tokio::select! {
                _ = frames.tick() => {
                    if let Some(result) = self.sim.on_frame(Instant::now())? {
                        self.events.extend(result.events);
                        self.maybe_inject()?;
                        self.update_progress(&pb);
                    }
                }
                _ = cancel.cancelled() => {
                    warn!("Run cancelled at tick {}", self.sim.current_tick());
                    self.sim.pause()?;
                    break;
                }
            }
        }

        pb.finish_with_message(self.finish_message());
        Ok(self.finish())
    }

    fn maybe_inject(&mut self) -> Result<()> {
        let Some(every) = self.inject_every else {
            return Ok(());
        };
        if !self.sim.config().scenario.allows_injection() {
            return Ok(());
        }
        if self.sim.current_tick() % every == 0 {
            self.sim.inject_random_message()?;
        }
        Ok(())
    }

    fn progress_bar(&self) -> Result<ProgressBar> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(self.ticks);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} ticks {msg}")?
                .progress_chars("█▓░"),
        );
        Ok(pb)
    }

    fn update_progress(&self, pb: &ProgressBar) {
        pb.set_position(self.sim.current_tick());
        let stats = self.sim.stats();
        pb.set_message(format!(
            "Delivered: {}/{} | Contacts: {}",
            stats.messages_delivered, stats.messages_created, stats.active_contacts
        ));
    }

    fn finish_message(&self) -> String {
        match self.sim.state() {
            ClockState::Completed => format!("Delivered at tick {}", self.sim.current_tick()),
            _ => "Simulation complete".to_string(),
        }
    }

    fn finish(mut self) -> RunOutcome {
        // messages injected after the last tick
        self.events.extend(self.sim.drain_pending_events());

        let final_state = self.sim.snapshot();
        let history = self.sim.history().to_vec();
        let report = analyzer::analyze(
            &final_state,
            &history,
            &self.sim.config().scenario.to_string(),
            self.sim.strategy_name(),
        );

        info!(
            "{}: {} ticks, delivered {}/{} ({:.1}%), avg delay {:.1} ticks",
            self.sim.config().name,
            final_state.tick,
            report.messages_delivered,
            report.messages_created,
            report.delivery_rate * 100.0,
            report.average_delay
        );

        RunOutcome {
            report,
            final_state,
            history,
            events: self.events,
        }
    }
}

/// Stats csv, event csv, analysis json and final snapshot json, timestamped
pub fn save_results(outcome: &RunOutcome, name: &str, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let base = format!("{}_{}", name, timestamp);

    let stats_path = dir.join(format!("{}.csv", base));
    CsvLog::create(&stats_path)?.stats(&outcome.history)?;
    info!("Stats saved to: {}", stats_path.display());

    let events_path = dir.join(format!("{}_events.csv", base));
    CsvLog::create(&events_path)?.events(&outcome.events)?;
    info!("Events saved to: {}", events_path.display());

    let report_path = dir.join(format!("{}_analysis.json", base));
    std::fs::write(&report_path, serde_json::to_string_pretty(&outcome.report)?)?;
    info!("Analysis saved to: {}", report_path.display());

    let snapshot_path = dir.join(format!("{}_final.json", base));
    std::fs::write(&snapshot_path, serde_json::to_string_pretty(&outcome.final_state)?)?;

    Ok(vec![stats_path, events_path, report_path, snapshot_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Placement;

    #[test]
    fn headless_run_stops_at_tick_budget() {
        let config = SimConfig::flooding().with_seed(5);
        let outcome = Runner::new(config, 50)
            .unwrap()
            .with_injection_interval(10)
            .run()
            .unwrap();

        assert_eq!(outcome.final_state.tick, 50);
        assert_eq!(outcome.history.len(), 50);
        // ticks 0, 10, 20, 30, 40, 50
        assert_eq!(outcome.report.messages_created, 6);
    }

    #[test]
    fn exported_events_match_created_count() {
        let config = SimConfig::flooding().with_seed(5);
        let outcome = Runner::new(config, 50)
            .unwrap()
            .with_injection_interval(10)
            .run()
            .unwrap();

        let created = outcome
            .events
            .iter()
            .filter(|e| matches!(e.kind, crate::simulation::EventKind::Created { .. }))
            .count() as u64;
        assert_eq!(created, outcome.report.messages_created);
        assert_eq!(created, outcome.final_state.messages.len() as u64);
    }

    #[test]
    fn single_target_run_stops_on_delivery() {
        let config = SimConfig::single_target()
            .with_area(200, 200)
            .with_placements(vec![Placement::at(50.0, 50.0), Placement::at(60.0, 50.0)])
            .with_seed(1);
        let outcome = Runner::new(config, 1000).unwrap().run().unwrap();

        assert_eq!(outcome.final_state.state, ClockState::Completed);
        assert_eq!(outcome.final_state.tick, 1);
        assert_eq!(outcome.report.delivery_rate, 1.0);
        assert_eq!(outcome.report.average_hops, 1.0);
    }

    #[tokio::test]
    async fn realtime_run_honours_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let config = SimConfig::flooding().with_seed(5);
        let outcome = Runner::new(config, 1_000_000)
            .unwrap()
            .run_realtime(cancel)
            .await
            .unwrap();

        assert!(outcome.final_state.tick < 1_000_000);
        assert_eq!(outcome.final_state.state, ClockState::Paused);
    }

    #[tokio::test]
    async fn realtime_run_reaches_budget() {
        let config = SimConfig::flooding().with_seed(8);
        let outcome = Runner::new(config, 3)
            .unwrap()
            .with_speed_setting(10)
            .run_realtime(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.final_state.tick, 3);
    }

    #[test]
    fn results_land_on_disk() {
        let dir = std::env::temp_dir().join(format!("dtnsim-results-{}", std::process::id()));
        let outcome = Runner::new(SimConfig::flooding().with_seed(3), 5)
            .unwrap()
            .with_injection_interval(2)
            .run()
            .unwrap();

        let paths = save_results(&outcome, "unit", &dir).unwrap();
        assert!(paths.iter().all(|p| p.exists()));

        std::fs::remove_dir_all(&dir).ok();
    }
}
