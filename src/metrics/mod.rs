pub mod logger;
pub mod analyzer;

use crate::simulation::event::{EventKind, SimEvent};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub tick: u64,
    pub messages_created: u64,
    pub messages_delivered: u64,
    pub transfers: u64,
    pub active_contacts: usize,
    pub carriers: usize,
    pub delivery_rate: f64,
    pub average_delay: f64,
}

/// Running counters folded from the event stream.
///
/// Everything is monotonic except `active_contacts` and `carriers`, which are
/// overwritten every tick.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    tick: u64,
    created: u64,
    delivered: u64,
    cumulative_delay: u64,
    transfers: u64,
    active_contacts: usize,
    carriers: usize,
    keep_history: bool,
    history: Vec<StatsSnapshot>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also keep one snapshot per tick for export
    pub fn with_history(mut self) -> Self {
        self.keep_history = true;
        self
    }

    pub fn set_history(&mut self, keep: bool) {
        self.keep_history = keep;
    }

    pub fn record(&mut self, event: &SimEvent) {
        match event.kind {
            EventKind::Created { .. } => self.created += 1,
            EventKind::Transfer { .. } => self.transfers += 1,
            EventKind::Delivered { delay, .. } => {
                if self.delivered >= self.created {
                    warn!("Delivery of message {} without a matching creation - stats may be off", event.message);
                }
                self.delivered += 1;
                self.cumulative_delay += delay;
            }
        }
    }

    /// Per-tick gauges, called once the tick's replication is done
    pub fn observe_tick(&mut self, tick: u64, active_contacts: usize, carriers: usize) {
        self.tick = tick;
        self.active_contacts = active_contacts;
        self.carriers = carriers;

        if self.keep_history {
            let snapshot = self.snapshot();
            self.history.push(snapshot);
        }
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    pub fn active_contacts(&self) -> usize {
        self.active_contacts
    }

    pub fn delivery_rate(&self) -> f64 {
        if self.created > 0 {
            self.delivered as f64 / self.created as f64
        } else {
            0.0
        }
    }

    pub fn average_delay(&self) -> f64 {
        if self.delivered > 0 {
            self.cumulative_delay as f64 / self.delivered as f64
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tick: self.tick,
            messages_created: self.created,
            messages_delivered: self.delivered,
            transfers: self.transfers,
            active_contacts: self.active_contacts,
            carriers: self.carriers,
            delivery_rate: self.delivery_rate(),
            average_delay: self.average_delay(),
        }
    }

    pub fn get_snapshots(&self) -> &[StatsSnapshot] {
        &self.history
    }

    /// Zero everything but keep the history setting
    pub fn reset(&mut self) {
        *self = Self {
            keep_history: self.keep_history,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::MessageId;

    #[test]
    fn empty_stats_are_zero_not_nan() {
        let stats = StatsAggregator::new();
        assert_eq!(stats.delivery_rate(), 0.0);
        assert_eq!(stats.average_delay(), 0.0);
    }

    #[test]
    fn created_without_delivery_has_zero_delay() {
        let mut stats = StatsAggregator::new();
        stats.record(&SimEvent::created(0, MessageId::new(0), 0, 1));
        assert_eq!(stats.delivery_rate(), 0.0);
        assert_eq!(stats.average_delay(), 0.0);
    }

    #[test]
    fn folds_events_into_rates() {
        let mut stats = StatsAggregator::new();
        for id in 0..4 {
            stats.record(&SimEvent::created(0, MessageId::new(id), 0, 1));
        }
        stats.record(&SimEvent::transfer(3, MessageId::new(0), 0, 1, 2.0));
        stats.record(&SimEvent::delivered(3, MessageId::new(0), 0, 1, 3));
        stats.record(&SimEvent::transfer(7, MessageId::new(1), 0, 1, 2.0));
        stats.record(&SimEvent::delivered(7, MessageId::new(1), 0, 1, 7));

        assert_eq!(stats.delivery_rate(), 0.5);
        assert_eq!(stats.average_delay(), 5.0);
        assert_eq!(stats.transfers(), 2);
    }

    #[test]
    fn contacts_are_a_gauge() {
        let mut stats = StatsAggregator::new().with_history();
        stats.observe_tick(1, 5, 2);
        stats.observe_tick(2, 1, 2);

        assert_eq!(stats.active_contacts(), 1);
        let history = stats.get_snapshots();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].active_contacts, 5);
    }

    #[test]
    fn reset_keeps_history_flag() {
        let mut stats = StatsAggregator::new().with_history();
        stats.record(&SimEvent::created(0, MessageId::new(0), 0, 1));
        stats.observe_tick(1, 3, 1);
        stats.reset();

        assert_eq!(stats.snapshot(), StatsSnapshot::default());
        assert!(stats.get_snapshots().is_empty());
        stats.observe_tick(1, 0, 0);
        assert_eq!(stats.get_snapshots().len(), 1);
    }
}
