use super::StatsSnapshot;
use crate::simulation::snapshot::SimSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub scenario: String,
    pub strategy_name: String,
    pub node_count: usize,
    pub ticks: u64,
    pub messages_created: u64,
    pub messages_delivered: u64,
    pub delivery_rate: f64,
    pub average_delay: f64,
    /// Mean route length (hops) of delivered messages
    pub average_hops: f64,
    pub transfers: u64,
    pub peak_contacts: usize,
    pub avg_contacts: f64,
    pub peak_carriers: usize,
}

pub fn analyze(
    final_state: &SimSnapshot,
    history: &[StatsSnapshot],
    scenario: &str,
    strategy_name: &str,
) -> AnalysisReport {
    let stats = &final_state.stats;

    let delivered: Vec<_> = final_state.messages.iter().filter(|m| m.delivered).collect();
    let average_hops = if delivered.is_empty() {
        0.0
    } else {
        delivered
            .iter()
            .map(|m| m.path.len().saturating_sub(1) as f64)
            .sum::<f64>()
            / delivered.len() as f64
    };

    let peak_contacts = history.iter().map(|s| s.active_contacts).max().unwrap_or(0);
    let avg_contacts = if history.is_empty() {
        0.0
    } else {
        history.iter().map(|s| s.active_contacts as f64).sum::<f64>() / history.len() as f64
    };
    let peak_carriers = history
        .iter()
        .map(|s| s.carriers)
        .max()
        .unwrap_or(stats.carriers);

    AnalysisReport {
        scenario: scenario.to_string(),
        strategy_name: strategy_name.to_string(),
        node_count: final_state.nodes.len(),
        ticks: final_state.tick,
        messages_created: stats.messages_created,
        messages_delivered: stats.messages_delivered,
        delivery_rate: stats.delivery_rate,
        average_delay: stats.average_delay,
        average_hops,
        transfers: stats.transfers,
        peak_contacts,
        avg_contacts,
        peak_carriers,
    }
}

/// Mean of repeated runs of the same scenario
pub fn average_reports(reports: &[AnalysisReport]) -> Option<AnalysisReport> {
    let first = reports.first()?;
    let n = reports.len() as f64;
    let mean = |f: fn(&AnalysisReport) -> f64| reports.iter().map(f).sum::<f64>() / n;

    Some(AnalysisReport {
        scenario: first.scenario.clone(),
        strategy_name: first.strategy_name.clone(),
        node_count: first.node_count,
        ticks: mean(|r| r.ticks as f64).round() as u64,
        messages_created: mean(|r| r.messages_created as f64).round() as u64,
        messages_delivered: mean(|r| r.messages_delivered as f64).round() as u64,
        delivery_rate: mean(|r| r.delivery_rate),
        average_delay: mean(|r| r.average_delay),
        average_hops: mean(|r| r.average_hops),
        transfers: mean(|r| r.transfers as f64).round() as u64,
        peak_contacts: reports.iter().map(|r| r.peak_contacts).max().unwrap_or(0),
        avg_contacts: mean(|r| r.avg_contacts),
        peak_carriers: reports.iter().map(|r| r.peak_carriers).max().unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(rate: f64, delay: f64, contacts: usize) -> AnalysisReport {
        AnalysisReport {
            scenario: "flooding".into(),
            strategy_name: "Flooding".into(),
            node_count: 6,
            ticks: 100,
            messages_created: 4,
            messages_delivered: 2,
            delivery_rate: rate,
            average_delay: delay,
            average_hops: 2.0,
            transfers: 10,
            peak_contacts: contacts,
            avg_contacts: contacts as f64,
            peak_carriers: 6,
        }
    }

    #[test]
    fn averages_rates_and_keeps_peaks() {
        let avg = average_reports(&[report(0.5, 10.0, 3), report(1.0, 20.0, 7)]).unwrap();
        assert_eq!(avg.delivery_rate, 0.75);
        assert_eq!(avg.average_delay, 15.0);
        assert_eq!(avg.peak_contacts, 7);
        assert_eq!(avg.avg_contacts, 5.0);
    }

    #[test]
    fn no_reports_no_average() {
        assert!(average_reports(&[]).is_none());
    }
}
