use super::StatsSnapshot;
use crate::simulation::event::{EventKind, SimEvent};
use anyhow::{Result, anyhow};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

// csv can't serialize the tagged enum directly, so events get flattened
#[derive(Debug, Serialize)]
struct EventRow {
    tick: u64,
    message: u64,
    kind: &'static str,
    from: u32,
    to: u32,
    distance: Option<f64>,
    delay: Option<u64>,
}

impl From<&SimEvent> for EventRow {
    fn from(event: &SimEvent) -> Self {
        let (distance, delay) = match event.kind {
            EventKind::Transfer { distance, .. } => (Some(distance), None),
            EventKind::Delivered { delay, .. } => (None, Some(delay)),
            EventKind::Created { .. } => (None, None),
        };
        Self {
            tick: event.tick,
            message: event.message.value(),
            kind: event.kind_name(),
            from: event.from_node(),
            to: event.to_node(),
            distance,
            delay,
        }
    }
}

/// One csv table per run artefact: stats rows per tick, or the event log.
/// Generic over the sink so runs can be exported to memory as well as disk.
pub struct CsvLog<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

impl CsvLog<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: Write> CsvLog<W> {
    pub fn from_writer(sink: W) -> Self {
        Self {
            writer: Writer::from_writer(sink),
            rows: 0,
        }
    }

    pub fn stats(&mut self, history: &[StatsSnapshot]) -> Result<()> {
        self.write_rows(history)
    }

    pub fn events(&mut self, events: &[SimEvent]) -> Result<()> {
        self.write_rows(events.iter().map(EventRow::from))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow!("flushing csv log: {}", e.error()))
    }

    fn write_rows<R: Serialize>(&mut self, rows: impl IntoIterator<Item = R>) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
            self.rows += 1;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::MessageId;

    #[test]
    fn event_rows_are_flattened() {
        let mut log = CsvLog::from_writer(Vec::new());
        log.events(&[
            SimEvent::created(0, MessageId::new(0), 0, 2),
            SimEvent::transfer(1, MessageId::new(0), 0, 2, 12.5),
            SimEvent::delivered(1, MessageId::new(0), 0, 2, 1),
        ])
        .unwrap();
        assert_eq!(log.rows(), 3);

        let content = String::from_utf8(log.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "tick,message,kind,from,to,distance,delay");
        assert_eq!(lines[1], "0,0,created,0,2,,");
        assert_eq!(lines[2], "1,0,transfer,0,2,12.5,");
        assert_eq!(lines[3], "1,0,delivered,0,2,,1");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn stats_rows_follow_history() {
        let history = [
            StatsSnapshot {
                tick: 1,
                messages_created: 1,
                active_contacts: 2,
                ..StatsSnapshot::default()
            },
            StatsSnapshot {
                tick: 2,
                messages_created: 1,
                messages_delivered: 1,
                delivery_rate: 1.0,
                ..StatsSnapshot::default()
            },
        ];
        let mut log = CsvLog::from_writer(Vec::new());
        log.stats(&history).unwrap();

        let content = String::from_utf8(log.into_inner().unwrap()).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("tick,messages_created,messages_delivered"));
        assert!(lines.next().unwrap().starts_with("1,1,0,"));
        assert!(lines.next().unwrap().starts_with("2,1,1,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn writes_to_disk() {
        let dir = std::env::temp_dir().join(format!("dtnsim-logger-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.csv");

        CsvLog::create(&path)
            .unwrap()
            .events(&[SimEvent::created(3, MessageId::new(4), 1, 0)])
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(1), Some("3,4,created,1,0,,"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
