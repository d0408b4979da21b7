use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::PeerId;

/// One `(theta, cost)` pair written by a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub writer: PeerId,
    pub superstep: u64,
    pub theta: Vec<f64>,
    pub cost: f64,
}

/// The job's output, shared by every peer of a cluster.
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    records: Arc<Mutex<Vec<OutputRecord>>>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, record: OutputRecord) {
        self.records.lock().push(record);
    }

    /// Returns a snapshot of every record written so far, in write order.
    pub fn records(&self) -> Vec<OutputRecord> {
        self.records.lock().clone()
    }

    pub fn last(&self) -> Option<OutputRecord> {
        self.records.lock().last().cloned()
    }

    /// Returns the distinct peers that wrote at least one record.
    pub fn writers(&self) -> Vec<PeerId> {
        let mut writers: Vec<_> = self
            .records
            .lock()
            .iter()
            .map(|r| r.writer.clone())
            .collect();

        writers.sort();
        writers.dedup();
        writers
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(writer: &str, cost: f64) -> OutputRecord {
        OutputRecord {
            writer: PeerId::new(writer),
            superstep: 0,
            theta: vec![cost],
            cost,
        }
    }

    #[test]
    fn clones_share_the_same_records() {
        let log = OutputLog::new();
        let other = log.clone();

        log.append(record("peer-1", 2.0));
        other.append(record("peer-1", 1.0));
        log.append(record("peer-0", 0.5));

        assert_eq!(log.len(), 3);
        assert_eq!(other.last().map(|r| r.cost), Some(0.5));
        assert_eq!(
            log.writers(),
            vec![PeerId::new("peer-0"), PeerId::new("peer-1")]
        );
    }
}
