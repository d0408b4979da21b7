use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use bsp::{Dataset, LocalCluster, OutputRecord, PeerId};
use regression::{Configuration, Payload};
use serde::Deserialize;

/// Where the training examples come from.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSpec {
    Inline {
        data: Vec<f64>,
        x_size: usize,
    },
    Local {
        path: PathBuf,
        #[serde(default)]
        x_size: Option<usize>,
    },
}

/// A training job as described by a JSON file.
#[derive(Debug, Deserialize)]
pub struct JobSpec {
    #[serde(default)]
    pub peers: Option<NonZeroUsize>,
    #[serde(default)]
    pub peer_ids: Option<Vec<PeerId>>,
    #[serde(default)]
    pub conf: Configuration,
    pub dataset: DatasetSpec,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl JobSpec {
    /// Loads a `JobSpec` from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;

        serde_json::from_str(&content).with_context(|| format!("invalid job {}", path.display()))
    }

    /// Reads the dataset, resolving relative paths against `base`.
    pub fn dataset(&self, base: &Path) -> anyhow::Result<Dataset> {
        let dataset = match &self.dataset {
            DatasetSpec::Inline { data, x_size } => Dataset::new(data.clone(), *x_size)?,
            DatasetSpec::Local { path, x_size } => {
                let path = base.join(path);
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                Dataset::from_csv(&text, *x_size)?
            }
        };

        if dataset.is_empty() {
            bail!("the dataset has no rows");
        }

        Ok(dataset)
    }

    /// The peers' names, in enumeration order.
    pub fn peer_ids(&self) -> anyhow::Result<Vec<PeerId>> {
        match (&self.peer_ids, self.peers) {
            (Some(ids), Some(n)) if ids.len() != n.get() => {
                bail!("peers is {n} but {} peer_ids were given", ids.len())
            }
            (Some(ids), _) => Ok(ids.clone()),
            (None, n) => {
                let n = n.map_or(1, NonZeroUsize::get);
                Ok((0..n).map(|i| PeerId::new(format!("peer-{i}"))).collect())
            }
        }
    }

    /// Partitions `dataset` across the job's peers.
    pub fn cluster(&self, dataset: &Dataset) -> anyhow::Result<LocalCluster<Payload>> {
        let ids = self.peer_ids()?;
        let partitions = dataset.partition(ids.len());
        Ok(LocalCluster::with_ids(ids, partitions)?)
    }
}

/// Writes `records` as JSON lines.
pub fn write_records(path: &Path, records: &[OutputRecord]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_job() {
        let job: JobSpec = serde_json::from_str(
            r#"{
                "peers": 3,
                "conf": { "alpha": 0.1, "regression.model.class": "linear" },
                "dataset": { "inline": { "data": [1, 1, 1, 1, 1, 1], "x_size": 1 } }
            }"#,
        )
        .unwrap();

        let ds = job.dataset(Path::new(".")).unwrap();
        assert_eq!(ds.len(), 3);

        let cluster = job.cluster(&ds).unwrap();
        assert_eq!(cluster.ids().len(), 3);
        assert_eq!(job.conf.get_float("alpha", 0.0), Ok(0.1));
        assert!(job.output.is_none());
    }

    #[test]
    fn explicit_ids_define_the_job_size() {
        let job: JobSpec = serde_json::from_str(
            r#"{
                "peer_ids": ["a", "b"],
                "dataset": { "inline": { "data": [1, 1], "x_size": 1 } }
            }"#,
        )
        .unwrap();

        assert_eq!(job.peer_ids().unwrap(), vec![PeerId::new("a"), PeerId::new("b")]);
    }

    #[test]
    fn mismatched_ids_are_rejected() {
        let job: JobSpec = serde_json::from_str(
            r#"{
                "peers": 3,
                "peer_ids": ["a", "b"],
                "dataset": { "inline": { "data": [1, 1], "x_size": 1 } }
            }"#,
        )
        .unwrap();

        assert!(job.peer_ids().is_err());
    }

    #[test]
    fn defaults_to_a_single_peer() {
        let job: JobSpec =
            serde_json::from_str(r#"{ "dataset": { "local": { "path": "data.csv" } } }"#).unwrap();

        assert_eq!(job.peer_ids().unwrap(), vec![PeerId::new("peer-0")]);
        assert!(job.dataset(Path::new("/nonexistent")).is_err());
    }

    #[test]
    fn bundled_job_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("jobs");
        let job = JobSpec::load(&dir.join("linear.json")).unwrap();
        let ds = job.dataset(&dir).unwrap();

        assert_eq!(ds.x_size(), 2);
        assert!(!ds.is_empty());
        assert!(job.cluster(&ds).is_ok());
    }
}
