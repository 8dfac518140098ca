use std::path::{Path, PathBuf};

use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tokio::fs::{read_dir, write};
use tracing::debug;

use crate::{error::PipelineError, sweep::Axis, util::read_json_file};

/// Result of one job, as written by the workload generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub name: String,
    pub size: u64,
    pub block_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<u32>,
    /// Seconds
    pub runtime: f64,
}

impl ResultRecord {
    /// Bytes per second, `None` for degenerate records
    pub fn throughput(&self) -> Option<f64> {
        if self.size == 0 || !self.runtime.is_finite() || self.runtime <= 0.0 {
            return None;
        }
        Some(self.size as f64 / self.runtime)
    }

    /// Value of the independent variable
    pub fn x(&self, axis: Axis) -> u64 {
        match axis {
            Axis::Size => self.size,
            Axis::BlockSize => self.block_size,
        }
    }

    fn other(&self, axis: Axis) -> u64 {
        match axis {
            Axis::Size => self.block_size,
            Axis::BlockSize => self.size,
        }
    }
}

/// Sorts by the independent variable first, the rest only makes the order total
pub fn sort_records(records: &mut [ResultRecord], axis: Axis) {
    records.sort_by(|a, b| {
        a.x(axis)
            .cmp(&b.x(axis))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.other(axis).cmp(&b.other(axis)))
            .then_with(|| a.run.cmp(&b.run))
            .then_with(|| a.runtime.total_cmp(&b.runtime))
    });
}

/// Loads every `*.json` record in a results directory
pub async fn collect_records(dir: &Path) -> Result<Vec<ResultRecord>> {
    let mut entries = read_dir(dir)
        .await
        .with_context(|| format!("Reading results dir {}", dir.display()))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|x| x == "json") && entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    debug!("Found {} result files in {}", paths.len(), dir.display());

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        records.push(read_json_file::<ResultRecord>(&path).await?);
    }
    Ok(records)
}

/// Writes records as one JSON array, sorted along `axis`
pub async fn write_records(path: &Path, records: &[ResultRecord], axis: Axis) -> Result<()> {
    let mut records = records.to_vec();
    sort_records(&mut records, axis);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    write(path, serde_json::to_string(&records)?)
        .await
        .with_context(|| format!("Writing {}", path.display()))?;
    Ok(())
}

pub async fn read_records(path: &Path) -> Result<Vec<ResultRecord>> {
    read_json_file(path).await
}

/// Records of one engine or baseline, as passed on the command line
#[derive(Debug, Clone)]
pub struct NamedResultSet {
    pub label: String,
    pub records: Vec<ResultRecord>,
}

impl NamedResultSet {
    pub async fn load(label: &str, path: &Path) -> Result<Self> {
        Ok(Self {
            label: label.to_owned(),
            records: read_records(path).await?,
        })
    }
}

/// Splits `label=path`, the first `=` separates the two
pub fn parse_pair(pair: &str) -> Result<(String, PathBuf)> {
    match pair.split_once('=') {
        Some((label, path)) if !label.is_empty() && !path.is_empty() => {
            Ok((label.to_owned(), PathBuf::from(path)))
        }
        _ => bail!(PipelineError::MalformedPair(pair.to_owned())),
    }
}

/// Loads every `label=path` pair in order, labels must be unique
pub async fn load_result_sets(pairs: &[String]) -> Result<Vec<NamedResultSet>> {
    let mut sets: Vec<NamedResultSet> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let (label, path) = parse_pair(pair)?;
        if sets.iter().any(|x| x.label == label) {
            bail!(PipelineError::DuplicateLabel(label));
        }
        sets.push(NamedResultSet::load(&label, &path).await?);
    }
    Ok(sets)
}
