use std::{fmt, path::Path};

use eyre::Result;
use tracing::debug;

use crate::{
    config::Settings,
    engine::{Engine, Invocation, JobPaths, ScratchIsolation},
    sweep::{SweepPoint, SweepSpec},
};

/// Separates the fields of a job identity, never part of a mode or an integer
pub const ID_DELIMITER: char = '-';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(point: &SweepPoint) -> Self {
        let d = ID_DELIMITER;
        Self(format!(
            "bench{d}{}{d}{}{d}{}{d}{}",
            point.mode, point.size, point.block_size, point.run
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One independently runnable benchmark invocation
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub point: SweepPoint,
    pub paths: JobPaths,
    pub invocation: Invocation,
}

/// Turns every point of the sweep into a job for `engine`
///
/// Jobs of an engine with [`ScratchIsolation::Shared`] all point at the same
/// scratch directory; running them concurrently is refused by the runner.
pub fn emit_jobs(sweep: &SweepSpec, engine: &dyn Engine, settings: &Settings) -> Result<Vec<Job>> {
    let points = sweep.points()?;
    debug!(
        "Emitting {} jobs for engine {}",
        points.len(),
        engine.name()
    );

    Ok(points
        .into_iter()
        .map(|point| {
            let id = JobId::new(&point);
            let paths = JobPaths {
                programs: settings.programs.clone(),
                scratch: scratch_dir(&settings.scratch, engine.scratch(), &id),
                results: settings.results.clone(),
            };
            let invocation = engine.invocation(&point, &paths);
            Job {
                id,
                point,
                paths,
                invocation,
            }
        })
        .collect())
}

fn scratch_dir(scratch: &Path, isolation: ScratchIsolation, id: &JobId) -> std::path::PathBuf {
    match isolation {
        ScratchIsolation::PerJob => scratch.join(id.as_str()),
        ScratchIsolation::Shared => scratch.to_path_buf(),
    }
}
