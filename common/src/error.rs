use std::{fmt, process::ExitStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown execution engine {0:?}")]
    UnknownEngine(String),
    #[error("invalid mode {0:?}")]
    InvalidMode(String),
    #[error("sweep dimension `{0}` is empty")]
    EmptyDimension(&'static str),
    #[error("sweep dimension `{dimension}` lists {value} more than once")]
    DuplicateValue {
        dimension: &'static str,
        value: String,
    },
    #[error("batch of {expected} jobs left {found} result records")]
    MissingRecords { expected: usize, found: usize },
    #[error("engine {engine} shares one scratch directory between jobs, cannot run {jobs} jobs at once")]
    SharedScratch { engine: &'static str, jobs: usize },
    #[error("malformed result set {0:?}, expected label=path")]
    MalformedPair(String),
    #[error("result set label {0:?} given more than once")]
    DuplicateLabel(String),
    #[error("no result set labelled {0:?} to use as baseline")]
    UnknownBaseline(String),
    #[error("{program} exited with {status}")]
    JobFailed {
        program: String,
        status: ExitStatus,
        job: Option<String>,
    },
    #[error("no results for facet {0}")]
    EmptyFacet(String),
    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),
}

/// Pipeline phase, attached to errors so failures name where they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SweepGeneration,
    JobExecution,
    Aggregation,
    Rendering,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SweepGeneration => "sweep generation",
            Stage::JobExecution => "job execution",
            Stage::Aggregation => "aggregation",
            Stage::Rendering => "rendering",
        };
        write!(f, "{name} failed")
    }
}
