use std::{fmt, path::PathBuf, str::FromStr};

use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{engine::Engine, sweep::SweepSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    pub engine: Box<dyn Engine>,
    pub sweep: SweepSpec,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yml::from_str(yaml).context("Parsing sweep config")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Working directory of every job, `programs`, `scratch` and `results` are relative to it
    pub root: PathBuf,
    pub programs: PathBuf,
    pub scratch: PathBuf,
    pub results: PathBuf,
    /// Aggregated records, relative to the current directory
    pub output: PathBuf,
    pub executor: Executor,
    /// Maximum number of jobs in flight
    pub jobs: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("target"),
            programs: PathBuf::from("programs"),
            scratch: PathBuf::from("scratch"),
            results: PathBuf::from("results"),
            output: PathBuf::from("target/results.json"),
            executor: Executor::default(),
            jobs: None,
        }
    }
}

/// Facility the jobs of a batch are handed to
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Executor {
    /// Generated makefile, run with `make`
    #[default]
    Make,
    /// Child processes spawned directly
    Local,
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::Make => f.write_str("make"),
            Executor::Local => f.write_str("local"),
        }
    }
}

impl FromStr for Executor {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "make" => Ok(Executor::Make),
            "local" => Ok(Executor::Local),
            _ => bail!("unknown executor {s:?}, expected make or local"),
        }
    }
}
