use core::fmt::Debug;
use std::path::PathBuf;

use downcast_rs::{Downcast, impl_downcast};
use dyn_clone::{DynClone, clone_trait_object};
use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::{error::PipelineError, sweep::SweepPoint};

/// Whether jobs of an engine can each be given their own scratch directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScratchIsolation {
    /// Every job gets `<scratch>/<job id>`
    PerJob,
    /// All jobs share `<scratch>`, so at most one may run at a time
    Shared,
}

/// Paths handed to an engine, relative to the directory the job runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub programs: PathBuf,
    pub scratch: PathBuf,
    pub results: PathBuf,
}

/// A fully resolved external command, run from the sweep root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.args.extend(args.into_iter().map(|x| x.to_string()));
        self
    }
}

/// Backend that runs the workload generator for one sweep point
#[typetag::serde(tag = "type")]
pub trait Engine: Debug + DynClone + Downcast + Send + Sync {
    /// Name of the engine, for identification
    fn name(&self) -> &'static str;
    /// How the engine maps the scratch directory into the workload
    fn scratch(&self) -> ScratchIsolation;
    /// Builds the command for a point
    ///
    /// Arguments:
    /// * `point` - The sweep point to run, passed positionally as `(mode, size, block_size, run)`
    /// * `paths` - Programs, scratch and results directories relative to the sweep root
    fn invocation(&self, point: &SweepPoint, paths: &JobPaths) -> Invocation;
}
clone_trait_object!(Engine);
impl_downcast!(Engine);

/// Builds an engine with its default settings from its registered name
pub fn engine_from_name(name: &str) -> Result<Box<dyn Engine>> {
    serde_json::from_value(serde_json::json!({ "type": name }))
        .map_err(|_| PipelineError::UnknownEngine(name.to_owned()).into())
}
