use std::{fmt, hash::Hash, str::FromStr};

use eyre::{Result, bail};
use itertools::{Itertools, iproduct};
use serde::{Deserialize, Serialize};

use crate::{error::PipelineError, mode::Mode};

/// Dimension a sweep varies, and so the x axis of its plots
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    Size,
    #[default]
    BlockSize,
}

impl Axis {
    pub fn label(&self) -> &'static str {
        match self {
            Axis::Size => "size",
            Axis::BlockSize => "block-size",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Axis {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "size" => Ok(Axis::Size),
            "block-size" | "block_size" => Ok(Axis::BlockSize),
            _ => bail!("unknown axis {s:?}, expected size or block-size"),
        }
    }
}

/// Inclusive range of powers of two, `2^from, 2^(from+step), ..., <= 2^to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pow2Range {
    pub from: u32,
    pub to: u32,
    #[serde(default = "default_step")]
    pub step: u32,
}

fn default_step() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeSet {
    List(Vec<u64>),
    Pow2 { pow2: Pow2Range },
}

impl SizeSet {
    pub fn values(&self) -> Result<Vec<u64>> {
        match self {
            SizeSet::List(values) => Ok(values.clone()),
            SizeSet::Pow2 { pow2 } => {
                if pow2.step == 0 {
                    bail!("pow2 step must be at least 1");
                }
                if pow2.to >= u64::BITS {
                    bail!("2^{} does not fit in 64 bits", pow2.to);
                }
                Ok((pow2.from..=pow2.to)
                    .step_by(pow2.step as usize)
                    .map(|x| 1u64 << x)
                    .collect())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSpec {
    pub modes: Vec<Mode>,
    pub sizes: SizeSet,
    pub block_sizes: SizeSet,
    pub runs: u32,
}

/// One point of the sweep, realized as exactly one job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SweepPoint {
    pub mode: Mode,
    pub size: u64,
    pub block_size: u64,
    pub run: u32,
}

impl SweepSpec {
    /// Expands the cartesian product of modes, sizes, block sizes and runs
    pub fn points(&self) -> Result<Vec<SweepPoint>> {
        let sizes = self.sizes.values()?;
        let block_sizes = self.block_sizes.values()?;
        if self.modes.is_empty() {
            bail!(PipelineError::EmptyDimension("modes"));
        }
        if sizes.is_empty() {
            bail!(PipelineError::EmptyDimension("sizes"));
        }
        if block_sizes.is_empty() {
            bail!(PipelineError::EmptyDimension("block_sizes"));
        }
        if self.runs == 0 {
            bail!(PipelineError::EmptyDimension("runs"));
        }
        unique("modes", &self.modes)?;
        unique("sizes", &sizes)?;
        unique("block_sizes", &block_sizes)?;

        Ok(
            iproduct!(self.modes.iter(), sizes.iter(), block_sizes.iter(), 0..self.runs)
                .map(|(mode, size, block_size, run)| SweepPoint {
                    mode: *mode,
                    size: *size,
                    block_size: *block_size,
                    run,
                })
                .collect(),
        )
    }

    /// Block size when more than one is swept, size otherwise
    pub fn axis(&self) -> Result<Axis> {
        if self.block_sizes.values()?.len() > 1 {
            Ok(Axis::BlockSize)
        } else {
            Ok(Axis::Size)
        }
    }
}

/// Repeated values would give jobs the same identity
fn unique<T: fmt::Display + Eq + Hash>(dimension: &'static str, values: &[T]) -> Result<()> {
    if let Some(value) = values.iter().duplicates().next() {
        bail!(PipelineError::DuplicateValue {
            dimension,
            value: value.to_string(),
        });
    }
    Ok(())
}
