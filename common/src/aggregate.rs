//! Reduction of raw result records into per-key throughput statistics.
//!
//! An [`Aggregation`] is recomputed from records on every pass and never
//! mutated afterwards, so the same record set always yields the same series.

use std::{collections::BTreeMap, fmt};

use itertools::Itertools;
use tracing::{debug, warn};

use crate::{
    mode::{Mode, Op, Order, Workload},
    record::ResultRecord,
    sweep::Axis,
};

/// Throughput samples of one key at one value of the independent variable
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: u64,
    /// Ascending
    pub samples: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Point {
    /// `None` when there are no samples
    pub fn from_samples(x: u64, mut samples: Vec<f64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        // sorting first makes the sum, and so the mean, independent of input order
        samples.sort_by(f64::total_cmp);
        let min = samples[0];
        let max = samples[samples.len() - 1];
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        Some(Self {
            x,
            samples,
            min,
            max,
            mean,
        })
    }
}

/// All points of one record name, ascending by `x`
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn point(&self, x: u64) -> Option<&Point> {
        self.points
            .binary_search_by_key(&x, |p| p.x)
            .ok()
            .map(|i| &self.points[i])
    }
}

/// A mode with its buffering left open, one cell of the comparison grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Facet {
    pub workload: Workload,
    pub op: Op,
    pub order: Order,
}

impl Facet {
    pub fn new(workload: Workload, op: Op, order: Order) -> Self {
        Self {
            workload,
            op,
            order,
        }
    }

    pub fn mode(&self, buffered: bool) -> Mode {
        Mode::new(self.workload, buffered, self.op, self.order)
    }
}

impl From<Mode> for Facet {
    fn from(mode: Mode) -> Self {
        Facet::new(mode.workload, mode.op, mode.order)
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.op.label(),
            self.workload.label(),
            self.order.label()
        )
    }
}

/// Which variants of a facet have samples at one `x`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub buffered: bool,
    pub unbuffered: bool,
}

/// A point chosen for a facet, tagged with the variant it was taken from
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPoint {
    pub point: Point,
    pub buffered: bool,
}

/// A facet's series, buffered samples where they exist, unbuffered elsewhere
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSeries {
    pub facet: Facet,
    pub points: Vec<ResolvedPoint>,
}

impl ResolvedSeries {
    /// True if any point had to fall back to the unbuffered variant
    pub fn has_fallback(&self) -> bool {
        self.points.iter().any(|p| !p.buffered)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub axis: Axis,
    series: BTreeMap<String, Series>,
    availability: BTreeMap<(Facet, u64), Availability>,
}

impl Aggregation {
    pub fn new(records: &[ResultRecord], axis: Axis) -> Self {
        let mut groups: BTreeMap<&str, BTreeMap<u64, Vec<f64>>> = BTreeMap::new();
        for record in records {
            let Some(throughput) = record.throughput() else {
                warn!(
                    "Skipping degenerate record {} size={} block_size={} runtime={}",
                    record.name, record.size, record.block_size, record.runtime
                );
                continue;
            };
            groups
                .entry(record.name.as_str())
                .or_default()
                .entry(record.x(axis))
                .or_default()
                .push(throughput);
        }

        let series: BTreeMap<String, Series> = groups
            .into_iter()
            .map(|(name, points)| {
                let points = points
                    .into_iter()
                    .filter_map(|(x, samples)| Point::from_samples(x, samples))
                    .collect();
                (
                    name.to_owned(),
                    Series {
                        name: name.to_owned(),
                        points,
                    },
                )
            })
            .collect();

        let mut availability: BTreeMap<(Facet, u64), Availability> = BTreeMap::new();
        for s in series.values() {
            let Ok(mode) = s.name.parse::<Mode>() else {
                debug!("Record name {} is not a known mode", s.name);
                continue;
            };
            for point in &s.points {
                let entry = availability.entry((mode.into(), point.x)).or_default();
                if mode.buffered {
                    entry.buffered = true;
                } else {
                    entry.unbuffered = true;
                }
            }
        }

        Self {
            axis,
            series,
            availability,
        }
    }

    /// Series ordered by name
    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn availability(&self, facet: Facet, x: u64) -> Availability {
        self.availability
            .get(&(facet, x))
            .copied()
            .unwrap_or_default()
    }

    /// Facets with samples from either variant, in order
    pub fn facets(&self) -> impl Iterator<Item = Facet> + '_ {
        self.availability.keys().map(|(facet, _)| *facet).dedup()
    }

    pub fn has_facet(&self, facet: Facet) -> bool {
        self.availability
            .range((facet, u64::MIN)..=(facet, u64::MAX))
            .next()
            .is_some()
    }

    /// Every point of one variant of the facet, tagged with that variant
    pub fn variant(&self, facet: Facet, buffered: bool) -> Option<ResolvedSeries> {
        let series = self.get(&facet.mode(buffered).to_string())?;
        let points = series
            .points
            .iter()
            .map(|point| ResolvedPoint {
                point: point.clone(),
                buffered,
            })
            .collect::<Vec<_>>();
        (!points.is_empty()).then_some(ResolvedSeries { facet, points })
    }

    /// Picks, for every `x` of the facet, the buffered variant if it ran and
    /// the unbuffered one otherwise. `None` if neither variant was swept.
    pub fn resolve(&self, facet: Facet) -> Option<ResolvedSeries> {
        let buffered = self.get(&facet.mode(true).to_string());
        let unbuffered = self.get(&facet.mode(false).to_string());

        let points = self
            .availability
            .range((facet, u64::MIN)..=(facet, u64::MAX))
            .filter_map(|((_, x), available)| {
                let (source, is_buffered) = if available.buffered {
                    (buffered, true)
                } else {
                    (unbuffered, false)
                };
                source?.point(*x).map(|point| ResolvedPoint {
                    point: point.clone(),
                    buffered: is_buffered,
                })
            })
            .collect::<Vec<_>>();

        if points.is_empty() {
            None
        } else {
            Some(ResolvedSeries { facet, points })
        }
    }
}
