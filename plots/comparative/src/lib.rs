//! Side-by-side throughput plots of several result sets.
//!
//! A [`Figure`] is built from aggregated result sets and a [`Layout`] first,
//! then drawn to an SVG file in one call. Building does all the data work and
//! fails on requested facets that have nothing to show.

pub mod layout;
pub mod series;

mod draw;

use std::path::Path;

use common::{
    aggregate::{Aggregation, Facet},
    error::PipelineError,
    record::NamedResultSet,
    sweep::Axis,
};
use eyre::{Result, bail};
use tracing::{debug, info, warn};

pub use layout::Layout;
pub use series::{LineStyle, PlotSeries, TrendRun};

/// A result set reduced to statistics
#[derive(Debug, Clone)]
pub struct AggregatedSet {
    pub label: String,
    pub aggregation: Aggregation,
}

pub fn aggregate_sets(sets: &[NamedResultSet], axis: Axis) -> Vec<AggregatedSet> {
    sets.iter()
        .map(|set| AggregatedSet {
            label: set.label.clone(),
            aggregation: Aggregation::new(&set.records, axis),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellSeries {
    /// Palette index
    pub color: usize,
    pub series: PlotSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub title: String,
    /// Ascending `x` values shown on the categorical axis
    pub categories: Vec<u64>,
    pub series: Vec<CellSeries>,
    pub legend: bool,
}

impl Cell {
    fn new(title: String, series: Vec<CellSeries>, legend: bool) -> Self {
        let mut categories = series
            .iter()
            .flat_map(|s| s.series.points.iter().map(|p| p.point.x))
            .collect::<Vec<_>>();
        categories.sort_unstable();
        categories.dedup();
        Self {
            title,
            categories,
            series,
            legend,
        }
    }

    /// Vertical range covering every sample, zero included
    pub fn y_range(&self) -> (f64, f64) {
        let (lo, hi) = self
            .series
            .iter()
            .filter_map(|s| s.series.bounds())
            .fold((0.0f64, 0.0f64), |(lo, hi), (min, max)| {
                (lo.min(min), hi.max(max))
            });
        let pad = ((hi - lo) * 0.1).max(0.01);
        (if lo < 0.0 { lo - pad } else { 0.0 }, hi + pad)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub axis: Axis,
    pub rows: Vec<Vec<Cell>>,
    /// Label of the set every other one is relative to
    pub baseline: Option<String>,
}

fn baseline_index(sets: &[AggregatedSet], label: &str) -> Result<usize> {
    let Some(index) = sets.iter().position(|s| s.label == label) else {
        bail!(PipelineError::UnknownBaseline(label.to_owned()));
    };
    if sets.len() < 2 {
        bail!("Nothing to compare against baseline {label}");
    }
    Ok(index)
}

/// What a grid does with a layout facet no set has results for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFacet {
    /// The facet was asked for, so it is a [`PipelineError::EmptyFacet`]
    Error,
    /// The layout was derived from the data, the cell stays empty
    Blank,
}

impl Figure {
    /// One cell per `(workload, order)` row and op column. Each set gets a
    /// buffered and an unbuffered series, whichever it has results for. With a
    /// baseline every other set is plotted relative to it and the baseline
    /// itself is left out.
    pub fn grid(
        sets: &[AggregatedSet],
        layout: &Layout,
        axis: Axis,
        baseline: Option<&str>,
        missing: MissingFacet,
    ) -> Result<Self> {
        let baseline = baseline.map(|l| baseline_index(sets, l)).transpose()?;
        if layout.rows().is_empty() || layout.ops.is_empty() {
            bail!("No facets to plot");
        }

        let mut rows = Vec::new();
        for (workload, order) in layout.rows() {
            let mut row = Vec::new();
            for (column, op) in layout.ops.iter().enumerate() {
                let facet = Facet::new(workload, *op, order);
                if missing == MissingFacet::Error
                    && !sets.iter().any(|s| s.aggregation.has_facet(facet))
                {
                    bail!(PipelineError::EmptyFacet(facet.to_string()));
                }
                let mut series = Vec::new();
                for (i, set) in sets.iter().enumerate() {
                    if baseline == Some(i) {
                        continue;
                    }
                    let before = series.len();
                    for buffered in [true, false] {
                        let Some(variant) = set.aggregation.variant(facet, buffered) else {
                            continue;
                        };
                        let plotted = match baseline {
                            Some(b) => {
                                PlotSeries::relative(&set.label, &variant, &sets[b].aggregation)
                            }
                            None => Some(PlotSeries::absolute(&set.label, variant)),
                        };
                        if let Some(plotted) = plotted {
                            series.push(CellSeries {
                                color: i,
                                series: plotted,
                            });
                        }
                    }
                    if series.len() == before {
                        debug!("{} has nothing to plot for {facet}", set.label);
                    }
                }
                row.push(Cell::new(
                    facet.to_string(),
                    series,
                    column + 1 == layout.ops.len(),
                ));
            }
            rows.push(row);
        }

        Ok(Self {
            axis,
            rows,
            baseline: baseline.map(|b| sets[b].label.clone()),
        })
    }

    /// A single cell with one line per configured summary facet and
    /// non-baseline set, all relative to the baseline.
    pub fn summary(
        sets: &[AggregatedSet],
        layout: &Layout,
        axis: Axis,
        baseline: &str,
    ) -> Result<Self> {
        let b = baseline_index(sets, baseline)?;
        let comparands = sets.len() - 1;

        let mut series = Vec::new();
        for (color, line) in layout.summary.iter().enumerate() {
            let facet = line.facet();
            let before = series.len();
            for (i, set) in sets.iter().enumerate() {
                if i == b {
                    continue;
                }
                let Some(resolved) = set.aggregation.resolve(facet) else {
                    continue;
                };
                let name = if comparands > 1 {
                    format!("{} {} {}", set.label, facet.op.label(), facet.order.label())
                } else {
                    format!("{} {}", facet.op.label(), facet.order.label())
                };
                if let Some(plotted) =
                    PlotSeries::relative(name, &resolved, &sets[b].aggregation)
                {
                    series.push(CellSeries {
                        color,
                        series: plotted,
                    });
                }
            }
            if series.len() == before {
                if !sets.iter().any(|s| s.aggregation.has_facet(facet)) {
                    bail!(PipelineError::EmptyFacet(facet.to_string()));
                }
                warn!("Nothing to compare against {baseline} for {facet}");
            }
        }

        let title = sets
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != b)
            .map(|(_, s)| s.label.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Self {
            axis,
            rows: vec![vec![Cell::new(title, series, true)]],
            baseline: Some(sets[b].label.clone()),
        })
    }

    pub fn render(&self, path: &Path, layout: &Layout) -> Result<()> {
        draw::draw(self, path, layout)?;
        info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Without a layout the grid covers the facets found in `sets` and leaves
/// combinations nobody measured blank.
pub fn render_grid(
    output: &Path,
    sets: &[NamedResultSet],
    layout: Option<&Layout>,
    axis: Axis,
    baseline: Option<&str>,
) -> Result<()> {
    let sets = aggregate_sets(sets, axis);
    let (layout, missing) = match layout {
        Some(layout) => (layout.clone(), MissingFacet::Error),
        None => (
            Layout::covering(sets.iter().flat_map(|s| s.aggregation.facets())),
            MissingFacet::Blank,
        ),
    };
    Figure::grid(&sets, &layout, axis, baseline, missing)?.render(output, &layout)
}

/// Baseline defaults to the first set
pub fn render_summary(
    output: &Path,
    sets: &[NamedResultSet],
    layout: Option<&Layout>,
    axis: Axis,
    baseline: Option<&str>,
) -> Result<()> {
    let Some(first) = sets.first() else {
        bail!("No result sets to summarize");
    };
    let baseline = baseline.unwrap_or(first.label.as_str());
    let layout = layout.cloned().unwrap_or_default();
    let sets = aggregate_sets(sets, axis);
    Figure::summary(&sets, &layout, axis, baseline)?.render(output, &layout)
}

#[cfg(test)]
mod tests {
    use common::{
        mode::{Op, Order, Workload},
        record::ResultRecord,
    };

    use super::*;

    fn set(label: &str, names: &[&str], runtime: f64) -> NamedResultSet {
        let mut records = Vec::new();
        for name in names {
            for block_size in [64, 128] {
                for run in 0..2 {
                    records.push(ResultRecord {
                        name: name.to_string(),
                        size: 1024,
                        block_size,
                        run: Some(run),
                        runtime,
                    });
                }
            }
        }
        NamedResultSet {
            label: label.to_owned(),
            records,
        }
    }

    fn small_layout() -> Layout {
        Layout {
            workloads: vec![Workload::LargeFile],
            orders: vec![Order::Inorder],
            ops: vec![Op::Read, Op::Write],
            summary: vec![layout::SummaryLine {
                workload: Workload::LargeFile,
                order: Order::Inorder,
                op: Op::Write,
            }],
            ..Layout::default()
        }
    }

    #[test]
    fn grid_cells() {
        let sets = aggregate_sets(
            &[
                set("native", &["read_inorder", "buffered_write_inorder"], 1.0),
                set("wasm", &["read_inorder", "write_inorder"], 2.0),
            ],
            Axis::BlockSize,
        );
        let figure = Figure::grid(
            &sets,
            &small_layout(),
            Axis::BlockSize,
            None,
            MissingFacet::Error,
        )
        .unwrap();
        assert_eq!(figure.rows.len(), 1);
        let row = &figure.rows[0];
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].title, "read large-file inorder");
        assert!(!row[0].legend && row[1].legend);
        assert_eq!(row[0].categories, vec![64, 128]);

        let write = &row[1].series;
        assert_eq!(write[0].color, 0);
        assert_eq!(write[0].series.legend_label(), "native");
        assert_eq!(write[1].color, 1);
        assert_eq!(write[1].series.legend_label(), "wasm (no bufrw)");
        assert_eq!(row[1].y_range().0, 0.0);
    }

    #[test]
    fn relative_grid_skips_baseline() {
        let sets = aggregate_sets(
            &[
                set("native", &["read_inorder", "write_inorder"], 1.0),
                set("wasm", &["read_inorder", "write_inorder"], 2.0),
            ],
            Axis::BlockSize,
        );
        let figure = Figure::grid(
            &sets,
            &small_layout(),
            Axis::BlockSize,
            Some("native"),
            MissingFacet::Error,
        )
        .unwrap();
        assert_eq!(figure.baseline.as_deref(), Some("native"));
        for cell in &figure.rows[0] {
            assert_eq!(cell.series.len(), 1);
            assert_eq!(cell.series[0].color, 1);
            for p in &cell.series[0].series.points {
                assert_eq!(p.point.mean, -0.5);
            }
            assert!(cell.y_range().0 < -0.5);
        }
    }

    #[test]
    fn empty_facet_is_an_error() {
        let sets = aggregate_sets(&[set("native", &["read_inorder"], 1.0)], Axis::BlockSize);
        let err = Figure::grid(
            &sets,
            &small_layout(),
            Axis::BlockSize,
            None,
            MissingFacet::Error,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::EmptyFacet(facet)) if facet == "write large-file inorder"
        ));
    }

    #[test]
    fn unknown_baseline() {
        let sets = aggregate_sets(&[set("native", &["read_inorder"], 1.0)], Axis::BlockSize);
        let err = Figure::grid(
            &sets,
            &small_layout(),
            Axis::BlockSize,
            Some("qemu"),
            MissingFacet::Error,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::UnknownBaseline(_))
        ));
        assert!(Figure::summary(&sets, &small_layout(), Axis::BlockSize, "native").is_err());
    }

    #[test]
    fn summary_cell() {
        let sets = aggregate_sets(
            &[
                set("wasmtime", &["write_inorder"], 1.0),
                set("vc-fee", &["write_inorder"], 1.0),
                set("native", &["write_inorder"], 0.5),
            ],
            Axis::BlockSize,
        );
        let figure = Figure::summary(&sets, &small_layout(), Axis::BlockSize, "native").unwrap();
        let cell = &figure.rows[0][0];
        assert_eq!(cell.title, "wasmtime, vc-fee");
        let labels = cell
            .series
            .iter()
            .map(|s| s.series.legend_label())
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                "wasmtime write inorder (no bufrw)",
                "vc-fee write inorder (no bufrw)"
            ]
        );
        assert!(cell.series.iter().all(|s| s.color == 0));
    }
    #[test]
    fn both_variants_drawn() {
        let mut native = set("native", &["buffered_write_inorder"], 1.0);
        native
            .records
            .extend(set("native", &["write_inorder"], 2.0).records);
        let sets = aggregate_sets(&[native], Axis::BlockSize);
        let figure = Figure::grid(
            &sets,
            &small_layout(),
            Axis::BlockSize,
            None,
            MissingFacet::Blank,
        )
        .unwrap();
        let [read, write] = &figure.rows[0][..] else {
            panic!("expected two cells");
        };
        assert!(read.series.is_empty());
        assert_eq!(read.categories, Vec::<u64>::new());

        assert_eq!(write.series.len(), 2);
        let (buffered, unbuffered) = (&write.series[0].series, &write.series[1].series);
        assert_eq!(buffered.legend_label(), "native");
        assert_eq!(unbuffered.legend_label(), "native (no bufrw)");
        assert!(write.series.iter().all(|s| s.color == 0));
        assert_eq!(buffered.points[0].point.samples, vec![1024.0, 1024.0]);
        assert_eq!(unbuffered.points[0].point.samples, vec![512.0, 512.0]);
        assert_eq!(buffered.trend_runs()[0].style, LineStyle::Solid);
        assert_eq!(unbuffered.trend_runs()[0].style, LineStyle::Dotted);
    }

    #[test]
    fn missing_baseline_leaves_cell_blank() {
        let sets = aggregate_sets(
            &[
                set("native", &["read_inorder"], 1.0),
                set("wasm", &["read_inorder", "write_inorder"], 2.0),
            ],
            Axis::BlockSize,
        );
        let figure = Figure::grid(
            &sets,
            &small_layout(),
            Axis::BlockSize,
            Some("native"),
            MissingFacet::Error,
        )
        .unwrap();
        assert_eq!(figure.rows[0][0].series.len(), 1);
        assert!(figure.rows[0][1].series.is_empty());
    }

    #[test]
    fn layout_follows_the_data() {
        let modes = include_str!("../../../sweep.yaml")
            .lines()
            .filter_map(|line| line.trim().strip_prefix("- "))
            .collect::<Vec<_>>();
        assert_eq!(modes.len(), 18);
        let sets = aggregate_sets(&[set("wasmtime", &modes, 1.0)], Axis::BlockSize);

        let layout = Layout::covering(sets[0].aggregation.facets());
        let figure =
            Figure::grid(&sets, &layout, Axis::BlockSize, None, MissingFacet::Blank).unwrap();
        assert_eq!(figure.rows.len(), 3);
        for row in &figure.rows {
            assert_eq!(row.len(), 3);
            assert!(row.iter().all(|cell| cell.series.len() == 2));
        }

        let err = Figure::grid(
            &sets,
            &Layout::default(),
            Axis::BlockSize,
            None,
            MissingFacet::Error,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::EmptyFacet(facet)) if facet.contains("incremental-file")
        ));
    }

    #[test]
    fn renders_svg_files() {
        let dir = tempfile::tempdir().unwrap();
        let sets = [
            set("native", &["read_inorder", "write_inorder"], 1.0),
            set(
                "wasm",
                &["read_inorder", "write_inorder", "buffered_write_inorder"],
                2.0,
            ),
        ];

        let grid = dir.path().join("grid.svg");
        render_grid(&grid, &sets, None, Axis::BlockSize, None).unwrap();
        let svg = std::fs::read_to_string(&grid).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("write large-file inorder"));
        assert!(svg.contains("64 B"));
        assert!(svg.contains("128 B"));
        assert!(svg.contains("native (no bufrw)"));

        let relative = dir.path().join("relative.svg");
        render_grid(&relative, &sets, None, Axis::BlockSize, Some("native")).unwrap();
        let svg = std::fs::read_to_string(&relative).unwrap();
        assert!(svg.contains("native"));
        assert!(svg.contains("wasm (no bufrw)"));

        let summary = dir.path().join("summary.svg");
        let layout = Layout {
            summary: vec![layout::SummaryLine {
                workload: Workload::LargeFile,
                order: Order::Inorder,
                op: Op::Read,
            }],
            ..small_layout()
        };
        render_summary(&summary, &sets, Some(&layout), Axis::BlockSize, None).unwrap();
        let svg = std::fs::read_to_string(&summary).unwrap();
        assert!(svg.contains("<text"));
        assert!(svg.contains("read inorder (no bufrw)"));
        assert!(svg.contains("64 B"));
    }

    #[test]
    fn unwritable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sets = [set("native", &["read_inorder"], 1.0)];
        let output = dir.path().join("missing/grid.svg");
        assert!(render_grid(&output, &sets, None, Axis::BlockSize, None).is_err());
        assert!(!output.exists());
    }
}
