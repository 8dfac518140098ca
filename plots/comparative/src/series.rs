use common::aggregate::{Aggregation, Point, ResolvedPoint, ResolvedSeries};

/// Legend suffix of a series that fell back to unbuffered samples somewhere
pub const FALLBACK_SUFFIX: &str = " (no bufrw)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dotted,
}

/// A stretch of the mean line drawn in one style, `(x, mean)` pairs
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRun {
    pub style: LineStyle,
    pub points: Vec<(u64, f64)>,
}

/// One set's data in one cell, ascending by `x`
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub name: String,
    pub points: Vec<ResolvedPoint>,
}

impl PlotSeries {
    pub fn absolute(name: impl Into<String>, resolved: ResolvedSeries) -> Self {
        Self {
            name: name.into(),
            points: resolved.points,
        }
    }

    /// Every sample as `(t - b) / b`, `b` being the baseline's mean for the
    /// same variant at the same `x`. Points the baseline lacks are dropped,
    /// `None` if nothing is left.
    pub fn relative(
        name: impl Into<String>,
        resolved: &ResolvedSeries,
        baseline: &Aggregation,
    ) -> Option<Self> {
        let points = resolved
            .points
            .iter()
            .filter_map(|p| {
                let variant = resolved.facet.mode(p.buffered).to_string();
                let b = baseline.get(&variant)?.point(p.point.x)?.mean;
                let samples = p.point.samples.iter().map(|t| (t - b) / b).collect();
                Some(ResolvedPoint {
                    point: Point::from_samples(p.point.x, samples)?,
                    buffered: p.buffered,
                })
            })
            .collect::<Vec<_>>();
        (!points.is_empty()).then(|| Self {
            name: name.into(),
            points,
        })
    }

    pub fn has_fallback(&self) -> bool {
        self.points.iter().any(|p| !p.buffered)
    }

    pub fn legend_label(&self) -> String {
        if self.has_fallback() {
            format!("{}{FALLBACK_SUFFIX}", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Lowest and highest value any sample reaches
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |acc, p| match acc {
            None => Some((p.point.min, p.point.max)),
            Some((lo, hi)) => Some((p.point.min.min(lo), p.point.max.max(hi))),
        })
    }

    /// Solid between two buffered points, dotted where either end fell back
    pub fn trend_runs(&self) -> Vec<TrendRun> {
        let mean = |p: &ResolvedPoint| (p.point.x, p.point.mean);
        if let [only] = self.points.as_slice() {
            return vec![TrendRun {
                style: style_of(only.buffered),
                points: vec![mean(only)],
            }];
        }

        let mut runs: Vec<TrendRun> = Vec::new();
        for pair in self.points.windows(2) {
            let style = style_of(pair[0].buffered && pair[1].buffered);
            match runs.last_mut() {
                Some(run) if run.style == style => run.points.push(mean(&pair[1])),
                _ => runs.push(TrendRun {
                    style,
                    points: vec![mean(&pair[0]), mean(&pair[1])],
                }),
            }
        }
        runs
    }
}

fn style_of(buffered: bool) -> LineStyle {
    if buffered {
        LineStyle::Solid
    } else {
        LineStyle::Dotted
    }
}

#[cfg(test)]
mod tests {
    use common::{
        aggregate::Facet,
        mode::{Op, Order, Workload},
        record::ResultRecord,
        sweep::Axis,
    };

    use super::*;

    fn record(name: &str, block_size: u64, runtime: f64) -> ResultRecord {
        ResultRecord {
            name: name.to_owned(),
            size: 1024,
            block_size,
            run: None,
            runtime,
        }
    }

    fn write_inorder() -> Facet {
        Facet::new(Workload::LargeFile, Op::Write, Order::Inorder)
    }

    #[test]
    fn unbuffered_only_is_dotted() {
        let records = [64, 128, 256].map(|bs| record("write_inorder", bs, 1.0));
        let aggregation = Aggregation::new(&records, Axis::BlockSize);
        let series = PlotSeries::absolute("wasmtime", aggregation.resolve(write_inorder()).unwrap());

        let runs = series.trend_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].style, LineStyle::Dotted);
        assert_eq!(runs[0].points.len(), 3);
        assert_eq!(series.legend_label(), "wasmtime (no bufrw)");
    }

    #[test]
    fn runs_split_at_fallback() {
        let records = vec![
            record("buffered_write_inorder", 64, 1.0),
            record("buffered_write_inorder", 128, 1.0),
            record("write_inorder", 256, 1.0),
            record("write_inorder", 512, 1.0),
            record("buffered_write_inorder", 1024, 1.0),
            record("buffered_write_inorder", 2048, 1.0),
        ];
        let aggregation = Aggregation::new(&records, Axis::BlockSize);
        let series = PlotSeries::absolute("vc-fee", aggregation.resolve(write_inorder()).unwrap());

        let runs = series.trend_runs();
        let shape = runs
            .iter()
            .map(|r| (r.style, r.points.iter().map(|p| p.0).collect::<Vec<_>>()))
            .collect::<Vec<_>>();
        assert_eq!(
            shape,
            vec![
                (LineStyle::Solid, vec![64, 128]),
                (LineStyle::Dotted, vec![128, 256, 512, 1024]),
                (LineStyle::Solid, vec![1024, 2048]),
            ]
        );
    }

    #[test]
    fn buffered_everywhere_has_no_suffix() {
        let records = [64, 128].map(|bs| record("buffered_write_inorder", bs, 1.0));
        let aggregation = Aggregation::new(&records, Axis::BlockSize);
        let series = PlotSeries::absolute("vc-fee", aggregation.resolve(write_inorder()).unwrap());
        assert_eq!(series.legend_label(), "vc-fee");
        assert_eq!(series.trend_runs()[0].style, LineStyle::Solid);
    }

    #[test]
    fn relative_to_itself_is_zero() {
        let records = vec![
            record("write_inorder", 64, 0.5),
            record("write_inorder", 64, 0.5),
            record("write_inorder", 128, 0.25),
        ];
        let aggregation = Aggregation::new(&records, Axis::BlockSize);
        let resolved = aggregation.resolve(write_inorder()).unwrap();
        let series = PlotSeries::relative("same", &resolved, &aggregation).unwrap();
        for p in &series.points {
            assert!(p.point.samples.iter().all(|s| *s == 0.0));
            assert_eq!(p.point.mean, 0.0);
        }
        assert_eq!(series.bounds(), Some((0.0, 0.0)));
    }

    #[test]
    fn relative_difference() {
        let baseline = Aggregation::new(
            &[record("write_inorder", 64, 1.0), record("write_inorder", 64, 0.5)],
            Axis::BlockSize,
        );
        // baseline mean is 1536 B/s
        let faster = Aggregation::new(
            &[
                record("write_inorder", 64, 0.5),
                record("write_inorder", 128, 0.5),
            ],
            Axis::BlockSize,
        );
        let resolved = faster.resolve(write_inorder()).unwrap();
        let series = PlotSeries::relative("faster", &resolved, &baseline).unwrap();
        assert_eq!(series.points.len(), 1);
        let point = &series.points[0].point;
        assert_eq!(point.x, 64);
        assert_eq!(point.mean, (2048.0 - 1536.0) / 1536.0);

        // the baseline only has the unbuffered variant
        let buffered = Aggregation::new(
            &[record("buffered_write_inorder", 64, 1.0)],
            Axis::BlockSize,
        );
        let resolved = buffered.resolve(write_inorder()).unwrap();
        assert!(PlotSeries::relative("buffered", &resolved, &baseline).is_none());
    }
}
