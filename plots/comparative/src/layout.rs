use std::path::Path;

use common::{
    aggregate::Facet,
    error::PipelineError,
    mode::{Op, Order, Workload},
};
use eyre::{Context, Result, bail};
use itertools::iproduct;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// seaborn's default palette
const SEABORN: [&str; 10] = [
    "#4c72b0", "#dd8452", "#55a868", "#c44e52", "#8172b3", "#937860", "#da8bc3", "#8c8c8c",
    "#ccb974", "#64b5cd",
];

/// One line of the relative summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    #[serde(default)]
    pub workload: Workload,
    pub order: Order,
    pub op: Op,
}

impl SummaryLine {
    pub fn facet(&self) -> Facet {
        Facet::new(self.workload, self.op, self.order)
    }
}

/// Which facets a figure shows and how it looks, fixed for the whole render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    pub workloads: Vec<Workload>,
    pub orders: Vec<Order>,
    /// Grid columns
    pub ops: Vec<Op>,
    /// `#rrggbb`, indexed by result set position
    pub palette: Vec<String>,
    pub cell_width: u32,
    pub cell_height: u32,
    pub summary: Vec<SummaryLine>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            workloads: vec![Workload::LargeFile, Workload::IncrementalFile],
            orders: Order::ALL.to_vec(),
            ops: Op::ALL.to_vec(),
            palette: SEABORN.iter().map(|c| c.to_string()).collect(),
            cell_width: 600,
            cell_height: 350,
            summary: [
                (Order::Inorder, Op::Read),
                (Order::Inorder, Op::Write),
                (Order::Random, Op::Read),
                (Order::Random, Op::Write),
            ]
            .into_iter()
            .map(|(order, op)| SummaryLine {
                workload: Workload::LargeFile,
                order,
                op,
            })
            .collect(),
        }
    }
}

impl Layout {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let layout: Layout = serde_yml::from_str(yaml).wrap_err("Parsing layout")?;
        layout.colors()?;
        Ok(layout)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Reading layout {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("Loading layout {}", path.display()))
    }

    /// The default look, restricted to the workloads, orders and ops that
    /// occur in `facets`
    pub fn covering(facets: impl IntoIterator<Item = Facet>) -> Self {
        let facets = facets.into_iter().collect::<Vec<_>>();
        let defaults = Self::default();
        Self {
            workloads: Workload::ALL
                .into_iter()
                .filter(|w| facets.iter().any(|f| f.workload == *w))
                .collect(),
            orders: Order::ALL
                .into_iter()
                .filter(|o| facets.iter().any(|f| f.order == *o))
                .collect(),
            ops: Op::ALL
                .into_iter()
                .filter(|op| facets.iter().any(|f| f.op == *op))
                .collect(),
            ..defaults
        }
    }

    /// Grid rows, workloads outermost
    pub fn rows(&self) -> Vec<(Workload, Order)> {
        iproduct!(self.workloads.iter().copied(), self.orders.iter().copied()).collect()
    }

    pub fn colors(&self) -> Result<Vec<RGBColor>> {
        if self.palette.is_empty() {
            bail!("Layout palette is empty");
        }
        self.palette.iter().map(|c| parse_color(c)).collect()
    }
}

pub fn parse_color(hex: &str) -> Result<RGBColor> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!(PipelineError::InvalidColor(hex.to_owned()));
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}
