use std::path::Path;

use common::units::{percentage, size_si, throughput_si};
use eyre::Result;
use plotters::{coord::Shift, prelude::*, series::DashedLineSeries};

use crate::{Cell, Figure, Layout, LineStyle};

const TITLE_FONT_SIZE: u32 = 18;
const LABEL_FONT_SIZE: u32 = 13;
const LEGEND_FONT_SIZE: u32 = 13;

pub(crate) fn draw(figure: &Figure, path: &Path, layout: &Layout) -> Result<()> {
    let colors = layout.colors()?;
    let columns = figure.rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let rows = figure.rows.len().max(1);
    let size = (
        layout.cell_width * columns as u32,
        layout.cell_height * rows as u32,
    );

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((rows, columns));
    for (r, row) in figure.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            draw_cell(&areas[r * columns + c], figure, cell, &colors)?;
        }
    }
    root.present()?;
    Ok(())
}

fn draw_cell(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    figure: &Figure,
    cell: &Cell,
    colors: &[RGBColor],
) -> Result<()> {
    let categories = &cell.categories;
    // a blank cell still gets one empty slot
    let n = categories.len().max(1);
    let right = n as f64 - 0.5;
    let (y_lo, y_hi) = cell.y_range();
    let relative = figure.baseline.is_some();

    let mut chart = ChartBuilder::on(area)
        .caption(&cell.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5..right, y_lo..y_hi)?;

    let x_label = |x: &f64| {
        let idx = x.round();
        if idx < 0.0 || (x - idx).abs() > 0.3 {
            return String::new();
        }
        categories
            .get(idx as usize)
            .map(|c| size_si(*c as f64))
            .unwrap_or_default()
    };
    let y_label = |y: &f64| {
        if relative {
            percentage(*y)
        } else {
            throughput_si(*y)
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .x_desc(figure.axis.label())
        .label_style(("sans-serif", LABEL_FONT_SIZE))
        .draw()?;

    // positions on the categorical axis
    let at = |x: u64| categories.binary_search(&x).ok().map(|i| i as f64);

    for entry in &cell.series {
        let color = colors[entry.color % colors.len()];
        let series = &entry.series;

        let band = series
            .points
            .iter()
            .filter_map(|p| Some((at(p.point.x)?, p.point.min)))
            .chain(
                series
                    .points
                    .iter()
                    .rev()
                    .filter_map(|p| Some((at(p.point.x)?, p.point.max))),
            )
            .collect::<Vec<_>>();
        chart.draw_series(std::iter::once(Polygon::new(band, color.mix(0.25))))?;

        chart.draw_series(series.points.iter().flat_map(|p| {
            let x = at(p.point.x);
            p.point
                .samples
                .iter()
                .filter_map(move |s| Some(Circle::new((x?, *s), 2, color.mix(0.75).filled())))
        }))?;

        for (i, run) in series.trend_runs().into_iter().enumerate() {
            let coords = run
                .points
                .iter()
                .filter_map(|(x, mean)| Some((at(*x)?, *mean)))
                .collect::<Vec<_>>();
            let style = color.mix(0.75).stroke_width(2);
            let annotation = match run.style {
                LineStyle::Solid => chart.draw_series(LineSeries::new(coords, style))?,
                LineStyle::Dotted => {
                    chart.draw_series(DashedLineSeries::new(coords, 3, 4, style))?
                }
            };
            if i == 0 && cell.legend {
                annotation.label(series.legend_label()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            }
        }
    }

    if let Some(baseline) = &figure.baseline {
        let zero = chart.draw_series(DashedLineSeries::new(
            [(-0.5, 0.0), (right, 0.0)],
            3,
            4,
            BLACK.mix(0.75).stroke_width(1),
        ))?;
        if cell.legend {
            zero.label(baseline.as_str()).legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(1))
            });
        }
    }

    if cell.legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", LEGEND_FONT_SIZE))
            .draw()?;
    }
    Ok(())
}
