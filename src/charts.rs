use crate::aggregate::{CategorySummary, KpiSnapshot, MonthlyTrend};
use crate::error::{QualityCostError, Result};
use log::info;
use plotters::prelude::*;
use std::path::Path;

/// Raster size for all dashboard charts.
pub const DEFAULT_CHART_SIZE: (u32, u32) = (900, 600);

const SERIES_COLORS: [RGBColor; 4] = [
    RGBColor(68, 114, 196),
    RGBColor(237, 125, 49),
    RGBColor(165, 165, 165),
    RGBColor(255, 192, 0),
];

/// Bar chart specification: labelled vertical bars.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<(String, f64)>,
}

/// Pie chart specification: labelled slices; zero-valued slices are omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<(String, f64)>,
}

/// Line chart specification: month-ordered points with markers.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub points: MonthlyTrend,
}

/// The COGQ vs COPQ comparison bars. This is the one chart that is also
/// rasterized to a file for embedding in the PDF report.
pub fn kpi_comparison(kpis: &KpiSnapshot) -> BarChart {
    BarChart {
        title: "COGQ vs COPQ Comparison".to_string(),
        bars: vec![
            ("Good Quality (COGQ)".to_string(), kpis.cogq),
            ("Poor Quality (COPQ)".to_string(), kpis.copq),
        ],
    }
}

/// Share of total cost per category; categories with a zero sum are dropped
/// so they do not render as empty slices.
pub fn category_breakdown(summary: &CategorySummary) -> PieChart {
    PieChart {
        title: "Cost Breakdown by Category".to_string(),
        slices: summary
            .iter()
            .filter(|(_, sum)| *sum > 0.0)
            .map(|(category, sum)| (category.as_str().to_string(), sum))
            .collect(),
    }
}

/// Total quality cost per month, in calendar order.
pub fn monthly_trend_chart(trend: &MonthlyTrend) -> LineChart {
    LineChart {
        title: "Total Quality Cost per Month".to_string(),
        points: trend.clone(),
    }
}

fn chart_err<E: std::fmt::Display>(e: E) -> QualityCostError {
    QualityCostError::Chart(e.to_string())
}

/// Rasterizes a bar chart to a PNG file. Refuses an empty spec rather than
/// plotting nothing silently.
pub fn render_bar_png(spec: &BarChart, path: &Path, size: (u32, u32)) -> Result<()> {
    let max = spec.bars.iter().fold(0f64, |acc, (_, v)| acc.max(*v));
    if spec.bars.is_empty() || max <= 0.0 {
        return Err(QualityCostError::Chart(format!(
            "no data to plot for '{}'",
            spec.title
        )));
    }

    let labels: Vec<String> = spec.bars.iter().map(|(name, _)| name.clone()).collect();
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0..spec.bars.len() as i32, 0f64..max * 1.1)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(spec.bars.len())
        .x_label_formatter(&|x: &i32| {
            labels.get(*x as usize).cloned().unwrap_or_default()
        })
        .y_desc("Cost")
        .draw()
        .map_err(chart_err)?;

    for (idx, (_, value)) in spec.bars.iter().enumerate() {
        let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(idx as i32, 0.0), (idx as i32 + 1, *value)],
                color.filled(),
            )))
            .map_err(chart_err)?;
    }

    root.present().map_err(chart_err)?;
    info!("rendered bar chart '{}' to {}", spec.title, path.display());
    Ok(())
}

/// Rasterizes a pie chart to a PNG file.
pub fn render_pie_png(spec: &PieChart, path: &Path, size: (u32, u32)) -> Result<()> {
    if spec.slices.is_empty() {
        return Err(QualityCostError::Chart(format!(
            "no data to plot for '{}'",
            spec.title
        )));
    }

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let chart_area = root
        .titled(&spec.title, ("sans-serif", 30))
        .map_err(chart_err)?;

    let dims = chart_area.dim_in_pixel();
    let center = (dims.0 as i32 / 2, dims.1 as i32 / 2);
    let radius = (dims.0.min(dims.1) as f64) * 0.35;
    let sizes: Vec<f64> = spec.slices.iter().map(|(_, v)| *v).collect();
    let labels: Vec<String> = spec.slices.iter().map(|(name, _)| name.clone()).collect();
    let colors: Vec<RGBColor> = (0..spec.slices.len())
        .map(|i| SERIES_COLORS[i % SERIES_COLORS.len()])
        .collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 20).into_font().color(&BLACK));
    chart_area.draw(&pie).map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!("rendered pie chart '{}' to {}", spec.title, path.display());
    Ok(())
}

/// Rasterizes a line chart with point markers to a PNG file.
pub fn render_line_png(spec: &LineChart, path: &Path, size: (u32, u32)) -> Result<()> {
    let max = spec.points.iter().fold(0f64, |acc, (_, v)| acc.max(*v));
    if spec.points.is_empty() || max <= 0.0 {
        return Err(QualityCostError::Chart(format!(
            "no data to plot for '{}'",
            spec.title
        )));
    }

    let labels: Vec<String> = spec
        .points
        .iter()
        .map(|(month, _)| month.as_str().to_string())
        .collect();
    let x_max = (spec.points.len() as i32 - 1).max(1);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0..x_max, 0f64..max * 1.1)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_labels(spec.points.len())
        .x_label_formatter(&|x: &i32| {
            labels.get(*x as usize).cloned().unwrap_or_default()
        })
        .y_desc("Cost")
        .draw()
        .map_err(chart_err)?;

    let points: Vec<(i32, f64)> = spec
        .points
        .iter()
        .enumerate()
        .map(|(i, (_, v))| (i as i32, *v))
        .collect();

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &SERIES_COLORS[0]))
        .map_err(chart_err)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|(x, y)| Circle::new((*x, *y), 4, SERIES_COLORS[0].filled())),
        )
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!("rendered line chart '{}' to {}", spec.title, path.display());
    Ok(())
}
