//! Comparison charts, rendered to SVG with plotters.

use std::path::{Path, PathBuf};

use anyhow::Result;
use casedata::{CalendarDate, Environment};
use chrono::NaiveDate;
use log::info;
use plotters::prelude::*;

use crate::output::SirOutput;
use crate::timeline::{ObservedSeries, Timeline};

const SIZE: (u32, u32) = (1200, 700);

pub struct Series {
    pub name: String,
    pub color: RGBAColor,
    pub points: Vec<(CalendarDate, f64)>,
}

/// A line chart over calendar dates.
pub struct Chart {
    pub title: String,
    pub y_label: String,
    pub series: Vec<Series>,
    /// Vertical line at a date, with its legend label.
    pub marker: Option<(CalendarDate, String)>,
    /// Fixed y range; otherwise fitted to the data.
    pub y_max: Option<f64>,
}

impl Chart {
    fn x_range(&self) -> (NaiveDate, NaiveDate) {
        let dates = self.series.iter().flat_map(|s| s.points.iter().map(|(d, _)| *d));
        let first = dates.clone().min();
        let last = dates.max();
        match (first, last) {
            (Some(first), Some(last)) if first < last => (first.naive(), last.naive()),
            (Some(first), _) => (first.naive(), first.plus_days(1).naive()),
            _ => {
                let origin = self.marker.as_ref().map_or(NaiveDate::MIN, |(d, _)| d.naive());
                (origin, origin.succ_opt().unwrap_or(origin))
            }
        }
    }

    fn y_top(&self) -> f64 {
        if let Some(y_max) = self.y_max {
            return y_max;
        }
        let max = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|(_, y)| *y))
            .fold(0.0, f64::max);
        if max > 0.0 { max * 1.05 } else { 1.0 }
    }
}

fn observed_points(observed: &ObservedSeries) -> Vec<(CalendarDate, f64)> {
    observed.points().iter().map(|(d, c)| (*d, *c as f64)).collect()
}

fn simulated_points(values: &[f64], timeline: &Timeline, days: usize) -> Vec<(CalendarDate, f64)> {
    values
        .iter()
        .take(days)
        .enumerate()
        .map(|(day, v)| (timeline.calendar_date_for(day), *v))
        .collect()
}

fn real_series(observed: &ObservedSeries) -> Series {
    Series {
        name: "Real Data".to_string(),
        color: BLUE.to_rgba(),
        points: observed_points(observed),
    }
}

/// Simulated infections over the observed window, up to the last observed
/// date.
fn model_series(observed: &ObservedSeries, output: &SirOutput, timeline: &Timeline) -> Series {
    let days = timeline.day_for(observed.last().0).map_or(0, |day| day + 1);
    Series {
        name: "SIR Model Data".to_string(),
        color: RED.mix(0.5),
        points: simulated_points(&output.infected, timeline, days),
    }
}

pub fn daily_cases_chart(observed: &ObservedSeries) -> Chart {
    Chart {
        title: "Daily Confirmed Cases".to_string(),
        y_label: "Population".to_string(),
        series: vec![Series {
            name: "Daily Confirmed Cases".to_string(),
            ..real_series(observed)
        }],
        marker: None,
        y_max: None,
    }
}

/// Real against model, scaled so the reported counts stay readable.
pub fn real_scale_chart(observed: &ObservedSeries, output: &SirOutput, timeline: &Timeline) -> Chart {
    let real_max = observed.points().iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    Chart {
        title: "Daily Confirmed Cases".to_string(),
        y_label: "Population".to_string(),
        series: vec![real_series(observed), model_series(observed, output, timeline)],
        marker: None,
        y_max: Some(real_max as f64 * 1.2),
    }
}

pub fn model_scale_chart(observed: &ObservedSeries, output: &SirOutput, timeline: &Timeline) -> Chart {
    Chart {
        title: "Daily Confirmed Cases".to_string(),
        y_label: "Population".to_string(),
        series: vec![real_series(observed), model_series(observed, output, timeline)],
        marker: None,
        y_max: None,
    }
}

pub fn trajectory_chart(observed: &ObservedSeries, output: &SirOutput, timeline: &Timeline) -> Chart {
    let days = output.len();
    let compartment = |name: &str, color: RGBColor, values: &[f64]| Series {
        name: name.to_string(),
        color: color.mix(0.5),
        points: simulated_points(values, timeline, days),
    };
    let (last_observed, _) = observed.last();
    Chart {
        title: "SIR Model Daily Values".to_string(),
        y_label: "Population".to_string(),
        series: vec![
            compartment("Susceptible", BLUE, &output.susceptible),
            compartment("Infected", RED, &output.infected),
            compartment("Recovered", GREEN, &output.recovered),
        ],
        marker: Some((last_observed, last_observed.to_string())),
        y_max: None,
    }
}

pub fn render_svg(chart: &Chart, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_start, x_end) = chart.x_range();
    let y_top = chart.y_top();
    let mut builder = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(x_start..x_end, 0f64..y_top)?;

    builder
        .configure_mesh()
        .x_desc("Date")
        .y_desc(chart.y_label.as_str())
        .x_labels(12)
        .x_label_formatter(&|d: &NaiveDate| d.format("%m/%d/%Y").to_string())
        .draw()?;

    for series in &chart.series {
        let style = series.color.stroke_width(2);
        // Pinned to the top edge when a fixed range cuts the series off
        builder
            .draw_series(LineSeries::new(
                series.points.iter().map(|(d, y)| (d.naive(), y.min(y_top))),
                style,
            ))?
            .label(series.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    if let Some((date, label)) = &chart.marker {
        let style = BLACK.stroke_width(2);
        builder
            .draw_series(LineSeries::new(
                vec![(date.naive(), 0.0), (date.naive(), y_top)],
                style,
            ))?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    builder
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Writes the four comparison charts to the output directory and returns
/// their paths. Nothing is drawn when output goes to stdout.
pub fn render_all(
    env: &Environment<impl Sized>,
    observed: &ObservedSeries,
    output: &SirOutput,
    timeline: &Timeline,
) -> Result<Vec<PathBuf>> {
    let charts = [
        ("daily_cases.svg", daily_cases_chart(observed)),
        ("real_vs_model_real_scale.svg", real_scale_chart(observed, output, timeline)),
        ("real_vs_model_model_scale.svg", model_scale_chart(observed, output, timeline)),
        ("sir_trajectory.svg", trajectory_chart(observed, output, timeline)),
    ];

    let mut written = Vec::new();
    for (filename, chart) in &charts {
        let Some(path) = env.output_path(filename)? else {
            return Ok(written);
        };
        render_svg(chart, &path)?;
        info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod test {
    use casedata::{CaseSeries, Environment};

    use super::{model_scale_chart, real_scale_chart, render_all, trajectory_chart};
    use crate::output::SirOutput;
    use crate::timeline::{ObservedSeries, Timeline};

    fn fixture() -> (ObservedSeries, SirOutput, Timeline) {
        let condensed =
            CaseSeries::parse("2020/02/29,0\n2020/03/01,5\n2020/03/02,8\n2020/03/04,20").unwrap();
        let observed = ObservedSeries::new(&condensed, 1).unwrap();
        let timeline = Timeline::align(&observed, 6).unwrap();
        let output = SirOutput {
            susceptible: vec![99.0, 97.0, 94.0, 90.0, 86.0, 83.0],
            infected: vec![1.0, 2.0, 4.0, 6.0, 7.0, 5.0],
            recovered: vec![0.0, 1.0, 2.0, 4.0, 7.0, 12.0],
        };
        (observed, output, timeline)
    }

    #[test]
    fn test_comparison_covers_observed_dates() {
        let (observed, output, timeline) = fixture();
        let chart = model_scale_chart(&observed, &output, &timeline);
        let model = &chart.series[1];
        // Day 0 is 2020/03/01 and the last observed date is day 3
        assert_eq!(model.points.len(), 4);
        assert_eq!(model.points[3].0, observed.last().0);
        assert_eq!(model.points[3].1, 6.0);

        let chart = real_scale_chart(&observed, &output, &timeline);
        assert!(f64::abs(chart.y_max.unwrap() - 24.0) < 1e-9);
    }

    #[test]
    fn test_trajectory_marker() {
        let (observed, output, timeline) = fixture();
        let chart = trajectory_chart(&observed, &output, &timeline);
        assert_eq!(chart.series.len(), 3);
        assert!(chart.series.iter().all(|s| s.points.len() == 6));
        let (date, label) = chart.marker.unwrap();
        assert_eq!(date, observed.last().0);
        assert_eq!(label, "2020/03/04");
    }

    #[test]
    fn test_render_all() {
        let dir = tempfile::tempdir().unwrap();
        let (observed, output, timeline) = fixture();
        let mut env = Environment::default();
        env.set_output_dir(Some(dir.path().to_path_buf()));

        let written = render_all(&env, &observed, &output, &timeline).unwrap();
        assert_eq!(written.len(), 4);
        for path in written {
            let svg = std::fs::read_to_string(&path).unwrap();
            assert!(svg.contains("<svg"));
        }
    }

    #[test]
    fn test_render_skipped_without_output_dir() {
        let (observed, output, timeline) = fixture();
        let mut env = Environment::default();
        env.set_output_dir(None);
        assert!(render_all(&env, &observed, &output, &timeline).unwrap().is_empty());
    }
}
