//! Static SVG figures for the rendered report.

use std::path::Path;

use anyhow::{anyhow, Result};
use plotters::prelude::*;

use crate::gof::GofStatistic;

const ENVELOPE: RGBColor = RGBColor(0x88, 0xa8, 0xd8);
const OBSERVED: RGBColor = RGBColor(0xd0, 0x4a, 0x3a);

/// One goodness-of-fit envelope: simulated band and mean against the
/// observed distribution, bins on the x axis.
pub fn gof_figure(path: &Path, stat: &GofStatistic) -> Result<()> {
    let width = stat.bins.len();
    let y_max = stat
        .observed
        .iter()
        .chain(&stat.sim_upper)
        .cloned()
        .fold(0.0f64, f64::max)
        .max(1e-6);

    let root = SVGBackend::new(path, (860, 480)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("figure backend: {e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&stat.name, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(42)
        .y_label_area_size(56)
        .build_cartesian_2d(0..width.saturating_sub(1), 0.0..y_max * 1.08)
        .map_err(|e| anyhow!("figure layout: {e}"))?;

    let bins = stat.bins.clone();
    chart
        .configure_mesh()
        .x_labels(width.min(16))
        .x_label_formatter(&move |idx| bins.get(*idx).cloned().unwrap_or_default())
        .y_desc("proportion")
        .x_desc("bin")
        .draw()
        .map_err(|e| anyhow!("figure mesh: {e}"))?;

    // Central 95% band as one polygon: upper edge left to right, lower
    // edge back
    let mut band = Vec::with_capacity(2 * width);
    for i in 0..width {
        band.push((i, stat.sim_upper[i]));
    }
    for i in (0..width).rev() {
        band.push((i, stat.sim_lower[i]));
    }
    chart
        .draw_series(std::iter::once(Polygon::new(band, ENVELOPE.mix(0.25))))
        .map_err(|e| anyhow!("figure band: {e}"))?;

    chart
        .draw_series(LineSeries::new(
            (0..width).map(|i| (i, stat.sim_mean[i])),
            ENVELOPE.stroke_width(2),
        ))
        .map_err(|e| anyhow!("figure series: {e}"))?
        .label("simulated mean")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], ENVELOPE.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(
            (0..width).map(|i| (i, stat.observed[i])),
            OBSERVED.stroke_width(2),
        ))
        .map_err(|e| anyhow!("figure series: {e}"))?
        .label("observed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], OBSERVED.stroke_width(2)));

    chart
        .configure_series_labels()
        .border_style(BLACK.mix(0.4))
        .background_style(WHITE.mix(0.9))
        .draw()
        .map_err(|e| anyhow!("figure legend: {e}"))?;

    root.present().map_err(|e| anyhow!("figure write: {e}"))?;
    Ok(())
}

/// File-name slug for a statistic name
pub fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_filesystem_safe() {
        assert_eq!(slug("edgewise shared partners"), "edgewise-shared-partners");
        assert_eq!(slug("in-degree"), "in-degree");
        assert_eq!(slug("minimum geodesic distance"), "minimum-geodesic-distance");
    }

    #[test]
    fn figure_renders_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gof.svg");
        let stat = GofStatistic {
            name: "in-degree".to_string(),
            bins: vec!["0".into(), "1".into(), "2".into(), "3+".into()],
            observed: vec![0.1, 0.4, 0.3, 0.2],
            sim_mean: vec![0.15, 0.35, 0.3, 0.2],
            sim_lower: vec![0.05, 0.25, 0.2, 0.1],
            sim_upper: vec![0.25, 0.45, 0.4, 0.3],
        };
        gof_figure(&path, &stat).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<svg"));
    }
}
