use super::figure::{self, Figure, Layout, GREY, IBLUE, IGREEN};
use super::myio;
use anyhow::{bail, Context, Result};
use num_format::{Locale, ToFormattedString};
use plotters::coord::Shift;
use plotters::prelude::*;

/// log2(v + 1) of the second and third columns of a table with one header line.
pub fn read_pairs(filename: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (idx, line) in myio::lines(filename)?.iter().enumerate().skip(1) {
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.is_empty() {
            continue;
        }
        if t.len() < 3 {
            bail!("{}:{}: expected at least three columns", filename, idx + 1);
        }
        let parse = |v: &str| {
            v.parse::<f64>()
                .with_context(|| format!("{}:{}: {:?} is not a number", filename, idx + 1, v))
        };
        xs.push(log_transform(parse(t[1])?));
        ys.push(log_transform(parse(t[2])?));
    }
    if xs.is_empty() {
        bail!("{} has no data rows", filename);
    }
    log::info!(
        "{} points in {}",
        xs.len().to_formatted_string(&Locale::en),
        filename
    );
    Ok((xs, ys))
}

pub fn log_transform(v: f64) -> f64 {
    (v + 1.0).log2()
}

/// Counts in `bins` equal-width bins spanning the data, and the bin edges.
/// The last bin includes its right edge; a single distinct value is binned
/// over `[v - 0.5, v + 0.5]`.
/// # Example
/// ```
/// use rustyplot::scatter::histogram;
/// let (counts, edges) = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
/// assert_eq!(counts, vec![1, 1, 1, 2]);
/// assert_eq!(edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
/// ```
pub fn histogram(values: &[f64], bins: usize) -> (Vec<u32>, Vec<f64>) {
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() {
        lo = 0.0;
        hi = 1.0;
    } else if hi <= lo {
        lo -= 0.5;
        hi += 0.5;
    }
    let edges: Vec<f64> = (0..=bins)
        .map(|i| lo + (hi - lo) * i as f64 / bins as f64)
        .collect();
    let mut counts = vec![0_u32; bins];
    for v in values {
        let bin = ((v - lo) / (hi - lo) * bins as f64).floor() as usize;
        counts[bin.min(bins - 1)] += 1;
    }
    (counts, edges)
}

/// Bar heights log2(count + 1), scaled so the tallest bar is 1.
pub fn bar_heights(counts: &[u32]) -> Vec<f64> {
    let logs: Vec<f64> = counts.iter().map(|c| log_transform(*c as f64)).collect();
    let max = logs.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        logs.iter().map(|l| l / max).collect()
    } else {
        logs
    }
}

pub struct ScatterFigure {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub x_hist: (Vec<f64>, Vec<f64>),
    pub y_hist: (Vec<f64>, Vec<f64>),
}

impl ScatterFigure {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, bins: usize) -> Result<ScatterFigure> {
        if bins == 0 {
            bail!("Histograms need at least one bin");
        }
        let (x_counts, x_edges) = histogram(&xs, bins);
        let (y_counts, y_edges) = histogram(&ys, bins);
        Ok(ScatterFigure {
            x_hist: (bar_heights(&x_counts), x_edges),
            y_hist: (bar_heights(&y_counts), y_edges),
            xs,
            ys,
        })
    }

    fn limits(&self) -> (f64, f64) {
        let upper = |values: &[f64]| {
            let max = values.iter().copied().fold(0.0, f64::max);
            if max > 0.0 {
                max
            } else {
                1.0
            }
        };
        (upper(&self.xs), upper(&self.ys))
    }
}

impl Figure for ScatterFigure {
    fn inches(&self) -> (f64, f64) {
        (3.0, 3.0)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, layout: &Layout) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let main = layout.panel(root, [0.2, 0.2, 0.5, 0.5]);
        let left = layout.panel(root, [0.1, 0.2, 0.08, 0.5]);
        let top = layout.panel(root, [0.2, 0.72, 0.5, 0.08]);
        let (xmax, ymax) = self.limits();
        let edge = BLACK.stroke_width(layout.line(0.2));

        let radius = layout.pt(1.58).round().max(1.0) as i32;
        let mut chart = ChartBuilder::on(&main).build_cartesian_2d(0.0..xmax, 0.0..ymax)?;
        chart.draw_series(
            self.xs
                .iter()
                .zip(&self.ys)
                .map(|(x, y)| Circle::new((*x, *y), radius, IBLUE.mix(0.1).filled())),
        )?;

        let (heights, edges) = &self.x_hist;
        let bars: Vec<[(f64, f64); 2]> = heights
            .iter()
            .zip(edges.windows(2))
            .map(|(h, e)| [(e[0], 0.0), (e[1], *h)])
            .collect();
        let mut chart = ChartBuilder::on(&top).build_cartesian_2d(0.0..xmax, 0.0..1.0)?;
        chart.draw_series(bars.iter().map(|b| Rectangle::new(*b, IGREEN.filled())))?;
        chart.draw_series(bars.iter().map(|b| Rectangle::new(*b, edge)))?;

        let (heights, edges) = &self.y_hist;
        let bars: Vec<[(f64, f64); 2]> = heights
            .iter()
            .zip(edges.windows(2))
            .map(|(h, e)| [(0.0, e[0]), (*h, e[1])])
            .collect();
        let mut chart = ChartBuilder::on(&left).build_cartesian_2d(0.0..1.0, 0.0..ymax)?;
        chart.draw_series(bars.iter().map(|b| Rectangle::new(*b, GREY.filled())))?;
        chart.draw_series(bars.iter().map(|b| Rectangle::new(*b, edge)))?;

        for area in [&main, &left, &top] {
            figure::outline(area, layout.line(0.5))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_bin_is_closed() {
        let (counts, edges) = histogram(&[1.0, 2.0, 3.0], 2);
        assert_eq!(counts, vec![1, 2]);
        assert_eq!(edges, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn single_value_gets_unit_range() {
        let (counts, edges) = histogram(&[2.0, 2.0, 2.0], 2);
        assert_eq!(counts, vec![0, 3]);
        assert_eq!(edges, vec![1.5, 2.0, 2.5]);
    }

    #[test]
    fn heights_are_log_scaled() {
        let heights = bar_heights(&[0, 1, 3]);
        assert_eq!(heights, vec![0.0, 0.5, 1.0]);
        assert_eq!(bar_heights(&[0, 0]), vec![0.0, 0.0]);
    }

    #[test]
    fn reads_and_renders_fixture() {
        let (xs, ys) = read_pairs(".test/scatter.tsv").unwrap();
        assert_eq!(xs.len(), 8);
        assert_eq!(xs[0], 0.0);
        assert_eq!(ys[0], 1.0);
        assert_eq!(xs[1], 3.0);
        let fig = ScatterFigure::new(xs, ys, 50).unwrap();
        assert_eq!(fig.x_hist.0.len(), 50);
        assert_eq!(fig.x_hist.1.len(), 51);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scatter.png");
        figure::save(&fig, out.to_str().unwrap(), 50).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn rejects_bad_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        std::fs::write(&path, "gene a b\ng1 1 oops\n").unwrap();
        assert!(read_pairs(path.to_str().unwrap()).is_err());
        assert!(ScatterFigure::new(vec![1.0], vec![1.0], 0).is_err());
    }
}
