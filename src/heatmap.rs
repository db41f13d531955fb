use super::figure::{self, Figure, Layout};
use super::myio;
use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use std::collections::HashMap;

/// Header fragment marking an expression column.
const EXPRESSION_TAG: &str = "FPKM_CT";
const PHASE_COLUMN: &str = "Peak_phase(CT)";

lazy_static! {
    /// Five stop purple to yellow map.
    pub static ref VIRIDIAN: DerivedColorMap<RGBColor> = DerivedColorMap::new(&[
        RGBColor(68, 1, 84),
        RGBColor(59, 82, 139),
        RGBColor(33, 145, 140),
        RGBColor(94, 201, 98),
        RGBColor(253, 231, 37),
    ]);
}

/// Expression table restricted to its time point columns.
#[derive(Debug, Default, Clone)]
pub struct Expression {
    pub ids: Vec<String>,
    /// Display names, the identifier when the table has no label column.
    pub labels: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

fn tsv_reader(filename: &str) -> Result<csv::Reader<Box<dyn std::io::BufRead>>> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .from_reader(myio::reader(filename)?))
}

fn parse_value(value: &str, filename: &str, line: u64) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{}:{}: {:?} is not a number", filename, line, value))
}

fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

impl Expression {
    pub fn from_file(filename: &str, id_column: &str, label_column: &str) -> Result<Expression> {
        let mut reader = tsv_reader(filename)?;
        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read header of {}", filename))?
            .clone();
        let id_idx = match header_index(&headers, id_column) {
            Some(idx) => idx,
            None => bail!("{} has no {} column", filename, id_column),
        };
        let label_idx = header_index(&headers, label_column);
        let value_idx: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.contains(EXPRESSION_TAG))
            .map(|(i, _)| i)
            .collect();
        if value_idx.is_empty() {
            bail!("{} has no {} columns", filename, EXPRESSION_TAG);
        }

        let mut expr = Expression {
            columns: value_idx.iter().map(|i| headers[*i].to_string()).collect(),
            ..Default::default()
        };
        for rec in reader.records() {
            let rec = rec.with_context(|| format!("Error reading {}", filename))?;
            let line = rec.position().map_or(0, |p| p.line());
            let id = rec.get(id_idx).unwrap_or_default().trim().to_string();
            let label = label_idx
                .and_then(|i| rec.get(i))
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| id.clone());
            let values = value_idx
                .iter()
                .map(|i| parse_value(rec.get(*i).unwrap_or_default(), filename, line))
                .collect::<Result<Vec<f64>>>()?;
            expr.ids.push(id);
            expr.labels.push(label);
            expr.values.push(values);
        }
        log::info!(
            "{} genes with {} time points in {}",
            expr.ids.len(),
            expr.columns.len(),
            filename
        );
        Ok(expr)
    }
}

/// Peak phase of each gene keyed by the first column.
pub fn read_phases(filename: &str) -> Result<HashMap<String, f64>> {
    let mut reader = tsv_reader(filename)?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", filename))?
        .clone();
    let phase_idx = match header_index(&headers, PHASE_COLUMN) {
        Some(idx) => idx,
        None => bail!("{} has no {} column", filename, PHASE_COLUMN),
    };
    let mut phases = HashMap::new();
    for rec in reader.records() {
        let rec = rec.with_context(|| format!("Error reading {}", filename))?;
        let line = rec.position().map_or(0, |p| p.line());
        let phase = parse_value(rec.get(phase_idx).unwrap_or_default(), filename, line)?;
        phases.insert(rec.get(0).unwrap_or_default().trim().to_string(), phase);
    }
    log::debug!("{} phases in {}", phases.len(), filename);
    Ok(phases)
}

/// Scale a row onto 0..100 and truncate to whole numbers.
/// A flat row has nothing to scale and becomes all zeros.
/// # Example
/// ```
/// use rustyplot::heatmap::normalize_row;
/// assert_eq!(normalize_row(&[2.0, 4.0, 5.0]), vec![0.0, 66.0, 100.0]);
/// assert_eq!(normalize_row(&[3.0, 3.0]), vec![0.0, 0.0]);
/// ```
pub fn normalize_row(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|v| ((v - min) / (max - min) * 100.0).trunc())
        .collect()
}

/// Fractional source row of each of the `n * factor` output rows.
fn sample_points(n: usize, factor: usize) -> Vec<f64> {
    let m = n * factor;
    (0..m)
        .map(|k| {
            if m > 1 {
                k as f64 * (n - 1) as f64 / (m - 1) as f64
            } else {
                0.0
            }
        })
        .collect()
}

/// Linearly interpolate between rows to get `rows.len() * factor` rows.
pub fn interpolate_rows(rows: &[Vec<f64>], factor: usize) -> Vec<Vec<f64>> {
    let n = rows.len();
    sample_points(n, factor)
        .into_iter()
        .map(|x| {
            let i = (x.floor() as usize).min(n - 1);
            let j = (i + 1).min(n - 1);
            let f = x - i as f64;
            rows[i]
                .iter()
                .zip(&rows[j])
                .map(|(a, b)| a + (b - a) * f)
                .collect()
        })
        .collect()
}

/// Output row closest to source row `row`.
fn interpolated_row(row: usize, n: usize, factor: usize) -> usize {
    let m = n * factor;
    if n <= 1 {
        return 0;
    }
    (row as f64 * (m - 1) as f64 / (n - 1) as f64).round() as usize
}

pub struct HeatmapFigure {
    pub matrix: Vec<Vec<f64>>,
    pub columns: usize,
    /// Output row and label of each requested gene.
    pub gene_ticks: Vec<(usize, String)>,
}

impl HeatmapFigure {
    pub fn new(
        expr: &Expression,
        phases: &HashMap<String, f64>,
        genes: &[String],
        factor: usize,
    ) -> Result<HeatmapFigure> {
        if factor == 0 {
            bail!("Interpolation factor must be at least 1");
        }
        let mut order: Vec<(usize, f64)> = expr
            .ids
            .iter()
            .enumerate()
            .filter_map(|(i, id)| phases.get(id).map(|phase| (i, *phase)))
            .collect();
        if order.is_empty() {
            bail!("No gene is in both the expression and the phase table");
        }
        order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        log::info!("{} genes ordered by peak phase", order.len());

        let rows: Vec<Vec<f64>> = order
            .iter()
            .map(|(i, _)| normalize_row(&expr.values[*i]))
            .collect();
        let n = rows.len();

        let mut gene_ticks = Vec::new();
        for gene in genes {
            match order
                .iter()
                .position(|(i, _)| &expr.ids[*i] == gene || &expr.labels[*i] == gene)
            {
                Some(row) => gene_ticks.push((interpolated_row(row, n, factor), gene.clone())),
                None => log::warn!("{} is not in the heatmap", gene),
            }
        }

        Ok(HeatmapFigure {
            matrix: interpolate_rows(&rows, factor),
            columns: expr.columns.len(),
            gene_ticks,
        })
    }

    fn value_range(&self) -> (f64, f64) {
        self.matrix
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            })
    }
}

impl Figure for HeatmapFigure {
    fn inches(&self) -> (f64, f64) {
        (5.0, 3.0)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, layout: &Layout) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (fw, fh) = self.inches();
        let panel = layout.panel(root, [0.7 / fw, 0.3 / fh, 0.75 / fw, 2.5 / fh]);
        let bar = layout.panel(root, [1.5 / fw, 1.45 / fh, 0.1 / fw, 0.2 / fh]);
        let (w, h) = panel.dim_in_pixel();
        let (w, h) = (w as f64, h as f64);
        let m = self.matrix.len();
        let cols = self.columns.max(1) as f64;
        let (min, max) = self.value_range();

        // nearest neighbour, one rectangle per pixel row and column
        for py in 0..h as i32 {
            let row = (((py as f64 + 0.5) * m as f64 / h) as usize).min(m.saturating_sub(1));
            for (c, v) in self.matrix[row].iter().enumerate() {
                let x0 = (c as f64 * w / cols).round() as i32;
                let x1 = ((c + 1) as f64 * w / cols).round() as i32;
                panel.draw(&Rectangle::new(
                    [(x0, py), (x1, py + 1)],
                    figure::scaled_color(&*VIRIDIAN, *v, min, max).filled(),
                ))?;
            }
        }
        figure::outline(&panel, layout.line(0.5))?;

        let style = layout.font(8.0);
        let (left, top) = panel.get_base_pixel();
        let baseline = top + h as i32;
        let ticks: Vec<(i32, String)> = (0..self.columns)
            .map(|c| {
                let x = left + ((c as f64 + 0.5) * w / cols).round() as i32;
                let label = if c % 2 == 0 { (3 * c).to_string() } else { String::new() };
                (x, label)
            })
            .collect();
        figure::x_ticks(root, &ticks, baseline, layout, &style)?;
        figure::text(
            root,
            "CT",
            (left + w as i32 / 2, baseline + layout.pt(12.0).round() as i32),
            &style,
            HPos::Center,
            VPos::Top,
        )?;
        let ticks: Vec<(i32, String)> = self
            .gene_ticks
            .iter()
            .map(|(row, gene)| {
                let y = top + ((*row as f64 + 0.5) * h / m.max(1) as f64).round() as i32;
                (y, gene.clone())
            })
            .collect();
        figure::y_ticks(root, &ticks, left, layout, &style)?;

        figure::colorbar(root, &bar, &*VIRIDIAN, layout, &style)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_rows_and_truncation() {
        assert_eq!(normalize_row(&[0.0, 1.0, 3.0]), vec![0.0, 33.0, 100.0]);
        assert_eq!(normalize_row(&[7.0; 4]), vec![0.0; 4]);
    }

    #[test]
    fn interpolation_keeps_end_rows() {
        let rows = vec![vec![0.0, 100.0], vec![100.0, 0.0]];
        let out = interpolate_rows(&rows, 2);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], rows[0]);
        assert_eq!(out[3], rows[1]);
        assert!((out[1][0] - 100.0 / 3.0).abs() < 1e-9);
        assert!((out[2][1] - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn single_row_is_repeated() {
        let out = interpolate_rows(&[vec![1.0, 2.0]], 3);
        assert_eq!(out, vec![vec![1.0, 2.0]; 3]);
        assert_eq!(interpolated_row(0, 1, 3), 0);
    }

    #[test]
    fn gene_rows_map_onto_interpolated_rows() {
        assert_eq!(interpolated_row(0, 4, 5), 0);
        assert_eq!(interpolated_row(3, 4, 5), 19);
    }

    #[test]
    fn fixture_sorted_by_phase() {
        let expr = Expression::from_file(".test/expression.tsv", "Ensembl_ID", "Gene_name").unwrap();
        assert_eq!(expr.columns.len(), 4);
        assert_eq!(expr.ids.len(), 5);
        let phases = read_phases(".test/phase.tsv").unwrap();
        let genes = vec!["Per1".to_string(), "ENSMUSG04".to_string(), "Nope".to_string()];
        let fig = HeatmapFigure::new(&expr, &phases, &genes, 5).unwrap();
        // four genes have a phase
        assert_eq!(fig.matrix.len(), 20);
        assert_eq!(fig.columns, 4);
        // Per1 has the earliest phase, ENSMUSG04 the latest
        assert_eq!(fig.gene_ticks, vec![(0, "Per1".to_string()), (19, "ENSMUSG04".to_string())]);
        assert_eq!(fig.matrix[0], vec![100.0, 50.0, 0.0, 0.0]);
    }

    #[test]
    fn quotes_are_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expression.tsv");
        std::fs::write(
            &path,
            "Ensembl_ID\tNote\tFPKM_CT0\tFPKM_CT3\nENSMUSG01\t\"5' UTR\t1\t2\nENSMUSG02\tplain\t3\t4\n",
        )
        .unwrap();
        let expr = Expression::from_file(path.to_str().unwrap(), "Ensembl_ID", "Note").unwrap();
        assert_eq!(expr.labels, vec!["\"5' UTR".to_string(), "plain".to_string()]);
        assert_eq!(expr.values, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn viridian_ends() {
        assert_eq!(figure::scaled_color(&*VIRIDIAN, 0.0, 0.0, 100.0), RGBColor(68, 1, 84));
        assert_eq!(figure::scaled_color(&*VIRIDIAN, 100.0, 0.0, 100.0), RGBColor(253, 231, 37));
    }

    #[test]
    fn renders_png() {
        if !figure::have_fonts() {
            return;
        }
        let expr = Expression::from_file(".test/expression.tsv", "Ensembl_ID", "Gene_name").unwrap();
        let phases = read_phases(".test/phase.tsv").unwrap();
        let fig = HeatmapFigure::new(&expr, &phases, &["Per1".to_string()], 5).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("heatmap.png");
        figure::save(&fig, out.to_str().unwrap(), 60).unwrap();
        assert!(std::fs::metadata(&out).unwrap().len() > 0);
    }

    #[test]
    fn missing_columns_are_errors() {
        assert!(Expression::from_file(".test/phase.tsv", "Ensembl_ID", "Gene_name").is_err());
        assert!(read_phases(".test/expression.tsv").is_err());
    }
}
