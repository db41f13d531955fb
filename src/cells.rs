use super::figure::{self, Figure, Layout, GREY};
use super::myio;
use anyhow::{bail, Context, Result};
use num_format::{Locale, ToFormattedString};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Neighbourhood radius in inches of panel space.
const NEIGHBOUR_RADIUS: f64 = 8.0 / 72.0;
/// Width and height of each scatter panel in inches.
const PANEL_INCHES: f64 = 1.5;
const MAX_DENSITY: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub barcode: String,
    pub x: f64,
    pub y: f64,
    pub kind: String,
}

fn parse_coord(value: &str, filename: &str, line: usize) -> Result<f64> {
    value
        .parse::<f64>()
        .with_context(|| format!("{}:{}: {:?} is not a coordinate", filename, line, value))
}

/// Read `barcode x y` rows.
pub fn read_positions(filename: &str) -> Result<Vec<(String, f64, f64)>> {
    let mut positions = Vec::new();
    for (idx, line) in myio::lines(filename)?.iter().enumerate() {
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.is_empty() {
            continue;
        }
        if t.len() < 3 {
            bail!("{}:{}: expected barcode, x and y", filename, idx + 1);
        }
        positions.push((
            t[0].to_string(),
            parse_coord(t[1], filename, idx + 1)?,
            parse_coord(t[2], filename, idx + 1)?,
        ));
    }
    log::info!(
        "{} positions in {}",
        positions.len().to_formatted_string(&Locale::en),
        filename
    );
    Ok(positions)
}

/// Cell type of each barcode. The first line is a header; the type is in the
/// second column and the barcode in the third.
pub fn read_celltypes(filename: &str) -> Result<HashMap<String, String>> {
    let mut types = HashMap::new();
    for (idx, line) in myio::lines(filename)?.iter().enumerate().skip(1) {
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.is_empty() {
            continue;
        }
        if t.len() < 3 {
            bail!("{}:{}: expected a cell type and a barcode", filename, idx + 1);
        }
        types.insert(t[2].to_string(), t[1].to_string());
    }
    Ok(types)
}

/// Cells with both a position and a type, in position order.
pub fn merge(positions: Vec<(String, f64, f64)>, types: &HashMap<String, String>) -> Vec<Cell> {
    let cells: Vec<Cell> = positions
        .into_iter()
        .filter_map(|(barcode, x, y)| {
            types.get(&barcode).map(|kind| Cell {
                kind: kind.clone(),
                barcode,
                x,
                y,
            })
        })
        .collect();
    log::info!("{} cells have a type", cells.len().to_formatted_string(&Locale::en));
    cells
}

/// Median of `values`, averaging the middle pair for even counts.
/// # Example
/// ```
/// use rustyplot::cells::median;
/// assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
/// assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
/// assert_eq!(median(&[]), None);
/// ```
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median position of each cell type, in natural order of the type names.
pub fn type_medians(cells: &[Cell]) -> Vec<(String, f64, f64)> {
    let mut groups: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for cell in cells {
        let group = groups.entry(cell.kind.as_str()).or_default();
        group.0.push(cell.x);
        group.1.push(cell.y);
    }
    let mut medians: Vec<(String, f64, f64)> = groups
        .into_iter()
        .filter_map(|(kind, (xs, ys))| Some((kind.to_string(), median(&xs)?, median(&ys)?)))
        .collect();
    medians.sort_by(|a, b| natord::compare(&a.0, &b.0));
    medians
}

fn data_range(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range > 0.0 {
        range
    } else {
        1.0
    }
}

/// Number of other points within 8/72 inch of each point once the data is
/// scaled onto a 1.5 inch square panel, capped at 100.
pub fn density(points: &[(f64, f64)]) -> Vec<u32> {
    let sx = PANEL_INCHES / data_range(points.iter().map(|p| p.0));
    let sy = PANEL_INCHES / data_range(points.iter().map(|p| p.1));
    points
        .par_iter()
        .enumerate()
        .map(|(i, (x1, y1))| {
            let count = points
                .iter()
                .enumerate()
                .filter(|(j, (x2, y2))| {
                    *j != i && ((x1 - x2) * sx).hypot((y1 - y2) * sy) < NEIGHBOUR_RADIUS
                })
                .count();
            (count as u32).min(MAX_DENSITY)
        })
        .collect()
}

pub fn type_color(kind: &str) -> RGBColor {
    match kind {
        "monocyte" => RGBColor(255, 0, 0),
        "neuron" => RGBColor(0, 0, 255),
        "glia" => RGBColor(0, 128, 0),
        "tCell" => RGBColor(128, 0, 128),
        "bCell" => RGBColor(0, 255, 255),
        _ => GREY,
    }
}

pub struct CellsFigure {
    pub cells: Vec<Cell>,
    pub density: Vec<u32>,
    pub medians: Vec<(String, f64, f64)>,
}

impl CellsFigure {
    pub fn new(cells: Vec<Cell>) -> Result<CellsFigure> {
        if cells.is_empty() {
            bail!("No cell has both a position and a type");
        }
        let points: Vec<(f64, f64)> = cells.iter().map(|c| (c.x, c.y)).collect();
        let density = density(&points);
        log::debug!("Largest density {}", density.iter().max().copied().unwrap_or(0));
        Ok(CellsFigure {
            medians: type_medians(&cells),
            cells,
            density,
        })
    }

    /// Data limits with a 5% margin on each side.
    fn limits(&self) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
        let pad = |values: Vec<f64>| {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let margin = if max > min { (max - min) * 0.05 } else { 0.5 };
            min - margin..max + margin
        };
        (
            pad(self.cells.iter().map(|c| c.x).collect()),
            pad(self.cells.iter().map(|c| c.y).collect()),
        )
    }

    fn axis_labels<DB>(
        &self,
        root: &DrawingArea<DB, Shift>,
        area: &DrawingArea<DB, Shift>,
        layout: &Layout,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let style = layout.font(8.0);
        let (left, top) = area.get_base_pixel();
        let (w, h) = area.dim_in_pixel();
        let gap = layout.pt(4.0).round() as i32;
        figure::text(
            root,
            "tSNE 2",
            (left + w as i32 / 2, top + h as i32 + gap),
            &style,
            HPos::Center,
            VPos::Top,
        )?;
        figure::vertical_text(root, "tSNE 1", (left - 2 * gap, top + h as i32 / 2), &style)?;
        Ok(())
    }
}

impl Figure for CellsFigure {
    fn inches(&self) -> (f64, f64) {
        (5.0, 3.0)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, layout: &Layout) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (fw, fh) = self.inches();
        let types = layout.panel(root, [0.5 / fw, 0.5 / fh, 1.5 / fw, 1.5 / fh]);
        let dense = layout.panel(root, [2.5 / fw, 0.5 / fh, 1.5 / fw, 1.5 / fh]);
        let bar = layout.panel(root, [4.0 / fw, 1.1 / fh, 0.1 / fw, 0.3 / fh]);
        let (xr, yr) = self.limits();
        let radius = layout.pt(2.0).round().max(1.0) as i32;

        let mut chart = ChartBuilder::on(&types).build_cartesian_2d(xr.clone(), yr.clone())?;
        chart.draw_series(
            self.cells
                .iter()
                .map(|c| Circle::new((c.x, c.y), radius, type_color(&c.kind).filled())),
        )?;
        chart.draw_series(
            self.cells
                .iter()
                .map(|c| Circle::new((c.x, c.y), radius, BLACK.stroke_width(layout.line(0.5)))),
        )?;
        // white text under black text reads as a halo
        for (kind, x, y) in &self.medians {
            let at = chart.backend_coord(&(*x, *y));
            figure::text(root, kind, at, &layout.bold(9.0).color(&WHITE), HPos::Center, VPos::Center)?;
            figure::text(root, kind, at, &layout.bold(8.0), HPos::Center, VPos::Center)?;
        }

        let mut chart = ChartBuilder::on(&dense).build_cartesian_2d(xr, yr)?;
        chart.draw_series(self.cells.iter().zip(&self.density).map(|(c, d)| {
            Circle::new(
                (c.x, c.y),
                radius,
                ViridisRGB
                    .get_color_normalized(*d as f64, 0.0, MAX_DENSITY as f64)
                    .filled(),
            )
        }))?;

        for area in [&types, &dense] {
            figure::outline(area, layout.line(0.5))?;
            self.axis_labels(root, area, layout)?;
        }
        let (left, top) = dense.get_base_pixel();
        let (w, h) = dense.dim_in_pixel();
        figure::text(
            root,
            "Density",
            (left + (w as f64 * 0.05) as i32, top + (h as f64 * 0.95) as i32),
            &layout.font(8.0),
            HPos::Left,
            VPos::Bottom,
        )?;
        figure::colorbar(root, &bar, &ViridisRGB, layout, &layout.font(8.0))?;
        Ok(())
    }
}
