use super::figure::{self, Figure, Layout, PLASMA};
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Twelve step rainbow, red through purple.
pub const RAINBOW: [RGBColor; 12] = [
    RGBColor(225, 13, 50),
    RGBColor(242, 50, 54),
    RGBColor(239, 99, 59),
    RGBColor(244, 138, 30),
    RGBColor(248, 177, 61),
    RGBColor(143, 138, 86),
    RGBColor(32, 100, 113),
    RGBColor(42, 88, 132),
    RGBColor(56, 66, 156),
    RGBColor(84, 60, 135),
    RGBColor(110, 57, 115),
    RGBColor(155, 42, 90),
];

const GRADIENT_STEPS: usize = 300;

/// Strips of a colour map across `[0, 2]`, one per step, as (x0, x1, colour).
pub fn gradient_strips<M: ColorMap<RGBColor, f64>>(map: &M, steps: usize) -> Vec<(f64, f64, RGBColor)> {
    let width = 2.0 / steps as f64;
    (0..steps)
        .map(|i| {
            let t = if steps > 1 {
                i as f64 / (steps - 1) as f64
            } else {
                0.0
            };
            (i as f64 * width, (i + 1) as f64 * width, map.get_color(t))
        })
        .collect()
}

/// Circle outlines in a rainbow next to viridis and plasma ramps.
#[derive(Debug, Default)]
pub struct SwatchFigure;

impl Figure for SwatchFigure {
    fn inches(&self) -> (f64, f64) {
        (5.0, 2.0)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, layout: &Layout) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let circles = layout.panel(root, [0.04, 0.1, 0.2, 0.5]);
        let ramps = layout.panel(root, [0.35, 0.1, 0.4, 0.5]);

        // the square panel keeps circles round when x widens to 16 units
        let (w, _) = circles.dim_in_pixel();
        let radius = (w as f64 / 16.0).round().max(1.0) as i32;
        let mut chart = ChartBuilder::on(&circles).build_cartesian_2d(-0.5..15.5, 0.0..16.0)?;
        chart.draw_series(RAINBOW.iter().enumerate().map(|(i, color)| {
            Circle::new(
                (2.0 + i as f64, 8.0),
                radius,
                color.stroke_width(layout.line(1.0)),
            )
        }))?;

        let mut chart = ChartBuilder::on(&ramps).build_cartesian_2d(0.0..2.0, 0.0..1.0)?;
        let rows = [
            (gradient_strips(&ViridisRGB, GRADIENT_STEPS), 0.0),
            (gradient_strips(&*PLASMA, GRADIENT_STEPS), 0.5),
        ];
        for (strips, y0) in rows {
            chart.draw_series(
                strips
                    .into_iter()
                    .map(|(x0, x1, color)| Rectangle::new([(x0, y0), (x1, y0 + 0.5)], color.filled())),
            )?;
        }
        chart.draw_series(LineSeries::new(
            vec![(0.0, 0.49), (2.0, 0.49)],
            BLACK.stroke_width(layout.line(0.7)),
        ))?;

        for area in [&circles, &ramps] {
            figure::outline(area, layout.line(1.5))?;
        }
        Ok(())
    }
}
