use anyhow::{Context, Result};
use lazy_static::lazy_static;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle, FontTransform};
use std::ffi::OsStr;
use std::path::Path;

pub const IBLUE: RGBColor = RGBColor(88, 85, 120);
pub const IORANGE: RGBColor = RGBColor(230, 87, 43);
pub const IGREEN: RGBColor = RGBColor(120, 172, 145);
pub const GREY: RGBColor = RGBColor(128, 128, 128);

lazy_static! {
    /// Plasma, sampled at eight evenly spaced stops.
    pub static ref PLASMA: DerivedColorMap<RGBColor> = DerivedColorMap::new(&[
        RGBColor(13, 8, 135),
        RGBColor(84, 2, 163),
        RGBColor(139, 10, 165),
        RGBColor(185, 50, 137),
        RGBColor(219, 92, 104),
        RGBColor(244, 136, 73),
        RGBColor(254, 188, 43),
        RGBColor(240, 249, 33),
    ]);
}

/// Colour of `v` between `min` and `max`. A flat range maps to the low end of the map.
pub fn scaled_color<M: ColorMap<RGBColor, f64>>(map: &M, v: f64, min: f64, max: f64) -> RGBColor {
    if max > min {
        map.get_color_normalized(v, min, max)
    } else {
        map.get_color(0.0)
    }
}

/// Physical size of a figure and the resolution it is rasterised at.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub inches: (f64, f64),
    pub dpi: u32,
}

impl Layout {
    pub fn new(inches: (f64, f64), dpi: u32) -> Layout {
        Layout { inches, dpi }
    }

    /// Pixel dimensions of the whole figure.
    pub fn size(&self) -> (u32, u32) {
        (
            (self.inches.0 * self.dpi as f64).round().max(1.0) as u32,
            (self.inches.1 * self.dpi as f64).round().max(1.0) as u32,
        )
    }

    /// Printer's points to pixels.
    pub fn pt(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    /// Sub-area from a `[left, bottom, width, height]` rectangle given in
    /// fractions of the figure, measured from the lower left corner.
    pub fn panel<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        rect: [f64; 4],
    ) -> DrawingArea<DB, Shift> {
        let (w, h) = self.size();
        let (w, h) = (w as f64, h as f64);
        let x0 = (rect[0] * w).round() as i32;
        let y0 = ((1.0 - rect[1] - rect[3]) * h).round() as i32;
        let pw = (rect[2] * w).round().max(1.0) as u32;
        let ph = (rect[3] * h).round().max(1.0) as u32;
        root.clone().shrink((x0, y0), (pw, ph))
    }

    /// Sans-serif text of the given point size.
    pub fn font(&self, points: f64) -> TextStyle<'static> {
        FontDesc::new(FontFamily::SansSerif, self.pt(points), FontStyle::Normal).color(&BLACK)
    }

    pub fn bold(&self, points: f64) -> TextStyle<'static> {
        FontDesc::new(FontFamily::SansSerif, self.pt(points), FontStyle::Bold).color(&BLACK)
    }

    /// Stroke width in pixels for a line width given in points.
    pub fn line(&self, points: f64) -> u32 {
        self.pt(points).round().max(1.0) as u32
    }
}

/// A figure that can be drawn onto any plotters backend.
pub trait Figure {
    /// Width and height in inches.
    fn inches(&self) -> (f64, f64);

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, layout: &Layout) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

fn is_svg(output: &str) -> bool {
    Path::new(output)
        .extension()
        .and_then(OsStr::to_str)
        .map_or(false, |ext| ext.eq_ignore_ascii_case("svg"))
}

fn render<F, DB>(figure: &F, root: &DrawingArea<DB, Shift>, layout: &Layout) -> Result<()>
where
    F: Figure,
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    figure.draw(root, layout)?;
    root.present()?;
    Ok(())
}

/// Draw `figure` and write it to `output`. SVG for a `.svg` path, otherwise
/// a raster image encoded according to the extension.
pub fn save<F: Figure>(figure: &F, output: &str, dpi: u32) -> Result<()> {
    let layout = Layout::new(figure.inches(), dpi);
    let size = layout.size();
    let result = if is_svg(output) {
        let root = SVGBackend::new(output, size).into_drawing_area();
        render(figure, &root, &layout)
    } else {
        let root = BitMapBackend::new(output, size).into_drawing_area();
        render(figure, &root, &layout)
    };
    result.with_context(|| format!("Failed to write figure {}", output))?;
    log::info!("Wrote {} ({}x{} px)", output, size.0, size.1);
    Ok(())
}

/// Black frame around the edge of an area.
pub fn outline<DB>(area: &DrawingArea<DB, Shift>, width: u32) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = area.dim_in_pixel();
    area.draw(&Rectangle::new(
        [(0, 0), (w as i32 - 1, h as i32 - 1)],
        BLACK.stroke_width(width),
    ))?;
    Ok(())
}

pub fn text<DB>(
    root: &DrawingArea<DB, Shift>,
    label: &str,
    at: (i32, i32),
    style: &TextStyle,
    h: HPos,
    v: VPos,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.draw(&Text::new(
        label.to_string(),
        at,
        style.pos(Pos::new(h, v)),
    ))?;
    Ok(())
}

/// Text rotated to read bottom to top, centred on `at`.
pub fn vertical_text<DB>(
    root: &DrawingArea<DB, Shift>,
    label: &str,
    at: (i32, i32),
    style: &TextStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let style = style
        .transform(FontTransform::Rotate270)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(label.to_string(), at, style))?;
    Ok(())
}

/// Tick marks hanging below `baseline` with their labels underneath.
/// Tick positions are absolute pixel columns.
pub fn x_ticks<DB>(
    root: &DrawingArea<DB, Shift>,
    ticks: &[(i32, String)],
    baseline: i32,
    layout: &Layout,
    style: &TextStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let len = layout.pt(2.0).round() as i32;
    for (x, label) in ticks {
        root.draw(&PathElement::new(
            vec![(*x, baseline), (*x, baseline + len)],
            BLACK.stroke_width(layout.line(0.5)),
        ))?;
        if !label.is_empty() {
            text(root, label, (*x, baseline + 2 * len), style, HPos::Center, VPos::Top)?;
        }
    }
    Ok(())
}

/// Tick marks left of `edge` with right aligned labels. Positions are absolute pixel rows.
pub fn y_ticks<DB>(
    root: &DrawingArea<DB, Shift>,
    ticks: &[(i32, String)],
    edge: i32,
    layout: &Layout,
    style: &TextStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let len = layout.pt(2.0).round() as i32;
    for (y, label) in ticks {
        root.draw(&PathElement::new(
            vec![(edge - len, *y), (edge, *y)],
            BLACK.stroke_width(layout.line(0.5)),
        ))?;
        if !label.is_empty() {
            text(root, label, (edge - 2 * len, *y), style, HPos::Right, VPos::Center)?;
        }
    }
    Ok(())
}

/// Vertical colour bar filling `area`, low values at the bottom, with
/// "Min" and "Max" written to its right.
pub fn colorbar<DB, M>(
    root: &DrawingArea<DB, Shift>,
    area: &DrawingArea<DB, Shift>,
    map: &M,
    layout: &Layout,
    style: &TextStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    M: ColorMap<RGBColor, f64>,
{
    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as i32, h as i32);
    for row in 0..h {
        let t = 1.0 - row as f64 / (h - 1).max(1) as f64;
        area.draw(&Rectangle::new(
            [(0, row), (w, row + 1)],
            map.get_color(t).filled(),
        ))?;
    }
    outline(area, layout.line(0.5))?;

    let (x0, y0) = area.get_base_pixel();
    let x = x0 + w + layout.pt(3.0).round() as i32;
    text(root, "Max", (x, y0), style, HPos::Left, VPos::Center)?;
    text(root, "Min", (x, y0 + h), style, HPos::Left, VPos::Center)?;
    Ok(())
}

/// Whether the bitmap backend can rasterise text on this machine.
#[cfg(test)]
pub(crate) fn have_fonts() -> bool {
    let mut buf = vec![0u8; 3 * 16 * 16];
    let root = BitMapBackend::with_buffer(&mut buf, (16, 16)).into_drawing_area();
    let style = Layout::new((1.0, 1.0), 72).font(8.0);
    let drawn = root.draw(&Text::new("A", (0, 0), style)).is_ok();
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_range_maps_to_low_end() {
        assert_eq!(scaled_color(&ViridisRGB, 5.0, 5.0, 5.0), RGBColor(68, 1, 84));
        assert_eq!(scaled_color(&ViridisRGB, 10.0, 0.0, 10.0), RGBColor(254, 232, 37));
        // values outside the range are clamped
        assert_eq!(scaled_color(&*PLASMA, -3.0, 0.0, 1.0), RGBColor(13, 8, 135));
        assert_eq!(scaled_color(&*PLASMA, 7.0, 0.0, 1.0), RGBColor(240, 249, 33));
    }

    #[test]
    fn layout_converts_inches_and_points() {
        let layout = Layout::new((5.0, 2.0), 300);
        assert_eq!(layout.size(), (1500, 600));
        assert!((layout.pt(72.0) - 300.0).abs() < 1e-9);
        assert_eq!(layout.line(0.1), 1);
    }

    #[test]
    fn svg_detection() {
        assert!(is_svg("out/figure.SVG"));
        assert!(!is_svg("figure.png"));
        assert!(!is_svg("figure"));
    }
}
