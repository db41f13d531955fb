use super::figure::{self, Figure, Layout};
use super::myio;
use anyhow::{Context, Result};
use bio::io::fasta;
use image::imageops::FilterType;
use image::DynamicImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use std::fmt;

/// Positions covered by each splice site sequence.
pub const LOGO_WIDTH: usize = 20;
/// Bases in the column order of a frequency profile.
pub const BASES: [u8; 4] = *b"ATGC";
/// Added inside the logarithm so absent bases contribute zero.
const PSEUDO: f64 = 1e-10;

pub type Profile = [[f64; 4]; LOGO_WIDTH];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Five,
    Three,
}

impl Site {
    /// A header mentioning `5'` is a 5' splice site, anything else is a 3' site.
    pub fn from_header(header: &str) -> Site {
        if header.contains("5'") {
            Site::Five
        } else {
            Site::Three
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Site::Five => write!(f, "5'SS"),
            Site::Three => write!(f, "3'SS"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    EmptyCategory { site: Site },
    UnknownBase { site: Site, base: char, position: usize },
    SequenceTooLong { site: Site, len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EmptyCategory { site } => write!(f, "no {} sequences to build a logo from", site),
            Error::UnknownBase {
                site,
                base,
                position,
            } => write!(f, "{} sequence has {:?} at position {}", site, base, position + 1),
            Error::SequenceTooLong { site, len } => write!(
                f,
                "{} sequence has {} bases, logos are {} wide",
                site, len, LOGO_WIDTH
            ),
        }
    }
}

impl std::error::Error for Error {}

/// Sequences of a splice site file split by category.
#[derive(Debug, Default, Clone)]
pub struct SpliceSites {
    pub five: Vec<Vec<u8>>,
    pub three: Vec<Vec<u8>>,
}

impl SpliceSites {
    pub fn get(&self, site: Site) -> &[Vec<u8>] {
        match site {
            Site::Five => &self.five,
            Site::Three => &self.three,
        }
    }

    fn push(&mut self, site: Site, seq: Vec<u8>) {
        match site {
            Site::Five => self.five.push(seq),
            Site::Three => self.three.push(seq),
        }
    }

    pub fn from_file(filename: &str) -> Result<SpliceSites> {
        let reader = fasta::Reader::new(myio::reader(filename)?);
        let mut sites = SpliceSites::default();
        for (idx, rec) in reader.records().enumerate() {
            let rec = rec.with_context(|| format!("Error reading record {} of {}", idx + 1, filename))?;
            let header = match rec.desc() {
                Some(desc) => format!("{} {}", rec.id(), desc),
                None => rec.id().to_string(),
            };
            if rec.seq().is_empty() {
                log::debug!("Skipping {} with no sequence", header);
                continue;
            }
            sites.push(Site::from_header(&header), rec.seq().to_ascii_uppercase());
        }
        log::info!(
            "{} 5' and {} 3' splice sites in {}",
            sites.five.len(),
            sites.three.len(),
            filename
        );
        Ok(sites)
    }
}

/// Fraction of sequences carrying each base at each position.
/// # Example
/// ```
/// use rustyplot::logo::*;
/// let seqs = vec![b"ACGTACGTACGTACGTACGT".to_vec(), b"ACGTACGTACGTACGTACGT".to_vec()];
/// let profile = base_frequencies(Site::Five, &seqs).unwrap();
/// assert_eq!(profile[0], [1.0, 0.0, 0.0, 0.0]);
/// assert!(base_frequencies(Site::Three, &[]).is_err());
/// ```
pub fn base_frequencies(site: Site, seqs: &[Vec<u8>]) -> Result<Profile, Error> {
    if seqs.is_empty() {
        return Err(Error::EmptyCategory { site });
    }
    let mut profile = [[0.0; 4]; LOGO_WIDTH];
    for seq in seqs {
        if seq.len() > LOGO_WIDTH {
            return Err(Error::SequenceTooLong {
                site,
                len: seq.len(),
            });
        }
        for (position, base) in seq.iter().enumerate() {
            let column = BASES
                .iter()
                .position(|b| b == &base.to_ascii_uppercase())
                .ok_or(Error::UnknownBase {
                    site,
                    base: *base as char,
                    position,
                })?;
            profile[position][column] += 1.0;
        }
    }
    let n = seqs.len() as f64;
    for counts in profile.iter_mut() {
        for count in counts.iter_mut() {
            *count /= n;
        }
    }
    Ok(profile)
}

/// Shannon entropy in bits of one position.
pub fn entropy(freqs: &[f64; 4]) -> f64 {
    -freqs.iter().map(|f| f * (f + PSEUDO).log2()).sum::<f64>()
}

/// The three most frequent bases at one position with their heights in bits,
/// listed bottom to top so the most frequent base ends up on top.
/// # Example
/// ```
/// use rustyplot::logo::stack_heights;
/// let stack = stack_heights(&[0.0, 0.0, 1.0, 0.0]);
/// assert_eq!(stack.last().unwrap().0, 2);
/// assert!((stack.last().unwrap().1 - 2.0).abs() < 1e-6);
/// ```
pub fn stack_heights(freqs: &[f64; 4]) -> Vec<(usize, f64)> {
    let scale = 2.0 - entropy(freqs);
    let mut order: Vec<usize> = (0..4).collect();
    order.sort_by(|a, b| {
        freqs[*b]
            .partial_cmp(&freqs[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
        .into_iter()
        .take(3)
        .rev()
        .map(|base| (base, freqs[base] * scale))
        .collect()
}

/// Colour used for a base when no glyph image is supplied.
fn base_color(base: usize) -> RGBColor {
    match BASES[base] {
        b'A' => RGBColor(16, 150, 72),
        b'C' => RGBColor(37, 92, 153),
        b'G' => RGBColor(247, 179, 43),
        _ => RGBColor(214, 40, 57),
    }
}

pub struct LogoFigure {
    pub profiles: Vec<(Site, Profile)>,
    /// Optional glyph images in `BASES` order.
    pub glyphs: [Option<DynamicImage>; 4],
}

impl LogoFigure {
    pub fn new(sites: &SpliceSites, glyphs: [Option<DynamicImage>; 4]) -> Result<LogoFigure> {
        let mut profiles = Vec::new();
        for site in [Site::Five, Site::Three] {
            profiles.push((site, base_frequencies(site, sites.get(site))?));
        }
        Ok(LogoFigure { profiles, glyphs })
    }

    /// Stacked bases of one profile and the line at the splice site.
    fn draw_stacks<DB>(&self, area: &DrawingArea<DB, Shift>, profile: &Profile, layout: &Layout) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let mut chart = ChartBuilder::on(area).build_cartesian_2d(-10.0..10.0, 0.0..2.0)?;

        for (pos, freqs) in profile.iter().enumerate() {
            let x0 = pos as f64 - 10.0;
            let x1 = x0 + 1.0;
            let mut bottom = 0.0;
            for (base, height) in stack_heights(freqs) {
                let top = bottom + height;
                match &self.glyphs[base] {
                    Some(glyph) => {
                        let (px0, py0) = chart.backend_coord(&(x0, top));
                        let (px1, py1) = chart.backend_coord(&(x1, bottom));
                        if px1 > px0 && py1 > py0 {
                            let img = glyph.resize_exact(
                                (px1 - px0) as u32,
                                (py1 - py0) as u32,
                                FilterType::Triangle,
                            );
                            let elem: BitMapElement<_> = ((x0, top), img).into();
                            chart.draw_series(std::iter::once(elem))?;
                        }
                    }
                    None => {
                        chart.draw_series(std::iter::once(Rectangle::new(
                            [(x0, bottom), (x1, top)],
                            base_color(base).filled(),
                        )))?;
                    }
                }
                bottom = top;
            }
        }
        chart.draw_series(LineSeries::new(
            vec![(0.0, 0.0), (0.0, 2.0)],
            BLACK.stroke_width(layout.line(0.5)),
        ))?;
        Ok(())
    }

    fn draw_logo<DB>(
        &self,
        root: &DrawingArea<DB, Shift>,
        area: &DrawingArea<DB, Shift>,
        site: Site,
        profile: &Profile,
        layout: &Layout,
        first: bool,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        self.draw_stacks(area, profile, layout)?;
        // same ranges as the stacks, only used to place ticks
        let chart = ChartBuilder::on(area).build_cartesian_2d(-10.0..10.0, 0.0..2.0)?;
        figure::outline(area, layout.line(0.5))?;

        // labels
        let label = layout.font(7.4);
        let (left, top) = area.get_base_pixel();
        let (w, h) = area.dim_in_pixel();
        let baseline = top + h as i32;
        let ticks: Vec<(i32, String)> = [-10, -5, 0, 5, 10]
            .iter()
            .map(|x| (chart.backend_coord(&(*x as f64, 0.0)).0, x.to_string()))
            .collect();
        figure::x_ticks(root, &ticks, baseline, layout, &label)?;
        let mid = left + w as i32 / 2;
        let line = layout.pt(9.0).round() as i32;
        figure::text(root, "Distance to", (mid, baseline + 2 * line), &label, HPos::Center, VPos::Top)?;
        figure::text(root, "Splice Site", (mid, baseline + 3 * line), &label, HPos::Center, VPos::Top)?;
        figure::text(
            root,
            &site.to_string(),
            (mid, top - layout.pt(2.0).round() as i32),
            &label,
            HPos::Center,
            VPos::Bottom,
        )?;
        if first {
            let ticks: Vec<(i32, String)> = [0, 1, 2]
                .iter()
                .map(|y| (chart.backend_coord(&(-10.0, *y as f64)).1, y.to_string()))
                .collect();
            figure::y_ticks(root, &ticks, left, layout, &layout.font(4.0))?;
            figure::vertical_text(
                root,
                "Bits",
                (left - layout.pt(14.0).round() as i32, top + h as i32 / 2),
                &label,
            )?;
        }
        Ok(())
    }
}

impl Figure for LogoFigure {
    fn inches(&self) -> (f64, f64) {
        (5.0, 2.0)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, layout: &Layout) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (w, h) = self.inches();
        for (idx, (site, profile)) in self.profiles.iter().enumerate() {
            let left = if idx == 0 { 0.5 } else { 2.2 };
            let area = layout.panel(root, [left / w, 0.3, 1.5 / w, 0.5 / h]);
            self.draw_logo(root, &area, *site, profile, layout, idx == 0)?;
        }
        Ok(())
    }
}

/// Load the optional A, T, G and C glyph images.
pub fn load_glyphs(paths: [&Option<String>; 4]) -> Result<[Option<DynamicImage>; 4]> {
    let mut glyphs: [Option<DynamicImage>; 4] = [None, None, None, None];
    for (glyph, path) in glyphs.iter_mut().zip(paths) {
        if let Some(path) = path {
            *glyph = Some(image::open(path).with_context(|| format!("Failed to open glyph {}", path))?);
        }
    }
    Ok(glyphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_sum_to_one() {
        let seq = b"GTAAGTCCAGTACCTAGGAC".to_vec();
        let profile = base_frequencies(Site::Five, &[seq.clone(), seq]).unwrap();
        for freqs in profile.iter() {
            assert!((freqs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert_eq!(freqs.iter().filter(|f| **f == 1.0).count(), 1);
        }
    }

    #[test]
    fn explicit_errors() {
        assert_eq!(
            base_frequencies(Site::Three, &[]),
            Err(Error::EmptyCategory { site: Site::Three })
        );
        assert!(matches!(
            base_frequencies(Site::Five, &[b"ACGN".to_vec()]),
            Err(Error::UnknownBase { base: 'N', position: 3, .. })
        ));
        assert!(matches!(
            base_frequencies(Site::Five, &[vec![b'A'; 21]]),
            Err(Error::SequenceTooLong { len: 21, .. })
        ));
    }

    #[test]
    fn uniform_position_has_no_height() {
        let freqs = [0.25; 4];
        assert!((entropy(&freqs) - 2.0).abs() < 1e-6);
        for (_, h) in stack_heights(&freqs) {
            assert!(h.abs() < 1e-6);
        }
    }

    #[test]
    fn tallest_base_on_top() {
        // A .5, T .1, G .3, C .1
        let stack = stack_heights(&[0.5, 0.1, 0.3, 0.1]);
        let bases: Vec<usize> = stack.iter().map(|(b, _)| *b).collect();
        assert_eq!(bases, vec![1, 2, 0]);
        assert!(stack.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn splits_fixture_by_header() {
        let sites = SpliceSites::from_file(".test/splice.fa").unwrap();
        assert_eq!(sites.five.len(), 3);
        assert_eq!(sites.three.len(), 2);
        // multi-line records are joined
        assert!(sites.get(Site::Three).iter().all(|s| s.len() == LOGO_WIDTH));
        let fig = LogoFigure::new(&sites, [None, None, None, None]).unwrap();
        assert_eq!(fig.profiles[0].0, Site::Five);
    }

    #[test]
    fn empty_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.fa");
        std::fs::write(
            &path,
            ">a 5'SS\n>b 5'SS\nGTAAGTCCAGTACCTAGGAC\n>c 3'SS\nTTTCTTTTCCTTTCAGGTTA\n",
        )
        .unwrap();
        let sites = SpliceSites::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(sites.five.len(), 1);
        assert_eq!(sites.three.len(), 1);
        let profile = base_frequencies(Site::Five, &sites.five).unwrap();
        for freqs in profile.iter() {
            assert!((freqs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    /// Draw only the stacks of an all A profile into a 100 px square.
    fn stack_pixels(glyphs: [Option<DynamicImage>; 4]) -> Vec<u8> {
        let fig = LogoFigure {
            profiles: vec![],
            glyphs,
        };
        let profile: Profile = [[1.0, 0.0, 0.0, 0.0]; LOGO_WIDTH];
        let layout = Layout::new((1.0, 1.0), 100);
        let mut buf = vec![255u8; 3 * 100 * 100];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (100, 100)).into_drawing_area();
            fig.draw_stacks(&root, &profile, &layout).unwrap();
        }
        buf
    }

    #[test]
    fn glyph_images_are_drawn() {
        let red = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 0])));
        let buf = stack_pixels([Some(red), None, None, None]);
        assert!(buf.chunks(3).any(|px| px == [255, 0, 0]));
        assert!(!buf.chunks(3).any(|px| px == [16, 150, 72]));
    }

    #[test]
    fn missing_glyphs_fall_back_to_colour() {
        let buf = stack_pixels([None, None, None, None]);
        assert!(buf.chunks(3).any(|px| px == [16, 150, 72]));
    }

    #[test]
    fn renders_png() {
        if !figure::have_fonts() {
            return;
        }
        let sites = SpliceSites::from_file(".test/splice.fa").unwrap();
        let fig = LogoFigure::new(&sites, [None, None, None, None]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("logo.png");
        figure::save(&fig, out.to_str().unwrap(), 60).unwrap();
        assert!(std::fs::metadata(&out).unwrap().len() > 0);
    }

    #[test]
    fn header_categories() {
        assert_eq!(Site::from_header("chr1:100-120 5'SS"), Site::Five);
        assert_eq!(Site::from_header("chr1:100-120 3'SS"), Site::Three);
        assert_eq!(Site::from_header("anything"), Site::Three);
        assert_eq!(Site::Five.to_string(), "5'SS");
    }
}
