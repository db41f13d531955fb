use super::coverage::read_coverage;
use super::figure::{self, Figure, Layout, GREY, IBLUE, IORANGE};
use super::gtf::{BlockKind, Transcript};
use super::psl::PslRecord;
use super::region::Region;
use super::stack::pack_lanes;
use anyhow::Result;
use itertools::Itertools;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Height of an aligned block, in row units.
const READ_BLOCK: f64 = 0.5;
/// Offset and height of the thin line joining the blocks of one read.
const READ_LINE: (f64, f64) = (0.18, 0.05);
const TRANSCRIPT_LINE: (f64, f64) = (0.23, 0.05);
const EXON_HEIGHT: f64 = 0.25;
const CDS_HEIGHT: f64 = 0.5;
/// Row pitch of the condensed read panel.
const CONDENSED_PITCH: f64 = 0.2;

/// Key used to order reads before they are packed into rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOrder {
    ByStart,
    ByEnd,
}

/// Sort reads by `order` and pack them into non-overlapping rows.
pub fn stack_reads(mut reads: Vec<PslRecord>, order: ReadOrder) -> Vec<Vec<PslRecord>> {
    match order {
        ReadOrder::ByStart => reads.sort_by_key(|r| r.t_st),
        ReadOrder::ByEnd => reads.sort_by_key(|r| r.t_en),
    }
    pack_lanes(reads)
}

pub struct LocusFigure {
    pub rgn: Region,
    pub transcripts: Vec<Vec<Transcript>>,
    pub top: Vec<Vec<PslRecord>>,
    pub bottom: Vec<Vec<PslRecord>>,
    pub coverage: Vec<u32>,
    pub expanded: bool,
}

impl LocusFigure {
    /// Lay out transcripts (in their end-sorted order), the top reads by end
    /// and the bottom reads by start; coverage comes from the bottom reads.
    pub fn new(
        rgn: Region,
        transcripts: Vec<Transcript>,
        top: Vec<PslRecord>,
        bottom: Vec<PslRecord>,
        expanded: bool,
    ) -> LocusFigure {
        let coverage = read_coverage(&rgn, &bottom);
        let fig = LocusFigure {
            transcripts: pack_lanes(transcripts),
            top: stack_reads(top, ReadOrder::ByEnd),
            bottom: stack_reads(bottom, ReadOrder::ByStart),
            coverage,
            rgn,
            expanded,
        };
        log::info!(
            "{} transcript rows, {} top read rows, {} bottom read rows",
            fig.transcripts.len(),
            fig.top.len(),
            fig.bottom.len()
        );
        fig
    }

    fn x_range(&self) -> std::ops::Range<f64> {
        self.rgn.st as f64..self.rgn.en.max(self.rgn.st + 1) as f64
    }

    /// Clip a genomic interval to the window, or `None` if nothing is left.
    fn clip(&self, st: u64, en: u64) -> Option<(f64, f64)> {
        let st = st.clamp(self.rgn.st, self.rgn.en);
        let en = en.clamp(self.rgn.st, self.rgn.en);
        (en > st).then(|| (st as f64, en as f64))
    }

    fn draw_transcripts<DB>(&self, area: &DrawingArea<DB, Shift>, layout: &Layout) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let top = self.transcripts.len() as f64 + 1.0;
        let mut chart = ChartBuilder::on(area).build_cartesian_2d(self.x_range(), 0.0..top)?;

        let mut boxes = Vec::new();
        for (row, lane) in self.transcripts.iter().enumerate() {
            let y = row as f64;
            for tx in lane {
                if let Some((x0, x1)) = self.clip(tx.st, tx.en) {
                    let (off, h) = TRANSCRIPT_LINE;
                    boxes.push([(x0, y + off), (x1, y + off + h)]);
                }
                for block in &tx.blocks {
                    let h = match block.kind {
                        BlockKind::Cds => CDS_HEIGHT,
                        BlockKind::Exon => EXON_HEIGHT,
                    };
                    if let Some((x0, x1)) = self.clip(block.st, block.en()) {
                        boxes.push([(x0, y), (x1, y + h)]);
                    }
                }
            }
        }
        let edge = layout.line(0.25);
        chart.draw_series(boxes.iter().map(|b| Rectangle::new(*b, GREY.filled())))?;
        chart.draw_series(
            boxes
                .iter()
                .map(|b| Rectangle::new(*b, BLACK.stroke_width(edge))),
        )?;
        Ok(())
    }

    fn draw_reads<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        lanes: &[Vec<PslRecord>],
        color: RGBColor,
        pitch: f64,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let top = if pitch < 1.0 {
            (lanes.len().saturating_sub(1) as f64 * pitch + READ_BLOCK) * 1.1
        } else {
            lanes.len() as f64 + 1.0
        };
        let mut chart = ChartBuilder::on(area).build_cartesian_2d(self.x_range(), 0.0..top)?;

        let mut boxes = Vec::new();
        for (row, lane) in lanes.iter().enumerate() {
            let y = row as f64 * pitch;
            for read in lane {
                if let Some((x0, x1)) = self.clip(read.t_st, read.t_en) {
                    let (off, h) = READ_LINE;
                    boxes.push([(x0, y + off), (x1, y + off + h)]);
                }
                for &(st, width) in &read.blocks {
                    if let Some((x0, x1)) = self.clip(st, st.saturating_add(width)) {
                        boxes.push([(x0, y), (x1, y + READ_BLOCK)]);
                    }
                }
            }
        }
        chart.draw_series(boxes.into_iter().map(|b| Rectangle::new(b, color.filled())))?;
        Ok(())
    }

    /// Coverage bars hanging from the top edge of the panel.
    fn draw_coverage<DB>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let top = self.coverage.iter().max().copied().unwrap_or(0) as f64 + 1.0;
        let mut chart = ChartBuilder::on(area).build_cartesian_2d(self.x_range(), 0.0..top)?;

        // one bar per run of equal depth
        let mut bars = Vec::new();
        for (depth, run) in &self
            .coverage
            .iter()
            .enumerate()
            .group_by(|(_, depth)| **depth)
        {
            if depth == 0 {
                continue;
            }
            let offsets: Vec<usize> = run.map(|(i, _)| i).collect();
            let x0 = self.rgn.st as f64 + offsets[0] as f64;
            let x1 = self.rgn.st as f64 + *offsets.last().unwrap_or(&offsets[0]) as f64 + 1.0;
            bars.push([(x0, top), (x1, top - depth as f64)]);
        }
        chart.draw_series(bars.into_iter().map(|b| Rectangle::new(b, IBLUE.filled())))?;
        Ok(())
    }
}

impl Figure for LocusFigure {
    fn inches(&self) -> (f64, f64) {
        (5.0, 6.0)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, layout: &Layout) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (w, h) = self.inches();
        let transcripts = layout.panel(root, [0.1 / w, 3.9 / h, 4.0 / w, 1.5 / h]);
        let top_reads = layout.panel(root, [0.1 / w, 2.2 / h, 4.0 / w, 1.5 / h]);
        let bottom_reads = layout.panel(root, [0.1 / w, 0.5 / h, 4.0 / w, 1.5 / h]);
        let coverage = layout.panel(root, [0.1 / w, 0.1 / h, 4.0 / w, 0.4 / h]);

        self.draw_transcripts(&transcripts, layout)?;
        self.draw_reads(&top_reads, &self.top, IORANGE, 1.0)?;
        let pitch = if self.expanded { 1.0 } else { CONDENSED_PITCH };
        self.draw_reads(&bottom_reads, &self.bottom, IBLUE, pitch)?;
        self.draw_coverage(&coverage)?;

        for panel in [&transcripts, &top_reads, &bottom_reads, &coverage] {
            figure::outline(panel, layout.line(0.5))?;
        }
        Ok(())
    }
}
