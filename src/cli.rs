use clap::{AppSettings, CommandFactory, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    propagate_version = true,
    subcommand_required = true,
    infer_subcommands = true,
    arg_required_else_help = true,
    help_expected = true
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
pub struct Cli {
    /// Threads for the density calculation.
    #[clap(short, long, default_value_t = 8)]
    pub threads: usize,

    /// Resolution of raster output in dots per inch. Figure sizes are fixed in inches.
    #[clap(long, default_value_t = 300)]
    pub dpi: u32,

    /// Logging level [-v: Info, -vv: Debug, -vvv: Trace].
    #[clap(short, long, parse(from_occurrences), help_heading = "DEBUG")]
    pub verbose: usize,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

///
/// This structure contains all the subcommands for rustyplot and their help descriptions.
///
/// Every subcommand writes a single figure. The output format follows the
/// extension of the output path: `.svg` writes an SVG, anything else is
/// encoded as a raster image (png, jpg, bmp).
///
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Genome-browser style view of a locus.
    ///
    /// Draws four stacked panels: GTF transcripts, reads from the top PSL packed into rows
    /// after sorting by end, reads from the bottom PSL packed after sorting by start,
    /// and the per-base coverage of the bottom PSL drawn hanging downward.
    #[clap(visible_aliases = &["browser", "lv"])]
    Locus {
        /// PSL alignments for the second panel (rows packed by read end).
        #[clap(long)]
        top_psl: String,
        /// PSL alignments for the third panel and the coverage histogram (rows packed by read start).
        #[clap(long)]
        bottom_psl: String,
        /// GTF annotation with exon and CDS records carrying a transcript_id attribute.
        #[clap(short, long)]
        gtf: String,
        /// Region to draw, e.g. "chr7:45232945-45240000".
        #[clap(short, long)]
        coordinates: String,
        /// Output figure.
        #[clap(short, long)]
        output: String,
        /// Give every row of the bottom read panel full height instead of condensing it.
        #[clap(short, long)]
        expanded: bool,
    },
    /// Sequence logos for 5' and 3' splice sites.
    ///
    /// Headers containing `5'` start a 5' splice site record, every other header a 3' record.
    /// Each position shows the three most frequent bases scaled by information content.
    #[clap(visible_aliases = &["sl"])]
    Logo {
        /// FASTA-like file of 20 bp splice site sequences.
        #[clap(short, long)]
        splice: String,
        /// Output figure.
        #[clap(short, long)]
        output: String,
        /// Glyph image for A.
        #[clap(short = 'A', long)]
        a_image: Option<String>,
        /// Glyph image for T.
        #[clap(short = 'T', long)]
        t_image: Option<String>,
        /// Glyph image for G.
        #[clap(short = 'G', long)]
        g_image: Option<String>,
        /// Glyph image for C.
        #[clap(short = 'C', long)]
        c_image: Option<String>,
    },
    /// Heatmap of circadian expression with genes ordered by peak phase.
    #[clap(visible_aliases = &["hm"])]
    Heatmap {
        /// Expression table with a header; columns containing `FPKM_CT` are plotted.
        #[clap(short, long)]
        expression: String,
        /// Phase table with a header; first column is the gene id.
        #[clap(short, long)]
        phase: String,
        /// Comma separated list of genes to mark on the y axis.
        #[clap(short, long, default_value = "")]
        genes: String,
        /// Output figure.
        #[clap(short, long, default_value = "expression_heatmap.png")]
        output: String,
        /// Number of interpolated rows drawn per gene.
        #[clap(short, long, default_value_t = 5)]
        factor: usize,
        /// Column of the expression table holding the gene id.
        #[clap(long, default_value = "Ensembl_ID")]
        id_column: String,
        /// Optional column of the expression table with gene names that `--genes` may match.
        #[clap(long, default_value = "Gene_name")]
        label_column: String,
    },
    /// Single cell positions colored by cell type and by local density.
    #[clap(visible_aliases = &["sc", "tsne"])]
    Cells {
        /// Whitespace separated `barcode x y` table without a header.
        #[clap(short, long)]
        position: String,
        /// Whitespace separated table with a header; column 2 is the cell type and column 3 the barcode.
        #[clap(short, long)]
        celltype: String,
        /// Output figure.
        #[clap(short, long)]
        output: String,
    },
    /// Scatter of two log2 transformed expression columns with marginal histograms.
    Scatter {
        /// Whitespace separated table with a header; columns 2 and 3 are plotted.
        #[clap(short, long)]
        input: String,
        /// Output figure.
        #[clap(short, long)]
        output: String,
        /// Number of histogram bins.
        #[clap(short, long, default_value_t = 50)]
        bins: usize,
    },
    /// Decorative figure of colored circles and two color gradients.
    Swatch {
        /// Output figure.
        #[clap(short, long)]
        output: String,
    },
}

pub fn make_cli_parse() -> Cli {
    Cli::parse()
}

pub fn make_cli_app() -> clap::Command<'static> {
    Cli::command()
}
