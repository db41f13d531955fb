//! # Command line interface for rustyplot
//! [rustyplot command line interface, subcommands, and options.](cli::Commands)
//! # README for rustyplot
#![doc = include_str!("../README.md")]
/// Single cell positions coloured by type and by local density.
pub mod cells;
/// Command line interface for rustyplot.
pub mod cli;
/// Per base read depth over a genomic window.
pub mod coverage;
/// Figure trait, panel layout, colour maps and drawing helpers shared by every plot.
pub mod figure;
/// Exon and CDS blocks of transcripts from GTF files.
pub mod gtf;
/// Phase ordered expression heatmap.
pub mod heatmap;
/// Genome browser style view of transcripts, reads and coverage.
pub mod locus;
/// Splice site sequence logos.
pub mod logo;
/// Module for automatically reading compressed or uncompressed files.
pub mod myio;
/// PSL alignment parsing.
pub mod psl;
/// Genomic regions such as `chr1:100-200`.
pub mod region;
/// Log scaled scatter plot with marginal histograms.
pub mod scatter;
/// Greedy packing of intervals into display rows.
pub mod stack;
/// Colour swatch figure.
pub mod swatch;
