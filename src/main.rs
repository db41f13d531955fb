use anyhow::Result;
use colored::Colorize;
use env_logger::{Builder, Target};
use log::LevelFilter;
use rustyplot::cli::Commands;
use rustyplot::figure::save;
use rustyplot::*;
use std::time::Instant;

fn main() -> Result<()> {
    parse_cli()
}

pub fn parse_cli() -> Result<()> {
    let pg_start = Instant::now();
    let args = cli::make_cli_parse();

    // set the logging level
    let min_log_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::new()
        .target(Target::Stderr)
        .filter(None, min_log_level)
        .init();

    log::debug!("DEBUG logging enabled");
    log::trace!("TRACE logging enabled");

    // set up number of threads to use globally
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()?;

    let subcommand = match &args.command {
        //
        // Run Locus
        //
        Some(Commands::Locus {
            top_psl,
            bottom_psl,
            gtf,
            coordinates,
            output,
            expanded,
        }) => {
            let rgn = region::parse_region(coordinates)?;
            let transcripts = gtf::read_transcripts(gtf, &rgn)?;
            let top = psl::Psl::from_file(top_psl, &rgn)?;
            let bottom = psl::Psl::from_file(bottom_psl, &rgn)?;
            let fig = locus::LocusFigure::new(rgn, transcripts, top.records, bottom.records, *expanded);
            save(&fig, output, args.dpi)?;
            "locus"
        }
        //
        // Run Logo
        //
        Some(Commands::Logo {
            splice,
            output,
            a_image,
            t_image,
            g_image,
            c_image,
        }) => {
            let sites = logo::SpliceSites::from_file(splice)?;
            let glyphs = logo::load_glyphs([a_image, t_image, g_image, c_image])?;
            let fig = logo::LogoFigure::new(&sites, glyphs)?;
            save(&fig, output, args.dpi)?;
            "logo"
        }
        //
        // Run Heatmap
        //
        Some(Commands::Heatmap {
            expression,
            phase,
            genes,
            output,
            factor,
            id_column,
            label_column,
        }) => {
            let expr = heatmap::Expression::from_file(expression, id_column, label_column)?;
            let phases = heatmap::read_phases(phase)?;
            let genes: Vec<String> = genes
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(String::from)
                .collect();
            let fig = heatmap::HeatmapFigure::new(&expr, &phases, &genes, *factor)?;
            save(&fig, output, args.dpi)?;
            "heatmap"
        }
        //
        // Run Cells
        //
        Some(Commands::Cells {
            position,
            celltype,
            output,
        }) => {
            let positions = cells::read_positions(position)?;
            let types = cells::read_celltypes(celltype)?;
            let fig = cells::CellsFigure::new(cells::merge(positions, &types))?;
            save(&fig, output, args.dpi)?;
            "cells"
        }
        //
        // Run Scatter
        //
        Some(Commands::Scatter {
            input,
            output,
            bins,
        }) => {
            let (xs, ys) = scatter::read_pairs(input)?;
            let fig = scatter::ScatterFigure::new(xs, ys, *bins)?;
            save(&fig, output, args.dpi)?;
            "scatter"
        }
        //
        // Run Swatch
        //
        Some(Commands::Swatch { output }) => {
            save(&swatch::SwatchFigure, output, args.dpi)?;
            "swatch"
        }
        //
        // no command opt
        //
        None => "rustyplot",
    };

    let duration = pg_start.elapsed();
    log::info!(
        "{} done! Time elapsed: {}",
        subcommand.bright_green().bold(),
        format!("{:.2?}", duration).bright_yellow().bold()
    );
    Ok(())
}
