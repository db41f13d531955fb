use super::myio;
use super::region::Region;
use super::stack::Span;
use anyhow::{Context, Result};
use num_format::{Locale, ToFormattedString};
use std::fmt;
use std::io::BufRead;

/// Columns (0-based) of a PSL line that we read.
const T_NAME: usize = 13;
const T_START: usize = 15;
const T_END: usize = 16;
const BLOCK_SIZES: usize = 18;
const T_STARTS: usize = 20;
const MIN_COLUMNS: usize = 21;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    PslTooFewColumns { found: usize },
    PslParseInt { column: usize, value: String },
    PslBlockMismatch { sizes: usize, starts: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::PslTooFewColumns { found } => {
                write!(f, "PSL line has {} columns, need {}", found, MIN_COLUMNS)
            }
            Error::PslParseInt { column, value } => {
                write!(f, "PSL column {} is not an integer: {:?}", column + 1, value)
            }
            Error::PslBlockMismatch { sizes, starts } => write!(
                f,
                "PSL line has {} block sizes but {} block starts",
                sizes, starts
            ),
        }
    }
}

impl std::error::Error for Error {}

type PslResult<T> = Result<T, crate::psl::Error>;

/// An aligned read: its target span and gapped blocks on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PslRecord {
    pub t_name: String,
    pub t_st: u64,
    pub t_en: u64,
    /// (block start, block width) pairs on the target.
    pub blocks: Vec<(u64, u64)>,
}

fn parse_int(t: &[&str], column: usize) -> PslResult<u64> {
    t[column].trim().parse::<u64>().map_err(|_| Error::PslParseInt {
        column,
        value: t[column].to_string(),
    })
}

/// Parse a comma terminated list such as "20,35,12,".
fn parse_list(t: &[&str], column: usize) -> PslResult<Vec<u64>> {
    t[column]
        .trim()
        .trim_end_matches(',')
        .split(',')
        .map(|v| {
            v.trim().parse::<u64>().map_err(|_| Error::PslParseInt {
                column,
                value: t[column].to_string(),
            })
        })
        .collect()
}

impl PslRecord {
    /// # Example
    /// ```
    /// use rustyplot::psl;
    /// let line = "90\t0\t0\t0\t0\t0\t1\t500\t+\tread1\t100\t0\t100\tchr7\t159345973\t1000\t1600\t2\t40,50,\t0,40,\t1000,1550,";
    /// let rec = psl::PslRecord::new(line).unwrap();
    /// assert_eq!(rec.t_name, "chr7");
    /// assert_eq!(rec.blocks, vec![(1000, 40), (1550, 50)]);
    /// assert!(psl::PslRecord::new("psLayout version 3").is_err());
    /// ```
    pub fn new(line: &str) -> PslResult<PslRecord> {
        let t: Vec<&str> = line.trim_end_matches(&['\r', '\n'][..]).split('\t').collect();
        if t.len() < MIN_COLUMNS {
            return Err(Error::PslTooFewColumns { found: t.len() });
        }
        let sizes = parse_list(&t, BLOCK_SIZES)?;
        let starts = parse_list(&t, T_STARTS)?;
        if sizes.len() != starts.len() {
            return Err(Error::PslBlockMismatch {
                sizes: sizes.len(),
                starts: starts.len(),
            });
        }
        Ok(PslRecord {
            t_name: t[T_NAME].to_string(),
            t_st: parse_int(&t, T_START)?,
            t_en: parse_int(&t, T_END)?,
            blocks: starts.into_iter().zip(sizes).collect(),
        })
    }

    /// True when either end of the alignment falls strictly inside the region.
    pub fn overlaps(&self, rgn: &Region) -> bool {
        self.t_name == rgn.name && (rgn.strictly_contains(self.t_st) || rgn.strictly_contains(self.t_en))
    }
}

impl Span for PslRecord {
    fn start(&self) -> u64 {
        self.t_st
    }
    fn end(&self) -> u64 {
        self.t_en
    }
}

impl fmt::Display for PslRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}-{} ({} blocks)",
            self.t_name,
            self.t_st,
            self.t_en,
            self.blocks.len()
        )
    }
}

#[derive(Debug, Default)]
pub struct Psl {
    pub records: Vec<PslRecord>,
}

impl Psl {
    /// Read the alignments of a PSL file that overlap `rgn`.
    /// Lines that are not complete alignments (headers, truncated rows,
    /// unparsable numbers) are skipped.
    /// # Example
    /// ```
    /// use rustyplot::psl::Psl;
    /// use rustyplot::region::parse_region;
    /// let rgn = parse_region("chr7:45232000-45241000").unwrap();
    /// let psl = Psl::from_file(".test/reads_top.psl", &rgn).unwrap();
    /// assert_eq!(psl.records.len(), 6);
    /// ```
    pub fn from_file(file_name: &str, rgn: &Region) -> Result<Psl> {
        let mut psl = Psl::default();
        let mut skipped = 0_usize;
        for (index, line) in myio::reader(file_name)?.lines().enumerate() {
            let line = line.with_context(|| format!("error reading {}", file_name))?;
            match PslRecord::new(&line) {
                Ok(rec) => {
                    if rec.overlaps(rgn) {
                        psl.records.push(rec);
                    }
                }
                Err(e) => {
                    log::debug!("Skipping PSL line {}: {}", index + 1, e);
                    skipped += 1;
                }
            }
        }
        log::info!(
            "{} alignments overlap {} in {} ({} lines skipped)",
            psl.records.len().to_formatted_string(&Locale::en),
            rgn,
            file_name,
            skipped.to_formatted_string(&Locale::en)
        );
        Ok(psl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::parse_region;

    fn psl_line(chrom: &str, st: u64, en: u64, sizes: &str, starts: &str) -> String {
        format!(
            "100\t0\t0\t0\t0\t0\t0\t0\t+\tq\t100\t0\t100\t{}\t1000000\t{}\t{}\t1\t{}\t0,\t{}",
            chrom, st, en, sizes, starts
        )
    }

    #[test]
    fn short_rows_are_rejected_not_fatal() {
        let err = PslRecord::new("a\tb\tc").unwrap_err();
        assert_eq!(err, Error::PslTooFewColumns { found: 3 });
    }

    #[test]
    fn bad_block_lists_are_rejected() {
        let line = psl_line("chr1", 10, 20, "5,x,", "10,15,");
        assert!(matches!(
            PslRecord::new(&line),
            Err(Error::PslParseInt { column: 18, .. })
        ));
        let line = psl_line("chr1", 10, 20, "5,5,", "10,");
        assert!(matches!(
            PslRecord::new(&line),
            Err(Error::PslBlockMismatch { .. })
        ));
    }

    #[test]
    fn overlap_needs_an_endpoint_strictly_inside() {
        let rgn = parse_region("chr1:100-200").unwrap();
        let inside = PslRecord::new(&psl_line("chr1", 150, 180, "30,", "150,")).unwrap();
        let left = PslRecord::new(&psl_line("chr1", 50, 150, "100,", "50,")).unwrap();
        let touching = PslRecord::new(&psl_line("chr1", 50, 100, "50,", "50,")).unwrap();
        let spanning = PslRecord::new(&psl_line("chr1", 50, 250, "200,", "50,")).unwrap();
        let other = PslRecord::new(&psl_line("chr2", 150, 180, "30,", "150,")).unwrap();
        assert!(inside.overlaps(&rgn));
        assert!(left.overlaps(&rgn));
        assert!(!touching.overlaps(&rgn));
        assert!(!spanning.overlaps(&rgn));
        assert!(!other.overlaps(&rgn));
    }

    #[test]
    fn reads_fixture_and_skips_junk() {
        let rgn = parse_region("chr7:45232000-45241000").unwrap();
        let psl = Psl::from_file(".test/reads_bottom.psl", &rgn).unwrap();
        assert_eq!(psl.records.len(), 8);
        for rec in &psl.records {
            assert!(rec.overlaps(&rgn));
            assert!(!rec.blocks.is_empty());
        }
    }
}
