use super::myio;
use super::region::Region;
use super::stack::Span;
use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use num_format::{Locale, ToFormattedString};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;

lazy_static! {
    static ref TRANSCRIPT_ID_RE: Regex = Regex::new(r#"transcript_id "([^"]*)""#).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Exon,
    Cds,
}

impl BlockKind {
    fn from_feature(feature: &str) -> Option<BlockKind> {
        match feature {
            "exon" => Some(BlockKind::Exon),
            "CDS" => Some(BlockKind::Cds),
            _ => None,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BlockKind::Exon => write!(f, "exon"),
            BlockKind::Cds => write!(f, "CDS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub st: u64,
    pub width: u64,
    pub kind: BlockKind,
}

impl Block {
    pub fn en(&self) -> u64 {
        self.st + self.width
    }
}

/// One transcript: the exon and CDS records that share a transcript_id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub id: String,
    pub chrom: String,
    pub st: u64,
    pub en: u64,
    pub blocks: Vec<Block>,
}

impl Transcript {
    fn new(id: &str, chrom: &str) -> Transcript {
        Transcript {
            id: id.to_string(),
            chrom: chrom.to_string(),
            st: u64::MAX,
            en: 0,
            blocks: Vec::new(),
        }
    }

    fn add_block(&mut self, st: u64, en: u64, kind: BlockKind) {
        self.st = self.st.min(st);
        self.en = self.en.max(en);
        self.blocks.push(Block {
            st,
            width: en - st,
            kind,
        });
    }
}

impl Span for Transcript {
    fn start(&self) -> u64 {
        self.st
    }
    fn end(&self) -> u64 {
        self.en
    }
}

/// A single exon/CDS line of a GTF that passed the region filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtfRecord {
    pub chrom: String,
    pub st: u64,
    pub en: u64,
    pub kind: BlockKind,
    pub transcript_id: String,
}

/// Parse one GTF line, returning `None` when the record is a comment,
/// another chromosome, outside the region, or not an exon/CDS.
/// # Example
/// ```
/// use rustyplot::gtf::*;
/// use rustyplot::region::parse_region;
/// let rgn = parse_region("chr7:100-500").unwrap();
/// let line = "chr7\tHAVANA\texon\t120\t180\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";";
/// let rec = parse_gtf_line(line, &rgn).unwrap().unwrap();
/// assert_eq!(rec.transcript_id, "t1");
/// assert_eq!((rec.st, rec.en), (120, 180));
/// assert!(parse_gtf_line("#!genome-build", &rgn).unwrap().is_none());
/// ```
pub fn parse_gtf_line(line: &str, rgn: &Region) -> Result<Option<GtfRecord>> {
    if line.starts_with('#') || line.trim().is_empty() {
        return Ok(None);
    }
    let t: Vec<&str> = line.trim_end().split('\t').collect();
    if t[0] != rgn.name {
        return Ok(None);
    }
    if t.len() < 9 {
        bail!("GTF line has {} columns, expected 9", t.len());
    }
    let kind = match BlockKind::from_feature(t[2]) {
        Some(kind) => kind,
        None => return Ok(None),
    };
    let st = t[3]
        .parse::<u64>()
        .with_context(|| format!("invalid GTF start: {}", t[3]))?;
    let en = t[4]
        .parse::<u64>()
        .with_context(|| format!("invalid GTF end: {}", t[4]))?;
    if st < rgn.st || en > rgn.en {
        return Ok(None);
    }
    let transcript_id = TRANSCRIPT_ID_RE
        .captures(t[8])
        .map(|caps| caps[1].to_string())
        .with_context(|| format!("no transcript_id in: {}", t[8]))?;

    Ok(Some(GtfRecord {
        chrom: t[0].to_string(),
        st,
        en: en.max(st),
        kind,
        transcript_id,
    }))
}

/// Group filtered records into transcripts, keeping first-seen order and then
/// sorting by transcript end.
pub fn group_transcripts<I>(records: I) -> Vec<Transcript>
where
    I: IntoIterator<Item = GtfRecord>,
{
    let mut transcripts: Vec<Transcript> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for rec in records {
        let idx = *index.entry(rec.transcript_id.clone()).or_insert_with(|| {
            transcripts.push(Transcript::new(&rec.transcript_id, &rec.chrom));
            transcripts.len() - 1
        });
        transcripts[idx].add_block(rec.st, rec.en, rec.kind);
    }
    transcripts.sort_by_key(|tx| tx.en);
    transcripts
}

/// Read the transcripts of a GTF file that fall within `rgn`.
/// # Example
/// ```
/// use rustyplot::gtf::read_transcripts;
/// use rustyplot::region::parse_region;
/// let rgn = parse_region("chr7:45232000-45241000").unwrap();
/// let txs = read_transcripts(".test/locus.gtf", &rgn).unwrap();
/// assert_eq!(txs.len(), 3);
/// ```
pub fn read_transcripts(filename: &str, rgn: &Region) -> Result<Vec<Transcript>> {
    let mut records = Vec::new();
    for (idx, line) in myio::reader(filename)?.lines().enumerate() {
        let line = line.with_context(|| format!("error reading {}", filename))?;
        let rec = parse_gtf_line(&line, rgn)
            .with_context(|| format!("Unable to parse GTF line {} of {}", idx + 1, filename))?;
        if let Some(rec) = rec {
            records.push(rec);
        }
    }
    log::info!(
        "{} exon/CDS records of {} in {}",
        records.len().to_formatted_string(&Locale::en),
        filename,
        rgn
    );
    let transcripts = group_transcripts(records);
    log::info!("{} transcripts in {}", transcripts.len(), rgn);
    Ok(transcripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::parse_region;
    use std::io::BufRead;

    fn gtf_line(chrom: &str, feature: &str, st: u64, en: u64, tx: &str) -> String {
        format!(
            "{}\tENSEMBL\t{}\t{}\t{}\t.\t+\t.\tgene_id \"g\"; transcript_id \"{}\"; level 2;",
            chrom, feature, st, en, tx
        )
    }

    #[test]
    fn filters_chromosome_range_and_feature() {
        let rgn = parse_region("chr1:100-1000").unwrap();
        let keep = gtf_line("chr1", "exon", 100, 200, "a");
        let other_chrom = gtf_line("chr2", "exon", 100, 200, "a");
        let before = gtf_line("chr1", "exon", 99, 200, "a");
        let after = gtf_line("chr1", "CDS", 900, 1001, "a");
        let gene = gtf_line("chr1", "gene", 100, 1000, "a");
        assert!(parse_gtf_line(&keep, &rgn).unwrap().is_some());
        assert!(parse_gtf_line(&other_chrom, &rgn).unwrap().is_none());
        assert!(parse_gtf_line(&before, &rgn).unwrap().is_none());
        assert!(parse_gtf_line(&after, &rgn).unwrap().is_none());
        assert!(parse_gtf_line(&gene, &rgn).unwrap().is_none());
    }

    #[test]
    fn kept_line_without_transcript_id_is_an_error() {
        let rgn = parse_region("chr1:100-1000").unwrap();
        let line = "chr1\tX\texon\t150\t200\t.\t+\t.\tgene_id \"g\";";
        assert!(parse_gtf_line(line, &rgn).is_err());
        assert!(parse_gtf_line("chr1\texon\t150", &rgn).is_err());
    }

    #[test]
    fn transcript_span_matches_blocks() {
        let rgn = parse_region("chr1:0-10000").unwrap();
        let lines = vec![
            gtf_line("chr1", "exon", 500, 600, "b"),
            gtf_line("chr1", "exon", 100, 200, "a"),
            gtf_line("chr1", "CDS", 150, 200, "a"),
            gtf_line("chr1", "exon", 900, 1000, "a"),
            gtf_line("chr1", "exon", 300, 400, "b"),
        ];
        let records = lines
            .iter()
            .filter_map(|l| parse_gtf_line(l, &rgn).unwrap())
            .collect::<Vec<_>>();
        let txs = group_transcripts(records);
        assert_eq!(txs.len(), 2);
        // sorted by end
        assert_eq!(txs[0].id, "b");
        assert_eq!(txs[1].id, "a");
        for tx in &txs {
            let min = tx.blocks.iter().map(|b| b.st).min().unwrap();
            let max = tx.blocks.iter().map(|b| b.en()).max().unwrap();
            assert_eq!((tx.st, tx.en), (min, max));
        }
        assert_eq!(txs[1].blocks[1].kind, BlockKind::Cds);
        assert_eq!(txs[1].blocks[1].width, 50);
    }

    #[test]
    fn reads_fixture() {
        let rgn = parse_region("chr7:45232000-45241000").unwrap();
        let txs = read_transcripts(".test/locus.gtf", &rgn).unwrap();
        assert_eq!(txs.len(), 3);
        assert!(txs.windows(2).all(|w| w[0].en <= w[1].en));
        for tx in &txs {
            assert_eq!(tx.chrom, "chr7");
            assert!(tx.st >= rgn.st && tx.en <= rgn.en);
        }
        // the fixture also has a transcript on chr8 and one spilling past the window
        let all = myio::reader(".test/locus.gtf").unwrap().lines().count();
        assert!(all > txs.iter().map(|t| t.blocks.len()).sum::<usize>());
    }
}
