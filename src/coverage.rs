use super::psl::PslRecord;
use super::region::Region;

/// Per-base depth of the read blocks over `[rgn.st, rgn.en)`.
/// Blocks are clipped to the window, so bases outside it are never counted.
/// # Example
/// ```
/// use rustyplot::coverage::block_coverage;
/// use rustyplot::region::parse_region;
/// let rgn = parse_region("chr1:0-20").unwrap();
/// let cov = block_coverage(&rgn, vec![(10, 5)]);
/// assert_eq!(&cov[9..16], &[0, 1, 1, 1, 1, 1, 0]);
/// ```
pub fn block_coverage<I>(rgn: &Region, blocks: I) -> Vec<u32>
where
    I: IntoIterator<Item = (u64, u64)>,
{
    let mut counts = vec![0_u32; rgn.len() as usize];
    for (st, width) in blocks {
        let st_clip = st.max(rgn.st);
        let en_clip = st.saturating_add(width).min(rgn.en);
        if st_clip >= en_clip {
            continue;
        }
        for count in &mut counts[(st_clip - rgn.st) as usize..(en_clip - rgn.st) as usize] {
            *count += 1;
        }
    }
    counts
}

/// Coverage of every block of every read.
pub fn read_coverage(rgn: &Region, reads: &[PslRecord]) -> Vec<u32> {
    block_coverage(
        rgn,
        reads.iter().flat_map(|rec| rec.blocks.iter().copied()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::parse_region;

    #[test]
    fn single_block_inside_window() {
        let rgn = parse_region("chr1:0-20").unwrap();
        let cov = block_coverage(&rgn, vec![(10, 5)]);
        let expected: Vec<u32> = (0..20).map(|i| if (10..15).contains(&i) { 1 } else { 0 }).collect();
        assert_eq!(cov, expected);
    }

    #[test]
    fn blocks_are_clipped_to_window() {
        let rgn = parse_region("chr1:100-110").unwrap();
        let cov = block_coverage(&rgn, vec![(95, 7), (108, 10), (50, 10), (200, 5)]);
        assert_eq!(cov, vec![1, 1, 0, 0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn block_end_past_u64_is_clipped() {
        let rgn = parse_region("chr1:0-10").unwrap();
        assert_eq!(block_coverage(&rgn, vec![(u64::MAX - 2, 10)]), vec![0; 10]);
    }

    #[test]
    fn overlapping_reads_stack() {
        let rgn = parse_region("chr1:0-10").unwrap();
        let reads = vec![
            PslRecord {
                t_name: "chr1".to_string(),
                t_st: 0,
                t_en: 8,
                blocks: vec![(0, 4), (6, 2)],
            },
            PslRecord {
                t_name: "chr1".to_string(),
                t_st: 2,
                t_en: 10,
                blocks: vec![(2, 8)],
            },
        ];
        let cov = read_coverage(&rgn, &reads);
        assert_eq!(cov, vec![1, 1, 2, 2, 1, 1, 2, 2, 1, 1]);
        assert_eq!(cov.iter().max(), Some(&2));
    }
}
