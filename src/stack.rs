/// Anything with a start and an end that can be placed in a display row.
pub trait Span {
    fn start(&self) -> u64;
    fn end(&self) -> u64;
}

impl Span for (u64, u64) {
    fn start(&self) -> u64 {
        self.0
    }
    fn end(&self) -> u64 {
        self.1
    }
}

impl<T: Span> Span for &T {
    fn start(&self) -> u64 {
        (*self).start()
    }
    fn end(&self) -> u64 {
        (*self).end()
    }
}

/// Pack intervals into display rows (lanes) with a single first-fit pass.
///
/// Intervals are taken in the order given, so the caller picks the sort key.
/// An interval joins the first lane whose most recent member ends strictly
/// before it starts; otherwise it opens a new lane.
/// # Example
/// ```
/// use rustyplot::stack::pack_lanes;
/// let reads: Vec<(u64, u64)> = vec![(0, 10), (5, 15), (11, 20), (16, 30)];
/// let lanes = pack_lanes(reads);
/// assert_eq!(lanes, vec![vec![(0, 10), (11, 20)], vec![(5, 15), (16, 30)]]);
/// ```
pub fn pack_lanes<T, I>(items: I) -> Vec<Vec<T>>
where
    T: Span,
    I: IntoIterator<Item = T>,
{
    let mut lanes: Vec<Vec<T>> = Vec::new();
    for item in items {
        let slot = lanes.iter().position(|lane| match lane.last() {
            Some(last) => item.start() > last.end(),
            None => true,
        });
        match slot {
            Some(idx) => lanes[idx].push(item),
            None => lanes.push(vec![item]),
        }
    }
    log::debug!("Packed intervals into {} lanes", lanes.len());
    lanes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_no_overlaps(lanes: &[Vec<(u64, u64)>]) {
        for lane in lanes {
            for pair in lane.windows(2) {
                assert!(pair[1].start() > pair[0].end(), "{:?}", pair);
            }
        }
    }

    #[test]
    fn disjoint_sorted_input_uses_one_lane() {
        let items: Vec<(u64, u64)> = (0..10).map(|i| (i * 10, i * 10 + 5)).collect();
        let lanes = pack_lanes(items.clone());
        assert_eq!(lanes.len(), 1);
        assert_eq!(lanes[0], items);
    }

    #[test]
    fn nested_input_uses_one_lane_each() {
        let items: Vec<(u64, u64)> = vec![(0, 100), (10, 90), (20, 80), (30, 70)];
        let lanes = pack_lanes(items);
        assert_eq!(lanes.len(), 4);
        assert_no_overlaps(&lanes);
    }

    #[test]
    fn touching_intervals_do_not_share_a_lane() {
        let items: Vec<(u64, u64)> = vec![(0, 10), (10, 20), (11, 30)];
        let lanes = pack_lanes(items);
        assert_eq!(lanes, vec![vec![(0, 10), (11, 30)], vec![(10, 20)]]);
    }

    #[test]
    fn first_fit_prefers_earlier_lanes() {
        let mut items: Vec<(u64, u64)> = vec![(0, 5), (1, 3), (4, 8), (6, 9), (10, 12), (2, 40)];
        items.sort_by_key(|i| i.start());
        let lanes = pack_lanes(items);
        assert_no_overlaps(&lanes);
        assert_eq!(lanes[0], vec![(0, 5), (6, 9), (10, 12)]);
        assert_eq!(lanes[1], vec![(1, 3), (4, 8)]);
        assert_eq!(lanes[2], vec![(2, 40)]);
    }

    #[test]
    fn packs_references() {
        let items = vec![(0u64, 10u64), (20, 30)];
        let lanes = pack_lanes(items.iter());
        assert_eq!(lanes.len(), 1);
        assert_eq!(*lanes[0][1], (20, 30));
    }

    #[test]
    fn empty_input() {
        let lanes = pack_lanes(Vec::<(u64, u64)>::new());
        assert!(lanes.is_empty());
    }
}
