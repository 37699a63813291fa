use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Ranking order: higher count first, then lexicographically smaller token.
pub fn rank_order(a: &(String, u64), b: &(String, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

// Orders so that the better-ranked entry compares greater.
#[derive(PartialEq, Eq)]
struct Ranked((String, u64));

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(&other.0, &self.0)
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keeps the `k` best `(token, count)` pairs using a bounded min-heap, returned best first.
pub fn select_top_k<I>(counts: I, k: usize) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = (String, u64)>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(k + 1);
    for entry in counts {
        heap.push(Reverse(Ranked(entry)));
        if heap.len() > k {
            heap.pop();
        }
    }
    // Ascending order of Reverse is best-first.
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(Ranked(entry))| entry)
        .collect()
}
