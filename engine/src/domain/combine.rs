//! Equipment id list combination

use rustc_hash::FxHashSet;

/// Intersect (`intersect = true`) or union id lists
///
/// No lists yields an empty result and a single list is returned as is.
/// Otherwise order follows the first list for intersections and first
/// appearance for unions, duplicates dropped.
pub fn combine_filter_results(mut lists: Vec<Vec<String>>, intersect: bool) -> Vec<String> {
    if lists.len() <= 1 {
        return lists.pop().unwrap_or_default();
    }
    let mut lists = lists.into_iter();
    let Some(first) = lists.next() else {
        return Vec::new();
    };

    if intersect {
        let others: Vec<FxHashSet<String>> = lists.map(|l| l.into_iter().collect()).collect();
        let mut seen = FxHashSet::default();
        first
            .into_iter()
            .filter(|id| others.iter().all(|o| o.contains(id)) && seen.insert(id.clone()))
            .collect()
    } else {
        let mut seen = FxHashSet::default();
        std::iter::once(first)
            .chain(lists)
            .flatten()
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }
}
