//! Rank, narrow, truncate.
//!
//! Independent of how scores were produced: any strategy that yields one
//! score per index row can reuse [`select`].

/// Row indices by score descending, ties broken by ascending row (= paragraph id).
pub fn rank(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_unstable_by(|&a, &b| scores[b].total_cmp(&scores[a]).then_with(|| a.cmp(&b)));
    order
}

/// Rank all rows, then keep the `allowed` rows, then take `top_k`.
///
/// `allowed` is a row-ordered subset such as [`CorpusIndex::filter_by_document_ids`]
/// returns; `None` keeps every row. The filter runs after the global ranking and
/// before truncation, so `top_k` counts surviving rows only.
///
/// [`CorpusIndex::filter_by_document_ids`]: crate::index::CorpusIndex::filter_by_document_ids
pub fn select(scores: &[f64], allowed: Option<&[usize]>, top_k: usize) -> Vec<usize> {
    debug_assert!(allowed.map_or(true, |rows| rows.windows(2).all(|w| w[0] < w[1])));
    rank(scores)
        .into_iter()
        .filter(|row| allowed.map_or(true, |rows| rows.binary_search(row).is_ok()))
        .take(top_k)
        .collect()
}
