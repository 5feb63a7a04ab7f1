//! Order statistics by selection.
//!
//! Every function here partially reorders its input with
//! `select_nth_unstable_by` (introselect, expected O(n)) instead of sorting.
//! NaN sorts above every number under `f64::total_cmp`.

/// Sample quantile at probability `p`, interpolating linearly between the
/// two nearest order statistics (Hyndman–Fan type 7).
///
/// The slice is left partially reordered.
///
/// # Panics
///
/// Panics if `data` is empty or if `p` is outside [0, 1].
pub fn compute_quantile(data: &mut [f64], p: f64) -> f64 {
    assert!(!data.is_empty(), "Cannot compute quantile of empty slice");
    assert!((0.0..=1.0).contains(&p), "Quantile probability must be in [0, 1]");

    let position = (data.len() - 1) as f64 * p;
    let rank = position.floor() as usize;
    let weight = position - rank as f64;

    let (_, &mut below, above) = data.select_nth_unstable_by(rank, |a, b| a.total_cmp(b));
    if weight == 0.0 {
        return below;
    }
    // Everything right of `rank` is >= `below`; its minimum is rank + 1.
    match above.iter().copied().min_by(|a, b| a.total_cmp(b)) {
        Some(next) => below + weight * (next - below),
        None => below,
    }
}

/// Median of a mutable slice (mean of the two middle values for even length).
///
/// # Panics
///
/// Panics if `data` is empty.
pub fn median(data: &mut [f64]) -> f64 {
    compute_quantile(data, 0.5)
}

/// The k-th smallest element (0-based) of a mutable slice.
///
/// # Panics
///
/// Panics if `k >= data.len()`.
pub fn order_statistic(data: &mut [f64], k: usize) -> f64 {
    assert!(k < data.len(), "order statistic index out of range");
    let (_, &mut value, _) = data.select_nth_unstable_by(k, |a, b| a.total_cmp(b));
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_quantile_median() {
        let mut data = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(compute_quantile(&mut data, 0.5), 3.0);
    }

    #[test]
    fn test_compute_quantile_extremes() {
        let mut data = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(compute_quantile(&mut data, 0.0), 1.0);
        assert_eq!(compute_quantile(&mut data, 1.0), 5.0);
    }

    #[test]
    fn test_even_median_interpolates() {
        let mut data = vec![4.0, 1.0, 3.0, 2.0];
        assert!((median(&mut data) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_order_statistic() {
        let mut data = vec![9.0, 7.0, 8.0, 1.0];
        assert_eq!(order_statistic(&mut data, 0), 1.0);
        assert_eq!(order_statistic(&mut data, 3), 9.0);
    }

    #[test]
    #[should_panic(expected = "Cannot compute quantile of empty slice")]
    fn test_empty_slice_panics() {
        let mut data: Vec<f64> = vec![];
        compute_quantile(&mut data, 0.5);
    }
}
