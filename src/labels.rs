//! Conversions between dense vectors and sparse class-index labels.
//!
//! Grounded on `leaf::solver::confusion_matrix::ConfusionMatrix::get_predictions`,
//! which argmaxes a chunk of `num_classes` floats per sample; generalized
//! here into the four standalone conversions the Flower's training loop and
//! a caller's evaluation code both need.

/// Index of the largest element in `v`. Ties resolve to the first (lowest
/// index) maximum, matching a left-to-right scan.
pub fn argmax(v: &[f32]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate().skip(1) {
        if x > v[best] {
            best = i;
        }
    }
    best
}

/// Indices of every element of `v` that is `>= threshold`.
pub fn threshold_indices(v: &[f32], threshold: f32) -> Vec<usize> {
    v.iter().enumerate().filter(|&(_, &x)| x >= threshold).map(|(i, _)| i).collect()
}

/// A one-hot vector of `length` elements with a `1.0` at `index`.
pub fn one_hot(index: usize, length: usize) -> Vec<f32> {
    let mut out = vec![0.0; length];
    out[index] = 1.0;
    out
}

/// A multi-hot vector of `length` elements with a `1.0` at every index in
/// `indices`.
pub fn multi_hot(indices: &[usize], length: usize) -> Vec<f32> {
    let mut out = vec![0.0; length];
    for &i in indices {
        out[i] = 1.0;
    }
    out
}

#[cfg(test)]
mod labels_spec {
    use super::*;

    #[test]
    fn argmax_finds_the_largest_element() {
        assert_eq!(argmax(&[0.1, 0.8, 0.1]), 1);
    }

    #[test]
    fn argmax_breaks_ties_to_the_first_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
    }

    #[test]
    fn threshold_indices_collects_everything_at_or_above() {
        assert_eq!(threshold_indices(&[0.1, 0.6, 0.9, 0.4], 0.5), vec![1, 2]);
    }

    #[test]
    fn one_hot_sets_a_single_index() {
        assert_eq!(one_hot(2, 4), vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn multi_hot_sets_every_index() {
        assert_eq!(multi_hot(&[0, 2], 4), vec![1.0, 0.0, 1.0, 0.0]);
    }
}
