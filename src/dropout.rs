//! Populates a [`BitMask`] with a target drop ratio.
//!
//! The acceptance policy is bounded regardless of the ratio requested: for
//! `r <= 0.5` we sample drop indices directly; for `r >= 0.5` we sample the
//! smaller complementary set of *kept* indices and invert. Either way the
//! number of indices actually drawn is `<= length/2`, so the expected work
//! is linear even though the underlying "already set? try again" acceptance
//! loop can in principle reject. `leaf` has no direct analogue (dropout
//! lived as a TODO there); this module's shape follows the PRNG's own
//! per-instance-vs-global split from `prng.rs`.

use crate::bitmask::BitMask;
use crate::prng::Prng;

/// Mark approximately `ratio * mask.len()` bits of `mask` as dropped
/// (`bit = 1`), using `prng` for sampling. `mask` is cleared first.
///
/// `ratio` is clamped into `[0, 1]` defensively; callers are expected to
/// pass a value already in range.
pub fn sample(mask: &mut BitMask, ratio: f32, prng: &mut Prng) {
    mask.clear_all();
    let len = mask.len();
    if len == 0 {
        return;
    }
    let ratio = ratio.clamp(0.0, 1.0);
    let drop_count = (ratio * len as f32) as usize;

    if drop_count == 0 {
        return;
    }
    if drop_count == len {
        for i in 0..len {
            mask.set(i);
        }
        return;
    }

    if ratio <= 0.5 {
        for i in partial_fisher_yates_sample(len, drop_count, prng) {
            mask.set(i);
        }
    } else {
        let keep_count = len - drop_count;
        let keep: Vec<usize> = partial_fisher_yates_sample(len, keep_count, prng);
        for i in keep {
            mask.set(i);
        }
        mask.not();
    }
}

/// Draw `k` distinct indices from `0..n` uniformly without replacement in
/// `O(k)` expected time via a partial Fisher-Yates shuffle: walk the first
/// `k` slots of a conceptual `0..n` permutation, swapping each slot with a
/// uniformly chosen later slot, using a sparse map so the whole `n`-sized
/// array is never materialized.
fn partial_fisher_yates_sample(n: usize, k: usize, prng: &mut Prng) -> Vec<usize> {
    use std::collections::HashMap;

    let mut swapped: HashMap<usize, usize> = HashMap::new();
    let mut result = Vec::with_capacity(k);

    for i in 0..k {
        let remaining = n - i;
        let j = i + (prng.draw_double() * remaining as f64) as usize;
        let j = j.min(n - 1);

        let value_at_j = *swapped.get(&j).unwrap_or(&j);
        let value_at_i = *swapped.get(&i).unwrap_or(&i);

        swapped.insert(i, value_at_j);
        swapped.insert(j, value_at_i);

        result.push(value_at_j);
    }

    result
}
