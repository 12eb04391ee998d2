//! Deterministic, seedable 32-bit PRNG.
//!
//! `leaf` reached for the system `rand` crate (`rand::thread_rng()`,
//! `rand::distributions::Range`) wherever it needed randomness, which is
//! fine for a filler that doesn't need to reproduce bit-for-bit across
//! platforms or `rand` versions. PetalFlow's initializers and dropout
//! sampling must, so the generator is hand-rolled here instead of deferred
//! to an external crate whose internals could shift across releases: a
//! standard 32-bit Mersenne Twister (MT19937), seeded with `init_genrand`.
//! Seed `0` must reproduce `2357136044, 2546248239, 3071714933, 3626093760,
//! 2588848963` as its first five `u32` draws; this is checked in the test
//! below and is the crate's reproducibility anchor.

use std::sync::{Mutex, OnceLock};

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// A single, owned, seedable PRNG state.
///
/// Construct a per-instance `Prng` whenever isolation from the process-wide
/// generator matters (tests, parallel futures); use [`global`] for ambient
/// use. Cheap to clone; cheap to reseed.
#[derive(Debug, Clone)]
pub struct Prng {
    state: [u32; N],
    index: usize,
}

impl Prng {
    /// Build a generator seeded with `seed`.
    pub fn new(seed: u32) -> Prng {
        let mut prng = Prng { state: [0u32; N], index: N };
        prng.seed(seed);
        prng
    }

    /// Reseed this generator in place, discarding any buffered state.
    pub fn seed(&mut self, seed: u32) {
        self.state[0] = seed;
        for i in 1..N {
            let prev = self.state[i - 1];
            self.state[i] = (1_812_433_253u32.wrapping_mul(prev ^ (prev >> 30)))
                .wrapping_add(i as u32);
        }
        self.index = N;
    }

    fn regenerate(&mut self) {
        for i in 0..N {
            let y = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % N] & LOWER_MASK);
            let mut next = self.state[(i + M) % N] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.state[i] = next;
        }
        self.index = 0;
    }

    /// Draw the next raw 32-bit word.
    pub fn draw_u32(&mut self) -> u32 {
        if self.index >= N {
            self.regenerate();
        }
        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^= y >> 18;
        y
    }

    /// Draw a double-precision float uniform in `(0, 1)`, combining two
    /// 32-bit draws `a = draw>>5, b = draw>>6` as `(a*2^26 + b) / 2^53` so
    /// the precision matches an IEEE-754 double's mantissa.
    pub fn draw_double(&mut self) -> f64 {
        let a = self.draw_u32() >> 5;
        let b = self.draw_u32() >> 6;
        (a as f64 * 67_108_864.0 + b as f64) / 9_007_199_254_740_992.0
    }

    /// Draw a single-precision float uniform in `(0, 1]`, narrowed from the
    /// same two-draw double-precision combination as [`draw_double`].
    ///
    /// [`draw_double`]: Prng::draw_double
    pub fn draw_float(&mut self) -> f32 {
        self.draw_double() as f32
    }
}

static GLOBAL: OnceLock<Mutex<Prng>> = OnceLock::new();

fn global_cell() -> &'static Mutex<Prng> {
    GLOBAL.get_or_init(|| Mutex::new(Prng::new(0)))
}

/// Reseed the process-wide generator.
pub fn seed_global(seed: u32) {
    global_cell().lock().unwrap().seed(seed);
}

/// Draw a `u32` from the process-wide generator.
pub fn global_draw_u32() -> u32 {
    global_cell().lock().unwrap().draw_u32()
}

/// Draw an `f32` in `(0, 1]` from the process-wide generator.
pub fn global_draw_float() -> f32 {
    global_cell().lock().unwrap().draw_float()
}

/// Draw an `f64` in `(0, 1)` from the process-wide generator.
pub fn global_draw_double() -> f64 {
    global_cell().lock().unwrap().draw_double()
}

#[cfg(test)]
mod prng_spec {
    use super::*;

    #[test]
    fn seed_zero_matches_reference_u32_sequence() {
        let mut p = Prng::new(0);
        let draws: Vec<u32> = (0..5).map(|_| p.draw_u32()).collect();
        assert_eq!(
            draws,
            vec![2357136044, 2546248239, 3071714933, 3626093760, 2588848963]
        );
    }

    #[test]
    fn seed_zero_floats_match_reference_sequence() {
        let mut p = Prng::new(0);
        for _ in 0..5 {
            p.draw_u32();
        }
        let floats: Vec<f32> = (0..5).map(|_| p.draw_float()).collect();
        let expected = [0.85794562f32, 0.84725171, 0.62356371, 0.38438171, 0.29753458];
        for (got, want) in floats.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "{} vs {}", got, want);
        }
    }

    #[test]
    fn seed_zero_doubles_are_in_open_unit_interval() {
        let mut p = Prng::new(0);
        for _ in 0..1000 {
            let d = p.draw_double();
            assert!(d > 0.0 && d < 1.0);
        }
    }

    #[test]
    fn reseeding_reproduces_the_sequence() {
        let mut p = Prng::new(42);
        let _ = (0..10).map(|_| p.draw_u32()).collect::<Vec<_>>();
        p.seed(42);
        let first = p.draw_u32();
        let mut q = Prng::new(42);
        assert_eq!(first, q.draw_u32());
    }

    #[test]
    fn global_instance_is_seedable() {
        seed_global(0);
        let first = global_draw_u32();
        seed_global(0);
        assert_eq!(first, global_draw_u32());
    }
}
