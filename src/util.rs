//! Shared numeric constants.

/// Fixed small constant added inside every division or logarithm across
/// [`crate::loss`] and the layer normalization kernels, so that a
/// degenerate input (a zero denominator, a zero log argument) produces a
/// large-but-finite result instead of `NaN`/`Inf`.
pub const EPS: f32 = 1e-15;
