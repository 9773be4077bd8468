//! Element-wise comparison of result buffers.
//!
//! Used to check a generated or compiled transform against the reference
//! kernel: each component must agree within an absolute tolerance.

use crate::error::{FftxError, Result};
use num_complex::Complex64;
use std::fmt;

/// Default absolute tolerance per component.
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// Outcome of a buffer comparison.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Comparison {
    /// True if every component is within tolerance
    pub correct: bool,
    /// Largest absolute component difference
    pub max_delta: f64,
    /// Number of elements compared
    pub count: usize,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "correct: {}, max delta = {:e} over {} elements",
            self.correct, self.max_delta, self.count
        )
    }
}

fn check_lengths(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(FftxError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}

/// Largest of `deltas`, or NaN as soon as any delta is NaN.
fn max_delta(deltas: impl Iterator<Item = f64>) -> f64 {
    deltas.fold(0.0, |acc, d| if d.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(d) })
}

fn judge(max_delta: f64, tolerance: f64, count: usize) -> Comparison {
    // A NaN delta fails the comparison.
    let comparison = Comparison { correct: max_delta < tolerance, max_delta, count };
    if !comparison.correct {
        log::debug!("buffers differ: {}", comparison);
    }
    comparison
}

/// Compare two complex buffers component-wise. Any NaN difference makes the
/// comparison incorrect.
pub fn compare_complex(
    actual: &[Complex64],
    expected: &[Complex64],
    tolerance: f64,
) -> Result<Comparison> {
    check_lengths(actual.len(), expected.len())?;
    let deltas = actual
        .iter()
        .zip(expected)
        .flat_map(|(a, e)| [(a.re - e.re).abs(), (a.im - e.im).abs()]);
    Ok(judge(max_delta(deltas), tolerance, actual.len()))
}

/// Compare two real buffers element-wise. Any NaN difference makes the
/// comparison incorrect.
pub fn compare_real(actual: &[f64], expected: &[f64], tolerance: f64) -> Result<Comparison> {
    check_lengths(actual.len(), expected.len())?;
    let deltas = actual.iter().zip(expected).map(|(a, e)| (a - e).abs());
    Ok(judge(max_delta(deltas), tolerance, actual.len()))
}
