//! Batched in-place radix-2 FFT kernel.
//!
//! Iterative Cooley-Tukey with bit-reversal permutation and
//! decimation-in-time butterflies. One call transforms any number of lanes
//! of the same length and stride. Results are unnormalized in both
//! directions, so a forward/inverse pair scales by `n`.
//!
//! Twiddle factors are cached per thread and rebuilt only when the length
//! changes between calls.

use crate::error::{FftxError, Result};
use num_complex::Complex64;
use std::cell::RefCell;
use std::f64::consts::PI;
use std::fmt;

/// Transform direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Exponent sign -1.
    Forward,
    /// Exponent sign +1.
    Inverse,
}

impl Direction {
    /// Exponent sign written into scripts.
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Direction::Forward => -1,
            Direction::Inverse => 1,
        }
    }

    /// Direction for a script exponent sign.
    pub fn from_sign(sign: i32) -> Result<Self> {
        match sign {
            -1 => Ok(Direction::Forward),
            1 => Ok(Direction::Inverse),
            _ => Err(FftxError::InvalidLayout(format!(
                "transform sign must be -1 or 1, got {}",
                sign
            ))),
        }
    }

    /// The opposite direction.
    pub const fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Inverse,
            Direction::Inverse => Direction::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Inverse => f.write_str("inverse"),
        }
    }
}

/// Roots of unity `exp(-2*pi*i*j/n)` for `j < n/2`.
#[derive(Debug, Default)]
pub struct TwiddleTable {
    n: usize,
    roots: Vec<Complex64>,
    rebuilds: usize,
}

impl TwiddleTable {
    /// Empty table.
    pub const fn new() -> Self {
        Self { n: 0, roots: Vec::new(), rebuilds: 0 }
    }

    /// Make the table valid for length `n`. Returns true if it was rebuilt.
    pub fn ensure(&mut self, n: usize) -> bool {
        if self.n == n && self.roots.len() == n / 2 && self.rebuilds > 0 {
            return false;
        }
        self.roots.clear();
        self.roots.extend((0..n / 2).map(|j| {
            let theta = -2.0 * PI * j as f64 / n as f64;
            Complex64::new(theta.cos(), theta.sin())
        }));
        self.n = n;
        self.rebuilds += 1;
        true
    }

    /// Length the table currently serves.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Returns true before the first build.
    pub fn is_empty(&self) -> bool {
        self.rebuilds == 0
    }

    /// Number of times the table has been rebuilt.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Root `j` for the given direction.
    #[inline]
    pub fn root(&self, j: usize, direction: Direction) -> Complex64 {
        match direction {
            Direction::Forward => self.roots[j],
            Direction::Inverse => self.roots[j].conj(),
        }
    }
}

thread_local! {
    static TWIDDLES: RefCell<TwiddleTable> = const { RefCell::new(TwiddleTable::new()) };
}

/// Length served by this thread's twiddle cache, 0 before first use.
pub fn twiddle_cache_len() -> usize {
    TWIDDLES.with(|t| t.borrow().len())
}

/// Number of rebuilds of this thread's twiddle cache.
pub fn twiddle_rebuild_count() -> usize {
    TWIDDLES.with(|t| t.borrow().rebuilds())
}

#[inline]
fn reverse_bits(x: usize, levels: u32) -> usize {
    if levels == 0 {
        0
    } else {
        x.reverse_bits() >> (usize::BITS - levels)
    }
}

/// Transform every lane in place.
///
/// Element `k` of a lane is read at `k * stride`; each lane must hold at
/// least `(n - 1) * stride + 1` elements.
///
/// # Examples
///
/// ```
/// # use fftx_rs::ops::fft::batch_radix2;
/// # use fftx_rs::{Complex64, Direction};
/// let one = Complex64::new(1.0, 0.0);
/// let zero = Complex64::new(0.0, 0.0);
/// let mut lanes = vec![vec![one, zero, zero, zero], vec![one; 4]];
/// batch_radix2(4, 1, Direction::Forward, &mut lanes).unwrap();
/// assert_eq!(lanes[0], vec![one; 4]);
/// assert_eq!(lanes[1][0], Complex64::new(4.0, 0.0));
/// ```
pub fn batch_radix2<L: AsMut<[Complex64]>>(
    n: usize,
    stride: usize,
    direction: Direction,
    lanes: &mut [L],
) -> Result<()> {
    if n == 0 || !n.is_power_of_two() {
        return Err(FftxError::LengthNotPowerOfTwo { n });
    }
    if stride == 0 {
        return Err(FftxError::InvalidLayout("lane stride must be positive".to_string()));
    }
    let needed = (n - 1) * stride + 1;
    for (lane, buf) in lanes.iter_mut().enumerate() {
        let len = buf.as_mut().len();
        if len < needed {
            return Err(FftxError::LaneTooShort { lane, len, needed });
        }
    }
    if n == 1 {
        return Ok(());
    }

    TWIDDLES.with(|cell| {
        let mut table = cell.borrow_mut();
        if table.ensure(n) {
            log::trace!("rebuilt twiddle table for n = {}", n);
        }

        let levels = n.trailing_zeros();
        for i in 0..n {
            let j = reverse_bits(i, levels);
            if j > i {
                for lane in lanes.iter_mut() {
                    lane.as_mut().swap(i * stride, j * stride);
                }
            }
        }

        let mut size = 2;
        loop {
            let half = size / 2;
            let step = n / size;
            for k in (0..n).step_by(size) {
                for j in 0..half {
                    let w = table.root(j * step, direction);
                    let lo = (k + j) * stride;
                    let hi = (k + j + half) * stride;
                    for lane in lanes.iter_mut() {
                        let v = lane.as_mut();
                        let t = v[hi] * w;
                        let u = v[lo];
                        v[hi] = u - t;
                        v[lo] = u + t;
                    }
                }
            }
            if size == n {
                break;
            }
            size *= 2;
        }
    });
    Ok(())
}

/// Transform one contiguous buffer in place.
pub fn fft_in_place(data: &mut [Complex64], direction: Direction) -> Result<()> {
    let n = data.len();
    batch_radix2(n, 1, direction, &mut [data])
}

/// Forward transform of `x` into a new vector.
pub fn fft(x: &[Complex64]) -> Result<Vec<Complex64>> {
    let mut out = x.to_vec();
    fft_in_place(&mut out, Direction::Forward)?;
    Ok(out)
}

/// Unnormalized inverse transform of `x` into a new vector.
pub fn ifft(x: &[Complex64]) -> Result<Vec<Complex64>> {
    let mut out = x.to_vec();
    fft_in_place(&mut out, Direction::Inverse)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn naive_dft(x: &[Complex64], direction: Direction) -> Vec<Complex64> {
        let n = x.len();
        let sign = direction.sign() as f64;
        (0..n)
            .map(|k| {
                x.iter().enumerate().fold(c(0.0, 0.0), |acc, (j, v)| {
                    let theta = sign * 2.0 * PI * (j * k) as f64 / n as f64;
                    acc + v * Complex64::new(theta.cos(), theta.sin())
                })
            })
            .collect()
    }

    #[test]
    fn test_fft_basic() {
        let x = vec![c(1.0, 0.0), c(2.0, 0.0), c(3.0, 0.0), c(4.0, 0.0)];
        let y = fft(&x).unwrap();
        let expected = [c(10.0, 0.0), c(-2.0, 2.0), c(-2.0, 0.0), c(-2.0, -2.0)];
        for (a, b) in y.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-12);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_matches_naive_dft() {
        let x: Vec<Complex64> = (0..16)
            .map(|i| c((i as f64 * 0.7).sin(), (i as f64 * 1.3).cos()))
            .collect();
        for direction in [Direction::Forward, Direction::Inverse] {
            let mut y = x.clone();
            fft_in_place(&mut y, direction).unwrap();
            let expected = naive_dft(&x, direction);
            for (a, b) in y.iter().zip(expected.iter()) {
                assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-10);
                assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_round_trip_scales_by_n() {
        let x: Vec<Complex64> = (0..8).map(|i| c(i as f64, -(i as f64))).collect();
        let y = ifft(&fft(&x).unwrap()).unwrap();
        for (a, b) in y.iter().zip(x.iter()) {
            assert_abs_diff_eq!(a.re, 8.0 * b.re, epsilon = 1e-10);
            assert_abs_diff_eq!(a.im, 8.0 * b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_strided_lanes() {
        // two interleaved signals of length 4 in one buffer, stride 2
        let a = [c(1.0, 0.0), c(0.0, 1.0), c(-1.0, 0.0), c(0.0, -1.0)];
        let mut buf: Vec<Complex64> = a.iter().flat_map(|v| [*v, c(9.0, 9.0)]).collect();
        buf.pop();
        let mut lanes = vec![buf];
        batch_radix2(4, 2, Direction::Forward, &mut lanes).unwrap();
        let expected = naive_dft(&a, Direction::Forward);
        for k in 0..4 {
            assert_abs_diff_eq!(lanes[0][2 * k].re, expected[k].re, epsilon = 1e-12);
            assert_abs_diff_eq!(lanes[0][2 * k].im, expected[k].im, epsilon = 1e-12);
        }
        // untouched gaps
        assert_eq!(lanes[0][1], c(9.0, 9.0));
    }

    #[test]
    fn test_non_power_of_two_rejected() {
        let mut lanes = vec![vec![c(0.0, 0.0); 6]];
        assert!(matches!(
            batch_radix2(6, 1, Direction::Forward, &mut lanes),
            Err(FftxError::LengthNotPowerOfTwo { n: 6 })
        ));
        assert!(matches!(
            batch_radix2(0, 1, Direction::Forward, &mut lanes),
            Err(FftxError::LengthNotPowerOfTwo { n: 0 })
        ));
    }

    #[test]
    fn test_short_lane_rejected() {
        let mut lanes = vec![vec![c(0.0, 0.0); 8], vec![c(0.0, 0.0); 6]];
        assert!(matches!(
            batch_radix2(4, 2, Direction::Forward, &mut lanes),
            Err(FftxError::LaneTooShort { lane: 1, len: 6, needed: 7 })
        ));
    }

    #[test]
    fn test_length_one_is_identity() {
        let mut x = vec![c(3.0, -1.0)];
        fft_in_place(&mut x, Direction::Inverse).unwrap();
        assert_eq!(x, vec![c(3.0, -1.0)]);
    }

    #[test]
    fn test_twiddle_cache_follows_length() {
        let mut a = vec![c(1.0, 0.0); 8];
        let mut b = vec![c(1.0, 0.0); 16];
        fft_in_place(&mut a, Direction::Forward).unwrap();
        assert_eq!(twiddle_cache_len(), 8);
        let before = twiddle_rebuild_count();
        fft_in_place(&mut a, Direction::Inverse).unwrap();
        assert_eq!(twiddle_rebuild_count(), before);
        fft_in_place(&mut b, Direction::Forward).unwrap();
        assert_eq!(twiddle_cache_len(), 16);
        assert_eq!(twiddle_rebuild_count(), before + 1);
    }

    #[test]
    fn test_direction_signs() {
        assert_eq!(Direction::Forward.sign(), -1);
        assert_eq!(Direction::from_sign(1).unwrap(), Direction::Inverse);
        assert!(Direction::from_sign(0).is_err());
        assert_eq!(Direction::Forward.reverse(), Direction::Inverse);
    }

    #[test]
    fn test_twiddle_table_ensure() {
        let mut t = TwiddleTable::new();
        assert!(t.is_empty());
        assert!(t.ensure(4));
        assert!(!t.ensure(4));
        assert_abs_diff_eq!(t.root(1, Direction::Forward).im, -1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(t.root(1, Direction::Inverse).im, 1.0, epsilon = 1e-15);
        assert!(t.ensure(8));
        assert_eq!(t.rebuilds(), 2);
    }
}
