//! Batch-DFT problems run on the built-in radix-2 kernel.

use crate::array::Array;
use crate::backend::TransformBackend;
use crate::error::{FftxError, Result};
use crate::ops::fft::{batch_radix2, Direction};
use crate::ops::transform::{imdprdft, mdprdft};
use crate::shape::{IndexBox, Point};
use crate::trace::{BatchDftProblem, BatchPrdftProblem, TraceContext};
use num_complex::Complex64;

/// Runs a [`BatchDftProblem`] through the same buffer contract as a compiled
/// transform, so both can be compared on identical data.
///
/// # Examples
///
/// ```
/// # use fftx_rs::backend::{ReferenceBatchDft, TransformBackend};
/// # use fftx_rs::trace::{BatchDftProblem, BatchLayout};
/// # use fftx_rs::Direction;
/// let problem = BatchDftProblem::new("b", 4, 1, BatchLayout::contiguous(), Direction::Forward).unwrap();
/// let mut backend = ReferenceBatchDft::new(problem).unwrap();
/// let x = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
/// let mut y = [0.0; 8];
/// backend.transform(&mut [&mut y[..]], &[&x[..]], &[]).unwrap();
/// assert_eq!(y, [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceBatchDft {
    problem: BatchDftProblem,
    name: String,
}

impl ReferenceBatchDft {
    /// Wrap a problem. Its length must be a power of two.
    pub fn new(problem: BatchDftProblem) -> Result<Self> {
        let n = problem.len();
        if !n.is_power_of_two() {
            return Err(FftxError::LengthNotPowerOfTwo { n });
        }
        let name = format!("reference:{}", problem.name());
        Ok(Self { problem, name })
    }

    /// The wrapped problem.
    pub fn problem(&self) -> &BatchDftProblem {
        &self.problem
    }

    fn run(&self, y: &mut [Complex64], x: &[Complex64]) -> Result<()> {
        let (n, batch) = (self.problem.len(), self.problem.batch());
        let layout = self.problem.layout();
        for len in [x.len(), y.len()] {
            if len != n * batch {
                return Err(FftxError::BufferSizeMismatch { expected: n * batch, actual: len });
            }
        }
        let mut lanes: Vec<Vec<Complex64>> = (0..batch)
            .map(|b| (0..n).map(|i| x[layout.read.offset(b, i, batch, n)]).collect())
            .collect();
        batch_radix2(n, 1, self.problem.direction(), &mut lanes)?;
        for (b, lane) in lanes.iter().enumerate() {
            for (i, v) in lane.iter().enumerate() {
                y[layout.write.offset(b, i, batch, n)] = *v;
            }
        }
        Ok(())
    }
}

impl TransformBackend for ReferenceBatchDft {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(
        &mut self,
        outputs: &mut [&mut [f64]],
        inputs: &[&[f64]],
        _symbols: &[&[f64]],
    ) -> Result<()> {
        let (out, input) = single_buffers(outputs, inputs)?;
        let x: &[Complex64] = bytemuck::try_cast_slice(input)?;
        let y: &mut [Complex64] = bytemuck::try_cast_slice_mut(out)?;
        self.run(y, x)
    }
}

fn single_buffers<'o, 'i>(
    outputs: &'o mut [&mut [f64]],
    inputs: &[&'i [f64]],
) -> Result<(&'o mut [f64], &'i [f64])> {
    match (outputs.first_mut(), inputs.first()) {
        (Some(out), Some(&input)) => Ok((&mut **out, input)),
        _ => Err(FftxError::InvalidLayout(
            "reference transform needs one output and one input buffer".to_string(),
        )),
    }
}

/// Runs a [`BatchPrdftProblem`] through the batched real operators in
/// execution mode. Forward problems read `n` reals per lane and write the
/// interleaved half spectrum; inverse problems do the reverse.
///
/// # Examples
///
/// ```
/// # use fftx_rs::backend::{ReferenceBatchPrdft, TransformBackend};
/// # use fftx_rs::trace::{BatchLayout, BatchPrdftProblem};
/// # use fftx_rs::Direction;
/// let problem = BatchPrdftProblem::new("r", 4, 1, BatchLayout::contiguous(), Direction::Forward).unwrap();
/// let mut backend = ReferenceBatchPrdft::new(problem).unwrap();
/// let x = [1.0, 1.0, 1.0, 1.0];
/// let mut y = [0.0; 6];
/// backend.transform(&mut [&mut y[..]], &[&x[..]], &[]).unwrap();
/// assert_eq!(y, [4.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceBatchPrdft {
    problem: BatchPrdftProblem,
    name: String,
}

impl ReferenceBatchPrdft {
    /// Wrap a problem. Its length must be a power of two.
    pub fn new(problem: BatchPrdftProblem) -> Result<Self> {
        let n = problem.len();
        if !n.is_power_of_two() {
            return Err(FftxError::LengthNotPowerOfTwo { n });
        }
        let name = format!("reference:{}", problem.name());
        Ok(Self { problem, name })
    }

    /// The wrapped problem.
    pub fn problem(&self) -> &BatchPrdftProblem {
        &self.problem
    }
}

impl TransformBackend for ReferenceBatchPrdft {
    fn name(&self) -> &str {
        &self.name
    }

    /// Buffer lengths are checked by the operators against the real and
    /// half-spectrum sizes of the problem.
    fn transform(
        &mut self,
        outputs: &mut [&mut [f64]],
        inputs: &[&[f64]],
        _symbols: &[&[f64]],
    ) -> Result<()> {
        let (out, input) = single_buffers(outputs, inputs)?;
        let p = &self.problem;
        let ext = Point::new(&[p.len() as i64])?;
        let mut ctx = TraceContext::new();
        match p.direction() {
            Direction::Forward => {
                let y: &mut [Complex64] = bytemuck::try_cast_slice_mut(out)?;
                let src_domain = IndexBox::from_extents(&[input.len()])?;
                let src = Array::from_vec(&ctx, input.to_vec(), src_domain)?;
                let domain = IndexBox::from_extents(&[y.len()])?;
                let mut dst = Array::from_buffer(&ctx, y, domain)?;
                mdprdft(&mut ctx, &ext, p.batch(), p.layout(), &mut dst, &src)
            }
            Direction::Inverse => {
                let x: &[Complex64] = bytemuck::try_cast_slice(input)?;
                let src_domain = IndexBox::from_extents(&[x.len()])?;
                let src = Array::from_vec(&ctx, x.to_vec(), src_domain)?;
                let domain = IndexBox::from_extents(&[out.len()])?;
                let mut dst = Array::from_buffer(&ctx, out, domain)?;
                imdprdft(&mut ctx, &ext, p.batch(), p.layout(), &mut dst, &src)
            }
        }
    }
}
