//! Multi-dimensional DFT operators.
//!
//! Each operator has one call site for both modes. While the context is
//! tracing it appends a single DAG node naming its operands; otherwise it
//! computes the transform on the arrays' memory with the radix-2 kernel.
//! Every transform is unnormalized.
//!
//! Within a lane, elements follow the build ordering of a zero-based box with
//! the operator's extents. Real transforms keep `n/2 + 1` entries along the
//! build truncation axis.

use crate::array::Array;
use crate::config::BUILD_ORDER;
use crate::dtype::Element;
use crate::error::{FftxError, Result};
use crate::ops::fft::{batch_radix2, Direction};
use crate::shape::{IndexBox, Point};
use crate::trace::{BatchLayout, DagNode, Distribution, TraceContext};
use num_complex::Complex64;

/// Batched forward complex DFT over `extents`.
///
/// `src` and `dst` each hold `batch` lanes of `product(extents)` elements,
/// addressed by `layout`.
///
/// # Examples
///
/// ```
/// # use fftx_rs::{Array, IndexBox, TraceContext, Complex64};
/// # use fftx_rs::ops::mddft;
/// # use fftx_rs::trace::BatchLayout;
/// let mut ctx = TraceContext::new();
/// let d = IndexBox::from_extents(&[4]).unwrap();
/// let x = Array::from_vec(&ctx, vec![Complex64::new(1.0, 0.0); 4], d.clone()).unwrap();
/// let mut y = Array::new(&mut ctx, d.clone()).unwrap();
/// mddft(&mut ctx, &d.extents(), 1, BatchLayout::contiguous(), &mut y, &x).unwrap();
/// assert_eq!(y.as_slice().unwrap()[0], Complex64::new(4.0, 0.0));
/// ```
pub fn mddft(
    ctx: &mut TraceContext,
    extents: &Point,
    batch: usize,
    layout: BatchLayout,
    dst: &mut Array<'_, Complex64>,
    src: &Array<'_, Complex64>,
) -> Result<()> {
    complex_transform(ctx, extents, batch, layout, Direction::Forward, dst, src)
}

/// Batched inverse complex DFT over `extents`.
pub fn imddft(
    ctx: &mut TraceContext,
    extents: &Point,
    batch: usize,
    layout: BatchLayout,
    dst: &mut Array<'_, Complex64>,
    src: &Array<'_, Complex64>,
) -> Result<()> {
    complex_transform(ctx, extents, batch, layout, Direction::Inverse, dst, src)
}

fn complex_transform(
    ctx: &mut TraceContext,
    extents: &Point,
    batch: usize,
    layout: BatchLayout,
    direction: Direction,
    dst: &mut Array<'_, Complex64>,
    src: &Array<'_, Complex64>,
) -> Result<()> {
    let block = block_box(extents)?;
    check_batch(batch)?;
    if ctx.is_tracing() {
        return ctx.emit(DagNode::MdDft {
            extents: extents.clone(),
            sign: direction.sign(),
            batch,
            layout,
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    let size = block.size();
    let input = src.as_slice()?;
    expect_len(input.len(), batch * size)?;
    let mut lanes = gather_lanes(input, batch, size, layout.read);
    multi_dim_fft(&mut lanes, &block, direction)?;
    let output = dst.as_mut_slice()?;
    expect_len(output.len(), batch * size)?;
    scatter_lanes(&lanes, output, batch, size, layout.write);
    Ok(())
}

/// Batched real-to-complex forward DFT over `extents`.
///
/// Each output lane is the half spectrum, `product` of the extents with the
/// truncated axis reduced to `n/2 + 1`.
pub fn mdprdft(
    ctx: &mut TraceContext,
    extents: &Point,
    batch: usize,
    layout: BatchLayout,
    dst: &mut Array<'_, Complex64>,
    src: &Array<'_, f64>,
) -> Result<()> {
    let block = block_box(extents)?;
    check_batch(batch)?;
    if ctx.is_tracing() {
        return ctx.emit(DagNode::MdPrDft {
            extents: extents.clone(),
            batch,
            layout,
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    forward_real(&block, batch, layout, dst, src)
}

/// Batched complex-to-real inverse DFT over `extents`, consuming half spectra.
pub fn imdprdft(
    ctx: &mut TraceContext,
    extents: &Point,
    batch: usize,
    layout: BatchLayout,
    dst: &mut Array<'_, f64>,
    src: &Array<'_, Complex64>,
) -> Result<()> {
    let block = block_box(extents)?;
    check_batch(batch)?;
    if ctx.is_tracing() {
        return ctx.emit(DagNode::IMdPrDft {
            extents: extents.clone(),
            batch,
            layout,
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    inverse_real(&block, batch, layout, dst, src)
}

/// Single real-to-complex forward DFT over `extents`.
pub fn prdft(
    ctx: &mut TraceContext,
    extents: &Point,
    dst: &mut Array<'_, Complex64>,
    src: &Array<'_, f64>,
) -> Result<()> {
    let block = block_box(extents)?;
    if ctx.is_tracing() {
        return ctx.emit(DagNode::PrDft {
            extents: extents.clone(),
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    forward_real(&block, 1, BatchLayout::contiguous(), dst, src)
}

/// Single complex-to-real inverse DFT over `extents`.
pub fn iprdft(
    ctx: &mut TraceContext,
    extents: &Point,
    dst: &mut Array<'_, f64>,
    src: &Array<'_, Complex64>,
) -> Result<()> {
    let block = block_box(extents)?;
    if ctx.is_tracing() {
        return ctx.emit(DagNode::IPrDft {
            extents: extents.clone(),
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    inverse_real(&block, 1, BatchLayout::contiguous(), dst, src)
}

/// Fourier resampling of `src` onto the grid of `dst`, shifted by a
/// fractional amount per axis. Only available while tracing.
pub fn resample<T: Element>(
    ctx: &mut TraceContext,
    shift: &[f64],
    dst: &mut Array<'_, T>,
    src: &Array<'_, T>,
) -> Result<()> {
    if !ctx.is_tracing() {
        return Err(FftxError::ExecutionUnsupported("resample"));
    }
    let dim = src.domain().dim();
    if shift.len() != dim {
        return Err(FftxError::DimensionMismatch { expected: dim, actual: shift.len() });
    }
    ctx.emit(DagNode::Resample {
        dst_extents: dst.domain().extents(),
        src_extents: src.domain().extents(),
        shift: shift.to_vec(),
        dst: dst.id()?,
        src: src.id()?,
    })
}

fn block_box(extents: &Point) -> Result<IndexBox> {
    let mut lengths = Vec::with_capacity(extents.dim());
    for (axis, &n) in extents.as_slice().iter().enumerate() {
        if n <= 0 {
            return Err(FftxError::InvalidLayout(format!(
                "extent {} on axis {} must be positive",
                n, axis
            )));
        }
        lengths.push(n as usize);
    }
    IndexBox::from_extents(&lengths)
}

fn check_batch(batch: usize) -> Result<()> {
    if batch == 0 {
        return Err(FftxError::InvalidLayout("batch count must be positive".to_string()));
    }
    Ok(())
}

fn expect_len(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(FftxError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}

fn gather_lanes<T: Copy>(data: &[T], batch: usize, block: usize, dist: Distribution) -> Vec<Vec<T>> {
    (0..batch)
        .map(|b| (0..block).map(|e| data[dist.offset(b, e, batch, block)]).collect())
        .collect()
}

fn scatter_lanes<T: Copy>(
    lanes: &[Vec<T>],
    data: &mut [T],
    batch: usize,
    block: usize,
    dist: Distribution,
) {
    for (b, lane) in lanes.iter().enumerate() {
        for (e, v) in lane.iter().enumerate() {
            data[dist.offset(b, e, batch, block)] = *v;
        }
    }
}

/// Transform every lane along each axis of `block` in turn. Lines of one axis
/// are gathered from all lanes and run through the kernel as one batch.
pub(crate) fn multi_dim_fft(
    lanes: &mut [Vec<Complex64>],
    block: &IndexBox,
    direction: Direction,
) -> Result<()> {
    let size = block.size();
    let strides = block.strides(BUILD_ORDER);
    for axis in 0..block.dim() {
        let n = block.extent(axis);
        let stride = strides[axis];
        if n == 1 {
            continue;
        }
        let starts: Vec<usize> = (0..size).filter(|i| (i / stride) % n == 0).collect();
        let mut lines: Vec<Vec<Complex64>> = Vec::with_capacity(lanes.len() * starts.len());
        for lane in lanes.iter() {
            for &s in &starts {
                lines.push((0..n).map(|k| lane[s + k * stride]).collect());
            }
        }
        batch_radix2(n, 1, direction, &mut lines)?;
        let mut lines = lines.into_iter();
        for lane in lanes.iter_mut() {
            for &s in &starts {
                if let Some(line) = lines.next() {
                    for (k, v) in line.into_iter().enumerate() {
                        lane[s + k * stride] = v;
                    }
                }
            }
        }
    }
    Ok(())
}

fn forward_real(
    block: &IndexBox,
    batch: usize,
    layout: BatchLayout,
    dst: &mut Array<'_, Complex64>,
    src: &Array<'_, f64>,
) -> Result<()> {
    let half = block.half_spectrum();
    let (size, half_size) = (block.size(), half.size());
    let input = src.as_slice()?;
    expect_len(input.len(), batch * size)?;
    let real = gather_lanes(input, batch, size, layout.read);
    let mut lanes: Vec<Vec<Complex64>> = real
        .into_iter()
        .map(|lane| lane.into_iter().map(|v| Complex64::new(v, 0.0)).collect())
        .collect();
    multi_dim_fft(&mut lanes, block, Direction::Forward)?;

    let mut kept = Vec::with_capacity(half_size);
    for p in half.points() {
        kept.push(block.position_of(&p)?);
    }
    let truncated: Vec<Vec<Complex64>> = lanes
        .iter()
        .map(|lane| kept.iter().map(|&i| lane[i]).collect())
        .collect();

    let output = dst.as_mut_slice()?;
    expect_len(output.len(), batch * half_size)?;
    scatter_lanes(&truncated, output, batch, half_size, layout.write);
    Ok(())
}

fn inverse_real(
    block: &IndexBox,
    batch: usize,
    layout: BatchLayout,
    dst: &mut Array<'_, f64>,
    src: &Array<'_, Complex64>,
) -> Result<()> {
    let half = block.half_spectrum();
    let (size, half_size) = (block.size(), half.size());
    let input = src.as_slice()?;
    expect_len(input.len(), batch * half_size)?;
    let halves = gather_lanes(input, batch, half_size, layout.read);

    // Source index for every point of the full spectrum and whether the
    // value is taken conjugated from the mirrored point.
    let extents = block.lengths();
    let mut sources = Vec::with_capacity(size);
    for p in block.points() {
        if half.contains(&p) {
            sources.push((half.position_of(&p)?, false));
        } else {
            let coords: Vec<i64> = (0..p.dim())
                .map(|d| {
                    let n = extents[d] as i64;
                    (n - p[d]) % n
                })
                .collect();
            let mirror = Point::new(&coords)?;
            sources.push((half.position_of(&mirror)?, true));
        }
    }

    let mut lanes: Vec<Vec<Complex64>> = halves
        .iter()
        .map(|h| {
            sources
                .iter()
                .map(|&(i, conj)| if conj { h[i].conj() } else { h[i] })
                .collect()
        })
        .collect();
    multi_dim_fft(&mut lanes, block, Direction::Inverse)?;
    let real: Vec<Vec<f64>> = lanes
        .into_iter()
        .map(|lane| lane.into_iter().map(|v| v.re).collect())
        .collect();

    let output = dst.as_mut_slice()?;
    expect_len(output.len(), batch * size)?;
    scatter_lanes(&real, output, batch, size, layout.write);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::VarId;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn pt(v: &[i64]) -> Point {
        Point::new(v).unwrap()
    }

    fn domain(ext: &[usize]) -> IndexBox {
        IndexBox::from_extents(ext).unwrap()
    }

    fn naive_2d(x: &[Complex64], n0: usize, n1: usize, sign: f64) -> Vec<Complex64> {
        let mut out = vec![c(0.0, 0.0); n0 * n1];
        for k0 in 0..n0 {
            for k1 in 0..n1 {
                let mut acc = c(0.0, 0.0);
                for j0 in 0..n0 {
                    for j1 in 0..n1 {
                        let theta = sign
                            * 2.0
                            * PI
                            * ((j0 * k0) as f64 / n0 as f64 + (j1 * k1) as f64 / n1 as f64);
                        acc += x[j0 * n1 + j1] * Complex64::new(theta.cos(), theta.sin());
                    }
                }
                out[k0 * n1 + k1] = acc;
            }
        }
        out
    }

    #[test]
    fn test_mddft_traced_line() {
        let mut ctx = TraceContext::new();
        ctx.begin_trace().unwrap();
        let d = domain(&[32]);
        let x: Array<'_, Complex64> = Array::new(&mut ctx, d.clone()).unwrap();
        let mut y: Array<'_, Complex64> = Array::new(&mut ctx, d).unwrap();
        let layout = BatchLayout::new(Distribution::Interleaved, Distribution::Contiguous);
        imddft(&mut ctx, &pt(&[8]), 4, layout, &mut y, &x).unwrap();
        assert!(ctx
            .script()
            .ends_with("   TDAGNode(TTensorI(MDDFT([8],1),4,AVec, APar), var_2,var_1),\n"));
    }

    #[test]
    fn test_real_transforms_traced_lines() {
        let mut ctx = TraceContext::new();
        ctx.begin_trace().unwrap();
        let r: Array<'_, f64> = Array::new(&mut ctx, domain(&[8, 8])).unwrap();
        let mut h: Array<'_, Complex64> = Array::new(&mut ctx, domain(&[8, 5])).unwrap();
        let mut back: Array<'_, f64> = Array::new(&mut ctx, domain(&[8, 8])).unwrap();
        prdft(&mut ctx, &pt(&[8, 8]), &mut h, &r).unwrap();
        iprdft(&mut ctx, &pt(&[8, 8]), &mut back, &h).unwrap();
        mdprdft(&mut ctx, &pt(&[8, 8]), 1, BatchLayout::contiguous(), &mut h, &r).unwrap();
        imdprdft(&mut ctx, &pt(&[8, 8]), 1, BatchLayout::contiguous(), &mut back, &h).unwrap();
        let body = ctx.script().split("TDAG([\n").nth(1).unwrap();
        assert_eq!(
            body,
            "    TDAGNode(MDPRDFT([8,8],-1), var_2,var_1),\n\
             \x20   TDAGNode(IMDPRDFT([8,8],1), var_3,var_2),\n\
             \x20   TDAGNode(TTensorI(MDPRDFT([8,8],-1),1,APar,APar), var_2,var_1),\n\
             \x20   TDAGNode(TTensorI(IMDPRDFT([8,8],1),1,APar,APar), var_3,var_2),\n"
        );
        assert_eq!(ctx.node_count(), 4);
    }

    #[test]
    fn test_traced_operator_needs_symbolic_operands() {
        let mut ctx = TraceContext::new();
        let d = domain(&[4]);
        let x = Array::from_vec(&ctx, vec![c(0.0, 0.0); 4], d.clone()).unwrap();
        let mut y = Array::from_vec(&ctx, vec![c(0.0, 0.0); 4], d).unwrap();
        ctx.begin_trace().unwrap();
        assert!(matches!(
            mddft(&mut ctx, &pt(&[4]), 1, BatchLayout::contiguous(), &mut y, &x),
            Err(FftxError::NotSymbolic)
        ));
    }

    #[test]
    fn test_mddft_2d_matches_naive() {
        let mut ctx = TraceContext::new();
        let d = domain(&[4, 8]);
        let data: Vec<Complex64> = (0..32)
            .map(|i| c((i as f64 * 0.37).cos(), (i as f64 * 0.11).sin()))
            .collect();
        let x = Array::from_vec(&ctx, data.clone(), d.clone()).unwrap();
        let mut y = Array::new(&mut ctx, d).unwrap();
        mddft(&mut ctx, &pt(&[4, 8]), 1, BatchLayout::contiguous(), &mut y, &x).unwrap();
        let expected = if BUILD_ORDER == crate::config::IndexOrder::RowMajor {
            naive_2d(&data, 4, 8, -1.0)
        } else {
            // column-major: axis 0 varies fastest, so the buffer is an 8x4 row-major grid
            naive_2d(&data, 8, 4, -1.0)
        };
        for (a, b) in y.as_slice().unwrap().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-9);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_interleaved_batch_matches_contiguous() {
        let mut ctx = TraceContext::new();
        let (n, batch) = (8usize, 3usize);
        let lanes: Vec<Vec<Complex64>> = (0..batch)
            .map(|b| (0..n).map(|i| c((b * n + i) as f64, b as f64)).collect())
            .collect();
        let contiguous: Vec<Complex64> = lanes.iter().flatten().copied().collect();
        let interleaved: Vec<Complex64> =
            (0..n).flat_map(|i| lanes.iter().map(move |l| l[i])).collect();
        let d = domain(&[n * batch]);

        let x = Array::from_vec(&ctx, contiguous, d.clone()).unwrap();
        let mut y = Array::new(&mut ctx, d.clone()).unwrap();
        mddft(&mut ctx, &pt(&[8]), batch, BatchLayout::contiguous(), &mut y, &x).unwrap();

        let xi = Array::from_vec(&ctx, interleaved, d.clone()).unwrap();
        let mut yi = Array::new(&mut ctx, d).unwrap();
        let layout = BatchLayout::new(Distribution::Interleaved, Distribution::Contiguous);
        mddft(&mut ctx, &pt(&[8]), batch, layout, &mut yi, &xi).unwrap();

        for (a, b) in y.as_slice().unwrap().iter().zip(yi.as_slice().unwrap()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-12);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mddft_size_mismatch() {
        let mut ctx = TraceContext::new();
        let x = Array::from_vec(&ctx, vec![c(0.0, 0.0); 8], domain(&[8])).unwrap();
        let mut y = Array::new(&mut ctx, domain(&[8])).unwrap();
        assert!(matches!(
            mddft(&mut ctx, &pt(&[8]), 2, BatchLayout::contiguous(), &mut y, &x),
            Err(FftxError::BufferSizeMismatch { expected: 16, actual: 8 })
        ));
        assert!(matches!(
            mddft(&mut ctx, &pt(&[8]), 0, BatchLayout::contiguous(), &mut y, &x),
            Err(FftxError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_prdft_round_trip_scales_by_size() {
        let mut ctx = TraceContext::new();
        let full = domain(&[4, 8]);
        let half = full.half_spectrum();
        let data: Vec<f64> = (0..32).map(|i| ((i * 7) % 11) as f64 - 5.0).collect();
        let x = Array::from_vec(&ctx, data.clone(), full.clone()).unwrap();
        let mut spec: Array<'_, Complex64> = Array::new(&mut ctx, half).unwrap();
        let mut back: Array<'_, f64> = Array::new(&mut ctx, full.clone()).unwrap();
        prdft(&mut ctx, &full.extents(), &mut spec, &x).unwrap();
        iprdft(&mut ctx, &full.extents(), &mut back, &spec).unwrap();
        for (a, b) in back.as_slice().unwrap().iter().zip(data.iter()) {
            assert_abs_diff_eq!(*a, 32.0 * b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_prdft_keeps_half_spectrum() {
        let mut ctx = TraceContext::new();
        let full = domain(&[8]);
        let data: Vec<f64> = (0..8).map(|i| (i as f64).sin()).collect();
        let x = Array::from_vec(&ctx, data.clone(), full.clone()).unwrap();
        let mut spec: Array<'_, Complex64> = Array::new(&mut ctx, full.half_spectrum()).unwrap();
        prdft(&mut ctx, &full.extents(), &mut spec, &x).unwrap();
        let complex: Vec<Complex64> = data.iter().map(|&v| c(v, 0.0)).collect();
        let expected = crate::ops::fft::fft(&complex).unwrap();
        assert_eq!(spec.size(), 5);
        for (a, b) in spec.as_slice().unwrap().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-12);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_resample_modes() {
        let mut ctx = TraceContext::new();
        let x = Array::from_vec(&ctx, vec![0.0f64; 4], domain(&[4])).unwrap();
        let mut y = Array::from_vec(&ctx, vec![0.0f64; 8], domain(&[8])).unwrap();
        assert!(matches!(
            resample(&mut ctx, &[0.5], &mut y, &x),
            Err(FftxError::ExecutionUnsupported("resample"))
        ));

        ctx.begin_trace().unwrap();
        let xs: Array<'_, f64> = Array::new(&mut ctx, domain(&[4, 4])).unwrap();
        let mut ys: Array<'_, f64> = Array::new(&mut ctx, domain(&[8, 8])).unwrap();
        assert!(resample(&mut ctx, &[0.5], &mut ys, &xs).is_err());
        resample(&mut ctx, &[0.5, 0.25], &mut ys, &xs).unwrap();
        assert_eq!(xs.id().unwrap(), VarId(1));
        assert!(ctx
            .script()
            .ends_with("    TDAGNode(TResample([8,8],[4,4],[0.50,0.25]),var_2,var_1),\n"));
    }
}
