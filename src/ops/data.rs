//! Point-wise and box-movement operators.

use crate::array::Array;
use crate::dtype::Element;
use crate::error::{FftxError, Result};
use crate::shape::IndexBox;
use crate::trace::{DagNode, TraceContext};
use num_complex::Complex64;

fn same_domain(op: &'static str, expected: &IndexBox, actual: &IndexBox) -> Result<()> {
    if expected != actual {
        return Err(FftxError::DomainMismatch {
            op,
            expected: expected.clone(),
            actual: actual.clone(),
        });
    }
    Ok(())
}

/// Multiply `src` point-wise by a real symbol into `dst`.
///
/// While tracing, the symbol is read from the `symvar` parameter of the
/// generated entry point and only its size is recorded.
pub fn kernel_real(
    ctx: &mut TraceContext,
    symbol: &Array<'_, f64>,
    dst: &mut Array<'_, Complex64>,
    src: &Array<'_, Complex64>,
) -> Result<()> {
    same_domain("kernel_real", src.domain(), symbol.domain())?;
    same_domain("kernel_real", src.domain(), dst.domain())?;
    if ctx.is_tracing() {
        return ctx.emit(DagNode::RealDiag {
            symbol_size: symbol.size(),
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    let sym = symbol.as_slice()?;
    let input = src.as_slice()?;
    let output = dst.as_mut_slice()?;
    for ((o, i), s) in output.iter_mut().zip(input).zip(sym) {
        *o = *i * *s;
    }
    Ok(())
}

/// Multiply `src` point-wise by a complex symbol into `dst`.
pub fn kernel_complex(
    ctx: &mut TraceContext,
    symbol: &Array<'_, Complex64>,
    dst: &mut Array<'_, Complex64>,
    src: &Array<'_, Complex64>,
) -> Result<()> {
    same_domain("kernel_complex", src.domain(), symbol.domain())?;
    same_domain("kernel_complex", src.domain(), dst.domain())?;
    if ctx.is_tracing() {
        return ctx.emit(DagNode::ComplexDiag {
            symbol_size: symbol.size(),
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    let sym = symbol.as_slice()?;
    let input = src.as_slice()?;
    let output = dst.as_mut_slice()?;
    for ((o, i), s) in output.iter_mut().zip(input).zip(sym) {
        *o = *i * *s;
    }
    Ok(())
}

/// Zero `dst` and place `src` at the same points. The domain of `dst` must
/// contain the domain of `src`.
///
/// # Examples
///
/// ```
/// # use fftx_rs::{Array, IndexBox, Point, TraceContext};
/// # use fftx_rs::ops::zero_embed_box;
/// let mut ctx = TraceContext::new();
/// let small = IndexBox::from_extents(&[2]).unwrap();
/// let big = IndexBox::from_extents(&[4]).unwrap();
/// let src = Array::from_vec(&ctx, vec![1.0, 2.0], small).unwrap();
/// let mut dst = Array::from_vec(&ctx, vec![9.0; 4], big).unwrap();
/// zero_embed_box(&mut ctx, &mut dst, &src).unwrap();
/// assert_eq!(dst.as_slice().unwrap(), &[1.0, 2.0, 0.0, 0.0]);
/// ```
pub fn zero_embed_box<T: Element>(
    ctx: &mut TraceContext,
    dst: &mut Array<'_, T>,
    src: &Array<'_, T>,
) -> Result<()> {
    if !dst.domain().contains_box(src.domain()) {
        return Err(FftxError::DomainMismatch {
            op: "zero_embed_box",
            expected: dst.domain().clone(),
            actual: src.domain().clone(),
        });
    }
    if ctx.is_tracing() {
        return ctx.emit(DagNode::ZeroEmbedBox {
            extents: dst.domain().extents(),
            region: src.domain().clone(),
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    let outer = dst.domain().clone();
    let inner = src.domain().clone();
    let input = src.as_slice()?;
    let output = dst.as_mut_slice()?;
    output.fill(T::default());
    for (value, p) in input.iter().zip(inner.points()) {
        output[outer.position_of(&p)?] = *value;
    }
    Ok(())
}

/// Copy the points of `dst`'s domain out of `src`. The domain of `src` must
/// contain the domain of `dst`.
pub fn extract_box<T: Element>(
    ctx: &mut TraceContext,
    dst: &mut Array<'_, T>,
    src: &Array<'_, T>,
) -> Result<()> {
    if !src.domain().contains_box(dst.domain()) {
        return Err(FftxError::DomainMismatch {
            op: "extract_box",
            expected: src.domain().clone(),
            actual: dst.domain().clone(),
        });
    }
    if ctx.is_tracing() {
        return ctx.emit(DagNode::ExtractBox {
            extents: src.domain().extents(),
            region: dst.domain().clone(),
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    let outer = src.domain().clone();
    let inner = dst.domain().clone();
    let input = src.as_slice()?;
    let output = dst.as_mut_slice()?;
    for (value, p) in output.iter_mut().zip(inner.points()) {
        *value = input[outer.position_of(&p)?];
    }
    Ok(())
}

/// Copy `src` into `dst`. Both must share a domain.
pub fn copy<T: Element>(
    ctx: &mut TraceContext,
    dst: &mut Array<'_, T>,
    src: &Array<'_, T>,
) -> Result<()> {
    same_domain("copy", src.domain(), dst.domain())?;
    if ctx.is_tracing() {
        return ctx.emit(DagNode::Gather {
            extents: src.domain().extents(),
            dst: dst.id()?,
            src: src.id()?,
        });
    }
    let input = src.as_slice()?;
    dst.as_mut_slice()?.copy_from_slice(input);
    Ok(())
}
