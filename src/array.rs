//! Array descriptor binding a domain to memory or to a traced variable.

use crate::buffer::Storage;
use crate::config::{IndexOrder, BUILD_ORDER};
use crate::dtype::{DType, Element};
use crate::error::{FftxError, Result};
use crate::shape::{IndexBox, Point};
use crate::trace::{TraceContext, VarId};
use std::fmt;

/// An array over an [`IndexBox`].
///
/// While its context is tracing, an array is a symbolic placeholder named
/// `var_<id>` in the script. Otherwise it holds one element per point of
/// its domain, laid out in build order, either owned or borrowed from the
/// caller.
///
/// # Examples
///
/// ```
/// # use fftx_rs::{Array, IndexBox, TraceContext};
/// let ctx = TraceContext::new();
/// let domain = IndexBox::from_extents(&[2, 3]).unwrap();
/// let mut buf = vec![0.0f64; 6];
/// let mut a = Array::from_buffer(&ctx, &mut buf[..], domain).unwrap();
/// a.for_each_mut(|v, p| *v = (p[0] * 10 + p[1]) as f64).unwrap();
/// drop(a);
/// assert_eq!(buf, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
/// ```
#[derive(Debug)]
pub struct Array<'a, T: Element> {
    storage: Storage<'a, T>,
    domain: IndexBox,
}

impl<'a, T: Element> Array<'a, T> {
    /// Create an array over `domain`.
    ///
    /// When `ctx` is tracing this declares a fresh variable; otherwise it
    /// allocates zero-initialized memory.
    pub fn new(ctx: &mut TraceContext, domain: IndexBox) -> Result<Self> {
        if ctx.is_tracing() {
            let id = ctx.declare(&domain)?;
            return Ok(Self { storage: Storage::Symbolic(id), domain });
        }
        let storage = Storage::Owned(vec![T::default(); domain.size()]);
        Ok(Self { storage, domain })
    }

    /// Bind a caller buffer. The buffer must hold exactly one element per
    /// point of `domain`.
    pub fn from_buffer(ctx: &TraceContext, data: &'a mut [T], domain: IndexBox) -> Result<Self> {
        if ctx.is_tracing() {
            return Err(FftxError::BorrowWhileTracing);
        }
        check_len(data.len(), &domain)?;
        Ok(Self { storage: Storage::Borrowed(data), domain })
    }

    /// Take ownership of `data` as the contents of an array over `domain`.
    pub fn from_vec(ctx: &TraceContext, data: Vec<T>, domain: IndexBox) -> Result<Self> {
        if ctx.is_tracing() {
            return Err(FftxError::BorrowWhileTracing);
        }
        check_len(data.len(), &domain)?;
        Ok(Self { storage: Storage::Owned(data), domain })
    }

    /// Domain of the array.
    #[inline]
    pub fn domain(&self) -> &IndexBox {
        &self.domain
    }

    /// Element kind.
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.domain.size()
    }

    /// Variable id of a symbolic array.
    pub fn id(&self) -> Result<VarId> {
        self.storage.var_id().ok_or(FftxError::NotSymbolic)
    }

    /// Returns true if the array is a traced placeholder.
    pub fn is_symbolic(&self) -> bool {
        self.storage.var_id().is_some()
    }

    /// Returns true if the array frees its memory on drop.
    pub fn is_owned(&self) -> bool {
        self.storage.is_owned()
    }

    /// Exchange the contents and domains of two arrays.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Elements in build order.
    pub fn as_slice(&self) -> Result<&[T]> {
        match self.storage.as_slice() {
            Some(data) => Ok(data),
            None => Err(self.not_materialized()),
        }
    }

    /// Mutable elements in build order.
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        if let Some(id) = self.storage.var_id() {
            return Err(FftxError::NotMaterialized(id.to_string()));
        }
        match self.storage.as_mut_slice() {
            Some(data) => Ok(data),
            None => Err(FftxError::NotMaterialized(String::from("array"))),
        }
    }

    /// Copy of the elements.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        Ok(self.as_slice()?.to_vec())
    }

    /// Element at `point`.
    pub fn get(&self, point: &Point) -> Result<T> {
        let pos = self.domain.position_of(point)?;
        Ok(self.as_slice()?[pos])
    }

    /// Overwrite the element at `point`.
    pub fn set(&mut self, point: &Point, value: T) -> Result<()> {
        let pos = self.domain.position_of(point)?;
        self.as_mut_slice()?[pos] = value;
        Ok(())
    }

    /// Visit every element together with its point, in build order.
    pub fn for_each_mut<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut T, &Point),
    {
        let domain = self.domain.clone();
        let data = self.as_mut_slice()?;
        for (value, point) in data.iter_mut().zip(domain.points()) {
            f(value, &point);
        }
        Ok(())
    }

    /// Visit every element of `self` alongside the element of `other` at the
    /// same point. Both arrays must share a domain.
    pub fn zip_for_each_mut<U, F>(&mut self, other: &Array<'_, U>, mut f: F) -> Result<()>
    where
        U: Element,
        F: FnMut(&mut T, &U, &Point),
    {
        if self.domain != other.domain {
            return Err(FftxError::DomainMismatch {
                op: "zip_for_each_mut",
                expected: self.domain.clone(),
                actual: other.domain.clone(),
            });
        }
        let domain = self.domain.clone();
        let rhs = other.as_slice()?;
        let data = self.as_mut_slice()?;
        for ((value, r), point) in data.iter_mut().zip(rhs).zip(domain.points()) {
            f(value, r, &point);
        }
        Ok(())
    }

    /// Component `index` along the leading axis, as an array over the
    /// remaining axes.
    ///
    /// While tracing this declares a new variable aliasing the component.
    /// Otherwise it borrows the component's elements from `self`; that
    /// requires the leading axis to vary slowest, so it is only available in
    /// row-major builds.
    pub fn nth(&mut self, ctx: &mut TraceContext, index: usize) -> Result<Array<'_, T>> {
        let domain = self.domain.project_c()?;
        let count = self.domain.extent(0);
        if index >= count {
            return Err(FftxError::PositionOutOfRange { position: index, size: count });
        }
        if ctx.is_tracing() {
            let src = self.id()?;
            let id = ctx.declare_component(src, index, &domain)?;
            return Ok(Array { storage: Storage::Symbolic(id), domain });
        }
        if BUILD_ORDER != IndexOrder::RowMajor {
            return Err(FftxError::ExecutionUnsupported("nth"));
        }
        let len = domain.size();
        let data = self.as_mut_slice()?;
        let view = &mut data[index * len..(index + 1) * len];
        Ok(Array { storage: Storage::Borrowed(view), domain })
    }

    fn not_materialized(&self) -> FftxError {
        let name = match self.storage.var_id() {
            Some(id) => id.to_string(),
            None => String::from("array"),
        };
        FftxError::NotMaterialized(name)
    }
}

fn check_len(len: usize, domain: &IndexBox) -> Result<()> {
    let expected = domain.size();
    if len != expected {
        return Err(FftxError::BufferSizeMismatch { expected, actual: len });
    }
    Ok(())
}

impl<T: Element> fmt::Display for Array<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.storage.var_id() {
            Some(id) => write!(f, "{}:{}{}", id, self.dtype(), self.domain),
            None => write!(f, "Array:{}{}", self.dtype(), self.domain),
        }
    }
}
