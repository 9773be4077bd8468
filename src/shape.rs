//! N-dimensional integer points and rectangular index boxes.
//!
//! Geometry values are small, immutable and cheap to clone. Dimensionality is
//! a runtime property bounded by [`MAX_DIM`]; all per-axis work is done with
//! plain loops over the axis count.

use crate::config::{IndexOrder, Truncation, BUILD_ORDER, BUILD_TRUNCATION};
use crate::error::{FftxError, Result};
use smallvec::SmallVec;
use std::fmt;
use std::ops::{Index, Mul};

/// Largest number of axes a point or box may carry.
pub const MAX_DIM: usize = 4;

type Coords = SmallVec<[i64; MAX_DIM]>;

fn check_dim(dim: usize) -> Result<()> {
    if dim == 0 || dim > MAX_DIM {
        return Err(FftxError::InvalidDimension { dim, max: MAX_DIM });
    }
    Ok(())
}

/// A tuple of integer coordinates in a `Z^D` index space.
///
/// # Examples
///
/// ```
/// # use fftx_rs::Point;
/// let p = Point::new(&[1, 2, 3]).unwrap();
/// assert_eq!(p.dim(), 3);
/// assert_eq!(p.flipped().as_slice(), &[3, 2, 1]);
/// assert_eq!(p.to_string(), "[1,2,3]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Point {
    coords: Coords,
}

impl Point {
    /// Create a point from its coordinates.
    pub fn new(coords: &[i64]) -> Result<Self> {
        check_dim(coords.len())?;
        Ok(Self { coords: SmallVec::from_slice(coords) })
    }

    /// Point with every coordinate equal to `value`.
    pub fn splat(dim: usize, value: i64) -> Result<Self> {
        check_dim(dim)?;
        Ok(Self { coords: SmallVec::from_elem(value, dim) })
    }

    /// Point with every coordinate equal to one.
    pub fn unit(dim: usize) -> Result<Self> {
        Self::splat(dim, 1)
    }

    /// Point with every coordinate equal to zero.
    pub fn zero(dim: usize) -> Result<Self> {
        Self::splat(dim, 0)
    }

    /// Returns the number of axes.
    #[inline]
    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    /// Returns the coordinates as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[i64] {
        &self.coords
    }

    /// Get a specific coordinate, or None if out of bounds.
    pub fn get(&self, axis: usize) -> Option<i64> {
        self.coords.get(axis).copied()
    }

    /// Multiply every coordinate by `factor`.
    pub fn scale(&self, factor: i64) -> Self {
        Self { coords: self.coords.iter().map(|c| c * factor).collect() }
    }

    /// Product of all coordinates.
    pub fn product(&self) -> i64 {
        self.coords.iter().product()
    }

    /// Drop the last coordinate.
    pub fn project(&self) -> Result<Self> {
        check_dim(self.dim() - 1)?;
        Ok(Self { coords: SmallVec::from_slice(&self.coords[..self.dim() - 1]) })
    }

    /// Drop the first coordinate.
    pub fn project_c(&self) -> Result<Self> {
        check_dim(self.dim() - 1)?;
        Ok(Self { coords: SmallVec::from_slice(&self.coords[1..]) })
    }

    /// Same coordinates in reverse axis order.
    pub fn flipped(&self) -> Self {
        Self { coords: self.coords.iter().rev().copied().collect() }
    }

    fn ensure_same_dim(&self, other: &Point) -> Result<()> {
        if self.dim() != other.dim() {
            return Err(FftxError::DimensionMismatch {
                expected: self.dim(),
                actual: other.dim(),
            });
        }
        Ok(())
    }
}

impl Index<usize> for Point {
    type Output = i64;

    fn index(&self, axis: usize) -> &i64 {
        &self.coords[axis]
    }
}

impl Mul<i64> for &Point {
    type Output = Point;

    fn mul(self, factor: i64) -> Point {
        self.scale(factor)
    }
}

impl Mul<i64> for Point {
    type Output = Point;

    fn mul(self, factor: i64) -> Point {
        self.scale(factor)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "]")
    }
}

/// An inclusive rectangular domain `[lo, hi]` on the integer lattice.
///
/// # Examples
///
/// ```
/// # use fftx_rs::{IndexBox, Point};
/// let b = IndexBox::new(
///     Point::new(&[1, 1]).unwrap(),
///     Point::new(&[4, 3]).unwrap(),
/// )
/// .unwrap();
/// assert_eq!(b.extents().as_slice(), &[4, 3]);
/// assert_eq!(b.size(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexBox {
    lo: Point,
    hi: Point,
}

impl IndexBox {
    /// Create a box from its low and high corners.
    pub fn new(lo: Point, hi: Point) -> Result<Self> {
        lo.ensure_same_dim(&hi)?;
        for axis in 0..lo.dim() {
            if lo[axis] > hi[axis] {
                return Err(FftxError::InvalidBox { lo, hi, axis });
            }
        }
        Ok(Self { lo, hi })
    }

    /// Zero-based box with the given extents.
    pub fn from_extents(extents: &[usize]) -> Result<Self> {
        check_dim(extents.len())?;
        let mut hi = Coords::new();
        for (axis, &n) in extents.iter().enumerate() {
            if n == 0 {
                return Err(FftxError::InvalidLayout(format!(
                    "extent on axis {} must be positive",
                    axis
                )));
            }
            hi.push(n as i64 - 1);
        }
        Self::new(Point::zero(extents.len())?, Point { coords: hi })
    }

    /// Low corner.
    #[inline]
    pub fn lo(&self) -> &Point {
        &self.lo
    }

    /// High corner.
    #[inline]
    pub fn hi(&self) -> &Point {
        &self.hi
    }

    /// Number of axes.
    #[inline]
    pub fn dim(&self) -> usize {
        self.lo.dim()
    }

    /// Length of the box along every axis.
    pub fn extents(&self) -> Point {
        Point {
            coords: (0..self.dim())
                .map(|d| self.hi[d] - self.lo[d] + 1)
                .collect(),
        }
    }

    /// Length of the box along one axis.
    #[inline]
    pub fn extent(&self, axis: usize) -> usize {
        (self.hi[axis] - self.lo[axis] + 1) as usize
    }

    /// Extents as unsigned lengths.
    pub fn lengths(&self) -> SmallVec<[usize; MAX_DIM]> {
        (0..self.dim()).map(|d| self.extent(d)).collect()
    }

    /// Number of points in the box.
    pub fn size(&self) -> usize {
        (0..self.dim()).map(|d| self.extent(d)).product()
    }

    /// Scale factor accumulated by an unnormalized forward/inverse pair
    /// over this box.
    pub fn normalization(&self) -> usize {
        self.size()
    }

    /// Returns true if `point` lies inside the box.
    pub fn contains(&self, point: &Point) -> bool {
        point.dim() == self.dim()
            && (0..self.dim())
                .all(|d| point[d] >= self.lo[d] && point[d] <= self.hi[d])
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &IndexBox) -> bool {
        self.contains(&other.lo) && self.contains(&other.hi)
    }

    /// Drop the leading axis of both corners.
    pub fn project_c(&self) -> Result<Self> {
        Ok(Self { lo: self.lo.project_c()?, hi: self.hi.project_c()? })
    }

    /// Complex-domain box of a real transform over this box, using the
    /// build-time truncation axis.
    pub fn half_spectrum(&self) -> Self {
        self.half_spectrum_along(BUILD_TRUNCATION)
    }

    /// Complex-domain box of a real transform, truncating along `truncation`.
    pub fn half_spectrum_along(&self, truncation: Truncation) -> Self {
        let axis = truncation.axis(self.dim());
        let mut hi = self.hi.clone();
        hi.coords[axis] = self.lo[axis] + (self.extent(axis) / 2) as i64;
        Self { lo: self.lo.clone(), hi }
    }

    /// Position of `point` in build order, starting from 0.
    pub fn position_of(&self, point: &Point) -> Result<usize> {
        self.position_in(point, BUILD_ORDER)
    }

    /// Point at `position` in build order. Inverse of [`Self::position_of`].
    pub fn point_at(&self, position: usize) -> Result<Point> {
        self.point_in(position, BUILD_ORDER)
    }

    /// Position of `point` under an explicit ordering.
    pub fn position_in(&self, point: &Point, order: IndexOrder) -> Result<usize> {
        if !self.contains(point) {
            return Err(FftxError::PointOutsideBox {
                point: point.clone(),
                domain: self.clone(),
            });
        }
        let offset = |d: usize| (point[d] - self.lo[d]) as usize;
        let dim = self.dim();
        let disp = match order {
            IndexOrder::RowMajor => (1..dim)
                .fold(offset(0), |disp, d| disp * self.extent(d) + offset(d)),
            IndexOrder::ColumnMajor => (0..dim - 1)
                .rev()
                .fold(offset(dim - 1), |disp, d| disp * self.extent(d) + offset(d)),
        };
        Ok(disp)
    }

    /// Point at `position` under an explicit ordering.
    pub fn point_in(&self, position: usize, order: IndexOrder) -> Result<Point> {
        let size = self.size();
        if position >= size {
            return Err(FftxError::PositionOutOfRange { position, size });
        }
        Ok(self.decode(position, order))
    }

    fn decode(&self, position: usize, order: IndexOrder) -> Point {
        let dim = self.dim();
        let mut coords: Coords = SmallVec::from_elem(0, dim);
        let mut disp = position;
        let mut step = |d: usize| {
            let n = self.extent(d);
            coords[d] = self.lo[d] + (disp % n) as i64;
            disp /= n;
        };
        match order {
            IndexOrder::RowMajor => (0..dim).rev().for_each(&mut step),
            IndexOrder::ColumnMajor => (0..dim).for_each(&mut step),
        }
        Point { coords }
    }

    /// Element stride of every axis when the box is laid out in `order`.
    pub fn strides(&self, order: IndexOrder) -> SmallVec<[usize; MAX_DIM]> {
        let dim = self.dim();
        let mut strides: SmallVec<[usize; MAX_DIM]> = SmallVec::from_elem(1, dim);
        match order {
            IndexOrder::RowMajor => {
                for d in (0..dim.saturating_sub(1)).rev() {
                    strides[d] = strides[d + 1] * self.extent(d + 1);
                }
            }
            IndexOrder::ColumnMajor => {
                for d in 1..dim {
                    strides[d] = strides[d - 1] * self.extent(d - 1);
                }
            }
        }
        strides
    }

    /// All points of the box, in build order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.size()).map(move |i| self.decode(i, BUILD_ORDER))
    }
}

impl fmt::Display for IndexBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.lo, self.hi)
    }
}
