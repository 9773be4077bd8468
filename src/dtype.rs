//! Element types that arrays may hold.

use num_complex::Complex64;
use std::fmt;

/// Numeric element kind of an array.
///
/// The generated interface stub passes every buffer as raw `double` data;
/// complex elements are laid out as interleaved `(re, im)` pairs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DType {
    /// 64-bit real
    Real,
    /// Pair of 64-bit reals
    Complex,
}

impl DType {
    /// Returns the number of `f64` values per element.
    #[inline]
    pub const fn doubles_per_element(self) -> usize {
        match self {
            DType::Real => 1,
            DType::Complex => 2,
        }
    }

    /// Returns the byte width of this dtype.
    #[inline]
    pub const fn byte_width(self) -> usize {
        self.doubles_per_element() * std::mem::size_of::<f64>()
    }

    /// C type name recorded in the generated interface stub.
    pub const fn c_name(self) -> &'static str {
        match self {
            DType::Real => "double",
            DType::Complex => "double _Complex",
        }
    }

    /// Returns the name of this dtype as a string.
    pub const fn as_str(self) -> &'static str {
        match self {
            DType::Real => "real",
            DType::Complex => "complex",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rust types that can be stored in an [`crate::Array`].
pub trait Element: Copy + Default + fmt::Debug + PartialEq + 'static {
    /// Kind tag of this element type.
    const DTYPE: DType;
}

impl Element for f64 {
    const DTYPE: DType = DType::Real;
}

impl Element for Complex64 {
    const DTYPE: DType = DType::Complex;
}
