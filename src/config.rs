//! Build-time layout configuration.
//!
//! The ordering of points inside a box and the axis that a real transform
//! truncates are fixed per build through Cargo features. Both choices are also
//! available as plain enums so the explicit-order APIs in [`crate::shape`]
//! can exercise either convention.

use std::fmt;

/// Linearization order of points inside a box.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndexOrder {
    /// Last axis changes fastest.
    RowMajor,
    /// First axis changes fastest.
    ColumnMajor,
}

impl IndexOrder {
    /// Returns all supported orders.
    pub fn all() -> &'static [IndexOrder] {
        &[IndexOrder::RowMajor, IndexOrder::ColumnMajor]
    }

    /// Returns the name of this order as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexOrder::RowMajor => "row-major",
            IndexOrder::ColumnMajor => "column-major",
        }
    }
}

impl fmt::Display for IndexOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IndexOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "row-major" => Ok(IndexOrder::RowMajor),
            "column-major" => Ok(IndexOrder::ColumnMajor),
            _ => Err(format!("Unknown index order: {}", s)),
        }
    }
}

/// Axis along which the complex output of a real transform is truncated
/// to `n/2 + 1` entries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Truncation {
    /// Truncate the last axis.
    Last,
    /// Truncate the first axis.
    First,
}

impl Truncation {
    /// Returns the truncated axis for a box of `dim` axes.
    pub fn axis(&self, dim: usize) -> usize {
        match self {
            Truncation::Last => dim.saturating_sub(1),
            Truncation::First => 0,
        }
    }

    /// Returns the name of this convention as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Truncation::Last => "last",
            Truncation::First => "first",
        }
    }
}

impl fmt::Display for Truncation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Truncation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last" => Ok(Truncation::Last),
            "first" => Ok(Truncation::First),
            _ => Err(format!("Unknown truncation axis: {}", s)),
        }
    }
}

/// Ordering used by every build-order API in this crate.
#[cfg(not(feature = "column-major"))]
pub const BUILD_ORDER: IndexOrder = IndexOrder::RowMajor;
/// Ordering used by every build-order API in this crate.
#[cfg(feature = "column-major")]
pub const BUILD_ORDER: IndexOrder = IndexOrder::ColumnMajor;

/// Truncation convention used for real-transform half spectra.
#[cfg(not(feature = "complex-trunc-first"))]
pub const BUILD_TRUNCATION: Truncation = Truncation::Last;
/// Truncation convention used for real-transform half spectra.
#[cfg(feature = "complex-trunc-first")]
pub const BUILD_TRUNCATION: Truncation = Truncation::First;
