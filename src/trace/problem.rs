//! Self-contained scripts for batches of one-dimensional DFTs.
//!
//! Unlike a traced DAG these problems are described by a handful of
//! parameters, so their scripts are produced directly without recording
//! any operators.

use crate::error::{FftxError, Result};
use crate::ops::fft::Direction;
use crate::trace::closer::{InterfaceStub, ENTRY_SUFFIX};
use crate::trace::ir::{BatchLayout, DagKind};
use std::fmt;

const FORWARD_DFT_SCRIPT: &str = "transform := let(\n         \
    TFCall(TRC(TTensorI(DFT(N, sign), B, read, write)),\n            \
    rec(fname := name, params := [])));\n";

const INVERSE_DFT_SCRIPT: &str = "\n    transform := let(\n        \
    TFCall(TRC(TTensorI(DFT(N, sign), B, read, write)),\n            \
    rec(fname := name, params := []))\n    );\n\n";

const FORWARD_PRDFT_SCRIPT: &str = "transform := let(\n         \
    TFCall(TTensorI(PRDFT(N, sign), B, read, write),\n            \
    rec(fname := name, params := [])));\n";

const INVERSE_PRDFT_SCRIPT: &str = "\n    transform := let(\n        \
    TFCall(TTensorI(IPRDFT(N, sign), B, read, write),\n            \
    rec(fname := name, params := []))\n    );\n\n";

/// Parameters shared by the complex and real batch problems.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BatchParams {
    name: String,
    n: usize,
    batch: usize,
    layout: BatchLayout,
    direction: Direction,
}

impl BatchParams {
    fn new(
        name: &str,
        n: usize,
        batch: usize,
        layout: BatchLayout,
        direction: Direction,
    ) -> Result<Self> {
        if n == 0 || batch == 0 {
            return Err(FftxError::InvalidLayout(format!(
                "batch problem needs positive length and count, got n = {}, batch = {}",
                n, batch
            )));
        }
        InterfaceStub::new(name, DagKind::Batched)?;
        Ok(Self { name: name.to_string(), n, batch, layout, direction })
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "N := {};", self.n)?;
        writeln!(f, "B := {};", self.batch)?;
        writeln!(f, "read := {};", self.layout.read)?;
        writeln!(f, "write := {};", self.layout.write)?;
        writeln!(f, "sign := {};", self.direction.sign())?;
        writeln!(f, "name := \"{}{}\";", self.name, ENTRY_SUFFIX)
    }
}

/// `batch` complex DFTs of length `n` with a read and write distribution.
///
/// # Examples
///
/// ```
/// # use fftx_rs::trace::{BatchDftProblem, BatchLayout, Distribution};
/// # use fftx_rs::Direction;
/// let p = BatchDftProblem::new("b1dft", 64, 4, BatchLayout::contiguous(), Direction::Forward).unwrap();
/// assert!(p.script().starts_with("N := 64;\nB := 4;\nread := APar;\n"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDftProblem {
    params: BatchParams,
}

impl BatchDftProblem {
    /// Describe a batch of DFTs. `n` and `batch` must be positive.
    pub fn new(
        name: &str,
        n: usize,
        batch: usize,
        layout: BatchLayout,
        direction: Direction,
    ) -> Result<Self> {
        Ok(Self { params: BatchParams::new(name, n, batch, layout, direction)? })
    }

    /// Transform length.
    pub fn len(&self) -> usize {
        self.params.n
    }

    /// Always false; a problem has at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of transforms.
    pub fn batch(&self) -> usize {
        self.params.batch
    }

    /// Read and write distributions.
    pub fn layout(&self) -> BatchLayout {
        self.params.layout
    }

    /// Transform direction.
    pub fn direction(&self) -> Direction {
        self.params.direction
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// Complex elements in each of the input and output buffers.
    pub fn buffer_len(&self) -> usize {
        self.params.n * self.params.batch
    }

    /// Interface stub of the generated code.
    pub fn stub(&self) -> Result<InterfaceStub> {
        InterfaceStub::new(&self.params.name, DagKind::Batched)
    }

    /// Script text describing the problem.
    pub fn script(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BatchDftProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.params.write_header(f)?;
        f.write_str(match self.params.direction {
            Direction::Forward => FORWARD_DFT_SCRIPT,
            Direction::Inverse => INVERSE_DFT_SCRIPT,
        })
    }
}

/// `batch` real DFTs of length `n`. The forward problem maps `n` reals per
/// lane to `n / 2 + 1` complex values; the inverse maps them back.
///
/// # Examples
///
/// ```
/// # use fftx_rs::trace::{BatchLayout, BatchPrdftProblem};
/// # use fftx_rs::Direction;
/// let p = BatchPrdftProblem::new("b1prdft", 8, 2, BatchLayout::contiguous(), Direction::Forward).unwrap();
/// assert_eq!((p.real_len(), p.spectrum_len()), (16, 10));
/// assert!(p.script().contains("TTensorI(PRDFT(N, sign), B, read, write)"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPrdftProblem {
    params: BatchParams,
}

impl BatchPrdftProblem {
    /// Describe a batch of real DFTs. `n` and `batch` must be positive.
    pub fn new(
        name: &str,
        n: usize,
        batch: usize,
        layout: BatchLayout,
        direction: Direction,
    ) -> Result<Self> {
        Ok(Self { params: BatchParams::new(name, n, batch, layout, direction)? })
    }

    /// Transform length on the real side.
    pub fn len(&self) -> usize {
        self.params.n
    }

    /// Always false; a problem has at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of transforms.
    pub fn batch(&self) -> usize {
        self.params.batch
    }

    /// Read and write distributions.
    pub fn layout(&self) -> BatchLayout {
        self.params.layout
    }

    /// Transform direction. Forward is real to complex.
    pub fn direction(&self) -> Direction {
        self.params.direction
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// Real elements in the real-side buffer.
    pub fn real_len(&self) -> usize {
        self.params.n * self.params.batch
    }

    /// Complex elements in the half-spectrum buffer.
    pub fn spectrum_len(&self) -> usize {
        (self.params.n / 2 + 1) * self.params.batch
    }

    /// Interface stub of the generated code.
    pub fn stub(&self) -> Result<InterfaceStub> {
        InterfaceStub::new(&self.params.name, DagKind::Batched)
    }

    /// Script text describing the problem.
    pub fn script(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BatchPrdftProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.params.write_header(f)?;
        f.write_str(match self.params.direction {
            Direction::Forward => FORWARD_PRDFT_SCRIPT,
            Direction::Inverse => INVERSE_PRDFT_SCRIPT,
        })
    }
}
