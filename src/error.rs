//! Error type shared by geometry, tracing, execution and the FFT kernel.
//!
//! Every variant describes a caller contract violation or an environment
//! failure. Nothing here is transient: callers are expected to surface the
//! error, not retry.

use crate::shape::{IndexBox, Point};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FftxError>;

/// Errors raised by fftx-rs.
#[derive(Debug, Error)]
pub enum FftxError {
    /// A point or box was built with an unsupported number of axes.
    #[error("dimension {dim} is outside the supported range 1..={max}")]
    InvalidDimension { dim: usize, max: usize },

    /// Two geometric values of different dimensionality were combined.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A box whose low corner exceeds its high corner on some axis.
    #[error("invalid box: lo {lo} exceeds hi {hi} on axis {axis}")]
    InvalidBox { lo: Point, hi: Point, axis: usize },

    /// A point lookup fell outside the box it was resolved against.
    #[error("point {point} lies outside box {domain}")]
    PointOutsideBox { point: Point, domain: IndexBox },

    /// A position lookup fell outside `[0, size)`.
    #[error("position {position} out of range for box of size {size}")]
    PositionOutOfRange { position: usize, size: usize },

    /// Two arrays whose domains were required to agree did not.
    #[error("domain mismatch in {op}: {expected} vs {actual}")]
    DomainMismatch {
        op: &'static str,
        expected: IndexBox,
        actual: IndexBox,
    },

    /// A caller-supplied buffer does not match the domain it is bound to.
    #[error("buffer holds {actual} elements but the domain needs {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Caller buffers cannot be bound while a trace is being recorded.
    #[error("cannot bind a caller buffer while tracing is active")]
    BorrowWhileTracing,

    /// Real memory was requested from a symbolic (traced) array.
    #[error("array {0} is symbolic and has no memory")]
    NotMaterialized(String),

    /// A symbolic id was requested from an array that owns memory.
    #[error("array is not symbolic; variable ids exist only while tracing")]
    NotSymbolic,

    /// `begin_trace` was called while another trace was running.
    #[error("a trace is already active")]
    TraceAlreadyActive,

    /// An emission or closure was attempted with no active trace.
    #[error("no trace is active")]
    TraceNotActive,

    /// A variable declaration arrived after the DAG list was opened.
    #[error("cannot declare {0} after the DAG has been opened")]
    DeclarationInsideDag(String),

    /// An operand was not declared in the active trace.
    #[error("{0} was not declared in the current trace")]
    UndeclaredVariable(String),

    /// The DAG list was opened twice in one trace.
    #[error("the DAG has already been opened in this trace")]
    DagAlreadyOpen,

    /// FFT length is not a power of two.
    #[error("transform length {n} is not a power of two")]
    LengthNotPowerOfTwo { n: usize },

    /// A kernel lane is too short for the requested length and stride.
    #[error("lane {lane} holds {len} elements, needs at least {needed}")]
    LaneTooShort { lane: usize, len: usize, needed: usize },

    /// Batch count, extents or strides that cannot describe a layout.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// The operator only exists as a traced node.
    #[error("{0} cannot run in execution mode")]
    ExecutionUnsupported(&'static str),

    /// File output for scripts and interface stubs.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Dynamic loading of a compiled transform failed.
    #[error("library error: {0}")]
    Library(#[from] libloading::Error),

    /// Raw numeric buffers could not be reinterpreted.
    #[error("buffer cast failed: {0}")]
    Cast(String),
}

impl From<bytemuck::PodCastError> for FftxError {
    fn from(err: bytemuck::PodCastError) -> Self {
        FftxError::Cast(format!("{err:?}"))
    }
}
