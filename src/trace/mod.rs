//! Tracing: recording operator calls as a transform script.
//!
//! While a [`TraceContext`] is active, arrays are symbolic and each
//! operator appends one node to the script instead of computing. Closing
//! the trace yields the full script and the C interface of the code that
//! will be generated from it.

pub mod closer;
pub mod ir;
pub mod problem;
pub mod tracer;

pub use closer::{close_dag, close_scalar_dag, ClosedTrace, InterfaceStub, ENTRY_SUFFIX};
pub use ir::{BatchLayout, DagKind, DagNode, Distribution, VarId};
pub use problem::{BatchDftProblem, BatchPrdftProblem};
pub use tracer::{TraceContext, TraceState};
