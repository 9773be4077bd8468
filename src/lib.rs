//! # fftx-rs: traced FFT programs in Rust
//!
//! Describe a transform once and either run it on real memory or record it as
//! a script for an external optimizing code generator.
//!
//! ## Key Features
//!
//! - **Dual-mode operators**: the same calls execute or emit DAG nodes,
//!   selected by an explicit [`TraceContext`]
//! - **N-dimensional geometry**: [`Point`] and [`IndexBox`] with row- or
//!   column-major positions
//! - **Batched radix-2 FFT**: strided lanes, shared twiddle lookups, per-thread
//!   twiddle cache
//! - **Generated-code binding**: C interface stubs and a loader for the
//!   compiled result
//!
//! ## Quick Start
//!
//! ```rust
//! use fftx_rs::{close_dag, Array, Complex64, IndexBox, TraceContext};
//! use fftx_rs::ops::mddft;
//! use fftx_rs::trace::BatchLayout;
//!
//! let mut ctx = TraceContext::new();
//! ctx.begin_trace().unwrap();
//! let domain = IndexBox::from_extents(&[8, 8]).unwrap();
//! let x: Array<'_, Complex64> = Array::new(&mut ctx, domain.clone()).unwrap();
//! let mut y: Array<'_, Complex64> = Array::new(&mut ctx, domain.clone()).unwrap();
//! ctx.set_input(&x).unwrap();
//! ctx.set_output(&y).unwrap();
//! mddft(&mut ctx, &domain.extents(), 1, BatchLayout::contiguous(), &mut y, &x).unwrap();
//! let closed = close_dag(&mut ctx, &[y.id().unwrap(), x.id().unwrap()], "mddft8x8").unwrap();
//! assert!(closed.script().contains("MDDFT([8,8],-1)"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod array;
pub mod backend;
mod buffer;
pub mod config;
mod dtype;
pub mod error;
pub mod ops;
mod shape;
pub mod trace;

// Public exports
pub use array::Array;
pub use config::{IndexOrder, Truncation, BUILD_ORDER, BUILD_TRUNCATION};
pub use dtype::{DType, Element};
pub use error::{FftxError, Result};
pub use num_complex::Complex64;
pub use ops::fft::Direction;
pub use shape::{IndexBox, Point, MAX_DIM};
pub use trace::{close_dag, close_scalar_dag, ClosedTrace, InterfaceStub, TraceContext, VarId};
