//! Engines that run a transform over raw buffers.
//!
//! Every backend follows the calling contract of the generated code: output
//! buffers first, then inputs, then symbol buffers, all as `f64` slices with
//! complex data stored as interleaved `(re, im)` pairs.
//!
//! - `CompiledTransform`: a shared library produced from a traced script
//! - `ReferenceBatchDft`: the built-in radix-2 kernel, for cross-checking
//! - `ReferenceBatchPrdft`: the batched real operators, for real problems

pub mod compiled;
pub mod reference;

pub use compiled::CompiledTransform;
pub use reference::{ReferenceBatchDft, ReferenceBatchPrdft};

use crate::error::Result;

/// A transform callable through the fixed `(Y, X, symvar)` signature.
pub trait TransformBackend {
    /// Human-readable backend name for logs and reports.
    fn name(&self) -> &str;

    /// Run the transform, reading `inputs` and `symbols` and writing
    /// `outputs`.
    fn transform(
        &mut self,
        outputs: &mut [&mut [f64]],
        inputs: &[&[f64]],
        symbols: &[&[f64]],
    ) -> Result<()>;
}
