//! Operators and the numeric kernel behind them.

pub mod data;
pub mod fft;
pub mod transform;
pub mod verify;

pub use data::{copy, extract_box, kernel_complex, kernel_real, zero_embed_box};
pub use transform::{imddft, imdprdft, iprdft, mddft, mdprdft, prdft, resample};
pub use verify::{compare_complex, compare_real, Comparison};
