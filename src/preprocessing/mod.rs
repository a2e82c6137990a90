//! Data preprocessing module
//!
//! Derived columns (scaling, squared terms, indicators, recoding) and the
//! text-to-term-matrix step used before fitting.

pub mod text;
pub mod transforms;

pub use text::{TermMatrixBuilder, TextCleaner};
pub use transforms::{apply_all, normalize_min_max, standardize, Transform};
