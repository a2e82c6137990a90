//! Notebook chapters as configured pipeline runs

mod config;
mod presets;
mod runner;

pub use config::{ChapterConfig, ChapterTask, DatasetSource, RuleSpec, TextStep};
pub use presets::{preset, PRESETS};
pub use runner::{run_chapter, ChapterOutcome, ChapterReport, MeasuredRule};
