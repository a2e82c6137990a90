//! Tables, loaders and splitters
//!
//! Everything before model fitting: reading delimited files into a [`Table`],
//! reading basket files into a [`TransactionSet`], and partitioning tables
//! into train/test [`Split`]s.

mod loader;
mod splitter;
mod table;
mod transactions;

pub use loader::{CsvFormat, DataLoader, FileInfo};
pub use splitter::{Split, SplitStrategy, Splitter};
pub use table::{format_level, ColumnRole, Row, Table, Value};
pub use transactions::TransactionSet;
