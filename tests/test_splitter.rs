//! Integration test: train/test splitting

use notebook_ml::data::{SplitStrategy, Splitter, Table};
use notebook_ml::NotebookError;
use polars::prelude::*;
use std::collections::HashSet;

fn numbered(n: usize) -> Table {
    let ids: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let labels: Vec<&str> = (0..n).map(|i| if i % 3 == 0 { "yes" } else { "no" }).collect();
    Table::from_frame(df!("row" => ids, "default" => labels).unwrap()).unwrap()
}

#[test]
fn test_sample_900_of_1000() {
    let table = numbered(1000);
    let strategy = SplitStrategy::Sample { train_size: 900, test_size: None, seed: 123 };
    let split = Splitter::split(&table, &strategy).unwrap();

    assert_eq!(split.train.n_rows(), 900);
    assert_eq!(split.test.n_rows(), 100);
    assert!(split.covers(1000));

    let train: HashSet<usize> = split.train_indices.iter().copied().collect();
    assert!(split.test_indices.iter().all(|i| !train.contains(i)));
}

#[test]
fn test_sample_is_reproducible() {
    let table = numbered(200);
    let strategy = SplitStrategy::Sample { train_size: 150, test_size: None, seed: 7 };
    let a = Splitter::split(&table, &strategy).unwrap();
    let b = Splitter::split(&table, &strategy).unwrap();
    assert_eq!(a.train_indices, b.train_indices);
    assert_eq!(a.train.numeric("row").unwrap(), b.train.numeric("row").unwrap());

    let other = SplitStrategy::Sample { train_size: 150, test_size: None, seed: 8 };
    let c = Splitter::split(&table, &other).unwrap();
    assert_ne!(a.train_indices, c.train_indices);
}

#[test]
fn test_sample_with_test_size() {
    let table = numbered(100);
    let strategy = SplitStrategy::Sample { train_size: 60, test_size: Some(20), seed: 1 };
    let split = Splitter::split(&table, &strategy).unwrap();
    assert_eq!(split.train.n_rows(), 60);
    assert_eq!(split.test.n_rows(), 20);
    assert!(!split.covers(100));
}

#[test]
fn test_sample_sizes_that_overflow() {
    let table = numbered(100);
    let strategy = SplitStrategy::Sample { train_size: 10, test_size: Some(usize::MAX), seed: 1 };
    match Splitter::split(&table, &strategy) {
        Err(NotebookError::IndexOutOfRange { start, end, rows }) => {
            assert_eq!((start, end, rows), (0, usize::MAX, 100));
        }
        other => panic!("expected index error, got {:?}", other.map(|s| s.train_indices.len())),
    }
}

#[test]
fn test_sample_larger_than_table() {
    let table = numbered(10);
    let strategy = SplitStrategy::Sample { train_size: 11, test_size: None, seed: 1 };
    assert!(matches!(
        Splitter::split(&table, &strategy),
        Err(NotebookError::IndexOutOfRange { .. })
    ));
}

#[test]
fn test_split_at_keeps_order() {
    let table = numbered(569);
    let split = Splitter::split(&table, &SplitStrategy::At { index: 469 }).unwrap();

    assert_eq!(split.train.n_rows(), 469);
    assert_eq!(split.test.n_rows(), 100);
    assert_eq!(split.test.numeric("row").unwrap()[0], 469.0);
    assert_eq!(split.train.numeric("row").unwrap()[468], 468.0);
}

#[test]
fn test_split_at_out_of_range() {
    let table = numbered(50);
    let result = Splitter::split(&table, &SplitStrategy::At { index: 51 });
    match result {
        Err(NotebookError::IndexOutOfRange { start, end, rows }) => {
            assert_eq!((start, end, rows), (0, 51, 50));
        }
        other => panic!("expected index error, got {:?}", other.map(|s| s.train.n_rows())),
    }
}

#[test]
fn test_explicit_ranges() {
    let table = numbered(30);
    let strategy = SplitStrategy::Ranges { train: (10, 30), test: (0, 10) };
    let split = Splitter::split(&table, &strategy).unwrap();
    assert_eq!(split.train.n_rows(), 20);
    assert_eq!(split.test.numeric("row").unwrap()[9], 9.0);
}

#[test]
fn test_overlapping_ranges_rejected() {
    let table = numbered(30);
    let strategy = SplitStrategy::Ranges { train: (0, 20), test: (15, 30) };
    assert!(matches!(Splitter::split(&table, &strategy), Err(NotebookError::Config(_))));
}

#[test]
fn test_fraction_split() {
    let table = numbered(100);
    let strategy = SplitStrategy::Fraction { train_fraction: 0.75, seed: 42 };
    let split = Splitter::split(&table, &strategy).unwrap();
    assert_eq!(split.train.n_rows(), 75);
    assert_eq!(split.test.n_rows(), 25);
}
