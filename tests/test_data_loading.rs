//! Integration test: loading delimited tables and basket files

use notebook_ml::data::{ColumnRole, CsvFormat, DataLoader};
use notebook_ml::NotebookError;
use std::path::PathBuf;

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("notebook_loading_{}_{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_csv_infers_roles() {
    let path = temp_file(
        "usedcars.csv",
        "year,model,price,mileage,color,transmission\n\
         2011,SEL,21992,7413,Yellow,AUTO\n\
         2011,SEL,20995,10926,Gray,AUTO\n\
         2011,SEL,19995,7351,Silver,AUTO\n\
         2010,SE,17809,11613,Gray,AUTO\n\
         2009,SE,17500,8367,White,MANUAL\n",
    );
    let table = DataLoader::new().load_csv(&path, &CsvFormat::new()).unwrap();

    assert_eq!(table.n_rows(), 5);
    assert_eq!(table.n_cols(), 6);
    assert_eq!(table.role("price"), Some(ColumnRole::Numeric));
    assert_eq!(table.role("model"), Some(ColumnRole::Categorical));
    assert_eq!(table.levels("transmission").unwrap(), vec!["AUTO", "MANUAL"]);
    assert_eq!(table.numeric("price").unwrap()[0], 21992.0);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_format_overrides_roles() {
    let path = temp_file(
        "wbcd.csv",
        "id,diagnosis,radius_mean,veil\n87139402,B,12.32,p\n8910251,B,10.6,p\n905520,M,11.04,p\n",
    );
    let format = CsvFormat::new()
        .with_identifier("id")
        .with_drop("veil");
    let table = DataLoader::new().load_csv(&path, &format).unwrap();

    assert_eq!(table.role("id"), Some(ColumnRole::Identifier));
    assert!(!table.has_column("veil"));
    assert_eq!(table.n_cols(), 3);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_numeric_codes_as_categorical() {
    let path = temp_file("credit.csv", "months,default\n6,1\n48,2\n12,1\n");
    let format = CsvFormat::new().with_categorical("default");
    let table = DataLoader::new().load_csv(&path, &format).unwrap();

    assert_eq!(table.role("default"), Some(ColumnRole::Categorical));
    assert_eq!(table.levels("default").unwrap(), vec!["1", "2"]);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_semicolon_delimiter() {
    let path = temp_file("wine.csv", "alcohol;quality\n9.4;5\n9.8;5\n10.5;6\n");
    let format = CsvFormat::new().with_delimiter(';');
    let table = DataLoader::new().load_csv(&path, &format).unwrap();

    assert_eq!(table.column_names(), vec!["alcohol", "quality"]);
    assert_eq!(table.numeric("quality").unwrap(), vec![5.0, 5.0, 6.0]);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_ragged_rows_rejected() {
    let path = temp_file("ragged.csv", "a,b,c\n1,2,3\n4,5\n");
    let result = DataLoader::new().load_csv(&path, &CsvFormat::new());
    assert!(matches!(result, Err(NotebookError::DataFormat(_))));
    std::fs::remove_file(path).ok();
}

#[test]
fn test_quote_inside_unquoted_field() {
    let path = temp_file("tvs.csv", "model,price\nTV 55\" screen,100\nradio,20\n");
    let table = DataLoader::new().load_csv(&path, &CsvFormat::new()).unwrap();

    assert_eq!(table.n_rows(), 2);
    assert_eq!(table.labels("model").unwrap(), vec!["TV 55\" screen", "radio"]);
    assert_eq!(table.numeric("price").unwrap(), vec![100.0, 20.0]);

    let info = DataLoader::new().file_info(&path, &CsvFormat::new()).unwrap();
    assert_eq!((info.n_rows, info.n_cols), (2, 2));
    std::fs::remove_file(path).ok();
}

#[test]
fn test_file_info_reports_ragged_rows() {
    let path = temp_file("ragged_info.csv", "a,b\n1,2\n3\n");
    let result = DataLoader::new().file_info(&path, &CsvFormat::new());
    assert!(matches!(result, Err(NotebookError::DataFormat(_))));
    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_file() {
    let result = DataLoader::new().load_csv("/nonexistent/notebook/data.csv", &CsvFormat::new());
    assert!(matches!(result, Err(NotebookError::DataFormat(_))));
}

#[test]
fn test_file_info() {
    let path = temp_file("info.csv", "x,y\n1,2\n3,4\n5,6\n");
    let info = DataLoader::new().file_info(&path, &CsvFormat::new()).unwrap();

    assert_eq!(info.n_rows, 3);
    assert_eq!(info.n_cols, 2);
    assert_eq!(info.columns, vec!["x", "y"]);
    assert!(info.file_size > 0);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_transactions() {
    let path = temp_file(
        "groceries.csv",
        "citrus fruit,semi-finished bread,margarine,ready soups\n\
         tropical fruit,yogurt,coffee\n\
         whole milk\n\
         \n\
         pip fruit,yogurt,cream cheese,meat spreads\n",
    );
    let baskets = DataLoader::new().load_transactions(&path, ',').unwrap();

    assert_eq!(baskets.len(), 4);
    assert!(baskets.items().contains("yogurt"));
    assert_eq!(baskets.baskets()[2].len(), 1);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_empty_basket_file() {
    let path = temp_file("empty_baskets.csv", "\n\n");
    let result = DataLoader::new().load_transactions(&path, ',');
    assert!(matches!(result, Err(NotebookError::DataFormat(_))));
    std::fs::remove_file(path).ok();
}
