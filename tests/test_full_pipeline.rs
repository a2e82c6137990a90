//! Integration test: load → split → fit → evaluate

use notebook_ml::chapters::{preset, run_chapter, ChapterConfig, ChapterOutcome};
use notebook_ml::data::{CsvFormat, DataLoader, SplitStrategy, Splitter, Table};
use notebook_ml::evaluation::{Evaluation, Evaluator};
use notebook_ml::preprocessing::{apply_all, TermMatrixBuilder, Transform};
use notebook_ml::training::{Algorithm, CostMatrix, FitConfig, Fitter};
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("notebook_pipeline_{}_{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

fn credit(n: usize) -> Table {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let balances = ["< 0 DM", "1 - 200 DM", "> 200 DM", "unknown"];
    let histories = ["critical", "good", "poor", "perfect", "very good"];

    let mut checking = Vec::with_capacity(n);
    let mut history = Vec::with_capacity(n);
    let mut months = Vec::with_capacity(n);
    let mut amount = Vec::with_capacity(n);
    let mut default = Vec::with_capacity(n);
    for _ in 0..n {
        let b = rng.gen_range(0..balances.len());
        let h = rng.gen_range(0..histories.len());
        let m = rng.gen_range(4..72) as f64;
        let a = rng.gen_range(250..18000) as f64;
        let risk = if b < 2 { 0.35 } else { 0.1 } + if m > 36.0 { 0.2 } else { 0.0 };
        checking.push(balances[b]);
        history.push(histories[h]);
        months.push(m);
        amount.push(a);
        default.push(if rng.gen::<f64>() < risk { "yes" } else { "no" });
    }
    let df = df!(
        "checking_balance" => checking,
        "credit_history" => history,
        "months_loan_duration" => months,
        "amount" => amount,
        "default" => default
    )
    .unwrap();
    Table::from_frame(df).unwrap()
}

#[test]
fn test_credit_900_100_boosted_with_costs() {
    let table = credit(1000);
    let split = Splitter::split(
        &table,
        &SplitStrategy::Sample { train_size: 900, test_size: None, seed: 123 },
    )
    .unwrap();

    let config = FitConfig::new(Algorithm::DecisionTree, "default")
        .with_trials(10)
        .with_seed(123)
        .with_costs(CostMatrix::new(&["no", "yes"], vec![vec![0.0, 4.0], vec![1.0, 0.0]]));
    let model = Fitter::fit(&split.train, &config).unwrap();
    assert_eq!(model.n_train(), 900);

    let predictions = Evaluator::predict(&model, &split.test).unwrap();
    assert_eq!(predictions.len(), 100);

    let evaluation = Evaluator::score(&predictions).unwrap();
    let confusion = evaluation.confusion().unwrap();
    assert_eq!(confusion.total(), 100);
    assert!(confusion.levels().iter().all(|l| l == "yes" || l == "no"));
}

#[test]
fn test_wbcd_knn_on_normalized_features() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let n = 200;
    let mut radius = Vec::with_capacity(n);
    let mut area = Vec::with_capacity(n);
    let mut diagnosis = Vec::with_capacity(n);
    for i in 0..n {
        let malignant = i % 3 == 0;
        let r = if malignant { 17.0 } else { 12.0 } + rng.gen_range(-1.5..1.5);
        radius.push(r);
        area.push(r * r * 3.14 + rng.gen_range(-20.0..20.0));
        diagnosis.push(if malignant { "M" } else { "B" });
    }
    let ids: Vec<f64> = (0..n).map(|i| 800000.0 + i as f64).collect();
    let df = df!("id" => ids, "diagnosis" => diagnosis, "radius_mean" => radius, "area_mean" => area).unwrap();
    let table = Table::from_frame(df)
        .unwrap()
        .with_role("id", notebook_ml::data::ColumnRole::Identifier)
        .unwrap();

    let normalized = apply_all(
        &table,
        &[
            Transform::Recode {
                column: "diagnosis".to_string(),
                mapping: [("B", "Benign"), ("M", "Malignant")]
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            Transform::NormalizeMinMax { columns: Vec::new() },
        ],
    )
    .unwrap();

    let radius = normalized.numeric("radius_mean").unwrap();
    let min = radius.iter().copied().fold(f64::INFINITY, f64::min);
    let max = radius.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(min, 0.0);
    assert_eq!(max, 1.0);
    assert_eq!(normalized.levels("diagnosis").unwrap(), vec!["Benign", "Malignant"]);

    let split = Splitter::split(&normalized, &SplitStrategy::At { index: 150 }).unwrap();
    let model = Fitter::fit(&split.train, &FitConfig::new(Algorithm::Knn, "diagnosis").with_k(11)).unwrap();
    let evaluation = Evaluator::evaluate(&model, &split.test).unwrap();
    match evaluation {
        Evaluation::Classification { confusion, accuracy, .. } => {
            assert_eq!(confusion.total(), 50);
            assert!(accuracy > 0.9);
        }
        other => panic!("expected classification, got {:?}", other),
    }
}

#[test]
fn test_sms_naive_bayes_on_term_presence() {
    let spam = [
        "WINNER claim your free prize now",
        "free entry to win cash prize call now",
        "urgent claim your cash reward call now",
        "you have won a free prize call",
    ];
    let ham = [
        "are we still meeting for lunch today",
        "i will call you later tonight",
        "see you at lunch tomorrow",
        "can you pick up milk on the way home",
    ];
    let mut csv = String::from("type,text\n");
    for i in 0..40 {
        if i % 2 == 0 {
            csv.push_str(&format!("spam,{}\n", spam[(i / 2) % 4]));
        } else {
            csv.push_str(&format!("ham,{}\n", ham[(i / 2) % 4]));
        }
    }
    let path = temp_file("sms.csv", &csv);
    let table = DataLoader::new().load_csv(&path, &CsvFormat::new()).unwrap();
    let split = Splitter::split(&table, &SplitStrategy::At { index: 30 }).unwrap();

    let mut builder = TermMatrixBuilder::new("text").with_min_frequency(3);
    let train = builder.fit_transform(&split.train).unwrap();
    let test = builder.transform(&split.test).unwrap();
    assert!(builder.vocabulary().iter().any(|t| t == "prize"));
    assert!(!train.has_column("text"));

    let model = Fitter::fit(&train, &FitConfig::new(Algorithm::NaiveBayes, "type").with_laplace(1.0)).unwrap();
    let evaluation = Evaluator::evaluate(&model, &test).unwrap();
    let confusion = evaluation.confusion().unwrap();
    assert_eq!(confusion.total(), 10);
    assert_eq!(confusion.count("spam", "spam"), 5);
    std::fs::remove_file(path).ok();
}

fn insurance_csv(n: usize) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let regions = ["northeast", "northwest", "southeast", "southwest"];
    let mut csv = String::from("age,sex,bmi,children,smoker,region,expenses\n");
    for _ in 0..n {
        let age = rng.gen_range(18..65);
        let sex = if rng.gen::<bool>() { "male" } else { "female" };
        let bmi = rng.gen_range(16.0..48.0_f64);
        let children = rng.gen_range(0..5);
        let smoker = rng.gen::<f64>() < 0.25;
        let region = regions[rng.gen_range(0..4)];
        let obese = bmi >= 30.0;
        let expenses = 2000.0
            + 30.0 * (age * age) as f64
            + 500.0 * children as f64
            + if obese { 1000.0 } else { 0.0 }
            + if smoker { 13000.0 } else { 0.0 }
            + if smoker && obese { 20000.0 } else { 0.0 }
            + rng.gen_range(-500.0..500.0);
        csv.push_str(&format!(
            "{},{},{:.1},{},{},{},{:.2}\n",
            age,
            sex,
            bmi,
            children,
            if smoker { "yes" } else { "no" },
            region,
            expenses
        ));
    }
    csv
}

#[test]
fn test_insurance_preset_runs() {
    let path = temp_file("insurance.csv", &insurance_csv(300));
    let report = run_chapter(&preset("insurance", &path).unwrap()).unwrap();

    assert_eq!(report.rows, 300);
    match report.outcome {
        ChapterOutcome::Supervised { model_summary, evaluation, .. } => {
            assert!(model_summary.contains("bmi30_smoker"));
            let metrics = evaluation.regression().unwrap();
            assert_eq!(metrics.n, 300);
            assert!(metrics.correlation.unwrap() > 0.95);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    std::fs::remove_file(path).ok();
}

fn concrete_csv(n: usize) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut csv = String::from("cement,slag,ash,water,superplastic,coarseagg,fineagg,age,strength\n");
    for _ in 0..n {
        let cement = rng.gen_range(100.0..540.0_f64);
        let slag = rng.gen_range(0.0..360.0_f64);
        let ash = rng.gen_range(0.0..200.0_f64);
        let water = rng.gen_range(120.0..250.0_f64);
        let superplastic = rng.gen_range(0.0..32.0_f64);
        let coarse = rng.gen_range(800.0..1150.0_f64);
        let fine = rng.gen_range(590.0..1000.0_f64);
        let age = [3.0, 7.0, 14.0, 28.0, 56.0, 90.0][rng.gen_range(0..6)];
        let strength = 5.0 + 0.08 * cement + 0.04 * slag - 0.12 * water + 8.0 * f64::ln(age)
            + rng.gen_range(-2.0..2.0);
        csv.push_str(&format!(
            "{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{},{:.2}\n",
            cement, slag, ash, water, superplastic, coarse, fine, age, strength
        ));
    }
    csv
}

#[test]
fn test_concrete_preset_fits_neural_network() {
    let path = temp_file("concrete.csv", &concrete_csv(1030));
    let report = run_chapter(&preset("concrete", &path).unwrap()).unwrap();

    assert_eq!(report.rows, 1030);
    match report.outcome {
        ChapterOutcome::Supervised { train_rows, test_rows, model_summary, evaluation } => {
            assert_eq!((train_rows, test_rows), (773, 257));
            assert!(model_summary.contains("5 hidden"));
            let metrics = evaluation.regression().unwrap();
            assert!(metrics.correlation.unwrap() > 0.8);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    std::fs::remove_file(path).ok();
}

#[test]
fn test_chapter_from_json_config() {
    let data = temp_file("usedcars.csv", "year,price,model,transmission\n2011,21992,SEL,AUTO\n2010,17809,SE,AUTO\n2009,17500,SE,MANUAL\n");
    let json = format!(
        r#"{{
            "name": "usedcars",
            "dataset": {{ "path": {:?} }},
            "task": {{ "kind": "summary", "columns": ["price", "model"], "crosstab": ["model", "transmission"] }}
        }}"#,
        data.display().to_string()
    );
    let config = ChapterConfig::from_json(&json).unwrap();
    let report = run_chapter(&config).unwrap();

    match &report.outcome {
        ChapterOutcome::Summary { summaries, frequencies, crosstab } => {
            assert_eq!(summaries.len(), 1);
            assert_eq!(frequencies[0].0, "model");
            assert_eq!(crosstab.as_ref().unwrap().count("SE", "MANUAL"), 1);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(report.to_string().contains("usedcars"));
    std::fs::remove_file(data).ok();
}

#[test]
fn test_groceries_preset_measures_rules() {
    let path = temp_file(
        "groceries.csv",
        "herbs,root vegetables,whole milk\n\
         berries,whipped/sour cream,yogurt\n\
         other vegetables,tropical fruit,whole milk,root vegetables\n\
         yogurt,whole milk\n\
         herbs,root vegetables\n",
    );
    let report = run_chapter(&preset("groceries", &path).unwrap()).unwrap();
    match report.outcome {
        ChapterOutcome::Association { transactions, rules, .. } => {
            assert_eq!(transactions, 5);
            assert_eq!(rules.len(), 4);
            let herbs = &rules[0];
            assert_eq!(herbs.measures.count, 2);
            assert!((herbs.measures.confidence - 1.0).abs() < 1e-12);
            assert!(herbs.meets_thresholds);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_data_file_aborts_chapter() {
    let config = preset("wine", std::path::Path::new("/nonexistent/whitewines.csv")).unwrap();
    assert!(run_chapter(&config).is_err());
}
