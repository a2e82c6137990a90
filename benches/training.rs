use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use notebook_ml::data::Table;
use notebook_ml::training::{Algorithm, FitConfig, Fitter};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_credit_data(n_rows: usize) -> Table {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let balances = ["< 0 DM", "1 - 200 DM", "> 200 DM", "unknown"];

    let checking: Vec<&str> = (0..n_rows).map(|_| balances[rng.gen_range(0..4)]).collect();
    let months: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(4.0..72.0)).collect();
    let amount: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(250.0..18000.0)).collect();

    // Default risk rises with duration and a negative balance
    let default: Vec<&str> = checking
        .iter()
        .zip(&months)
        .map(|(b, m)| {
            let risk = if *b == "< 0 DM" { 0.4 } else { 0.15 } + m / 200.0;
            if rng.gen::<f64>() < risk { "yes" } else { "no" }
        })
        .collect();

    let df = df!(
        "checking_balance" => checking,
        "months_loan_duration" => months,
        "amount" => amount,
        "default" => default
    )
    .unwrap();
    Table::from_frame(df).unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [500, 1000, 5000].iter() {
        let table = create_credit_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("boosted_tree", n_rows), &table, |b, table| {
            let config = FitConfig::new(Algorithm::DecisionTree, "default").with_trials(10);
            b.iter(|| Fitter::fit(black_box(table), &config).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("naive_bayes", n_rows), &table, |b, table| {
            let config = FitConfig::new(Algorithm::NaiveBayes, "default").with_laplace(1.0);
            let categorical = table.drop("months_loan_duration").unwrap().drop("amount").unwrap();
            b.iter(|| Fitter::fit(black_box(&categorical), &config).unwrap())
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train model once
    let train = create_credit_data(2000);
    let config = FitConfig::new(Algorithm::Knn, "default").with_k(21);
    let model = Fitter::fit(&train, &config).unwrap();

    for n_rows in [100, 1000, 5000].iter() {
        let test = create_credit_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("knn", n_rows), &test, |b, table| {
            b.iter(|| model.predict(black_box(table)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
