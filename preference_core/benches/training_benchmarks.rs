//! Performance benchmarks for model training and prediction
//!
//! Run with: cargo bench --bench training_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use preference_core::{
    Color, ColorSampler, GradientConfig, GradientPreferenceModel, PreferenceModel,
    RuleBasedPreferenceModel, SamplerConfig,
};

fn filled_gradient_model(examples: usize) -> GradientPreferenceModel {
    let mut model = GradientPreferenceModel::new(GradientConfig::default());
    let mut sampler = ColorSampler::new(SamplerConfig::default());
    for i in 0..examples {
        let color = sampler.random_color();
        model.add_example(color, (i % 2) as u8).unwrap();
    }
    model
}

/// Benchmark one training step at different buffer fills
fn bench_gradient_train_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient_train_step");

    for size in [10, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut model = filled_gradient_model(size);
            b.iter(|| black_box(model.train_step().unwrap()));
        });
    }

    group.finish();
}

fn bench_predictions(c: &mut Criterion) {
    let gradient = filled_gradient_model(100);
    let mut rule = RuleBasedPreferenceModel::default();
    let mut sampler = ColorSampler::new(SamplerConfig::default());
    for _ in 0..100 {
        let pair = sampler.sample();
        PreferenceModel::train_pair(&mut rule, pair.first(), pair.second()).unwrap();
    }

    let query = Color::new(120, 45, 200);
    c.bench_function("gradient_predict", |b| {
        b.iter(|| black_box(gradient.predict(black_box(query))));
    });
    c.bench_function("rule_predict", |b| {
        b.iter(|| black_box(rule.predict(black_box(query))));
    });
}

fn bench_sampler(c: &mut Criterion) {
    let mut sampler = ColorSampler::new(SamplerConfig::default());
    c.bench_function("sample_pair", |b| {
        b.iter(|| black_box(sampler.sample()));
    });
}

criterion_group!(
    benches,
    bench_gradient_train_step,
    bench_predictions,
    bench_sampler
);
criterion_main!(benches);
