//! Meshtune Performance Benchmarks
//!
//! - Fitness scoring
//! - Full search phase at default budget (must not starve a cooperative scheduler)
//! - Single learning episode

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshtune_common::MetricSnapshot;
use meshtune_optimizer::genetic::GaParams;
use meshtune_optimizer::learning::RlParams;
use meshtune_optimizer::{fitness, FitnessCalculator, GeneticOptimizer, RlAdapter, SimulationState};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_fitness(c: &mut Criterion) {
    c.bench_function("fitness", |b| {
        b.iter(|| fitness(black_box(0.6), black_box(0.85), black_box(200.0)))
    });
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for population in [25usize, 100, 400].iter() {
        group.bench_with_input(
            BenchmarkId::new("population", population),
            population,
            |b, &population| {
                let params = GaParams {
                    population_size: population,
                    ..GaParams::default()
                };
                b.iter(|| {
                    let optimizer = GeneticOptimizer::new(
                        params.clone(),
                        FitnessCalculator::default(),
                        125.0,
                        MetricSnapshot::default(),
                    )
                    .unwrap();
                    black_box(optimizer.run(&mut StdRng::seed_from_u64(1)))
                });
            },
        );
    }

    group.finish();
}

fn bench_episode(c: &mut Criterion) {
    let adapter = RlAdapter::new(RlParams::default(), FitnessCalculator::default());
    let mut sim = SimulationState::new(MetricSnapshot::default());
    adapter.seed_table(&mut sim).unwrap();
    let mut rng = StdRng::seed_from_u64(2);

    c.bench_function("episode_step", |b| {
        b.iter(|| black_box(adapter.step(&mut sim, &mut rng).unwrap()))
    });
}

criterion_group!(benches, bench_fitness, bench_search, bench_episode);
criterion_main!(benches);
