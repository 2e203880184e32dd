//! Tick loop benchmarks
//!
//! Run with: cargo bench --bench tick

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dtnsim::network::{ContactDetector, Node, Role};
use dtnsim::simulation::{SimConfig, Simulation};

fn scattered_nodes(count: u32, seed: u64) -> Vec<Node> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|id| {
            Node::new(
                id,
                rng.gen_range(10.0..1190.0),
                rng.gen_range(10.0..690.0),
                10.0,
                Role::Ordinary,
            )
        })
        .collect()
}

fn bench_contact_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("contact_detection");

    for count in [15u32, 100, 300] {
        let nodes = scattered_nodes(count, 7);
        let detector = ContactDetector::new(70.0);
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            b.iter(|| detector.detect(black_box(nodes)))
        });
    }

    group.finish();
}

fn bench_flooding_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("flooding_tick");

    for count in [6u32, 50, 100] {
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            let config = SimConfig::flooding().with_nodes(count).with_seed(42);
            let mut sim = match Simulation::initialize(config) {
                Ok(sim) => sim,
                Err(e) => panic!("bench config rejected: {e}"),
            };
            let _ = sim.start();
            for _ in 0..10 {
                let _ = sim.inject_random_message();
            }
            b.iter(|| black_box(sim.tick()))
        });
    }

    group.finish();
}

fn bench_single_target_run(c: &mut Criterion) {
    c.bench_function("single_target_500_ticks", |b| {
        b.iter(|| {
            let config = SimConfig::single_target().with_seed(3);
            let Ok(mut sim) = Simulation::initialize(config) else {
                return;
            };
            let _ = sim.start();
            for _ in 0..500 {
                if sim.tick().is_err() {
                    break;
                }
            }
            black_box(sim.stats());
        })
    });
}

criterion_group!(
    benches,
    bench_contact_detection,
    bench_flooding_tick,
    bench_single_target_run,
);

criterion_main!(benches);
