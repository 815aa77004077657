mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Vec2, Vec3};
use metaflux::field::{FieldKernel, FieldModel, BCOUNT};
use metaflux::grid::{sample_grid, GridSpec, Lattice, GSPAN_HISTORY};
use metaflux::pass::Execution;
use rand::rngs::StdRng;
use rand::{Rng as RngCore, SeedableRng};

const BALL_COUNTS: [usize; 3] = [1, 4, BCOUNT];

fn field_evaluate_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("field/evaluate");
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let points: Vec<Vec3> = (0..4096)
        .map(|_| {
            let r = |rng: &mut StdRng| (rng.next_u32() as f32 / u32::MAX as f32 - 0.5) * 20.0;
            Vec3::new(r(&mut rng), r(&mut rng), r(&mut rng))
        })
        .collect();
    group.throughput(common::elements_throughput(points.len()));

    for &count in &BALL_COUNTS {
        for (name, kernel) in [
            ("inverse_square", FieldKernel::default()),
            ("gaussian", FieldKernel::gaussian(2.0)),
        ] {
            let model = FieldModel::new(common::ring_of_balls(count, 4.0, 0.5), kernel);
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, _| {
                b.iter(|| {
                    let sum: f32 = points.iter().map(|&p| model.evaluate(p)).sum();
                    black_box(sum);
                });
            });
        }
    }

    group.finish();
}

fn grid_sampling_benches(c: &mut Criterion) {
    for execution in [Execution::Sequential, Execution::Parallel] {
        let mut group = c.benchmark_group(format!("grid/sample/{execution:?}").to_lowercase());
        let model = FieldModel::new(common::ring_of_balls(BCOUNT, 6.0, 0.5), FieldKernel::default());

        for &span in &GSPAN_HISTORY {
            let spec = GridSpec::new(span).with_spacing(20.0 / span as f32);
            let lattice = Lattice::build(spec, Vec3::ZERO, Vec2::ZERO);
            group.throughput(common::elements_throughput(spec.node_count()));
            group.bench_with_input(BenchmarkId::from_parameter(span), &span, |b, _| {
                b.iter(|| {
                    let samples = sample_grid(&model, &lattice, 0.02, execution);
                    black_box(samples.inside_count());
                });
            });
        }

        group.finish();
    }
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = field_evaluate_benches, grid_sampling_benches
}
criterion_main!(benches);
