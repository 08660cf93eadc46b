use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use sliding_mesh::prelude::*;

#[path = "../tests/util.rs"]
mod util;
use util::{RingSpec, serial_driver, serial_ring};

fn ring_spec(per_tag: usize, fixed_offset: f64) -> RingSpec {
    RingSpec {
        num_tags: 16,
        per_tag,
        num_fixed: 16 * per_tag + 3,
        fixed_offset,
        dof_sol: 4,
        ..RingSpec::default()
    }
}

fn bench_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("correspondence_refresh");

    for &per_tag in &[4usize, 16, 64] {
        let mut rng = SmallRng::seed_from_u64(11);
        let stator_pitch = std::f64::consts::TAU / (16 * per_tag + 3) as f64;
        // Stator turned by the same angle as the rotor, so no match crosses the seam.
        let angle = rng.gen_range(0.0..0.4 * stator_pitch);
        let ring = serial_ring(ring_spec(per_tag, angle));
        let mut driver = serial_driver(&ring, "gauss2");
        driver
            .advance(
                &ring.solution(0),
                &ring.velocity(0, 1.0, angle),
                &ring.displacement(0, angle),
            )
            .unwrap();

        group.bench_with_input(
            BenchmarkId::new("refresh_all", per_tag),
            &per_tag,
            |b, _| {
                b.iter(|| black_box(driver.refresh_correspondence().unwrap()));
            },
        );

        let solution = ring.solution(0);
        group.bench_with_input(
            BenchmarkId::new("update_solution", per_tag),
            &per_tag,
            |b, _| {
                b.iter(|| driver.update_solution(black_box(&solution)).unwrap());
            },
        );

        let n_fixed = driver.topology().fixed_elements(0).len();
        group.bench_with_input(
            BenchmarkId::new("evaluate_opposite", per_tag),
            &per_tag,
            |b, _| {
                let evaluator = driver.evaluator().unwrap();
                b.iter(|| {
                    for ee in 0..n_fixed {
                        for qq in 0..4 {
                            black_box(evaluator.evaluate_opposite(0, ee, qq).unwrap());
                        }
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_refresh);
criterion_main!(benches);
