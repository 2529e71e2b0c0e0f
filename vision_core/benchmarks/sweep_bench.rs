use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use glam::Vec2;
use vision_core::{EntityId, PlayerId, VisibilityService, VisionSettings};

fn service_with_sources(source_count: u64) -> VisibilityService {
    let mut settings = VisionSettings::default();
    settings.bounds_min = [0.0, 0.0];
    settings.bounds_max = [512.0, 512.0];
    settings.cell_size = 2.0;
    let mut service = VisibilityService::new(Arc::new(settings));
    service.initialize().expect("bench settings are valid");

    for i in 0..source_count {
        let x = (i % 25) as f32 * 20.0 + 6.0;
        let z = (i / 25) as f32 * 20.0 + 6.0;
        service.register(EntityId(i), PlayerId((i % 2) as u32), Vec2::new(x, z), 18.0);
    }
    service
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    for count in [50u64, 150, 300] {
        group.bench_with_input(BenchmarkId::new("sources", count), &count, |b, &count| {
            b.iter_batched(
                || service_with_sources(count),
                |mut service| {
                    service.run_sweep_now(Instant::now());
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(sweep_benches, bench_sweep);
criterion_main!(sweep_benches);
