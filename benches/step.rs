//! Criterion benchmark for one recurrence step on a 3-D grid.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use haydock::metric::CharacteristicField;
use haydock::{HaydockEngine, MetricBuilder};
use nalgebra::DVector;
use num_complex::Complex64;

fn sphere_metric(side: usize) -> haydock::Metric {
    let center = side as f64 / 2.0;
    let radius = side as f64 / 3.0;
    let characteristic = CharacteristicField::from_fn(&[side, side, side], |index| {
        let distance2: f64 = index
            .iter()
            .map(|&i| {
                let offset = i as f64 - center;
                offset * offset
            })
            .sum();
        if distance2 < radius * radius {
            1.0
        } else {
            0.0
        }
    })
    .expect("finite characteristic");
    MetricBuilder::new(vec![side; 3])
        .characteristic(characteristic)
        .build()
        .expect("consistent metric")
}

fn bench_step(c: &mut Criterion) {
    let metric = sphere_metric(24);
    let polarization = DVector::from_vec(vec![
        Complex64::new(1.0, 0.0),
        Complex64::new(0.0, 0.0),
        Complex64::new(0.0, 0.0),
    ]);

    c.bench_function("haydock_step_24cubed", |b| {
        b.iter_batched(
            || HaydockEngine::new(&metric, &polarization, 1e-10).expect("valid seed"),
            |mut engine| black_box(engine.step().expect("finite step")),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
