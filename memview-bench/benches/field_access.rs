use criterion::*;

use memview::prelude::v1::*;
use memview_bench::*;

fn typed_walk(pool: &ParticlePool, indices: &[usize]) -> f32 {
    let mut total = 0.0;
    for &i in indices {
        let particle = pool.particle(i);
        total += particle.mass.get() * particle.position.element(0).get();
    }
    total
}

fn raw_walk(pool: &ParticlePool, indices: &[usize]) -> f32 {
    let mut total = 0.0;
    for &i in indices {
        let particle = unsafe { &*pool.raw(i) };
        total += particle.mass * particle.position[0];
    }
    total
}

fn typed_chase(pool: &ParticlePool, steps: usize) -> u32 {
    let mut particle = pool.particle(0);
    for _ in 0..steps {
        particle = unsafe { particle.next.indirection() }.to_strong();
    }
    particle.id.get()
}

fn raw_chase(pool: &ParticlePool, steps: usize) -> u32 {
    let mut particle = pool.raw(0);
    for _ in 0..steps {
        particle = unsafe { (*particle).next };
    }
    unsafe { (*particle).id }
}

fn typed_update(pool: &ParticlePool, indices: &[usize]) {
    for &i in indices {
        let mut particle = pool.particle(i);
        particle.mass *= 1.0001;
        particle.position[1] += 0.5;
    }
}

fn field_read(c: &mut Criterion) {
    let pool = ParticlePool::new(0x10000, 0x1234);

    let mut group = c.benchmark_group("field_read");
    for &count in [16usize, 256, 4096].iter() {
        let indices = pool.random_indices(count, count as u64);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("typed", count), &indices, |b, indices| {
            b.iter(|| black_box(typed_walk(&pool, indices)))
        });
        group.bench_with_input(BenchmarkId::new("raw", count), &indices, |b, indices| {
            b.iter(|| black_box(raw_walk(&pool, indices)))
        });
    }
    group.finish();
}

fn pointer_chase(c: &mut Criterion) {
    let pool = ParticlePool::new(0x1000, 0x5678);

    let mut group = c.benchmark_group("pointer_chase");
    for &steps in [64usize, 1024].iter() {
        group.throughput(Throughput::Elements(steps as u64));
        group.bench_with_input(BenchmarkId::new("typed", steps), &steps, |b, &steps| {
            b.iter(|| black_box(typed_chase(&pool, steps)))
        });
        group.bench_with_input(BenchmarkId::new("raw", steps), &steps, |b, &steps| {
            b.iter(|| black_box(raw_chase(&pool, steps)))
        });
    }
    group.finish();
}

fn field_write(c: &mut Criterion) {
    let pool = ParticlePool::new(0x1000, 0x9abc);
    let indices = pool.random_indices(1024, 1);

    c.bench_function("field_write", |b| {
        b.iter(|| typed_update(&pool, black_box(&indices)))
    });
}

criterion_group! {
    name = field_access;
    config = Criterion::default()
        .warm_up_time(std::time::Duration::from_millis(300))
        .measurement_time(std::time::Duration::from_millis(2700));
    targets = field_read, pointer_chase, field_write
}

criterion_main!(field_access);
