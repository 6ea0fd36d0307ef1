use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rigid2d::{Body, Constraint, Space, Vec2};

// --- Helper for creating chain benchmarks ---
fn build_pivot_chain(num_links: usize) -> Space {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0)).unwrap();
    space.set_iterations(8).unwrap();

    let link_length = 0.5;
    let anchor_pos = Vec2::new(0.0, 5.0);
    let mut last = space.add_body(Body::new_static().at(anchor_pos));
    let mut current_pos = anchor_pos;

    for _ in 0..num_links {
        current_pos.x += link_length;
        let link = space.add_body(Body::new(1.0, 0.05).unwrap().at(current_pos));
        let pivot = current_pos - Vec2::new(link_length / 2.0, 0.0);
        let joint = Constraint::pivot_joint(&space, last, link, pivot).unwrap();
        space.add_constraint(joint).unwrap();
        last = link;
    }
    space
}

// --- Helper for creating motor rigs: wheels geared to a driven hub ---
fn build_motor_rig(num_wheels: usize) -> Space {
    let mut space = Space::new();
    space.set_iterations(4).unwrap();

    let ground = space.add_body(Body::new_static());
    let hub = space.add_body(Body::new(1.0, 1.0).unwrap());
    space.add_constraint(Constraint::simple_motor(ground, hub, 2.0).unwrap()).unwrap();

    for i in 0..num_wheels {
        let pos = Vec2::new(i as f64 + 1.0, 0.0);
        let wheel = space.add_body(Body::new(1.0, 0.5).unwrap().at(pos));
        space.add_constraint(Constraint::pivot_joint(&space, ground, wheel, pos).unwrap()).unwrap();
        space.add_constraint(Constraint::gear_joint(hub, wheel, 0.0, 1.0 + i as f64 * 0.1).unwrap()).unwrap();
        space
            .add_constraint(Constraint::damped_rotary_spring(ground, wheel, 0.0, 5.0, 0.5).unwrap())
            .unwrap();
    }
    space
}

fn run_steps(space: &mut Space) {
    let dt = 1.0 / 60.0;
    let steps = 30;
    for _ in 0..steps {
        space.step(black_box(dt)).unwrap();
    }
}

// Benchmark for a chain of bodies linked by pivots
fn bench_pivot_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("pivot_chain");

    for num_links in [10, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(num_links), num_links, |b, &n| {
            b.iter(|| {
                let mut space = build_pivot_chain(black_box(n));
                run_steps(&mut space);
            });
        });
    }
    group.finish();
}

// Benchmark for motor-driven gear trains
fn bench_motor_rig(c: &mut Criterion) {
    let mut group = c.benchmark_group("motor_rig");

    for num_wheels in [10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(num_wheels), num_wheels, |b, &n| {
            b.iter(|| {
                let mut space = build_motor_rig(black_box(n));
                run_steps(&mut space);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pivot_chain, bench_motor_rig);
criterion_main!(benches);
