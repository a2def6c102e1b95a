use std::time::Instant;

use crate::simulation::params::Parameters;
use crate::simulation::shapes::Circle;
use crate::simulation::states::NVec2;
use crate::simulation::world::World;

/// Helper to build a world of `n` unit-circle bodies scattered on a disk,
/// all drifting toward the center so the tick has real collision work to do
fn make_world(n: usize) -> World {
    let mut world = World::new(Parameters::default());

    for i in 0..n {
        let i_f = i as f64;
        // deterministic positions, no rand needed
        let x = NVec2::new((i_f * 0.37).sin() * 50.0, (i_f * 0.13).cos() * 50.0);

        let id = world.create_body();
        let _ = world.add_circle(id, Circle::new(NVec2::zeros(), 0.5, 1.0));
        if let Some(body) = world.body_mut(id) {
            body.position = x;
            body.velocity = -x * 0.05; // inward drift
            body.elasticity = 0.9;
        }
        let _ = world.add_body(id);
    }

    world
}

/// Benchmark one full collision tick for a range of world sizes
pub fn bench_update() {
    // Different world sizes to test
    let ns = [50, 100, 200, 400, 800, 1600];
    let ticks = 5; // updates per size (tune as needed)

    for n in ns {
        let mut world = make_world(n);

        // Warm up
        world.update(0.1);

        let t0 = Instant::now();
        for _ in 0..ticks {
            world.update(0.1);
        }
        let per_tick = t0.elapsed().as_secs_f64() / ticks as f64;

        println!("N = {n:5}, tick = {per_tick:8.6} s");
    }
}

/// Benchmark the tick for a smooth range of n
/// Paste output directly into excel to graph
pub fn bench_update_curve() {
    println!("N,tick_ms");

    for n in (50..=1600).step_by(50) {
        // Small n: average over a few ticks to smooth noise
        // Large n: only 1 tick to avoid minutes of runtime
        let ticks = if n <= 400 { 5 } else { 1 };

        let mut world = make_world(n);
        world.update(0.1); // warm-up

        let t0 = Instant::now();
        for _ in 0..ticks {
            world.update(0.1);
        }
        let ms = t0.elapsed().as_secs_f64() * 1000.0 / ticks as f64;

        println!("{n},{ms:.6}");
    }
}
