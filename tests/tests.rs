use circsim::simulation::params::Parameters;
use circsim::simulation::shapes::Circle;
use circsim::simulation::states::{BodyId, BodyStore, NVec2};
use circsim::simulation::world::World;
use circsim::{time_of_impact, Scenario, ScenarioConfig};

use approx::assert_relative_eq;
use std::f64::consts::{FRAC_PI_2, PI};

/// Build one root body carrying a single unit-density circle of `radius`
/// centered on the body origin
pub fn circle_body(
    world: &mut World,
    radius: f64,
    position: NVec2,
    velocity: NVec2,
    elasticity: f64,
) -> BodyId {
    let id = world.create_body();
    world
        .add_circle(id, Circle::new(NVec2::zeros(), radius, 1.0))
        .unwrap();
    let body = world.body_mut(id).unwrap();
    body.position = position;
    body.velocity = velocity;
    body.elasticity = elasticity;
    world.add_body(id).unwrap();
    id
}

/// Default physics parameters for tests
pub fn test_params() -> Parameters {
    Parameters::default()
}

/// x-momentum over the root bodies, using the masses cached by the last tick
fn momentum_x(world: &World, ids: &[BodyId]) -> f64 {
    ids.iter()
        .map(|&id| {
            let b = world.body(id).unwrap();
            b.mass() * b.velocity.x
        })
        .sum()
}

// ==================================================================================
// Collision math tests
// ==================================================================================

#[test]
fn toi_contact_distance_is_exact() {
    let pos_a = NVec2::new(-3.0, 0.5);
    let vel_a = NVec2::new(2.0, -0.25);
    let pos_b = NVec2::new(4.0, -1.0);
    let vel_b = NVec2::new(-1.0, 0.5);
    let (radius_a, radius_b) = (1.0, 0.75);
    let interval = 5.0;

    let fraction = time_of_impact(pos_a, radius_a, vel_a, pos_b, radius_b, vel_b, interval)
        .expect("converging pair must collide");
    assert!((0.0..=1.0).contains(&fraction));

    // at the reported instant the surfaces just touch
    let dt = fraction * interval;
    let gap = ((pos_a + vel_a * dt) - (pos_b + vel_b * dt)).norm();
    assert_relative_eq!(gap, radius_a + radius_b, max_relative = 1e-9);
}

#[test]
fn toi_none_for_diverging_and_out_of_range() {
    // moving apart
    assert!(time_of_impact(
        NVec2::zeros(),
        1.0,
        NVec2::new(-1.0, 0.0),
        NVec2::new(5.0, 0.0),
        1.0,
        NVec2::new(1.0, 0.0),
        10.0,
    )
    .is_none());

    // converging, but the interval ends before contact
    assert!(time_of_impact(
        NVec2::zeros(),
        1.0,
        NVec2::new(1.0, 0.0),
        NVec2::new(10.0, 0.0),
        1.0,
        NVec2::zeros(),
        1.0,
    )
    .is_none());
}

// ==================================================================================
// Derived property tests
// ==================================================================================

/// Build the same two-circle-plus-child body with components inserted in the
/// given orders; derived properties must not depend on insertion order
fn assembled_body(circles_reversed: bool, child_first: bool) -> (BodyStore, BodyId) {
    let mut store = BodyStore::new();
    let root = store.create();
    let child = store.create();

    let mut circles = vec![
        Circle::new(NVec2::new(1.0, 0.0), 1.0, 1.0),
        Circle::new(NVec2::new(-2.0, 0.5), 0.5, 2.0),
    ];
    if circles_reversed {
        circles.reverse();
    }

    let attach_child = |store: &mut BodyStore| {
        store.add_child(root, child).unwrap();
        store
            .add_circle(child, Circle::new(NVec2::zeros(), 1.0, 1.0))
            .unwrap();
        store.get_mut(child).unwrap().position = NVec2::new(0.0, 3.0);
    };

    if child_first {
        attach_child(&mut store);
    }
    for circle in circles {
        store.add_circle(root, circle).unwrap();
    }
    if !child_first {
        attach_child(&mut store);
    }

    store.update_mass(root);
    store.update_center_of_mass(root);
    store.update_moment_of_inertia(root);
    (store, root)
}

#[test]
fn derived_properties_ignore_insertion_order() {
    let (store_a, root_a) = assembled_body(false, false);
    let (store_b, root_b) = assembled_body(true, true);

    let a = store_a.get(root_a).unwrap();
    let b = store_b.get(root_b).unwrap();

    assert_relative_eq!(a.mass(), b.mass(), max_relative = 1e-12);
    assert_relative_eq!(
        a.center_of_mass().x,
        b.center_of_mass().x,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        a.center_of_mass().y,
        b.center_of_mass().y,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        a.moment_of_inertia(),
        b.moment_of_inertia(),
        max_relative = 1e-12
    );
}

#[test]
fn world_position_composes_two_levels() {
    let mut store = BodyStore::new();
    let grandparent = store.create();
    let parent = store.create();
    let child = store.create();
    store.add_child(grandparent, parent).unwrap();
    store.add_child(parent, child).unwrap();

    {
        let g = store.get_mut(grandparent).unwrap();
        g.angle = FRAC_PI_2;
        g.scale = 2.0;
    }
    {
        let p = store.get_mut(parent).unwrap();
        p.position = NVec2::new(1.0, 0.0);
        p.angle = FRAC_PI_2;
    }
    store.get_mut(child).unwrap().position = NVec2::new(1.0, 0.0);

    // parent: (1,0) scaled to (2,0), quarter turn -> (0,2)
    // child: (1,0) scaled to (2,0), half turn -> (-2,0), shifted -> (-2,2)
    let p = store.world_position(child);
    assert_relative_eq!(p.x, -2.0, epsilon = 1e-12);
    assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    assert_relative_eq!(store.world_angle(child), PI, epsilon = 1e-12);
    assert_relative_eq!(store.world_scale(child), 2.0, epsilon = 1e-12);
}

// ==================================================================================
// World update tests
// ==================================================================================

#[test]
fn head_on_equal_mass_elastic_swap() {
    // A moves at 1 toward a resting B five units away; contact at t = 3 when
    // the center gap closes to the radius sum, then the velocities swap
    let mut world = World::new(test_params());
    let a = circle_body(&mut world, 1.0, NVec2::zeros(), NVec2::new(1.0, 0.0), 1.0);
    let b = circle_body(&mut world, 1.0, NVec2::new(5.0, 0.0), NVec2::zeros(), 1.0);

    world.update(10.0);

    let body_a = world.body(a).unwrap();
    let body_b = world.body(b).unwrap();

    // A stops where it hit; B carries the motion for the remaining 7 seconds
    assert_relative_eq!(body_a.position.x, 3.0, max_relative = 1e-9);
    assert_relative_eq!(body_a.velocity.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(body_b.position.x, 12.0, max_relative = 1e-9);
    assert_relative_eq!(body_b.velocity.x, 1.0, max_relative = 1e-9);
}

#[test]
fn momentum_conserved_for_unequal_masses() {
    let mut world = World::new(test_params());
    let a = circle_body(&mut world, 1.0, NVec2::zeros(), NVec2::new(1.0, 0.0), 1.0);
    let b = circle_body(&mut world, 2.0, NVec2::new(6.0, 0.0), NVec2::zeros(), 1.0);

    world.update(10.0);

    let ids = [a, b];
    // masses are pi and 4*pi; total momentum started at pi * 1
    assert_relative_eq!(momentum_x(&world, &ids), PI, max_relative = 1e-9);
    // the heavier body must have been pushed forward
    assert!(world.body(b).unwrap().velocity.x > 0.0);
    // elastic collision against a heavier body reverses the light one
    assert!(world.body(a).unwrap().velocity.x < 0.0);
}

#[test]
fn inelastic_pair_moves_together() {
    // restitution is the minimum of the two elasticities
    let mut world = World::new(test_params());
    let a = circle_body(&mut world, 1.0, NVec2::zeros(), NVec2::new(1.0, 0.0), 0.0);
    let b = circle_body(&mut world, 1.0, NVec2::new(5.0, 0.0), NVec2::zeros(), 1.0);

    world.update(10.0);

    let va = world.body(a).unwrap().velocity.x;
    let vb = world.body(b).unwrap().velocity.x;
    assert_relative_eq!(va, 0.5, max_relative = 1e-9);
    assert_relative_eq!(vb, 0.5, max_relative = 1e-9);
    // still just touching after drifting together for the rest of the tick
    let gap = world.body(b).unwrap().position.x - world.body(a).unwrap().position.x;
    assert_relative_eq!(gap, 2.0, max_relative = 1e-9);
}

#[test]
fn off_center_hit_spins_the_target() {
    let mut world = World::new(test_params());

    // projectile flying along y = 1
    let a = circle_body(
        &mut world,
        1.0,
        NVec2::new(-5.0, 1.0),
        NVec2::new(1.0, 0.0),
        1.0,
    );

    // two-lobed target centered at the origin, at rest
    let b = world.create_body();
    world
        .add_circle(b, Circle::new(NVec2::new(0.0, 1.0), 1.0, 1.0))
        .unwrap();
    world
        .add_circle(b, Circle::new(NVec2::new(0.0, -1.0), 1.0, 1.0))
        .unwrap();
    world.body_mut(b).unwrap().elasticity = 1.0;
    world.add_body(b).unwrap();

    world.update(10.0);

    let body_a = world.body(a).unwrap();
    let body_b = world.body(b).unwrap();

    // hitting the upper lobe torques the target clockwise
    assert!(body_b.angular_velocity < 0.0, "target did not spin");
    assert!(body_b.velocity.x > 0.0, "target was not pushed forward");
    // the impulse passes through the projectile's own center: no spin there
    assert_relative_eq!(body_a.angular_velocity, 0.0, epsilon = 1e-9);
    // head-on component only, so y-velocities stay zero
    assert_relative_eq!(body_a.velocity.y, 0.0, epsilon = 1e-9);
    assert_relative_eq!(body_b.velocity.y, 0.0, epsilon = 1e-9);
    // linear momentum balances (masses are pi and 2*pi)
    assert_relative_eq!(momentum_x(&world, &[a, b]), PI, max_relative = 1e-9);
}

#[test]
fn blacklisted_pair_passes_through() {
    let mut world = World::new(test_params());
    let a = circle_body(&mut world, 1.0, NVec2::zeros(), NVec2::new(1.0, 0.0), 1.0);
    let b = circle_body(&mut world, 1.0, NVec2::new(5.0, 0.0), NVec2::zeros(), 1.0);

    let group = world.new_collision_group();
    world.body_mut(a).unwrap().add_collision_blacklist_group(group);
    world.body_mut(b).unwrap().add_collision_blacklist_group(group);

    world.update(10.0);

    // no event fired: A sailed straight through B
    assert_relative_eq!(world.body(a).unwrap().position.x, 10.0, max_relative = 1e-12);
    assert_relative_eq!(world.body(a).unwrap().velocity.x, 1.0, max_relative = 1e-12);
    assert_relative_eq!(world.body(b).unwrap().position.x, 5.0, max_relative = 1e-12);
    assert_relative_eq!(world.body(b).unwrap().velocity.x, 0.0, epsilon = 1e-12);
}

#[test]
fn friction_brings_body_to_rest() {
    let params = Parameters {
        linear_friction: 1.0,
        ..Parameters::default()
    };
    let mut world = World::new(params);
    let id = circle_body(&mut world, 1.0, NVec2::zeros(), NVec2::new(2.0, 0.0), 1.0);

    // friction is applied up front each tick: 2 -> 1 -> 0
    world.update(1.0);
    assert_relative_eq!(world.body(id).unwrap().velocity.x, 1.0, max_relative = 1e-12);
    assert_relative_eq!(world.body(id).unwrap().position.x, 1.0, max_relative = 1e-12);

    world.update(1.0);
    assert_eq!(world.body(id).unwrap().velocity, NVec2::zeros());
    assert_relative_eq!(world.body(id).unwrap().position.x, 1.0, max_relative = 1e-12);
}

#[test]
fn acceleration_applies_once_then_clears() {
    let mut world = World::new(test_params());
    let id = circle_body(&mut world, 1.0, NVec2::zeros(), NVec2::zeros(), 1.0);
    world.body_mut(id).unwrap().acceleration = NVec2::new(3.0, 0.0);

    world.update(1.0);
    let body = world.body(id).unwrap();
    assert_relative_eq!(body.velocity.x, 3.0, max_relative = 1e-12);
    assert_eq!(body.acceleration, NVec2::zeros());

    // the next tick must not apply it again
    world.update(1.0);
    assert_relative_eq!(world.body(id).unwrap().velocity.x, 3.0, max_relative = 1e-12);
}

// ==================================================================================
// Scenario tests
// ==================================================================================

#[test]
fn scenario_builds_world_from_yaml() {
    let yaml = r#"
parameters:
  t_end: 2.0
  tick_interval: 0.5

bodies:
  - position: [ -5.0, 0.0 ]
    velocity: [  1.0, 0.0 ]
    elasticity: 1.0
    groups: [ 7 ]
    circles:
      - position: [ 0.0, 0.0 ]
        radius: 1.0
  - position: [ 5.0, 0.0 ]
    groups: [ 7 ]
    circles:
      - position: [ 0.0, 0.0 ]
        radius: 1.0
    children:
      - position: [ 0.0, 3.0 ]
        circles:
          - position: [ 0.0, 0.0 ]
            radius: 1.0
"#;

    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    let mut scenario = Scenario::build_scenario(cfg).unwrap();
    assert_eq!(scenario.world.bodies().len(), 2);
    assert_relative_eq!(scenario.t_end, 2.0);
    assert_relative_eq!(scenario.tick_interval, 0.5);

    let roots: Vec<BodyId> = scenario.world.bodies().to_vec();
    scenario.world.update(scenario.tick_interval);

    // the second root aggregates its child: two unit circles
    let compound = scenario.world.body(roots[1]).unwrap();
    assert_relative_eq!(compound.mass(), 2.0 * PI, max_relative = 1e-12);
    assert_relative_eq!(compound.center_of_mass().y, 1.5, max_relative = 1e-12);

    // both roots share group 7: they must never collide
    let mover = scenario.world.body(roots[0]).unwrap();
    assert_relative_eq!(mover.velocity.x, 1.0, max_relative = 1e-12);
}
