//! Build fully-initialized simulation worlds from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime bundle
//! (`Scenario`) containing:
//! - the populated collision `World` with every root body registered
//! - the run length (`t_end`) and per-update tick length (`tick_interval`)
//!
//! Body trees are built recursively; scenario-local `groups` labels are
//! mapped to world blacklist group ids on first sight, so two bodies sharing
//! a label end up in the same group.

use std::collections::HashMap;

use crate::configuration::config::{BodyConfig, ScenarioConfig};
use crate::simulation::params::Parameters;
use crate::simulation::shapes::Circle;
use crate::simulation::states::{BodyError, BodyId, NVec2};
use crate::simulation::world::World;

/// A fully-initialized simulation run: the world plus its tick schedule.
pub struct Scenario {
    pub world: World,
    pub t_end: f64,
    pub tick_interval: f64,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, BodyError> {
        let parameters = Parameters {
            linear_friction: cfg.parameters.linear_friction,
            angular_friction: cfg.parameters.angular_friction,
            sleep_epsilon: cfg.parameters.sleep_epsilon,
        };

        let mut world = World::new(parameters);
        let mut groups: HashMap<u64, u64> = HashMap::new();
        for body_cfg in &cfg.bodies {
            let id = build_body(&mut world, body_cfg, &mut groups)?;
            world.add_body(id)?;
        }

        Ok(Self {
            world,
            t_end: cfg.parameters.t_end,
            tick_interval: cfg.parameters.tick_interval,
        })
    }
}

/// Create one body (and, recursively, its children) in the world.
fn build_body(
    world: &mut World,
    cfg: &BodyConfig,
    groups: &mut HashMap<u64, u64>,
) -> Result<BodyId, BodyError> {
    let id = world.create_body();

    for circle_cfg in &cfg.circles {
        world.add_circle(
            id,
            Circle::new(
                NVec2::new(circle_cfg.position[0], circle_cfg.position[1]),
                circle_cfg.radius,
                circle_cfg.density,
            ),
        )?;
    }

    // resolve scenario-local group labels before borrowing the body
    let group_ids: Vec<u64> = cfg
        .groups
        .iter()
        .map(|&label| {
            *groups
                .entry(label)
                .or_insert_with(|| world.new_collision_group())
        })
        .collect();

    let body = world.body_mut(id).ok_or(BodyError::UnknownBody(id))?;
    body.position = NVec2::new(cfg.position[0], cfg.position[1]);
    body.velocity = NVec2::new(cfg.velocity[0], cfg.velocity[1]);
    body.acceleration = NVec2::new(cfg.acceleration[0], cfg.acceleration[1]);
    body.angle = cfg.angle;
    body.angular_velocity = cfg.angular_velocity;
    body.scale = cfg.scale;
    body.elasticity = cfg.elasticity;
    for group in group_ids {
        body.add_collision_blacklist_group(group);
    }

    for child_cfg in &cfg.children {
        let child = build_body(world, child_cfg, groups)?;
        world.add_child(id, child)?;
    }

    Ok(id)
}
