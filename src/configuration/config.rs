//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`ParametersConfig`] – tick settings and global physical parameters
//! - [`BodyConfig`]       – initial state for one body, recursive through `children`
//! - [`CircleConfig`]     – one leaf circle carried by a body
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example scenario YAML matching these types:
//!
//! ```yaml
//! parameters:
//!   t_end: 10.0             # total simulation time
//!   tick_interval: 0.1      # seconds advanced per world update
//!   linear_friction: 0.0    # speed reduction per second
//!   angular_friction: 0.0   # angular speed reduction per second
//!   sleep_epsilon: 1.0e-8   # velocities below this snap to zero
//!
//! bodies:
//!   - position: [ -5.0, 0.0 ]
//!     velocity: [  1.0, 0.0 ]
//!     elasticity: 1.0
//!     circles:
//!       - position: [ 0.0, 0.0 ]
//!         radius: 1.0
//!         density: 1.0
//!   - position: [  5.0, 0.0 ]
//!     circles:
//!       - position: [ 0.0, 0.0 ]
//!         radius: 1.0
//!     children:
//!       - position: [ 0.0, 2.0 ]
//!         circles:
//!           - position: [ 0.0, 0.0 ]
//!             radius: 0.5
//! ```
//!
//! The engine then maps this configuration into its internal runtime world
//! representation, which may use different structs optimized for simulation.

use serde::Deserialize;

/// Global tick and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub t_end: f64,         // total simulation time
    pub tick_interval: f64, // seconds advanced per world update
    #[serde(default)]
    pub linear_friction: f64, // constant speed reduction per second
    #[serde(default)]
    pub angular_friction: f64, // constant angular speed reduction per second
    #[serde(default = "default_sleep_epsilon")]
    pub sleep_epsilon: f64, // velocities below this snap to zero
}

fn default_sleep_epsilon() -> f64 {
    1e-8
}

fn default_scale() -> f64 {
    1.0
}

fn default_elasticity() -> f64 {
    0.8
}

fn default_density() -> f64 {
    1.0
}

/// Configuration for one leaf circle in its body's local frame
#[derive(Deserialize, Debug)]
pub struct CircleConfig {
    pub position: [f64; 2], // center offset from the body origin
    pub radius: f64,        // local radius, scaled by the body's world scale
    #[serde(default = "default_density")]
    pub density: f64, // mass per unit area
}

/// Configuration for a single body's initial state
///
/// Recursive: `children` holds bodies attached below this one, with their
/// state expressed in this body's frame. Entries in `groups` are scenario-
/// local labels; bodies sharing a label never collide with each other.
#[derive(Deserialize, Debug)]
pub struct BodyConfig {
    #[serde(default)]
    pub position: [f64; 2], // initial position in the parent frame
    #[serde(default)]
    pub velocity: [f64; 2], // initial velocity in the parent frame
    #[serde(default)]
    pub acceleration: [f64; 2], // acceleration applied over the first tick
    #[serde(default)]
    pub angle: f64, // initial rotation, radians
    #[serde(default)]
    pub angular_velocity: f64, // radians per second
    #[serde(default = "default_scale")]
    pub scale: f64, // geometric scale applied to the subtree
    #[serde(default = "default_elasticity")]
    pub elasticity: f64, // restitution in [0, 1]
    #[serde(default)]
    pub groups: Vec<u64>, // collision blacklist labels
    #[serde(default)]
    pub circles: Vec<CircleConfig>, // leaf circles of this body
    #[serde(default)]
    pub children: Vec<BodyConfig>, // attached child bodies
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug)]
pub struct ScenarioConfig {
    pub parameters: ParametersConfig, // global tick and physical parameters
    pub bodies: Vec<BodyConfig>,      // root bodies registered with the world
}
