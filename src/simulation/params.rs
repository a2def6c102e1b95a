//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings consumed every tick:
//! - constant-magnitude (Coulomb-like) linear and angular friction rates,
//! - the snap-to-zero threshold that kills sub-epsilon velocity drift

#[derive(Debug, Clone)]
pub struct Parameters {
    pub linear_friction: f64,  // speed reduction per second, clamped at zero
    pub angular_friction: f64, // angular speed reduction per second, clamped at zero
    pub sleep_epsilon: f64,    // velocities below this snap to zero before integrating
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            linear_friction: 0.0,
            angular_friction: 0.0,
            sleep_epsilon: 1e-8,
        }
    }
}
