pub mod benchmark;
pub mod configuration;
pub mod simulation;

pub use simulation::collision::{
    circles_overlap, closest_point_on_segment, contact_point, impulse_magnitude, rotate_point,
    time_of_impact, ContactState,
};
pub use simulation::params::Parameters;
pub use simulation::queue::{TimeKey, TimeQueue};
pub use simulation::scenario::Scenario;
pub use simulation::shapes::{BoundingCircle, Circle};
pub use simulation::states::{BodyError, BodyId, BodyStore, Kinematics, NVec2, RigidBody};
pub use simulation::world::{CollisionEvent, World};

pub use configuration::config::{BodyConfig, CircleConfig, ParametersConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_update, bench_update_curve};
