pub mod collision;
pub mod params;
pub mod queue;
pub mod scenario;
pub mod shapes;
pub mod states;
pub mod world;
