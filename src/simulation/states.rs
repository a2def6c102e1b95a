//! Core state types for the rigid-body simulation.
//!
//! Defines the body hierarchy:
//! - `RigidBody` — one tree node: kinematic state, derived physical state,
//!   child bodies and leaf circles
//! - `BodyStore` — flat arena owning every body, addressed by `BodyId`
//!
//! Bodies form trees through id links (a parent id plus a child id list)
//! rather than owning references, so world-space queries walk the parent
//! chain while ownership stays acyclic.

use std::collections::{HashMap, HashSet};

use nalgebra::Vector2;
use thiserror::Error;

use crate::simulation::collision::{angular_point_velocity, rotate_point};
use crate::simulation::params::Parameters;
use crate::simulation::shapes::{BoundingCircle, Circle};

pub type NVec2 = Vector2<f64>;

/// Identifier of a body for the lifetime of the simulation. Ids are assigned
/// monotonically by the owning [`BodyStore`] and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(u64);

/// Structural errors raised while wiring bodies together.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BodyError {
    #[error("unknown body id {0:?}")]
    UnknownBody(BodyId),
    #[error("body {0:?} already has a parent")]
    AlreadyParented(BodyId),
    #[error("attaching body {0:?} here would create a cycle")]
    WouldCycle(BodyId),
    #[error("body {0:?} is already registered with the world")]
    AlreadyInWorld(BodyId),
    #[error("body {0:?} has a parent and cannot be added as a root")]
    NotARoot(BodyId),
}

/// One node of a body tree.
///
/// Kinematic state (`position`, `velocity`, `acceleration`, `angle`,
/// `angular_velocity`, `scale`) is local to the parent's frame and freely
/// settable. The derived fields (`mass`, `center_of_mass`,
/// `moment_of_inertia`, `bounding_circle`) are caches valid only right after
/// the corresponding `update_*` pass on the [`BodyStore`] ran in dependency
/// order mass → center of mass → moment of inertia.
#[derive(Debug, Clone)]
pub struct RigidBody {
    id: BodyId,
    parent: Option<BodyId>,
    children: Vec<BodyId>,
    circles: Vec<Circle>,

    pub position: NVec2,
    pub velocity: NVec2,
    pub acceleration: NVec2, // transient: zeroed once applied each tick
    pub angle: f64,
    pub angular_velocity: f64,
    pub scale: f64,
    pub elasticity: f64, // restitution in [0, 1]

    mass: f64,
    center_of_mass: NVec2,
    moment_of_inertia: f64,
    bounding_circle: BoundingCircle,

    blacklist_groups: HashSet<u64>,
}

impl RigidBody {
    fn new(id: BodyId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            circles: Vec::new(),
            position: NVec2::zeros(),
            velocity: NVec2::zeros(),
            acceleration: NVec2::zeros(),
            angle: 0.0,
            angular_velocity: 0.0,
            scale: 1.0,
            elasticity: 0.8,
            mass: 0.0,
            center_of_mass: NVec2::zeros(),
            moment_of_inertia: 0.0,
            bounding_circle: BoundingCircle::default(),
            blacklist_groups: HashSet::new(),
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn parent(&self) -> Option<BodyId> {
        self.parent
    }

    pub fn children(&self) -> &[BodyId] {
        &self.children
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Center of mass in this body's local frame.
    pub fn center_of_mass(&self) -> NVec2 {
        self.center_of_mass
    }

    pub fn moment_of_inertia(&self) -> f64 {
        self.moment_of_inertia
    }

    /// Bounding circle over this body's subtree, in the local frame.
    pub fn bounding_circle(&self) -> &BoundingCircle {
        &self.bounding_circle
    }

    /// Tag this body with a collision blacklist group.
    pub fn add_collision_blacklist_group(&mut self, group: u64) {
        self.blacklist_groups.insert(group);
    }

    /// True unless the two bodies share a blacklist group.
    pub fn check_collidable(&self, other: &RigidBody) -> bool {
        self.blacklist_groups.is_disjoint(&other.blacklist_groups)
    }

    /// Advance local position and angle by `dt`, snapping sub-epsilon
    /// velocities to zero first so drift cannot linger forever.
    fn integrate(&mut self, dt: f64, sleep_epsilon: f64) {
        if self.velocity.norm() < sleep_epsilon {
            self.velocity = NVec2::zeros();
        }
        if self.angular_velocity.abs() < sleep_epsilon {
            self.angular_velocity = 0.0;
        }
        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
    }

    /// Fold the pending acceleration into the velocity, zero it, then apply
    /// constant-magnitude friction. The friction reduction is clamped so the
    /// speed never crosses zero.
    fn integrate_acceleration(&mut self, dt: f64, params: &Parameters) {
        self.velocity += self.acceleration * dt;
        self.acceleration = NVec2::zeros();

        let speed = self.velocity.norm();
        if speed > 0.0 {
            let reduction = params.linear_friction * dt;
            if reduction >= speed {
                self.velocity = NVec2::zeros();
            } else {
                self.velocity *= (speed - reduction) / speed;
            }
        }

        let angular_reduction = params.angular_friction * dt;
        if self.angular_velocity.abs() <= angular_reduction {
            self.angular_velocity = 0.0;
        } else {
            self.angular_velocity -= angular_reduction * self.angular_velocity.signum();
        }
    }
}

/// World-space kinematic state of one body, produced by composing the parent
/// chain: translations rotate by the parent's world angle and scale by its
/// world scale, angles and angular velocities add, scales multiply.
#[derive(Debug, Clone)]
pub struct Kinematics {
    pub position: NVec2,
    pub angle: f64,
    pub scale: f64,
    pub velocity: NVec2,
    pub angular_velocity: f64,
}

impl Kinematics {
    /// World position, velocity, and radius of a circle carried by a body
    /// with this kinematic state.
    pub fn circle_state(&self, circle: &Circle) -> (NVec2, NVec2, f64) {
        let offset = rotate_point(circle.position * self.scale, self.angle);
        let position = self.position + offset;
        let velocity = self.velocity + angular_point_velocity(self.angular_velocity, offset);
        (position, velocity, circle.radius * self.scale)
    }

    /// World center and radius of a local-frame bounding circle.
    pub fn bounding_state(&self, bounding: &BoundingCircle) -> (NVec2, f64) {
        let center = self.position + rotate_point(bounding.position * self.scale, self.angle);
        (center, bounding.radius * self.scale)
    }
}

/// Arena owning every body in the simulation.
#[derive(Debug)]
pub struct BodyStore {
    bodies: HashMap<BodyId, RigidBody>,
    next_id: u64,
    next_group: u64,
}

impl Default for BodyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyStore {
    pub fn new() -> Self {
        Self {
            bodies: HashMap::new(),
            next_id: 1,
            next_group: 1,
        }
    }

    /// Allocate a fresh body with default state and return its id.
    pub fn create(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.insert(id, RigidBody::new(id));
        id
    }

    /// Allocate a fresh collision blacklist group id. Monotone for the
    /// lifetime of the store, like body ids.
    pub fn new_collision_group(&mut self) -> u64 {
        let group = self.next_group;
        self.next_group += 1;
        group
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn get(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(&id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(&id)
    }

    // Internal accessors: ids held in children/parent links always refer to
    // live bodies, so indexing is safe on every internal path.
    fn body(&self, id: BodyId) -> &RigidBody {
        &self.bodies[&id]
    }

    fn body_mut(&mut self, id: BodyId) -> &mut RigidBody {
        self.bodies.get_mut(&id).expect("stale body id in store link")
    }

    /// Attach `child` under `parent`. A body gets its parent exactly once:
    /// re-parenting, self-attachment, and cycles are rejected.
    pub fn add_child(&mut self, parent: BodyId, child: BodyId) -> Result<(), BodyError> {
        if !self.contains(parent) {
            return Err(BodyError::UnknownBody(parent));
        }
        let child_body = self.get(child).ok_or(BodyError::UnknownBody(child))?;
        if child_body.parent.is_some() {
            return Err(BodyError::AlreadyParented(child));
        }
        if parent == child {
            return Err(BodyError::WouldCycle(child));
        }
        // `child` is a root of its own subtree; a cycle forms only if the
        // prospective parent already sits somewhere below it
        let mut ancestor = self.body(parent).parent;
        while let Some(a) = ancestor {
            if a == child {
                return Err(BodyError::WouldCycle(child));
            }
            ancestor = self.body(a).parent;
        }

        self.body_mut(parent).children.push(child);
        self.body_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Detach a child by id; O(n) over the child list. Returns whether the
    /// child was present. The detached subtree stays in the store.
    pub fn remove_child(&mut self, parent: BodyId, child: BodyId) -> bool {
        let Some(parent_body) = self.get_mut(parent) else {
            return false;
        };
        let before = parent_body.children.len();
        parent_body.children.retain(|&c| c != child);
        if parent_body.children.len() == before {
            return false;
        }
        self.body_mut(child).parent = None;
        true
    }

    /// Append a leaf circle to a body.
    pub fn add_circle(&mut self, id: BodyId, circle: Circle) -> Result<(), BodyError> {
        self.get_mut(id)
            .ok_or(BodyError::UnknownBody(id))?
            .circles
            .push(circle);
        Ok(())
    }

    /// Compose the full world-space kinematic state of a body by walking up
    /// its parent chain. O(depth).
    pub fn kinematics(&self, id: BodyId) -> Kinematics {
        let b = self.body(id);
        match b.parent {
            None => Kinematics {
                position: b.position,
                angle: b.angle,
                scale: b.scale,
                velocity: b.velocity,
                angular_velocity: b.angular_velocity,
            },
            Some(parent) => {
                let pk = self.kinematics(parent);
                let offset = rotate_point(b.position * pk.scale, pk.angle);
                Kinematics {
                    position: pk.position + offset,
                    angle: pk.angle + b.angle,
                    scale: pk.scale * b.scale,
                    // carried along by the parent, swung by the parent's spin
                    // at this offset, plus the local velocity in world axes
                    velocity: pk.velocity
                        + angular_point_velocity(pk.angular_velocity, offset)
                        + rotate_point(b.velocity * pk.scale, pk.angle),
                    angular_velocity: pk.angular_velocity + b.angular_velocity,
                }
            }
        }
    }

    pub fn world_position(&self, id: BodyId) -> NVec2 {
        self.kinematics(id).position
    }

    pub fn world_angle(&self, id: BodyId) -> f64 {
        self.kinematics(id).angle
    }

    pub fn world_scale(&self, id: BodyId) -> f64 {
        self.kinematics(id).scale
    }

    pub fn world_velocity(&self, id: BodyId) -> NVec2 {
        self.kinematics(id).velocity
    }

    pub fn world_angular_velocity(&self, id: BodyId) -> f64 {
        self.kinematics(id).angular_velocity
    }

    /// World-space center of mass (valid after the derived-property passes).
    pub fn world_center_of_mass(&self, id: BodyId) -> NVec2 {
        let k = self.kinematics(id);
        let b = self.body(id);
        k.position + rotate_point(b.center_of_mass * k.scale, k.angle)
    }

    // ------------------------------------------------------------------
    // Derived-property passes, post-order over children.
    // Dependency order: mass -> center of mass -> moment of inertia.
    // The bounding circle depends on none of them.
    // ------------------------------------------------------------------

    /// Total mass of the subtree. A child's scale acts on its geometry, so
    /// its mass contributes scaled by scale^2 (area).
    pub fn update_mass(&mut self, id: BodyId) {
        let children = self.body(id).children.clone();
        let mut mass = 0.0;
        for &child in &children {
            self.update_mass(child);
            let cb = self.body(child);
            mass += cb.mass * cb.scale * cb.scale;
        }
        let b = self.body_mut(id);
        mass += b.circles.iter().map(Circle::mass).sum::<f64>();
        b.mass = mass;
    }

    /// Mass-weighted center in the local frame; requires `update_mass`.
    /// A zero-mass body keeps its center at the origin.
    pub fn update_center_of_mass(&mut self, id: BodyId) {
        let children = self.body(id).children.clone();
        let mut weighted = NVec2::zeros();
        let mut mass = 0.0;
        for &child in &children {
            self.update_center_of_mass(child);
            let cb = self.body(child);
            let child_mass = cb.mass * cb.scale * cb.scale;
            let child_center = cb.position + rotate_point(cb.center_of_mass * cb.scale, cb.angle);
            weighted += child_center * child_mass;
            mass += child_mass;
        }
        let b = self.body(id);
        for circle in &b.circles {
            let circle_mass = circle.mass();
            weighted += circle.position * circle_mass;
            mass += circle_mass;
        }
        self.body_mut(id).center_of_mass = if mass > 0.0 {
            weighted / mass
        } else {
            NVec2::zeros()
        };
    }

    /// Disk inertia with the parallel-axis shift, summed over every leaf
    /// circle of the subtree expressed in this body's frame; requires
    /// `update_mass` and `update_center_of_mass`.
    pub fn update_moment_of_inertia(&mut self, id: BodyId) {
        let children = self.body(id).children.clone();
        for &child in &children {
            self.update_moment_of_inertia(child);
        }

        let mut leaves = Vec::new();
        self.collect_circles(id, NVec2::zeros(), 0.0, 1.0, &mut leaves);

        let com = self.body(id).center_of_mass;
        let mut inertia = 0.0;
        for (position, radius, density) in leaves {
            let mass = std::f64::consts::PI * radius * radius * density;
            let d2 = (position - com).norm_squared();
            inertia += mass * d2 + 0.5 * mass * radius * radius;
        }
        self.body_mut(id).moment_of_inertia = inertia;
    }

    /// Every leaf circle under `id` expressed in the frame the accumulated
    /// (origin, angle, scale) transform describes: (position, radius, density).
    fn collect_circles(
        &self,
        id: BodyId,
        origin: NVec2,
        angle: f64,
        scale: f64,
        out: &mut Vec<(NVec2, f64, f64)>,
    ) {
        let b = self.body(id);
        for circle in &b.circles {
            out.push((
                origin + rotate_point(circle.position * scale, angle),
                circle.radius * scale,
                circle.density,
            ));
        }
        for &child in &b.children {
            let cb = self.body(child);
            self.collect_circles(
                child,
                origin + rotate_point(cb.position * scale, angle),
                angle + cb.angle,
                scale * cb.scale,
                out,
            );
        }
    }

    /// Bounding circle over the subtree in the local frame: center at the
    /// unweighted average of the component bounding centers, radius reaching
    /// the farthest component edge. Independent of the mass passes.
    pub fn update_bounding_circle(&mut self, id: BodyId) {
        let children = self.body(id).children.clone();
        for &child in &children {
            self.update_bounding_circle(child);
        }

        let b = self.body(id);
        let mut components: Vec<(NVec2, f64)> = Vec::new();
        for circle in &b.circles {
            components.push((circle.position, circle.radius));
        }
        for &child in &children {
            let cb = self.body(child);
            let bc = &cb.bounding_circle;
            let center = cb.position + rotate_point(bc.position * cb.scale, cb.angle);
            components.push((center, bc.radius * cb.scale));
        }

        let bounding = if components.is_empty() {
            BoundingCircle::default()
        } else {
            let mut average = NVec2::zeros();
            for (center, _) in &components {
                average += center;
            }
            average /= components.len() as f64;

            let mut max_reach: f64 = 0.0;
            for (center, radius) in &components {
                max_reach = max_reach.max((center - average).norm() + radius);
            }
            BoundingCircle {
                position: average,
                radius: max_reach,
            }
        };
        self.body_mut(id).bounding_circle = bounding;
    }

    // ------------------------------------------------------------------
    // Time integration, whole subtree.
    // ------------------------------------------------------------------

    /// Advance local positions and angles of the subtree by `dt`.
    pub fn integrate(&mut self, id: BodyId, dt: f64, params: &Parameters) {
        self.body_mut(id).integrate(dt, params.sleep_epsilon);
        let children = self.body(id).children.clone();
        for child in children {
            self.integrate(child, dt, params);
        }
    }

    /// Apply pending accelerations and friction to the subtree.
    pub fn integrate_acceleration(&mut self, id: BodyId, dt: f64, params: &Parameters) {
        self.body_mut(id).integrate_acceleration(dt, params);
        let children = self.body(id).children.clone();
        for child in children {
            self.integrate_acceleration(child, dt, params);
        }
    }
}
