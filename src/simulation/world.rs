//! Event-driven collision world.
//!
//! `World` owns the body arena plus the per-tick scheduling state: a map from
//! event time to the collisions predicted at that time, a map from body id to
//! the times it participates in (for invalidation), and an ordered queue over
//! the distinct pending times. One call to [`World::update`] consumes a full
//! tick: accelerations are applied once, collisions are predicted across the
//! interval, and the tick is then replayed in strict time order — resolve the
//! earliest contacts, throw away predictions that involved the bodies whose
//! velocities just changed, re-predict for those bodies over what is left of
//! the interval, advance everyone to the next event time, repeat.
//!
//! Resolving strictly in time order preserves causality: a body is never
//! advanced past a collision time before that collision has been applied.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::simulation::collision::{
    circles_overlap, contact_point, impulse_magnitude, time_of_impact, ContactState,
};
use crate::simulation::params::Parameters;
use crate::simulation::queue::{TimeKey, TimeQueue};
use crate::simulation::shapes::Circle;
use crate::simulation::states::{BodyError, BodyId, BodyStore, NVec2, RigidBody};

/// One predicted contact between two root bodies.
///
/// Transient: created during detection, consumed (or invalidated) during the
/// same tick, never persisted across ticks. `normal` is the unit contact
/// normal pointing from `body_b` toward `body_a`; the point velocities are
/// the world-space velocities of the two leaf circles at the moment the
/// prediction was made.
#[derive(Debug, Clone)]
pub struct CollisionEvent {
    pub time: TimeKey, // absolute, measured from tick start
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub point: NVec2,
    pub normal: NVec2,
    pub point_velocity_a: NVec2,
    pub point_velocity_b: NVec2,
}

impl CollisionEvent {
    /// Two events are equivalent when they describe the same contact: same
    /// time, same pair in either order, same point, and matching (possibly
    /// swapped) point velocities. The recursive pair traversal visits some
    /// subtree combinations twice, so detection drops equivalents.
    fn equivalent(&self, other: &CollisionEvent) -> bool {
        if self.time != other.time || self.point != other.point {
            return false;
        }
        let same_order = self.body_a == other.body_a
            && self.body_b == other.body_b
            && self.point_velocity_a == other.point_velocity_a
            && self.point_velocity_b == other.point_velocity_b;
        let swapped = self.body_a == other.body_b
            && self.body_b == other.body_a
            && self.point_velocity_a == other.point_velocity_b
            && self.point_velocity_b == other.point_velocity_a;
        same_order || swapped
    }
}

/// The simulation world: a flat set of root bodies plus the scheduling state
/// for the tick currently being processed.
#[derive(Debug, Default)]
pub struct World {
    pub parameters: Parameters,
    store: BodyStore,
    roots: Vec<BodyId>,

    // time-indexed events and the ordered set of distinct pending times,
    // kept in sync: a time leaves the queue when its event list drains
    times_queue: TimeQueue,
    events_by_time: HashMap<TimeKey, Vec<CollisionEvent>>,
    times_by_body: HashMap<BodyId, Vec<TimeKey>>,
}

impl World {
    pub fn new(parameters: Parameters) -> Self {
        Self {
            parameters,
            store: BodyStore::new(),
            roots: Vec::new(),
            times_queue: TimeQueue::new(),
            events_by_time: HashMap::new(),
            times_by_body: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Construction surface (delegates into the body arena).
    // ------------------------------------------------------------------

    pub fn create_body(&mut self) -> BodyId {
        self.store.create()
    }

    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.store.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.store.get_mut(id)
    }

    pub fn add_child(&mut self, parent: BodyId, child: BodyId) -> Result<(), BodyError> {
        self.store.add_child(parent, child)
    }

    pub fn remove_child(&mut self, parent: BodyId, child: BodyId) -> bool {
        self.store.remove_child(parent, child)
    }

    pub fn add_circle(&mut self, id: BodyId, circle: Circle) -> Result<(), BodyError> {
        self.store.add_circle(id, circle)
    }

    pub fn new_collision_group(&mut self) -> u64 {
        self.store.new_collision_group()
    }

    pub fn store(&self) -> &BodyStore {
        &self.store
    }

    /// Ids of the root bodies currently registered.
    pub fn bodies(&self) -> &[BodyId] {
        &self.roots
    }

    /// Register a parentless body as a simulated root.
    pub fn add_body(&mut self, id: BodyId) -> Result<(), BodyError> {
        let body = self.store.get(id).ok_or(BodyError::UnknownBody(id))?;
        if body.parent().is_some() {
            return Err(BodyError::NotARoot(id));
        }
        if self.roots.contains(&id) {
            return Err(BodyError::AlreadyInWorld(id));
        }
        self.roots.push(id);
        Ok(())
    }

    /// Unregister a root body. Returns whether it was present; any collision
    /// events still scheduled against it are purged from both the time index
    /// and the ordered time set. The body itself stays in the arena.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let before = self.roots.len();
        self.roots.retain(|&r| r != id);
        if self.roots.len() == before {
            return false;
        }
        self.purge_events(id);
        true
    }

    // ------------------------------------------------------------------
    // The tick.
    // ------------------------------------------------------------------

    /// Advance the whole world by `interval` seconds, resolving every
    /// collision inside the tick at its exact sub-tick time.
    pub fn update(&mut self, interval: f64) {
        if interval <= 0.0 || self.roots.is_empty() {
            return;
        }
        let roots = self.roots.clone();

        // apply pending accelerations and friction, full interval, once
        for &root in &roots {
            self.store
                .integrate_acceleration(root, interval, &self.parameters);
        }

        // refresh derived caches in dependency order
        for &root in &roots {
            self.store.update_mass(root);
            self.store.update_center_of_mass(root);
            self.store.update_moment_of_inertia(root);
            self.store.update_bounding_circle(root);
        }

        // initial prediction pass over every collidable root pair
        for i in 0..roots.len() {
            for j in (i + 1)..roots.len() {
                if !self.check_collidable(roots[i], roots[j]) {
                    continue;
                }
                self.detect_pair(roots[i], roots[j], roots[i], roots[j], interval, 0.0);
            }
        }

        let mut processed = 0.0;
        while interval > processed {
            let remaining = interval - processed;

            // resolve every contact scheduled exactly at the current time
            let due = self
                .events_by_time
                .get(&TimeKey::new(processed))
                .cloned()
                .unwrap_or_default();
            let mut touched: Vec<BodyId> = Vec::new();
            for event in &due {
                if self.resolve(event) {
                    if !touched.contains(&event.body_a) {
                        touched.push(event.body_a);
                    }
                    if !touched.contains(&event.body_b) {
                        touched.push(event.body_b);
                    }
                }
            }

            // the touched bodies' velocities changed: every prediction that
            // involves them is stale now
            for &id in &touched {
                self.purge_events(id);
            }

            // re-predict for the touched bodies over the remaining interval
            for &id in &touched {
                for &other in &roots {
                    if other == id || !self.check_collidable(other, id) {
                        continue;
                    }
                    self.detect_pair(id, other, id, other, remaining, processed);
                }
            }

            // skip ahead to the next collision, or to the end of the tick
            let next = self
                .times_queue
                .pop_min()
                .map(TimeKey::value)
                .unwrap_or(interval);
            let dt = next - processed;
            if dt > 0.0 {
                for &root in &roots {
                    self.store.integrate(root, dt, &self.parameters);
                }
            }
            processed = next;
        }

        // scheduling state never outlives the tick
        self.times_queue.clear();
        self.events_by_time.clear();
        self.times_by_body.clear();
    }

    fn check_collidable(&self, a: BodyId, b: BodyId) -> bool {
        match (self.store.get(a), self.store.get(b)) {
            (Some(a), Some(b)) => a.check_collidable(b),
            _ => false,
        }
    }

    /// Recursive broad/narrow phase for one subtree pair. `root_a`/`root_b`
    /// stay fixed while the traversal descends, so every scheduled event
    /// references root bodies. A bounding rejection at any level skips the
    /// whole subtree pair without visiting the circles underneath.
    fn detect_pair(
        &mut self,
        sub_a: BodyId,
        sub_b: BodyId,
        root_a: BodyId,
        root_b: BodyId,
        interval: f64,
        time_offset: f64,
    ) {
        let ka = self.store.kinematics(sub_a);
        let kb = self.store.kinematics(sub_b);
        let (Some(body_a), Some(body_b)) = (self.store.get(sub_a), self.store.get(sub_b)) else {
            return;
        };

        // broad phase: bounding circles inflated by the relative reach
        let (center_a, bound_a) = ka.bounding_state(body_a.bounding_circle());
        let (center_b, bound_b) = kb.bounding_state(body_b.bounding_circle());
        let reach = ((ka.velocity - kb.velocity) * interval).norm();
        if !circles_overlap(center_a, bound_a + reach, center_b, bound_b) {
            return;
        }

        let children_a: Vec<BodyId> = body_a.children().to_vec();
        let children_b: Vec<BodyId> = body_b.children().to_vec();
        let circles_a: Vec<(NVec2, NVec2, f64)> =
            body_a.circles().iter().map(|c| ka.circle_state(c)).collect();
        let circles_b: Vec<(NVec2, NVec2, f64)> =
            body_b.circles().iter().map(|c| kb.circle_state(c)).collect();

        // descend into child combinations on both sides
        for &child_b in &children_b {
            self.detect_pair(sub_a, child_b, root_a, root_b, interval, time_offset);
        }
        for &child_a in &children_a {
            self.detect_pair(child_a, sub_b, root_a, root_b, interval, time_offset);
        }

        // narrow phase: leaf circles of A against leaf circles of B
        for &(pos_a, vel_a, radius_a) in &circles_a {
            for &(pos_b, vel_b, radius_b) in &circles_b {
                let Some(fraction) =
                    time_of_impact(pos_a, radius_a, vel_a, pos_b, radius_b, vel_b, interval)
                else {
                    continue;
                };

                // project both circles to the contact instant
                let dt = fraction * interval;
                let future_a = pos_a + vel_a * dt;
                let future_b = pos_b + vel_b * dt;
                let point = contact_point(future_a, radius_a, future_b, radius_b);

                let from_b = point - future_b;
                let length = from_b.norm();
                if length == 0.0 {
                    continue; // degenerate contact, drop it
                }

                self.schedule(CollisionEvent {
                    time: TimeKey::new(time_offset + dt),
                    body_a: root_a,
                    body_b: root_b,
                    point,
                    normal: from_b / length,
                    point_velocity_a: vel_a,
                    point_velocity_b: vel_b,
                });
            }
        }
    }

    /// Index an event by its time and record the time against both root ids;
    /// equivalent predictions are dropped, not re-inserted.
    fn schedule(&mut self, event: CollisionEvent) {
        if let Some(existing) = self.events_by_time.get(&event.time) {
            if existing.iter().any(|e| e.equivalent(&event)) {
                return;
            }
        }
        trace!(
            time = event.time.value(),
            body_a = ?event.body_a,
            body_b = ?event.body_b,
            "scheduled collision event"
        );
        let (time, body_a, body_b) = (event.time, event.body_a, event.body_b);
        self.times_queue.insert(time);
        self.events_by_time.entry(time).or_default().push(event);
        self.times_by_body.entry(body_a).or_default().push(time);
        self.times_by_body.entry(body_b).or_default().push(time);
    }

    /// Drop every still-pending event that references `id`, emptying times
    /// out of the ordered set as their event lists drain.
    fn purge_events(&mut self, id: BodyId) {
        let times = self.times_by_body.remove(&id).unwrap_or_default();
        for time in times {
            let Some(list) = self.events_by_time.get_mut(&time) else {
                continue;
            };
            list.retain(|e| e.body_a != id && e.body_b != id);
            if list.is_empty() {
                self.events_by_time.remove(&time);
                self.times_queue.remove(time);
            }
        }
    }

    /// Apply the impulse for one event to both root bodies. Returns whether
    /// an impulse was actually applied; already-separating contacts and
    /// zero-mass participants resolve to "nothing to do".
    fn resolve(&mut self, event: &CollisionEvent) -> bool {
        let (Some(a), Some(b)) = (self.store.get(event.body_a), self.store.get(event.body_b))
        else {
            return false;
        };
        let contact_a = ContactState {
            mass: a.mass(),
            moment_of_inertia: a.moment_of_inertia(),
            elasticity: a.elasticity,
            center_of_mass: self.store.world_center_of_mass(event.body_a),
        };
        let contact_b = ContactState {
            mass: b.mass(),
            moment_of_inertia: b.moment_of_inertia(),
            elasticity: b.elasticity,
            center_of_mass: self.store.world_center_of_mass(event.body_b),
        };

        let Some(magnitude) = impulse_magnitude(
            &contact_a,
            &contact_b,
            event.point,
            event.normal,
            event.point_velocity_a,
            event.point_velocity_b,
        ) else {
            trace!(time = event.time.value(), "contact needs no impulse");
            return false;
        };

        let impulse = event.normal * magnitude;
        let r_a = event.point - contact_a.center_of_mass;
        let r_b = event.point - contact_b.center_of_mass;

        if let Some(body_a) = self.store.get_mut(event.body_a) {
            body_a.velocity += impulse / contact_a.mass;
            if contact_a.moment_of_inertia > 0.0 {
                body_a.angular_velocity += r_a.perp(&impulse) / contact_a.moment_of_inertia;
            }
        }
        if let Some(body_b) = self.store.get_mut(event.body_b) {
            body_b.velocity -= impulse / contact_b.mass;
            if contact_b.moment_of_inertia > 0.0 {
                body_b.angular_velocity -= r_b.perp(&impulse) / contact_b.moment_of_inertia;
            }
        }

        debug!(
            time = event.time.value(),
            body_a = ?event.body_a,
            body_b = ?event.body_b,
            magnitude,
            "resolved collision"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_body(world: &mut World, x: f64, vx: f64) -> BodyId {
        let id = world.create_body();
        world
            .add_circle(id, Circle::new(NVec2::zeros(), 1.0, 1.0))
            .unwrap();
        {
            let b = world.body_mut(id).unwrap();
            b.position = NVec2::new(x, 0.0);
            b.velocity = NVec2::new(vx, 0.0);
            b.elasticity = 1.0;
        }
        world.add_body(id).unwrap();
        id
    }

    fn stub_event(time: f64, a: BodyId, b: BodyId) -> CollisionEvent {
        CollisionEvent {
            time: TimeKey::new(time),
            body_a: a,
            body_b: b,
            point: NVec2::zeros(),
            normal: NVec2::new(1.0, 0.0),
            point_velocity_a: NVec2::zeros(),
            point_velocity_b: NVec2::zeros(),
        }
    }

    #[test]
    fn remove_body_purges_time_index_and_queue() {
        let mut world = World::default();
        let a = circle_body(&mut world, 0.0, 0.0);
        let b = circle_body(&mut world, 5.0, 0.0);
        let c = circle_body(&mut world, 10.0, 0.0);

        world.schedule(stub_event(1.0, a, b));
        world.schedule(stub_event(1.0, b, c));
        world.schedule(stub_event(2.0, a, c));
        assert_eq!(world.times_queue.len(), 2);

        assert!(world.remove_body(a));
        // t = 1.0 still holds the (b, c) event; t = 2.0 is fully drained
        assert_eq!(world.times_queue.len(), 1);
        assert_eq!(world.events_by_time.get(&TimeKey::new(1.0)).unwrap().len(), 1);
        assert!(world.events_by_time.get(&TimeKey::new(2.0)).is_none());
        assert!(!world.remove_body(a));

        // the next tick must not reference the removed body
        world.update(1.0);
        for &root in world.bodies() {
            assert_ne!(root, a);
        }
    }

    #[test]
    fn equivalent_events_are_dropped() {
        let mut world = World::default();
        let a = circle_body(&mut world, 0.0, 0.0);
        let b = circle_body(&mut world, 5.0, 0.0);

        let event = stub_event(1.0, a, b);
        let mut swapped = stub_event(1.0, b, a);
        swapped.point_velocity_a = event.point_velocity_b;
        swapped.point_velocity_b = event.point_velocity_a;

        world.schedule(event);
        world.schedule(swapped);
        assert_eq!(world.events_by_time.get(&TimeKey::new(1.0)).unwrap().len(), 1);
    }

    #[test]
    fn add_body_validates_roots() {
        let mut world = World::default();
        let parent = world.create_body();
        let child = world.create_body();
        world.add_child(parent, child).unwrap();

        assert_eq!(world.add_body(child), Err(BodyError::NotARoot(child)));
        world.add_body(parent).unwrap();
        assert_eq!(
            world.add_body(parent),
            Err(BodyError::AlreadyInWorld(parent))
        );
    }
}
