//! Read-side invariant checks over every entity
//!
//! Checks never stop at the first failure: every entity is checked and all
//! violations of one pass are reported together.

use super::error::{EntityRef, SimError, Violation};
use super::network::RailNetwork;
use super::parallel::fan_out;
use super::world::World;

/// An entity whose structural invariants can be checked
pub trait Validate: Sync {
    fn entity(&self) -> EntityRef;

    /// Checks that only make sense before the first tick (positivity of
    /// parameters, references made by the static definition), followed by
    /// [`Validate::validate`].
    fn validate_start(&self, world: &World) -> Result<(), Violation>;

    /// Checks that must hold after every tick.
    fn validate(&self, world: &World) -> Result<(), Violation>;
}

fn entities(world: &World) -> Vec<&dyn Validate> {
    let stations = world.stations().values().map(|s| s as &dyn Validate);
    let lines = world.lines().values().map(|l| l as &dyn Validate);
    let trains = world.trains().values().map(|t| t as &dyn Validate);
    let passengers = world.passengers().values().map(|p| p as &dyn Validate);
    stations.chain(lines).chain(trains).chain(passengers).collect()
}

/// Run the start checks on every entity, then the global connectivity check
pub fn validate_start(world: &World) -> Vec<SimError> {
    let mut errors = fan_out(entities(world), |entity| {
        entity
            .validate_start(world)
            .map_err(|violation| SimError::invalid(entity.entity(), violation))
    });

    let network = RailNetwork::from_world(world);
    if !network.is_connected() {
        errors.push(SimError::invalid(
            EntityRef::World,
            Violation::Disconnected {
                components: network.component_count(),
            },
        ));
    }

    errors
}

/// Run the per-tick checks on every entity
pub fn validate(world: &World) -> Vec<SimError> {
    fan_out(entities(world), |entity| {
        entity
            .validate(world)
            .map_err(|violation| SimError::invalid(entity.entity(), violation))
    })
}
