//! Total weighted delay over all passenger groups

use num_bigint::BigUint;
use num_traits::Zero;

use super::error::{SimError, Violation};
use super::validator::Validate;
use super::world::World;

/// Sum of every group's weighted delay.
///
/// A single group that never reached its target invalidates the whole
/// result; all such groups are reported.
pub fn total_delay(world: &World) -> Result<BigUint, Vec<SimError>> {
    let mut total = BigUint::zero();
    let mut unreached = Vec::new();

    for passenger in world.passengers().values() {
        match passenger.delay() {
            Some(delay) => total += delay,
            None => unreached.push(SimError::invalid(
                passenger.entity(),
                Violation::TargetNotReached(passenger.target.clone()),
            )),
        }
    }

    if unreached.is_empty() {
        Ok(total)
    } else {
        Err(unreached)
    }
}
