//! Train movement logic for the rail simulation
//!
//! A train follows its scripted plan. While it travels on a line it advances
//! automatically every tick and reaches the far end once the distance covered
//! is at least the line length. All distances are exact rationals.

use log::debug;
use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::error::{ActionError, EntityRef, SimError, Violation};
use super::parallel::lock;
use super::types::{StationId, Tick, TrainAction, TrainId, TrainPosition};
use super::validator::Validate;
use super::world::World;

/// Mutable part of a train, guarded by the train's own lock
#[derive(Debug, Clone)]
pub(crate) struct TrainState {
    pub position: TrainPosition,
    /// Riders currently aboard
    pub passengers: BigInt,
    /// Recomputed every tick; only true while resident at a station
    pub boarding_possible: bool,
}

/// A train in the rail simulation
#[derive(Debug)]
pub struct Train {
    pub id: TrainId,
    pub capacity: BigUint,
    /// Distance per tick
    pub speed: BigRational,
    pub plan: BTreeMap<Tick, TrainAction>,
    state: Mutex<TrainState>,
}

impl Train {
    /// `start` of `None` places the train on the wildcard; it then needs a
    /// tick-0 `Start` before it can act.
    pub fn new(
        id: TrainId,
        start: Option<StationId>,
        speed: BigRational,
        capacity: BigUint,
    ) -> Self {
        let position = match start {
            Some(station) => TrainPosition::AtStation(station),
            None => TrainPosition::Pending,
        };
        Self {
            id,
            capacity,
            speed,
            plan: BTreeMap::new(),
            state: Mutex::new(TrainState {
                position,
                passengers: BigInt::zero(),
                boarding_possible: false,
            }),
        }
    }

    pub fn position(&self) -> TrainPosition {
        lock(&self.state).position.clone()
    }

    pub fn passengers(&self) -> BigInt {
        lock(&self.state).passengers.clone()
    }

    pub fn boarding_possible(&self) -> bool {
        lock(&self.state).boarding_possible
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, TrainState> {
        lock(&self.state)
    }

    /// Resolve the wildcard to `station`. The caller accounts for the
    /// station's resident count.
    pub(crate) fn place(&self, station: StationId) -> Result<(), ActionError> {
        let mut state = lock(&self.state);
        if state.position != TrainPosition::Pending {
            return Err(ActionError::AlreadyPlaced(state.position.to_string()));
        }
        state.position = TrainPosition::AtStation(station);
        Ok(())
    }

    fn entity_ref(&self) -> EntityRef {
        EntityRef::Train(self.id.clone())
    }

    fn action_error(&self, error: ActionError) -> SimError {
        SimError::action(self.entity_ref(), error)
    }

    fn internal(&self, reason: impl Into<String>) -> SimError {
        SimError::internal(self.entity_ref(), reason)
    }

    /// Advance one tick: move along the current line, then run the action
    /// scripted for the current tick, if any.
    pub fn update(&self, world: &World) -> Result<(), SimError> {
        let mut guard = lock(&self.state);
        let state = &mut *guard;

        match state.position {
            TrainPosition::AtStation(_) => state.boarding_possible = true,
            TrainPosition::OnLine { .. } => {
                state.boarding_possible = false;
                self.advance(state, world)?;
            }
            TrainPosition::Pending => state.boarding_possible = false,
        }

        let Some(action) = self.plan.get(world.current_time()) else {
            return Ok(());
        };

        self.apply(state, world, action)
    }

    fn advance(&self, state: &mut TrainState, world: &World) -> Result<(), SimError> {
        let (line_id, destination, since) = match &mut state.position {
            TrainPosition::OnLine {
                line,
                destination,
                since,
                ..
            } => (line, destination, since),
            other => {
                return Err(self.internal(format!("can not advance while at {other}")));
            }
        };

        *since += 1u32;

        let line = world
            .line(line_id)
            .ok_or_else(|| self.internal(format!("line '{line_id}' does not exist")))?;

        let distance = BigRational::from_integer(BigInt::from(since.clone())) * &self.speed;
        if distance < line.length {
            return Ok(());
        }

        // Reached end of line
        let destination = destination.clone();
        let station = world.station(&destination).ok_or_else(|| {
            self.internal(format!("reached non existing station '{destination}'"))
        })?;

        line.train_left();
        station.train_arrived();
        debug!(
            "train {} arrived at {} at tick {}",
            self.id,
            destination,
            world.current_time()
        );
        state.position = TrainPosition::AtStation(destination);

        Ok(())
    }

    fn apply(
        &self,
        state: &mut TrainState,
        world: &World,
        action: &TrainAction,
    ) -> Result<(), SimError> {
        let current = match &state.position {
            TrainPosition::AtStation(station) => station.clone(),
            TrainPosition::OnLine { line, .. } => {
                return Err(self.action_error(ActionError::StillOnLine(line.clone())));
            }
            TrainPosition::Pending => return Err(self.action_error(ActionError::NotStarted)),
        };

        match action {
            TrainAction::Start(_) => Err(self.action_error(ActionError::StartNotAllowed(
                world.current_time().clone(),
            ))),
            TrainAction::Depart(line_id) => {
                let line = world
                    .line(line_id)
                    .ok_or_else(|| self.action_error(ActionError::UnknownLine(line_id.clone())))?;

                let destination = line.other_end(&current).cloned().ok_or_else(|| {
                    self.action_error(ActionError::LineNotConnected {
                        line: line_id.clone(),
                        station: current.clone(),
                    })
                })?;

                let origin = world.station(&current).ok_or_else(|| {
                    self.internal(format!("departure from non existing station '{current}'"))
                })?;

                line.train_entered();
                origin.train_departed();
                debug!(
                    "train {} departed {} on {} at tick {}",
                    self.id,
                    current,
                    line_id,
                    world.current_time()
                );

                state.position = TrainPosition::OnLine {
                    line: line_id.clone(),
                    origin: current,
                    destination,
                    since: BigUint::zero(),
                };
                state.boarding_possible = false;

                // The departure tick already counts as travelled.
                self.advance(state, world)
            }
        }
    }
}

impl Validate for Train {
    fn entity(&self) -> EntityRef {
        self.entity_ref()
    }

    fn validate_start(&self, world: &World) -> Result<(), Violation> {
        if !self.speed.is_positive() {
            return Err(Violation::NonPositiveSpeed(self.speed.clone()));
        }
        self.validate(world)
    }

    fn validate(&self, world: &World) -> Result<(), Violation> {
        let state = lock(&self.state);

        match &state.position {
            TrainPosition::Pending => {}
            TrainPosition::AtStation(station) => {
                if world.station(station).is_none() {
                    return Err(Violation::UnknownStation(station.clone()));
                }
            }
            TrainPosition::OnLine {
                line,
                origin,
                destination,
                ..
            } => {
                let Some(on) = world.line(line) else {
                    return Err(Violation::UnknownLine(line.clone()));
                };
                if world.station(destination).is_none() {
                    return Err(Violation::UnknownStation(destination.clone()));
                }
                // Heading to the far end, never back to where it came from
                if on.other_end(origin) != Some(destination) {
                    return Err(Violation::WrongDestination {
                        line: line.clone(),
                        origin: origin.clone(),
                        destination: destination.clone(),
                    });
                }
            }
        }

        if state.passengers.is_negative() {
            return Err(Violation::NegativeCounter {
                counter: "passengers",
                current: state.passengers.clone(),
            });
        }

        if state.passengers > BigInt::from(self.capacity.clone()) {
            return Err(Violation::TooManyPassengers {
                capacity: self.capacity.clone(),
                current: state.passengers.clone(),
            });
        }

        Ok(())
    }
}
