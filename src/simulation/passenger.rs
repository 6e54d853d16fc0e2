//! Passenger groups
//!
//! A group waits at a station or rides a train. Boarding and detraining go
//! through the train's lock, since several groups may act on the same train
//! within one tick.

use log::debug;
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::error::{ActionError, EntityRef, SimError, Violation};
use super::parallel::lock;
use super::types::{PassengerAction, PassengerId, PassengerPosition, StationId, Tick, TrainId};
use super::validator::Validate;
use super::world::World;

#[derive(Debug, Clone)]
struct PassengerState {
    position: PassengerPosition,
    /// Tick at which the group last got off at its target, if it did
    arrival: Option<Tick>,
}

/// A group of passengers travelling together
#[derive(Debug)]
pub struct Passenger {
    pub id: PassengerId,
    pub start: StationId,
    pub target: StationId,
    /// Number of people; weights the delay
    pub size: BigUint,
    pub target_time: Tick,
    pub plan: BTreeMap<Tick, PassengerAction>,
    state: Mutex<PassengerState>,
}

impl Passenger {
    pub fn new(
        id: PassengerId,
        start: StationId,
        target: StationId,
        size: BigUint,
        target_time: Tick,
    ) -> Self {
        let position = PassengerPosition::AtStation(start.clone());
        Self {
            id,
            start,
            target,
            size,
            target_time,
            plan: BTreeMap::new(),
            state: Mutex::new(PassengerState {
                position,
                arrival: None,
            }),
        }
    }

    pub fn position(&self) -> PassengerPosition {
        lock(&self.state).position.clone()
    }

    pub fn arrival_time(&self) -> Option<Tick> {
        lock(&self.state).arrival.clone()
    }

    /// Weighted delay, or `None` if the group never reached its target.
    /// Arriving early or on time costs nothing.
    pub fn delay(&self) -> Option<BigUint> {
        let arrival = self.arrival_time()?;
        if arrival <= self.target_time {
            return Some(BigUint::zero());
        }
        Some((arrival - &self.target_time) * &self.size)
    }

    fn entity_ref(&self) -> EntityRef {
        EntityRef::Passenger(self.id.clone())
    }

    fn action_error(&self, error: ActionError) -> SimError {
        SimError::action(self.entity_ref(), error)
    }

    /// Run the action scripted for the current tick, if any
    pub fn update(&self, world: &World) -> Result<(), SimError> {
        let Some(action) = self.plan.get(world.current_time()) else {
            return Ok(());
        };

        let mut guard = lock(&self.state);
        let state = &mut *guard;
        state.arrival = None;

        match action {
            PassengerAction::Board(train_id) => self.board(state, world, train_id),
            PassengerAction::Detrain => self.detrain(state, world),
        }
    }

    fn board(
        &self,
        state: &mut PassengerState,
        world: &World,
        train_id: &TrainId,
    ) -> Result<(), SimError> {
        let station = match &state.position {
            PassengerPosition::AtStation(station) => station,
            PassengerPosition::OnTrain(current) => {
                return Err(self.action_error(ActionError::AlreadyOnTrain(current.clone())));
            }
        };

        let train = world
            .train(train_id)
            .ok_or_else(|| self.action_error(ActionError::UnknownTrain(train_id.clone())))?;

        let mut train_state = train.lock_state();
        if !train_state.boarding_possible {
            return Err(self.action_error(ActionError::BoardingNotPossible(train_id.clone())));
        }
        if train_state.position.station() != Some(station) {
            return Err(self.action_error(ActionError::TrainElsewhere {
                train: train_id.clone(),
                station: station.clone(),
                actual: train_state.position.to_string(),
            }));
        }

        train_state.passengers += BigInt::from(self.size.clone());
        debug!(
            "passenger {} boarded {} at {} at tick {}",
            self.id,
            train_id,
            station,
            world.current_time()
        );
        state.position = PassengerPosition::OnTrain(train_id.clone());

        Ok(())
    }

    fn detrain(&self, state: &mut PassengerState, world: &World) -> Result<(), SimError> {
        let train_id = match &state.position {
            PassengerPosition::OnTrain(train) => train,
            PassengerPosition::AtStation(station) => {
                return Err(self.action_error(ActionError::AlreadyAtStation(station.clone())));
            }
        };

        let train = world
            .train(train_id)
            .ok_or_else(|| self.action_error(ActionError::UnknownTrain(train_id.clone())))?;

        let mut train_state = train.lock_state();
        if !train_state.boarding_possible {
            return Err(self.action_error(ActionError::BoardingNotPossible(train_id.clone())));
        }

        let station = train_state.position.station().cloned().ok_or_else(|| {
            SimError::internal(
                self.entity_ref(),
                format!(
                    "train '{train_id}' allows boarding but is at {}",
                    train_state.position
                ),
            )
        })?;

        train_state.passengers -= BigInt::from(self.size.clone());
        debug!(
            "passenger {} left {} at {} at tick {}",
            self.id,
            train_id,
            station,
            world.current_time()
        );

        if station == self.target {
            state.arrival = Some(world.current_time().clone());
        }
        state.position = PassengerPosition::AtStation(station);

        Ok(())
    }
}

impl Validate for Passenger {
    fn entity(&self) -> EntityRef {
        self.entity_ref()
    }

    fn validate_start(&self, world: &World) -> Result<(), Violation> {
        if world.station(&self.start).is_none() {
            return Err(Violation::UnknownStation(self.start.clone()));
        }
        if world.station(&self.target).is_none() {
            return Err(Violation::UnknownStation(self.target.clone()));
        }
        if self.size.is_zero() {
            return Err(Violation::NonPositiveSize(self.size.clone()));
        }
        if self.target_time.is_zero() {
            return Err(Violation::NonPositiveTargetTime(self.target_time.clone()));
        }
        self.validate(world)
    }

    fn validate(&self, world: &World) -> Result<(), Violation> {
        match &lock(&self.state).position {
            PassengerPosition::AtStation(station) => {
                if world.station(station).is_none() {
                    return Err(Violation::UnknownStation(station.clone()));
                }
            }
            PassengerPosition::OnTrain(train) => {
                if world.train(train).is_none() {
                    return Err(Violation::UnknownTrain(train.clone()));
                }
            }
        }
        Ok(())
    }
}
