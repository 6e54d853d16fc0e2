//! Main simulation world that ties everything together
//!
//! The world owns every station, line, train and passenger group and drives
//! the tick loop: trains move, then passengers act, then everything is
//! validated. Each phase fans out one task per entity and joins before the
//! next phase starts.

use log::{debug, info};
use num_bigint::BigUint;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::collections::BTreeMap;

use super::error::{DuplicateId, EntityRef, Phase, PlanError, Rejection, SimError};
use super::parallel::fan_out;
use super::passenger::Passenger;
use super::score;
use super::station::{Line, Station};
use super::train::Train;
use super::types::{
    LineId, PassengerAction, PassengerId, StationId, Tick, TrainAction, TrainId,
};
use super::validator;

/// The main simulation world
#[derive(Debug, Default)]
pub struct World {
    /// All stations
    stations: BTreeMap<StationId, Station>,

    /// All lines
    lines: BTreeMap<LineId, Line>,

    /// All trains
    trains: BTreeMap<TrainId, Train>,

    /// All passenger groups
    passengers: BTreeMap<PassengerId, Passenger>,

    /// The tick being simulated; 0 before the first step
    current_time: Tick,

    /// Last tick to simulate
    max_time: Tick,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stations(&self) -> &BTreeMap<StationId, Station> {
        &self.stations
    }

    pub fn lines(&self) -> &BTreeMap<LineId, Line> {
        &self.lines
    }

    pub fn trains(&self) -> &BTreeMap<TrainId, Train> {
        &self.trains
    }

    pub fn passengers(&self) -> &BTreeMap<PassengerId, Passenger> {
        &self.passengers
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn line(&self, id: &LineId) -> Option<&Line> {
        self.lines.get(id)
    }

    pub fn train(&self, id: &TrainId) -> Option<&Train> {
        self.trains.get(id)
    }

    pub fn passenger(&self, id: &PassengerId) -> Option<&Passenger> {
        self.passengers.get(id)
    }

    pub fn current_time(&self) -> &Tick {
        &self.current_time
    }

    pub fn max_time(&self) -> &Tick {
        &self.max_time
    }

    /// Override the last tick to simulate
    pub fn set_max_time(&mut self, max_time: Tick) {
        self.max_time = max_time;
    }

    /// Add a station
    pub fn add_station(
        &mut self,
        id: impl Into<StationId>,
        capacity: impl Into<BigUint>,
    ) -> Result<(), DuplicateId> {
        let id = id.into();
        if self.stations.contains_key(&id) {
            return Err(DuplicateId(EntityRef::Station(id)));
        }
        self.stations
            .insert(id.clone(), Station::new(id, capacity.into()));
        Ok(())
    }

    /// Add an undirected line between two stations
    pub fn add_line(
        &mut self,
        id: impl Into<LineId>,
        start: impl Into<StationId>,
        end: impl Into<StationId>,
        length: BigRational,
        max_capacity: impl Into<BigUint>,
    ) -> Result<(), DuplicateId> {
        let id = id.into();
        if self.lines.contains_key(&id) {
            return Err(DuplicateId(EntityRef::Line(id)));
        }
        let line = Line::new(
            id.clone(),
            start.into(),
            end.into(),
            length,
            max_capacity.into(),
        );
        self.lines.insert(id, line);
        Ok(())
    }

    /// Add a train, either at a station or (with `None`) on the wildcard.
    ///
    /// A train placed at a known station counts towards that station's
    /// resident trains right away. An unknown station is left for start
    /// validation to report.
    pub fn add_train(
        &mut self,
        id: impl Into<TrainId>,
        start: Option<StationId>,
        speed: BigRational,
        capacity: impl Into<BigUint>,
    ) -> Result<(), DuplicateId> {
        let id = id.into();
        if self.trains.contains_key(&id) {
            return Err(DuplicateId(EntityRef::Train(id)));
        }
        if let Some(station) = start.as_ref().and_then(|s| self.stations.get(s)) {
            station.train_arrived();
        }
        self.trains
            .insert(id.clone(), Train::new(id, start, speed, capacity.into()));
        Ok(())
    }

    /// Add a passenger group waiting at `start`
    pub fn add_passenger(
        &mut self,
        id: impl Into<PassengerId>,
        start: impl Into<StationId>,
        target: impl Into<StationId>,
        size: impl Into<BigUint>,
        target_time: impl Into<Tick>,
    ) -> Result<(), DuplicateId> {
        let id = id.into();
        if self.passengers.contains_key(&id) {
            return Err(DuplicateId(EntityRef::Passenger(id)));
        }
        let passenger = Passenger::new(
            id.clone(),
            start.into(),
            target.into(),
            size.into(),
            target_time.into(),
        );
        self.passengers.insert(id, passenger);
        Ok(())
    }

    fn extend_max_time(&mut self, tick: &Tick) {
        if *tick >= self.max_time {
            self.max_time = tick + BigUint::one();
        }
    }

    /// Resolve a wildcard train to a station before the first tick
    pub fn start_train(&mut self, id: &TrainId, station: &StationId) -> Result<(), PlanError> {
        let train = self
            .trains
            .get(id)
            .ok_or_else(|| PlanError::UnknownTrain(id.clone()))?;
        let target = self
            .stations
            .get(station)
            .ok_or_else(|| PlanError::UnknownStation(station.clone()))?;

        train
            .place(station.clone())
            .map_err(|error| PlanError::Rejected {
                entity: EntityRef::Train(id.clone()),
                error,
            })?;
        target.train_arrived();
        Ok(())
    }

    /// Script a train action.
    ///
    /// Tick 0 only takes `Start`, which is applied immediately. Every other
    /// action runs during the given tick.
    pub fn schedule_train(
        &mut self,
        id: &TrainId,
        tick: Tick,
        action: TrainAction,
    ) -> Result<(), PlanError> {
        if tick.is_zero() {
            return match action {
                TrainAction::Start(station) => self.start_train(id, &station),
                TrainAction::Depart(_) => Err(PlanError::MustStart(tick)),
            };
        }

        let train = self
            .trains
            .get_mut(id)
            .ok_or_else(|| PlanError::UnknownTrain(id.clone()))?;
        if train.plan.contains_key(&tick) {
            return Err(PlanError::DuplicateTick {
                entity: EntityRef::Train(id.clone()),
                tick,
            });
        }
        train.plan.insert(tick.clone(), action);
        self.extend_max_time(&tick);
        Ok(())
    }

    /// Script a passenger action; ticks start at 1
    pub fn schedule_passenger(
        &mut self,
        id: &PassengerId,
        tick: Tick,
        action: PassengerAction,
    ) -> Result<(), PlanError> {
        if tick.is_zero() {
            return Err(PlanError::NonPositiveTick);
        }

        let passenger = self
            .passengers
            .get_mut(id)
            .ok_or_else(|| PlanError::UnknownPassenger(id.clone()))?;
        if passenger.plan.contains_key(&tick) {
            return Err(PlanError::DuplicateTick {
                entity: EntityRef::Passenger(id.clone()),
                tick,
            });
        }
        passenger.plan.insert(tick.clone(), action);
        self.extend_max_time(&tick);
        Ok(())
    }

    /// Check everything that must hold before the first tick
    pub fn run_start_validation(&self) -> Vec<SimError> {
        validator::validate_start(self)
    }

    /// Check the per-tick invariants of every entity
    pub fn validate(&self) -> Vec<SimError> {
        validator::validate(self)
    }

    /// Whether there are ticks left to simulate
    pub fn is_finished(&self) -> bool {
        self.current_time >= self.max_time
    }

    /// Simulate one tick
    pub fn step(&mut self) -> Result<(), Rejection> {
        self.current_time += 1u32;
        let world = &*self;
        let tick = &world.current_time;
        debug!("Timestep {tick}");

        let errors = fan_out(&world.trains, |(_, train)| train.update(world));
        if !errors.is_empty() {
            return Err(Rejection::new(Phase::Trains, tick.clone(), errors));
        }

        let errors = fan_out(&world.passengers, |(_, passenger)| passenger.update(world));
        if !errors.is_empty() {
            return Err(Rejection::new(Phase::Passengers, tick.clone(), errors));
        }

        debug!("Validate {tick}");
        let errors = world.validate();
        if !errors.is_empty() {
            return Err(Rejection::new(Phase::Validation, tick.clone(), errors));
        }

        Ok(())
    }

    /// Score a fully simulated world
    pub fn finalize(&self) -> Result<BigUint, Rejection> {
        score::total_delay(self)
            .map_err(|errors| Rejection::new(Phase::Scoring, self.current_time.clone(), errors))
    }

    /// Validate, run every tick and score
    pub fn simulate(&mut self) -> Result<BigUint, Rejection> {
        info!(
            "Simulating {} stations, {} lines, {} trains, {} passenger groups over {} ticks",
            self.stations.len(),
            self.lines.len(),
            self.trains.len(),
            self.passengers.len(),
            self.max_time
        );

        let errors = self.run_start_validation();
        if !errors.is_empty() {
            return Err(Rejection::new(
                Phase::StartValidation,
                self.current_time.clone(),
                errors,
            ));
        }

        while !self.is_finished() {
            self.step()?;
        }

        let delay = self.finalize()?;
        info!("=== SIMULATION COMPLETE === total delay: {delay}");
        Ok(delay)
    }
}

/// Simulate a world, returning the total weighted delay or why the plan was
/// rejected
pub fn simulate(world: &mut World) -> Result<BigUint, Rejection> {
    world.simulate()
}

