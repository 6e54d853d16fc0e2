//! Stations and the lines between them
//!
//! Both carry a capacity and a counter of the trains currently using them.
//! The counters are mutated by trains during their update, so each one sits
//! behind its own lock.

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::sync::Mutex;

use super::error::{EntityRef, Violation};
use super::parallel::lock;
use super::types::{LineId, StationId};
use super::validator::Validate;
use super::world::World;

/// A capacity-bounded node of the network
#[derive(Debug)]
pub struct Station {
    pub id: StationId,
    pub capacity: BigUint,
    current_trains: Mutex<BigInt>,
}

impl Station {
    pub fn new(id: StationId, capacity: BigUint) -> Self {
        Self {
            id,
            capacity,
            current_trains: Mutex::new(BigInt::zero()),
        }
    }

    /// Number of trains resident right now
    pub fn current_trains(&self) -> BigInt {
        lock(&self.current_trains).clone()
    }

    pub(crate) fn train_arrived(&self) {
        *lock(&self.current_trains) += BigInt::one();
    }

    pub(crate) fn train_departed(&self) {
        *lock(&self.current_trains) -= BigInt::one();
    }
}

impl Validate for Station {
    fn entity(&self) -> EntityRef {
        EntityRef::Station(self.id.clone())
    }

    fn validate_start(&self, world: &World) -> Result<(), Violation> {
        if self.capacity.is_zero() {
            return Err(Violation::NonPositiveCapacity(self.capacity.clone()));
        }
        self.validate(world)
    }

    fn validate(&self, _world: &World) -> Result<(), Violation> {
        let current = self.current_trains();
        if current.is_negative() {
            return Err(Violation::NegativeCounter {
                counter: "trains",
                current,
            });
        }
        if current > BigInt::from(self.capacity.clone()) {
            return Err(Violation::TooManyTrains {
                capacity: self.capacity.clone(),
                current,
            });
        }
        Ok(())
    }
}

/// An undirected, capacity-bounded edge between two distinct stations
#[derive(Debug)]
pub struct Line {
    pub id: LineId,
    pub ends: [StationId; 2],
    pub length: BigRational,
    pub max_capacity: BigUint,
    current_capacity: Mutex<BigInt>,
}

impl Line {
    pub fn new(
        id: LineId,
        start: StationId,
        end: StationId,
        length: BigRational,
        max_capacity: BigUint,
    ) -> Self {
        Self {
            id,
            ends: [start, end],
            length,
            max_capacity,
            current_capacity: Mutex::new(BigInt::zero()),
        }
    }

    /// Number of trains in transit right now
    pub fn current_capacity(&self) -> BigInt {
        lock(&self.current_capacity).clone()
    }

    pub fn connects(&self, station: &StationId) -> bool {
        self.ends.contains(station)
    }

    /// The end opposite to `station`, or `None` if the line does not touch it
    pub fn other_end(&self, station: &StationId) -> Option<&StationId> {
        let [a, b] = &self.ends;
        if a == station {
            Some(b)
        } else if b == station {
            Some(a)
        } else {
            None
        }
    }

    pub(crate) fn train_entered(&self) {
        *lock(&self.current_capacity) += BigInt::one();
    }

    pub(crate) fn train_left(&self) {
        *lock(&self.current_capacity) -= BigInt::one();
    }
}

impl Validate for Line {
    fn entity(&self) -> EntityRef {
        EntityRef::Line(self.id.clone())
    }

    fn validate_start(&self, world: &World) -> Result<(), Violation> {
        for end in &self.ends {
            if world.station(end).is_none() {
                return Err(Violation::UnknownStation(end.clone()));
            }
        }
        if self.ends[0] == self.ends[1] {
            return Err(Violation::LoopLine(self.ends[0].clone()));
        }
        if !self.length.is_positive() {
            return Err(Violation::NonPositiveLength(self.length.clone()));
        }
        if self.max_capacity.is_zero() {
            return Err(Violation::NonPositiveCapacity(self.max_capacity.clone()));
        }
        self.validate(world)
    }

    fn validate(&self, _world: &World) -> Result<(), Violation> {
        let current = self.current_capacity();
        if current.is_negative() {
            return Err(Violation::NegativeCounter {
                counter: "trains in transit",
                current,
            });
        }
        if current > BigInt::from(self.max_capacity.clone()) {
            return Err(Violation::TooManyTrains {
                capacity: self.max_capacity.clone(),
                current,
            });
        }
        Ok(())
    }
}
