//! Core types for the rail simulation
//!
//! Identifiers, positions and scripted actions shared by every entity.

use num_bigint::BigUint;
use std::fmt;

/// A discrete simulation time unit. Ticks are unbounded, so they are kept as
/// arbitrary-precision integers.
pub type Tick = BigUint;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// A wrapper type for station IDs
    StationId
);
string_id!(
    /// A wrapper type for line IDs
    LineId
);
string_id!(
    /// A wrapper type for train IDs
    TrainId
);
string_id!(
    /// A wrapper type for passenger group IDs
    PassengerId
);

/// Where a train currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainPosition {
    /// Wildcard placement; only an explicit tick-0 `Start` resolves it.
    Pending,
    /// Resident at a station, counted in its `current_trains`.
    AtStation(StationId),
    /// In transit, counted in the line's `current_capacity`.
    OnLine {
        line: LineId,
        /// The station the train departed from.
        origin: StationId,
        destination: StationId,
        /// Whole ticks travelled since departure.
        since: BigUint,
    },
}

impl TrainPosition {
    /// The station the train is resident at, if any.
    pub fn station(&self) -> Option<&StationId> {
        match self {
            TrainPosition::AtStation(station) => Some(station),
            _ => None,
        }
    }
}

impl fmt::Display for TrainPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainPosition::Pending => f.write_str("*"),
            TrainPosition::AtStation(station) => write!(f, "station {station}"),
            TrainPosition::OnLine {
                line,
                destination,
                since,
                ..
            } => write!(f, "line {line} towards {destination} ({since} ticks)"),
        }
    }
}

/// Where a passenger group currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassengerPosition {
    AtStation(StationId),
    OnTrain(TrainId),
}

impl fmt::Display for PassengerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassengerPosition::AtStation(station) => write!(f, "station {station}"),
            PassengerPosition::OnTrain(train) => write!(f, "train {train}"),
        }
    }
}

/// A scripted train action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainAction {
    Start(StationId),
    Depart(LineId),
}

impl fmt::Display for TrainAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainAction::Start(station) => write!(f, "Start {station}"),
            TrainAction::Depart(line) => write!(f, "Depart {line}"),
        }
    }
}

/// A scripted passenger action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassengerAction {
    Board(TrainId),
    Detrain,
}

impl fmt::Display for PassengerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassengerAction::Board(train) => write!(f, "Board {train}"),
            PassengerAction::Detrain => f.write_str("Detrain"),
        }
    }
}
