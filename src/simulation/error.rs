//! Error types for the rail simulation

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use std::fmt;

use super::types::{LineId, PassengerId, StationId, Tick, TrainId};

/// The entity a diagnostic is about
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityRef {
    Station(StationId),
    Line(LineId),
    Train(TrainId),
    Passenger(PassengerId),
    World,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Station(id) => write!(f, "station '{id}'"),
            EntityRef::Line(id) => write!(f, "line '{id}'"),
            EntityRef::Train(id) => write!(f, "train '{id}'"),
            EntityRef::Passenger(id) => write!(f, "passenger '{id}'"),
            EntityRef::World => f.write_str("world"),
        }
    }
}

/// An invariant that does not hold
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("capacity '{0}' must be larger than 0")]
    NonPositiveCapacity(BigUint),
    #[error("length '{0}' must be larger than 0")]
    NonPositiveLength(BigRational),
    #[error("speed '{0}' must be larger than 0")]
    NonPositiveSpeed(BigRational),
    #[error("size '{0}' must be positive")]
    NonPositiveSize(BigUint),
    #[error("target time '{0}' must be positive")]
    NonPositiveTargetTime(BigUint),
    #[error("start and end are the same station '{0}'")]
    LoopLine(StationId),
    #[error("too many trains (capacity: {capacity}, current: {current})")]
    TooManyTrains { capacity: BigUint, current: BigInt },
    #[error("too many passengers (capacity: {capacity}, current: {current})")]
    TooManyPassengers { capacity: BigUint, current: BigInt },
    #[error("{counter} must not be negative (current: {current})")]
    NegativeCounter {
        counter: &'static str,
        current: BigInt,
    },
    #[error("unknown station '{0}'")]
    UnknownStation(StationId),
    #[error("unknown line '{0}'")]
    UnknownLine(LineId),
    #[error("unknown train '{0}'")]
    UnknownTrain(TrainId),
    #[error("destination '{destination}' is not the end of line '{line}' opposite '{origin}'")]
    WrongDestination {
        line: LineId,
        origin: StationId,
        destination: StationId,
    },
    #[error("not all stations are connected ({components} separate parts)")]
    Disconnected { components: usize },
    #[error("does not reach target '{0}'")]
    TargetNotReached(StationId),
}

/// An illegal transition requested by a scripted action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("new plan but train is still on line '{0}'")]
    StillOnLine(LineId),
    #[error("new plan but train is still on '*' (no Start rule)")]
    NotStarted,
    #[error("train must be at '*' for Start (currently: {0})")]
    AlreadyPlaced(String),
    #[error("Start is not allowed at tick {0}")]
    StartNotAllowed(Tick),
    #[error("unknown target line '{0}'")]
    UnknownLine(LineId),
    #[error("target line '{line}' does not connect to current station '{station}'")]
    LineNotConnected { line: LineId, station: StationId },
    #[error("can not find train '{0}'")]
    UnknownTrain(TrainId),
    #[error("can not board train '{0}', already on a train")]
    AlreadyOnTrain(TrainId),
    #[error("can not detrain, already at station '{0}'")]
    AlreadyAtStation(StationId),
    #[error("boarding not possible at train '{0}'")]
    BoardingNotPossible(TrainId),
    #[error("train '{train}' is not at station '{station}' (currently: {actual})")]
    TrainElsewhere {
        train: TrainId,
        station: StationId,
        actual: String,
    },
}

/// A single diagnostic produced while validating or updating an entity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("validation failed for {entity}: {violation}")]
    Invalid {
        entity: EntityRef,
        violation: Violation,
    },
    #[error("{entity}: {error}")]
    Action { entity: EntityRef, error: ActionError },
    /// A state the engine itself should never produce.
    #[error("[internal] {entity}: {reason}")]
    Internal { entity: EntityRef, reason: String },
}

impl SimError {
    pub fn invalid(entity: EntityRef, violation: Violation) -> Self {
        SimError::Invalid { entity, violation }
    }

    pub fn action(entity: EntityRef, error: ActionError) -> Self {
        SimError::Action { entity, error }
    }

    pub fn internal(entity: EntityRef, reason: impl Into<String>) -> Self {
        SimError::Internal {
            entity,
            reason: reason.into(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, SimError::Internal { .. })
    }

    pub fn entity(&self) -> &EntityRef {
        match self {
            SimError::Invalid { entity, .. }
            | SimError::Action { entity, .. }
            | SimError::Internal { entity, .. } => entity,
        }
    }
}

/// The stage of a run at which it was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    StartValidation,
    Trains,
    Passengers,
    Validation,
    Scoring,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::StartValidation => "initial validation",
            Phase::Trains => "trains",
            Phase::Passengers => "passengers",
            Phase::Validation => "validation",
            Phase::Scoring => "scoring",
        };
        f.write_str(name)
    }
}

/// Why a plan was rejected. Carries every diagnostic collected in the
/// failing phase.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{phase} failed at tick {tick} with {} error(s)", .errors.len())]
pub struct Rejection {
    pub phase: Phase,
    pub tick: Tick,
    pub errors: Vec<SimError>,
}

impl Rejection {
    pub fn new(phase: Phase, tick: Tick, errors: Vec<SimError>) -> Self {
        Self {
            phase,
            tick,
            errors,
        }
    }

    /// Human-readable descriptions, one per diagnostic.
    pub fn descriptions(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Returned by the world builder when an ID is reused within one class
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} found twice")]
pub struct DuplicateId(pub EntityRef);

/// Raised while attaching scripted actions to a world
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("no valid train id ({0})")]
    UnknownTrain(TrainId),
    #[error("no valid passenger id ({0})")]
    UnknownPassenger(PassengerId),
    #[error("station '{0}' does not exist")]
    UnknownStation(StationId),
    #[error("time {tick} already in plan of {entity}")]
    DuplicateTick { entity: EntityRef, tick: Tick },
    #[error("time {0} must be 'Start'")]
    MustStart(Tick),
    #[error("time must be positive")]
    NonPositiveTick,
    #[error("{entity}: {error}")]
    Rejected { entity: EntityRef, error: ActionError },
}
