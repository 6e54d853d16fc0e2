//! Rail network simulation
//!
//! This module contains the deterministic judge for rail operating plans:
//! the train and passenger state machines, the per-tick update and
//! validation protocol, and the delay score. It knows nothing about input
//! files or console output.

mod config;
mod error;
mod network;
mod parallel;
mod passenger;
mod score;
mod station;
mod train;
mod types;
mod validator;
mod world;

pub use config::SimConfig;
pub use error::{
    ActionError, DuplicateId, EntityRef, Phase, PlanError, Rejection, SimError, Violation,
};
pub use network::RailNetwork;
pub use parallel::fan_out;
pub use passenger::Passenger;
pub use score::total_delay;
pub use station::{Line, Station};
pub use train::Train;
pub use types::{
    LineId, PassengerAction, PassengerId, PassengerPosition, StationId, Tick, TrainAction,
    TrainId, TrainPosition,
};
pub use validator::Validate;
pub use world::{simulate, World};
