//! Rail Network Simulation Library
//!
//! A deterministic judge for rail operating plans: it simulates a network of
//! stations and lines tick by tick, enforces every capacity and movement
//! invariant, and scores the plan by the total weighted passenger delay.

pub mod input;
pub mod simulation;
