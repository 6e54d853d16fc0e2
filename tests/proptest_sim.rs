//! Property-based tests for the rail simulation.
//!
//! Random line networks with random (mostly invalid) plans are simulated to
//! check that outcomes are reproducible and that the occupancy counters
//! always account for every train and passenger.

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::Zero;
use proptest::prelude::*;
use rail_sim::simulation::{
    LineId, PassengerAction, PassengerId, PassengerPosition, SimConfig, StationId, TrainAction,
    TrainId, World,
};

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
struct Scenario {
    /// One (numerator, denominator) length per line of the chain S0 - S1 - ...
    lengths: Vec<(i64, i64)>,
    /// (start station, speed numerator, speed denominator)
    trains: Vec<(usize, i64, i64)>,
    /// (train, tick, line)
    departures: Vec<(usize, u32, usize)>,
    groups: Vec<Group>,
}

#[derive(Debug, Clone)]
struct Group {
    start: usize,
    target: usize,
    size: u32,
    target_time: u32,
    /// (tick, Some(train) to board or None to detrain)
    actions: Vec<(u32, Option<usize>)>,
}

fn arb_group(stations: usize, trains: usize) -> impl Strategy<Value = Group> {
    (
        0..stations,
        0..stations,
        1..=3u32,
        1..=12u32,
        proptest::collection::vec((1..=12u32, proptest::option::of(0..trains)), 0..4),
    )
        .prop_map(|(start, target, size, target_time, actions)| Group {
            start,
            target,
            size,
            target_time,
            actions,
        })
}

fn arb_scenario() -> impl Strategy<Value = Scenario> {
    (2..=5usize, 1..=3usize).prop_flat_map(|(stations, trains)| {
        (
            proptest::collection::vec((1..=6i64, 1..=3i64), stations - 1),
            proptest::collection::vec((0..stations, 1..=4i64, 1..=2i64), trains),
            proptest::collection::vec((0..trains, 1..=12u32, 0..stations - 1), 0..8),
            proptest::collection::vec(arb_group(stations, trains), 0..4),
        )
            .prop_map(|(lengths, trains, departures, groups)| Scenario {
                lengths,
                trains,
                departures,
                groups,
            })
    })
}

fn ratio(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

fn build(scenario: &Scenario) -> World {
    let station = |i: usize| StationId::from(format!("S{i}"));
    let train = |i: usize| TrainId::from(format!("T{i}"));
    let capacity = scenario.trains.len() as u32;

    let mut world = World::new();
    for i in 0..=scenario.lengths.len() {
        world.add_station(station(i), capacity).unwrap();
    }
    for (i, &(n, d)) in scenario.lengths.iter().enumerate() {
        world
            .add_line(format!("L{i}"), station(i), station(i + 1), ratio(n, d), capacity)
            .unwrap();
    }
    for (i, &(start, n, d)) in scenario.trains.iter().enumerate() {
        world
            .add_train(train(i), Some(station(start)), ratio(n, d), 100u32)
            .unwrap();
    }
    for &(t, tick, line) in &scenario.departures {
        // Colliding ticks are dropped, the rest of the plan still runs
        let _ = world.schedule_train(
            &train(t),
            BigUint::from(tick),
            TrainAction::Depart(LineId::from(format!("L{line}"))),
        );
    }
    for (i, group) in scenario.groups.iter().enumerate() {
        let id = PassengerId::from(format!("P{i}"));
        world
            .add_passenger(
                id.clone(),
                station(group.start),
                station(group.target),
                group.size,
                group.target_time,
            )
            .unwrap();
        for &(tick, on) in &group.actions {
            let action = match on {
                Some(t) => PassengerAction::Board(train(t)),
                None => PassengerAction::Detrain,
            };
            let _ = world.schedule_passenger(&id, BigUint::from(tick), action);
        }
    }
    world
}

fn placed_trains(world: &World) -> BigInt {
    let at_stations: BigInt = world.stations().values().map(|s| s.current_trains()).sum();
    let on_lines: BigInt = world.lines().values().map(|l| l.current_capacity()).sum();
    at_stations + on_lines
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The same world and plan always produce the same outcome and end state,
    /// whatever the worker count.
    #[test]
    fn simulation_is_deterministic(scenario in arb_scenario()) {
        let mut first = build(&scenario);
        let mut second = build(&scenario);

        let a = SimConfig::with_threads(1).run(&mut first).unwrap();
        let b = SimConfig::with_threads(4).run(&mut second).unwrap();
        prop_assert_eq!(a, b);

        for (id, train) in first.trains() {
            let other = second.train(id).unwrap();
            prop_assert_eq!(train.position(), other.position());
            prop_assert_eq!(train.passengers(), other.passengers());
        }
        for (id, passenger) in first.passengers() {
            let other = second.passenger(id).unwrap();
            prop_assert_eq!(passenger.position(), other.position());
            prop_assert_eq!(passenger.arrival_time(), other.arrival_time());
        }
    }

    /// After every accepted tick each train is counted exactly once and each
    /// train carries exactly the groups aboard it.
    #[test]
    fn counters_are_conserved(scenario in arb_scenario()) {
        let mut world = build(&scenario);
        let trains = BigInt::from(scenario.trains.len());
        prop_assert!(world.run_start_validation().is_empty());
        prop_assert_eq!(placed_trains(&world), trains.clone());

        while !world.is_finished() {
            if world.step().is_err() {
                break;
            }
            prop_assert_eq!(placed_trains(&world), trains.clone());

            for (id, train) in world.trains() {
                let aboard: BigUint = world
                    .passengers()
                    .values()
                    .filter(|p| p.position() == PassengerPosition::OnTrain(id.clone()))
                    .map(|p| p.size.clone())
                    .sum();
                prop_assert_eq!(train.passengers(), BigInt::from(aboard));
            }
        }
    }

    /// An accepted plan delivers every group to its target
    #[test]
    fn accepted_runs_deliver_everyone(scenario in arb_scenario()) {
        let mut world = build(&scenario);
        if let Ok(delay) = world.simulate() {
            let mut expected = BigUint::zero();
            for passenger in world.passengers().values() {
                prop_assert_eq!(
                    passenger.position(),
                    PassengerPosition::AtStation(passenger.target.clone())
                );
                prop_assert!(passenger.arrival_time().is_some());
                expected += passenger.delay().unwrap();
            }
            prop_assert_eq!(delay, expected);
        }
    }
}
