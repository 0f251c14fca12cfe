//! Randomised checks with a fixed seed.

use dispatch_core::spatial::distance;
use dispatch_core::{
    query_available_drones, AreaSnapshot, AvailabilityBook, Capability, Dispatch, Drone,
    GreedyPathFinder, PathFinder, PlannerConfig, Position, Requirements, STEP,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CASES: usize = 200;

#[test]
fn undersized_drone_is_never_offered() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let book = AvailabilityBook::default();

    for case in 0..CASES {
        let requirement = rng.random_range(0.1..20.0);
        let drones: Vec<Drone> = (0..8)
            .map(|i| Drone {
                id: format!("{case}-{i}"),
                name: String::new(),
                capability: Capability {
                    capacity: rng.random_range(0.0..20.0),
                    cooling: rng.random_bool(0.5),
                    heating: rng.random_bool(0.5),
                    max_moves: 2000,
                    ..Default::default()
                },
            })
            .collect();
        let dispatch = Dispatch::new(
            1,
            Requirements {
                capacity: requirement,
                ..Default::default()
            },
            Position::new(0.0, 0.0),
        );

        let offered = query_available_drones(&drones, &[dispatch], &book);
        for drone in drones.iter().filter(|d| d.capability.capacity < requirement - 1e-12) {
            assert!(
                !offered.contains(&drone.id),
                "drone {} with capacity {} offered for {}",
                drone.id,
                drone.capability.capacity,
                requirement
            );
        }
    }
}

#[test]
fn open_sky_greedy_path_closes_in_on_the_target() {
    let mut rng = StdRng::seed_from_u64(42);
    let areas = AreaSnapshot::default();
    let config = PlannerConfig::default();
    let finder = GreedyPathFinder::new(&areas, &config);

    for _ in 0..CASES {
        let start = Position::new(
            -3.19 + rng.random_range(-0.005..0.005),
            55.94 + rng.random_range(-0.005..0.005),
        );
        let end = Position::new(
            -3.19 + rng.random_range(-0.005..0.005),
            55.94 + rng.random_range(-0.005..0.005),
        );

        let path = finder.find(start, end).expect("open sky always has a path");
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));

        let mut previous = distance(start, end);
        for pair in path.windows(2) {
            assert!(distance(pair[0], pair[1]) <= STEP + 1e-12);
            let remaining = distance(pair[1], end);
            assert!(remaining <= previous + 1e-12);
            previous = remaining;
        }
    }
}
