use proptest::prelude::*;

use u_cvrptw::colgen::{ColumnGeneration, RunOutcome, Termination};
use u_cvrptw::config::Config;
use u_cvrptw::generator::{generate, GeneratorConfig, DEPOT_NAME};
use u_cvrptw::lp::MicroLpSolver;
use u_cvrptw::models::InputTables;

const MAX_ITERATIONS: usize = 12;

prop_compose! {
    fn small_instance()
    (
     customers in 1usize..=4,
     seed in any::<u64>(),
     capacity in 8u32..=20,
     window_width in 15u32..=120,
    ) -> GeneratorConfig {
        GeneratorConfig::new(customers, seed)
            .with_grid_size(60.0)
            .with_capacity(f64::from(capacity))
            .with_max_demand(8)
            .with_window_width(f64::from(window_width))
            .with_horizon(200.0)
    }
}

fn solve(tables: &InputTables) -> RunOutcome {
    let config = Config::default()
        .with_max_iterations(MAX_ITERATIONS)
        .with_parallel_pricing(false);
    match ColumnGeneration::new(config, &MicroLpSolver).run_tables(tables) {
        Ok(outcome) => outcome,
        Err(err) => panic!("run failed: {err}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_plan_covers_each_customer_once(config in small_instance()) {
        let tables = generate(&config).expect("generate");
        let outcome = solve(&tables);

        let mut served: Vec<&str> = outcome
            .plan
            .stop_records()
            .filter(|s| s.location_name != DEPOT_NAME)
            .map(|s| s.location_name.as_str())
            .collect();
        served.sort_unstable();
        let mut expected: Vec<&str> = tables.customers.iter().map(|c| c.location_name.as_str()).collect();
        expected.sort_unstable();
        prop_assert_eq!(served, expected);
    }

    #[test]
    fn test_plan_respects_capacity_and_windows(config in small_instance()) {
        let tables = generate(&config).expect("generate");
        let outcome = solve(&tables);
        let depot = &tables.depots[0];

        for route in &outcome.plan.routes {
            prop_assert!(route.load <= config.capacity + 1e-9);
            for stop in &route.stops {
                let (start, end) = match tables.customers.iter().find(|c| c.location_name == stop.location_name) {
                    Some(c) => (c.time_window_start, c.time_window_end),
                    None => (depot.time_window_start, depot.time_window_end),
                };
                prop_assert!(stop.arrival_time >= start - 1e-9, "{} served at {} before {}", stop.vertex_name, stop.arrival_time, start);
                prop_assert!(stop.arrival_time <= end + 1e-9, "{} served at {} after {}", stop.vertex_name, stop.arrival_time, end);
            }
        }
        let total: f64 = outcome.plan.routes.iter().map(|r| r.cost).sum();
        prop_assert!((total - outcome.plan.objective).abs() < 1e-6);
    }

    #[test]
    fn test_pool_grows_once_per_iteration(config in small_instance()) {
        let tables = generate(&config).expect("generate");
        let outcome = solve(&tables);

        prop_assert!(outcome.iterations <= MAX_ITERATIONS);
        prop_assert_eq!(outcome.pool.len(), tables.customers.len() + outcome.iterations);
        for (i, record) in outcome.history.iter().enumerate() {
            prop_assert_eq!(record.iteration, i);
            prop_assert_eq!(record.pool_size, tables.customers.len() + i);
        }
        match outcome.termination {
            Termination::Converged => prop_assert_eq!(outcome.history.len(), outcome.iterations + 1),
            Termination::IterationLimit => {
                prop_assert_eq!(outcome.iterations, MAX_ITERATIONS);
                prop_assert_eq!(outcome.history.len(), MAX_ITERATIONS);
            }
        }
    }
}
