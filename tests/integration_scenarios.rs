//! Hand-checked scenarios for single vehicles, grid overload, and queueing.

mod common;

use ev_charge_sim::error::{AssignmentError, SimError};
use ev_charge_sim::fleet::VehicleProfile;
use ev_charge_sim::sim::assignment::AssignmentTable;
use ev_charge_sim::sim::blackout::BlackoutWindow;
use ev_charge_sim::sim::engine::Engine;
use ev_charge_sim::sim::horizon::Horizon;
use ev_charge_sim::sim::strategy::{DedicatedShare, SharedPool, StaticAssignment, Strategy};
use ev_charge_sim::sim::types::{SimConfig, SimulationOutput};

/// One day, 15-minute steps: 08:00 is step 32, 18:00 is step 72.
fn single_commuter(horizon: &Horizon) -> VehicleProfile {
    VehicleProfile::new(
        0,
        50.0,
        5.0,
        40.0,
        30.0,
        vec![horizon.step_at(0, 8.0)],
        vec![horizon.step_at(0, 18.0)],
        vec![10.0],
        horizon.total_steps(),
    )
    .unwrap()
}

fn stay_at_home(id: usize, soc_init: f32, horizon: &Horizon) -> VehicleProfile {
    VehicleProfile::new(
        id,
        50.0,
        5.0,
        40.0,
        soc_init,
        vec![],
        vec![],
        vec![],
        horizon.total_steps(),
    )
    .unwrap()
}

fn run(config: SimConfig, strategy: Strategy, profiles: Vec<VehicleProfile>) -> SimulationOutput {
    let household = common::flat_household(&config.horizon, 20.0);
    Engine::new(config, strategy, profiles, household)
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn single_vehicle_dedicated_point() {
    let horizon = Horizon::new(15, 1);
    let per_step = 7.2 * 0.25;
    let out = run(
        common::default_config(&horizon),
        Strategy::Dedicated(DedicatedShare),
        vec![single_commuter(&horizon)],
    );
    let soc = &out.vehicles[0].state.soc_kwh;

    // No charging at t = 0, then full rated power until SOC-max.
    assert_eq!(soc[0], 30.0);
    assert!((soc[1] - (30.0 + per_step)).abs() < 1e-4);
    assert_eq!(soc[31], 40.0);

    // Trip energy booked at 18:00, before any charging.
    assert!((soc[72] - 30.0).abs() < 1e-4);
    assert_eq!(out.vehicles[0].state.charging_kw[72], 0.0);
    for t in 73..=78 {
        let expected = (30.0 + per_step * (t - 72) as f32).min(40.0);
        assert!(
            (soc[t] - expected).abs() < 1e-3,
            "t={t}: soc {} expected {expected}",
            soc[t]
        );
    }
    assert_eq!(soc[horizon.final_step()], 40.0);
}

#[test]
fn single_vehicle_leaves_before_full() {
    // Starts at 30 kWh and needs 10 kWh; arrives at 18:00 with 20 kWh once
    // the morning top-up is suppressed by a 00:00-08:00 blackout.
    let horizon = Horizon::new(15, 1);
    let config = common::default_config(&horizon).with_blackout(BlackoutWindow::new(0.0, 8.0));
    let out = run(
        config,
        Strategy::Dedicated(DedicatedShare),
        vec![single_commuter(&horizon)],
    );
    let v = &out.vehicles[0];

    assert!((v.state.soc_kwh[31] - 30.0).abs() < 1e-4);
    assert!((v.state.soc_kwh[72] - 20.0).abs() < 1e-4);
    assert!((v.state.soc_kwh[73] - 21.8).abs() < 1e-3);
    assert!(v.state.charging_kw[..32].iter().all(|&kw| kw == 0.0));
    assert!((v.state.charging_kw[73] - 7.2).abs() < 1e-3);
}

#[test]
fn household_over_capacity_aborts_before_output() {
    let horizon = Horizon::new(60, 1);
    let config = SimConfig::new(horizon.clone(), 500.0, 7.2);
    let household = common::flat_household(&horizon, 600.0);
    let err = Engine::new(
        config,
        Strategy::Dedicated(DedicatedShare),
        vec![stay_at_home(0, 20.0, &horizon)],
        household,
    );
    match err {
        Err(SimError::CapacityExceeded {
            timestep,
            household_kw,
            grid_max_kw,
        }) => {
            assert_eq!(timestep, 0);
            assert_eq!(household_kw, 600.0);
            assert_eq!(grid_max_kw, 500.0);
        }
        Err(e) => panic!("expected CapacityExceeded, got {e}"),
        Ok(_) => panic!("expected CapacityExceeded, engine was built"),
    }
}

#[test]
fn shared_single_point_serves_one_vehicle_at_a_time() {
    let horizon = Horizon::new(15, 1);
    let profiles = vec![
        stay_at_home(0, 10.0, &horizon),
        stay_at_home(1, 20.0, &horizon),
        stay_at_home(2, 30.0, &horizon),
    ];
    let out = run(
        common::default_config(&horizon),
        Strategy::Shared(SharedPool {
            num_cp: 1,
            max_duration_steps: None,
        }),
        profiles,
    );

    for t in horizon.timesteps() {
        let charging = out
            .vehicles
            .iter()
            .filter(|v| v.state.charging_kw[t] > 0.0)
            .count();
        assert!(charging <= 1, "{charging} vehicles charging at t={t}");
    }
    assert_eq!(out.stats.max_queue_len, 2);

    // Lowest SOC fraction first; the next starts only once the previous is full.
    let last_charge = |id: usize| {
        horizon
            .timesteps()
            .filter(|&t| out.vehicles[id].state.charging_kw[t] > 0.0)
            .max()
    };
    let first_charge = |id: usize| {
        horizon
            .timesteps()
            .find(|&t| out.vehicles[id].state.charging_kw[t] > 0.0)
    };
    assert_eq!(first_charge(0), Some(1));
    assert!(first_charge(1) > last_charge(0));
    assert!(first_charge(2) > last_charge(1));
    assert!(out.vehicles.iter().all(|v| v.is_full()));
    assert_eq!(out.stats.disconnects_full, 3);
}

#[test]
fn duration_cap_rotates_the_shared_point() {
    let horizon = Horizon::new(15, 1);
    let profiles = vec![
        stay_at_home(0, 10.0, &horizon),
        stay_at_home(1, 10.5, &horizon),
        stay_at_home(2, 11.0, &horizon),
    ];
    let out = run(
        common::default_config(&horizon),
        Strategy::Shared(SharedPool {
            num_cp: 1,
            max_duration_steps: Some(4),
        }),
        profiles,
    );

    for t in horizon.timesteps() {
        let charging = out
            .vehicles
            .iter()
            .filter(|v| v.state.charging_kw[t] > 0.0)
            .count();
        assert!(charging <= 1);
    }
    assert!(out.stats.disconnects_duration_cap > 0);
    // Every vehicle got a turn well before the first one could have filled up.
    for v in &out.vehicles {
        assert!(v.state.charging_kw[..20].iter().any(|&kw| kw > 0.0));
    }
}

#[test]
fn blackout_blocks_charging_and_new_connections() {
    let horizon = Horizon::new(60, 1);
    let config = common::default_config(&horizon).with_blackout(BlackoutWindow::new(22.0, 6.0));
    let out = run(
        config,
        Strategy::Shared(SharedPool {
            num_cp: 1,
            max_duration_steps: None,
        }),
        vec![stay_at_home(0, 10.0, &horizon)],
    );

    for s in &out.steps {
        let h = horizon.hour_of_day(s.timestep);
        let expected = !(6.0..22.0).contains(&h);
        assert_eq!(s.blackout, expected, "t={}", s.timestep);
        if s.blackout {
            assert_eq!(s.ev_kw, 0.0);
            assert_eq!(s.vehicles_connected, 0);
        }
    }
    assert_eq!(out.vehicles[0].state.soc_kwh[5], 10.0);
    assert!(out.vehicles[0].state.soc_kwh[6] > 10.0);
}

#[test]
fn headroom_split_among_vehicles_at_home() {
    // 100 kW grid, 95 kW household: 5 kW shared by two vehicles at home.
    let horizon = Horizon::new(60, 1);
    let config = common::default_config(&horizon);
    let household = common::flat_household(&horizon, 95.0);
    let out = Engine::new(
        config,
        Strategy::Dedicated(DedicatedShare),
        vec![stay_at_home(0, 10.0, &horizon), stay_at_home(1, 10.0, &horizon)],
        household,
    )
    .unwrap()
    .run()
    .unwrap();

    for v in &out.vehicles {
        assert!((v.state.charging_kw[1] - 2.5).abs() < 1e-4);
    }
    assert!((out.steps[1].total_kw - 100.0).abs() < 1e-3);
}

#[test]
fn assignment_table_must_match_fleet() {
    let horizon = common::default_horizon();
    let assigned = |num_cp: usize, table_fleet: usize| {
        Strategy::Assigned(StaticAssignment {
            table: AssignmentTable::round_robin(num_cp, table_fleet).unwrap(),
            max_duration_steps: None,
        })
    };
    let build = |strategy: Strategy, fleet_size: usize| {
        Engine::new(
            common::default_config(&horizon),
            strategy,
            common::mixed_fleet(&horizon, fleet_size),
            common::evening_household(&horizon),
        )
    };

    match build(assigned(2, 2), 4) {
        Err(SimError::Assignment(AssignmentError::Unassigned(2))) => {}
        Err(e) => panic!("expected vehicle 2 unassigned, got {e}"),
        Ok(_) => panic!("engine accepted a table missing vehicles 2 and 3"),
    }
    match build(assigned(2, 6), 3) {
        Err(SimError::Assignment(AssignmentError::UnknownVehicle { vehicle: 4, .. })) => {}
        Err(e) => panic!("expected unknown vehicle 4, got {e}"),
        Ok(_) => panic!("engine accepted a table naming vehicles outside the fleet"),
    }
    assert!(build(assigned(2, 4), 4).is_ok());
}
