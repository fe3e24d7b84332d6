//! Several elements stepping together through a global reduction.

use std::thread;

use tempo_engine::{
    build_registry, AllReduce, ChooserConfig, ControllerConfig, ElementDriver, NoEvents,
    ReductionError, ReductionHandle, StepError,
};
use tempo_migrate::{ChooserTypes, UnknownTypePolicy};
use tempo_system::{Element, ElementMesh, EulerPrimitives, IdealFluid, NewtonianEuler, Rk3Ssp};

type Euler1 = NewtonianEuler<1>;

const CHOOSERS: [ChooserConfig; 2] = [
    ChooserConfig::GlobalCfl { safety_factor: 0.5 },
    ChooserConfig::LimitIncrease { factor: 2.0 },
];

fn config() -> ControllerConfig {
    ControllerConfig {
        initial_step: 1e-3,
        ..ControllerConfig::default()
    }
}

fn driver() -> ElementDriver {
    let registry = build_registry::<Euler1>(&CHOOSERS).unwrap();
    ElementDriver::new(registry, Box::new(Rk3Ssp), config()).unwrap()
}

/// Element `i`: length `0.5 * (i + 1)` on 11 points, flow speed `i / 2`.
fn element_data(i: usize) -> (ElementMesh<1>, EulerPrimitives<1>) {
    let length = 0.5 * (i + 1) as f64;
    let mesh = ElementMesh::uniform([0.0], [length], [11]).unwrap();
    let eos = IdealFluid::new(1.4).unwrap();
    let state = EulerPrimitives::uniform(11, 1.4, [i as f64 * 0.5], 1.0, eos);
    (mesh, state)
}

/// Run `steps` steps, migrating the driver after `migrate_after` of them.
fn run_element(
    handle: ReductionHandle,
    steps: usize,
    migrate_after: Option<usize>,
) -> (Vec<f64>, u64) {
    let (mesh, state) = element_data(handle.index());
    let element = Element::<Euler1, 1>::new(&mesh, &state).unwrap();
    let mut driver = driver();
    let mut times = Vec::new();
    for n in 0..steps {
        if migrate_after == Some(n) {
            let mut buf = Vec::new();
            driver.snapshot(&mut buf).unwrap();
            drop(driver);
            let (restored, report) = ElementDriver::restore(
                &mut buf.as_slice(),
                &ChooserTypes::builtin(),
                UnknownTypePolicy::Abort,
                Box::new(Rk3Ssp),
                config(),
            )
            .unwrap();
            assert!(report.is_complete());
            driver = restored;
        }
        let outcome = driver.step_reduced(&element, &handle, &mut NoEvents).unwrap();
        assert!(outcome.is_accepted());
        times.push(driver.time());
    }
    (times, driver.accepted_steps())
}

#[test]
fn elements_agree_on_every_step() {
    let handles = AllReduce::new(3).unwrap();
    let joins: Vec<_> = handles
        .into_iter()
        .map(|h| thread::spawn(move || run_element(h, 10, None)))
        .collect();
    let results: Vec<_> = joins.into_iter().map(|j| j.join().unwrap()).collect();

    for (times, accepted) in &results {
        assert_eq!(times, &results[0].0);
        assert_eq!(*accepted, 10);
    }
    // Growth-limited at first, then pinned by the global CFL bound.
    let times = &results[0].0;
    let steps: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(steps.windows(2).all(|w| w[1] >= w[0] * 0.999));
}

#[test]
fn migrated_element_stays_in_lockstep() {
    let handles = AllReduce::new(3).unwrap();
    let joins: Vec<_> = handles
        .into_iter()
        .map(|h| {
            let migrate_after = if h.index() == 1 { Some(4) } else { None };
            thread::spawn(move || run_element(h, 8, migrate_after))
        })
        .collect();
    let results: Vec<_> = joins.into_iter().map(|j| j.join().unwrap()).collect();
    for (times, accepted) in &results {
        assert_eq!(times, &results[0].0);
        assert_eq!(*accepted, 8);
    }
}

#[test]
fn departed_peer_stops_the_reduction() {
    let mut handles = AllReduce::new(2).unwrap();
    let survivor = handles.remove(0);
    drop(handles);

    let (mesh, state) = element_data(0);
    let element = Element::<Euler1, 1>::new(&mesh, &state).unwrap();
    let mut driver = driver();
    let err = driver
        .step_reduced(&element, &survivor, &mut NoEvents)
        .unwrap_err();
    assert!(matches!(
        err,
        StepError::Reduction(ReductionError::Disconnected)
    ));
}
