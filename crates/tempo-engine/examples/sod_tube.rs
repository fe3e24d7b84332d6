//! Step control for a two-element Sod shock tube.
//!
//! Demonstrates:
//!   1. Building element meshes and Euler field states
//!   2. Configuring choosers and a driver per element
//!   3. The two-phase step: local choosers, reduction, global choosers
//!   4. Migrating one element's driver between steps
//!
//! The flow itself is not solved; the velocity is ramped by hand so the
//! controller has something to react to.
//!
//! Run with:
//!   RUST_LOG=tempo_engine=debug cargo run --example sod_tube

use std::error::Error;

use tempo_engine::{
    build_registry, ChooserConfig, ControllerConfig, ElementDriver, GlobalQuantities, StepOutcome,
};
use tempo_migrate::{ChooserTypes, UnknownTypePolicy};
use tempo_system::{ClassicalRk4, Element, ElementMesh, EulerPrimitives, IdealFluid, NewtonianEuler};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type Euler1 = NewtonianEuler<1>;

const POINTS: usize = 33;
const STEPS: usize = 12;

fn controller() -> ControllerConfig {
    ControllerConfig {
        initial_step: 1e-3,
        min_step: 1e-9,
        max_step: 0.05,
        max_retries: 4,
    }
}

fn choosers() -> Vec<ChooserConfig> {
    vec![
        ChooserConfig::Cfl { safety_factor: 0.9 },
        ChooserConfig::GlobalCfl { safety_factor: 0.5 },
        ChooserConfig::LimitIncrease { factor: 1.5 },
    ]
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let eos = IdealFluid::new(1.4).ok_or("invalid adiabatic index")?;
    let meshes = [
        ElementMesh::uniform([0.0], [0.5], [POINTS])?,
        ElementMesh::uniform([0.5], [1.0], [POINTS])?,
    ];
    let mut states = [
        EulerPrimitives::uniform(POINTS, 1.0, [0.0], 1.0, eos),
        EulerPrimitives::uniform(POINTS, 0.125, [0.0], 0.1, eos),
    ];

    let mut drivers = Vec::new();
    for _ in 0..2 {
        let registry = build_registry::<Euler1>(&choosers())?;
        drivers.push(ElementDriver::new(
            registry,
            Box::new(ClassicalRk4),
            controller(),
        )?);
    }

    println!("step  element  time        step        outcome");
    for n in 0..STEPS {
        // Ramp the flow near the interface.
        let t = drivers[0].time();
        for state in &mut states {
            for v in state.velocity_mut() {
                v[0] = 4.0 * t;
            }
        }

        let mut pending = Vec::new();
        for (i, driver) in drivers.iter_mut().enumerate() {
            let element = Element::<Euler1, 1>::new(&meshes[i], &states[i])?;
            pending.push(driver.begin_step(&element)?);
        }
        let global = GlobalQuantities::reduce(pending.iter().filter_map(|p| p.contribution()));

        for (i, (driver, p)) in drivers.iter_mut().zip(pending).enumerate() {
            let mut log_event = |time: f64, step: f64| {
                tracing::info!(element = i, time, step, "events run");
            };
            let outcome = driver.complete_step(p, Some(global), &mut log_event)?;
            let (time, step, label) = match outcome {
                StepOutcome::Accepted { time, step, .. } => (time, step, "accepted"),
                StepOutcome::Rejected { time, step, .. } => (time, step, "rejected"),
            };
            println!("{n:>4}  {i:>7}  {time:<10.6}  {step:<10.6}  {label}");
        }

        if n == STEPS / 2 {
            let mut buf = Vec::new();
            drivers[1].snapshot(&mut buf)?;
            let (moved, report) = ElementDriver::restore(
                &mut buf.as_slice(),
                &ChooserTypes::builtin(),
                UnknownTypePolicy::Abort,
                Box::new(ClassicalRk4),
                controller(),
            )?;
            println!(
                "--- element 1 migrated ({} bytes, {} choosers restored)",
                buf.len(),
                report.restored
            );
            drivers[1] = moved;
        }
    }

    for (i, driver) in drivers.iter().enumerate() {
        let m = driver.metrics();
        println!(
            "element {i}: t={:.6}, accepted={}, rejection rate={:.2}, bindings={:?}",
            driver.time(),
            driver.accepted_steps(),
            m.rejection_rate(),
            m.binding_counts
        );
    }
    Ok(())
}
