//! Integration tests for the relaxation driver.
//!
//! These tests run the full step pipeline end to end and verify that the
//! stage modules agree with each other across many steps.

use cluster::sampling::plummer_model;
use cluster::{Cluster, R_INFINITY, SimConfig};
use henon::{FrozenOrbits, HaltReason, NullWriter, Perturbation, Simulation, StepPlan};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

/// Freezes the survivors and marks every other live star as escaped once
/// `strip_after` quiet steps have passed, mimicking catastrophic stripping.
struct HaloStripper {
    strip_after: u64,
    survivors: usize,
    calls: u64,
}

impl Perturbation for HaloStripper {
    fn perturb(&mut self, cluster: &mut Cluster, _plan: &StepPlan) {
        self.calls += 1;
        let strip = self.calls > self.strip_after;
        let n_live = cluster.n_live;
        let survivors = self.survivors;
        for (i, star) in cluster.tracked_mut().iter_mut().enumerate() {
            star.r_new = star.r;
            star.vr_new = star.vr;
            star.vt_new = star.vt;
            star.phase = 1.0;
            star.interacted = false;
            if strip && i >= survivors && i < n_live {
                star.r_new = R_INFINITY;
            }
        }
    }
}

#[test]
fn frozen_pipeline_conserves_energy() {
    let mut rng = ChaChaRng::seed_from_u64(42);
    let cluster = plummer_model(2500, &mut rng);
    let config = SimConfig {
        t_max: 1.0e6,
        ..SimConfig::default()
    };

    let mut sim = Simulation::new(cluster, config).expect("clean initial model");
    let initial_total = sim.ledger.initial_total;
    let initial_mtotal = sim.cluster.mtotal;

    println!("\n=== Initial Conditions ===");
    println!("Stars: {}", sim.cluster.n_live);
    println!("Total mass: {:.6}", initial_mtotal);
    println!("Total energy: {:.9}", initial_total);
    println!("Virial ratio: {:.4}", sim.ledger.virial_ratio());

    println!("\n=== Running 100 Frozen Steps ===");
    let mut perturbation = FrozenOrbits;
    let mut writer = NullWriter;
    for i in 0..100 {
        let halt = sim.step(&mut perturbation, &mut writer).expect("clean step");
        assert!(halt.is_none(), "no stopping condition should fire");

        if i % 20 == 0 {
            println!(
                "Step {}: t={:.4e}, E={:.9}, virial={:.4}, n_live={}",
                i,
                sim.cluster.time,
                sim.ledger.totals.total,
                sim.ledger.virial_ratio(),
                sim.cluster.n_live,
            );
        }
    }

    println!("\n=== Final State ===");
    println!("Time: {:.4e}", sim.cluster.time);
    println!("Total energy: {:.9}", sim.ledger.totals.total);
    println!("Written off: {:.3e}", sim.ledger.e_oops);

    println!("\n=== Physics Validation ===");

    // 1. Frozen orbits re-enter the reconciliation as exact identities, so
    //    the total energy must hold to rounding error.
    let drift = ((sim.ledger.totals.total - initial_total) / initial_total).abs();
    assert!(drift < 1.0e-9, "energy should be conserved, drift {drift:.2e}");
    println!("✓ Energy conservation: relative drift {drift:.2e}");

    // 2. Identity motion never exhausts an energy budget.
    assert!(
        sim.ledger.e_oops == 0.0,
        "no energy should be written off for frozen orbits"
    );
    println!("✓ Reconciliation: nothing written off");

    // 3. Nobody reached the escape radius.
    assert_eq!(sim.cluster.n_live, 2500, "no spurious escapers");
    assert_eq!(sim.cluster.mtotal, initial_mtotal, "total mass unchanged");
    println!("✓ Population: {} stars retained", sim.cluster.n_live);

    // 4. The re-sort kept the radius ordering the potential solver needs.
    assert!(
        sim.cluster.live().windows(2).all(|w| w[0].r <= w[1].r),
        "live stars should stay sorted by radius"
    );
    println!("✓ Ordering: radii sorted after {} re-sorts", sim.cluster.step_count);

    // 5. A sampled Plummer sphere is near virial equilibrium.
    let virial = sim.ledger.virial_ratio();
    assert!(
        (virial - 1.0).abs() < 0.2,
        "virial ratio should stay near unity, got {virial}"
    );
    println!("✓ Virial ratio: {virial:.4}");

    // 6. Diagnostics refreshed every step.
    assert_eq!(sim.profile.radii.len(), sim.config.lagrange_fractions.len());
    assert!(sim.profile.radii.iter().all(|&r| r > 0.0));
    assert_eq!(sim.central.n, sim.config.num_central_stars);
    assert!(sim.central.rho > 0.0 && sim.central.core_radius > 0.0);
    println!(
        "✓ Diagnostics: half-mass radius {:.4}, core radius {:.4}",
        sim.profile.radii[8],
        sim.central.core_radius
    );

    // 7. Time advanced monotonically.
    assert!(sim.cluster.time > 0.0);
    assert_eq!(sim.cluster.step_count, 100);
    println!("✓ Time integration: advanced to {:.4e}", sim.cluster.time);

    println!("\n=== All Physics Tests Passed ===");
}

#[test]
fn halo_stripping_disrupts_cluster() {
    let mut rng = ChaChaRng::seed_from_u64(7);
    let cluster = plummer_model(2000, &mut rng);
    let config = SimConfig {
        t_max: 1.0e6,
        ..SimConfig::default()
    };

    let mut sim = Simulation::new(cluster, config).expect("clean initial model");

    println!("\n=== Stripping Test ===");
    println!("Stars: {}", sim.cluster.n_live);
    println!("Disruption threshold: {}", 2000 / 200);

    let mut perturbation = HaloStripper {
        strip_after: 2,
        survivors: 4,
        calls: 0,
    };
    let mut writer = NullWriter;
    let reason = sim.run(&mut perturbation, &mut writer).expect("clean run");

    println!("Halted after {} steps: {}", sim.cluster.step_count, reason);
    println!("Survivors: {}", sim.cluster.n_live);

    // The disruption check outranks the unbound-energy check, so a cluster
    // that loses nearly everything in one step still reports disruption.
    assert_eq!(reason, HaltReason::ClusterDisrupted);
    println!("✓ Halt reason: {reason}");

    assert_eq!(sim.cluster.step_count, 3, "two quiet steps then the strip");
    assert_eq!(sim.cluster.n_live, 4, "only the survivors remain live");
    assert!(
        sim.cluster.tracked()[4..].iter().all(|s| s.r >= R_INFINITY),
        "stripped stars should sit at the boundary radius"
    );
    println!("✓ Escapers: {} stars at the boundary", 2000 - sim.cluster.n_live);

    // The survivors still have a consistent potential.
    assert!(sim.cluster.live().iter().all(|s| s.phi.is_finite()));
    println!("✓ Potential: finite over the surviving core");
}

#[test]
fn time_budget_ends_run() {
    let mut rng = ChaChaRng::seed_from_u64(11);
    let cluster = plummer_model(400, &mut rng);
    let mut sim = Simulation::new(cluster, SimConfig::default()).expect("clean initial model");

    let mut perturbation = FrozenOrbits;
    let mut writer = NullWriter;

    // Frozen orbits leave the state untouched, so every step re-derives the
    // same dt. Measure one step, then budget three and a half more.
    let halt = sim.step(&mut perturbation, &mut writer).expect("clean step");
    assert!(halt.is_none());
    let dt = sim.cluster.time;
    assert!(dt > 0.0, "relaxation timestep should be positive");

    sim.config.t_max = 3.5 * dt;
    let reason = sim.run(&mut perturbation, &mut writer).expect("clean run");

    println!("\n=== Time Budget Test ===");
    println!("dt: {:.4e}", dt);
    println!("Halted at t={:.4e} after {} steps: {}", sim.cluster.time, sim.cluster.step_count, reason);

    assert_eq!(reason, HaltReason::TimeBudgetExhausted);
    assert_eq!(sim.cluster.step_count, 4, "budget allows three more steps");
    assert!(sim.cluster.time >= sim.config.t_max);
    println!("✓ Halt reason: {reason}");
}
