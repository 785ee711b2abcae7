//! Plummer-sphere relaxation demonstration.
//!
//! This example builds a sampled Plummer model and drives the full
//! relaxation pipeline over it:
//! 1. Timestep selection with central sub-zoning
//! 2. Orbit prediction (frozen here, so the total energy should hold)
//! 3. Radial re-sort and potential recomputation
//! 4. Velocity reconciliation and energy-budget corrections
//! 5. Energy bookkeeping with core and Lagrangian diagnostics
//! 6. Stopping checks
//!
//! Run with: cargo run --example plummer_relaxation

use cluster::sampling::plummer_model;
use cluster::SimConfig;
use henon::{FrozenOrbits, NullWriter, Simulation};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("╔═══════════════════════════════════════════════════════╗");
    println!("║   Hénon Monte Carlo Relaxation                        ║");
    println!("║   Plummer Sphere, Frozen Orbits                       ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    let mut rng = ChaChaRng::seed_from_u64(42);
    let cluster = plummer_model(5_000, &mut rng);

    let config = SimConfig {
        t_max_count: 200,
        ..SimConfig::default()
    };

    let mut sim = Simulation::new(cluster, config).expect("clean initial model");
    let initial_total = sim.ledger.initial_total;

    println!("🌟 Stars: {}", sim.cluster.n_live);
    println!("   Total mass: {:.6}", sim.cluster.mtotal);
    println!("   Total energy: {:.6}", initial_total);
    println!("   Virial ratio: {:.4}", sim.ledger.virial_ratio());
    println!("   Core radius: {:.4}", sim.central.core_radius);
    println!("   Half-mass radius: {:.4}\n", sim.profile.radii[8]);

    println!("▶️  Running until a stopping condition fires...\n");
    println!(
        "{:<8} {:>12} {:>14} {:>8} {:>10} {:>10}",
        "Step", "t", "E", "virial", "r_core", "r_half"
    );
    println!("{:-<70}", "");

    let mut perturbation = FrozenOrbits;
    let mut writer = NullWriter;
    let reason = loop {
        if let Some(reason) = sim.step(&mut perturbation, &mut writer).expect("clean step") {
            break reason;
        }
        if sim.cluster.step_count % 20 == 0 {
            println!(
                "{:<8} {:>12.4e} {:>14.9} {:>8.4} {:>10.4} {:>10.4}",
                sim.cluster.step_count,
                sim.cluster.time,
                sim.ledger.totals.total,
                sim.ledger.virial_ratio(),
                sim.central.core_radius,
                sim.profile.radii[8],
            );
        }
    };

    println!("{:-<70}\n", "");

    println!("╔═══════════════════════════════════════════════════════╗");
    println!("║   Run Summary                                         ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    let drift = ((sim.ledger.totals.total - initial_total) / initial_total).abs();
    println!("⏱️  Halt: {} after {} steps", reason, sim.cluster.step_count);
    println!("   Simulated time: {:.4e}", sim.cluster.time);
    println!("📊 Energy drift: {:.2e} (relative)", drift);
    println!("   Written off: {:.2e}", sim.ledger.e_oops);
    println!("   Live stars: {}\n", sim.cluster.n_live);

    println!("Lagrangian profile:");
    println!(
        "{:<10} {:>10} {:>12} {:>12}",
        "Fraction", "Radius", "Avg mass", "Density"
    );
    println!("{:-<48}", "");
    for (i, frac) in sim.profile.fractions.iter().enumerate() {
        println!(
            "{:<10} {:>10.4} {:>12.4e} {:>12.4e}",
            frac, sim.profile.radii[i], sim.profile.ave_mass[i], sim.profile.densities[i],
        );
    }

    if drift < 1.0e-9 {
        println!("\n✨ Frozen orbits held the total energy to rounding error.");
    }
}
