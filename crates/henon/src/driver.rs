//! Simulation driver.
//!
//! Owns the per-step relaxation pipeline and the pieces of persistent state
//! the stages share. The perturbation integrator and the snapshot writer
//! are external collaborators behind traits; the driver only requires that
//! the integrator fill in each star's predicted state.
//!
//! # Update Sequence
//!
//! Each step proceeds in this order:
//! 1. Core timestep from the central relaxation time, sub-zone plan
//! 2. External perturbation writes predicted radii/velocities
//! 3. Intermediate energies captured under the old potential, predictions
//!    adopted
//! 4. Radial re-sort and potential rebuild
//! 5. Velocity reconciliation under the new potential (policy A or B)
//! 6. Four-way per-star correction against the intermediate energy
//! 7. Full energy recomputation
//! 8. Central quantities and Lagrangian profile refresh
//! 9. Clocks advance; stopping conditions evaluated
//!
//! Stage order is load-bearing: the capture in 3 must see the old
//! potential, the rebuild in 4 must see sorted radii, and the reconciler in
//! 5 needs both the cached old-potential values and the new profile.
//!
//! # References
//! - Joshi, Rasio & Portegies Zwart (2000), ApJ 540, 969 (the method)

use std::time::Instant;

use cluster::{Cluster, SimConfig};
use tracing::{debug, error, info};

use crate::central::{self, CentralState};
use crate::energy::{self, EnergyLedger};
use crate::error::CorruptionError;
use crate::lagrange::{self, LagrangeProfile};
use crate::potential;
use crate::stopping::{self, DensityLadder, HaltReason};
use crate::timestep::{self, StepPlan, SubzoneState};
use crate::velocity::{self, CorrectionStats};

/// External perturbation integrator.
///
/// Called once per step with the sub-zone plan. The integrator advances
/// stars `[0, plan.advance_through)` through `plan.dt` (and, on a full
/// step, the halo through `plan.halo_dt`), writing results into `r_new`,
/// `vr_new`, `vt_new`, the orbital `phase` draw, and the `interacted` flag.
/// Current state fields must be left alone; the driver adopts the
/// predictions itself.
pub trait Perturbation {
    fn perturb(&mut self, cluster: &mut Cluster, plan: &StepPlan);
}

/// Destination for diagnostic snapshots.
pub trait SnapshotWriter {
    fn write(&mut self, view: &SnapshotView<'_>);
}

/// Read-only state handed to the snapshot writer.
pub struct SnapshotView<'a> {
    pub cluster: &'a Cluster,
    pub ledger: &'a EnergyLedger,
    pub central: &'a CentralState,
    pub profile: &'a LagrangeProfile,
}

/// Discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWriter;

impl SnapshotWriter for NullWriter {
    fn write(&mut self, _view: &SnapshotView<'_>) {}
}

/// Perturbation that predicts every star exactly where it is.
///
/// With orbits frozen the reconciliation stages are all exact no-ops, so
/// the total energy must hold to rounding error over any number of steps.
/// Useful for exercising the engine without a scattering integrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrozenOrbits;

impl Perturbation for FrozenOrbits {
    fn perturb(&mut self, cluster: &mut Cluster, _plan: &StepPlan) {
        for star in cluster.tracked_mut() {
            star.r_new = star.r;
            star.vr_new = star.vr;
            star.vt_new = star.vt;
            star.phase = 1.0;
            star.interacted = false;
        }
    }
}

/// One cluster simulation: the mutable cluster state plus the per-step
/// engine state (ledger, diagnostics, sub-zoning, density ladder).
#[derive(Debug, Clone)]
pub struct Simulation {
    pub cluster: Cluster,
    pub config: SimConfig,
    pub ledger: EnergyLedger,
    pub central: CentralState,
    pub profile: LagrangeProfile,
    pub subzone: SubzoneState,
    pub ladder: DensityLadder,
    started: Instant,
}

impl Simulation {
    /// Builds a simulation around a sampled cluster.
    ///
    /// Seeds the configured central point mass, establishes the sort
    /// invariant, rebuilds the potential, and captures the initial energy
    /// total that the terminal-drift stopping condition references.
    pub fn new(mut cluster: Cluster, config: SimConfig) -> Result<Self, CorruptionError> {
        cluster.central.m = config.central_point_mass;
        cluster.sort_by_radius();
        potential::recompute(&mut cluster)?;

        let mut ledger = EnergyLedger::new();
        energy::recompute(&mut cluster, &mut ledger);
        ledger.capture_initial();

        let central = central::recompute(&cluster, config.num_central_stars);
        let profile = lagrange::profile(&cluster, &config);

        info!(
            n = cluster.n_initial,
            mtotal = cluster.mtotal,
            e_initial = ledger.initial_total,
            "simulation initialized"
        );

        Ok(Simulation {
            cluster,
            config,
            ledger,
            central,
            profile,
            subzone: SubzoneState::new(),
            ladder: DensityLadder::new(),
            started: Instant::now(),
        })
    }

    /// Executes one timestep of the relaxation pipeline.
    ///
    /// Returns `Ok(Some(reason))` when a stopping condition fired at the
    /// end of the step, `Ok(None)` to continue. Corruption errors are
    /// unrecoverable; the simulation must not be stepped again after one.
    pub fn step<P: Perturbation, W: SnapshotWriter>(
        &mut self,
        perturbation: &mut P,
        writer: &mut W,
    ) -> Result<Option<HaltReason>, CorruptionError> {
        // 1. Core timestep and sub-zone plan
        let dt = timestep::relaxation_dt(&self.cluster, &self.config);
        let plan = self.subzone.plan(&self.cluster, &self.config, dt);

        // 2. External perturbation writes predictions
        perturbation.perturb(&mut self.cluster, &plan);

        // 3. Intermediate energies under the old potential
        velocity::capture_intermediate(&mut self.cluster)?;

        // 4. Re-sort and rebuild the potential from the new radii
        self.cluster.sort_by_radius();
        potential::recompute(&mut self.cluster)?;

        // 5. Velocity reconciliation
        let reconcile =
            velocity::reconcile(&mut self.cluster, self.config.velocity_policy, &mut self.ledger)?;

        // 6. Per-star corrections against the intermediate energy
        let corrections = if self.config.energy_conservation {
            velocity::apply_intermediate_corrections(&mut self.cluster)?
        } else {
            CorrectionStats::default()
        };

        // 7. Energy recomputation
        energy::recompute(&mut self.cluster, &mut self.ledger);

        // 8. Structural diagnostics
        self.central = central::recompute(&self.cluster, self.config.num_central_stars);
        self.profile = lagrange::profile(&self.cluster, &self.config);

        // 9. Advance clocks, evaluate stopping conditions
        self.cluster.time += plan.dt;
        self.cluster.step_count += 1;

        debug!(
            step = self.cluster.step_count,
            t = self.cluster.time,
            dt = plan.dt,
            full = plan.full_step,
            factor = self.subzone.factor(),
            n_live = self.cluster.n_live,
            shortfalls = reconcile.shortfalls,
            eligible = corrections.eligible,
            e_total = self.ledger.totals.total,
            "step complete"
        );

        let elapsed_minutes = self.started.elapsed().as_secs() / 60;
        let halt = {
            let cluster = &self.cluster;
            let ledger = &self.ledger;
            let central = &self.central;
            let profile = &self.profile;
            let mut emit = || {
                writer.write(&SnapshotView {
                    cluster,
                    ledger,
                    central,
                    profile,
                });
            };
            stopping::check(
                cluster,
                &self.config,
                ledger,
                profile,
                central,
                &mut self.ladder,
                elapsed_minutes,
                &mut emit,
            )
        };
        if let Some(reason) = halt {
            info!(
                %reason,
                t = self.cluster.time,
                steps = self.cluster.step_count,
                n_live = self.cluster.n_live,
                e_total = self.ledger.totals.total,
                "halting"
            );
        }
        Ok(halt)
    }

    /// Steps until a stopping condition fires.
    pub fn run<P: Perturbation, W: SnapshotWriter>(
        &mut self,
        perturbation: &mut P,
        writer: &mut W,
    ) -> Result<HaltReason, CorruptionError> {
        loop {
            match self.step(perturbation, writer) {
                Ok(Some(reason)) => return Ok(reason),
                Ok(None) => {}
                Err(err) => {
                    error!(%err, step = self.cluster.step_count, "state corruption");
                    return Err(err);
                }
            }
        }
    }

    /// Restart path: refreshes per-star energies from the loaded state and
    /// reports it, without recomputing the ledger (its totals came from the
    /// checkpoint and recomputing would clobber the escaped accumulators'
    /// consistency checkpoint-side).
    pub fn refresh_restart_energies(&mut self) {
        energy::refresh_star_energies(&mut self.cluster);
        info!(
            t = self.cluster.time,
            steps = self.cluster.step_count,
            n_live = self.cluster.n_live,
            e_total = self.ledger.totals.total,
            mtotal = self.cluster.mtotal,
            virial = self.ledger.virial_ratio(),
            "restart state"
        );
    }
}
