//! Relaxation-integration engine for Hénon-type Monte Carlo cluster evolution.
//!
//! Each timestep runs a fixed pipeline over the shared [`cluster::Cluster`]
//! state: timestep selection, external perturbation, radial re-sort, potential
//! recomputation, velocity reconciliation, energy recomputation, and a
//! stopping check. The [`driver::Simulation`] type owns that loop; the other
//! modules implement the individual stages and can be driven separately.
//!
//! Invariant corruption (unsorted radii, NaN mass or potential) is reported
//! as [`error::CorruptionError`] and is not recoverable; the caller is
//! expected to shut down. Physically infeasible energy budgets during
//! velocity reconciliation are not errors and are absorbed into the energy
//! ledger's loss accumulator.

pub mod central;
pub mod driver;
pub mod energy;
pub mod error;
pub mod lagrange;
pub mod potential;
pub mod stopping;
pub mod timestep;
pub mod velocity;

#[cfg(test)]
mod potential_test;
#[cfg(test)]
mod timestep_test;

pub use central::CentralState;
pub use driver::{FrozenOrbits, NullWriter, Perturbation, Simulation, SnapshotView, SnapshotWriter};
pub use energy::{BinaryTotals, EnergyLedger, EnergyTotals};
pub use error::CorruptionError;
pub use lagrange::LagrangeProfile;
pub use stopping::{DensityLadder, HaltReason};
pub use timestep::{StepPlan, SubzoneState};
pub use velocity::{CorrectionStats, ReconcileStats};
