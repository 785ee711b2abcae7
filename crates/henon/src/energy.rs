//! Global energy accounting.
//!
//! The totals are recomputed from scratch every step rather than updated
//! incrementally; with millions of steps, any incremental scheme drifts.
//! Closure is definitional: the grand total always equals the sum of its
//! parts plus the escaped-energy accumulators, and the stopping check
//! compares it against the value captured at startup.

use cluster::Cluster;
use serde::{Deserialize, Serialize};

/// One full recomputation of the energy totals, all in code units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyTotals {
    pub kinetic: f64,
    /// Hénon potential sum, halved because per-star `phi` double-counts
    /// pairwise interactions.
    pub potential: f64,
    /// Internal (non-orbital) energy of singles and binary components.
    pub internal: f64,
    /// Binary binding energy, negative for bound pairs.
    pub binding: f64,
    /// Grand total including the central body's kinetic term and the
    /// escaped-energy accumulators.
    pub total: f64,
}

/// Running energy ledger.
///
/// `totals` is overwritten by every [`recompute`]; the accumulators persist
/// across steps and close the books on stars that left the cluster or lost
/// energy to the reconciliation fallbacks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EnergyLedger {
    pub totals: EnergyTotals,
    /// Total energy at startup, the terminal-drift reference.
    pub initial_total: f64,
    /// Orbital energy carried off by escaped stars.
    pub e_escaped: f64,
    /// Binding energy carried off by escaped binaries.
    pub eb_escaped: f64,
    /// Internal energy carried off by escaped stars.
    pub eint_escaped: f64,
    /// Energy the velocity reconciliation could not conserve, sign reversed.
    /// Deliberately *not* part of the grand total; it measures the scheme's
    /// accounting error.
    pub e_oops: f64,
}

impl EnergyLedger {
    pub fn new() -> Self {
        EnergyLedger::default()
    }

    /// Marks the current total as the startup reference.
    pub fn capture_initial(&mut self) {
        self.initial_total = self.totals.total;
    }

    /// `-2K / P`, unity for a virialized cluster.
    pub fn virial_ratio(&self) -> f64 {
        -2.0 * self.totals.kinetic / self.totals.potential
    }
}

/// Recomputes the energy totals over the live population and refreshes each
/// star's specific energy and angular momentum.
///
/// A star's slot in the binary registry may be dead (destroyed this step);
/// dead slots contribute nothing.
pub fn recompute(cluster: &mut Cluster, ledger: &mut EnergyLedger) {
    let n_star = cluster.n_star();
    let mut totals = EnergyTotals::default();

    for i in 0..cluster.n_live {
        let star = &mut cluster.stars[i];
        let v2 = star.speed2();
        star.e = star.phi + 0.5 * v2;
        star.j = star.r * star.vt;

        totals.kinetic += 0.5 * v2 * star.m / n_star;
        totals.potential += star.phi * star.m / n_star;

        match star.binary {
            None => totals.internal += star.e_int,
            Some(idx) => {
                if let Some(binary) = cluster.binaries.get(idx) {
                    totals.binding -= binary.binding_energy(n_star);
                    totals.internal += binary.e_int1 + binary.e_int2;
                }
            }
        }
    }

    totals.potential *= 0.5;
    totals.total = totals.kinetic
        + totals.potential
        + totals.internal
        + totals.binding
        + cluster.central.e / n_star
        + ledger.e_escaped
        + ledger.eb_escaped
        + ledger.eint_escaped;

    ledger.totals = totals;
}

/// Restart variant: refreshes per-star `E` and `J` from the current state
/// without touching the ledger, whose totals came from the checkpoint.
pub fn refresh_star_energies(cluster: &mut Cluster) {
    for star in cluster.live_mut() {
        star.e = star.phi + 0.5 * star.speed2();
        star.j = star.r * star.vt;
    }
}

/// Census of binaries among the live population.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BinaryTotals {
    /// Live stars holding a binary handle, slot dead or not.
    pub n: usize,
    /// Their total mass, in stored star-mass units.
    pub m: f64,
    /// Binding-energy magnitude summed over the live slots, in code units.
    pub binding: f64,
}

/// Counts binaries over the live population, the bookkeeping refresh run
/// after destructive encounters.
///
/// A star whose registry slot was destroyed this step still counts toward
/// `n` and `m` until its handle is cleared; only live slots contribute
/// binding energy.
pub fn binary_totals(cluster: &Cluster) -> BinaryTotals {
    let n_star = cluster.n_star();
    let mut totals = BinaryTotals::default();
    for star in cluster.live() {
        if let Some(idx) = star.binary {
            totals.n += 1;
            totals.m += star.m;
            if let Some(binary) = cluster.binaries.get(idx) {
                totals.binding += binary.binding_energy(n_star);
            }
        }
    }
    totals
}
