//! Halt conditions and the core-density snapshot ladder.
//!
//! Conditions are evaluated in a fixed priority order and only the first
//! true one fires, so a terminating step always reports exactly one reason.
//! Halting is a successful outcome, not an error.

use std::fmt;

use cluster::{Cluster, SimConfig};
use serde::{Deserialize, Serialize};

use crate::central::CentralState;
use crate::energy::EnergyLedger;
use crate::lagrange::LagrangeProfile;

/// Why the run stopped, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    WallClockExceeded,
    StepBudgetExhausted,
    TimeBudgetExhausted,
    /// Live population fell below 0.5% of the initial population.
    ClusterDisrupted,
    /// Total mechanical energy (K + P) turned positive.
    EnergyUnbound,
    /// Innermost Lagrangian radius fell below its configured floor.
    LagrangianCollapse,
    /// Total energy drifted below the initial value by more than the
    /// configured displacement.
    TerminalEnergyDrift,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            HaltReason::WallClockExceeded => "wall-clock budget exceeded",
            HaltReason::StepBudgetExhausted => "timestep count reached its budget",
            HaltReason::TimeBudgetExhausted => "simulated time reached its budget",
            HaltReason::ClusterDisrupted => "cluster disrupted, live population below 0.5% of initial",
            HaltReason::EnergyUnbound => "total mechanical energy turned positive",
            HaltReason::LagrangianCollapse => "innermost Lagrangian radius fell below its floor",
            HaltReason::TerminalEnergyDrift => "total energy drifted past the terminal displacement",
        };
        f.write_str(reason)
    }
}

/// Core-density thresholds that trigger diagnostic snapshots near core
/// collapse, ascending.
const RUNGS: [f64; 10] = [
    50.0, 1.0e2, 5.0e2, 1.0e3, 5.0e3, 1.0e4, 5.0e4, 1.0e5, 5.0e5, 1.0e6,
];

/// Hysteretic position on the density ladder.
///
/// Climbs one rung when the core density tops the next threshold and steps
/// back down when it falls below 90% of the last one crossed; the 10% gap
/// keeps a density hovering at a threshold from thrashing snapshots. At
/// most one transition happens per observation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DensityLadder {
    rung: usize,
}

impl DensityLadder {
    pub fn new() -> Self {
        DensityLadder { rung: 0 }
    }

    /// Rungs climbed so far.
    pub fn rung(&self) -> usize {
        self.rung
    }

    /// Feeds one core-density sample; true means "emit a snapshot".
    pub fn observe(&mut self, rho_core: f64) -> bool {
        if self.rung < RUNGS.len() && rho_core > RUNGS[self.rung] {
            self.rung += 1;
            true
        } else if self.rung > 0 && rho_core < 0.9 * RUNGS[self.rung - 1] {
            self.rung -= 1;
            true
        } else {
            false
        }
    }
}

fn fire(cfg: &SimConfig, emit: &mut dyn FnMut()) {
    if cfg.snapshots_enabled {
        emit();
    }
}

/// Evaluates every halt condition in priority order.
///
/// `emit` is called once before reporting a halt (snapshot of the final
/// state) and once per density-ladder crossing, both only when snapshots
/// are enabled.
#[allow(clippy::too_many_arguments)]
pub fn check(
    cluster: &Cluster,
    cfg: &SimConfig,
    ledger: &EnergyLedger,
    profile: &LagrangeProfile,
    central: &CentralState,
    ladder: &mut DensityLadder,
    elapsed_minutes: u64,
    emit: &mut dyn FnMut(),
) -> Option<HaltReason> {
    if elapsed_minutes >= cfg.max_wallclock_minutes {
        fire(cfg, emit);
        return Some(HaltReason::WallClockExceeded);
    }
    if cluster.step_count >= cfg.t_max_count {
        fire(cfg, emit);
        return Some(HaltReason::StepBudgetExhausted);
    }
    if cluster.time >= cfg.t_max {
        fire(cfg, emit);
        return Some(HaltReason::TimeBudgetExhausted);
    }
    if (cluster.n_live as f64) < 0.005 * cluster.n_star() {
        fire(cfg, emit);
        return Some(HaltReason::ClusterDisrupted);
    }
    if ledger.totals.kinetic + ledger.totals.potential > 0.0 {
        fire(cfg, emit);
        return Some(HaltReason::EnergyUnbound);
    }
    if profile.innermost_radius() < cfg.min_lagrangian_radius {
        fire(cfg, emit);
        return Some(HaltReason::LagrangianCollapse);
    }

    // Extra snapshots while the core density crosses the collapse ladder;
    // never a halt by itself.
    if cfg.snapshots_enabled && ladder.observe(central.rho) {
        emit();
    }

    if ledger.totals.total < ledger.initial_total - cfg.terminal_energy_displacement {
        fire(cfg, emit);
        return Some(HaltReason::TerminalEnergyDrift);
    }
    None
}
