//! Energy-conserving velocity reconciliation after a perturbation step.
//!
//! The perturbation integrator predicts each star's new radius and
//! velocities under the *old* potential. Once the potential is rebuilt from
//! the new radii, those predictions no longer conserve the star's energy, so
//! this module re-derives velocities that do, following Stodolkiewicz's
//! scheme. Stars flagged `interacted` had their velocities set by a few-body
//! encounter and are left alone.
//!
//! Energy a star cannot physically carry (a negative squared speed) is
//! tracked as a running excess within the pass: it is refunded to the next
//! star with enough kinetic energy to absorb it, and whatever is left at the
//! end of the pass is charged to the ledger's loss accumulator, so global
//! accounting stays closed even when per-star conservation fails.
//!
//! # References
//! - Stodolkiewicz (1982), Acta Astronomica 32, 63 (eqs. 33-34)
//! - Joshi, Rasio & Portegies Zwart (2000), ApJ 540, 969

use cluster::{Cluster, VelocityPolicy};

use crate::energy::EnergyLedger;
use crate::error::CorruptionError;
use crate::potential;

/// Predicted radii at or beyond this are about to be marked escaped and are
/// skipped by the intermediate-energy capture.
const ESCAPE_CUTOFF: f64 = 1.0e6;

/// Orbital-phase floor for the intermediate-energy correction. Stars drawn
/// too close to pericenter have unreliable velocity splits and are skipped.
const PERICENTER_PHASE: f64 = 0.05;

/// Outcome counters for one [`reconcile`] pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileStats {
    /// Stars whose energy budget could not support a real radial velocity.
    pub shortfalls: usize,
    /// Stars damped to absorb previously recorded excess.
    pub refunds: usize,
    /// Excess still unabsorbed at the end of the pass, in stored-mass energy
    /// units. This amount (times `madhoc`, sign reversed) went to the
    /// ledger's loss accumulator.
    pub leftover_excess: f64,
}

/// Outcome counters for one [`apply_intermediate_corrections`] pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrectionStats {
    pub eligible: usize,
    /// Radial velocity trusted, tangential re-derived.
    pub kept_radial: usize,
    /// Standard scheme: tangential trusted, radial re-derived.
    pub standard: usize,
    /// Budget too small for either component, split evenly.
    pub split: usize,
    /// Non-positive budget passed on to the next star's intermediate energy.
    pub transferred: usize,
}

/// Captures intermediate energies and adopts the predicted state.
///
/// Must run after the perturbation stage and *before* the radial re-sort and
/// potential rebuild, while `phi` still holds the old potential. The first
/// loop evaluates the old potential at every predicted radius and stores the
/// intermediate energy
///
/// ```text
/// EI = vr^2 + vt^2 + Phi_old(r_old) - Phi_old(r_new)
/// ```
///
/// along with the two old-potential values the reconciliation pass needs.
/// The second loop then saves the pre-prediction state and moves every
/// tracked star onto its predicted radius and velocities. The loops cannot
/// be merged: adopting a star's radius early would corrupt the potential
/// lookups of the stars after it.
pub fn capture_intermediate(cluster: &mut Cluster) -> Result<(), CorruptionError> {
    for j in 0..cluster.n_tracked {
        let r_new = cluster.stars[j].r_new;
        if r_new < ESCAPE_CUTOFF {
            let u_old_at_new = potential::at_radius(cluster, r_new)?;
            let star = &mut cluster.stars[j];
            star.ei = star.vr * star.vr + star.vt * star.vt + star.phi - u_old_at_new;
            star.u_old_at_old = star.phi;
            star.u_old_at_new = u_old_at_new;
        }
    }

    for star in cluster.tracked_mut() {
        star.vr_old = star.vr;
        star.vt_old = star.vt;
        star.r_old = star.r;
        star.r = star.r_new;
        star.vr = star.vr_new;
        star.vt = star.vt_new;
    }
    Ok(())
}

/// Re-derives self-consistent velocities under the rebuilt potential.
///
/// Runs over the live population after the re-sort and potential rebuild.
/// Dispatches on the configured policy; both policies share the excess
/// bookkeeping, and whatever excess the pass cannot refund is charged to
/// `ledger.e_oops`.
pub fn reconcile(
    cluster: &mut Cluster,
    policy: VelocityPolicy,
    ledger: &mut EnergyLedger,
) -> Result<ReconcileStats, CorruptionError> {
    match policy {
        VelocityPolicy::AngularMomentum => reconcile_angular(cluster, ledger),
        VelocityPolicy::Stodolkiewicz { q } => reconcile_stodolkiewicz(cluster, q, ledger),
    }
}

/// Damps a star's velocity to absorb recorded excess energy, when it has
/// enough kinetic energy to give.
fn refund_excess(vr: &mut f64, vt: &mut f64, m: f64, excess: &mut f64, stats: &mut ReconcileStats) {
    let ke2 = *vt * *vt + *vr * *vr;
    if *excess > 0.0 && *excess < 0.5 * ke2 * m {
        let ratio = ((ke2 - 2.0 * *excess / m) / ke2).sqrt();
        *vt *= ratio;
        *vr *= ratio;
        *excess = 0.0;
        stats.refunds += 1;
    }
}

/// Policy A: conserve angular momentum, derive the radial velocity from the
/// energy budget.
fn reconcile_angular(
    cluster: &mut Cluster,
    ledger: &mut EnergyLedger,
) -> Result<ReconcileStats, CorruptionError> {
    let mut stats = ReconcileStats::default();
    let mut excess = 0.0;

    for i in 0..cluster.n_live {
        if cluster.stars[i].interacted {
            continue;
        }
        let r_old = cluster.stars[i].r_old;
        let u_new_at_old = potential::at_radius(cluster, r_old)?;

        let star = &cluster.stars[i];
        let u_new_at_new = star.phi;
        let vold2 = star.vt_old * star.vt_old + star.vr_old * star.vr_old;
        let vnew2 = vold2 + star.u_old_at_old + u_new_at_old - star.u_old_at_new - u_new_at_new;
        let mut vt = star.vt_old * star.r_old / star.r_new;
        let m = star.m;
        let vr_sign_positive = star.vr >= 0.0;

        let mut vr;
        if vnew2 < vt * vt {
            stats.shortfalls += 1;
            // Zeroing vr adds this much energy to the system.
            vr = 0.0;
            excess += 0.5 * (vt * vt - vnew2) * m;
        } else {
            // The sign was already randomized when the position was drawn.
            vr = if vr_sign_positive {
                (vnew2 - vt * vt).sqrt()
            } else {
                -(vnew2 - vt * vt).sqrt()
            };
            refund_excess(&mut vr, &mut vt, m, &mut excess, &mut stats);
        }
        let star = &mut cluster.stars[i];
        star.vt = vt;
        star.vr = vr;
    }

    stats.leftover_excess = excess;
    ledger.e_oops += -excess * cluster.madhoc();
    Ok(stats)
}

/// Policy B: blend the old- and new-potential differences with weight `q`
/// and rescale both components by a common factor.
fn reconcile_stodolkiewicz(
    cluster: &mut Cluster,
    q: f64,
    ledger: &mut EnergyLedger,
) -> Result<ReconcileStats, CorruptionError> {
    let mut stats = ReconcileStats::default();
    let mut excess = 0.0;

    for i in 0..cluster.n_live {
        if cluster.stars[i].interacted {
            continue;
        }
        let r_old = cluster.stars[i].r_old;
        let u_new_at_old = potential::at_radius(cluster, r_old)?;

        let star = &cluster.stars[i];
        let u_new_at_new = star.phi;
        let vold2 = star.vt_old * star.vt_old + star.vr_old * star.vr_old;
        let vnew2 = vold2
            + 2.0 * (1.0 - q) * (star.u_old_at_old - star.u_old_at_new)
            + 2.0 * q * (u_new_at_old - u_new_at_new);
        let v2 = star.vr * star.vr + star.vt * star.vt;
        let m = star.m;

        if vnew2 <= 0.0 {
            // Unphysical: keep the velocities predicted under the old
            // potential and record the discrepancy.
            stats.shortfalls += 1;
            excess += 0.5 * (v2 - vnew2) * m;
        } else {
            let alpha = (vnew2 / v2).sqrt();
            let mut vr = star.vr * alpha;
            let mut vt = star.vt * alpha;
            refund_excess(&mut vr, &mut vt, m, &mut excess, &mut stats);
            let star = &mut cluster.stars[i];
            star.vr = vr;
            star.vt = vt;
        }
    }

    stats.leftover_excess = excess;
    ledger.e_oops += -excess * cluster.madhoc();
    Ok(stats)
}

/// Per-star energy correction against the intermediate energy, applied just
/// before the ledger recomputation.
///
/// For each live star outside its pericenter phase floor and not flagged
/// `interacted`, evaluates the conserved squared speed implied by the
/// intermediate energy and the rebuilt potential,
///
/// ```text
/// dtemp = EI - Phi(r) + Phi(r_old)
/// ```
///
/// and reconciles the predicted velocity components against it, one of four
/// ways: trust `vr` and re-derive `vt` when the budget exceeds `vr^2`;
/// otherwise trust `vt` and re-derive `vr` (keeping the already-randomized
/// sign) when the budget exceeds `vt^2`; otherwise split a small positive
/// budget evenly; otherwise hand the non-positive budget to the next star's
/// intermediate energy, where the following iteration sees it.
pub fn apply_intermediate_corrections(
    cluster: &mut Cluster,
) -> Result<CorrectionStats, CorruptionError> {
    let mut stats = CorrectionStats::default();

    for i in 0..cluster.n_live {
        {
            let star = &cluster.stars[i];
            if star.phase <= PERICENTER_PHASE || star.interacted {
                continue;
            }
        }
        stats.eligible += 1;

        let r_old = cluster.stars[i].r_old;
        let u_new_at_old = potential::at_radius(cluster, r_old)?;

        let star = &cluster.stars[i];
        let dtemp = star.ei - star.phi + u_new_at_old;
        let vr = star.vr;
        let vt = star.vt;

        if dtemp > vr * vr {
            stats.kept_radial += 1;
            cluster.stars[i].vt = (dtemp - vr * vr).sqrt();
        } else if dtemp > 0.0 {
            if dtemp > vt * vt {
                stats.standard += 1;
                cluster.stars[i].vr = if vr >= 0.0 {
                    (dtemp - vt * vt).sqrt()
                } else {
                    -(dtemp - vt * vt).sqrt()
                };
            } else {
                stats.split += 1;
                let half = (dtemp / 2.0).sqrt();
                cluster.stars[i].vt = half;
                cluster.stars[i].vr = half;
            }
        } else if i + 1 < cluster.n_live {
            stats.transferred += 1;
            cluster.stars[i + 1].ei += dtemp - (vt * vt + vr * vr);
        }
    }

    Ok(stats)
}
