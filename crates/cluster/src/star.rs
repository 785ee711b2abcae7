use serde::{Deserialize, Serialize};

use crate::binary::BinaryIndex;

/// Radius sentinel marking an escaped star.
///
/// Escapers are flagged by setting their radius (or predicted radius) to this
/// value; they sink to the tail of the array on the next radial sort and drop
/// out of the live population when the potential is rebuilt.
pub const R_INFINITY: f64 = 1.0e10;

/// Smallest admissible radius, used as a positional floor when sampling
/// initial models so no star sits exactly at the coordinate origin.
pub const ZERO: f64 = 1.0e-20;

/// One ensemble member: a point mass on a radial Monte Carlo orbit.
///
/// Velocities are split into a radial component `vr` (signed) and a
/// tangential magnitude `vt` (non-negative by convention). The mass `m` is
/// stored pre-multiplied by the initial star count.
///
/// The `*_new` fields hold the orbit predictions filled in by the external
/// perturbation stage; `phase` is that stage's uniform orbital-position
/// deviate (small values mean the star was placed near pericenter). The
/// `u_old_at_*` and `*_old` fields cache the pre-update potential and
/// velocities for the energy-conserving velocity correction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Star {
    pub id: u64,
    /// Mass in code units times the initial star count.
    pub m: f64,
    /// Radial coordinate.
    pub r: f64,
    /// Radial velocity (sign encodes inward/outward).
    pub vr: f64,
    /// Tangential velocity magnitude.
    pub vt: f64,
    /// Specific orbital energy, refreshed by the energy ledger.
    pub e: f64,
    /// Specific angular momentum, refreshed by the energy ledger.
    pub j: f64,
    /// Intermediate energy carried between the prediction and correction
    /// stages of one timestep.
    pub ei: f64,
    /// Internal (non-orbital) energy, e.g. from stellar interiors.
    pub e_int: f64,
    /// Potential at this star's own current radius only.
    pub phi: f64,
    /// Radius at the previous step, before predictions were adopted.
    pub r_old: f64,
    /// Predicted radius from the perturbation stage.
    pub r_new: f64,
    /// Predicted radial velocity.
    pub vr_new: f64,
    /// Predicted tangential velocity.
    pub vt_new: f64,
    /// Pericenter of the most recently sampled orbit.
    pub r_peri: f64,
    /// Apocenter of the most recently sampled orbit.
    pub r_apo: f64,
    /// Orbital-position deviate from the position sampler, in [0, 1].
    pub phase: f64,
    /// Physical stellar radius (set by the stellar-structure collaborator).
    pub rad: f64,
    /// Old potential evaluated at the old radius.
    pub u_old_at_old: f64,
    /// Old potential evaluated at the predicted radius.
    pub u_old_at_new: f64,
    /// Radial velocity before predictions were adopted.
    pub vr_old: f64,
    /// Tangential velocity before predictions were adopted.
    pub vt_old: f64,
    /// Set when the star had a strong (few-body) encounter this step, which
    /// excludes it from the velocity-conservation scheme.
    pub interacted: bool,
    /// Slot in the binary registry, if this object is a binary.
    pub binary: Option<BinaryIndex>,
}

impl Star {
    /// Creates a single star at radius `r` with the given velocities.
    ///
    /// Predictions start out equal to the current state, the phase deviate
    /// starts at 1.0 (far from pericenter), and all bookkeeping fields are
    /// zeroed.
    pub fn new(id: u64, m: f64, r: f64, vr: f64, vt: f64) -> Self {
        Star {
            id,
            m,
            r,
            vr,
            vt,
            e: 0.0,
            j: 0.0,
            ei: 0.0,
            e_int: 0.0,
            phi: 0.0,
            r_old: r,
            r_new: r,
            vr_new: vr,
            vt_new: vt,
            r_peri: 0.0,
            r_apo: 0.0,
            phase: 1.0,
            rad: 0.0,
            u_old_at_old: 0.0,
            u_old_at_new: 0.0,
            vr_old: vr,
            vt_old: vt,
            interacted: false,
            binary: None,
        }
    }

    /// Squared speed, `vr^2 + vt^2`.
    pub fn speed2(&self) -> f64 {
        self.vr * self.vr + self.vt * self.vt
    }

    /// Kinetic energy per unit mass.
    pub fn specific_kinetic_energy(&self) -> f64 {
        0.5 * self.speed2()
    }

    /// Specific angular momentum `r * vt` at the current position.
    pub fn specific_angular_momentum(&self) -> f64 {
        self.r * self.vt
    }

    /// Whether this star has left the cluster.
    pub fn is_escaped(&self) -> bool {
        self.r >= R_INFINITY
    }
}
