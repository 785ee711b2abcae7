//! Lagrangian radii and companion shell statistics.
//!
//! A Lagrangian radius encloses a configured fraction of the total cluster
//! mass (central body included). The innermost radius doubles as a stopping
//! criterion; the rest are diagnostics.

use std::f64::consts::PI;

use cluster::{Cluster, SimConfig};
use serde::{Deserialize, Serialize};

/// Per-fraction profile, one entry per configured mass fraction.
///
/// Entries the current population never reaches stay at zero. Fractions
/// already swallowed by the central body report the configured minimum
/// radius and zeros for the star-based statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LagrangeProfile {
    /// Configured mass fractions, ascending.
    pub fractions: Vec<f64>,
    /// Radius enclosing each fraction.
    pub radii: Vec<f64>,
    /// Mean stellar mass interior to each radius, in solar masses.
    pub ave_mass: Vec<f64>,
    /// Stars interior to each radius.
    pub n_stars: Vec<usize>,
    /// Mean enclosed density interior to each radius, in code units.
    pub densities: Vec<f64>,
}

impl LagrangeProfile {
    /// Radius of the innermost tracked fraction, infinite when no fractions
    /// are configured so the radius floor can never fire.
    pub fn innermost_radius(&self) -> f64 {
        self.radii.first().copied().unwrap_or(f64::INFINITY)
    }
}

/// Walks the live population outward once, recording each fraction's radius
/// as the running enclosed mass (seeded with the central body) crosses it.
///
/// Each star advances at most one fraction, so with more fractions than
/// live stars the trailing entries stay zero.
pub fn profile(cluster: &Cluster, cfg: &SimConfig) -> LagrangeProfile {
    let count = cfg.lagrange_fractions.len();
    let mut out = LagrangeProfile {
        fractions: cfg.lagrange_fractions.clone(),
        radii: vec![0.0; count],
        ave_mass: vec![0.0; count],
        n_stars: vec![0; count],
        densities: vec![0.0; count],
    };

    let n_star = cluster.n_star();
    let mtotal = cluster.mtotal;
    let mut mprev = cluster.central.m / n_star;

    let mut mcount = 0;
    while mcount < count && mprev / mtotal > out.fractions[mcount] {
        out.radii[mcount] = cfg.min_radius;
        mcount += 1;
    }

    for (k, star) in cluster.live().iter().enumerate() {
        if mcount == count {
            break;
        }
        mprev += star.m / n_star;
        if mprev / mtotal > out.fractions[mcount] {
            out.radii[mcount] = star.r;
            out.ave_mass[mcount] = mprev / mtotal / (k + 1) as f64 * cfg.initial_total_mass;
            out.n_stars[mcount] = k + 1;
            out.densities[mcount] = mprev / (4.0 / 3.0 * PI * star.r.powi(3));
            mcount += 1;
        }
    }

    out
}
