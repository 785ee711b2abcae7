//! Radial gravitational potential from the sorted mass distribution.
//!
//! Hénon's method: with the stars sorted by radius, the potential at star k
//! is built by a single inward sweep from the outer boundary,
//!
//! ```text
//! phi[k] = phi[k+1] - M_enc(k) * (1/r[k] - 1/r[k+1])
//! ```
//!
//! where `M_enc(k)` is the mass enclosed by star k's radius (each shell of
//! exterior stars contributes a constant inside itself). The sweep starts at
//! a virtual boundary star at the escape radius with zero potential, so the
//! profile falls off as `-Mtotal/r` outside the outermost star.
//!
//! Both entry points fail with [`CorruptionError`] rather than producing
//! garbage when the sort invariant is broken or a NaN appears.
//!
//! # References
//! - Henon (1971), Ap&SS 14, 151
//! - Joshi, Rasio & Portegies Zwart (2000), ApJ 540, 969

use cluster::{Cluster, R_INFINITY};

use crate::error::CorruptionError;

/// Rebuilds the per-star potential profile in place.
///
/// Walks the tracked prefix to find the live-population boundary (the first
/// star at the escape radius ends the live range), refreshes `n_live`,
/// `mtotal`, and `rtidal`, then runs the inward Hénon sweep and subtracts the
/// central point-mass term from every live star. Returns the new live count.
///
/// The tracked prefix must already be sorted ascending by radius; a violation
/// or any NaN in the accumulated mass or computed potential is unrecoverable.
pub fn recompute(cluster: &mut Cluster) -> Result<usize, CorruptionError> {
    let mut mprev = 0.0;
    let mut n_live = 0;
    for k in 0..cluster.n_tracked {
        let star = &cluster.stars[k];
        if star.r >= R_INFINITY {
            break;
        }
        if k > 0 && star.r < cluster.stars[k - 1].r {
            return Err(CorruptionError::UnsortedRadii { index: k });
        }
        mprev += star.m;
        if mprev.is_nan() {
            return Err(CorruptionError::NonFiniteMass { index: k });
        }
        n_live += 1;
    }
    cluster.n_live = n_live;

    let n_star = cluster.n_star();
    cluster.mtotal = mprev / n_star + cluster.central.m / n_star;
    cluster.rtidal = cluster.orbit_r * cluster.mtotal.cbrt();

    // Inward sweep from the virtual boundary star (r = escape radius,
    // phi = 0), peeling each star's own mass off the enclosed total.
    let mut phi_outer = 0.0;
    let mut r_outer = R_INFINITY;
    let mut menc = cluster.mtotal;
    for k in (0..n_live).rev() {
        let star = &mut cluster.stars[k];
        star.phi = phi_outer - menc * (1.0 / star.r - 1.0 / r_outer);
        menc -= star.m / n_star;
        phi_outer = star.phi;
        r_outer = star.r;
    }

    let m_cen = cluster.central.m / n_star;
    for k in 0..n_live {
        let star = &mut cluster.stars[k];
        star.phi -= m_cen / star.r;
        if star.phi.is_nan() {
            return Err(CorruptionError::NonFinitePotential { index: k, r: star.r });
        }
    }

    Ok(n_live)
}

/// Potential at an arbitrary radius, from the current per-star profile.
///
/// Below the innermost star the potential is taken as flat (continuity at
/// the center). Elsewhere the bracketing pair is found by bisection over the
/// sorted radii and the value is interpolated linearly in 1/r, which is
/// exact for a shell-free gap. Beyond the outermost star the virtual
/// boundary pair (escape radius, 0) closes the last bracket.
///
/// The bracket is re-checked after the search; a mismatch means the profile
/// and the array have gone out of sync and is unrecoverable.
pub fn at_radius(cluster: &Cluster, r: f64) -> Result<f64, CorruptionError> {
    let live = cluster.live();
    if live.is_empty() {
        return Ok(0.0);
    }
    if r < live[0].r {
        return Ok(live[0].phi);
    }

    // First index with radius strictly above r; the bracket is [hi-1, hi].
    let hi = live.partition_point(|s| s.r <= r);
    if hi == 0 {
        // Unreachable for finite r given the flat-interior return above;
        // a NaN lookup radius lands here.
        return Err(CorruptionError::BracketMismatch {
            index: 0,
            r,
            lo: live[0].r,
            hi: live[0].r,
        });
    }
    let i = hi - 1;
    let (r_hi, phi_hi) = if hi < live.len() {
        (live[hi].r, live[hi].phi)
    } else {
        (R_INFINITY, 0.0)
    };
    if live[i].r > r || r_hi < r {
        return Err(CorruptionError::BracketMismatch {
            index: i,
            r,
            lo: live[i].r,
            hi: r_hi,
        });
    }

    let phi = live[i].phi
        + (phi_hi - live[i].phi) * (1.0 / live[i].r - 1.0 / r)
            / (1.0 / live[i].r - 1.0 / r_hi);
    Ok(phi)
}
