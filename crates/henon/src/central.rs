//! Core-region aggregate statistics.
//!
//! Recomputed every step from the innermost stars; the results feed the
//! timestep scale, the core-density snapshot ladder, and diagnostics. All
//! masses here are in code units (stored masses divided by the star count).

use cluster::Cluster;
use serde::{Deserialize, Serialize};

use std::f64::consts::PI;

/// Snapshot of central-region quantities from the innermost sample.
///
/// Sub-population averages (singles or binaries) are zero when that
/// sub-population is empty.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CentralState {
    /// Sample size, `min(configured count, live population)`.
    pub n: usize,
    pub n_single: usize,
    pub n_binary: usize,
    /// Radius bounding the sample.
    pub r: f64,
    pub volume: f64,
    /// Object number density, and per-sub-population versions.
    pub number_density: f64,
    pub number_density_single: f64,
    pub number_density_binary: f64,
    /// Sample mass in code units, and per-sub-population versions.
    pub m: f64,
    pub m_single: f64,
    pub m_binary: f64,
    /// Central mass density, the quantity the snapshot ladder watches.
    pub rho: f64,
    pub rho_single: f64,
    pub rho_binary: f64,
    pub m_ave: f64,
    pub m_single_ave: f64,
    pub m_binary_ave: f64,
    pub v_rms: f64,
    pub v_single_rms: f64,
    pub v_binary_rms: f64,
    /// Mass-weighted mean-square velocity, `sum(2 m v^2) / (m_ave * n)`.
    pub w2_ave: f64,
    /// Second moment of stellar radius over singles.
    pub rad2_ave: f64,
    /// Mean mass-radius product over singles.
    pub m_rad_ave: f64,
    /// Semimajor-axis moments over binaries.
    pub a_ave: f64,
    pub a2_ave: f64,
    pub ma_ave: f64,
    /// Core radius, `sqrt(3 v_rms^2 / (4 pi rho))`.
    pub core_radius: f64,
    /// Number of objects inside the core radius.
    pub n_core: f64,
    /// Core relaxation time, `0.065 v_rms^3 / (rho m_ave)`.
    pub t_rc: f64,
}

/// Aggregates central quantities over the innermost
/// `min(num_central_stars, n_live)` stars.
pub fn recompute(cluster: &Cluster, num_central_stars: usize) -> CentralState {
    let count = num_central_stars.min(cluster.n_live);
    if count == 0 {
        return CentralState::default();
    }
    let madhoc = cluster.madhoc();

    let mut state = CentralState {
        n: count,
        ..CentralState::default()
    };
    let mut v2_sum = 0.0;
    let mut v2_single_sum = 0.0;
    let mut v2_binary_sum = 0.0;
    let mut w2_sum = 0.0;
    let mut rad2_sum = 0.0;
    let mut m_rad_sum = 0.0;
    let mut a_sum = 0.0;
    let mut a2_sum = 0.0;
    let mut ma_sum = 0.0;

    for star in &cluster.stars[..count] {
        let m = star.m * madhoc;
        let v2 = star.speed2();
        state.m += m;
        v2_sum += v2;
        w2_sum += 2.0 * m * v2;

        match star.binary.and_then(|idx| cluster.binaries.get(idx)) {
            Some(binary) => {
                state.n_binary += 1;
                state.m_binary += m;
                v2_binary_sum += v2;
                a_sum += binary.a;
                a2_sum += binary.a * binary.a;
                ma_sum += m * binary.a;
            }
            None => {
                state.n_single += 1;
                state.m_single += m;
                v2_single_sum += v2;
                rad2_sum += star.rad * star.rad;
                m_rad_sum += m * star.rad;
            }
        }
    }

    // Sample bounded by the first star outside it; for a whole-cluster
    // sample fall back to the outermost live star.
    state.r = if count < cluster.n_live {
        cluster.stars[count].r
    } else {
        cluster.stars[cluster.n_live - 1].r
    };
    state.volume = 4.0 / 3.0 * PI * state.r.powi(3);

    state.number_density = count as f64 / state.volume;
    state.number_density_single = state.n_single as f64 / state.volume;
    state.number_density_binary = state.n_binary as f64 / state.volume;
    state.rho = state.m / state.volume;
    state.rho_single = state.m_single / state.volume;
    state.rho_binary = state.m_binary / state.volume;

    state.m_ave = state.m / count as f64;
    state.v_rms = (v2_sum / count as f64).sqrt();
    state.w2_ave = w2_sum / (state.m_ave * count as f64);

    if state.n_single > 0 {
        let n_single = state.n_single as f64;
        state.m_single_ave = state.m_single / n_single;
        state.v_single_rms = (v2_single_sum / n_single).sqrt();
        state.rad2_ave = rad2_sum / n_single;
        state.m_rad_ave = m_rad_sum / n_single;
    }
    if state.n_binary > 0 {
        let n_binary = state.n_binary as f64;
        state.m_binary_ave = state.m_binary / n_binary;
        state.v_binary_rms = (v2_binary_sum / n_binary).sqrt();
        state.a_ave = a_sum / n_binary;
        state.a2_ave = a2_sum / n_binary;
        state.ma_ave = ma_sum / n_binary;
    }

    state.core_radius = (3.0 * state.v_rms * state.v_rms / (4.0 * PI * state.rho)).sqrt();
    state.n_core = 4.0 / 3.0 * PI * state.core_radius.powi(3) * state.number_density;
    state.t_rc = 0.065 * state.v_rms.powi(3) / (state.rho * state.m_ave);

    state
}
