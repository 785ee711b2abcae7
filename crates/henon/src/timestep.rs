//! Timestep selection and core/halo sub-zoning.
//!
//! The global timestep follows the two-body relaxation time of the cluster
//! core: a star is deflected by an angle of order `theta_se_max` per step.
//! Because the core relaxes much faster than the halo, the controller can
//! additionally pick a boundary index and a factor K so that only the stars
//! inside the boundary are advanced every step, while the halo is advanced
//! once per K steps through the accumulated interval. The factor escalates
//! through {2, 5, 10, 25}; larger tiers (50, 100, 500) existed upstream but
//! are disabled, and this module treats the enabled subset as the contract.

use cluster::{Cluster, SimConfig};
use serde::{Deserialize, Serialize};

/// Half-width of the star window used for local relaxation-rate estimates.
pub const AVE_KERNEL: usize = 20;

/// Smallest candidate boundary considered by the sub-zone scan. Clusters
/// below this size never sub-zone.
pub const SUB_IMIN: usize = 2000;

/// Local relaxation rate around the star at `center`, from a symmetric
/// window of `2 * AVE_KERNEL + 2` stars.
///
/// This is the standard `A_i` of Hénon-style codes: proportional to the
/// local mass density and to the inverse cube of the velocity dispersion.
/// Window edges are clamped into the live population; clusters smaller than
/// one window use every live star.
fn window_rate(cluster: &Cluster, center: usize) -> f64 {
    let p = AVE_KERNEL;
    let n = cluster.n_live;
    let (lo, hi) = if n <= 2 * p + 1 {
        (0, n - 1)
    } else if center < p {
        (0, 2 * p + 1)
    } else if center + p + 1 > n - 1 {
        (n - 2 * p - 2, n - 1)
    } else {
        (center - p, center + p + 1)
    };

    let zk = (hi - lo + 1) as f64;
    let mut m_avg = 0.0;
    let mut w2_avg = 0.0;
    for star in &cluster.stars[lo..=hi] {
        m_avg += star.m;
        w2_avg += star.m * star.speed2();
    }
    m_avg /= zk;
    w2_avg = w2_avg * 2.0 / m_avg / zk;

    let zr_min = cluster.stars[lo].r;
    let zr_max = cluster.stars[hi].r;
    6.0 * zk * m_avg * m_avg / (zr_max.powi(3) - zr_min.powi(3)) / w2_avg.powf(1.5)
}

/// Timestep implied by the relaxation rate at window center `center`.
fn local_dt(cluster: &Cluster, cfg: &SimConfig, center: usize) -> f64 {
    let theta = cfg.theta_se_max.sin();
    theta * theta / window_rate(cluster, center) * cluster.n_star() / cfg.dt_factor
        * cluster.mtotal
}

/// Global timestep for this step, from the innermost window.
pub fn relaxation_dt(cluster: &Cluster, cfg: &SimConfig) -> f64 {
    if cluster.n_live == 0 {
        return 0.0;
    }
    local_dt(cluster, cfg, 0)
}

/// What the current step should advance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepPlan {
    /// Core timestep.
    pub dt: f64,
    /// True when the halo advances too. Every step is full when sub-zoning
    /// is off or the factor is 1.
    pub full_step: bool,
    /// Stars `[0, advance_through)` move this step.
    pub advance_through: usize,
    /// Interval the halo stars advance through on a full step: the core
    /// timesteps accumulated since the halo last moved, this step included.
    /// Zero on core-only steps.
    pub halo_dt: f64,
}

/// Persistent sub-zoning state.
///
/// A cycle is `factor` steps long: `factor - 1` core-only steps followed by
/// one full step that also advances the halo through the accumulated time.
/// The boundary scan re-runs at the start of each cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubzoneState {
    /// Steps taken in the current cycle.
    count: u64,
    /// Halo advance interval K.
    factor: u64,
    /// Count of core stars (advanced every step).
    boundary: usize,
    /// Radius of the outermost core star.
    r_max: f64,
    /// Core time accumulated since the last full step.
    elapsed: f64,
}

impl SubzoneState {
    pub fn new() -> Self {
        SubzoneState {
            count: 0,
            factor: 1,
            boundary: 0,
            r_max: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn factor(&self) -> u64 {
        self.factor
    }

    pub fn boundary(&self) -> usize {
        self.boundary
    }

    pub fn r_max(&self) -> f64 {
        self.r_max
    }

    /// Core time accumulated since the halo last advanced.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Plans one step. Call exactly once per step, before the perturbation
    /// stage, with the core timestep `dt` already chosen.
    pub fn plan(&mut self, cluster: &Cluster, cfg: &SimConfig, dt: f64) -> StepPlan {
        if self.count == 0 {
            self.replan(cluster, cfg, dt);
        }

        self.count += 1;
        self.elapsed += dt;
        if self.count >= self.factor {
            let halo_dt = self.elapsed;
            self.count = 0;
            self.elapsed = 0.0;
            StepPlan {
                dt,
                full_step: true,
                advance_through: cluster.n_live,
                halo_dt,
            }
        } else {
            StepPlan {
                dt,
                full_step: false,
                advance_through: self.boundary.min(cluster.n_live),
                halo_dt: 0.0,
            }
        }
    }

    /// Scans candidate boundaries and picks the sub-zoning factor for the
    /// next cycle.
    ///
    /// Candidates step through the live population at 1% intervals. At each
    /// candidate the local timestep is compared against multiples of the
    /// core timestep; a tier is taken only when the zone outside the current
    /// boundary would still hold enough of the population (the occupancy
    /// rule), which also keeps the factor monotonic within one scan.
    fn replan(&mut self, cluster: &Cluster, cfg: &SimConfig, dt: f64) {
        let n = cluster.n_live;
        self.factor = 1;
        self.boundary = n;
        if n == 0 {
            self.r_max = 0.0;
            return;
        }
        if cfg.subzoning {
            let stride = (n / 100).max(1);
            let mut si = SUB_IMIN;
            while si <= n {
                let dt_local = local_dt(cluster, cfg, si - 1);

                if dt_local >= dt * 25.0 && self.factor < 25 {
                    if self.occupancy_allows(si, n, 25.0) {
                        self.factor = 25;
                        self.boundary = si;
                        break;
                    }
                } else if dt_local >= dt * 10.0 && self.factor < 10 {
                    if self.occupancy_allows(si, n, 10.0) {
                        self.factor = 10;
                        self.boundary = si;
                    }
                } else if dt_local >= dt * 5.0 && self.factor < 5 {
                    if self.occupancy_allows(si, n, 5.0) {
                        self.factor = 5;
                        self.boundary = si;
                    }
                } else if dt_local >= dt * 2.0 && self.factor < 2 && si < n / 2 {
                    self.factor = 2;
                    self.boundary = si;
                } else if si > n / 2 {
                    break;
                }

                si += stride;
            }
        }
        self.r_max = cluster.stars[self.boundary - 1].r;
    }

    /// Escalation guard: the candidate boundary must leave the halo beyond
    /// it large enough relative to both the current and the proposed factor.
    fn occupancy_allows(&self, si: usize, n: usize, tier: f64) -> bool {
        let factor = self.factor as f64;
        let boundary = self.boundary as f64;
        let n = n as f64;
        (si as f64 / n) < (boundary / n * factor + 1.0) / factor - 1.0 / tier
    }
}

impl Default for SubzoneState {
    fn default() -> Self {
        Self::new()
    }
}
