use serde::{Deserialize, Serialize};

use crate::binary::BinaryRegistry;
use crate::star::Star;

/// Central point mass (e.g. an accumulated merger remnant) and the kinetic
/// energy it has absorbed. The mass follows the star-mass convention of being
/// pre-multiplied by the initial star count.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CentralBody {
    pub m: f64,
    pub e: f64,
}

/// The complete mutable state of one cluster simulation.
///
/// Every engine stage takes this by reference instead of touching shared
/// globals. The star array is the single source of truth for the ensemble;
/// whenever the potential is rebuilt or looked up, the tracked prefix must be
/// sorted ascending by radius (see [`Cluster::sort_by_radius`]).
///
/// Three population counts describe the array:
/// - `n_initial`: stars at startup; fixes the mass unit and never changes.
/// - `n_tracked`: stars still handled by the perturbation stage. Mergers and
///   other destructive encounters may shrink it.
/// - `n_live`: stars inside the cluster (radius below the escape sentinel),
///   set only by the potential rebuild.
///
/// `n_live <= n_tracked <= stars.len()` holds throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub stars: Vec<Star>,
    pub binaries: BinaryRegistry,
    pub n_initial: usize,
    pub n_tracked: usize,
    pub n_live: usize,
    /// Total cluster mass in code units (stellar plus central), refreshed by
    /// the potential rebuild.
    pub mtotal: f64,
    /// Tidal radius, `orbit_r * mtotal^(1/3)`.
    pub rtidal: f64,
    /// Galactocentric orbit scale entering the tidal radius.
    pub orbit_r: f64,
    pub central: CentralBody,
    /// Simulated time in code units.
    pub time: f64,
    pub step_count: u64,
}

impl Cluster {
    /// Wraps a freshly sampled ensemble. All population counts start at the
    /// array length; `mtotal`, `rtidal`, and the per-star potentials are
    /// filled in by the first potential rebuild.
    pub fn new(stars: Vec<Star>) -> Self {
        let n = stars.len();
        Cluster {
            stars,
            binaries: BinaryRegistry::new(),
            n_initial: n,
            n_tracked: n,
            n_live: n,
            mtotal: 0.0,
            rtidal: 0.0,
            orbit_r: 1.0,
            central: CentralBody::default(),
            time: 0.0,
            step_count: 0,
        }
    }

    /// The initial star count as a float, the divisor for every stored mass.
    pub fn n_star(&self) -> f64 {
        self.n_initial as f64
    }

    /// `1 / n_initial`, the factor that converts stored masses to code units.
    pub fn madhoc(&self) -> f64 {
        1.0 / self.n_initial as f64
    }

    /// Stars currently inside the cluster, innermost first.
    pub fn live(&self) -> &[Star] {
        &self.stars[..self.n_live]
    }

    pub fn live_mut(&mut self) -> &mut [Star] {
        &mut self.stars[..self.n_live]
    }

    /// Stars still handled by the perturbation stage (live plus this step's
    /// escapers that have not been re-sorted yet).
    pub fn tracked(&self) -> &[Star] {
        &self.stars[..self.n_tracked]
    }

    pub fn tracked_mut(&mut self) -> &mut [Star] {
        &mut self.stars[..self.n_tracked]
    }

    /// Re-establishes the radial sort invariant over the tracked prefix.
    ///
    /// Escapers carry the radius sentinel and sink to the tail. Must be
    /// called after any stage that moves stars and before the potential is
    /// rebuilt or looked up.
    pub fn sort_by_radius(&mut self) {
        self.stars[..self.n_tracked].sort_unstable_by(|a, b| a.r.total_cmp(&b.r));
    }

    /// Total stellar mass of the live population in code units.
    pub fn live_stellar_mass(&self) -> f64 {
        let n_star = self.n_star();
        self.live().iter().map(|s| s.m / n_star).sum()
    }

    /// True when the tracked prefix is sorted ascending by radius.
    pub fn is_sorted_by_radius(&self) -> bool {
        self.stars[..self.n_tracked]
            .windows(2)
            .all(|w| w[0].r <= w[1].r)
    }
}
