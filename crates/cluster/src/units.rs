//! Conversion between code units and CGS.
//!
//! Inside the engine everything is dimensionless: G = 1, the initial total
//! stellar mass is 1, and masses carry an extra factor of the star count.
//! Physical output applies these factors at the boundary only.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;

/// Solar mass in grams.
pub const MSUN: f64 = 1.989e33;
/// Solar radius in centimeters.
pub const RSUN: f64 = 6.9599e10;
/// Gravitational constant in CGS.
pub const G_CGS: f64 = 6.67259e-8;
/// Year in seconds.
pub const YEAR: f64 = 3.155693e7;
/// Astronomical unit in centimeters.
pub const AU: f64 = 1.496e13;
/// Parsec in centimeters.
pub const PARSEC: f64 = 3.0857e18;
/// Kiloparsec in centimeters.
pub const KPC: f64 = 3.0857e21;

/// CGS values of one code unit of each dimension.
///
/// Built from the constraint `U_l = U_t^(2/3) G^(1/3) U_m^(1/3)`, which makes
/// G = 1 in code units once time and mass are fixed by the configured
/// relaxation-time and mass scalings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnitSystem {
    /// One code time unit, in seconds.
    pub t: f64,
    /// One code mass unit (the total initial cluster mass), in grams.
    pub m: f64,
    /// One code length unit, in centimeters.
    pub l: f64,
    /// One code energy unit, in ergs.
    pub energy: f64,
    /// One stored star-mass unit, in grams. Star masses carry an extra
    /// factor of the star count relative to code units.
    pub mstar: f64,
    /// `1 / n_star`, the stored-mass to code-mass conversion.
    pub madhoc: f64,
    /// The half-mass relaxation time implied by the scalings, in seconds.
    pub t_rel: f64,
}

impl UnitSystem {
    /// Derives the unit system for a run of `n_star` stars.
    pub fn derive(cfg: &SimConfig, n_star: usize) -> Self {
        let n = n_star as f64;
        let t = (cfg.gamma * n).ln() / (n * cfg.mega_year) * 1.0e6 * YEAR;
        let m = n * cfg.initial_total_mass / cfg.solar_mass_dyn * MSUN;
        let l = t.powf(2.0 / 3.0) * G_CGS.powf(1.0 / 3.0) * m.powf(1.0 / 3.0);
        let energy = G_CGS * m * m / l;
        let mstar = cfg.initial_total_mass / cfg.solar_mass_dyn * MSUN;
        let t_rel = t * n / (cfg.gamma * n).ln();
        UnitSystem {
            t,
            m,
            l,
            energy,
            mstar,
            madhoc: 1.0 / n,
            t_rel,
        }
    }

    /// One code time unit in years.
    pub fn time_in_years(&self) -> f64 {
        self.t / YEAR
    }

    /// One code length unit in parsecs.
    pub fn length_in_parsec(&self) -> f64 {
        self.l / PARSEC
    }

    /// One code mass unit in solar masses.
    pub fn mass_in_msun(&self) -> f64 {
        self.m / MSUN
    }
}
