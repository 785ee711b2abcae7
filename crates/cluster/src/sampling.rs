//! Initial-model sampling.
//!
//! The production pipeline reads initial models from snapshot files written
//! by a separate generator; these samplers exist so examples and tests can
//! build a valid ensemble without any I/O.

use std::f64::consts::PI;

use nalgebra::Vector3;
use rand::Rng;
use rand_chacha::ChaChaRng;

use crate::cluster::Cluster;
use crate::star::{Star, ZERO};

/// Plummer scale length in standard N-body units, `3 pi / 16`.
///
/// With total mass 1 and this scale length the model has total energy -1/4.
const PLUMMER_SCALE: f64 = 3.0 * PI / 16.0;

/// Radius cut for sampled Plummer positions, in scale lengths. The model has
/// formally infinite extent; truncating at 20 scale lengths drops well under
/// a percent of the mass and keeps the initial potential well conditioned.
const PLUMMER_RMAX: f64 = 20.0;

/// Sample from a Gaussian (normal) distribution using Box-Muller transform
///
/// # Arguments
/// * `rng` - Random number generator
/// * `mean` - Mean of the distribution
/// * `std_dev` - Standard deviation
///
/// # Returns
/// A sample from the normal distribution N(mean, std_dev²)
pub fn sample_gaussian(rng: &mut ChaChaRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.random();
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + std_dev * z
}

/// Sample from a power-law distribution
///
/// Samples from p(x) ∝ x^α between x_min and x_max using inverse transform
/// sampling.
///
/// # Arguments
/// * `x_min` - Minimum value
/// * `x_max` - Maximum value
/// * `alpha` - Power-law exponent (e.g., -2.3 for Salpeter-like mass spectra)
/// * `rng` - Random number generator
///
/// # Returns
/// A sample from the power-law distribution
pub fn sample_power_law(x_min: f64, x_max: f64, alpha: f64, rng: &mut ChaChaRng) -> f64 {
    let u: f64 = rng.random();
    let alpha1 = alpha + 1.0;
    (u * (x_max.powf(alpha1) - x_min.powf(alpha1)) + x_min.powf(alpha1)).powf(1.0 / alpha1)
}

/// Samples an equal-mass Plummer sphere in standard N-body units.
///
/// Radii come from the inverse cumulative mass profile, speeds from
/// rejection sampling of the isotropic energy distribution, and the split
/// into radial and tangential components from a uniformly random direction.
/// The returned cluster is sorted by radius with total stellar mass 1 and
/// total energy -1/4 in expectation.
///
/// # Arguments
/// * `n` - Number of stars
/// * `rng` - Random number generator
///
/// # References
/// - Plummer (1911), MNRAS 71, 460
/// - Aarseth, Henon & Wielen (1974), A&A 37, 183 (the sampling recipe)
pub fn plummer_model(n: usize, rng: &mut ChaChaRng) -> Cluster {
    let mut stars = Vec::with_capacity(n);
    for id in 0..n {
        let (r, vr, vt) = plummer_orbit(rng);
        stars.push(Star::new(id as u64, 1.0, r, vr, vt));
    }
    let mut cluster = Cluster::new(stars);
    cluster.sort_by_radius();
    cluster
}

/// Samples a Plummer sphere with a power-law mass spectrum.
///
/// Masses are drawn from `p(m) ∝ m^alpha` on `[m_min, m_max]` and normalized
/// so the mean stored mass is 1, keeping the total stellar mass at 1 in code
/// units. Positions are drawn independently of mass, so the model is not in
/// detailed multi-mass equilibrium; it is adequate for exercising the engine
/// with unequal masses.
pub fn plummer_model_with_spectrum(
    n: usize,
    m_min: f64,
    m_max: f64,
    alpha: f64,
    rng: &mut ChaChaRng,
) -> Cluster {
    let masses: Vec<f64> = (0..n)
        .map(|_| sample_power_law(m_min, m_max, alpha, rng))
        .collect();
    let mean = masses.iter().sum::<f64>() / n as f64;

    let mut stars = Vec::with_capacity(n);
    for (id, m) in masses.into_iter().enumerate() {
        let (r, vr, vt) = plummer_orbit(rng);
        stars.push(Star::new(id as u64, m / mean, r, vr, vt));
    }
    let mut cluster = Cluster::new(stars);
    cluster.sort_by_radius();
    cluster
}

/// Draws one (r, vr, vt) triple from the Plummer distribution, already
/// rescaled to standard N-body units.
fn plummer_orbit(rng: &mut ChaChaRng) -> (f64, f64, f64) {
    // Radius by inverting the cumulative mass profile, retrying draws that
    // land beyond the truncation radius.
    let r = loop {
        let x: f64 = rng.random();
        if x <= 0.0 {
            continue;
        }
        let r = (x.powf(-2.0 / 3.0) - 1.0).powf(-0.5);
        if r < PLUMMER_RMAX {
            break r;
        }
    };

    // Speed as a fraction q of the local escape speed, with q sampled by
    // rejection from g(q) = q^2 (1 - q^2)^(7/2). The bound 0.1 covers the
    // maximum g(sqrt(2/9)) ~ 0.092.
    let q = loop {
        let q: f64 = rng.random();
        let y: f64 = rng.random::<f64>() * 0.1;
        if y < q * q * (1.0 - q * q).powf(3.5) {
            break q;
        }
    };
    let v_esc = std::f64::consts::SQRT_2 * (1.0 + r * r).powf(-0.25);
    let v = q * v_esc;

    // Isotropic direction for the velocity; the radial direction is the z
    // axis, so vr is the z component and vt the in-plane magnitude.
    let cos_theta = 2.0 * rng.random::<f64>() - 1.0;
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let phi_angle = 2.0 * PI * rng.random::<f64>();
    let dir = Vector3::new(
        sin_theta * phi_angle.cos(),
        sin_theta * phi_angle.sin(),
        cos_theta,
    );
    let vel = dir * v;
    let vr = vel.z;
    let vt = (vel.x * vel.x + vel.y * vel.y).sqrt();

    // Rescale from scale-length units to standard units.
    let r_code = (r * PLUMMER_SCALE).max(ZERO);
    let v_scale = 1.0 / PLUMMER_SCALE.sqrt();
    (r_code, vr * v_scale, vt * v_scale)
}
