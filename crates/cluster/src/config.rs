use serde::{Deserialize, Serialize};

/// Which velocity-correction scheme the engine applies after each
/// perturbation step.
///
/// Both schemes reconcile the predicted velocities with the rebuilt
/// potential so that per-star energy is approximately conserved; they differ
/// in what they hold fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VelocityPolicy {
    /// Conserve angular momentum: the tangential velocity is scaled by
    /// `r_old / r_new` and the radial velocity absorbs the energy budget.
    AngularMomentum,
    /// Stodolkiewicz (1982) interpolation: blend the old- and new-potential
    /// differences with mixing weight `q` and rescale both velocity
    /// components by a common factor. `q = 0` takes the whole potential
    /// change from the new radius; `q = 0.5` is the symmetric form.
    Stodolkiewicz { q: f64 },
}

impl Default for VelocityPolicy {
    fn default() -> Self {
        VelocityPolicy::Stodolkiewicz { q: 0.5 }
    }
}

/// Runtime knobs for the relaxation engine.
///
/// Loading and parsing live with the embedding application; this crate only
/// defines the surface (with serde derives so embedders can deserialize from
/// whatever format they use) and the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Divides the relaxation-time estimate to produce the timestep. Larger
    /// values mean smaller, safer steps.
    pub dt_factor: f64,
    /// Maximum relaxation angle per step, in radians. Enters the timestep as
    /// `sin^2(theta)`.
    pub theta_se_max: f64,
    /// Enables the core/halo sub-zoning scheme. When off, every step
    /// advances the full population.
    pub subzoning: bool,
    /// Sample size for the central-quantities aggregation.
    pub num_central_stars: usize,
    /// Applies the intermediate-energy correction pass when set.
    pub energy_conservation: bool,
    pub velocity_policy: VelocityPolicy,
    /// Simulated-time budget in code units.
    pub t_max: f64,
    /// Timestep-count budget.
    pub t_max_count: u64,
    /// Wall-clock budget in minutes.
    pub max_wallclock_minutes: u64,
    /// Halt when the innermost Lagrangian radius falls below this floor.
    pub min_lagrangian_radius: f64,
    /// Halt when the total energy has drifted this far below its initial
    /// value.
    pub terminal_energy_displacement: f64,
    /// Central point mass seeded at startup, in star-mass units (i.e.
    /// pre-multiplied by the initial star count).
    pub central_point_mass: f64,
    /// Mass fractions tracked by the Lagrangian-radius profile, ascending.
    pub lagrange_fractions: Vec<f64>,
    /// Radius reported for mass fractions already swallowed by the central
    /// point mass.
    pub min_radius: f64,
    /// Master switch for diagnostic snapshot emission.
    pub snapshots_enabled: bool,
    /// Coulomb-logarithm coefficient: the relaxation time carries
    /// `ln(gamma N)`.
    pub gamma: f64,
    /// Relaxation time of the initial model in Myr, scaling the time unit.
    pub mega_year: f64,
    /// Dynamical solar-mass scaling from the initial-model header.
    pub solar_mass_dyn: f64,
    /// Initial total cluster mass in solar masses.
    pub initial_total_mass: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            dt_factor: 40.0,
            theta_se_max: 1.0,
            subzoning: true,
            num_central_stars: 100,
            energy_conservation: true,
            velocity_policy: VelocityPolicy::default(),
            t_max: 20.0,
            t_max_count: 1_000_000,
            max_wallclock_minutes: 2880,
            min_lagrangian_radius: 0.0,
            terminal_energy_displacement: 10.0,
            central_point_mass: 0.0,
            lagrange_fractions: vec![
                0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9,
            ],
            min_radius: 0.0,
            snapshots_enabled: false,
            gamma: 0.11,
            mega_year: 1.0,
            solar_mass_dyn: 1.0,
            initial_total_mass: 1.0,
        }
    }
}
