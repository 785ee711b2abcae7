use approx::assert_relative_eq;
use cluster::{Cluster, SimConfig, Star};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use crate::potential;
use crate::timestep::{self, SubzoneState, SUB_IMIN};

fn make_plummer(n: usize, seed: u64) -> Cluster {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    let mut cluster = cluster::sampling::plummer_model(n, &mut rng);
    potential::recompute(&mut cluster).unwrap();
    cluster
}

/// A cluster engineered to sub-zone: a dense inner half below radius 2 and
/// a sparse halo starting at radius 10, all with identical speeds.
fn make_core_halo_cluster(n: usize) -> Cluster {
    let half = n / 2;
    let stars = (0..n)
        .map(|k| {
            let r = if k < half {
                0.001 * (k + 1) as f64
            } else {
                10.0 + 0.5 * (k - half) as f64
            };
            Star::new(k as u64, 1.0, r, 0.1, 0.2)
        })
        .collect();
    let mut cluster = Cluster::new(stars);
    potential::recompute(&mut cluster).unwrap();
    cluster
}

#[test]
fn test_relaxation_dt_positive_on_plummer() {
    let cluster = make_plummer(500, 21);
    let dt = timestep::relaxation_dt(&cluster, &SimConfig::default());
    assert!(dt > 0.0);
    assert!(dt.is_finite());
}

#[test]
fn test_dt_scales_inversely_with_dt_factor() {
    let cluster = make_plummer(500, 21);
    let cfg = SimConfig::default();
    let doubled = SimConfig {
        dt_factor: 2.0 * cfg.dt_factor,
        ..SimConfig::default()
    };

    let dt = timestep::relaxation_dt(&cluster, &cfg);
    let dt_doubled = timestep::relaxation_dt(&cluster, &doubled);
    assert_relative_eq!(dt_doubled, dt / 2.0, max_relative = 1e-12);
}

#[test]
fn test_dt_scales_with_deflection_angle() {
    let cluster = make_plummer(500, 21);
    let cfg = SimConfig::default();
    let narrow = SimConfig {
        theta_se_max: 0.5,
        ..SimConfig::default()
    };

    let dt = timestep::relaxation_dt(&cluster, &cfg);
    let dt_narrow = timestep::relaxation_dt(&cluster, &narrow);
    let expected = dt * 0.5_f64.sin().powi(2) / 1.0_f64.sin().powi(2);
    assert_relative_eq!(dt_narrow, expected, max_relative = 1e-12);
}

#[test]
fn test_empty_cluster_dt_is_zero() {
    let cluster = Cluster::new(Vec::new());
    assert_eq!(timestep::relaxation_dt(&cluster, &SimConfig::default()), 0.0);
}

#[test]
fn test_small_cluster_never_subzones() {
    // Below the scan floor every step is a full step at factor 1.
    let cluster = make_plummer(500, 3);
    assert!(cluster.n_live < SUB_IMIN);

    let cfg = SimConfig::default();
    let dt = timestep::relaxation_dt(&cluster, &cfg);
    let mut state = SubzoneState::new();

    for _ in 0..4 {
        let plan = state.plan(&cluster, &cfg, dt);
        assert_eq!(state.factor(), 1);
        assert!(plan.full_step);
        assert_eq!(plan.advance_through, cluster.n_live);
        assert_relative_eq!(plan.halo_dt, dt, max_relative = 1e-12);
    }
}

#[test]
fn test_core_halo_cluster_takes_top_tier() {
    let cluster = make_core_halo_cluster(4000);
    let cfg = SimConfig::default();
    let dt = timestep::relaxation_dt(&cluster, &cfg);

    let mut state = SubzoneState::new();
    state.plan(&cluster, &cfg, dt);

    // The first scan candidate already sits in the sparse halo, where the
    // local timestep dwarfs the core timestep.
    assert_eq!(state.factor(), 25);
    assert_eq!(state.boundary(), SUB_IMIN);
    assert_eq!(state.r_max(), cluster.stars[SUB_IMIN - 1].r);
}

#[test]
fn test_subzone_cycle_structure() {
    let cluster = make_core_halo_cluster(4000);
    let cfg = SimConfig::default();
    let dt = timestep::relaxation_dt(&cluster, &cfg);
    let mut state = SubzoneState::new();

    // Two whole cycles: factor - 1 core-only steps, then one full step that
    // carries the accumulated halo interval.
    for _cycle in 0..2 {
        let factor = {
            let plan = state.plan(&cluster, &cfg, dt);
            let factor = state.factor();
            assert!(factor > 1);
            assert!(!plan.full_step);
            assert_eq!(plan.advance_through, state.boundary());
            assert_eq!(plan.halo_dt, 0.0);
            factor
        };

        for _ in 1..factor - 1 {
            let plan = state.plan(&cluster, &cfg, dt);
            assert!(!plan.full_step);
            assert_eq!(plan.halo_dt, 0.0);
        }

        let full = state.plan(&cluster, &cfg, dt);
        assert!(full.full_step);
        assert_eq!(full.advance_through, cluster.n_live);
        assert_relative_eq!(full.halo_dt, factor as f64 * dt, max_relative = 1e-12);
        assert_eq!(state.elapsed(), 0.0);
    }
}

#[test]
fn test_elapsed_accumulates_between_full_steps() {
    let cluster = make_core_halo_cluster(4000);
    let cfg = SimConfig::default();
    let dt = timestep::relaxation_dt(&cluster, &cfg);
    let mut state = SubzoneState::new();

    state.plan(&cluster, &cfg, dt);
    state.plan(&cluster, &cfg, dt);
    state.plan(&cluster, &cfg, dt);
    assert_relative_eq!(state.elapsed(), 3.0 * dt, max_relative = 1e-12);
}

#[test]
fn test_subzoning_disabled_always_full() {
    let cluster = make_core_halo_cluster(4000);
    let cfg = SimConfig {
        subzoning: false,
        ..SimConfig::default()
    };
    let dt = timestep::relaxation_dt(&cluster, &cfg);
    let mut state = SubzoneState::new();

    for _ in 0..3 {
        let plan = state.plan(&cluster, &cfg, dt);
        assert_eq!(state.factor(), 1);
        assert!(plan.full_step);
        assert_eq!(plan.advance_through, cluster.n_live);
    }
}

#[test]
fn test_factor_choice_on_plummer_is_in_ladder() {
    let cluster = make_plummer(4000, 17);
    let cfg = SimConfig::default();
    let dt = timestep::relaxation_dt(&cluster, &cfg);

    let mut state = SubzoneState::new();
    state.plan(&cluster, &cfg, dt);
    assert!(matches!(state.factor(), 1 | 2 | 5 | 10 | 25));
    assert!(state.boundary() <= cluster.n_live);
}
