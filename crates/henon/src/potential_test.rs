use approx::assert_relative_eq;
use cluster::{Cluster, Star, R_INFINITY};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use crate::error::CorruptionError;
use crate::potential;

/// Unit-mass stars at the given radii, with some nonzero velocities.
fn make_line_cluster(radii: &[f64]) -> Cluster {
    let stars = radii
        .iter()
        .enumerate()
        .map(|(i, &r)| Star::new(i as u64, 1.0, r, 0.1, 0.2))
        .collect();
    Cluster::new(stars)
}

#[test]
fn test_three_star_hand_values() {
    // Three unit masses at r = 1, 2, 3. The inward sweep gives
    //   phi = { -11/18, -4/9, -1/3 }
    let mut cluster = make_line_cluster(&[1.0, 2.0, 3.0]);
    let n_live = potential::recompute(&mut cluster).unwrap();

    assert_eq!(n_live, 3);
    assert_eq!(cluster.n_live, 3);
    assert_relative_eq!(cluster.mtotal, 1.0, max_relative = 1e-12);
    assert_relative_eq!(cluster.rtidal, 1.0, max_relative = 1e-12);
    assert_relative_eq!(cluster.stars[0].phi, -11.0 / 18.0, max_relative = 1e-8);
    assert_relative_eq!(cluster.stars[1].phi, -4.0 / 9.0, max_relative = 1e-8);
    assert_relative_eq!(cluster.stars[2].phi, -1.0 / 3.0, max_relative = 1e-8);
}

#[test]
fn test_central_mass_deepens_potential() {
    let mut cluster = make_line_cluster(&[1.0, 2.0, 3.0]);
    cluster.central.m = 0.3; // 0.1 in code units for N = 3

    potential::recompute(&mut cluster).unwrap();

    assert_relative_eq!(cluster.mtotal, 1.1, max_relative = 1e-12);
    assert_relative_eq!(cluster.stars[0].phi, -0.8111111111111111, max_relative = 1e-8);
    assert_relative_eq!(cluster.stars[1].phi, -0.5444444444444444, max_relative = 1e-8);
    assert_relative_eq!(cluster.stars[2].phi, -0.4, max_relative = 1e-8);
}

#[test]
fn test_potential_monotonic_on_plummer() {
    let mut rng = ChaChaRng::seed_from_u64(42);
    let mut cluster = cluster::sampling::plummer_model(500, &mut rng);
    potential::recompute(&mut cluster).unwrap();

    for w in cluster.live().windows(2) {
        assert!(w[0].phi <= w[1].phi);
    }
    for star in cluster.live() {
        assert!(star.phi < 0.0);
    }
}

#[test]
fn test_lookup_exact_at_star_radii() {
    let mut cluster = make_line_cluster(&[1.0, 2.0, 3.0]);
    potential::recompute(&mut cluster).unwrap();

    for star in cluster.live() {
        let phi = potential::at_radius(&cluster, star.r).unwrap();
        assert_eq!(phi, star.phi);
    }
}

#[test]
fn test_lookup_flat_inside_innermost_star() {
    let mut cluster = make_line_cluster(&[1.0, 2.0, 3.0]);
    potential::recompute(&mut cluster).unwrap();

    let phi0 = cluster.stars[0].phi;
    assert_eq!(potential::at_radius(&cluster, 0.5).unwrap(), phi0);
    assert_eq!(potential::at_radius(&cluster, 1e-12).unwrap(), phi0);
}

#[test]
fn test_lookup_interpolates_in_inverse_radius() {
    let mut cluster = make_line_cluster(&[1.0, 2.0, 3.0]);
    potential::recompute(&mut cluster).unwrap();

    // Linear in 1/r between the r = 1 and r = 2 stars:
    //   phi(1.5) = -11/18 + (3/18) * (1/3) / (1/2) = -1/2
    let phi = potential::at_radius(&cluster, 1.5).unwrap();
    assert_relative_eq!(phi, -0.5, max_relative = 1e-8);
}

#[test]
fn test_lookup_beyond_outermost_is_keplerian() {
    let mut cluster = make_line_cluster(&[1.0, 2.0, 3.0]);
    potential::recompute(&mut cluster).unwrap();

    // Outside every star the profile is -Mtotal / r.
    let phi = potential::at_radius(&cluster, 6.0).unwrap();
    assert_relative_eq!(phi, -1.0 / 6.0, max_relative = 1e-8);
}

#[test]
fn test_recompute_is_idempotent() {
    let mut rng = ChaChaRng::seed_from_u64(9);
    let mut cluster = cluster::sampling::plummer_model(200, &mut rng);

    potential::recompute(&mut cluster).unwrap();
    let first: Vec<f64> = cluster.live().iter().map(|s| s.phi).collect();
    let mtotal = cluster.mtotal;

    potential::recompute(&mut cluster).unwrap();
    let second: Vec<f64> = cluster.live().iter().map(|s| s.phi).collect();

    assert_eq!(first, second);
    assert_eq!(cluster.mtotal, mtotal);
}

#[test]
fn test_escapers_drop_out_of_live_population() {
    let mut cluster = make_line_cluster(&[1.0, 2.0, 3.0, R_INFINITY]);
    let n_live = potential::recompute(&mut cluster).unwrap();

    assert_eq!(n_live, 3);
    // The escaper's mass no longer counts: 3 of 4 unit masses remain.
    assert_relative_eq!(cluster.mtotal, 0.75, max_relative = 1e-12);
}

#[test]
fn test_unsorted_radii_rejected() {
    let mut cluster = make_line_cluster(&[2.0, 1.0, 3.0]);
    let err = potential::recompute(&mut cluster).unwrap_err();
    assert_eq!(err, CorruptionError::UnsortedRadii { index: 1 });
}

#[test]
fn test_nan_mass_rejected() {
    let mut cluster = make_line_cluster(&[1.0, 2.0, 3.0]);
    cluster.stars[1].m = f64::NAN;
    let err = potential::recompute(&mut cluster).unwrap_err();
    assert_eq!(err, CorruptionError::NonFiniteMass { index: 1 });
}

#[test]
fn test_zero_radius_star_rejected() {
    let mut cluster = make_line_cluster(&[0.0, 1.0]);
    let err = potential::recompute(&mut cluster).unwrap_err();
    assert!(matches!(err, CorruptionError::NonFinitePotential { index: 0, .. }));
}

#[test]
fn test_nan_lookup_radius_rejected() {
    let mut cluster = make_line_cluster(&[1.0, 2.0, 3.0]);
    potential::recompute(&mut cluster).unwrap();

    let err = potential::at_radius(&cluster, f64::NAN).unwrap_err();
    assert!(matches!(err, CorruptionError::BracketMismatch { .. }));
}

#[test]
fn test_empty_cluster_lookup_is_zero() {
    let cluster = Cluster::new(Vec::new());
    assert_eq!(potential::at_radius(&cluster, 1.0).unwrap(), 0.0);
}
