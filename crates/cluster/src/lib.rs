//! Data model for a Monte Carlo star-cluster simulation.
//!
//! This crate holds the star and binary storage, the cluster aggregate that
//! the relaxation engine mutates each timestep, the configuration surface,
//! the N-body unit system, and initial-model sampling. It contains no engine
//! logic; the `henon` crate does the integrating.
//!
//! All dynamical quantities are kept in code units with G = 1. Stellar masses
//! are stored pre-multiplied by the initial star count, so any expression
//! mixing mass with length or time must divide masses by that count (see
//! [`Cluster::madhoc`]).

pub mod binary;
pub mod cluster;
pub mod config;
pub mod sampling;
pub mod star;
pub mod units;


pub use binary::{Binary, BinaryIndex, BinaryRegistry};
pub use cluster::{CentralBody, Cluster};
pub use config::{SimConfig, VelocityPolicy};
pub use star::{Star, R_INFINITY, ZERO};
pub use units::UnitSystem;
