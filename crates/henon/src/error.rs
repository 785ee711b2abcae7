use thiserror::Error;

/// Unrecoverable corruption of the shared star array.
///
/// Every variant indicates that upstream state is already inconsistent, so
/// there is no retry path; the driver logs the error and stops. Infeasible
/// energy budgets during velocity reconciliation are deliberately not here,
/// they are expected and absorbed by the loss accumulator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorruptionError {
    /// NaN crept into the enclosed-mass accumulation.
    #[error("NaN in enclosed mass at star index {index}")]
    NonFiniteMass { index: usize },

    /// NaN in a star's recomputed potential, usually a zero or negative
    /// radius upstream.
    #[error("NaN in potential at star index {index} (r = {r:e})")]
    NonFinitePotential { index: usize, r: f64 },

    /// The radial sort invariant is broken.
    #[error("star array not sorted by radius at index {index}")]
    UnsortedRadii { index: usize },

    /// The bisection bracket does not contain the lookup radius. Only
    /// possible if the array was mutated without re-sorting.
    #[error("potential lookup bracket [{lo:e}, {hi:e}] does not contain r = {r:e} (index {index})")]
    BracketMismatch {
        index: usize,
        r: f64,
        lo: f64,
        hi: f64,
    },
}
