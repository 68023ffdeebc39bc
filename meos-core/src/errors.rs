use crate::parameter::RegistryError;
use thiserror::Error;

/// Error type for improperly defined states and convergence problems.
#[derive(Error, Debug)]
pub enum MeosError {
    // errors related to the validity range of an equation
    #[error("{property} = {value} is outside of the valid range [{min}, {max}].")]
    OutOfRange {
        property: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Mechanically unstable state at T = {temperature} K, rho = {density} mol/m³ (dp/drho = {dp_drho}).")]
    UnstableState {
        temperature: f64,
        density: f64,
        dp_drho: f64,
    },

    // errors related to algorithms
    #[error("`{solver}` did not converge within {iterations} iteration(s) (last iterate {iterate}, residual {residual:e}).")]
    NotConverged {
        solver: String,
        iterations: usize,
        iterate: f64,
        residual: f64,
    },
    #[error("`{0}` encountered illegal values during the iteration.")]
    IterationFailed(String),
    #[error("Iteration resulted in trivial solution.")]
    TrivialSolution,
    #[error("`{0}` was cancelled.")]
    Cancelled(String),

    // errors related to the input
    #[error("Invalid input: {0}.")]
    InvalidInput(String),

    // errors related to parameter handling
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl MeosError {
    pub(crate) fn out_of_range(property: &str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            property: property.into(),
            value,
            min,
            max,
        }
    }
}

/// Convenience type for `Result<T, MeosError>`.
pub type MeosResult<T> = Result<T, MeosError>;
