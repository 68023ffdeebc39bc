#![warn(clippy::all)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Print messages with level `Verbosity::Iter` or higher.
#[macro_export]
macro_rules! log_iter {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= Verbosity::Iter {
            println!($($arg)*);
        }
    }
}

/// Print messages with level `Verbosity::Result` or higher.
#[macro_export]
macro_rules! log_result {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= Verbosity::Result {
            println!($($arg)*);
        }
    }
}

mod density_iteration;
pub mod equation_of_state;
mod errors;
pub mod parameter;
mod phase_equilibria;
mod reference_state;
mod state;

pub use equation_of_state::{
    Ancillary, AncillaryKind, EquationVariant, HelmholtzDerivatives, IdealGasTerm, Order,
    ReducedHelmholtz, ResidualTerm, Substance, SurfaceTension,
};
pub use errors::{MeosError, MeosResult};
pub use phase_equilibria::{SaturationPoint, SaturationStage, TemperatureOrPressure};
pub use reference_state::ReferenceState;
pub use state::{Fluid, Phase, Property, PropertyBundle, StateSpec};

/// Universal gas constant in J/(mol K) (CODATA 2018).
pub const RGAS: f64 = 8.314462618;

/// Level of detail in the iteration output.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Do not print output.
    #[default]
    None,
    /// Print information about the success of failure of the iteration.
    Result,
    /// Print a detailed output for every iteration.
    Iter,
}

/// Options for the iterative solvers.
///
/// If the values are [None], solver specific default
/// values are used.
#[derive(Clone, Default, Debug)]
pub struct SolverOptions {
    /// Maximum number of iterations.
    pub max_iter: Option<usize>,
    /// Tolerance.
    pub tol: Option<f64>,
    /// Iteration output indicated by the [Verbosity] enum.
    pub verbosity: Verbosity,
    /// Wall clock budget of a single solver call.
    pub max_duration: Option<Duration>,
    /// Cooperative abort flag, polled at every iteration boundary.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl From<(Option<usize>, Option<f64>, Option<Verbosity>)> for SolverOptions {
    fn from(options: (Option<usize>, Option<f64>, Option<Verbosity>)) -> Self {
        Self {
            max_iter: options.0,
            tol: options.1,
            verbosity: options.2.unwrap_or(Verbosity::None),
            ..Default::default()
        }
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    pub fn cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn unwrap_or(&self, max_iter: usize, tol: f64) -> (usize, f64, Verbosity) {
        (
            self.max_iter.unwrap_or(max_iter),
            self.tol.unwrap_or(tol),
            self.verbosity,
        )
    }

    /// Options for a solver that is nested in another one: same budget
    /// and cancellation flag, solver defaults and no output.
    pub(crate) fn quiet(&self) -> Self {
        Self {
            max_iter: None,
            tol: None,
            verbosity: Verbosity::None,
            ..self.clone()
        }
    }

    /// Start the clock of an iteration that is bounded by these options.
    pub(crate) fn watchdog(&self, solver: &'static str) -> Watchdog {
        Watchdog {
            solver,
            deadline: self.max_duration.map(|d| Instant::now() + d),
            cancel: self.cancel.clone(),
        }
    }
}

/// Checks the cancellation flag and the time budget between iterations.
pub(crate) struct Watchdog {
    solver: &'static str,
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Watchdog {
    pub(crate) fn check(&self, iterations: usize, iterate: f64, residual: f64) -> MeosResult<()> {
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(MeosError::Cancelled(self.solver.into()));
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() > deadline {
                return Err(MeosError::NotConverged {
                    solver: self.solver.into(),
                    iterations,
                    iterate,
                    residual,
                });
            }
        }
        Ok(())
    }
}
