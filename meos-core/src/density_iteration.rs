use crate::equation_of_state::EquationVariant;
use crate::errors::{MeosError, MeosResult};
use crate::{log_iter, log_result, SolverOptions, Verbosity};

const MAX_ITER_DENSITY: usize = 100;
const TOL_DENSITY: f64 = 1e-10;

/// Density at given temperature and pressure on a branch of the
/// isotherm on which the pressure increases with density.
///
/// `bracket` encloses the branch (in mol/m³). Newton steps that leave the
/// bracket or run into a mechanically unstable region are replaced by
/// bisection steps.
pub(crate) fn density_iteration(
    eos: &EquationVariant,
    temperature: f64,
    pressure: f64,
    initial_density: f64,
    bracket: (f64, f64),
    options: &SolverOptions,
) -> MeosResult<f64> {
    let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_DENSITY, TOL_DENSITY);
    let watchdog = options.watchdog("density_iteration");
    let (mut lower, mut upper) = bracket;
    if pressure <= 0.0 || initial_density <= 0.0 || lower >= upper {
        return Err(MeosError::InvalidInput(format!(
            "density iteration at p = {pressure} Pa from rho = {initial_density} mol/m³"
        )));
    }
    let max_step = 0.075 * eos.rho_max;
    let mut rho = initial_density.clamp(lower, upper);
    let mut error = f64::INFINITY;

    log_iter!(
        verbosity,
        " iter |    residual    |    density     |    dp/drho    "
    );
    log_iter!(verbosity, "{:-<58}", "");
    for k in 1..=max_iter {
        watchdog.check(k, rho, error)?;
        let (p, dp_drho) = eos.p_dpdrho(temperature, rho);
        error = (p - pressure) / pressure;
        if !error.is_finite() {
            return Err(MeosError::IterationFailed("density_iteration".into()));
        }
        log_iter!(
            verbosity,
            " {:4} | {:14.8e} | {:14.8} | {:14.8e}",
            k,
            error,
            rho,
            dp_drho
        );
        if error.abs() < tol {
            log_result!(
                verbosity,
                "density_iteration: calculation converged in {} step(s)\n",
                k
            );
            return Ok(rho);
        }

        // the pressure increases monotonically on the branch
        if error > 0.0 {
            upper = rho;
        } else {
            lower = rho;
        }

        let mut rho_new = f64::NAN;
        if dp_drho > 0.0 {
            let mut delta_rho = -(p - pressure) / dp_drho;
            if delta_rho.abs() > max_step {
                delta_rho = max_step * delta_rho.signum();
            }
            delta_rho = delta_rho.max(-0.95 * rho);
            rho_new = rho + delta_rho;
        }
        if rho_new.is_nan() || rho_new <= lower || rho_new >= upper {
            rho_new = 0.5 * (lower + upper);
        }
        if (rho_new - rho).abs() <= f64::EPSILON * rho {
            // accept only if the residual is at the resolution of the density
            if (p - pressure).abs() <= 4.0 * f64::EPSILON * rho * dp_drho.abs() {
                log_result!(
                    verbosity,
                    "density_iteration: step size vanished after {} step(s)\n",
                    k
                );
                return Ok(rho);
            }
            return Err(MeosError::NotConverged {
                solver: "density_iteration".into(),
                iterations: k,
                iterate: rho,
                residual: error,
            });
        }
        rho = rho_new;
    }
    Err(MeosError::NotConverged {
        solver: "density_iteration".into(),
        iterations: max_iter,
        iterate: rho,
        residual: error,
    })
}
