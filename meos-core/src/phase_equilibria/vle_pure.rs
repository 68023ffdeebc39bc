use super::{SaturationPoint, SaturationStage, TRIVIAL_REL_DEVIATION};
use crate::density_iteration::density_iteration;
use crate::equation_of_state::EquationVariant;
use crate::errors::{MeosError, MeosResult};
use crate::state::Property;
use crate::{log_iter, log_result, SolverOptions, Verbosity};
use nalgebra::{Matrix2, Vector2};
use num_dual::{second_derivative, Dual2_64};

const MAX_ITER_PURE: usize = 50;
const TOL_PURE: f64 = 1e-10;
const MAX_ITER_DRY: usize = 20;
const TOL_DRY: f64 = 1e-6;
const CRITICAL_REL_DEVIATION: f64 = 1e-9;

/// Reduced pressure `J` and reduced chemical potential `K` of the
/// Akasaka formulation together with their derivatives with respect to δ.
struct ReducedPotentials {
    j: f64,
    k: f64,
    j_delta: f64,
    k_delta: f64,
}

/// # Pure component phase equilibria
impl EquationVariant {
    fn reduced_potentials(&self, tau: f64, delta: f64) -> ReducedPotentials {
        let (phi, phi_d, phi_dd) = second_derivative(|d| self.phi_r(d, Dual2_64::from(tau)), delta);
        ReducedPotentials {
            j: delta * (1.0 + delta * phi_d),
            k: delta * phi_d + phi + delta.ln(),
            j_delta: 1.0 + 2.0 * delta * phi_d + delta * delta * phi_dd,
            k_delta: 2.0 * phi_d + delta * phi_dd + 1.0 / delta,
        }
    }

    /// Saturated liquid and vapor densities (mol/m³) from the ancillary equations.
    pub fn ancillary_densities(&self, temperature: f64) -> (f64, f64) {
        (
            self.rhoc * self.liquid_density.reduced_value(temperature, self.tc),
            self.rhoc * self.vapor_density.reduced_value(temperature, self.tc),
        )
    }

    /// Saturation pressure (Pa) from the ancillary equation.
    pub fn ancillary_vapor_pressure(&self, temperature: f64) -> f64 {
        self.pc * self.vapor_pressure.reduced_value(temperature, self.tc)
    }

    /// Pressure of the equation of state at the critical point.
    pub fn critical_pressure(&self) -> f64 {
        self.p_dpdrho(self.tc, self.rhoc).0
    }

    fn critical_point(&self) -> SaturationPoint {
        SaturationPoint {
            temperature: self.tc,
            pressure: self.critical_pressure(),
            liquid_density: self.rhoc * self.molar_weight,
            vapor_density: self.rhoc * self.molar_weight,
            molar_weight: self.molar_weight,
            pressure_residual: 0.0,
            gibbs_residual: 0.0,
            iterations: 0,
            stage: SaturationStage::Converged,
            surface_tension: self.surface_tension(self.tc),
        }
    }

    /// Move a density seed onto a mechanically stable branch at the
    /// ancillary pressure. The seed is kept if that fails.
    fn dry_search(
        &self,
        temperature: f64,
        pressure: f64,
        density: f64,
        bracket: (f64, f64),
        options: &SolverOptions,
    ) -> f64 {
        let options = SolverOptions {
            max_iter: Some(MAX_ITER_DRY),
            tol: Some(TOL_DRY),
            verbosity: Verbosity::None,
            ..options.clone()
        };
        density_iteration(self, temperature, pressure, density, bracket, &options)
            .ok()
            .filter(|&rho| self.p_dpdrho(temperature, rho).1 > 0.0)
            .unwrap_or(density)
    }

    /// Calculate the vapor-liquid equilibrium at given temperature.
    pub fn saturation_t(&self, temperature: f64, options: &SolverOptions) -> MeosResult<SaturationPoint> {
        self.pure_t(temperature, None, options)
    }

    pub(crate) fn pure_t(
        &self,
        temperature: f64,
        initial_densities: Option<(f64, f64)>,
        options: &SolverOptions,
    ) -> MeosResult<SaturationPoint> {
        if (temperature - self.tc).abs() <= CRITICAL_REL_DEVIATION * self.tc {
            return Ok(self.critical_point());
        }
        if temperature.is_nan() || temperature < self.t_min || temperature > self.tc {
            return Err(MeosError::out_of_range(
                "temperature",
                temperature,
                self.t_min,
                self.tc,
            ));
        }
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_PURE, TOL_PURE);
        let watchdog = options.watchdog("saturation_t");
        let tau = self.tc / temperature;
        let rt = self.gas_constant * temperature;

        let (mut rho_l, mut rho_v) =
            initial_densities.unwrap_or_else(|| self.ancillary_densities(temperature));
        let mut stage = SaturationStage::DryVaporSearch;
        if initial_densities.is_none() {
            let p = self.ancillary_vapor_pressure(temperature);
            rho_v = self.dry_search(temperature, p, rho_v, (0.0, self.rhoc), options);
            log_iter!(verbosity, "{:?}: rho_v = {:.8}", stage, rho_v);
            stage = SaturationStage::DryLiquidSearch;
            rho_l = self.dry_search(temperature, p, rho_l, (self.rhoc, self.rho_max), options);
            log_iter!(verbosity, "{:?}: rho_l = {:.8}", stage, rho_l);
        }
        stage = SaturationStage::SimultaneousRefine;

        let mut delta_l = rho_l / self.rhoc;
        let mut delta_v = rho_v / self.rhoc;
        log_iter!(
            verbosity,
            " iter |    residual    |  liquid density  |  vapor density   | damping"
        );
        log_iter!(verbosity, "{:-<72}", "");
        let mut iterations = 0;
        let mut error = f64::INFINITY;
        for i in 1..=max_iter {
            iterations = i;
            watchdog.check(i, delta_l * self.rhoc, error)?;
            let l = self.reduced_potentials(tau, delta_l);
            let v = self.reduced_potentials(tau, delta_v);
            let residual = Vector2::new(v.j - l.j, v.k - l.k);
            error = (residual[0] / v.j).abs().max(residual[1].abs());
            if !error.is_finite() {
                return Err(MeosError::IterationFailed("saturation_t".into()));
            }
            if error < tol {
                stage = SaturationStage::Converged;
                log_iter!(
                    verbosity,
                    " {:4} | {:14.8e} | {:16.8} | {:16.8} |",
                    i,
                    error,
                    delta_l * self.rhoc,
                    delta_v * self.rhoc
                );
                break;
            }

            let jacobian = Matrix2::new(l.j_delta, -v.j_delta, l.k_delta, -v.k_delta);
            let step = jacobian
                .lu()
                .solve(&residual)
                .ok_or_else(|| MeosError::IterationFailed("saturation_t".into()))?;

            // keep both densities positive and the liquid denser than the vapor
            let mut damping = 1.0;
            while damping > 1e-4 {
                let (dl, dv) = (delta_l + damping * step[0], delta_v + damping * step[1]);
                if dv > 0.0 && dl > dv {
                    break;
                }
                damping *= 0.5;
            }
            delta_l += damping * step[0];
            delta_v += damping * step[1];
            log_iter!(
                verbosity,
                " {:4} | {:14.8e} | {:16.8} | {:16.8} | {}",
                i,
                error,
                delta_l * self.rhoc,
                delta_v * self.rhoc,
                damping
            );

            if (delta_l - delta_v).abs() / delta_v < TRIVIAL_REL_DEVIATION {
                return Err(MeosError::TrivialSolution);
            }
            if (step[0] / delta_l).abs().max((step[1] / delta_v).abs()) < 1e-14 {
                stage = SaturationStage::Converged;
                break;
            }
        }
        if stage != SaturationStage::Converged {
            log_result!(
                verbosity,
                "saturation_t: {:?} after {} step(s)\n",
                SaturationStage::Failed,
                iterations
            );
            return Err(MeosError::NotConverged {
                solver: "saturation_t".into(),
                iterations,
                iterate: delta_l * self.rhoc,
                residual: error,
            });
        }
        log_result!(
            verbosity,
            "saturation_t: calculation converged in {} step(s)\n",
            iterations
        );

        let (rho_l, rho_v) = (delta_l * self.rhoc, delta_v * self.rhoc);
        let (p_l, _) = self.p_dpdrho(temperature, rho_l);
        let (p_v, _) = self.p_dpdrho(temperature, rho_v);
        let dk = self.reduced_chemical_potential(temperature, rho_l)
            - self.reduced_chemical_potential(temperature, rho_v);
        Ok(SaturationPoint {
            temperature,
            pressure: p_v,
            liquid_density: rho_l * self.molar_weight,
            vapor_density: rho_v * self.molar_weight,
            molar_weight: self.molar_weight,
            pressure_residual: (p_l - p_v).abs(),
            gibbs_residual: (rt * dk).abs() / self.molar_weight,
            iterations,
            stage,
            surface_tension: self.surface_tension(temperature),
        })
    }

    /// Temperature at which the ancillary vapor pressure equals `pressure`.
    fn ancillary_saturation_temperature(&self, pressure: f64) -> f64 {
        let ln_p = pressure.ln();
        let (mut t_low, mut t_high) = (self.t_min, self.tc);
        for _ in 0..60 {
            let t = 0.5 * (t_low + t_high);
            if self.ancillary_vapor_pressure(t).ln() > ln_p {
                t_high = t;
            } else {
                t_low = t;
            }
        }
        0.5 * (t_low + t_high)
    }

    /// Calculate the vapor-liquid equilibrium at given pressure.
    pub fn saturation_p(&self, pressure: f64, options: &SolverOptions) -> MeosResult<SaturationPoint> {
        let p_crit = self.critical_pressure();
        if (pressure - p_crit).abs() <= CRITICAL_REL_DEVIATION * p_crit {
            return Ok(self.critical_point());
        }
        if pressure.is_nan() || pressure <= 0.0 || pressure > p_crit {
            return Err(MeosError::out_of_range("pressure", pressure, 0.0, p_crit));
        }
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_PURE, TOL_PURE);
        let watchdog = options.watchdog("saturation_p");
        let inner = options.quiet();

        let mut temperature = self.ancillary_saturation_temperature(pressure);
        let mut densities = None;
        log_iter!(
            verbosity,
            " iter |    residual    |   temperature   |  liquid density  |  vapor density  "
        );
        log_iter!(verbosity, "{:-<80}", "");
        let mut error = f64::INFINITY;
        for i in 1..=max_iter {
            watchdog.check(i, temperature, error)?;
            let sat = self.pure_t(temperature, densities, &inner)?;
            let (rho_l, rho_v) = (sat.liquid_molar_density(), sat.vapor_molar_density());
            densities = Some((rho_l, rho_v));
            error = (sat.pressure / pressure).ln();
            log_iter!(
                verbosity,
                " {:4} | {:14.8e} | {:15.8} | {:16.8} | {:16.8}",
                i,
                error,
                temperature,
                rho_l,
                rho_v
            );
            if error.abs() < tol {
                log_result!(
                    verbosity,
                    "saturation_p: calculation converged in {} step(s)\n",
                    i
                );
                return Ok(SaturationPoint {
                    iterations: i,
                    ..sat
                });
            }

            // Clausius-Clapeyron
            let h_l = self.partial_derivatives(Property::Enthalpy, temperature, rho_l).value;
            let h_v = self.partial_derivatives(Property::Enthalpy, temperature, rho_v).value;
            let dlnp_dt = (h_v - h_l) / (temperature * (1.0 / rho_v - 1.0 / rho_l) * sat.pressure);
            let t_new = (temperature - error / dlnp_dt)
                .clamp(self.t_min, self.tc * (1.0 - 10.0 * CRITICAL_REL_DEVIATION));
            if !t_new.is_finite() {
                return Err(MeosError::IterationFailed("saturation_p".into()));
            }
            if (t_new - temperature).abs() < 1e-13 * temperature {
                return Ok(SaturationPoint {
                    iterations: i,
                    ..sat
                });
            }
            temperature = t_new;
        }
        Err(MeosError::NotConverged {
            solver: "saturation_p".into(),
            iterations: max_iter,
            iterate: temperature,
            residual: error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation_of_state::tests::r227ea;
    use approx::assert_relative_eq;

    #[test]
    fn phase_equilibrium_conditions() -> MeosResult<()> {
        let eos = r227ea();
        let options = SolverOptions::default().verbosity(Verbosity::Iter);
        for t in [200.0, 280.0, 340.0, 370.0] {
            let sat = eos.saturation_t(t, &options)?;
            assert_eq!(sat.stage, SaturationStage::Converged);
            assert!(sat.liquid_density > sat.vapor_density);
            assert!(sat.pressure_residual < 1e-6 * sat.pressure);
            assert!(sat.gibbs_residual < 1e-6);
            let (p_anc, (rho_l_anc, _)) = (eos.ancillary_vapor_pressure(t), eos.ancillary_densities(t));
            assert_relative_eq!(sat.pressure, p_anc, max_relative = 1e-2);
            assert_relative_eq!(sat.liquid_molar_density(), rho_l_anc, max_relative = 1e-2);
        }
        Ok(())
    }

    #[test]
    fn critical_and_out_of_range() -> MeosResult<()> {
        let eos = r227ea();
        let options = SolverOptions::default();
        let crit = eos.saturation_t(eos.tc, &options)?;
        assert_eq!(crit.liquid_density, crit.vapor_density);
        assert_relative_eq!(crit.liquid_molar_density(), eos.rhoc, max_relative = 1e-14);
        for t in [100.0, 380.0] {
            assert!(matches!(
                eos.saturation_t(t, &options),
                Err(MeosError::OutOfRange { .. })
            ));
        }
        assert!(matches!(
            eos.saturation_p(-1.0, &options),
            Err(MeosError::OutOfRange { .. })
        ));
        Ok(())
    }

    #[test]
    fn saturation_pressure_inverts_saturation_temperature() -> MeosResult<()> {
        let eos = r227ea();
        let options = SolverOptions::default();
        let sat_t = eos.saturation_t(310.0, &options)?;
        let sat_p = eos.saturation_p(sat_t.pressure, &options.clone().verbosity(Verbosity::Iter))?;
        assert_relative_eq!(sat_p.temperature, 310.0, max_relative = 1e-9);
        assert_relative_eq!(sat_p.liquid_density, sat_t.liquid_density, max_relative = 1e-8);
        assert_relative_eq!(sat_p.vapor_density, sat_t.vapor_density, max_relative = 1e-7);
        Ok(())
    }

    #[test]
    fn cancellation() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;
        let eos = r227ea();
        let options = SolverOptions::default().cancel(Arc::new(AtomicBool::new(true)));
        assert!(matches!(
            eos.saturation_t(300.0, &options),
            Err(MeosError::Cancelled(_))
        ));
    }
}
