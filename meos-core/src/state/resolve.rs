use super::{Property, PropertyBundle, StateSpec};
use crate::density_iteration::density_iteration;
use crate::equation_of_state::EquationVariant;
use crate::errors::{MeosError, MeosResult};
use crate::phase_equilibria::SaturationPoint;
use crate::{log_iter, log_result, SolverOptions, Verbosity};
use nalgebra::{Matrix2, Vector2};

const MAX_ITER_RESOLVE: usize = 100;
const TOL_RESOLVE: f64 = 1e-10;
/// A T&P state closer than this (relative) to the vapor pressure is saturated.
const SATURATION_REL_DEVIATION: f64 = 1e-8;
/// Lower end of the reduced density bracket on the vapor side.
const LOW_DENSITY: f64 = 1e-10;
const BRACKET_SCAN_POINTS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Branch {
    Liquid,
    Vapor,
}

enum TpDensity {
    Homogeneous(f64),
    Saturated(SaturationPoint),
}

/// Molar value of a property that an iteration drives to, with the scale
/// that makes its residual dimensionless.
#[derive(Clone, Copy, Debug)]
struct Target {
    property: Property,
    value: f64,
    scale: f64,
}

impl Target {
    fn new(eos: &EquationVariant, property: Property, value: f64) -> Self {
        let mw = eos.molar_weight;
        let (value, scale) = match property {
            Property::Pressure => (value, value.abs()),
            Property::Density => (value / mw, eos.rhoc),
            Property::Entropy => (value * mw, eos.gas_constant),
            Property::Enthalpy | Property::InternalEnergy => {
                (value * mw, eos.gas_constant * eos.tc)
            }
            Property::Temperature => (value, eos.tc),
            Property::Quality => (value, 1.0),
        };
        Self {
            property,
            value,
            scale,
        }
    }

    fn residual(&self, value: f64) -> f64 {
        (value - self.value) / self.scale
    }

    /// Convert a molar value back into the units of the specification.
    fn specific(&self, eos: &EquationVariant, value: f64) -> f64 {
        match self.property {
            Property::Density => value * eos.molar_weight,
            Property::Entropy | Property::Enthalpy | Property::InternalEnergy => {
                value / eos.molar_weight
            }
            _ => value,
        }
    }
}

/// # State resolution
impl EquationVariant {
    /// Properties of the state given by two independent variables.
    ///
    /// States inside the two-phase region are returned as a mixture of the
    /// saturated phases with the vapor mass fraction from the lever rule.
    /// Temperature and pressure alone do not determine the quality of a
    /// saturated state: at the vapor pressure the saturated liquid is
    /// returned, use [StateSpec::TemperatureQuality] for other states on
    /// the phase boundary.
    pub fn resolve(&self, spec: StateSpec, options: &SolverOptions) -> MeosResult<PropertyBundle> {
        match spec {
            StateSpec::TemperatureDensity {
                temperature,
                density,
            } => self.resolve_t_rho(temperature, density, options),
            StateSpec::TemperaturePressure {
                temperature,
                pressure,
            } => self.resolve_t_p(temperature, pressure, options),
            StateSpec::TemperatureQuality {
                temperature,
                quality,
            } => {
                check_quality(quality)?;
                let sat = self.saturation_t(temperature, options)?;
                self.two_phase(&sat, quality)
            }
            StateSpec::PressureQuality { pressure, quality } => {
                check_quality(quality)?;
                let sat = self.saturation_p(pressure, options)?;
                self.two_phase(&sat, quality)
            }
            StateSpec::Temperature {
                temperature,
                property,
                value,
            } => self.resolve_t_y(temperature, property, value, options),
            StateSpec::Pressure {
                pressure,
                property: Property::Density,
                value,
            } => self.resolve_p_rho(pressure, value, options),
            StateSpec::Pressure {
                pressure,
                property,
                value,
            } => self.resolve_p_y(pressure, property, value, options),
        }
    }

    fn check_temperature(&self, temperature: f64) -> MeosResult<()> {
        if (self.t_min..=self.t_max).contains(&temperature) {
            Ok(())
        } else {
            Err(MeosError::out_of_range(
                "temperature",
                temperature,
                self.t_min,
                self.t_max,
            ))
        }
    }

    fn check_pressure(&self, pressure: f64) -> MeosResult<()> {
        if pressure > 0.0 && pressure <= self.p_max {
            Ok(())
        } else {
            Err(MeosError::out_of_range("pressure", pressure, 0.0, self.p_max))
        }
    }

    /// Properties of a homogeneous state within the range of the equation.
    fn homogeneous(&self, temperature: f64, density: f64) -> MeosResult<PropertyBundle> {
        let state = self.properties(temperature, density)?;
        if state.pressure > self.p_max {
            return Err(MeosError::out_of_range(
                "pressure",
                state.pressure,
                0.0,
                self.p_max,
            ));
        }
        Ok(state)
    }

    fn resolve_t_rho(
        &self,
        temperature: f64,
        density: f64,
        options: &SolverOptions,
    ) -> MeosResult<PropertyBundle> {
        self.check_temperature(temperature)?;
        let rho = density / self.molar_weight;
        if !(0.0..=self.rho_max).contains(&rho) {
            return Err(MeosError::out_of_range(
                "density",
                density,
                0.0,
                self.rho_max * self.molar_weight,
            ));
        }
        if temperature < self.tc {
            match self.saturation_t(temperature, options) {
                Ok(sat) => {
                    let (rho_l, rho_v) = (sat.liquid_molar_density(), sat.vapor_molar_density());
                    if rho > rho_v && rho < rho_l {
                        let quality = (1.0 / rho - 1.0 / rho_l) / (1.0 / rho_v - 1.0 / rho_l);
                        return self.two_phase(&sat, quality);
                    }
                }
                Err(MeosError::Cancelled(solver)) => return Err(MeosError::Cancelled(solver)),
                Err(e) => {
                    // states clearly outside of the dome do not need the saturation point
                    let (rho_l, rho_v) = self.ancillary_densities(temperature);
                    if rho > 0.5 * rho_v && rho < 1.02 * rho_l {
                        return Err(e);
                    }
                    log_result!(
                        options.verbosity,
                        "resolve_t: {}, evaluate the homogeneous state\n",
                        e
                    );
                }
            }
        }
        self.homogeneous(temperature, rho)
    }

    fn resolve_t_p(
        &self,
        temperature: f64,
        pressure: f64,
        options: &SolverOptions,
    ) -> MeosResult<PropertyBundle> {
        self.check_temperature(temperature)?;
        self.check_pressure(pressure)?;
        match self.tp_density(temperature, pressure, options)? {
            TpDensity::Homogeneous(rho) => self.homogeneous(temperature, rho),
            TpDensity::Saturated(sat) => self.two_phase(&sat, 0.0),
        }
    }

    /// Density (mol/m³) on the liquid or vapor branch of an isotherm.
    /// Above the critical temperature the branch is irrelevant.
    fn branch_density(
        &self,
        temperature: f64,
        pressure: f64,
        branch: Branch,
        sat: Option<&SaturationPoint>,
        options: &SolverOptions,
    ) -> MeosResult<f64> {
        let ideal = pressure / (self.gas_constant * temperature);
        if temperature >= self.tc {
            self.check_density_limit(temperature, pressure)?;
            let bracket = (0.0, self.rho_max);
            return density_iteration(self, temperature, pressure, ideal.min(self.rho_max), bracket, options);
        }
        let sat = match sat {
            Some(sat) => *sat,
            None => self.saturation_t(temperature, &options.quiet())?,
        };
        let (rho_l, rho_v) = (sat.liquid_molar_density(), sat.vapor_molar_density());
        match branch {
            Branch::Liquid => {
                self.check_density_limit(temperature, pressure)?;
                density_iteration(self, temperature, pressure, rho_l, (rho_l, self.rho_max), options)
            }
            Branch::Vapor => {
                density_iteration(self, temperature, pressure, ideal.min(rho_v), (0.0, rho_v), options)
            }
        }
    }

    /// The state at `T` and `P` has to be reachable with `ρ ≤ ρ_max`.
    fn check_density_limit(&self, temperature: f64, pressure: f64) -> MeosResult<()> {
        let (p_limit, _) = self.p_dpdrho(temperature, self.rho_max);
        if p_limit < pressure * (1.0 - TOL_RESOLVE) {
            return Err(MeosError::out_of_range("pressure", pressure, 0.0, p_limit));
        }
        Ok(())
    }

    /// Lowest temperature at which `pressure` is reached with `ρ ≤ ρ_max`.
    fn density_limit_temperature(&self, pressure: f64, options: &SolverOptions) -> MeosResult<f64> {
        let (p_low, _) = self.p_dpdrho(self.t_min, self.rho_max);
        if p_low >= pressure {
            return Ok(self.t_min);
        }
        let target = Target::new(self, Property::Pressure, pressure);
        let bracket = (self.t_min, self.t_max);
        let t = self.bracketed_newton("density_limit", target, bracket, self.t_min, options, |t| {
            let p = self.partial_derivatives(Property::Pressure, t, self.rho_max);
            Ok((p.value, p.d_dt))
        })?;
        Ok((t * (1.0 + 1e-9)).min(self.t_max))
    }

    fn tp_density(
        &self,
        temperature: f64,
        pressure: f64,
        options: &SolverOptions,
    ) -> MeosResult<TpDensity> {
        if temperature >= self.tc {
            let rho = self.branch_density(temperature, pressure, Branch::Vapor, None, options)?;
            return Ok(TpDensity::Homogeneous(rho));
        }
        let sat = self.saturation_t(temperature, &options.quiet())?;
        if (pressure - sat.pressure).abs() <= SATURATION_REL_DEVIATION * sat.pressure {
            return Ok(TpDensity::Saturated(sat));
        }
        let branch = if pressure > sat.pressure {
            Branch::Liquid
        } else {
            Branch::Vapor
        };
        let rho = self.branch_density(temperature, pressure, branch, Some(&sat), options)?;
        Ok(TpDensity::Homogeneous(rho))
    }

    /// Molar density of the stable phase at given temperature and pressure.
    /// At the vapor pressure the saturated liquid is returned.
    pub(crate) fn density_tp(
        &self,
        temperature: f64,
        pressure: f64,
        options: &SolverOptions,
    ) -> MeosResult<f64> {
        Ok(match self.tp_density(temperature, pressure, options)? {
            TpDensity::Homogeneous(rho) => rho,
            TpDensity::Saturated(sat) => sat.liquid_molar_density(),
        })
    }

    fn resolve_t_y(
        &self,
        temperature: f64,
        property: Property,
        value: f64,
        options: &SolverOptions,
    ) -> MeosResult<PropertyBundle> {
        self.check_temperature(temperature)?;
        let target = Target::new(self, property, value);
        let low = LOW_DENSITY * self.rhoc;
        let (bracket, initial) = if temperature < self.tc {
            let sat = self.saturation_t(temperature, &options.quiet())?;
            let (rho_l, rho_v) = (sat.liquid_molar_density(), sat.vapor_molar_density());
            let y_l = self.partial_derivatives(property, temperature, rho_l).value;
            let y_v = self.partial_derivatives(property, temperature, rho_v).value;
            let quality = (target.value - y_l) / (y_v - y_l);
            if (0.0..=1.0).contains(&quality) {
                return self.two_phase(&sat, quality);
            }
            if quality > 1.0 {
                ((low, rho_v), rho_v)
            } else {
                ((rho_l, self.rho_max), rho_l)
            }
        } else {
            ((low, self.rho_max), self.rhoc)
        };
        let rho = self.bracketed_newton("resolve_t", target, bracket, initial, options, |rho| {
            let y = self.partial_derivatives(property, temperature, rho);
            Ok((y.value, y.d_drho))
        })?;
        self.homogeneous(temperature, rho)
    }

    fn resolve_p_rho(
        &self,
        pressure: f64,
        density: f64,
        options: &SolverOptions,
    ) -> MeosResult<PropertyBundle> {
        self.check_pressure(pressure)?;
        let rho = density / self.molar_weight;
        if rho <= 0.0 || rho > self.rho_max {
            return Err(MeosError::out_of_range(
                "density",
                density,
                0.0,
                self.rho_max * self.molar_weight,
            ));
        }
        let bracket = if pressure < self.critical_pressure() {
            let sat = self.saturation_p(pressure, &options.quiet())?;
            let (rho_l, rho_v) = (sat.liquid_molar_density(), sat.vapor_molar_density());
            if rho > rho_v && rho < rho_l {
                let quality = (1.0 / rho - 1.0 / rho_l) / (1.0 / rho_v - 1.0 / rho_l);
                return self.two_phase(&sat, quality);
            }
            if rho >= rho_l {
                (self.t_min, sat.temperature)
            } else {
                (sat.temperature, self.t_max)
            }
        } else {
            (self.t_min, self.t_max)
        };
        let target = Target::new(self, Property::Pressure, pressure);
        let initial = 0.5 * (bracket.0 + bracket.1);
        let temperature = self.bracketed_newton("resolve_p", target, bracket, initial, options, |t| {
            let p = self.partial_derivatives(Property::Pressure, t, rho);
            Ok((p.value, p.d_dt))
        })?;
        self.homogeneous(temperature, rho)
    }

    fn resolve_p_y(
        &self,
        pressure: f64,
        property: Property,
        value: f64,
        options: &SolverOptions,
    ) -> MeosResult<PropertyBundle> {
        self.check_pressure(pressure)?;
        let target = Target::new(self, property, value);
        let quiet = options.quiet();
        if pressure >= self.critical_pressure() {
            let bracket = (self.t_min, self.t_max);
            let (t, rho) = self.isobar_search(pressure, target, bracket, None, options)?;
            return self.homogeneous(t, rho);
        }

        let sat = self.saturation_p(pressure, &quiet)?;
        let t_sat = sat.temperature;
        let (rho_l, rho_v) = (sat.liquid_molar_density(), sat.vapor_molar_density());
        let y_l = self.partial_derivatives(property, t_sat, rho_l).value;
        let y_v = self.partial_derivatives(property, t_sat, rho_v).value;
        let quality = (target.value - y_l) / (y_v - y_l);
        if (0.0..=1.0).contains(&quality) {
            return self.two_phase(&sat, quality);
        }
        let (branch, bracket, rho_sat) = if quality > 1.0 {
            (Branch::Vapor, (t_sat, self.t_max), rho_v)
        } else {
            (Branch::Liquid, (self.t_min, t_sat), rho_l)
        };

        // initial temperature from the slope of the isobar at the phase boundary
        let y = self.partial_derivatives(property, t_sat, rho_sat);
        let p = self.partial_derivatives(Property::Pressure, t_sat, rho_sat);
        let slope = y.d_dt - y.d_drho * p.d_dt / p.d_drho;
        let mut t0 = t_sat + (target.value - y.value) / slope;
        if !t0.is_finite() {
            t0 = 0.5 * (bracket.0 + bracket.1);
        }
        let t0 = t0.clamp(bracket.0, bracket.1);
        let rho0 = self
            .branch_density(t0, pressure, branch, None, &quiet)
            .unwrap_or(rho_sat);

        match self.newton_isobar(pressure, target, bracket, (t0, rho0), options) {
            Ok((t, rho)) => self.homogeneous(t, rho),
            Err(MeosError::Cancelled(solver)) => Err(MeosError::Cancelled(solver)),
            Err(e) => {
                log_result!(
                    options.verbosity,
                    "resolve_p: {}, continue with bisection in temperature\n",
                    e
                );
                let (t, rho) = self.isobar_search(pressure, target, bracket, Some(branch), options)?;
                self.homogeneous(t, rho)
            }
        }
    }

    /// Simultaneous Newton iteration in temperature and density for a
    /// state at given pressure and given value of a second property.
    fn newton_isobar(
        &self,
        pressure: f64,
        target: Target,
        bracket: (f64, f64),
        initial: (f64, f64),
        options: &SolverOptions,
    ) -> MeosResult<(f64, f64)> {
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_RESOLVE, TOL_RESOLVE);
        let watchdog = options.watchdog("resolve_p");
        let (mut t, mut rho) = initial;
        let mut error = f64::INFINITY;

        log_iter!(
            verbosity,
            " iter |    residual    |   temperature   |     density     | damping"
        );
        log_iter!(verbosity, "{:-<72}", "");
        for i in 1..=max_iter {
            watchdog.check(i, t, error)?;
            let p = self.partial_derivatives(Property::Pressure, t, rho);
            let y = self.partial_derivatives(target.property, t, rho);
            let residual = Vector2::new((p.value - pressure) / pressure, target.residual(y.value));
            error = residual.norm();
            if !error.is_finite() {
                return Err(MeosError::IterationFailed("resolve_p".into()));
            }
            if error < tol {
                log_iter!(verbosity, " {:4} | {:14.8e} | {:15.8} | {:15.8} |", i, error, t, rho);
                log_result!(
                    verbosity,
                    "resolve_p: calculation converged in {} step(s)\n",
                    i
                );
                return Ok((t, rho));
            }

            let jacobian = Matrix2::new(
                p.d_dt / pressure,
                p.d_drho / pressure,
                y.d_dt / target.scale,
                y.d_drho / target.scale,
            );
            let step = jacobian
                .lu()
                .solve(&(-residual))
                .ok_or_else(|| MeosError::IterationFailed("resolve_p".into()))?;

            // at most 10 % change of the temperature, stay stable and in range
            let mut damping = (0.1 * t / step[0].abs()).min(1.0);
            loop {
                let (t_new, rho_new) = (t + damping * step[0], rho + damping * step[1]);
                if t_new >= bracket.0
                    && t_new <= bracket.1
                    && rho_new > 0.0
                    && rho_new <= self.rho_max
                    && self.p_dpdrho(t_new, rho_new).1 > 0.0
                {
                    t = t_new;
                    rho = rho_new;
                    break;
                }
                damping *= 0.5;
                if damping < 1e-6 {
                    return Err(MeosError::IterationFailed("resolve_p".into()));
                }
            }
            log_iter!(
                verbosity,
                " {:4} | {:14.8e} | {:15.8} | {:15.8} | {}",
                i,
                error,
                t,
                rho,
                damping
            );
        }
        Err(MeosError::NotConverged {
            solver: "resolve_p".into(),
            iterations: max_iter,
            iterate: t,
            residual: error,
        })
    }

    /// Search the temperature along an isobar, resolving the density at
    /// every temperature.
    fn isobar_search(
        &self,
        pressure: f64,
        target: Target,
        bracket: (f64, f64),
        branch: Option<Branch>,
        options: &SolverOptions,
    ) -> MeosResult<(f64, f64)> {
        let quiet = options.quiet();
        let bracket = if branch == Some(Branch::Vapor) {
            bracket
        } else {
            let t_limit = self.density_limit_temperature(pressure, &quiet)?;
            if t_limit >= bracket.1 {
                return Err(MeosError::out_of_range("temperature", t_limit, bracket.0, bracket.1));
            }
            (bracket.0.max(t_limit), bracket.1)
        };
        let density = |t: f64| match branch {
            Some(branch) => self.branch_density(t, pressure, branch, None, &quiet),
            None => self.density_tp(t, pressure, &quiet),
        };
        let initial = 0.5 * (bracket.0 + bracket.1);
        let temperature = self.bracketed_newton("isobar_search", target, bracket, initial, options, |t| {
            let rho = density(t)?;
            let y = self.partial_derivatives(target.property, t, rho);
            let p = self.partial_derivatives(Property::Pressure, t, rho);
            Ok((y.value, y.d_dt - y.d_drho * p.d_dt / p.d_drho))
        })?;
        Ok((temperature, density(temperature)?))
    }

    /// Newton iteration for `f(x) = target` safeguarded by bisection.
    /// `f` returns the value and its derivative; the root has to be
    /// enclosed by `bracket`.
    fn bracketed_newton<F>(
        &self,
        solver: &'static str,
        target: Target,
        bracket: (f64, f64),
        initial: f64,
        options: &SolverOptions,
        mut f: F,
    ) -> MeosResult<f64>
    where
        F: FnMut(f64) -> MeosResult<(f64, f64)>,
    {
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_RESOLVE, TOL_RESOLVE);
        let watchdog = options.watchdog(solver);
        let (y_lower, _) = f(bracket.0)?;
        let (y_upper, _) = f(bracket.1)?;
        let (r_lower, r_upper) = (target.residual(y_lower), target.residual(y_upper));
        if r_lower.abs() < tol {
            return Ok(bracket.0);
        }
        if r_upper.abs() < tol {
            return Ok(bracket.1);
        }
        let (mut lower, mut upper, r_lower) = if r_lower * r_upper < 0.0 {
            (bracket.0, bracket.1, r_lower)
        } else {
            // the function is not monotonic on the bracket, use the first sign change
            let xs = (0..=BRACKET_SCAN_POINTS).map(|k| {
                let s = k as f64 / BRACKET_SCAN_POINTS as f64;
                if bracket.0 > 0.0 {
                    bracket.0 * (bracket.1 / bracket.0).powf(s)
                } else {
                    bracket.0 + s * (bracket.1 - bracket.0)
                }
            });
            let (mut x_prev, mut y_prev) = (bracket.0, y_lower);
            let (mut y_min, mut y_max) = (y_lower.min(y_upper), y_lower.max(y_upper));
            let mut found = None;
            for x in xs.skip(1) {
                let (y, _) = f(x)?;
                y_min = y_min.min(y);
                y_max = y_max.max(y);
                if target.residual(y) * target.residual(y_prev) < 0.0 {
                    found = Some((x_prev, x, target.residual(y_prev)));
                    break;
                }
                (x_prev, y_prev) = (x, y);
            }
            match found {
                Some(b) => b,
                None => {
                    let (a, b) = (target.specific(self, y_min), target.specific(self, y_max));
                    return Err(MeosError::out_of_range(
                        &target.property.to_string(),
                        target.specific(self, target.value),
                        a.min(b),
                        a.max(b),
                    ));
                }
            }
        };
        let sign_lower = r_lower.signum();

        let mut x = if initial > lower && initial < upper {
            initial
        } else {
            0.5 * (lower + upper)
        };
        let mut error = f64::INFINITY;
        log_iter!(verbosity, " iter |    residual    |     iterate     ");
        log_iter!(verbosity, "{:-<42}", "");
        for i in 1..=max_iter {
            watchdog.check(i, x, error)?;
            let (y, dy) = f(x)?;
            error = target.residual(y);
            if !error.is_finite() {
                return Err(MeosError::IterationFailed(solver.into()));
            }
            log_iter!(verbosity, " {:4} | {:14.8e} | {:15.8}", i, error, x);
            if error.abs() < tol {
                log_result!(
                    verbosity,
                    "{}: calculation converged in {} step(s)\n",
                    solver,
                    i
                );
                return Ok(x);
            }
            if error.signum() == sign_lower {
                lower = x;
            } else {
                upper = x;
            }
            let mut x_new = x - error * target.scale / dy;
            if x_new.is_nan() || x_new <= lower || x_new >= upper {
                x_new = 0.5 * (lower + upper);
            }
            if (x_new - x).abs() <= f64::EPSILON * x.abs() {
                log_result!(
                    verbosity,
                    "{}: step size vanished after {} step(s)\n",
                    solver,
                    i
                );
                return Ok(x_new);
            }
            x = x_new;
        }
        Err(MeosError::NotConverged {
            solver: solver.into(),
            iterations: max_iter,
            iterate: x,
            residual: error,
        })
    }
}

fn check_quality(quality: f64) -> MeosResult<()> {
    if (0.0..=1.0).contains(&quality) {
        Ok(())
    } else {
        Err(MeosError::out_of_range("quality", quality, 0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation_of_state::tests::r227ea;
    use crate::state::Phase;
    use approx::assert_relative_eq;

    fn assert_same_state(a: &PropertyBundle, b: &PropertyBundle) {
        assert_relative_eq!(a.temperature, b.temperature, max_relative = 1e-7);
        assert_relative_eq!(a.density, b.density, max_relative = 1e-7);
        assert_relative_eq!(a.pressure, b.pressure, max_relative = 1e-6);
    }

    #[test]
    fn round_trips() -> MeosResult<()> {
        let eos = r227ea();
        let options = SolverOptions::default();
        // compressed liquid, superheated vapor, supercritical
        for (t, p) in [(300.0, 5e6), (350.0, 5e5), (420.0, 1e7), (250.0, 5e4)] {
            let reference = eos.resolve(
                StateSpec::TemperaturePressure {
                    temperature: t,
                    pressure: p,
                },
                &options,
            )?;
            assert!(matches!(reference.phase, Phase::SinglePhase | Phase::Supercritical));
            for (a, b) in [
                ((Property::Pressure, p), (Property::Enthalpy, reference.enthalpy)),
                ((Property::Pressure, p), (Property::Entropy, reference.entropy)),
                ((Property::Pressure, p), (Property::InternalEnergy, reference.internal_energy)),
                ((Property::Pressure, p), (Property::Density, reference.density)),
                ((Property::Temperature, t), (Property::Entropy, reference.entropy)),
                ((Property::Temperature, t), (Property::Enthalpy, reference.enthalpy)),
                ((Property::Temperature, t), (Property::InternalEnergy, reference.internal_energy)),
                ((Property::Temperature, t), (Property::Density, reference.density)),
            ] {
                let state = eos.resolve(StateSpec::new(a, b)?, &options)?;
                assert_same_state(&state, &reference);
            }
        }
        Ok(())
    }

    #[test]
    fn two_phase_lever_rule() -> MeosResult<()> {
        let eos = r227ea();
        let options = SolverOptions::default();
        let wet = eos.resolve(
            StateSpec::TemperatureQuality {
                temperature: 300.0,
                quality: 0.3,
            },
            &options,
        )?;
        let sat = wet.saturation.ok_or(MeosError::IterationFailed("test".into()))?;
        let [liquid, vapor] = eos.saturated_states(&sat)?;
        assert_relative_eq!(wet.enthalpy, 0.7 * liquid.enthalpy + 0.3 * vapor.enthalpy, max_relative = 1e-12);
        assert_relative_eq!(
            1.0 / wet.density,
            0.7 / liquid.density + 0.3 / vapor.density,
            max_relative = 1e-12
        );
        assert_eq!(wet.cp, None);

        for (a, b) in [
            ((Property::Pressure, sat.pressure), (Property::Enthalpy, wet.enthalpy)),
            ((Property::Pressure, sat.pressure), (Property::Entropy, wet.entropy)),
            ((Property::Temperature, 300.0), (Property::Density, wet.density)),
            ((Property::Temperature, 300.0), (Property::InternalEnergy, wet.internal_energy)),
        ] {
            let state = eos.resolve(StateSpec::new(a, b)?, &options)?;
            match state.phase {
                Phase::TwoPhase { quality } => assert_relative_eq!(quality, 0.3, max_relative = 1e-6),
                phase => panic!("expected a two-phase state, got {phase:?}"),
            }
        }
        Ok(())
    }

    #[test]
    fn saturated_pressure_is_liquid() -> MeosResult<()> {
        let eos = r227ea();
        let options = SolverOptions::default();
        let sat = eos.saturation_t(280.0, &options)?;
        let state = eos.resolve(
            StateSpec::TemperaturePressure {
                temperature: 280.0,
                pressure: sat.pressure,
            },
            &options,
        )?;
        assert_eq!(state.phase, Phase::SaturatedLiquid);
        assert_relative_eq!(state.density, sat.liquid_density, max_relative = 1e-12);
        assert_eq!(state.saturation, Some(sat));
        Ok(())
    }

    #[test]
    fn out_of_range_inputs() {
        let eos = r227ea();
        let options = SolverOptions::default();
        for spec in [
            StateSpec::TemperaturePressure {
                temperature: 100.0,
                pressure: 1e5,
            },
            StateSpec::TemperaturePressure {
                temperature: 300.0,
                pressure: 1e9,
            },
            StateSpec::TemperatureDensity {
                temperature: 300.0,
                density: 1e5,
            },
            StateSpec::TemperatureDensity {
                temperature: 480.0,
                density: 100.0,
            },
            StateSpec::TemperaturePressure {
                temperature: 480.0,
                pressure: 1e5,
            },
            StateSpec::TemperatureQuality {
                temperature: 400.0,
                quality: 0.5,
            },
            StateSpec::Pressure {
                pressure: 1e5,
                property: Property::Enthalpy,
                value: 1e9,
            },
        ] {
            let res = eos.resolve(spec, &options);
            assert!(matches!(res, Err(MeosError::OutOfRange { .. })), "{spec:?}: {res:?}");
        }
    }

    #[test]
    fn pressure_beyond_maximum_density() {
        let eos = r227ea();
        let options = SolverOptions::default();
        let (p_limit, _) = eos.p_dpdrho(150.0, eos.rho_max);
        let pressure = 0.5 * (p_limit.max(1e5) + eos.p_max);
        let res = eos.resolve(
            StateSpec::TemperaturePressure {
                temperature: 150.0,
                pressure,
            },
            &options,
        );
        assert!(matches!(res, Err(MeosError::OutOfRange { .. })), "{res:?}");
    }

    #[test]
    fn single_phase_density_without_saturation() -> MeosResult<()> {
        let eos = r227ea();
        // too few iterations for the saturation solver
        let options = SolverOptions::default().max_iter(1);
        for (t, density) in [(300.0, 10.0), (300.0, 1500.0)] {
            let state = eos.resolve(
                StateSpec::TemperatureDensity {
                    temperature: t,
                    density,
                },
                &options,
            )?;
            assert_eq!(state.phase, Phase::SinglePhase);
            assert_relative_eq!(state.density, density, max_relative = 1e-14);
        }
        let res = eos.resolve(
            StateSpec::TemperatureDensity {
                temperature: 300.0,
                density: 500.0,
            },
            &options,
        );
        assert!(matches!(res, Err(MeosError::NotConverged { .. })), "{res:?}");
        Ok(())
    }
}
