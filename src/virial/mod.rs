//! Truncated virial equation of state for pure gases and gas mixtures.
//!
//! A low density alternative to the multiparameter equations. The model
//! only evaluates states at given temperature and pressure (or density);
//! it is not used by the state resolver.
use itertools::iproduct;
use meos_core::parameter::Registry;
use meos_core::{MeosError, MeosResult, RGAS};
use ndarray::{Array1, Array2};
use num_dual::{second_derivative, DualNum};
use std::fmt;
use std::sync::Arc;

mod correlations;
mod parameters;

pub use correlations::{tabulated, CriticalConstants, SecondVirial, ThirdVirial};
pub use parameters::{PairVirial, VirialParameters};

/// Choice of the correlations used for the virial coefficients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VirialOptions {
    pub second: SecondVirial,
    pub third: ThirdVirial,
}

impl VirialOptions {
    pub fn new(second: SecondVirial, third: ThirdVirial) -> Self {
        Self { second, third }
    }
}

/// Mixture virial coefficients and their reduced temperature derivatives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VirialCoefficients {
    /// B in m³/mol
    pub b: f64,
    /// T dB/dT
    pub b1: f64,
    /// T² d²B/dT²
    pub b2: f64,
    /// C in m⁶/mol²
    pub c: f64,
    /// T dC/dT
    pub c1: f64,
    /// T² d²C/dT²
    pub c2: f64,
}

/// State of a gas (mixture) described by the virial equation.
///
/// Energies and heat capacities are residual molar quantities. They and
/// the fugacity coefficients are evaluated from the density series at the
/// molar volume of the state. For [Virial::properties_tp] that volume
/// follows from the compressibility of the pressure series, so the results
/// of both paths agree up to terms of third order in the density.
#[derive(Clone, Debug, PartialEq)]
pub struct VirialProperties {
    /// K
    pub temperature: f64,
    /// Pa
    pub pressure: f64,
    /// m³/mol
    pub molar_volume: f64,
    /// kg/m³
    pub density: f64,
    /// kg/mol
    pub molar_weight: f64,
    pub compressibility: f64,
    pub coefficients: VirialCoefficients,
    /// J/mol
    pub internal_energy: f64,
    /// J/mol
    pub enthalpy: f64,
    /// J/(mol K)
    pub entropy: f64,
    /// J/mol
    pub gibbs_energy: f64,
    /// J/mol
    pub helmholtz_energy: f64,
    /// J/(mol K)
    pub cv: f64,
    /// J/(mol K)
    pub cp: f64,
    pub fugacity_coefficient: f64,
    pub component_fugacity_coefficients: Array1<f64>,
}

impl VirialProperties {
    /// Fugacity of the mixture in Pa.
    pub fn fugacity(&self) -> f64 {
        self.fugacity_coefficient * self.pressure
    }

    /// Molar density in mol/m³.
    pub fn molar_density(&self) -> f64 {
        1.0 / self.molar_volume
    }
}

impl fmt::Display for VirialProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T = {:.5} K, p = {:.5} Pa, ρ = {:.5} kg/m³, Z = {:.8}, φ = {:.8}",
            self.temperature,
            self.pressure,
            self.density,
            self.compressibility,
            self.fugacity_coefficient
        )
    }
}

/// Virial equation of state truncated after the third coefficient.
pub struct Virial {
    parameters: Arc<VirialParameters>,
    options: VirialOptions,
}

impl Virial {
    pub fn new(parameters: Arc<VirialParameters>, options: VirialOptions) -> Self {
        Self {
            parameters,
            options,
        }
    }

    /// Model for the given substances of a registry.
    pub fn from_registry(
        registry: &Registry,
        ids: &[&str],
        options: VirialOptions,
    ) -> MeosResult<Self> {
        let parameters = VirialParameters::from_registry(registry, ids)?;
        Ok(Self::new(Arc::new(parameters), options))
    }

    pub fn parameters(&self) -> &VirialParameters {
        &self.parameters
    }

    pub fn components(&self) -> usize {
        self.parameters.components()
    }

    /// Second virial coefficient of the mixture in m³/mol.
    pub fn second_virial<D: DualNum<f64> + Copy>(&self, temperature: D, x: &Array1<f64>) -> D {
        let n = x.len();
        let mut b = D::zero();
        for (i, j) in iproduct!(0..n, 0..n) {
            b += self.parameters.b_ij(temperature, i, j, self.options.second) * (x[i] * x[j]);
        }
        b
    }

    /// Third virial coefficients of all pairs in m⁶/mol².
    fn third_virial_pairs<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array2<D> {
        let n = self.components();
        Array2::from_shape_fn([n; 2], |(i, j)| {
            self.options
                .third
                .evaluate(temperature, &self.parameters.critical[(i, j)])
        })
    }

    /// Third virial coefficient of the mixture in m⁶/mol².
    pub fn third_virial<D: DualNum<f64> + Copy>(&self, temperature: D, x: &Array1<f64>) -> D {
        let c = self.third_virial_pairs(temperature);
        let n = x.len();
        let mut c_mix = D::zero();
        for (i, j, k) in iproduct!(0..n, 0..n, 0..n) {
            c_mix += (c[(i, j)] * c[(j, k)] * c[(i, k)]).cbrt() * (x[i] * x[j] * x[k]);
        }
        c_mix
    }

    /// Mixture coefficients with temperature derivatives from dual numbers.
    pub fn coefficients(&self, temperature: f64, x: &Array1<f64>) -> VirialCoefficients {
        let t = temperature;
        let (b, db, d2b) = second_derivative(|t| self.second_virial(t, x), t);
        let (c, dc, d2c) = second_derivative(|t| self.third_virial(t, x), t);
        VirialCoefficients {
            b,
            b1: t * db,
            b2: t * t * d2b,
            c,
            c1: t * dc,
            c2: t * t * d2c,
        }
    }

    /// Normalized mole fractions.
    fn composition(&self, molefracs: &[f64]) -> MeosResult<Array1<f64>> {
        if molefracs.len() != self.components() {
            return Err(MeosError::InvalidInput(format!(
                "{} mole fractions for {} components",
                molefracs.len(),
                self.components()
            )));
        }
        if molefracs.iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(MeosError::InvalidInput(format!(
                "mole fractions {molefracs:?}"
            )));
        }
        let sum: f64 = molefracs.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(MeosError::InvalidInput(format!(
                "mole fractions sum up to {sum}"
            )));
        }
        Ok(Array1::from_iter(molefracs.iter().map(|x| x / sum)))
    }

    fn check_positive(property: &str, value: f64) -> MeosResult<()> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(MeosError::OutOfRange {
                property: property.into(),
                value,
                min: 0.0,
                max: f64::INFINITY,
            })
        }
    }

    /// Properties at given temperature (K) and pressure (Pa).
    ///
    /// The compressibility follows from the pressure series
    /// `Z = 1 + B p/RT + (C - B²) (p/RT)²`.
    pub fn properties_tp(
        &self,
        temperature: f64,
        pressure: f64,
        molefracs: &[f64],
    ) -> MeosResult<VirialProperties> {
        Self::check_positive("temperature", temperature)?;
        Self::check_positive("pressure", pressure)?;
        let x = self.composition(molefracs)?;
        let co = self.coefficients(temperature, &x);
        let p_rt = pressure / (RGAS * temperature);
        let z = 1.0 + co.b * p_rt + (co.c - co.b * co.b) * p_rt * p_rt;
        if z <= 0.0 {
            return Err(MeosError::InvalidInput(format!(
                "virial series gives Z = {z} at T = {temperature} K, p = {pressure} Pa"
            )));
        }
        Ok(self.evaluate(temperature, pressure, z / p_rt, z, &x, co))
    }

    /// Properties at given temperature (K) and molar density (mol/m³).
    ///
    /// The compressibility follows from the density series `Z = 1 + B ρ + C ρ²`.
    pub fn properties_trho(
        &self,
        temperature: f64,
        density: f64,
        molefracs: &[f64],
    ) -> MeosResult<VirialProperties> {
        Self::check_positive("temperature", temperature)?;
        Self::check_positive("density", density)?;
        let x = self.composition(molefracs)?;
        let co = self.coefficients(temperature, &x);
        let z = 1.0 + co.b * density + co.c * density * density;
        if z <= 0.0 {
            return Err(MeosError::InvalidInput(format!(
                "virial series gives Z = {z} at T = {temperature} K, rho = {density} mol/m³"
            )));
        }
        let pressure = z * density * RGAS * temperature;
        Ok(self.evaluate(temperature, pressure, 1.0 / density, z, &x, co))
    }

    fn evaluate(
        &self,
        temperature: f64,
        pressure: f64,
        v: f64,
        z: f64,
        x: &Array1<f64>,
        co: VirialCoefficients,
    ) -> VirialProperties {
        let VirialCoefficients {
            b,
            b1,
            b2,
            c,
            c1,
            c2,
        } = co;
        let rt = RGAS * temperature;
        let v2 = v * v;

        let internal_energy = -rt * (b1 / v + c1 / (2.0 * v2));
        let enthalpy = rt * ((b - b1) / v + (2.0 * c - c1) / (2.0 * v2));
        let ln_phi = 2.0 * b / v + 1.5 * c / v2 - z.ln();
        let gibbs_energy = rt * ln_phi;
        let entropy = (enthalpy - gibbs_energy) / temperature;
        let helmholtz_energy = internal_energy - temperature * entropy;
        let cv = -RGAS * ((2.0 * b1 + b2) / v + (2.0 * c1 + c2) / (2.0 * v2));
        let cp = cv
            + RGAS
                * ((1.0 + (b + b1) / v + (c + c1) / v2).powi(2) / (1.0 + 2.0 * b / v + 3.0 * c / v2)
                    - 1.0);

        // partial molar contributions of the pair and triplet sums
        let n = x.len();
        let c_pairs = self.third_virial_pairs(temperature);
        let component_fugacity_coefficients = Array1::from_shape_fn(n, |i| {
            let b_i: f64 = (0..n)
                .map(|j| x[j] * self.parameters.b_ij(temperature, i, j, self.options.second))
                .sum();
            let c_i: f64 = iproduct!(0..n, 0..n)
                .map(|(j, k)| {
                    x[j] * x[k] * (c_pairs[(i, j)] * c_pairs[(j, k)] * c_pairs[(i, k)]).cbrt()
                })
                .sum();
            (2.0 * b_i / v + 1.5 * c_i / v2 - z.ln()).exp()
        });

        let molar_weight = (x * &self.parameters.molar_weight).sum();
        VirialProperties {
            temperature,
            pressure,
            molar_volume: v,
            density: molar_weight / v,
            molar_weight,
            compressibility: z,
            coefficients: co,
            internal_energy,
            enthalpy,
            entropy,
            gibbs_energy,
            helmholtz_energy,
            cv,
            cp,
            fugacity_coefficient: ln_phi.exp(),
            component_fugacity_coefficients,
        }
    }
}

impl fmt::Display for Virial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Virial({:?}, {:?})\n{}",
            self.options.second, self.options.third, self.parameters
        )
    }
}
