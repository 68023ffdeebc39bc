//! Corresponding states correlations for second and third virial coefficients.
//!
//! All correlations are generic over the temperature so that its
//! derivatives can be obtained with dual numbers.
use meos_core::{Substance, RGAS};
use num_dual::DualNum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Critical constants of a substance or of a pseudo-critical pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CriticalConstants {
    /// K
    pub tc: f64,
    /// Pa
    pub pc: f64,
    /// m³/mol
    pub vc: f64,
    pub zc: f64,
    pub acentric_factor: f64,
    /// debye
    pub dipole: f64,
}

impl CriticalConstants {
    pub fn from_substance(substance: &Substance) -> Self {
        Self {
            tc: substance.tc,
            pc: substance.pc,
            vc: 1.0 / substance.rhoc,
            zc: substance.zc(),
            acentric_factor: substance.acentric_factor,
            dipole: substance.dipole,
        }
    }

    /// Pseudo-critical constants of an unlike pair.
    ///
    /// The polar contribution is not used for unlike interactions.
    pub fn combine(&self, other: &Self) -> Self {
        let tc = (self.tc * other.tc).sqrt();
        let vc = (0.5 * (self.vc.cbrt() + other.vc.cbrt())).powi(3);
        let zc = 0.5 * (self.zc + other.zc);
        Self {
            tc,
            pc: zc * RGAS * tc / vc,
            vc,
            zc,
            acentric_factor: 0.5 * (self.acentric_factor + other.acentric_factor),
            dipole: 0.0,
        }
    }
}

impl fmt::Display for CriticalConstants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CriticalConstants(tc={} K", self.tc)?;
        write!(f, ", pc={} Pa", self.pc)?;
        write!(f, ", vc={} m³/mol", self.vc)?;
        write!(f, ", zc={}", self.zc)?;
        write!(f, ", acentric factor={}", self.acentric_factor)?;
        write!(f, ", dipole={} D)", self.dipole)
    }
}

/// Correlation for the second virial coefficient of substances
/// and pairs without tabulated data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecondVirial {
    /// Tsonopoulos, AIChE J. 20 (1974) 263
    #[default]
    Tsonopoulos,
    /// Iglesias-Silva and Hall, Ind. Eng. Chem. Res. 40 (2001) 3729
    IglesiasSilva,
    /// Meng, Duan and Li, Fluid Phase Equilib. 226 (2004) 109
    Meng,
}

/// Correlation for the third virial coefficient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThirdVirial {
    /// Liu and Xiang, Ind. Eng. Chem. Res. 42 (2003) 4347
    #[default]
    LiuXiang,
    /// Orbey and Vera, AIChE J. 29 (1983) 107
    OrbeyVera,
}

impl SecondVirial {
    /// Second virial coefficient in m³/mol.
    pub fn evaluate<D: DualNum<f64> + Copy>(&self, temperature: D, c: &CriticalConstants) -> D {
        match self {
            Self::Tsonopoulos => tsonopoulos(temperature, c),
            Self::IglesiasSilva => iglesias_silva(temperature, c),
            Self::Meng => meng(temperature, c),
        }
    }
}

impl ThirdVirial {
    /// Third virial coefficient in m⁶/mol².
    pub fn evaluate<D: DualNum<f64> + Copy>(&self, temperature: D, c: &CriticalConstants) -> D {
        match self {
            Self::LiuXiang => liu_xiang(temperature, c),
            Self::OrbeyVera => orbey_vera(temperature, c),
        }
    }
}

/// Dipole moment reduced with the critical constants (Pc in atm).
fn reduced_dipole(c: &CriticalConstants) -> f64 {
    c.dipole.powi(2) * c.pc / 1.01325 / c.tc.powi(2)
}

fn tsonopoulos<D: DualNum<f64> + Copy>(temperature: D, c: &CriticalConstants) -> D {
    let tri = temperature.recip() * c.tc;
    let w = c.acentric_factor;
    let f0 = tri * -0.33 - tri.powi(2) * 0.1385 - tri.powi(3) * 0.0121 - tri.powi(8) * 0.000607
        + 0.1445;
    let f1 = tri.powi(2) * 0.331 - tri.powi(3) * 0.423 - tri.powi(8) * 0.008 + 0.0637;
    let mut f = f0 + f1 * w;
    if c.dipole > 0.0 {
        let mu_r = reduced_dipole(c);
        let a = -2.14e-4 * mu_r - 4.308e-21 * mu_r.powi(8);
        let b = 0.00908 + 0.0006957 * mu_r;
        f += tri.powi(6) * a - tri.powi(8) * b;
    }
    f * (RGAS * c.tc / c.pc)
}

fn iglesias_silva<D: DualNum<f64> + Copy>(temperature: D, c: &CriticalConstants) -> D {
    let w = c.acentric_factor;
    let mu_r = reduced_dipole(c);
    let tb = c.tc * (2.0525 + 0.6428 * (-3.6167 * w).exp());
    let n = 1.4187 + 1.2058 * w;
    let tb_tc = tb / c.tc;
    let bo = c.vc * (0.1368 - 0.4791 * w + 13.81 * tb_tc.powi(2) * (-1.95 * tb_tc).exp());
    let bc = c.vc * (-1.1747 - 0.3668 * w - 0.00061 * mu_r);
    let base = bc / bo / (tb_tc.powf(0.2) - tb_tc);
    let tb_t = temperature.recip() * tb;
    let exponent = (temperature.recip() * c.tc).powf(n);
    tb_t.powf(0.2) * (-tb_t.powf(0.8) + 1.0) * (exponent * base.ln()).exp() * bo
}

fn meng<D: DualNum<f64> + Copy>(temperature: D, c: &CriticalConstants) -> D {
    let tri = temperature.recip() * c.tc;
    let mu_r = reduced_dipole(c);
    let a = -3.0309e-6 * mu_r.powi(2) + 9.503e-11 * mu_r.powi(4) - 1.2469e-15 * mu_r.powi(6);
    let f0 = tri * -0.30252 - tri.powi(2) * 0.15668 - tri.powi(3) * 0.00724
        - tri.powi(8) * 0.00022
        + 0.13356;
    let f1 = tri * -0.15581 + tri.powi(2) * 0.38183
        - tri.powi(3) * 0.44044
        - tri.powi(8) * 0.00541
        + 0.17404;
    (f0 + f1 * c.acentric_factor + tri.powi(6) * a) * (RGAS * c.tc / c.pc)
}

fn orbey_vera<D: DualNum<f64> + Copy>(temperature: D, c: &CriticalConstants) -> D {
    let tri = temperature.recip() * c.tc;
    let g0 = tri.powf(2.8) * 0.02432 - tri.powf(10.5) * 0.00313 + 0.01407;
    let g1 = tri.powf(2.8) * 0.0177 + tri.powi(3) * 0.04
        - tri.powi(6) * 0.003
        - tri.powf(10.5) * 0.00228
        - 0.02676;
    (g0 + g1 * c.acentric_factor) * (RGAS * c.tc / c.pc).powi(2)
}

fn liu_xiang<D: DualNum<f64> + Copy>(temperature: D, c: &CriticalConstants) -> D {
    let tri = temperature.recip() * c.tc;
    let x = (c.zc - 0.29).powi(2);
    let g0 = tri.powi(3) * 0.3087440 - tri.powi(6) * 0.01790184 - tri.powi(11) * 0.02789157
        + 0.1623538;
    let g1 = tri.powi(3) * 1.783526 - tri.powi(6) * 1.055391 + tri.powi(11) * 0.09955867
        - 0.5390344;
    let g2 = tri.powi(3) * -74.76559 + tri.powi(6) * 279.9220 - tri.powi(11) * 62.85431
        + 34.22804;
    (g0 + g1 * c.acentric_factor + g2 * x) * c.vc.powi(2)
}

/// Second virial coefficient `B = Σ a_i / T^i` from a table in cm³/mol, returned in m³/mol.
pub fn tabulated<D: DualNum<f64> + Copy>(temperature: D, coefficients: &[f64]) -> D {
    let tr = temperature.recip();
    coefficients
        .iter()
        .enumerate()
        .fold(D::zero(), |acc, (i, a)| acc + tr.powi(i as i32) * *a)
        * 1e-6
}
