//! Standard normal distribution helpers
//!
//! `erf` uses the Abramowitz & Stegun 7.1.26 rational approximation
//! (|error| <= 1.5e-7), which is sufficient for defect-rate estimates.

const A1: f64 = 0.254829592;
const A2: f64 = -0.284496736;
const A3: f64 = 1.421413741;
const A4: f64 = -1.453152027;
const A5: f64 = 1.061405429;
const P: f64 = 0.3275911;

/// Error function
pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }

    // erf is odd: erf(-x) = -erf(x)
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    let y = 1.0 - poly * (-x * x).exp();

    sign * y
}

/// Standard normal cumulative distribution function
///
/// Φ(z) = probability that a standard normal random variable is ≤ z
pub fn normal_cdf(z: f64) -> f64 {
    if z == f64::INFINITY {
        return 1.0;
    }
    if z == f64::NEG_INFINITY {
        return 0.0;
    }
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}
