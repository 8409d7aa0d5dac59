//! Control chart factor table
//!
//! Constants for subgroup sizes n = 2..=10 (ASTM E2587). Sizes outside the
//! table fall back to the n = 5 row, which is an approximation and is
//! reported to the caller as such.

use serde::Serialize;

use crate::core::error::SpcError;

/// Subgroup size whose factors are used for untabulated sizes
pub const FALLBACK_SAMPLE_SIZE: usize = 5;

/// E2 factor for the individuals chart (3 / d2 for n = 2)
pub const E2: f64 = 2.660;

/// D4 factor for the moving range chart (n = 2)
pub const D4_MOVING_RANGE: f64 = 3.267;

/// Chart factors for one subgroup size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartFactors {
    pub sample_size: usize,
    /// X-bar limits from R-bar
    pub a2: f64,
    /// R chart lower limit
    pub d3: f64,
    /// R chart upper limit
    pub d4: f64,
    /// X-bar limits from S-bar
    pub a3: f64,
    /// S chart lower limit
    pub b3: f64,
    /// S chart upper limit
    pub b4: f64,
    /// Range to sigma divisor
    pub d2: f64,
    /// S to sigma divisor
    pub c4: f64,
}

const fn row(
    sample_size: usize,
    a2: f64,
    d3: f64,
    d4: f64,
    a3: f64,
    b3: f64,
    b4: f64,
    d2: f64,
    c4: f64,
) -> ChartFactors {
    ChartFactors {
        sample_size,
        a2,
        d3,
        d4,
        a3,
        b3,
        b4,
        d2,
        c4,
    }
}

#[rustfmt::skip]
const TABLE: [ChartFactors; 9] = [
    //   n   A2     D3     D4     A3     B3     B4     d2     c4
    row( 2, 1.880, 0.0,   3.267, 2.659, 0.0,   3.267, 1.128, 0.7979),
    row( 3, 1.023, 0.0,   2.574, 1.954, 0.0,   2.568, 1.693, 0.8862),
    row( 4, 0.729, 0.0,   2.282, 1.628, 0.0,   2.266, 2.059, 0.9213),
    row( 5, 0.577, 0.0,   2.114, 1.427, 0.0,   2.089, 2.326, 0.9400),
    row( 6, 0.483, 0.0,   2.004, 1.287, 0.030, 1.970, 2.534, 0.9515),
    row( 7, 0.419, 0.076, 1.924, 1.182, 0.118, 1.882, 2.704, 0.9594),
    row( 8, 0.373, 0.136, 1.864, 1.099, 0.185, 1.815, 2.847, 0.9650),
    row( 9, 0.337, 0.184, 1.816, 1.032, 0.239, 1.761, 2.970, 0.9693),
    row(10, 0.308, 0.223, 1.777, 0.975, 0.284, 1.716, 3.078, 0.9727),
];

/// Result of a factor lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorLookup {
    pub factors: ChartFactors,
    /// True when `sample_size` was not tabulated and the fallback row was used
    pub fallback: bool,
}

impl ChartFactors {
    /// Exact table row, if the size is tabulated
    pub fn exact(sample_size: usize) -> Option<ChartFactors> {
        TABLE.iter().copied().find(|f| f.sample_size == sample_size)
    }

    /// Look up factors, falling back to the n = 5 row for untabulated sizes
    pub fn lookup(sample_size: usize) -> FactorLookup {
        match Self::exact(sample_size) {
            Some(factors) => FactorLookup {
                factors,
                fallback: false,
            },
            None => {
                tracing::warn!(
                    sample_size,
                    fallback = FALLBACK_SAMPLE_SIZE,
                    "no chart factors for subgroup size, using fallback row"
                );
                FactorLookup {
                    factors: fallback_row(),
                    fallback: true,
                }
            }
        }
    }

    /// Look up factors, rejecting untabulated sizes
    pub fn strict(sample_size: usize) -> Result<ChartFactors, SpcError> {
        Self::exact(sample_size).ok_or_else(|| {
            SpcError::invalid(format!(
                "no chart factors tabulated for subgroup size {} (supported: 2-10)",
                sample_size
            ))
        })
    }

    /// Tabulated subgroup sizes
    pub fn supported_sizes() -> std::ops::RangeInclusive<usize> {
        2..=10
    }
}

fn fallback_row() -> ChartFactors {
    TABLE[FALLBACK_SAMPLE_SIZE - 2]
}
