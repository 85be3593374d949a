//! Spatial-temporal covariates derived per observation site: interpolated
//! depth, 3×3 window variance and coefficient of variation.

use chrono::NaiveDate;

use crate::depth::{DepthGrid, DepthSlice, NOMINAL_STEP_M};

/// Derived covariates at one site and date. Missing data stays missing;
/// downstream threshold checks read `None` as "does not exceed".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SiteFeatures {
    /// Bilinearly interpolated snow depth, metres.
    pub depth_m: Option<f64>,
    /// Population variance of depth over the 3×3 window, m².
    pub variance_m2: Option<f64>,
    /// sqrt(variance) / depth.
    pub cv: Option<f64>,
}

/// Population variance (denominator = count) of depth over a 3×3 window
/// centred at (e, n), spaced at the nominal grid step.
///
/// Missing window samples are skipped. Zero present samples yield `None`;
/// a single present sample yields variance 0.
pub fn window_variance(slice: DepthSlice<'_>, e: f64, n: f64) -> Option<f64> {
    let offsets = [-NOMINAL_STEP_M, 0.0, NOMINAL_STEP_M];
    let mut samples: Vec<f64> = Vec::with_capacity(9);
    for dn in offsets {
        for de in offsets {
            if let Some(v) = slice.sample(e + de, n + dn) {
                samples.push(v);
            }
        }
    }
    if samples.is_empty() {
        return None;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    Some(variance)
}

/// sqrt(variance) / depth. `None` when either operand is missing or depth
/// is zero (the degenerate division is missing data, not an error).
pub fn coefficient_of_variation(variance_m2: Option<f64>, depth_m: Option<f64>) -> Option<f64> {
    let variance = variance_m2?;
    let depth = depth_m?;
    if depth == 0.0 {
        return None;
    }
    Some(variance.sqrt() / depth)
}

/// Extract all covariates for one observation site. A date the cube does
/// not cover makes every covariate missing.
pub fn extract(grid: &DepthGrid, date: NaiveDate, e: f64, n: f64) -> SiteFeatures {
    let Some(slice) = grid.slice(date) else {
        return SiteFeatures::default();
    };
    let depth_m = slice.sample(e, n);
    let variance_m2 = window_variance(slice, e, n);
    let cv = coefficient_of_variation(variance_m2, depth_m);
    SiteFeatures {
        depth_m,
        variance_m2,
        cv,
    }
}
