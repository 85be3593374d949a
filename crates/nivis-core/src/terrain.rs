//! Terrain check: a fixed-threshold ensemble predictor over snow depth,
//! local coefficient of variation and daily wind speed.

/// Snow depth threshold, metres.
pub const DEPTH_THRESHOLD_M: f64 = 0.9;
/// Coefficient-of-variation threshold, unitless.
pub const CV_THRESHOLD: f64 = 0.28;
/// Daily mean wind speed threshold, m/s.
pub const WIND_THRESHOLD_MS: f64 = 8.0;

/// True when the covariate is present, finite and at or above the
/// threshold. Missing covariates never exceed.
fn exceeds(value: Option<f64>, threshold: f64) -> bool {
    matches!(value, Some(v) if v.is_finite() && v >= threshold)
}

/// Flags unstable iff at least two of the three covariates reach their
/// thresholds.
pub fn terrain_check(depth_m: Option<f64>, cv: Option<f64>, wind_ms: Option<f64>) -> bool {
    let flags = [
        exceeds(depth_m, DEPTH_THRESHOLD_M),
        exceeds(cv, CV_THRESHOLD),
        exceeds(wind_ms, WIND_THRESHOLD_MS),
    ];
    flags.iter().filter(|&&f| f).count() >= 2
}

/// Base binarized call with the terrain check OR'd in. Once unstable, a
/// call is never overridden back to stable.
pub fn augment(base: bool, terrain: bool) -> bool {
    base || terrain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive() {
        // Each boundary value counts as exceeding; two suffice.
        assert!(terrain_check(Some(0.9), Some(0.28), None));
        assert!(terrain_check(Some(0.9), None, Some(8.0)));
        assert!(terrain_check(None, Some(0.28), Some(8.0)));
    }

    #[test]
    fn one_of_three_is_not_enough() {
        assert!(!terrain_check(Some(2.0), Some(0.1), Some(3.0)));
        assert!(!terrain_check(Some(0.1), Some(0.5), None));
        assert!(!terrain_check(None, None, Some(20.0)));
    }

    #[test]
    fn all_three_flag() {
        assert!(terrain_check(Some(1.4), Some(0.3), Some(11.0)));
    }

    #[test]
    fn missing_covariates_never_exceed() {
        assert!(!terrain_check(None, None, None));
        assert!(!terrain_check(Some(1.5), None, None));
    }

    #[test]
    fn non_finite_covariates_never_exceed() {
        assert!(!terrain_check(Some(f64::INFINITY), Some(f64::NAN), None));
    }

    #[test]
    fn augmentation_is_or_monotone() {
        for base in [false, true] {
            for terrain in [false, true] {
                let out = augment(base, terrain);
                assert_eq!(out, base || terrain);
                // Never flips an unstable base call back to stable.
                assert!(!base || out);
            }
        }
    }
}
