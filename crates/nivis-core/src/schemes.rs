//! The three ordinal snow-instability classification schemes and their
//! unstable/stable binarization rules.

use thiserror::Error;

/// Ordinal stability schemes under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Five stability classes, very poor (1) to very good (5).
    FiveClass,
    /// Four classes after Techel, very poor (1) to good (4).
    FourClassTechel,
    /// Three classes counting criteria in the critical range.
    ThreeClassSum,
}

impl Scheme {
    /// Evaluation order used throughout reports and derived rows.
    pub const ALL: [Self; 3] = [Self::FiveClass, Self::FourClassTechel, Self::ThreeClassSum];

    /// Human-readable label for reports and chart titles.
    pub fn label(self) -> &'static str {
        match self {
            Self::FiveClass => "5-class stability",
            Self::FourClassTechel => "4-class stability (Techel)",
            Self::ThreeClassSum => "3-class stability (sum)",
        }
    }

    /// Short identifier used in chart file names.
    pub fn slug(self) -> &'static str {
        match self {
            Self::FiveClass => "5_class",
            Self::FourClassTechel => "4_class",
            Self::ThreeClassSum => "3_class",
        }
    }

    /// Inclusive bounds of the scheme's valid ordinal scores.
    pub fn valid_range(self) -> (u8, u8) {
        match self {
            Self::FiveClass => (1, 5),
            Self::FourClassTechel => (1, 4),
            Self::ThreeClassSum => (1, 3),
        }
    }

    /// Map an ordinal score to the boolean unstable call.
    pub fn binarize(self, score: u8) -> Result<bool, ScoreError> {
        match self {
            Self::FiveClass => five_to_binary(score),
            Self::FourClassTechel => techel_to_binary(score),
            Self::ThreeClassSum => three_to_binary(score),
        }
    }
}

/// An ordinal score outside its scheme's valid range. Always a hard error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("score {score} out of bounds for {label} (valid {min}..={max})")]
pub struct ScoreError {
    pub label: &'static str,
    pub score: u8,
    pub min: u8,
    pub max: u8,
}

fn check_range(scheme: Scheme, score: u8) -> Result<(), ScoreError> {
    let (min, max) = scheme.valid_range();
    if score < min || score > max {
        return Err(ScoreError {
            label: scheme.label(),
            score,
            min,
            max,
        });
    }
    Ok(())
}

/// Unstable iff the score is 1, 2 or 3 (very poor, poor, fair).
pub fn five_to_binary(score: u8) -> Result<bool, ScoreError> {
    check_range(Scheme::FiveClass, score)?;
    Ok(score < 4)
}

/// Unstable iff the score is 1 or 2 (very poor, poor).
pub fn techel_to_binary(score: u8) -> Result<bool, ScoreError> {
    check_range(Scheme::FourClassTechel, score)?;
    Ok(score < 3)
}

/// Unstable iff the score is 2 or 3 (criteria in the critical range).
pub fn three_to_binary(score: u8) -> Result<bool, ScoreError> {
    check_range(Scheme::ThreeClassSum, score)?;
    Ok(score > 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_class_truth_table() {
        for score in 1..=5 {
            assert_eq!(five_to_binary(score).unwrap(), score < 4, "score {score}");
        }
    }

    #[test]
    fn techel_truth_table() {
        for score in 1..=4 {
            assert_eq!(techel_to_binary(score).unwrap(), score < 3, "score {score}");
        }
    }

    #[test]
    fn three_class_truth_table() {
        for score in 1..=3 {
            assert_eq!(three_to_binary(score).unwrap(), score > 1, "score {score}");
        }
    }

    #[test]
    fn out_of_range_scores_are_domain_errors() {
        assert!(five_to_binary(0).is_err());
        assert!(five_to_binary(6).is_err());
        assert!(techel_to_binary(5).is_err());
        assert!(three_to_binary(4).is_err());
    }

    #[test]
    fn binarize_dispatches_per_scheme() {
        assert!(Scheme::FiveClass.binarize(3).unwrap());
        assert!(!Scheme::FourClassTechel.binarize(3).unwrap());
        assert!(Scheme::ThreeClassSum.binarize(3).unwrap());
    }

    #[test]
    fn error_carries_scheme_bounds() {
        let err = Scheme::FiveClass.binarize(6).unwrap_err();
        assert_eq!((err.min, err.max, err.score), (1, 5, 6));
    }
}
