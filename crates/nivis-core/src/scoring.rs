//! Confusion matrices, per-class summaries and terrain-impact deltas.

/// 2×2 outcome counts with rows = actual, cols = predicted, in report
/// label order: actual {avalanche, no avalanche} × predicted
/// {unstable, stable}.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Avalanche observed, unstable predicted.
    pub hits: usize,
    /// Avalanche observed, stable predicted (the dangerous miss).
    pub false_stables: usize,
    /// No avalanche observed, unstable predicted.
    pub false_alarms: usize,
    /// No avalanche observed, stable predicted.
    pub correct_stables: usize,
}

impl ConfusionMatrix {
    /// Tally ground truth against predictions. Both slices must be the
    /// same length.
    pub fn tally(truth: &[bool], predicted: &[bool]) -> Self {
        assert_eq!(truth.len(), predicted.len());
        let mut cm = Self::default();
        for (&actual, &pred) in truth.iter().zip(predicted) {
            match (actual, pred) {
                (true, true) => cm.hits += 1,
                (true, false) => cm.false_stables += 1,
                (false, true) => cm.false_alarms += 1,
                (false, false) => cm.correct_stables += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.hits + self.false_stables + self.false_alarms + self.correct_stables
    }

    /// Observations with avalanche activity (first row sum).
    pub fn support_avalanche(&self) -> usize {
        self.hits + self.false_stables
    }

    /// Observations without avalanche activity (second row sum).
    pub fn support_no_avalanche(&self) -> usize {
        self.false_alarms + self.correct_stables
    }

    /// Counts in row-major report order.
    pub fn rows(&self) -> [[usize; 2]; 2] {
        [
            [self.hits, self.false_stables],
            [self.false_alarms, self.correct_stables],
        ]
    }
}

/// Precision, recall, F1 and support for one class. Ratios with a zero
/// denominator report as 0.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Two-class summary in the shape of the usual classification report.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationReport {
    /// Positive = predicted unstable.
    pub avalanche: ClassMetrics,
    /// Positive = predicted stable.
    pub no_avalanche: ClassMetrics,
    pub accuracy: f64,
    /// Unweighted mean of both classes; support = total observations.
    pub macro_avg: ClassMetrics,
    /// Support-weighted mean of both classes.
    pub weighted_avg: ClassMetrics,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn class_metrics(tp: usize, fp: usize, missed: usize, support: usize) -> ClassMetrics {
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + missed);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    ClassMetrics {
        precision,
        recall,
        f1,
        support,
    }
}

/// Per-class precision/recall/F1/support plus accuracy and the macro and
/// weighted averages.
pub fn classification_report(cm: &ConfusionMatrix) -> ClassificationReport {
    let avalanche = class_metrics(
        cm.hits,
        cm.false_alarms,
        cm.false_stables,
        cm.support_avalanche(),
    );
    let no_avalanche = class_metrics(
        cm.correct_stables,
        cm.false_stables,
        cm.false_alarms,
        cm.support_no_avalanche(),
    );

    let total = cm.total();
    let weight = |a: f64, b: f64| {
        if total == 0 {
            0.0
        } else {
            (a * avalanche.support as f64 + b * no_avalanche.support as f64) / total as f64
        }
    };

    ClassificationReport {
        avalanche,
        no_avalanche,
        accuracy: ratio(cm.hits + cm.correct_stables, total),
        macro_avg: ClassMetrics {
            precision: (avalanche.precision + no_avalanche.precision) / 2.0,
            recall: (avalanche.recall + no_avalanche.recall) / 2.0,
            f1: (avalanche.f1 + no_avalanche.f1) / 2.0,
            support: total,
        },
        weighted_avg: ClassMetrics {
            precision: weight(avalanche.precision, no_avalanche.precision),
            recall: weight(avalanche.recall, no_avalanche.recall),
            f1: weight(avalanche.f1, no_avalanche.f1),
            support: total,
        },
    }
}

/// Before/after error counts for one scheme with the terrain check OR'd
/// in. Percentage changes saturate to 0.0 when the "old" count is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainImpact {
    pub false_stables_old: usize,
    pub false_stables_new: usize,
    /// Dangerous misses removed by the terrain check.
    pub reduction: i64,
    pub reduction_pct: f64,
    pub false_alarms_old: usize,
    pub false_alarms_new: usize,
    /// False alarms added by the terrain check.
    pub introduction: i64,
    pub introduction_pct: f64,
}

/// Compare a scheme's plain matrix against its terrain-augmented matrix.
pub fn terrain_impact(plain: &ConfusionMatrix, augmented: &ConfusionMatrix) -> TerrainImpact {
    let reduction = plain.false_stables as i64 - augmented.false_stables as i64;
    let introduction = augmented.false_alarms as i64 - plain.false_alarms as i64;
    TerrainImpact {
        false_stables_old: plain.false_stables,
        false_stables_new: augmented.false_stables,
        reduction,
        reduction_pct: pct(reduction, plain.false_stables),
        false_alarms_old: plain.false_alarms,
        false_alarms_new: augmented.false_alarms,
        introduction,
        introduction_pct: pct(introduction, plain.false_alarms),
    }
}

fn pct(delta: i64, old: usize) -> f64 {
    if old == 0 {
        0.0
    } else {
        delta as f64 / old as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_matrix() -> ConfusionMatrix {
        ConfusionMatrix {
            hits: 120,
            false_stables: 40,
            false_alarms: 90,
            correct_stables: 339,
        }
    }

    #[test]
    fn tally_sorts_outcomes_into_quadrants() {
        let truth = [true, true, false, false, true];
        let predicted = [true, false, true, false, true];
        let cm = ConfusionMatrix::tally(&truth, &predicted);
        assert_eq!(cm.hits, 2);
        assert_eq!(cm.false_stables, 1);
        assert_eq!(cm.false_alarms, 1);
        assert_eq!(cm.correct_stables, 1);
        assert_eq!(cm.total(), truth.len());
    }

    #[test]
    fn marginal_sums_match_supports() {
        let cm = sample_matrix();
        assert_eq!(cm.support_avalanche() + cm.support_no_avalanche(), cm.total());
        let rows = cm.rows();
        assert_eq!(rows[0][0] + rows[0][1], cm.support_avalanche());
        assert_eq!(rows[1][0] + rows[1][1], cm.support_no_avalanche());
        // Column sums also add up to the total.
        assert_eq!(
            rows[0][0] + rows[1][0] + rows[0][1] + rows[1][1],
            cm.total()
        );
    }

    #[test]
    fn report_matches_hand_computation() {
        let report = classification_report(&sample_matrix());
        assert_relative_eq!(report.avalanche.precision, 120.0 / 210.0, max_relative = 1e-12);
        assert_relative_eq!(report.avalanche.recall, 120.0 / 160.0, max_relative = 1e-12);
        assert_relative_eq!(report.no_avalanche.precision, 339.0 / 379.0, max_relative = 1e-12);
        assert_relative_eq!(report.no_avalanche.recall, 339.0 / 429.0, max_relative = 1e-12);
        assert_relative_eq!(report.accuracy, 459.0 / 589.0, max_relative = 1e-12);
        assert_eq!(report.avalanche.support, 160);
        assert_eq!(report.no_avalanche.support, 429);
        assert_eq!(report.macro_avg.support, 589);
    }

    #[test]
    fn weighted_average_uses_class_supports() {
        let report = classification_report(&sample_matrix());
        let expected = (report.avalanche.recall * 160.0 + report.no_avalanche.recall * 429.0) / 589.0;
        assert_relative_eq!(report.weighted_avg.recall, expected, max_relative = 1e-12);
    }

    #[test]
    fn empty_matrix_reports_zeros() {
        let report = classification_report(&ConfusionMatrix::default());
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.avalanche.precision, 0.0);
        assert_eq!(report.avalanche.f1, 0.0);
    }

    #[test]
    fn impact_counts_and_percentages() {
        let plain = ConfusionMatrix {
            hits: 10,
            false_stables: 4,
            false_alarms: 20,
            correct_stables: 100,
        };
        let augmented = ConfusionMatrix {
            hits: 13,
            false_stables: 1,
            false_alarms: 25,
            correct_stables: 95,
        };
        let impact = terrain_impact(&plain, &augmented);
        assert_eq!(impact.reduction, 3);
        assert_relative_eq!(impact.reduction_pct, 75.0);
        assert_eq!(impact.introduction, 5);
        assert_relative_eq!(impact.introduction_pct, 25.0);
    }

    #[test]
    fn zero_old_counts_saturate_percentages_to_zero() {
        let plain = ConfusionMatrix {
            hits: 5,
            false_stables: 0,
            false_alarms: 0,
            correct_stables: 10,
        };
        let impact = terrain_impact(&plain, &plain);
        assert_eq!(impact.reduction_pct, 0.0);
        assert_eq!(impact.introduction_pct, 0.0);
    }
}
