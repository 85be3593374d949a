//! Staged evaluation pipeline: observations, depth cube and wind series in;
//! per-scheme confusion matrices and terrain-impact summaries out.

use chrono::NaiveDate;
#[cfg(feature = "threading")]
use rayon::prelude::*;

use crate::depth::DepthGrid;
use crate::features;
use crate::ingest::{Observation, WindSeries};
use crate::schemes::{Scheme, ScoreError};
use crate::scoring::{
    classification_report, terrain_impact, ClassificationReport, ConfusionMatrix, TerrainImpact,
};
use crate::terrain;

/// The three datasets one evaluation run consumes. Inputs are immutable;
/// every derived value is recomputed per run.
#[derive(Debug, Clone)]
pub struct EvalInputs {
    pub grid: DepthGrid,
    pub wind: WindSeries,
    pub observations: Vec<Observation>,
}

/// Base and terrain-augmented unstable calls for one scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemeCalls {
    pub base: bool,
    pub augmented: bool,
}

/// One observation with every derived covariate and prediction attached.
#[derive(Debug, Clone)]
pub struct DerivedRow {
    pub date: NaiveDate,
    pub e: f64,
    pub n: f64,
    pub depth_m: Option<f64>,
    pub variance_m2: Option<f64>,
    pub cv: Option<f64>,
    pub wind_ms: Option<f64>,
    pub terrain_check: bool,
    /// Indexed in `Scheme::ALL` order.
    pub calls: [SchemeCalls; 3],
    pub avalanche: bool,
}

/// Scored outcome for one scheme, with and without the terrain check.
#[derive(Debug, Clone)]
pub struct SchemeEvaluation {
    pub scheme: Scheme,
    pub plain: ConfusionMatrix,
    pub augmented: ConfusionMatrix,
    pub plain_report: ClassificationReport,
    pub augmented_report: ClassificationReport,
    pub impact: TerrainImpact,
}

/// Full output of one run.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub rows: Vec<DerivedRow>,
    /// One entry per scheme, in `Scheme::ALL` order.
    pub schemes: Vec<SchemeEvaluation>,
}

fn derive_row(inputs: &EvalInputs, obs: &Observation) -> Result<DerivedRow, ScoreError> {
    let site = features::extract(&inputs.grid, obs.date, obs.e, obs.n);
    let wind_ms = inputs.wind.at(obs.date);
    let check = terrain::terrain_check(site.depth_m, site.cv, wind_ms);

    let mut calls = [SchemeCalls {
        base: false,
        augmented: false,
    }; 3];
    for (slot, scheme) in calls.iter_mut().zip(Scheme::ALL) {
        let base = scheme.binarize(obs.score(scheme))?;
        *slot = SchemeCalls {
            base,
            augmented: terrain::augment(base, check),
        };
    }

    Ok(DerivedRow {
        date: obs.date,
        e: obs.e,
        n: obs.n,
        depth_m: site.depth_m,
        variance_m2: site.variance_m2,
        cv: site.cv,
        wind_ms,
        terrain_check: check,
        calls,
        avalanche: obs.avalanche,
    })
}

/// Compute covariates and predictions for every observation.
///
/// Rows are independent; with the `threading` feature the extraction fans
/// out over rayon without affecting per-row results.
pub fn derive_rows(inputs: &EvalInputs) -> Result<Vec<DerivedRow>, ScoreError> {
    #[cfg(feature = "threading")]
    {
        inputs
            .observations
            .par_iter()
            .map(|obs| derive_row(inputs, obs))
            .collect()
    }
    #[cfg(not(feature = "threading"))]
    {
        inputs
            .observations
            .iter()
            .map(|obs| derive_row(inputs, obs))
            .collect()
    }
}

/// Run the full pipeline: derive rows, then score every scheme with and
/// without the terrain check.
pub fn evaluate(inputs: &EvalInputs) -> Result<Evaluation, ScoreError> {
    let rows = derive_rows(inputs)?;
    log::info!("derived covariates for {} observations", rows.len());

    let truth: Vec<bool> = rows.iter().map(|r| r.avalanche).collect();
    let schemes = Scheme::ALL
        .iter()
        .enumerate()
        .map(|(idx, &scheme)| {
            let base: Vec<bool> = rows.iter().map(|r| r.calls[idx].base).collect();
            let augmented: Vec<bool> = rows.iter().map(|r| r.calls[idx].augmented).collect();
            let plain_cm = ConfusionMatrix::tally(&truth, &base);
            let augmented_cm = ConfusionMatrix::tally(&truth, &augmented);
            SchemeEvaluation {
                scheme,
                plain: plain_cm,
                augmented: augmented_cm,
                plain_report: classification_report(&plain_cm),
                augmented_report: classification_report(&augmented_cm),
                impact: terrain_impact(&plain_cm, &augmented_cm),
            }
        })
        .collect();

    Ok(Evaluation { rows, schemes })
}

#[cfg(test)]
mod tests {
    use super::*;

    const E: f64 = 2_782_000.0;
    const N: f64 = 1_188_000.0;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    /// Uniform 1 m depth cube covering two dates around the test site.
    fn make_grid() -> DepthGrid {
        let eastings: Vec<f64> = (0..5).map(|i| 2_780_000.0 + i as f64 * 1000.0).collect();
        let northings: Vec<f64> = (0..5).map(|i| 1_186_000.0 + i as f64 * 1000.0).collect();
        let dates = vec![day(5), day(6)];
        let values = vec![Some(1.0); dates.len() * 25];
        DepthGrid {
            dates,
            eastings,
            northings,
            values,
        }
    }

    fn obs(date: NaiveDate, scores: (u8, u8, u8), avalanche: bool) -> Observation {
        Observation {
            date,
            e: E,
            n: N,
            five_class: scores.0,
            techel: scores.1,
            three_class: scores.2,
            avalanche,
        }
    }

    /// Three-row scenario: row A is a dangerous miss the terrain check
    /// recovers (uniform 1 m depth and 9 m/s wind exceed two thresholds),
    /// rows B and C sit on dates without wind data, so their terrain check
    /// stays false.
    fn make_inputs() -> EvalInputs {
        let mut wind = WindSeries::default();
        wind.insert(day(5), 9.0);

        EvalInputs {
            grid: make_grid(),
            wind,
            observations: vec![
                obs(day(5), (5, 4, 1), true),
                obs(day(6), (1, 1, 3), false),
                obs(day(6), (1, 1, 2), true),
            ],
        }
    }

    #[test]
    fn terrain_check_needs_two_of_three_covariates() {
        let result = evaluate(&make_inputs()).unwrap();
        // Row A: depth 1.0 ≥ 0.9 and wind 9 ≥ 8, CV = 0 → check fires.
        assert!(result.rows[0].terrain_check);
        // Rows B/C: only depth exceeds → check stays false.
        assert!(!result.rows[1].terrain_check);
        assert!(!result.rows[2].terrain_check);
    }

    #[test]
    fn augmentation_recovers_the_missed_avalanche() {
        let result = evaluate(&make_inputs()).unwrap();
        let five = &result.schemes[0];
        assert_eq!(five.scheme, Scheme::FiveClass);

        // Plain 5-class calls row A stable despite the avalanche.
        assert_eq!(five.plain.false_stables, 1);
        assert_eq!(five.augmented.false_stables, 0);
        assert_eq!(five.impact.reduction, 1);
        assert_eq!(five.impact.reduction_pct, 100.0);

        // Row B was already unstable; the augmentation adds no false alarm.
        assert_eq!(five.plain.false_alarms, 1);
        assert_eq!(five.augmented.false_alarms, 1);
        assert_eq!(five.impact.introduction, 0);
        assert_eq!(five.impact.introduction_pct, 0.0);
    }

    #[test]
    fn augmented_calls_stay_unstable_when_base_is_unstable() {
        let result = evaluate(&make_inputs()).unwrap();
        for row in &result.rows {
            for call in &row.calls {
                assert_eq!(call.augmented, call.base || row.terrain_check);
            }
        }
        // Row C in particular: base unstable, terrain check false.
        assert!(result.rows[2].calls[0].base);
        assert!(result.rows[2].calls[0].augmented);
    }

    #[test]
    fn covariates_join_per_observation_date() {
        let result = evaluate(&make_inputs()).unwrap();
        assert_eq!(result.rows[0].wind_ms, Some(9.0));
        assert_eq!(result.rows[1].wind_ms, None);
        let depth = result.rows[0].depth_m.unwrap();
        assert!((depth - 1.0).abs() < 1e-9);
        assert_eq!(result.rows[0].variance_m2, Some(0.0));
        assert_eq!(result.rows[0].cv, Some(0.0));
    }

    #[test]
    fn matrix_margins_cover_every_observation() {
        let result = evaluate(&make_inputs()).unwrap();
        for eval in &result.schemes {
            assert_eq!(eval.plain.total(), 3);
            assert_eq!(eval.augmented.total(), 3);
            assert_eq!(
                eval.plain.support_avalanche() + eval.plain.support_no_avalanche(),
                3
            );
        }
    }

    #[test]
    fn out_of_range_score_aborts_the_run() {
        let mut inputs = make_inputs();
        inputs.observations[1].five_class = 6;
        assert!(evaluate(&inputs).is_err());
    }
}
