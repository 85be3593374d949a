//! Scheme evaluation runner: loads the three datasets, runs the pipeline
//! and prints per-scheme confusion matrices, classification reports and
//! terrain-impact tables to stdout.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use nivis_core::ingest::{load_depth_grid, load_observations, load_wind_series};
use nivis_core::pipeline::{evaluate, EvalInputs, SchemeEvaluation};
use nivis_core::scoring::{ClassMetrics, ClassificationReport, ConfusionMatrix};

#[derive(Parser, Debug)]
#[command(
    name = "evaluate",
    about = "Evaluate snow instability schemes against observed avalanche activity"
)]
struct Args {
    /// Semicolon-delimited snowpit field observation CSV.
    #[arg(short, long, default_value = "data/snow_instability_field_data.csv")]
    field_data: PathBuf,

    /// JSON depth cube (time × northing × easting).
    #[arg(short, long, default_value = "data/depth_grid.json")]
    depth_grid: PathBuf,

    /// Semicolon-delimited daily wind measurement CSV.
    #[arg(short, long, default_value = "data/wind_daily.csv")]
    wind: PathBuf,

    /// Fail unless exactly this many observations are loaded.
    #[arg(long)]
    expect_rows: Option<usize>,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let grid = load_depth_grid(&args.depth_grid)
        .with_context(|| format!("loading depth cube {}", args.depth_grid.display()))?;
    let wind = load_wind_series(&args.wind)
        .with_context(|| format!("loading wind series {}", args.wind.display()))?;
    let observations = load_observations(&args.field_data)
        .with_context(|| format!("loading field observations {}", args.field_data.display()))?;

    if let Some(expected) = args.expect_rows {
        if observations.len() != expected {
            bail!(
                "expected {expected} observations, loaded {}",
                observations.len()
            );
        }
    }

    let inputs = EvalInputs {
        grid,
        wind,
        observations,
    };
    let result = evaluate(&inputs).context("evaluating schemes")?;
    log::info!(
        "scored {} schemes over {} observations",
        result.schemes.len(),
        result.rows.len()
    );

    for eval in &result.schemes {
        print_scheme(eval);
    }
    print_impact_summary(&result.schemes);

    Ok(())
}

fn print_scheme(eval: &SchemeEvaluation) {
    println!();
    println!(
        "{} — confusion matrix (rows = actual, cols = predicted)",
        eval.scheme.label()
    );
    print_matrix(&eval.plain);
    print_report(&eval.plain_report);

    println!("with terrain check:");
    print_matrix(&eval.augmented);
    print_report(&eval.augmented_report);
}

fn print_matrix(cm: &ConfusionMatrix) {
    println!("{:>14} {:>10} {:>10}", "", "unstable", "stable");
    println!("{:>14} {:>10} {:>10}", "avalanche", cm.hits, cm.false_stables);
    println!(
        "{:>14} {:>10} {:>10}",
        "no avalanche", cm.false_alarms, cm.correct_stables
    );
    println!();
}

fn print_report(report: &ClassificationReport) {
    println!(
        "{:>14} {:>10} {:>8} {:>10} {:>9}",
        "", "precision", "recall", "f1-score", "support"
    );
    print_metrics_row("avalanche", &report.avalanche);
    print_metrics_row("no avalanche", &report.no_avalanche);
    println!(
        "{:>14} {:>10} {:>8} {:>10.2} {:>9}",
        "accuracy", "", "", report.accuracy, report.macro_avg.support
    );
    print_metrics_row("macro avg", &report.macro_avg);
    print_metrics_row("weighted avg", &report.weighted_avg);
    println!();
}

fn print_metrics_row(label: &str, metrics: &ClassMetrics) {
    println!(
        "{:>14} {:>10.2} {:>8.2} {:>10.2} {:>9}",
        label, metrics.precision, metrics.recall, metrics.f1, metrics.support
    );
}

fn print_impact_summary(schemes: &[SchemeEvaluation]) {
    println!("terrain check impact");
    println!(
        "{:>28} {:>9} {:>9} {:>10} {:>12} {:>10} {:>10} {:>13} {:>15}",
        "scheme",
        "miss old",
        "miss new",
        "reduction",
        "reduction %",
        "alarm old",
        "alarm new",
        "introduction",
        "introduction %"
    );
    for eval in schemes {
        let impact = &eval.impact;
        println!(
            "{:>28} {:>9} {:>9} {:>10} {:>11.2}% {:>10} {:>10} {:>13} {:>14.2}%",
            eval.scheme.label(),
            impact.false_stables_old,
            impact.false_stables_new,
            impact.reduction,
            impact.reduction_pct,
            impact.false_alarms_old,
            impact.false_alarms_new,
            impact.introduction,
            impact.introduction_pct
        );
    }
}
