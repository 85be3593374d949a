//! Chart renderer — writes per-scheme confusion-matrix heatmaps and the
//! terrain-impact grouped bar chart as PNGs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use nivis_core::ingest::{load_depth_grid, load_observations, load_wind_series};
use nivis_core::pipeline::{evaluate, EvalInputs, SchemeEvaluation};
use nivis_core::scoring::ConfusionMatrix;

#[derive(Parser, Debug)]
#[command(
    name = "visualize",
    about = "Render confusion heatmaps and the terrain-impact chart"
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

    /// Output directory for rendered PNGs.
    #[arg(short, long, default_value = "data/charts")]
    output: PathBuf,
}

const TAB_BLUE: RGBColor = RGBColor(31, 119, 180);
const TAB_ORANGE: RGBColor = RGBColor(255, 127, 14);

/// Sequential white → dark blue ramp for heatmap cells.
fn blues(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |lo: f64, hi: f64| (lo + (hi - lo) * t) as u8;
    RGBColor(lerp(247.0, 8.0), lerp(251.0, 48.0), lerp(255.0, 107.0))
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

    let inputs = EvalInputs {
        grid,
        wind,
        observations,
    };
    let result = evaluate(&inputs).context("evaluating schemes")?;
    log::info!("rendering charts for {} schemes", result.schemes.len());

    fs::create_dir_all(&args.output)
        .with_context(|| format!("cannot create {}", args.output.display()))?;

    for eval in &result.schemes {
        let plain_path = args.output.join(format!("cm_{}.png", eval.scheme.slug()));
        draw_heatmap(&plain_path, eval.scheme.label(), &eval.plain)?;
        println!("Wrote {}", plain_path.display());

        let terrain_path = args
            .output
            .join(format!("cm_{}_terrain.png", eval.scheme.slug()));
        let title = format!("{} + terrain check", eval.scheme.label());
        draw_heatmap(&terrain_path, &title, &eval.augmented)?;
        println!("Wrote {}", terrain_path.display());
    }

    let impact_path = args.output.join("terrain_impact.png");
    draw_impact_chart(&impact_path, &result.schemes)?;
    println!("Wrote {}", impact_path.display());

    Ok(())
}

// ── Confusion-matrix heatmap ──────────────────────────────────────────────────

const HM_SIZE: (u32, u32) = (640, 520);
const CELL_W: i32 = 210;
const CELL_H: i32 = 180;
const ORIGIN: (i32, i32) = (180, 90);

fn draw_heatmap(path: &Path, title: &str, cm: &ConfusionMatrix) -> Result<()> {
    let root = BitMapBackend::new(path, HM_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let centered = |size: u32, color: RGBColor| {
        ("sans-serif", size)
            .into_font()
            .color(&color)
            .pos(Pos::new(HPos::Center, VPos::Center))
    };

    root.draw(&Text::new(
        title.to_string(),
        (HM_SIZE.0 as i32 / 2, 30),
        centered(24, BLACK),
    ))?;

    let rows = cm.rows();
    let max = rows.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;

    for (r, row) in rows.iter().enumerate() {
        for (c, &count) in row.iter().enumerate() {
            let x0 = ORIGIN.0 + c as i32 * CELL_W;
            let y0 = ORIGIN.1 + r as i32 * CELL_H;
            let shade = count as f64 / max;
            root.draw(&Rectangle::new(
                [(x0, y0), (x0 + CELL_W, y0 + CELL_H)],
                blues(shade).filled(),
            ))?;
            root.draw(&Rectangle::new(
                [(x0, y0), (x0 + CELL_W, y0 + CELL_H)],
                BLACK.mix(0.4),
            ))?;

            let ink = if shade > 0.5 { WHITE } else { BLACK };
            root.draw(&Text::new(
                count.to_string(),
                (x0 + CELL_W / 2, y0 + CELL_H / 2),
                centered(28, ink),
            ))?;
        }
    }

    for (c, label) in ["predicted unstable", "predicted stable"].iter().enumerate() {
        root.draw(&Text::new(
            label.to_string(),
            (ORIGIN.0 + c as i32 * CELL_W + CELL_W / 2, ORIGIN.1 - 18),
            centered(15, BLACK),
        ))?;
    }
    for (r, label) in ["avalanche", "no avalanche"].iter().enumerate() {
        root.draw(&Text::new(
            label.to_string(),
            (ORIGIN.0 - 88, ORIGIN.1 + r as i32 * CELL_H + CELL_H / 2),
            centered(15, BLACK),
        ))?;
    }

    root.present()?;
    Ok(())
}

// ── Terrain-impact grouped bars ───────────────────────────────────────────────

fn draw_impact_chart(path: &Path, schemes: &[SchemeEvaluation]) -> Result<()> {
    let root = BitMapBackend::new(path, (700, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let top = schemes
        .iter()
        .flat_map(|e| [e.impact.reduction_pct, e.impact.introduction_pct])
        .fold(1.0f64, f64::max);
    let y_max = top * 1.18;
    let y_min = -top * 0.12;

    let mut chart = ChartBuilder::on(&root)
        .caption("Terrain check impact on stability schemes", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(10)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..schemes.len() as f64, y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_x_axis()
        .y_desc("Percentage")
        .draw()?;

    const BAR_W: f64 = 0.35;
    let centered = |size: u32| {
        ("sans-serif", size)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center))
    };

    chart
        .draw_series(schemes.iter().enumerate().map(|(i, eval)| {
            let xc = i as f64 + 0.5;
            Rectangle::new(
                [(xc - BAR_W, 0.0), (xc, eval.impact.reduction_pct)],
                TAB_BLUE.filled(),
            )
        }))?
        .label("Reduction (%)")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], TAB_BLUE.filled()));

    chart
        .draw_series(schemes.iter().enumerate().map(|(i, eval)| {
            let xc = i as f64 + 0.5;
            Rectangle::new(
                [(xc, 0.0), (xc + BAR_W, eval.impact.introduction_pct)],
                TAB_ORANGE.filled(),
            )
        }))?
        .label("Introduction (%)")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], TAB_ORANGE.filled()));

    // Value annotations above each bar, group labels beneath the baseline.
    for (i, eval) in schemes.iter().enumerate() {
        let xc = i as f64 + 0.5;
        for (offset, value) in [
            (-BAR_W / 2.0, eval.impact.reduction_pct),
            (BAR_W / 2.0, eval.impact.introduction_pct),
        ] {
            chart.draw_series(std::iter::once(Text::new(
                format!("{value:.2}%"),
                (xc + offset, value + top * 0.04),
                centered(13),
            )))?;
        }
        chart.draw_series(std::iter::once(Text::new(
            eval.scheme.label().to_string(),
            (xc, y_min / 2.0),
            centered(14),
        )))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.4))
        .draw()?;

    root.present()?;
    Ok(())
}
