//! Gridded snow-depth cube: a regular time × northing × easting lattice.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Nominal spatial grid step in metres, identical on both axes.
pub const NOMINAL_STEP_M: f64 = 1000.0;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("value count {values} does not match {dates} dates × {rows} northings × {cols} eastings")]
    Shape {
        values: usize,
        dates: usize,
        rows: usize,
        cols: usize,
    },
    #[error("{axis} axis spacing is {found} m, expected the nominal {expected} m step")]
    Spacing {
        axis: &'static str,
        found: f64,
        expected: f64,
    },
    #[error("{axis} axis must be ascending with at least two coordinates")]
    Axis { axis: &'static str },
    #[error("date axis must be strictly ascending")]
    Dates,
}

/// Snow depth in metres over a regular 3-D lattice.
///
/// Values are stored row-major per date slice: rows follow the northing
/// axis, columns the easting axis. Cells are nullable; a missing cell is
/// `None`, never a NaN sentinel. Coordinate math uses f64; depth values
/// use f32.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthGrid {
    /// Strictly ascending calendar days covered by the cube.
    pub dates: Vec<NaiveDate>,
    /// Ascending easting coordinates (m), regular spacing.
    pub eastings: Vec<f64>,
    /// Ascending northing coordinates (m), regular spacing.
    pub northings: Vec<f64>,
    /// Depth values in metres; `None` where the source cell is missing.
    pub values: Vec<Option<f32>>,
}

impl DepthGrid {
    /// Check the cube shape and the regular-spacing invariant on both
    /// spatial axes. Sampling assumes a validated grid.
    pub fn validate(&self) -> Result<(), GridError> {
        let (dates, rows, cols) = (self.dates.len(), self.northings.len(), self.eastings.len());
        if self.values.len() != dates * rows * cols {
            return Err(GridError::Shape {
                values: self.values.len(),
                dates,
                rows,
                cols,
            });
        }
        if !self.dates.windows(2).all(|w| w[0] < w[1]) {
            return Err(GridError::Dates);
        }
        for (axis, coords) in [("easting", &self.eastings), ("northing", &self.northings)] {
            let step = axis_step(coords, axis)?;
            if (step - NOMINAL_STEP_M).abs() > 1e-6 {
                return Err(GridError::Spacing {
                    axis,
                    found: step,
                    expected: NOMINAL_STEP_M,
                });
            }
        }
        Ok(())
    }

    /// Exact-date 2-D view into the cube. `None` when the cube does not
    /// cover `date`.
    pub fn slice(&self, date: NaiveDate) -> Option<DepthSlice<'_>> {
        let t = self.dates.binary_search(&date).ok()?;
        Some(DepthSlice { grid: self, t })
    }

    #[inline]
    fn cell(&self, t: usize, row: usize, col: usize) -> Option<f32> {
        self.values[(t * self.northings.len() + row) * self.eastings.len() + col]
    }
}

/// Median of consecutive axis differences, as a robust spacing estimate.
fn axis_step(coords: &[f64], axis: &'static str) -> Result<f64, GridError> {
    if coords.len() < 2 || !coords.windows(2).all(|w| w[1] > w[0]) {
        return Err(GridError::Axis { axis });
    }
    let mut diffs: Vec<f64> = coords.windows(2).map(|w| w[1] - w[0]).collect();
    diffs.sort_by(f64::total_cmp);
    Ok(diffs[diffs.len() / 2])
}

/// A single-date view into the cube.
#[derive(Debug, Clone, Copy)]
pub struct DepthSlice<'a> {
    grid: &'a DepthGrid,
    t: usize,
}

impl DepthSlice<'_> {
    pub fn date(&self) -> NaiveDate {
        self.grid.dates[self.t]
    }

    /// Sample depth at (e, n) using bilinear interpolation over the
    /// enclosing cell.
    ///
    /// Returns `None` outside the grid domain, or when any corner of the
    /// enclosing cell is missing: a missing corner contaminates the linear
    /// interpolation regardless of its weight.
    pub fn sample(&self, e: f64, n: f64) -> Option<f64> {
        let g = self.grid;
        let fx = fractional_index(&g.eastings, e)?;
        let fy = fractional_index(&g.northings, n)?;

        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(g.eastings.len() - 1);
        let y1 = (y0 + 1).min(g.northings.len() - 1);

        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;

        let v00 = f64::from(g.cell(self.t, y0, x0)?);
        let v10 = f64::from(g.cell(self.t, y0, x1)?);
        let v01 = f64::from(g.cell(self.t, y1, x0)?);
        let v11 = f64::from(g.cell(self.t, y1, x1)?);

        Some(
            v00 * (1.0 - tx) * (1.0 - ty)
                + v10 * tx * (1.0 - ty)
                + v01 * (1.0 - tx) * ty
                + v11 * tx * ty,
        )
    }
}

/// Fractional index of `coord` on an ascending regular axis; `None` outside
/// the axis domain.
fn fractional_index(coords: &[f64], coord: f64) -> Option<f64> {
    let first = *coords.first()?;
    let last = *coords.last()?;
    if coord < first || coord > last {
        return None;
    }
    if coords.len() == 1 {
        return Some(0.0);
    }
    let step = (last - first) / (coords.len() - 1) as f64;
    Some((coord - first) / step)
}
