//! Dataset loaders: semicolon-delimited CSV exports for the snowpit field
//! observations and the daily wind measurements, and the JSON serialization
//! of the gridded depth cube.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::coords::Lv03;
use crate::dates::{parse_day_first, DateParseError};
use crate::depth::{DepthGrid, GridError};
use crate::schemes::Scheme;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {path}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("malformed depth cube JSON in {path}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{column} value {value:?} is not numeric (record {record})")]
    Numeric {
        column: &'static str,
        value: String,
        record: usize,
    },
    #[error(transparent)]
    Date(#[from] DateParseError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// One snowpit observation, normalized to LV95 coordinates and a calendar
/// day at load time.
#[derive(Debug, Clone)]
pub struct Observation {
    pub date: NaiveDate,
    /// Easting, m (LV95).
    pub e: f64,
    /// Northing, m (LV95).
    pub n: f64,
    pub five_class: u8,
    pub techel: u8,
    pub three_class: u8,
    /// Ground truth: avalanche activity observed on the date.
    pub avalanche: bool,
}

impl Observation {
    /// Raw ordinal score for the given scheme.
    pub fn score(&self, scheme: Scheme) -> u8 {
        match scheme {
            Scheme::FiveClass => self.five_class,
            Scheme::FourClassTechel => self.techel,
            Scheme::ThreeClassSum => self.three_class,
        }
    }
}

/// Raw field-observation row as exported; columns keep the source headers.
#[derive(Debug, Deserialize)]
struct FieldRecord {
    #[serde(rename = "Date_time")]
    date_time: String,
    #[serde(rename = "X-Coordinate (m)")]
    x_m: String,
    #[serde(rename = "Y-Coordinate (m)")]
    y_m: String,
    #[serde(rename = "5-class_Stability")]
    five_class: String,
    #[serde(rename = "4-class_Stability [Techel]")]
    techel: String,
    #[serde(rename = "3-class_Stability [sum S2008: 1+2+3]")]
    three_class: String,
    #[serde(rename = "Avalanche_activity")]
    avalanche: String,
}

impl FieldRecord {
    fn is_blank(&self) -> bool {
        [
            &self.date_time,
            &self.x_m,
            &self.y_m,
            &self.five_class,
            &self.techel,
            &self.three_class,
            &self.avalanche,
        ]
        .iter()
        .all(|field| field.trim().is_empty())
    }
}

/// Load the snowpit observation table. Coordinates arrive in LV03 and are
/// converted to LV95; date-times are truncated to calendar days; rows with
/// every field empty are skipped.
pub fn load_observations(path: &Path) -> Result<Vec<Observation>, IngestError> {
    let observations = read_observations(open(path)?, path)?;
    log::info!(
        "loaded {} snowpit observations from {}",
        observations.len(),
        path.display()
    );
    Ok(observations)
}

fn read_observations(reader: impl Read, path: &Path) -> Result<Vec<Observation>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(BufReader::new(reader));

    let mut observations = Vec::new();
    for (record, row) in csv_reader.deserialize::<FieldRecord>().enumerate() {
        let raw = row.map_err(|source| IngestError::Csv {
            path: path.display().to_string(),
            source,
        })?;
        if raw.is_blank() {
            continue;
        }

        let date = parse_day_first(&raw.date_time)?;
        let site = Lv03::new(
            parse_f64("X-Coordinate (m)", &raw.x_m, record)?,
            parse_f64("Y-Coordinate (m)", &raw.y_m, record)?,
        )
        .to_lv95();

        observations.push(Observation {
            date,
            e: site.e,
            n: site.n,
            five_class: parse_score("5-class_Stability", &raw.five_class, record)?,
            techel: parse_score("4-class_Stability [Techel]", &raw.techel, record)?,
            three_class: parse_score("3-class_Stability [sum S2008: 1+2+3]", &raw.three_class, record)?,
            avalanche: parse_f64("Avalanche_activity", &raw.avalanche, record)? == 1.0,
        });
    }
    Ok(observations)
}

/// Daily mean wind speed keyed by calendar day. Absent dates yield no
/// value, not an error.
#[derive(Debug, Clone, Default)]
pub struct WindSeries {
    by_date: BTreeMap<NaiveDate, f64>,
}

impl WindSeries {
    pub fn at(&self, date: NaiveDate) -> Option<f64> {
        self.by_date.get(&date).copied()
    }

    pub fn insert(&mut self, date: NaiveDate, speed_ms: f64) {
        self.by_date.insert(date, speed_ms);
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

/// Raw wind-station row; `fkl010d0` is the daily mean wind speed in m/s.
#[derive(Debug, Deserialize)]
struct WindRecord {
    #[serde(rename = "reference_timestamp")]
    timestamp: String,
    #[serde(rename = "fkl010d0")]
    wind_speed: String,
}

/// Load the daily wind series. Empty measurement cells are gaps in the
/// station record and produce no entry; non-numeric cells are errors.
pub fn load_wind_series(path: &Path) -> Result<WindSeries, IngestError> {
    let series = read_wind_series(open(path)?, path)?;
    log::info!(
        "loaded {} daily wind measurements from {}",
        series.len(),
        path.display()
    );
    Ok(series)
}

fn read_wind_series(reader: impl Read, path: &Path) -> Result<WindSeries, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(BufReader::new(reader));

    let mut series = WindSeries::default();
    for (record, row) in csv_reader.deserialize::<WindRecord>().enumerate() {
        let raw = row.map_err(|source| IngestError::Csv {
            path: path.display().to_string(),
            source,
        })?;
        if raw.wind_speed.trim().is_empty() {
            continue;
        }
        let date = parse_day_first(&raw.timestamp)?;
        series.insert(date, parse_f64("fkl010d0", &raw.wind_speed, record)?);
    }
    Ok(series)
}

/// Load and validate the gridded depth cube from its JSON serialization.
pub fn load_depth_grid(path: &Path) -> Result<DepthGrid, IngestError> {
    let grid: DepthGrid = serde_json::from_reader(BufReader::new(open(path)?)).map_err(
        |source| IngestError::Json {
            path: path.display().to_string(),
            source,
        },
    )?;
    grid.validate()?;
    log::info!(
        "loaded depth cube ({} dates × {} × {} cells) from {}",
        grid.dates.len(),
        grid.northings.len(),
        grid.eastings.len(),
        path.display()
    );
    Ok(grid)
}

fn open(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_f64(column: &'static str, value: &str, record: usize) -> Result<f64, IngestError> {
    value.trim().parse::<f64>().map_err(|_| IngestError::Numeric {
        column,
        value: value.to_string(),
        record,
    })
}

/// Ordinal scores may arrive integer- or float-formatted ("3" or "3.0").
fn parse_score(column: &'static str, value: &str, record: usize) -> Result<u8, IngestError> {
    let trimmed = value.trim();
    if let Ok(score) = trimmed.parse::<u8>() {
        return Ok(score);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && (0.0..=255.0).contains(&v) => Ok(v as u8),
        _ => Err(IngestError::Numeric {
            column,
            value: value.to_string(),
            record,
        }),
    }
}
