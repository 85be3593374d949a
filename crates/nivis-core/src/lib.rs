//! Core library for evaluating ordinal snow-instability classification
//! schemes against observed avalanche activity.
//!
//! One run ingests three datasets (snowpit field observations, a gridded
//! snow-depth cube, a daily wind series), derives spatial-temporal
//! covariates per observation (interpolated depth, 3×3 window variance,
//! coefficient of variation, wind speed), binarizes each ordinal scheme
//! into an unstable/stable call, optionally ORs in the terrain check, and
//! scores every variant against observed avalanche activity.

pub mod coords;
pub mod dates;
pub mod depth;
pub mod features;
pub mod ingest;
pub mod pipeline;
pub mod schemes;
pub mod scoring;
pub mod terrain;

pub use depth::DepthGrid;
pub use ingest::{Observation, WindSeries};
pub use pipeline::{evaluate, EvalInputs, Evaluation};
pub use schemes::Scheme;
