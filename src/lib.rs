//! zonecast - a zonal forecasting engine.
//!
//! Forecasts a zonal, segmented quantity (jobs, population, ...) across a
//! multi-year horizon, reconciles the result against externally supplied
//! target totals under a configurable policy, and re-expresses tables
//! between zone systems via fractional split weights.
//!
//! Every component is a pure function over immutable polars DataFrames:
//! no I/O, no shared state, no order sensitivity. Errors surface as
//! [`ForecastError`], never as printed diagnostics.

pub mod aggregation;
pub mod config;
pub mod constraint;
pub mod error;
pub mod growth;
pub mod model;
pub mod schema;
pub mod translation;

#[cfg(feature = "python")]
mod python;

pub use aggregation::{add_total_segment, aggregate_segments, apply_segment_weights};
pub use config::{
    ConstraintArea, ConstraintConfig, ConstraintMethod, ConstraintOn, ConstraintSource,
    ConstraintStages, ForecastConfig, TranslationAggregation,
};
pub use constraint::{resolve_constraint_source, ForecastConstrainer};
pub use error::ForecastError;
pub use growth::{grow_to_future_years, rebase_growth_factors};
pub use model::{ForecastInputs, ForecastModel};
pub use translation::ZoneTranslator;
