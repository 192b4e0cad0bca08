use polars::prelude::*;
use tracing::{debug, info};

use crate::aggregation::{aggregate_segments, require_columns, require_unique_keys};
use crate::config::{ConstraintSource, ForecastConfig};
use crate::constraint::{resolve_constraint_source, ForecastConstrainer};
use crate::error::ForecastError;
use crate::growth::grow_to_future_years;
use crate::schema::zone;

/// Input tables for one forecast run.
///
/// Everything is borrowed and in-memory; ingestion, path handling and
/// persistence belong to the orchestration layer around the engine.
#[derive(Default)]
pub struct ForecastInputs<'a> {
    /// Base-year values: zone + segmentation + one base-year column.
    pub base: Option<&'a DataFrame>,
    /// Growth factors keyed by zone.
    pub growth: Option<&'a DataFrame>,
    /// Externally supplied targets (required for source Default).
    pub constraint_totals: Option<&'a DataFrame>,
    /// Zone -> designated-area mask (required for area Designated).
    pub designated_area: Option<&'a DataFrame>,
    /// Grown table from an earlier run (required for source ModelGrownBase).
    pub model_grown_base: Option<&'a DataFrame>,
    /// Development log. Integration is unimplemented upstream; supplying
    /// one is rejected rather than guessed at.
    pub development_log: Option<&'a DataFrame>,
}

/// Composes the pipeline: grow the base table, resolve the constraint
/// source, run the reconciliation stages that are switched on, then
/// collapse back to zone x segmentation.
pub struct ForecastModel {
    config: ForecastConfig,
}

impl ForecastModel {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn run(&self, inputs: ForecastInputs<'_>) -> Result<DataFrame, ForecastError> {
        let cfg = &self.config;
        let all_years_owned = cfg.all_years();
        let all_years: Vec<&str> = all_years_owned.iter().map(String::as_str).collect();
        let future_years: Vec<&str> = cfg.future_years.iter().map(String::as_str).collect();

        let base = inputs
            .base
            .ok_or_else(|| ForecastError::Validation("a base table is required".to_string()))?;
        let growth = inputs
            .growth
            .ok_or_else(|| ForecastError::Validation("a growth table is required".to_string()))?;

        let mut key_cols: Vec<&str> = vec![zone::ZONE_ID];
        key_cols.extend(cfg.segmentation_cols.iter().map(String::as_str));
        require_columns(base, &key_cols)?;
        require_unique_keys(base, &key_cols, "base table")?;

        if inputs.development_log.is_some() {
            return Err(ForecastError::Validation(
                "development log integration has not been implemented".to_string(),
            ));
        }

        let grown = grow_to_future_years(
            base,
            growth,
            &cfg.base_year,
            &future_years,
            &[zone::ZONE_ID],
            cfg.infill,
            cfg.no_neg_growth,
        )?;

        let ccfg = &cfg.constraint;
        let mut result = grown;

        if ccfg.stages.initial && ccfg.source != ConstraintSource::ModelGrownBase {
            let totals = resolve_constraint_source(
                ccfg.source,
                inputs.constraint_totals,
                &result,
                inputs.model_grown_base,
                &all_years,
            )?;
            let constrainer = ForecastConstrainer::new(ccfg.method, ccfg.area, ccfg.on);
            result = constrainer.run(
                &result,
                &totals,
                inputs.designated_area,
                &cfg.base_year,
                &all_years,
            )?;
        } else if ccfg.source == ConstraintSource::ModelGrownBase {
            debug!("model-grown-base source seeds a later stage; skipping the initial constraint");
        }

        if ccfg.stages.post_development {
            // Without a development log there is nothing new to reconcile.
            debug!("no development log supplied; skipping the post-development constraint");
        }

        // Collapse any join-induced duplicates and fix the column set to
        // keys + horizon years.
        let result = aggregate_segments(&result, &key_cols, &all_years)?;

        for &year in &all_years {
            let total = result
                .column(year)
                .ok()
                .and_then(|c| c.f64().ok())
                .and_then(|c| c.sum())
                .unwrap_or(0.0);
            info!(year, total, "forecast total");
        }

        Ok(result)
    }
}
