use polars::prelude::*;
use tracing::{debug, warn};

use crate::aggregation::require_columns;
use crate::config::TranslationAggregation;
use crate::error::ForecastError;
use crate::schema::{translation, zone};

/// Per-source split fractions must sum to 1 within this tolerance.
pub const SPLIT_TOLERANCE: f64 = 1e-4;

/// Re-keys and apportions a value table from one zone system to another
/// via fractional split weights.
///
/// Many-to-many, coarse-to-fine and fine-to-coarse translations are all
/// instances of the same weighted join. When the per-source fractions
/// fail conservation, the default policy renormalizes them (warn-logged);
/// with `renormalize = false` the violation is a Translation failure.
pub struct ZoneTranslator {
    renormalize: bool,
}

impl Default for ZoneTranslator {
    fn default() -> Self {
        Self { renormalize: true }
    }
}

impl ZoneTranslator {
    pub fn new(renormalize: bool) -> Self {
        Self { renormalize }
    }

    /// Translate `values` through the weight edges.
    ///
    /// `non_split_cols` are identifying columns carried through unchanged
    /// (the zone column itself is re-keyed and may be listed or not);
    /// every other column is split-eligible, multiplied by the fraction
    /// and recombined per `aggregation` - sum for additive quantities,
    /// mean for ratios and factors.
    pub fn run(
        &self,
        values: &DataFrame,
        weights: &DataFrame,
        non_split_cols: &[&str],
        aggregation: TranslationAggregation,
    ) -> Result<DataFrame, ForecastError> {
        require_columns(values, &[zone::ZONE_ID])?;
        require_columns(values, non_split_cols)?;
        require_columns(weights, &translation::ALL)?;

        for name in [translation::TO_ZONE_ID, translation::SPLIT_FRACTION] {
            if values.column(name).is_ok() {
                return Err(ForecastError::Validation(format!(
                    "value table column '{}' collides with the weight schema",
                    name,
                )));
            }
        }

        let weights = self.checked_weights(weights)?;

        // A source zone with no edge would silently lose its mass in the
        // join below.
        let from_zones = weights
            .column(translation::FROM_ZONE_ID)?
            .as_materialized_series()
            .clone();
        let unmatched = values
            .clone()
            .lazy()
            .filter(col(zone::ZONE_ID).is_in(lit(from_zones), false).not())
            .collect()?;
        if unmatched.height() > 0 {
            return Err(ForecastError::Translation(format!(
                "{} value rows have no translation edge",
                unmatched.height(),
            )));
        }

        let retained: Vec<&str> = non_split_cols
            .iter()
            .filter(|c| **c != zone::ZONE_ID)
            .copied()
            .collect();
        let value_cols: Vec<String> = values
            .get_column_names_str()
            .iter()
            .filter(|c| **c != zone::ZONE_ID && !retained.contains(*c))
            .map(|c| c.to_string())
            .collect();

        let group_exprs: Vec<Expr> = std::iter::once(col(translation::TO_ZONE_ID).alias(zone::ZONE_ID))
            .chain(retained.iter().map(|c| col(*c)))
            .collect();
        let agg_exprs: Vec<Expr> = value_cols
            .iter()
            .map(|c| match aggregation {
                TranslationAggregation::Sum => col(c.as_str()).sum(),
                TranslationAggregation::Mean => col(c.as_str()).mean(),
            })
            .collect();
        let sort_exprs: Vec<Expr> = std::iter::once(col(zone::ZONE_ID))
            .chain(retained.iter().map(|c| col(*c)))
            .collect();

        // The fan-out is declared: every source row joins every edge
        // sharing its zone.
        let out = values
            .clone()
            .lazy()
            .join(
                weights.lazy().select([
                    col(translation::FROM_ZONE_ID),
                    col(translation::TO_ZONE_ID),
                    col(translation::SPLIT_FRACTION),
                ]),
                [col(zone::ZONE_ID)],
                [col(translation::FROM_ZONE_ID)],
                JoinArgs::new(JoinType::Inner),
            )
            .with_columns(
                value_cols
                    .iter()
                    .map(|c| (col(c.as_str()) * col(translation::SPLIT_FRACTION)).alias(c.as_str()))
                    .collect::<Vec<_>>(),
            )
            .group_by(group_exprs)
            .agg(agg_exprs)
            .sort_by_exprs(sort_exprs, SortMultipleOptions::default())
            .collect()?;

        debug!(
            rows_in = values.height(),
            rows_out = out.height(),
            "translated table to target zone system"
        );

        Ok(out)
    }

    /// Validate fraction range and per-source conservation, renormalizing
    /// when allowed.
    fn checked_weights(&self, weights: &DataFrame) -> Result<DataFrame, ForecastError> {
        let min = weights
            .column(translation::SPLIT_FRACTION)?
            .f64()?
            .min()
            .unwrap_or(0.0);
        if min < 0.0 {
            return Err(ForecastError::Validation(
                "split fractions must lie in [0, 1]".to_string(),
            ));
        }

        let split_sums = weights
            .clone()
            .lazy()
            .group_by([col(translation::FROM_ZONE_ID)])
            .agg([col(translation::SPLIT_FRACTION).sum().alias("__split_sum")])
            .collect()?;

        let zero_sums = split_sums
            .clone()
            .lazy()
            .filter(col("__split_sum").lt_eq(lit(0.0)))
            .collect()?;
        if zero_sums.height() > 0 {
            return Err(ForecastError::Translation(format!(
                "{} source zones have an all-zero split",
                zero_sums.height(),
            )));
        }

        let unconserved = split_sums
            .lazy()
            .filter(
                col("__split_sum")
                    .gt(lit(1.0 + SPLIT_TOLERANCE))
                    .or(col("__split_sum").lt(lit(1.0 - SPLIT_TOLERANCE))),
            )
            .collect()?;
        if unconserved.height() == 0 {
            return Ok(weights.clone());
        }
        if !self.renormalize {
            return Err(ForecastError::Translation(format!(
                "split fractions for {} source zones do not sum to 1",
                unconserved.height(),
            )));
        }

        warn!(
            zones = unconserved.height(),
            "renormalizing split fractions that do not sum to 1"
        );
        let renormalized = weights
            .clone()
            .lazy()
            .with_columns([(col(translation::SPLIT_FRACTION)
                / col(translation::SPLIT_FRACTION)
                    .sum()
                    .over([col(translation::FROM_ZONE_ID)]))
            .alias(translation::SPLIT_FRACTION)])
            .collect()?;
        Ok(renormalized)
    }
}
