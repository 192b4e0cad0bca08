use polars::prelude::*;
use tracing::debug;

use crate::aggregation::require_columns;
use crate::error::ForecastError;

/// Re-express growth factors relative to the base year.
///
/// Growth tables arrive relative to an internal reference year, not
/// necessarily the base year: `factor'(y) = factor(y) / factor(base_year)`.
/// A zero or missing base-year factor is a data-quality condition and
/// substitutes `infill`, never a silent divide-by-zero. The base-year
/// factor column itself becomes 1 by construction.
pub fn rebase_growth_factors(
    growth: &DataFrame,
    base_year: &str,
    future_years: &[&str],
    infill: f64,
) -> Result<DataFrame, ForecastError> {
    require_columns(growth, &[base_year])?;
    require_columns(growth, future_years)?;

    let no_base = col(base_year).eq(lit(0.0)).or(col(base_year).is_null());

    let mut exprs: Vec<Expr> = future_years
        .iter()
        .map(|&year| {
            when(no_base.clone().or(col(year).is_null()))
                .then(lit(infill))
                .otherwise(col(year) / col(base_year))
                .alias(year)
        })
        .collect();
    exprs.push(
        when(no_base)
            .then(lit(infill))
            .otherwise(lit(1.0))
            .alias(base_year),
    );

    let out = growth.clone().lazy().with_columns(exprs).collect()?;
    Ok(out)
}

/// Grow a base-year value table to future years using a growth table.
///
/// The growth table is rebased off `base_year`, then left-joined onto the
/// base table over `join_cols`. A coarser-keyed factor row broadcasts to
/// every finer-grained value row sharing the key; rows with no factor row
/// fall back to `infill`. With `no_neg_growth`, factors and grown values
/// below zero are clipped to zero; without it a negative factor is a
/// Validation failure rather than silent propagation.
///
/// Output: every base-table column unchanged (base year included), plus
/// one computed column per future year.
pub fn grow_to_future_years(
    base: &DataFrame,
    growth: &DataFrame,
    base_year: &str,
    future_years: &[&str],
    join_cols: &[&str],
    infill: f64,
    no_neg_growth: bool,
) -> Result<DataFrame, ForecastError> {
    require_columns(base, join_cols)?;
    require_columns(base, &[base_year])?;
    require_columns(growth, join_cols)?;

    for &year in future_years {
        if base.column(year).is_ok() {
            return Err(ForecastError::Validation(format!(
                "base table already has a column for future year '{}'",
                year,
            )));
        }
    }

    // Duplicate factor keys would fan the join out; that is never an
    // implicit cartesian product.
    let duplicated = growth
        .clone()
        .lazy()
        .group_by(join_cols.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .agg([len().alias("__key_count")])
        .filter(col("__key_count").gt(lit(1)))
        .collect()?;
    if duplicated.height() > 0 {
        return Err(ForecastError::Merge(format!(
            "{} duplicate {:?} keys in growth table",
            duplicated.height(),
            join_cols,
        )));
    }

    let mut needed: Vec<&str> = join_cols.to_vec();
    needed.push(base_year);
    needed.extend_from_slice(future_years);
    let factors = rebase_growth_factors(&growth.select(needed)?, base_year, future_years, infill)?;

    if !no_neg_growth {
        for &year in future_years {
            let min = factors.column(year)?.f64()?.min().unwrap_or(0.0);
            if min < 0.0 {
                return Err(ForecastError::Validation(format!(
                    "negative growth factor for year '{}'",
                    year,
                )));
            }
        }
    }

    // Keep only the rebased future-year factors; the base table carries
    // the base-year values.
    let mut factor_cols: Vec<&str> = join_cols.to_vec();
    factor_cols.extend_from_slice(future_years);
    let factors = factors.select(factor_cols)?;

    let join_exprs: Vec<Expr> = join_cols.iter().map(|c| col(*c)).collect();
    let mut lazy = base.clone().lazy().join(
        factors.lazy(),
        join_exprs.clone(),
        join_exprs,
        JoinArgs::new(JoinType::Left),
    );

    // Rows with no factor row get the infill factor.
    lazy = lazy.with_columns(
        future_years
            .iter()
            .map(|&y| col(y).fill_null(lit(infill)))
            .collect::<Vec<_>>(),
    );

    if no_neg_growth {
        lazy = lazy.with_columns(
            future_years
                .iter()
                .map(|&y| {
                    when(col(y).lt(lit(0.0)))
                        .then(lit(0.0))
                        .otherwise(col(y))
                        .alias(y)
                })
                .collect::<Vec<_>>(),
        );
    }

    lazy = lazy.with_columns(
        future_years
            .iter()
            .map(|&y| (col(y) * col(base_year)).alias(y))
            .collect::<Vec<_>>(),
    );

    if no_neg_growth {
        lazy = lazy.with_columns(
            future_years
                .iter()
                .map(|&y| {
                    when(col(y).lt(lit(0.0)))
                        .then(lit(0.0))
                        .otherwise(col(y))
                        .alias(y)
                })
                .collect::<Vec<_>>(),
        );
    }

    let grown = lazy.collect()?;

    if grown.height() != base.height() {
        return Err(ForecastError::Merge(format!(
            "growth join changed the row count: {} -> {}",
            base.height(),
            grown.height(),
        )));
    }

    debug!(
        rows = grown.height(),
        years = future_years.len(),
        "grew base table to future years"
    );

    Ok(grown)
}
