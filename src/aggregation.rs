use polars::prelude::*;
use tracing::debug;

use crate::error::ForecastError;

/// Check that every named column exists in the table.
pub(crate) fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), ForecastError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(ForecastError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Check that `key_cols` uniquely identify every row of the table.
pub(crate) fn require_unique_keys(
    df: &DataFrame,
    key_cols: &[&str],
    context: &str,
) -> Result<(), ForecastError> {
    require_columns(df, key_cols)?;

    let duplicated = df
        .clone()
        .lazy()
        .group_by(key_cols.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .agg([len().alias("__key_count")])
        .filter(col("__key_count").gt(lit(1)))
        .collect()?;

    if duplicated.height() > 0 {
        return Err(ForecastError::Validation(format!(
            "{} duplicate {:?} keys in {}",
            duplicated.height(),
            key_cols,
            context,
        )));
    }
    Ok(())
}

/// Project a table onto `group_cols` + `value_cols`, group identical keys
/// and sum the values.
///
/// Order-invariant and idempotent on already-unique-keyed input. Used
/// standalone and by the other components to collapse join-induced
/// duplicates.
pub fn aggregate_segments(
    df: &DataFrame,
    group_cols: &[&str],
    value_cols: &[&str],
) -> Result<DataFrame, ForecastError> {
    require_columns(df, group_cols)?;
    require_columns(df, value_cols)?;

    let group_exprs: Vec<Expr> = group_cols.iter().map(|c| col(*c)).collect();
    let out = df
        .clone()
        .lazy()
        .group_by(group_exprs.clone())
        .agg(value_cols.iter().map(|c| col(*c).sum()).collect::<Vec<_>>())
        .sort_by_exprs(group_exprs, SortMultipleOptions::default())
        .collect()?;

    Ok(out)
}

/// Append an all-segment total row per `group_cols` key, keyed by
/// `total_key` in `segment_col`.
///
/// The total is just another segment key value: one grouped reduce
/// produces every total row, concatenated once.
pub fn add_total_segment(
    df: &DataFrame,
    segment_col: &str,
    total_key: &str,
    group_cols: &[&str],
    value_cols: &[&str],
) -> Result<DataFrame, ForecastError> {
    require_columns(df, &[segment_col])?;
    require_columns(df, group_cols)?;
    require_columns(df, value_cols)?;

    let ordered: Vec<Expr> = group_cols
        .iter()
        .chain(std::iter::once(&segment_col))
        .map(|c| col(*c))
        .chain(value_cols.iter().map(|c| col(*c)))
        .collect();

    let rows = df.clone().lazy().select(ordered.clone());

    let totals = df
        .clone()
        .lazy()
        .group_by(group_cols.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .agg(value_cols.iter().map(|c| col(*c).sum()).collect::<Vec<_>>())
        .with_columns([lit(total_key).alias(segment_col)])
        .select(ordered);

    let sort_exprs: Vec<Expr> = group_cols
        .iter()
        .chain(std::iter::once(&segment_col))
        .map(|c| col(*c))
        .collect();

    let out = concat([rows, totals], UnionArgs::default())?
        .sort_by_exprs(sort_exprs, SortMultipleOptions::default())
        .collect()?;

    Ok(out)
}

/// Convert a segmented quantity into a derived one via segment-keyed
/// weights: join weight rows on `segment_col`, multiply each year column
/// by its weight counterpart, then group-sum onto `group_cols`.
///
/// The join fans out when one segment maps to several weight rows; any
/// extra identifying columns on the weight table (to group the derived
/// quantity by) ride through and may appear in `group_cols`.
pub fn apply_segment_weights(
    values: &DataFrame,
    weights: &DataFrame,
    segment_col: &str,
    group_cols: &[&str],
    value_cols: &[&str],
) -> Result<DataFrame, ForecastError> {
    require_columns(values, &[segment_col])?;
    require_columns(values, value_cols)?;
    require_columns(weights, &[segment_col])?;
    require_columns(weights, value_cols)?;

    // Weight columns other than the join key must not collide with the
    // value table, or the join result would be ambiguous.
    for name in weights.get_column_names_str() {
        if name != segment_col
            && !value_cols.contains(&name)
            && values.column(name).is_ok()
        {
            return Err(ForecastError::Validation(format!(
                "weight column '{}' collides with a value-table column",
                name,
            )));
        }
    }

    // A segment with no weight row would silently drop its rows in the
    // inner join below.
    let weight_keys = weights
        .column(segment_col)?
        .as_materialized_series()
        .clone();
    let unmatched = values
        .clone()
        .lazy()
        .filter(col(segment_col).is_in(lit(weight_keys), false).not())
        .collect()?;
    if unmatched.height() > 0 {
        return Err(ForecastError::Merge(format!(
            "{} value rows have no weight row for '{}'",
            unmatched.height(),
            segment_col,
        )));
    }

    let weight_alias = |year: &str| format!("{year}__weight");

    let old_names: Vec<&str> = value_cols.to_vec();
    let new_names: Vec<String> = value_cols.iter().map(|y| weight_alias(y)).collect();

    let weighted = values
        .clone()
        .lazy()
        .join(
            weights.clone().lazy().rename(&old_names, &new_names, true),
            [col(segment_col)],
            [col(segment_col)],
            JoinArgs::new(JoinType::Inner),
        )
        .with_columns(
            value_cols
                .iter()
                .map(|y| (col(*y) * col(weight_alias(y).as_str())).alias(*y))
                .collect::<Vec<_>>(),
        )
        .collect()?;

    debug!(
        rows_in = values.height(),
        rows_weighted = weighted.height(),
        "applied segment weights"
    );

    aggregate_segments(&weighted, group_cols, value_cols)
}
