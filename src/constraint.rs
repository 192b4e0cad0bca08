use polars::prelude::*;
use tracing::{debug, info};

use crate::aggregation::{aggregate_segments, require_columns, require_unique_keys};
use crate::config::{ConstraintArea, ConstraintMethod, ConstraintOn, ConstraintSource};
use crate::error::ForecastError;
use crate::schema::{designated, zone};

/// Post-reconciliation scoped sums land on their targets within this.
pub const CONSTRAINT_TOLERANCE: f64 = 1e-10;

const SCOPE_COL: &str = "__scope_group";
const TARGET_SUFFIX: &str = "__target";

fn target_alias(year: &str) -> String {
    format!("{year}{TARGET_SUFFIX}")
}

/// Rescales a grown table so a scoped sum matches an externally supplied
/// target, per policy.
///
/// The three policy axes are fixed at construction; the target-source
/// axis lives with the caller via [`resolve_constraint_source`].
pub struct ForecastConstrainer {
    method: ConstraintMethod,
    area: ConstraintArea,
    on: ConstraintOn,
}

impl ForecastConstrainer {
    pub fn new(method: ConstraintMethod, area: ConstraintArea, on: ConstraintOn) -> Self {
        Self { method, area, on }
    }

    /// Reconcile `values` against `totals` for every year in `years`.
    ///
    /// Per year and scope group: compute the in-scope sum (the increment
    /// above `base_year` when `on=Growth`, the full value otherwise),
    /// then Percentage-scale or Average-replace toward the group target.
    /// A group whose current sum is ~0 falls back to Average so no
    /// NaN/Inf can escape. Under `on=Growth` the base year is held fixed
    /// and the increment target is `target - base_sum`, so the full
    /// scoped sum still equals the supplied target.
    ///
    /// Row count, key set and column set are unchanged; only value
    /// columns are mutated. Rows in no scope group, and groups with no
    /// target row, pass through untouched.
    pub fn run(
        &self,
        values: &DataFrame,
        totals: &DataFrame,
        designated_area: Option<&DataFrame>,
        base_year: &str,
        years: &[&str],
    ) -> Result<DataFrame, ForecastError> {
        require_columns(values, &[zone::ZONE_ID])?;

        let recon_years: Vec<&str> = match self.on {
            ConstraintOn::Growth => {
                require_columns(values, &[base_year])?;
                years.iter().filter(|y| **y != base_year).copied().collect()
            }
            ConstraintOn::All => years.to_vec(),
        };
        for &year in &recon_years {
            if totals.column(year).is_err() {
                return Err(ForecastError::Constraint(format!(
                    "target table has no column for year '{}'",
                    year,
                )));
            }
        }

        let scoped = self.attach_scope(values, designated_area)?;
        let targets = self.group_targets(totals, designated_area, &recon_years)?;

        let mut lazy = scoped.lazy().join(
            targets.lazy(),
            [col(SCOPE_COL)],
            [col(SCOPE_COL)],
            JoinArgs::new(JoinType::Left),
        );

        let year_exprs: Vec<Expr> = recon_years
            .iter()
            .map(|&year| self.reconcile_expr(year, base_year))
            .collect();
        lazy = lazy.with_columns(year_exprs);

        // Helper and target columns drop out; key and column set are
        // unchanged.
        let out = lazy
            .select(
                values
                    .get_column_names_str()
                    .iter()
                    .map(|c| col(*c))
                    .collect::<Vec<_>>(),
            )
            .collect()?;

        if out.height() != values.height() {
            return Err(ForecastError::Merge(format!(
                "target join changed the row count: {} -> {}",
                values.height(),
                out.height(),
            )));
        }

        info!(
            rows = out.height(),
            years = recon_years.len(),
            area = ?self.area,
            method = ?self.method,
            on = ?self.on,
            "reconciled table against targets"
        );

        Ok(out)
    }

    /// The per-row reconciliation expression for one year.
    fn reconcile_expr(&self, year: &str, base_year: &str) -> Expr {
        let target = col(target_alias(year).as_str());

        let (base_contrib, target_increment) = match self.on {
            ConstraintOn::Growth => {
                let base_sum = col(base_year).sum().over([col(SCOPE_COL)]);
                (col(base_year), target.clone() - base_sum)
            }
            ConstraintOn::All => (lit(0.0), target.clone()),
        };

        let increment = col(year) - base_contrib.clone();
        let current_sum = increment.clone().sum().over([col(SCOPE_COL)]);
        let row_count = col(SCOPE_COL)
            .count()
            .over([col(SCOPE_COL)])
            .cast(DataType::Float64);
        let per_row_average = target_increment.clone() / row_count;

        let reconciled = match self.method {
            ConstraintMethod::Percentage => {
                // ~0 in-scope sum: scaling is undefined, fall back to
                // Average rather than emit NaN/Inf.
                let sum_usable = current_sum
                    .clone()
                    .gt(lit(CONSTRAINT_TOLERANCE))
                    .or(current_sum.clone().lt(lit(-CONSTRAINT_TOLERANCE)));
                when(sum_usable)
                    .then(increment * (target_increment / current_sum))
                    .otherwise(per_row_average)
            }
            ConstraintMethod::Average => per_row_average,
        };

        when(target.is_null())
            .then(col(year))
            .otherwise(base_contrib + reconciled)
            .alias(year)
    }

    /// Attach the scope-group column to every in-scope row.
    fn attach_scope(
        &self,
        values: &DataFrame,
        designated_area: Option<&DataFrame>,
    ) -> Result<DataFrame, ForecastError> {
        let scoped = match self.area {
            ConstraintArea::Zone => values
                .clone()
                .lazy()
                .with_columns([col(zone::ZONE_ID).alias(SCOPE_COL)])
                .collect()?,
            ConstraintArea::All => values
                .clone()
                .lazy()
                .with_columns([lit("all").alias(SCOPE_COL)])
                .collect()?,
            ConstraintArea::Designated => {
                let mask = self.designated_mask(values, designated_area)?;
                values
                    .clone()
                    .lazy()
                    .join(
                        mask.clone().lazy().select([
                            col(designated::ZONE_ID),
                            col(designated::AREA_ID).alias(SCOPE_COL),
                        ]),
                        [col(zone::ZONE_ID)],
                        [col(designated::ZONE_ID)],
                        JoinArgs::new(JoinType::Left),
                    )
                    .collect()?
            }
        };
        Ok(scoped)
    }

    /// Validate the designated-area mask against the value table.
    fn designated_mask<'a>(
        &self,
        values: &DataFrame,
        designated_area: Option<&'a DataFrame>,
    ) -> Result<&'a DataFrame, ForecastError> {
        let mask = designated_area.ok_or_else(|| {
            ForecastError::Constraint(
                "area 'Designated' requires a designated-area mask".to_string(),
            )
        })?;
        require_columns(mask, &[designated::ZONE_ID, designated::AREA_ID])?;
        require_unique_keys(mask, &[designated::ZONE_ID], "designated-area mask")?;

        let value_zones = values
            .column(zone::ZONE_ID)?
            .as_materialized_series()
            .clone();
        let unknown = mask
            .clone()
            .lazy()
            .filter(
                col(designated::ZONE_ID)
                    .is_in(lit(value_zones), false)
                    .not(),
            )
            .collect()?;
        if unknown.height() > 0 {
            return Err(ForecastError::Constraint(format!(
                "designated-area mask references {} zones absent from the value table",
                unknown.height(),
            )));
        }

        Ok(mask)
    }

    /// Aggregate the target table to one row per scope group, with the
    /// year columns renamed to their target aliases.
    fn group_targets(
        &self,
        totals: &DataFrame,
        designated_area: Option<&DataFrame>,
        years: &[&str],
    ) -> Result<DataFrame, ForecastError> {
        let target_sums: Vec<Expr> = years
            .iter()
            .map(|&y| col(y).sum().alias(target_alias(y).as_str()))
            .collect();

        let targets = match self.area {
            ConstraintArea::Zone => {
                require_columns(totals, &[zone::ZONE_ID])?;
                totals
                    .clone()
                    .lazy()
                    .group_by([col(zone::ZONE_ID).alias(SCOPE_COL)])
                    .agg(target_sums)
                    .collect()?
            }
            ConstraintArea::All => totals
                .clone()
                .lazy()
                .select(target_sums)
                .with_columns([lit("all").alias(SCOPE_COL)])
                .collect()?,
            ConstraintArea::Designated => {
                // Accept totals keyed by group directly, or by zone and
                // aggregated through the mask.
                if totals.column(designated::AREA_ID).is_ok() {
                    totals
                        .clone()
                        .lazy()
                        .group_by([col(designated::AREA_ID).alias(SCOPE_COL)])
                        .agg(target_sums)
                        .collect()?
                } else if totals.column(zone::ZONE_ID).is_ok() {
                    let mask = designated_area.ok_or_else(|| {
                        ForecastError::Constraint(
                            "area 'Designated' requires a designated-area mask".to_string(),
                        )
                    })?;
                    totals
                        .clone()
                        .lazy()
                        .join(
                            mask.clone().lazy().select([
                                col(designated::ZONE_ID),
                                col(designated::AREA_ID),
                            ]),
                            [col(zone::ZONE_ID)],
                            [col(designated::ZONE_ID)],
                            JoinArgs::new(JoinType::Inner),
                        )
                        .group_by([col(designated::AREA_ID).alias(SCOPE_COL)])
                        .agg(target_sums)
                        .collect()?
                } else {
                    return Err(ForecastError::Constraint(format!(
                        "target table must be keyed by '{}' or '{}'",
                        zone::ZONE_ID,
                        designated::AREA_ID,
                    )));
                }
            }
        };

        debug!(groups = targets.height(), "aggregated targets to scope groups");
        Ok(targets)
    }
}

/// Resolve the target-quantity table for the `source` policy axis.
///
/// Default uses the externally supplied totals; GrownBase snapshots the
/// grown table's own zonal sums (a no-op seed for a later stage);
/// ModelGrownBase aggregates a previously produced grown table.
pub fn resolve_constraint_source(
    source: ConstraintSource,
    external: Option<&DataFrame>,
    grown: &DataFrame,
    model_grown: Option<&DataFrame>,
    years: &[&str],
) -> Result<DataFrame, ForecastError> {
    match source {
        ConstraintSource::Default => external.cloned().ok_or_else(|| {
            ForecastError::Constraint(
                "source 'Default' requires externally supplied totals".to_string(),
            )
        }),
        ConstraintSource::GrownBase => aggregate_segments(grown, &[zone::ZONE_ID], years),
        ConstraintSource::ModelGrownBase => {
            let model_grown = model_grown.ok_or_else(|| {
                ForecastError::Constraint(
                    "source 'Model Grown Base' requires a previously grown table".to_string(),
                )
            })?;
            aggregate_segments(model_grown, &[zone::ZONE_ID], years)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn year_col(df: &DataFrame, year: &str) -> Vec<f64> {
        df.column(year)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    fn year_sum(df: &DataFrame, year: &str) -> f64 {
        df.column(year).unwrap().f64().unwrap().sum().unwrap_or(0.0)
    }

    #[test]
    fn zone_percentage_hits_each_zone_target() {
        let values = df!(
            "zone_id" => ["a", "a", "b", "b"],
            "employment_cat" => ["E02", "E03", "E02", "E03"],
            "2018" => [10.0, 30.0, 20.0, 20.0],
            "2033" => [20.0, 60.0, 30.0, 30.0],
        )
        .unwrap();
        let totals = df!(
            "zone_id" => ["a", "b"],
            "2033" => [100.0, 90.0],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Zone,
            ConstraintOn::All,
        );
        let out = constrainer
            .run(&values, &totals, None, "2018", &["2033"])
            .unwrap();

        let zone_a = out
            .clone()
            .lazy()
            .filter(col("zone_id").eq(lit("a")))
            .collect()
            .unwrap();
        let zone_b = out
            .clone()
            .lazy()
            .filter(col("zone_id").eq(lit("b")))
            .collect()
            .unwrap();
        assert!((year_sum(&zone_a, "2033") - 100.0).abs() < CONSTRAINT_TOLERANCE);
        assert!((year_sum(&zone_b, "2033") - 90.0).abs() < CONSTRAINT_TOLERANCE);

        // Percentage preserves row-level shape within each zone.
        let sorted = zone_a
            .sort(["employment_cat"], SortMultipleOptions::default())
            .unwrap();
        assert_eq!(year_col(&sorted, "2033"), vec![25.0, 75.0]);
    }

    #[test]
    fn designated_growth_percentage_scenario() {
        // Base 100 at zone a grown to 120; a Designated Percentage
        // constraint with target 150 for a group containing only zone a
        // rescales that row to exactly 150.
        let values = df!(
            "zone_id" => ["a"],
            "2018" => [100.0],
            "2033" => [120.0],
        )
        .unwrap();
        let totals = df!(
            "zone_id" => ["a"],
            "2033" => [150.0],
        )
        .unwrap();
        let mask = df!(
            "zone_id" => ["a"],
            "designated_area_id" => ["north"],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Designated,
            ConstraintOn::Growth,
        );
        let out = constrainer
            .run(&values, &totals, Some(&mask), "2018", &["2018", "2033"])
            .unwrap();

        assert_eq!(year_col(&out, "2018"), vec![100.0]);
        assert!((year_col(&out, "2033")[0] - 150.0).abs() < CONSTRAINT_TOLERANCE);
    }

    #[test]
    fn growth_constraint_holds_base_year_fixed() {
        let values = df!(
            "zone_id" => ["a", "b"],
            "2018" => [100.0, 50.0],
            "2033" => [150.0, 60.0],
        )
        .unwrap();
        let totals = df!(
            "zone_id" => ["a", "b"],
            "2018" => [999.0, 999.0],
            "2033" => [300.0, 80.0],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Zone,
            ConstraintOn::Growth,
        );
        let out = constrainer
            .run(&values, &totals, None, "2018", &["2018", "2033"])
            .unwrap();
        let sorted = out.sort(["zone_id"], SortMultipleOptions::default()).unwrap();

        // Base year passes through even though the target table carries
        // a base-year column.
        assert_eq!(year_col(&sorted, "2018"), vec![100.0, 50.0]);
        assert_eq!(year_col(&sorted, "2033"), vec![300.0, 80.0]);
    }

    #[test]
    fn average_reaches_target_at_zero_current_sum() {
        let values = df!(
            "zone_id" => ["a", "a", "a"],
            "2033" => [0.0, 0.0, 0.0],
        )
        .unwrap();
        let totals = df!(
            "zone_id" => ["a"],
            "2033" => [90.0],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Average,
            ConstraintArea::Zone,
            ConstraintOn::All,
        );
        let out = constrainer
            .run(&values, &totals, None, "2018", &["2033"])
            .unwrap();

        assert_eq!(year_col(&out, "2033"), vec![30.0, 30.0, 30.0]);
    }

    #[test]
    fn percentage_falls_back_to_average_at_zero_sum() {
        // Zero growth everywhere: Percentage scaling is undefined, so
        // the correction is distributed evenly instead of emitting NaN.
        let values = df!(
            "zone_id" => ["a", "a"],
            "2018" => [50.0, 50.0],
            "2033" => [50.0, 50.0],
        )
        .unwrap();
        let totals = df!(
            "zone_id" => ["a"],
            "2033" => [160.0],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Zone,
            ConstraintOn::Growth,
        );
        let out = constrainer
            .run(&values, &totals, None, "2018", &["2018", "2033"])
            .unwrap();

        assert_eq!(year_col(&out, "2033"), vec![80.0, 80.0]);
        assert!((year_sum(&out, "2033") - 160.0).abs() < CONSTRAINT_TOLERANCE);
    }

    #[test]
    fn all_area_redistributes_system_wide() {
        let values = df!(
            "zone_id" => ["a", "b", "c"],
            "2033" => [10.0, 20.0, 70.0],
        )
        .unwrap();
        let totals = df!(
            "zone_id" => ["a", "b", "c"],
            "2033" => [40.0, 40.0, 120.0],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::All,
            ConstraintOn::All,
        );
        let out = constrainer
            .run(&values, &totals, None, "2018", &["2033"])
            .unwrap();

        // One global target (200), shape preserved.
        assert!((year_sum(&out, "2033") - 200.0).abs() < CONSTRAINT_TOLERANCE);
        let sorted = out.sort(["zone_id"], SortMultipleOptions::default()).unwrap();
        assert_eq!(year_col(&sorted, "2033"), vec![20.0, 40.0, 140.0]);
    }

    #[test]
    fn group_keyed_and_zone_keyed_totals_agree() {
        let values = df!(
            "zone_id" => ["a", "b", "c"],
            "2033" => [10.0, 30.0, 50.0],
        )
        .unwrap();
        let mask = df!(
            "zone_id" => ["a", "b", "c"],
            "designated_area_id" => ["north", "north", "south"],
        )
        .unwrap();
        let zone_totals = df!(
            "zone_id" => ["a", "b", "c"],
            "2033" => [30.0, 50.0, 25.0],
        )
        .unwrap();
        let group_totals = df!(
            "designated_area_id" => ["north", "south"],
            "2033" => [80.0, 25.0],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Designated,
            ConstraintOn::All,
        );
        let from_zones = constrainer
            .run(&values, &zone_totals, Some(&mask), "2018", &["2033"])
            .unwrap()
            .sort(["zone_id"], SortMultipleOptions::default())
            .unwrap();
        let from_groups = constrainer
            .run(&values, &group_totals, Some(&mask), "2018", &["2033"])
            .unwrap()
            .sort(["zone_id"], SortMultipleOptions::default())
            .unwrap();

        assert!(from_zones.equals(&from_groups));
        assert_eq!(year_col(&from_zones, "2033"), vec![20.0, 60.0, 25.0]);
    }

    #[test]
    fn designated_average_growth_distributes_evenly() {
        let values = df!(
            "zone_id" => ["a", "b"],
            "2018" => [100.0, 60.0],
            "2033" => [120.0, 80.0],
        )
        .unwrap();
        let totals = df!(
            "designated_area_id" => ["north"],
            "2033" => [260.0],
        )
        .unwrap();
        let mask = df!(
            "zone_id" => ["a", "b"],
            "designated_area_id" => ["north", "north"],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Average,
            ConstraintArea::Designated,
            ConstraintOn::Growth,
        );
        let out = constrainer
            .run(&values, &totals, Some(&mask), "2018", &["2018", "2033"])
            .unwrap()
            .sort(["zone_id"], SortMultipleOptions::default())
            .unwrap();

        // Increment target 100 split evenly on top of each fixed base.
        assert_eq!(year_col(&out, "2018"), vec![100.0, 60.0]);
        assert_eq!(year_col(&out, "2033"), vec![150.0, 110.0]);
        assert!((year_sum(&out, "2033") - 260.0).abs() < CONSTRAINT_TOLERANCE);
    }

    #[test]
    fn zones_outside_the_mask_pass_through() {
        let values = df!(
            "zone_id" => ["a", "c"],
            "2033" => [10.0, 99.0],
        )
        .unwrap();
        let totals = df!(
            "designated_area_id" => ["north"],
            "2033" => [20.0],
        )
        .unwrap();
        let mask = df!(
            "zone_id" => ["a"],
            "designated_area_id" => ["north"],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Designated,
            ConstraintOn::All,
        );
        let out = constrainer
            .run(&values, &totals, Some(&mask), "2018", &["2033"])
            .unwrap()
            .sort(["zone_id"], SortMultipleOptions::default())
            .unwrap();

        assert_eq!(year_col(&out, "2033"), vec![20.0, 99.0]);
    }

    #[test]
    fn zones_without_targets_pass_through() {
        let values = df!(
            "zone_id" => ["a", "b"],
            "2033" => [10.0, 20.0],
        )
        .unwrap();
        let totals = df!(
            "zone_id" => ["a"],
            "2033" => [40.0],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Zone,
            ConstraintOn::All,
        );
        let out = constrainer
            .run(&values, &totals, None, "2018", &["2033"])
            .unwrap()
            .sort(["zone_id"], SortMultipleOptions::default())
            .unwrap();

        assert_eq!(year_col(&out, "2033"), vec![40.0, 20.0]);
    }

    #[test]
    fn designated_without_mask_is_rejected() {
        let values = df!("zone_id" => ["a"], "2033" => [10.0]).unwrap();
        let totals = df!("zone_id" => ["a"], "2033" => [20.0]).unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Designated,
            ConstraintOn::All,
        );
        let err = constrainer
            .run(&values, &totals, None, "2018", &["2033"])
            .unwrap_err();
        assert!(matches!(err, ForecastError::Constraint(_)));
    }

    #[test]
    fn mask_with_unknown_zone_is_rejected() {
        let values = df!("zone_id" => ["a"], "2033" => [10.0]).unwrap();
        let totals = df!("zone_id" => ["a"], "2033" => [20.0]).unwrap();
        let mask = df!(
            "zone_id" => ["a", "ghost"],
            "designated_area_id" => ["north", "north"],
        )
        .unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Designated,
            ConstraintOn::All,
        );
        let err = constrainer
            .run(&values, &totals, Some(&mask), "2018", &["2033"])
            .unwrap_err();
        assert!(matches!(err, ForecastError::Constraint(_)));
    }

    #[test]
    fn missing_target_year_is_rejected() {
        let values = df!("zone_id" => ["a"], "2033" => [10.0], "2050" => [12.0]).unwrap();
        let totals = df!("zone_id" => ["a"], "2033" => [20.0]).unwrap();

        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Zone,
            ConstraintOn::All,
        );
        let err = constrainer
            .run(&values, &totals, None, "2018", &["2033", "2050"])
            .unwrap_err();
        assert!(matches!(err, ForecastError::Constraint(_)));
    }

    #[test]
    fn grown_base_source_is_a_no_op_snapshot() {
        let grown = df!(
            "zone_id" => ["a", "a", "b"],
            "2033" => [10.0, 20.0, 40.0],
        )
        .unwrap();

        let totals = resolve_constraint_source(
            ConstraintSource::GrownBase,
            None,
            &grown,
            None,
            &["2033"],
        )
        .unwrap();

        // Constraining against the table's own sums changes nothing.
        let constrainer = ForecastConstrainer::new(
            ConstraintMethod::Percentage,
            ConstraintArea::Zone,
            ConstraintOn::All,
        );
        let out = constrainer
            .run(&grown, &totals, None, "2018", &["2033"])
            .unwrap()
            .sort(["zone_id", "2033"], SortMultipleOptions::default())
            .unwrap();
        assert_eq!(year_col(&out, "2033"), vec![10.0, 20.0, 40.0]);
    }

    #[test]
    fn default_source_requires_external_totals() {
        let grown = df!("zone_id" => ["a"], "2033" => [10.0]).unwrap();
        let err = resolve_constraint_source(
            ConstraintSource::Default,
            None,
            &grown,
            None,
            &["2033"],
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::Constraint(_)));
    }

    proptest! {
        #[test]
        fn scoped_sum_equals_target(
            values in prop::collection::vec(0.0f64..1e4, 2..20),
            target in 1.0f64..1e5,
        ) {
            let n = values.len();
            let zones: Vec<String> = (0..n).map(|i| format!("z{i}")).collect();
            let base: Vec<f64> = values.iter().map(|v| v * 0.5).collect();
            let df = df!(
                "zone_id" => zones.clone(),
                "2018" => base,
                "2033" => values,
            ).unwrap();
            let totals = df!(
                "zone_id" => zones,
                "2033" => vec![target / n as f64; n],
            ).unwrap();

            for method in [ConstraintMethod::Percentage, ConstraintMethod::Average] {
                for on in [ConstraintOn::Growth, ConstraintOn::All] {
                    let constrainer = ForecastConstrainer::new(
                        method,
                        ConstraintArea::All,
                        on,
                    );
                    let out = constrainer
                        .run(&df, &totals, None, "2018", &["2033"])
                        .unwrap();
                    let sum = out.column("2033").unwrap().f64().unwrap().sum().unwrap();
                    prop_assert!(
                        (sum - target).abs() < 1e-7 * target.max(1.0),
                        "method {:?} on {:?}: {} != {}", method, on, sum, target
                    );
                }
            }
        }
    }
}
