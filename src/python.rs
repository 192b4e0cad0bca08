//! Python bindings. Everything crosses the boundary as polars
//! DataFrames; policy axes arrive as strings and are parsed once here.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::aggregation;
use crate::config::{
    ConstraintConfig, ConstraintStages, ForecastConfig, TranslationAggregation,
};
use crate::error::ForecastError;
use crate::growth;
use crate::model::{ForecastInputs, ForecastModel};
use crate::schema;
use crate::translation::ZoneTranslator;

fn parse_axis<T: std::str::FromStr<Err = ForecastError>>(value: &str) -> PyResult<T> {
    value
        .parse::<T>()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

fn as_strs(v: &[String]) -> Vec<&str> {
    v.iter().map(String::as_str).collect()
}

/// Re-express growth factors relative to the base year.
#[pyfunction]
#[pyo3(signature = (growth, base_year, future_years, infill=0.001))]
fn rebase_growth_factors(
    growth: PyDataFrame,
    base_year: &str,
    future_years: Vec<String>,
    infill: f64,
) -> PyResult<PyDataFrame> {
    let df = growth::rebase_growth_factors(&growth.0, base_year, &as_strs(&future_years), infill)?;
    Ok(PyDataFrame(df))
}

/// Grow a base-year value table to future years.
#[pyfunction]
#[pyo3(signature = (base, growth, base_year, future_years, join_cols=None, infill=0.001, no_neg_growth=true))]
fn grow_to_future_years(
    base: PyDataFrame,
    growth: PyDataFrame,
    base_year: &str,
    future_years: Vec<String>,
    join_cols: Option<Vec<String>>,
    infill: f64,
    no_neg_growth: bool,
) -> PyResult<PyDataFrame> {
    let join_cols = join_cols.unwrap_or_else(|| vec![schema::zone::ZONE_ID.to_string()]);
    let df = growth::grow_to_future_years(
        &base.0,
        &growth.0,
        base_year,
        &as_strs(&future_years),
        &as_strs(&join_cols),
        infill,
        no_neg_growth,
    )?;
    Ok(PyDataFrame(df))
}

/// Reconcile a value table against target totals.
#[pyfunction]
#[pyo3(signature = (
    values, totals, base_year, years,
    method="Percentage", area="Designated", on="Growth",
    designated_area=None,
))]
#[allow(clippy::too_many_arguments)]
fn constrain(
    values: PyDataFrame,
    totals: PyDataFrame,
    base_year: &str,
    years: Vec<String>,
    method: &str,
    area: &str,
    on: &str,
    designated_area: Option<PyDataFrame>,
) -> PyResult<PyDataFrame> {
    let constrainer = crate::constraint::ForecastConstrainer::new(
        parse_axis(method)?,
        parse_axis(area)?,
        parse_axis(on)?,
    );
    let mask = designated_area.as_ref().map(|df| &df.0);
    let df = constrainer.run(&values.0, &totals.0, mask, base_year, &as_strs(&years))?;
    Ok(PyDataFrame(df))
}

/// Translate a value table into another zone system.
#[pyfunction]
#[pyo3(signature = (values, weights, non_split_cols, aggregation="sum", renormalize=true))]
fn translate_zones(
    values: PyDataFrame,
    weights: PyDataFrame,
    non_split_cols: Vec<String>,
    aggregation: &str,
    renormalize: bool,
) -> PyResult<PyDataFrame> {
    let aggregation: TranslationAggregation = parse_axis(aggregation)?;
    let df = ZoneTranslator::new(renormalize).run(
        &values.0,
        &weights.0,
        &as_strs(&non_split_cols),
        aggregation,
    )?;
    Ok(PyDataFrame(df))
}

/// Group a table on the given keys and sum the value columns.
#[pyfunction]
fn aggregate_segments(
    df: PyDataFrame,
    group_cols: Vec<String>,
    value_cols: Vec<String>,
) -> PyResult<PyDataFrame> {
    let out = aggregation::aggregate_segments(&df.0, &as_strs(&group_cols), &as_strs(&value_cols))?;
    Ok(PyDataFrame(out))
}

/// Append an all-segment total row per group key.
#[pyfunction]
fn add_total_segment(
    df: PyDataFrame,
    segment_col: &str,
    total_key: &str,
    group_cols: Vec<String>,
    value_cols: Vec<String>,
) -> PyResult<PyDataFrame> {
    let out = aggregation::add_total_segment(
        &df.0,
        segment_col,
        total_key,
        &as_strs(&group_cols),
        &as_strs(&value_cols),
    )?;
    Ok(PyDataFrame(out))
}

/// Convert a segmented quantity into a derived one via segment weights.
#[pyfunction]
fn apply_segment_weights(
    values: PyDataFrame,
    weights: PyDataFrame,
    segment_col: &str,
    group_cols: Vec<String>,
    value_cols: Vec<String>,
) -> PyResult<PyDataFrame> {
    let out = aggregation::apply_segment_weights(
        &values.0,
        &weights.0,
        segment_col,
        &as_strs(&group_cols),
        &as_strs(&value_cols),
    )?;
    Ok(PyDataFrame(out))
}

/// Run the full grow -> constrain -> aggregate pipeline.
#[pyfunction]
#[pyo3(signature = (
    base, growth, base_year, future_years,
    segmentation_cols=None,
    constraint_totals=None, designated_area=None, model_grown_base=None,
    method="Percentage", area="Designated", on="Growth", source="Default",
    initial_constraint=true, infill=0.001, no_neg_growth=true,
))]
#[allow(clippy::too_many_arguments)]
fn run_forecast(
    base: PyDataFrame,
    growth: PyDataFrame,
    base_year: &str,
    future_years: Vec<String>,
    segmentation_cols: Option<Vec<String>>,
    constraint_totals: Option<PyDataFrame>,
    designated_area: Option<PyDataFrame>,
    model_grown_base: Option<PyDataFrame>,
    method: &str,
    area: &str,
    on: &str,
    source: &str,
    initial_constraint: bool,
    infill: f64,
    no_neg_growth: bool,
) -> PyResult<PyDataFrame> {
    let config = ForecastConfig {
        base_year: base_year.to_string(),
        future_years,
        segmentation_cols: segmentation_cols.unwrap_or_default(),
        infill,
        no_neg_growth,
        constraint: ConstraintConfig {
            method: parse_axis(method)?,
            area: parse_axis(area)?,
            on: parse_axis(on)?,
            source: parse_axis(source)?,
            stages: ConstraintStages {
                initial: initial_constraint,
                post_development: false,
            },
        },
    };

    let out = ForecastModel::new(config).run(ForecastInputs {
        base: Some(&base.0),
        growth: Some(&growth.0),
        constraint_totals: constraint_totals.as_ref().map(|df| &df.0),
        designated_area: designated_area.as_ref().map(|df| &df.0),
        model_grown_base: model_grown_base.as_ref().map(|df| &df.0),
        development_log: None,
    })?;
    Ok(PyDataFrame(out))
}

/// Export schema constants as Python submodules.
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let zone = PyModule::new(m.py(), "zone")?;
    zone.add("ZONE_ID", schema::zone::ZONE_ID)?;
    m.add_submodule(&zone)?;

    let designated = PyModule::new(m.py(), "designated")?;
    designated.add("ZONE_ID", schema::designated::ZONE_ID)?;
    designated.add("AREA_ID", schema::designated::AREA_ID)?;
    m.add_submodule(&designated)?;

    let translation = PyModule::new(m.py(), "translation")?;
    translation.add("FROM_ZONE_ID", schema::translation::FROM_ZONE_ID)?;
    translation.add("TO_ZONE_ID", schema::translation::TO_ZONE_ID)?;
    translation.add("SPLIT_FRACTION", schema::translation::SPLIT_FRACTION)?;
    m.add_submodule(&translation)?;

    let constraint_method = PyModule::new(m.py(), "constraint_method")?;
    constraint_method.add("PERCENTAGE", schema::constraint_method::PERCENTAGE)?;
    constraint_method.add("AVERAGE", schema::constraint_method::AVERAGE)?;
    m.add_submodule(&constraint_method)?;

    let constraint_area = PyModule::new(m.py(), "constraint_area")?;
    constraint_area.add("ZONE", schema::constraint_area::ZONE)?;
    constraint_area.add("DESIGNATED", schema::constraint_area::DESIGNATED)?;
    constraint_area.add("ALL", schema::constraint_area::ALL)?;
    m.add_submodule(&constraint_area)?;

    let constraint_on = PyModule::new(m.py(), "constraint_on")?;
    constraint_on.add("GROWTH", schema::constraint_on::GROWTH)?;
    constraint_on.add("ALL", schema::constraint_on::ALL)?;
    m.add_submodule(&constraint_on)?;

    let constraint_source = PyModule::new(m.py(), "constraint_source")?;
    constraint_source.add("DEFAULT", schema::constraint_source::DEFAULT)?;
    constraint_source.add("GROWN_BASE", schema::constraint_source::GROWN_BASE)?;
    constraint_source.add(
        "MODEL_GROWN_BASE",
        schema::constraint_source::MODEL_GROWN_BASE,
    )?;
    m.add_submodule(&constraint_source)?;

    Ok(())
}

#[pymodule]
fn zonecast(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(rebase_growth_factors, m)?)?;
    m.add_function(wrap_pyfunction!(grow_to_future_years, m)?)?;
    m.add_function(wrap_pyfunction!(constrain, m)?)?;
    m.add_function(wrap_pyfunction!(translate_zones, m)?)?;
    m.add_function(wrap_pyfunction!(aggregate_segments, m)?)?;
    m.add_function(wrap_pyfunction!(add_total_segment, m)?)?;
    m.add_function(wrap_pyfunction!(apply_segment_weights, m)?)?;
    m.add_function(wrap_pyfunction!(run_forecast, m)?)?;
    add_schema_exports(m)?;
    Ok(())
}
