use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::schema::{
    constraint_area, constraint_method, constraint_on, constraint_source,
    translation_aggregation,
};

/// How a correction is distributed within a reconciliation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintMethod {
    Percentage,
    Average,
}

/// Reconciliation scope: per-zone target, a caller-defined zone subset,
/// or one global target redistributed system-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintArea {
    Zone,
    Designated,
    All,
}

/// Which quantity is reconciled: the increment above the base year
/// (base year held fixed), or the full year value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintOn {
    Growth,
    All,
}

/// Where the target totals are resolved from before reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSource {
    Default,
    #[serde(alias = "Grown Base")]
    GrownBase,
    #[serde(alias = "Model Grown Base")]
    ModelGrownBase,
}

/// How rows landing on the same target zone are recombined after a
/// translation: sum for additive quantities, mean for ratios/factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationAggregation {
    Sum,
    Mean,
}

/// Lowercase with spaces/underscores removed, so "Grown Base",
/// "grown_base" and "GrownBase" all resolve to the same axis value.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .collect::<String>()
        .to_lowercase()
}

impl FromStr for ConstraintMethod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "percentage" => Ok(Self::Percentage),
            "average" => Ok(Self::Average),
            _ => Err(ForecastError::Validation(format!(
                "Invalid constraint method: '{}'. Must be '{}' or '{}'",
                s,
                constraint_method::PERCENTAGE,
                constraint_method::AVERAGE,
            ))),
        }
    }
}

impl FromStr for ConstraintArea {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "zone" => Ok(Self::Zone),
            "designated" => Ok(Self::Designated),
            "all" => Ok(Self::All),
            _ => Err(ForecastError::Validation(format!(
                "Invalid constraint area: '{}'. Must be '{}', '{}' or '{}'",
                s,
                constraint_area::ZONE,
                constraint_area::DESIGNATED,
                constraint_area::ALL,
            ))),
        }
    }
}

impl FromStr for ConstraintOn {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "growth" => Ok(Self::Growth),
            "all" => Ok(Self::All),
            _ => Err(ForecastError::Validation(format!(
                "Invalid constraint on: '{}'. Must be '{}' or '{}'",
                s,
                constraint_on::GROWTH,
                constraint_on::ALL,
            ))),
        }
    }
}

impl FromStr for ConstraintSource {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "default" => Ok(Self::Default),
            "grownbase" => Ok(Self::GrownBase),
            "modelgrownbase" => Ok(Self::ModelGrownBase),
            _ => Err(ForecastError::Validation(format!(
                "Invalid constraint source: '{}'. Must be '{}', '{}' or '{}'",
                s,
                constraint_source::DEFAULT,
                constraint_source::GROWN_BASE,
                constraint_source::MODEL_GROWN_BASE,
            ))),
        }
    }
}

impl FromStr for TranslationAggregation {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "sum" => Ok(Self::Sum),
            "mean" => Ok(Self::Mean),
            _ => Err(ForecastError::Validation(format!(
                "Invalid aggregation method: '{}'. Must be '{}' or '{}'",
                s,
                translation_aggregation::SUM,
                translation_aggregation::MEAN,
            ))),
        }
    }
}

/// Which reconciliation stages of the pipeline are switched on.
///
/// One labelled field per stage, replacing positional flag lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintStages {
    /// Reconcile straight after growth is applied.
    pub initial: bool,
    /// Reconcile again after development-log integration.
    pub post_development: bool,
}

impl Default for ConstraintStages {
    fn default() -> Self {
        Self {
            initial: true,
            post_development: false,
        }
    }
}

/// Constraint policy bundle: one field per axis, plus stage switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintConfig {
    pub method: ConstraintMethod,
    pub area: ConstraintArea,
    pub on: ConstraintOn,
    pub source: ConstraintSource,
    #[serde(default)]
    pub stages: ConstraintStages,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            method: ConstraintMethod::Percentage,
            area: ConstraintArea::Designated,
            on: ConstraintOn::Growth,
            source: ConstraintSource::Default,
            stages: ConstraintStages::default(),
        }
    }
}

fn default_infill() -> f64 {
    0.001
}

fn default_no_neg_growth() -> bool {
    true
}

/// Full parameter bundle for one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Year the base table is valued at, e.g. "2018".
    pub base_year: String,
    /// Ordered future year labels, e.g. ["2033", "2035", "2050"].
    pub future_years: Vec<String>,
    /// Segmentation columns of the value table, e.g. ["employment_cat"].
    #[serde(default)]
    pub segmentation_cols: Vec<String>,
    /// Substituted when a base-year factor is zero or a zone is absent
    /// from the growth table.
    #[serde(default = "default_infill")]
    pub infill: f64,
    /// Clip factors and grown values below zero.
    #[serde(default = "default_no_neg_growth")]
    pub no_neg_growth: bool,
    #[serde(default)]
    pub constraint: ConstraintConfig,
}

impl ForecastConfig {
    /// Base year followed by the future years, in horizon order.
    pub fn all_years(&self) -> Vec<String> {
        let mut years = Vec::with_capacity(self.future_years.len() + 1);
        years.push(self.base_year.clone());
        years.extend(self.future_years.iter().cloned());
        years
    }
}
