use thiserror::Error;

/// Failure taxonomy for the forecasting engine.
///
/// Every failure is local and typed - the caller decides whether to abort
/// a scenario or skip and continue. Undefined arithmetic is converted at
/// the point of occurrence into an infill or one of these variants.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// A join produced unexpected row duplication or loss.
    #[error("Merge: {0}")]
    Merge(String),

    /// Missing scope data, mask, or target year during reconciliation.
    #[error("Constraint: {0}")]
    Constraint(String),

    /// Split fractions fail conservation and renormalization is disabled,
    /// or a source zone has no translation edge.
    #[error("Translation: {0}")]
    Translation(String),

    /// Bad input data or an unrecognized policy value.
    #[error("Validation: {0}")]
    Validation(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

#[cfg(feature = "python")]
impl From<ForecastError> for pyo3::PyErr {
    fn from(err: ForecastError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
