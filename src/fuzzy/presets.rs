//! Hand-designed variables and rule table for the drone altitude controller.

use crate::error::Result;
use super::engine::InferenceEngine;
use super::membership::Term;
use super::rules::RuleBase;
use super::variable::FuzzyVariable;

/// Output term per (error, delta-error) cell, error-term major.
///
/// Rows are error `Z, P, M, G, MG`; columns are delta-error `MN, N, Z, P, MP`.
pub const POWER_TABLE: [&str; 25] = [
    "MP", "P", "M", "G", "MG", //
    "MP", "P", "M", "M", "M", //
    "P", "P", "M", "M", "G", //
    "P", "M", "M", "G", "G", //
    "M", "M", "G", "G", "MG",
];

/// Absolute position error, 0..1000.
pub fn error_variable() -> Result<FuzzyVariable> {
    FuzzyVariable::builder("error", 0.0, 1000.0)
        .resolution(0.1)
        .term(Term::triangular("Z", 0.0, 0.0, 5.0)?)
        .term(Term::triangular("P", 0.0, 15.0, 25.0)?)
        .term(Term::triangular("M", 15.0, 45.0, 75.0)?)
        .term(Term::triangular("G", 50.0, 125.0, 350.0)?)
        .term(Term::triangular("MG", 125.0, 770.0, 1000.0)?)
        .build()
}

/// Tick-to-tick change of the absolute error.
pub fn delta_error_variable() -> Result<FuzzyVariable> {
    FuzzyVariable::builder("delta_error", -1000.0, 1000.0)
        .resolution(0.5)
        .term(Term::trapezoidal("MN", -1000.0, -1000.0, -3.0, -1.5)?)
        .term(Term::triangular("N", -3.0, -1.5, 0.0)?)
        .term(Term::triangular("Z", -1.5, 0.0, 1.5)?)
        .term(Term::triangular("P", 0.0, 1.5, 3.0)?)
        .term(Term::trapezoidal("MP", 1.5, 3.0, 1000.0, 1000.0)?)
        .build()
}

/// Motor power as a fraction of full throttle.
pub fn motor_power_variable() -> Result<FuzzyVariable> {
    FuzzyVariable::builder("motor_power", 0.0, 1.0)
        .resolution(0.01)
        .term(Term::trapezoidal("MP", 0.0, 0.0, 0.03, 0.18)?)
        .term(Term::triangular("P", 0.08, 0.18, 0.4)?)
        .term(Term::triangular("M", 0.25, 0.4, 0.55)?)
        .term(Term::triangular("G", 0.4, 0.62, 0.8)?)
        .term(Term::trapezoidal("MG", 0.62, 0.88, 1.0, 1.0)?)
        .build()
}

/// The default engine: three variables above plus `POWER_TABLE`.
pub fn drone_engine() -> Result<InferenceEngine> {
    let error = error_variable()?;
    let delta_error = delta_error_variable()?;
    let power = motor_power_variable()?;
    let rules = RuleBase::from_table(&error, &delta_error, &power, &POWER_TABLE)?;
    InferenceEngine::new(error, delta_error, power, rules)
}
