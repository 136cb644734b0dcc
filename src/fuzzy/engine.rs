use tracing::trace;

use crate::error::{Error, Result};
use super::rules::RuleBase;
use super::variable::FuzzyVariable;

// ---------------------------------------------------------------------------
// Mamdani inference: min conjunction, max aggregation, centroid output
// ---------------------------------------------------------------------------

/// Two-input, one-output Mamdani inference engine.
///
/// Stateless once built: `infer` depends only on its arguments and the fixed
/// variables and rules.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    error: FuzzyVariable,
    delta_error: FuzzyVariable,
    output: FuzzyVariable,
    rules: RuleBase,
}

/// Every intermediate of one inference, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    /// Membership of the (clipped) error in each error term.
    pub error_degrees: Vec<f64>,
    /// Membership of the (clipped) delta-error in each delta term.
    pub delta_degrees: Vec<f64>,
    /// Firing strength of each rule, in rule-base order.
    pub firing: Vec<f64>,
    /// Aggregated strength per output term.
    pub aggregated: Vec<f64>,
    /// Crisp centroid; 0 when nothing fired.
    pub output: f64,
}

impl InferenceEngine {
    pub fn new(
        error: FuzzyVariable,
        delta_error: FuzzyVariable,
        output: FuzzyVariable,
        rules: RuleBase,
    ) -> Result<Self> {
        if rules.dimensions() != (error.term_count(), delta_error.term_count()) {
            return Err(Error::RuleTable(format!(
                "rule grid {:?} does not match variables ({}, {})",
                rules.dimensions(),
                error.term_count(),
                delta_error.term_count()
            )));
        }
        if let Some(r) = rules.rules().iter().find(|r| r.output >= output.term_count()) {
            return Err(Error::RuleTable(format!(
                "rule output index {} out of range for `{}`",
                r.output,
                output.name()
            )));
        }
        Ok(Self { error, delta_error, output, rules })
    }

    pub fn error_variable(&self) -> &FuzzyVariable {
        &self.error
    }

    pub fn delta_error_variable(&self) -> &FuzzyVariable {
        &self.delta_error
    }

    pub fn output_variable(&self) -> &FuzzyVariable {
        &self.output
    }

    pub fn rules(&self) -> &RuleBase {
        &self.rules
    }

    /// Crisp motor power for the given error and delta-error.
    pub fn infer(&self, error: f64, delta_error: f64) -> f64 {
        self.infer_detailed(error, delta_error).output
    }

    pub fn infer_detailed(&self, error: f64, delta_error: f64) -> Inference {
        // 1. Fuzzification
        let error_degrees = self.error.fuzzify(error);
        let delta_degrees = self.delta_error.fuzzify(delta_error);

        // 2. Rule evaluation (AND = min)
        let firing: Vec<f64> = self
            .rules
            .rules()
            .iter()
            .map(|r| error_degrees[r.error].min(delta_degrees[r.delta_error]))
            .collect();

        // 3. Aggregation (OR = max) per output term
        let mut aggregated = vec![0.0_f64; self.output.term_count()];
        for (rule, &strength) in self.rules.rules().iter().zip(&firing) {
            let slot = &mut aggregated[rule.output];
            *slot = slot.max(strength);
        }

        // 4. Defuzzification
        let output = self.centroid(&aggregated);

        trace!(error, delta_error, ?aggregated, output, "fuzzy inference");

        Inference { error_degrees, delta_degrees, firing, aggregated, output }
    }

    /// Centre of gravity of the clipped output terms, summed in ascending
    /// sample order.
    fn centroid(&self, aggregated: &[f64]) -> f64 {
        let mut num = 0.0;
        let mut den = 0.0;
        for x in self.output.samples() {
            let mu = self
                .output
                .terms()
                .iter()
                .zip(aggregated)
                .map(|(term, &level)| term.membership(x).min(level))
                .fold(0.0_f64, f64::max);
            num += x * mu;
            den += mu;
        }
        if den > 0.0 {
            num / den
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::membership::Term;
    use crate::fuzzy::presets;

    #[test]
    fn inference_is_deterministic() {
        let engine = presets::drone_engine().unwrap();
        for &(e, d) in &[(700.0, 0.0), (12.0, -1.2), (3.0, 2.0), (60.0, 40.0)] {
            let a = engine.infer(e, d);
            let b = engine.infer(e, d);
            assert_eq!(a.to_bits(), b.to_bits(), "infer({}, {}) not reproducible", e, d);
        }
    }

    #[test]
    fn output_stays_in_power_universe() {
        let engine = presets::drone_engine().unwrap();
        let errors = [0.0, 2.5, 5.0, 10.0, 20.0, 45.0, 100.0, 300.0, 700.0, 1000.0, 5000.0];
        let deltas = [-2000.0, -100.0, -3.0, -1.5, -0.7, 0.0, 0.7, 1.5, 3.0, 100.0, 2000.0];
        for &e in &errors {
            for &d in &deltas {
                let p = engine.infer(e, d);
                assert!((0.0..=1.0).contains(&p), "infer({}, {}) = {} out of [0,1]", e, d, p);
            }
        }
    }

    #[test]
    fn large_error_steady_delta_fires_g() {
        let engine = presets::drone_engine().unwrap();
        let inf = engine.infer_detailed(700.0, 0.0);
        // error 700 is mostly MG, delta 0 is fully Z -> rule (MG, Z) -> G
        let mg = engine.error_variable().term_index("MG").unwrap();
        let g = engine.output_variable().term_index("G").unwrap();
        assert!((inf.error_degrees[mg] - 575.0 / 645.0).abs() < 1e-9);
        assert!((inf.aggregated[g] - inf.error_degrees[mg]).abs() < 1e-12);
        // Centroid of a clipped G triangle sits near its peak
        assert!(inf.output > 0.5 && inf.output < 0.7, "got {}", inf.output);
    }

    #[test]
    fn closing_in_uses_less_power_than_far_away() {
        let engine = presets::drone_engine().unwrap();
        let near = engine.infer(15.0, -1.5);
        let far = engine.infer(700.0, 0.0);
        assert!(near < far, "near {} should be below far {}", near, far);
    }

    #[test]
    fn nothing_fired_defuzzifies_to_zero() {
        let error = FuzzyVariable::builder("e", 0.0, 10.0)
            .term(Term::triangular("lo", 0.0, 1.0, 2.0).unwrap())
            .build()
            .unwrap();
        let delta = FuzzyVariable::builder("d", -1.0, 1.0)
            .term(Term::triangular("z", -1.0, 0.0, 1.0).unwrap())
            .build()
            .unwrap();
        let out = FuzzyVariable::builder("p", 0.0, 1.0)
            .resolution(0.01)
            .term(Term::triangular("mid", 0.2, 0.5, 0.8).unwrap())
            .build()
            .unwrap();
        let rules = RuleBase::from_table(&error, &delta, &out, &["mid"]).unwrap();
        let engine = InferenceEngine::new(error, delta, out, rules).unwrap();

        // error 8 is outside the only error term
        let inf = engine.infer_detailed(8.0, 0.0);
        assert!(inf.firing.iter().all(|&f| f == 0.0));
        assert_eq!(inf.output, 0.0);
    }
}
