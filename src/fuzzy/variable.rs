use std::collections::HashSet;

use crate::error::{Error, Result};
use super::membership::Term;

// ---------------------------------------------------------------------------
// Linguistic variable: universe of discourse + ordered terms
// ---------------------------------------------------------------------------

/// A fuzzy variable. Term order is declaration order and defines the row and
/// column order of the rule table.
#[derive(Debug, Clone)]
pub struct FuzzyVariable {
    name: String,
    min: f64,
    max: f64,
    resolution: f64,
    terms: Vec<Term>,
}

impl FuzzyVariable {
    pub fn builder(name: impl Into<String>, min: f64, max: f64) -> VariableBuilder {
        VariableBuilder {
            name: name.into(),
            min,
            max,
            resolution: (max - min) / 100.0,
            terms: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn universe(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn term_index(&self, name: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.name() == name)
    }

    /// Clip a crisp value into the universe.
    pub fn clip(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }

    /// Membership degree of `x` (clipped to the universe) in every term,
    /// in declaration order.
    pub fn fuzzify(&self, x: f64) -> Vec<f64> {
        let x = self.clip(x);
        self.terms.iter().map(|t| t.membership(x)).collect()
    }

    /// Number of sample points over the universe at this resolution.
    pub fn sample_count(&self) -> usize {
        ((self.max - self.min) / self.resolution).round() as usize + 1
    }

    /// Sample points `min + i * resolution`, ascending, last one pinned to `max`.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.sample_count()).map(move |i| (self.min + i as f64 * self.resolution).min(self.max))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct VariableBuilder {
    name: String,
    min: f64,
    max: f64,
    resolution: f64,
    terms: Vec<Term>,
}

impl VariableBuilder {
    pub fn resolution(mut self, step: f64) -> Self {
        self.resolution = step;
        self
    }

    pub fn term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn build(self) -> Result<FuzzyVariable> {
        let invalid = |reason: String| Error::InvalidVariable { name: self.name.clone(), reason };

        if !(self.min.is_finite() && self.max.is_finite()) || self.min >= self.max {
            return Err(invalid(format!("empty universe [{}, {}]", self.min, self.max)));
        }
        if !(self.resolution > 0.0) {
            return Err(invalid(format!("resolution must be positive, got {}", self.resolution)));
        }
        if self.terms.is_empty() {
            return Err(invalid("no terms declared".into()));
        }
        let mut seen = HashSet::new();
        for t in &self.terms {
            if !seen.insert(t.name()) {
                return Err(invalid(format!("duplicate term `{}`", t.name())));
            }
        }

        Ok(FuzzyVariable {
            name: self.name,
            min: self.min,
            max: self.max,
            resolution: self.resolution,
            terms: self.terms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power() -> FuzzyVariable {
        FuzzyVariable::builder("motor_power", 0.0, 1.0)
            .resolution(0.01)
            .term(Term::trapezoidal("low", 0.0, 0.0, 0.2, 0.5).unwrap())
            .term(Term::trapezoidal("high", 0.5, 0.8, 1.0, 1.0).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn samples_cover_universe() {
        let v = power();
        assert_eq!(v.sample_count(), 101);
        let s: Vec<f64> = v.samples().collect();
        assert_eq!(s[0], 0.0);
        assert_eq!(*s.last().unwrap(), 1.0);
        assert!(s.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn fuzzify_clips_into_universe() {
        let v = power();
        assert_eq!(v.fuzzify(5.0), v.fuzzify(1.0));
        assert_eq!(v.fuzzify(-3.0), vec![1.0, 0.0]);
    }

    #[test]
    fn term_lookup_keeps_declaration_order() {
        let v = power();
        assert_eq!(v.term_index("low"), Some(0));
        assert_eq!(v.term_index("high"), Some(1));
        assert_eq!(v.term_index("none"), None);
    }

    #[test]
    fn rejects_bad_definitions() {
        let dup = FuzzyVariable::builder("x", 0.0, 1.0)
            .term(Term::triangular("a", 0.0, 0.5, 1.0).unwrap())
            .term(Term::triangular("a", 0.0, 0.5, 1.0).unwrap())
            .build();
        assert!(matches!(dup, Err(Error::InvalidVariable { .. })));

        let inverted = FuzzyVariable::builder("x", 1.0, 0.0)
            .term(Term::triangular("a", 0.0, 0.5, 1.0).unwrap())
            .build();
        assert!(inverted.is_err());

        let no_step = FuzzyVariable::builder("x", 0.0, 1.0)
            .resolution(0.0)
            .term(Term::triangular("a", 0.0, 0.5, 1.0).unwrap())
            .build();
        assert!(no_step.is_err());
    }
}
