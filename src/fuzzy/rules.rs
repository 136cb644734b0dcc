use crate::error::{Error, Result};
use super::variable::FuzzyVariable;

// ---------------------------------------------------------------------------
// Rule base: full (error × delta-error) grid, one output term per cell
// ---------------------------------------------------------------------------

/// `IF error IS <error> AND delta_error IS <delta_error> THEN output IS <output>`.
///
/// Terms are stored as indices into their variables' term lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub error: usize,
    pub delta_error: usize,
    pub output: usize,
}

#[derive(Debug, Clone)]
pub struct RuleBase {
    rules: Vec<Rule>,
    error_terms: usize,
    delta_terms: usize,
}

impl RuleBase {
    /// Build the rule grid from a flat table of output term names.
    ///
    /// The table is read in product order: error term outer, delta-error
    /// term inner, so `table[e * delta_terms + d]` is the output for
    /// `(error term e, delta term d)`.
    pub fn from_table(
        error: &FuzzyVariable,
        delta_error: &FuzzyVariable,
        output: &FuzzyVariable,
        table: &[&str],
    ) -> Result<Self> {
        let expected = error.term_count() * delta_error.term_count();
        if table.len() != expected {
            return Err(Error::RuleTable(format!(
                "expected {} entries ({} x {}), got {}",
                expected,
                error.term_count(),
                delta_error.term_count(),
                table.len()
            )));
        }

        let mut rules = Vec::with_capacity(expected);
        for e in 0..error.term_count() {
            for d in 0..delta_error.term_count() {
                let name = table[e * delta_error.term_count() + d];
                let out = output.term_index(name).ok_or_else(|| {
                    Error::RuleTable(format!(
                        "output term `{}` is not declared on `{}`",
                        name,
                        output.name()
                    ))
                })?;
                rules.push(Rule { error: e, delta_error: d, output: out });
            }
        }

        Ok(Self {
            rules,
            error_terms: error.term_count(),
            delta_terms: delta_error.term_count(),
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Grid dimensions as (error terms, delta-error terms).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.error_terms, self.delta_terms)
    }

    /// The rule for a given (error term, delta-error term) cell.
    pub fn lookup(&self, error: usize, delta_error: usize) -> Option<&Rule> {
        if error >= self.error_terms || delta_error >= self.delta_terms {
            return None;
        }
        self.rules.get(error * self.delta_terms + delta_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::presets;

    #[test]
    fn default_grid_is_complete() {
        let e = presets::error_variable().unwrap();
        let d = presets::delta_error_variable().unwrap();
        let p = presets::motor_power_variable().unwrap();
        let base = RuleBase::from_table(&e, &d, &p, &presets::POWER_TABLE).unwrap();

        assert_eq!(base.len(), 25);
        assert_eq!(base.len(), e.term_count() * d.term_count());
        for ei in 0..e.term_count() {
            for di in 0..d.term_count() {
                let hits = base
                    .rules()
                    .iter()
                    .filter(|r| r.error == ei && r.delta_error == di)
                    .count();
                assert_eq!(hits, 1, "cell ({}, {}) must have exactly one rule", ei, di);
            }
        }
    }

    #[test]
    fn product_order_maps_table_cells() {
        let e = presets::error_variable().unwrap();
        let d = presets::delta_error_variable().unwrap();
        let p = presets::motor_power_variable().unwrap();
        let base = RuleBase::from_table(&e, &d, &p, &presets::POWER_TABLE).unwrap();

        // (Z, MN) -> MP, (MG, Z) -> G, (MG, MP) -> MG
        let r = base.lookup(0, 0).unwrap();
        assert_eq!(p.terms()[r.output].name(), "MP");
        let r = base.lookup(4, 2).unwrap();
        assert_eq!(p.terms()[r.output].name(), "G");
        let r = base.lookup(4, 4).unwrap();
        assert_eq!(p.terms()[r.output].name(), "MG");
        assert!(base.lookup(5, 0).is_none());
    }

    #[test]
    fn table_size_mismatch_is_rejected() {
        let e = presets::error_variable().unwrap();
        let d = presets::delta_error_variable().unwrap();
        let p = presets::motor_power_variable().unwrap();
        let short = &presets::POWER_TABLE[..24];
        assert!(matches!(
            RuleBase::from_table(&e, &d, &p, short),
            Err(Error::RuleTable(_))
        ));
    }

    #[test]
    fn unknown_output_term_is_rejected() {
        let e = presets::error_variable().unwrap();
        let d = presets::delta_error_variable().unwrap();
        let p = presets::motor_power_variable().unwrap();
        let mut table = presets::POWER_TABLE;
        table[7] = "XX";
        assert!(RuleBase::from_table(&e, &d, &p, &table).is_err());
    }
}
