use std::fmt::Write;

use crate::fuzzy::InferenceEngine;

/// Render the rule base as a grid: error terms across, delta-error terms down.
pub fn render_rule_table(engine: &InferenceEngine) -> String {
    let error = engine.error_variable();
    let delta = engine.delta_error_variable();
    let output = engine.output_variable();

    let corner = format!("{} \\ {}", delta.name(), error.name());
    let width = delta
        .terms()
        .iter()
        .map(|t| t.name().len())
        .chain(std::iter::once(corner.len()))
        .max()
        .unwrap_or(0);
    let cell = output
        .terms()
        .iter()
        .map(|t| t.name().len())
        .chain(error.terms().iter().map(|t| t.name().len()))
        .max()
        .unwrap_or(0)
        + 2;

    let mut out = String::new();
    let _ = write!(out, "{:<width$}", corner);
    for t in error.terms() {
        let _ = write!(out, "{:>cell$}", t.name());
    }
    out.push('\n');

    for (d, dt) in delta.terms().iter().enumerate() {
        let _ = write!(out, "{:<width$}", dt.name());
        for e in 0..error.term_count() {
            let name = engine
                .rules()
                .lookup(e, d)
                .and_then(|r| output.terms().get(r.output))
                .map_or("-", |t| t.name());
            let _ = write!(out, "{:>cell$}", name);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::presets;

    #[test]
    fn grid_has_one_row_per_delta_term() {
        let engine = presets::drone_engine().unwrap();
        let table = render_rule_table(&engine);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);

        let header: Vec<&str> = lines[0].split_whitespace().collect();
        assert_eq!(&header[header.len() - 5..], ["Z", "P", "M", "G", "MG"]);

        // Row MN: the first entry of each error block.
        let mn: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(mn, ["MN", "MP", "MP", "P", "P", "M"]);
        let mp: Vec<&str> = lines[5].split_whitespace().collect();
        assert_eq!(mp, ["MP", "MG", "M", "G", "G", "MG"]);
    }
}
