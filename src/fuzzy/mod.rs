pub mod membership;
pub mod variable;
pub mod rules;
pub mod engine;
pub mod presets;

pub use membership::{Shape, Term};
pub use variable::{FuzzyVariable, VariableBuilder};
pub use rules::{Rule, RuleBase};
pub use engine::{Inference, InferenceEngine};
