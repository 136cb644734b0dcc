use crate::error::Result;
use crate::fuzzy::{presets, InferenceEngine};

// ---------------------------------------------------------------------------
// Fuzzy controller: the inference engine behind the Controller trait
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FuzzyController {
    engine: InferenceEngine,
}

impl FuzzyController {
    pub fn new(engine: InferenceEngine) -> Self {
        Self { engine }
    }

    /// Controller with the default drone variables and rule table.
    pub fn drone() -> Result<Self> {
        Ok(Self::new(presets::drone_engine()?))
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }
}

impl super::Controller for FuzzyController {
    fn motor_power(&mut self, error: f64, delta_error: f64) -> f64 {
        self.engine.infer(error, delta_error)
    }

    fn name(&self) -> &str {
        "FuzzyController"
    }
}
