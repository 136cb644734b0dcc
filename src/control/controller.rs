/// Trait for motor-power laws.
///
/// Implement this to plug a different controller into the tick loop in
/// place of the fuzzy engine.
pub trait Controller {
    /// Motor power in [0, 1] for the current absolute error and its change
    /// since the previous tick.
    fn motor_power(&mut self, error: f64, delta_error: f64) -> f64;

    /// Reset controller internal state. Called whenever tracking (re)starts.
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn motor_power(&mut self, error: f64, delta_error: f64) -> f64 {
        (**self).motor_power(error, delta_error)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<C: Controller + ?Sized> Controller for &mut C {
    fn motor_power(&mut self, error: f64, delta_error: f64) -> f64 {
        (**self).motor_power(error, delta_error)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
