use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Membership shapes
// ---------------------------------------------------------------------------

/// Piecewise-linear membership function.
///
/// Breakpoints are non-decreasing. Adjacent breakpoints may coincide, which
/// makes that edge vertical: `Triangular(0, 0, 5)` is a left shoulder that is
/// fully true at 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// (left foot, peak, right foot)
    Triangular(f64, f64, f64),
    /// (left foot, left top, right top, right foot)
    Trapezoidal(f64, f64, f64, f64),
}

impl Shape {
    /// Breakpoints as a trapezoid; a triangle is a trapezoid with a
    /// single-point plateau.
    fn corners(&self) -> (f64, f64, f64, f64) {
        match *self {
            Shape::Triangular(a, b, c) => (a, b, b, c),
            Shape::Trapezoidal(a, b, c, d) => (a, b, c, d),
        }
    }

    /// Degree of membership of `x`, always in [0, 1].
    pub fn membership(&self, x: f64) -> f64 {
        let (a, b, c, d) = self.corners();
        if x < a || x > d {
            0.0
        } else if x >= b && x <= c {
            1.0
        } else if x < b {
            // a <= x < b, so b > a
            (x - a) / (b - a)
        } else {
            // c < x <= d, so d > c
            (d - x) / (d - c)
        }
    }

    /// Support interval `[left foot, right foot]`.
    pub fn support(&self) -> (f64, f64) {
        let (a, _, _, d) = self.corners();
        (a, d)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let (a, b, c, d) = self.corners();
        if ![a, b, c, d].iter().all(|v| v.is_finite()) {
            return Err("breakpoints must be finite".into());
        }
        if !(a <= b && b <= c && c <= d) {
            return Err(format!("breakpoints must be non-decreasing, got {:?}", self));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Linguistic term
// ---------------------------------------------------------------------------

/// A named linguistic term ("Z", "MG", ...) with its membership shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    name: String,
    shape: Shape,
}

impl Term {
    pub fn new(name: impl Into<String>, shape: Shape) -> Result<Self> {
        let name = name.into();
        shape
            .validate()
            .map_err(|reason| Error::InvalidShape { term: name.clone(), reason })?;
        Ok(Self { name, shape })
    }

    pub fn triangular(name: impl Into<String>, a: f64, b: f64, c: f64) -> Result<Self> {
        Self::new(name, Shape::Triangular(a, b, c))
    }

    pub fn trapezoidal(name: impl Into<String>, a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        Self::new(name, Shape::Trapezoidal(a, b, c, d))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn membership(&self, x: f64) -> f64 {
        self.shape.membership(x)
    }
}
