/// Absolute tolerance used for every floating point comparison in the engine.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance(f64);

impl Tolerance {
    pub const DEFAULT: Tolerance = Tolerance(1e-6);

    pub fn new(epsilon: f64) -> Self {
        Self(epsilon.abs())
    }

    pub fn epsilon(self) -> f64 {
        self.0
    }

    /// `|value| <= ε`
    pub fn is_zero(self, value: f64) -> bool {
        value.abs() <= self.0
    }

    /// `value > ε`
    pub fn is_positive(self, value: f64) -> bool {
        value > self.0
    }

    /// `value < -ε`
    pub fn is_negative(self, value: f64) -> bool {
        value < -self.0
    }

    pub fn approx_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// How the Big-M penalty for artificial variables is chosen
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BigM {
    /// A fixed penalty, independent of the input
    Fixed(f64),
    /// `factor * max(1, largest absolute coefficient, cost or rhs)`
    Scaled(f64),
}

impl BigM {
    /// Resolve the penalty for a problem whose largest input magnitude is `input_scale`
    pub fn resolve(self, input_scale: f64) -> f64 {
        match self {
            BigM::Fixed(m) => m.abs(),
            BigM::Scaled(factor) => factor.abs() * input_scale.abs().max(1.0),
        }
    }
}

impl Default for BigM {
    fn default() -> Self {
        BigM::Fixed(1e6)
    }
}

/// Settings for the step-by-step tableau solver
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Tolerance for zero tests, optimality, and the ratio test
    pub tolerance: Tolerance,
    /// Pivots allowed before giving up
    pub max_iterations: usize,
    /// Penalty for artificial variables
    pub big_m: BigM,
    /// Largest denominator used when printing tableau cells as fractions
    pub max_denominator: i64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::DEFAULT,
            max_iterations: 100,
            big_m: BigM::default(),
            max_denominator: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_comparisons() {
        let tol = Tolerance::new(1e-6);
        assert!(tol.is_zero(5e-7));
        assert!(tol.is_zero(-1e-6));
        assert!(!tol.is_zero(2e-6));
        assert!(tol.is_positive(1e-5));
        assert!(!tol.is_positive(1e-7));
        assert!(tol.is_negative(-1e-5));
        assert!(!tol.is_negative(-1e-7));
    }

    #[test]
    fn test_big_m_resolution() {
        assert_eq!(BigM::Fixed(1e6).resolve(42.0), 1e6);
        assert_eq!(BigM::Scaled(1e6).resolve(0.5), 1e6);
        assert_eq!(BigM::Scaled(1e6).resolve(250.0), 2.5e8);
    }
}
