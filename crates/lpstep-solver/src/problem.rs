use std::fmt;

use thiserror::Error;

use crate::config::Tolerance;

/// Represents a linear programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Decision variable names
    #[cfg_attr(feature = "serde", serde(default))]
    pub variables: Vec<String>,
    /// Objective function
    pub objective: Objective,
    /// Constraints, in row order
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to maximize or minimize
    pub direction: Direction,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "==", alias = "="))]
    Eq,
}

impl ConstraintOp {
    /// The operator obtained by multiplying both sides by -1
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintOp::Le => write!(f, "<="),
            ConstraintOp::Ge => write!(f, ">="),
            ConstraintOp::Eq => write!(f, "="),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Maximize => write!(f, "maximize"),
            Direction::Minimize => write!(f, "minimize"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Objective has {found} coefficients but there are {expected} variables")]
    ObjectiveLength { expected: usize, found: usize },
    #[error("Constraint {index} has {found} coefficients but there are {expected} variables")]
    ConstraintLength {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
    #[error("Number of variables must be between {min} and {max}, got {found}")]
    VariableCount { min: usize, max: usize, found: usize },
    #[error("Number of constraints must be between {min} and {max}, got {found}")]
    ConstraintCount { min: usize, max: usize, found: usize },
}

/// Size bounds applied to user input before it reaches the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemLimits {
    pub min_variables: usize,
    pub max_variables: usize,
    pub min_constraints: usize,
    pub max_constraints: usize,
}

impl Default for ProblemLimits {
    fn default() -> Self {
        Self {
            min_variables: 2,
            max_variables: 5,
            min_constraints: 2,
            max_constraints: 5,
        }
    }
}

/// Information about a violated constraint
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                direction: Direction::Minimize,
            },
            constraints: Vec::new(),
        }
    }

    /// A problem over `x1..xn`
    pub fn with_default_names(n: usize) -> Self {
        Self::new(default_names(n))
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, direction: Direction) {
        self.objective = Objective {
            coefficients,
            direction,
        };
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Name every variable `x1..xn` if none were given, and label unnamed constraints `c1..cm`
    pub fn fill_default_names(&mut self) {
        if self.variables.is_empty() {
            self.variables = default_names(self.objective.coefficients.len());
        }
        for (i, c) in self.constraints.iter_mut().enumerate() {
            if c.name.is_empty() {
                c.name = format!("c{}", i + 1);
            }
        }
    }

    /// Check that every coefficient vector matches the variable count and every value is finite
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.num_variables();
        if self.objective.coefficients.len() != n {
            return Err(ProblemError::ObjectiveLength {
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ProblemError::NonFinite("objective".to_string()));
        }
        for (i, c) in self.constraints.iter().enumerate() {
            if c.coefficients.len() != n {
                return Err(ProblemError::ConstraintLength {
                    index: i + 1,
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|v| !v.is_finite()) {
                return Err(ProblemError::NonFinite(format!("constraint {}", i + 1)));
            }
        }
        Ok(())
    }

    /// Check the variable and constraint counts against `limits`
    pub fn check_limits(&self, limits: &ProblemLimits) -> Result<(), ProblemError> {
        let n = self.num_variables();
        if n < limits.min_variables || n > limits.max_variables {
            return Err(ProblemError::VariableCount {
                min: limits.min_variables,
                max: limits.max_variables,
                found: n,
            });
        }
        let m = self.num_constraints();
        if m < limits.min_constraints || m > limits.max_constraints {
            return Err(ProblemError::ConstraintCount {
                min: limits.min_constraints,
                max: limits.max_constraints,
                found: m,
            });
        }
        Ok(())
    }

    /// Largest absolute value among costs, coefficients and right-hand sides
    pub fn input_scale(&self) -> f64 {
        let costs = self.objective.coefficients.iter();
        let rows = self
            .constraints
            .iter()
            .flat_map(|c| c.coefficients.iter().chain(std::iter::once(&c.rhs)));
        costs.chain(rows).fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Objective value at `values`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }

    /// Find which constraints (and non-negativity bounds) are violated by a given point
    pub fn violations(&self, values: &[f64], tolerance: Tolerance) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for (name, &value) in self.variables.iter().zip(values) {
            if tolerance.is_negative(value) {
                violations.push(ConstraintViolation {
                    constraint: format!("{} >= 0", name),
                    required: 0.0,
                    actual: value,
                    violation_amount: -value,
                    description: format!("{} is negative ({:.4})", name, value),
                });
            }
        }

        for c in &self.constraints {
            let lhs: f64 = c.coefficients.iter().zip(values).map(|(a, x)| a * x).sum();

            let violation = match c.op {
                ConstraintOp::Le if tolerance.is_positive(lhs - c.rhs) => {
                    let amt = lhs - c.rhs;
                    Some((amt, format!("{} exceeds maximum of {:.2} by {:.2}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Ge if tolerance.is_positive(c.rhs - lhs) => {
                    let amt = c.rhs - lhs;
                    Some((amt, format!("{} is below minimum of {:.2} by {:.2}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Eq if !tolerance.approx_eq(lhs, c.rhs) => Some((
                    (lhs - c.rhs).abs(),
                    format!("{} requires exactly {:.2} but got {:.2}", c.name, c.rhs, lhs),
                )),
                _ => None,
            };

            if let Some((violation_amount, description)) = violation {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual: lhs,
                    violation_amount,
                    description,
                });
            }
        }

        // Worst first
        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));

        violations
    }
}

fn default_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("x{}", i)).collect()
}
