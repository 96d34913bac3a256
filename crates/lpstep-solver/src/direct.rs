use crate::config::Tolerance;
use crate::problem::{ConstraintOp, Direction, LpProblem};

/// Answer of a solver that skips the step-by-step trace
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DirectSolution {
    pub success: bool,
    pub optimal_value: Option<f64>,
    pub values: Option<Vec<f64>>,
    pub message: String,
}

impl DirectSolution {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            optimal_value: None,
            values: None,
            message: message.into(),
        }
    }
}

/// A quiet solver used as the authoritative answer next to the step trace
pub trait DirectSolver {
    fn solve_direct(&self, problem: &LpProblem) -> DirectSolution;
}

/// Two-phase simplex: phase 1 drives the artificial variables to zero,
/// phase 2 optimizes the real objective with artificial columns barred.
pub struct TwoPhaseSolver {
    /// Maximum iterations per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: Tolerance,
}

impl Default for TwoPhaseSolver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: Tolerance::new(1e-9),
        }
    }
}

enum PhaseResult {
    Optimal,
    Unbounded,
    IterationLimit,
}

struct PhaseTableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl TwoPhaseSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = Tolerance::new(tol);
        self
    }

    fn build_tableau(&self, problem: &LpProblem) -> PhaseTableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        let mut n_slack = 0;
        let mut n_artificial = 0;
        for c in &problem.constraints {
            match effective_op(c.op, c.rhs) {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let mut tableau = PhaseTableau {
            data: vec![vec![0.0; total_cols]; n_constraints + 1],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, c) in problem.constraints.iter().enumerate() {
            // Keep the RHS non-negative
            let sign = if c.rhs < 0.0 { -1.0 } else { 1.0 };
            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = sign * coef;
            }
            tableau.data[i][total_cols - 1] = sign * c.rhs;

            match effective_op(c.op, c.rhs) {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row holds c_j - z_j of a maximization; minimization is negated
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            tableau.data[obj_row][j] = match problem.objective.direction {
                Direction::Maximize => coef,
                Direction::Minimize => -coef,
            };
        }

        tableau
    }

    /// Returns `Ok(true)` when a feasible basis was found
    fn phase1(&self, tableau: &mut PhaseTableau) -> Result<bool, PhaseResult> {
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.n_vars + tableau.n_slack;

        let orig_obj = tableau.data[n_constraints].clone();

        // Maximize -sum(artificials)
        tableau.data[n_constraints].iter_mut().for_each(|v| *v = 0.0);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        match self.optimize(tableau, n_cols - 1) {
            // Phase 1 is bounded below by zero
            PhaseResult::Optimal | PhaseResult::Unbounded => {}
            PhaseResult::IterationLimit => return Err(PhaseResult::IterationLimit),
        }

        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start
                && !self.tolerance.is_zero(tableau.data[i][rhs_col])
            {
                return Ok(false);
            }
        }

        self.drive_out_artificials(tableau);

        // Restore the real objective and price out the basic columns
        let n_constraints = tableau.data.len() - 1;
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_constraints][basic];
            if !self.tolerance.is_zero(ratio) {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        Ok(true)
    }

    /// Pivot artificials left basic at zero onto a real column of their row.
    /// A row with no such column is redundant and dropped.
    fn drive_out_artificials(&self, tableau: &mut PhaseTableau) {
        let art_start = tableau.n_vars + tableau.n_slack;
        let mut i = 0;
        while i < tableau.basic_vars.len() {
            if tableau.basic_vars[i] < art_start {
                i += 1;
                continue;
            }
            let replacement = (0..art_start).find(|&j| !self.tolerance.is_zero(tableau.data[i][j]));
            match replacement {
                Some(col) => {
                    pivot(tableau, i, col);
                    i += 1;
                }
                None => {
                    tableau.data.remove(i);
                    tableau.basic_vars.remove(i);
                }
            }
        }
    }

    fn phase2(&self, tableau: &mut PhaseTableau) -> PhaseResult {
        // Artificial columns may not re-enter
        let exclude_from = tableau.n_vars + tableau.n_slack;
        self.optimize(tableau, exclude_from)
    }

    fn optimize(&self, tableau: &mut PhaseTableau, column_limit: usize) -> PhaseResult {
        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_pivot_column(tableau, column_limit) else {
                return PhaseResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return PhaseResult::Unbounded;
            };
            pivot(tableau, pivot_row, pivot_col);
        }
        PhaseResult::IterationLimit
    }

    /// Most positive reduced cost among the first `column_limit` columns
    fn find_pivot_column(&self, tableau: &PhaseTableau, column_limit: usize) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;
        let mut max_val = self.tolerance.epsilon();
        let mut max_col = None;

        for j in 0..column_limit {
            if tableau.data[obj_row][j] > max_val {
                max_val = tableau.data[obj_row][j];
                max_col = Some(j);
            }
        }

        max_col
    }

    fn find_pivot_row(&self, tableau: &PhaseTableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if self.tolerance.is_positive(val) {
                let ratio = tableau.data[i][rhs_col] / val;
                if ratio >= 0.0 && ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }
}

impl DirectSolver for TwoPhaseSolver {
    fn solve_direct(&self, problem: &LpProblem) -> DirectSolution {
        if let Err(e) = problem.validate() {
            return DirectSolution::failure(e.to_string());
        }

        let mut tableau = self.build_tableau(problem);

        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                Ok(true) => {}
                Ok(false) => return DirectSolution::failure("The problem is infeasible."),
                Err(_) => return DirectSolution::failure("Iteration limit reached in phase 1."),
            }
        }

        match self.phase2(&mut tableau) {
            PhaseResult::Optimal => {}
            PhaseResult::Unbounded => return DirectSolution::failure("The problem is unbounded."),
            PhaseResult::IterationLimit => {
                return DirectSolution::failure("Iteration limit reached in phase 2.");
            }
        }

        let n_vars = problem.num_variables();
        let rhs_col = tableau.data[0].len() - 1;
        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                values[basic] = tableau.data[i][rhs_col];
            }
        }
        let optimal_value = problem.evaluate(&values);

        tracing::debug!(optimal_value, "direct solve finished");
        DirectSolution {
            success: true,
            optimal_value: Some(optimal_value),
            values: Some(values),
            message: "Optimization terminated successfully.".to_string(),
        }
    }
}

/// The operator after a negative RHS has been flipped positive
fn effective_op(op: ConstraintOp, rhs: f64) -> ConstraintOp {
    if rhs < 0.0 { op.flipped() } else { op }
}

fn pivot(tableau: &mut PhaseTableau, row: usize, col: usize) {
    tableau.basic_vars[row] = col;

    let pivot_val = tableau.data[row][col];
    for v in tableau.data[row].iter_mut() {
        *v /= pivot_val;
    }

    let pivot_row = tableau.data[row].clone();
    for (i, other) in tableau.data.iter_mut().enumerate() {
        if i != row {
            let factor = other[col];
            for (v, &p) in other.iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![3.0, 2.0], Direction::Maximize);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = TwoPhaseSolver::new().solve_direct(&problem);

        assert!(solution.success, "{}", solution.message);
        let values = solution.values.unwrap();
        assert!((values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", values[0]);
        assert!((values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", values[1]);
        let obj = solution.optimal_value.unwrap();
        assert!((obj - 11.0).abs() < 1e-6, "obj = {} (expected 11)", obj);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![2.0, 3.0], Direction::Minimize);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = TwoPhaseSolver::new().solve_direct(&problem);

        assert!(solution.success, "{}", solution.message);
        let values = solution.values.unwrap();
        assert!((values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", values[0]);
        assert!((values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", values[1]);
        assert!((solution.optimal_value.unwrap() - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], Direction::Minimize);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = TwoPhaseSolver::new().solve_direct(&problem);

        assert!(!solution.success);
        assert!(solution.message.contains("infeasible"));
        assert_eq!(solution.values, None);
    }

    #[test]
    fn test_unbounded() {
        let mut problem = LpProblem::with_default_names(2);
        problem.set_objective(vec![1.0, 1.0], Direction::Maximize);
        problem.add_constraint("c1", vec![1.0, -1.0], ConstraintOp::Le, 1.0);
        problem.add_constraint("c2", vec![-1.0, 1.0], ConstraintOp::Le, 1.0);

        let solution = TwoPhaseSolver::new().solve_direct(&problem);

        assert!(!solution.success);
        assert!(solution.message.contains("unbounded"));
    }

    #[test]
    fn test_negative_rhs() {
        // -x - y <= -2 is x + y >= 2
        let mut problem = LpProblem::with_default_names(2);
        problem.set_objective(vec![1.0, 2.0], Direction::Minimize);
        problem.add_constraint("c1", vec![-1.0, -1.0], ConstraintOp::Le, -2.0);
        problem.add_constraint("c2", vec![1.0, 0.0], ConstraintOp::Le, 5.0);

        let solution = TwoPhaseSolver::new().solve_direct(&problem);

        assert!(solution.success, "{}", solution.message);
        assert!((solution.optimal_value.unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_level_artificial_leaves_basis() {
        // Phase 1 ends with a1 basic at zero in the equality row; x1 = 2 is the only feasible point
        let mut problem = LpProblem::with_default_names(3);
        problem.set_objective(vec![4.0, 6.0, -4.0], Direction::Minimize);
        problem.add_constraint("c1", vec![1.0, 4.0, 4.0], ConstraintOp::Le, 2.0);
        problem.add_constraint("c2", vec![5.0, -3.0, 1.0], ConstraintOp::Eq, 10.0);

        let solution = TwoPhaseSolver::new().solve_direct(&problem);

        assert!(solution.success, "{}", solution.message);
        let values = solution.values.unwrap();
        assert!(problem.violations(&values, Tolerance::new(1e-6)).is_empty());
        assert!((values[0] - 2.0).abs() < 1e-6, "x1 = {} (expected 2)", values[0]);
        assert!((solution.optimal_value.unwrap() - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_rhs_equality_is_not_unbounded() {
        // -2x1 = 0 pins x1 to zero; x2 only lowers the objective
        let mut problem = LpProblem::with_default_names(2);
        problem.set_objective(vec![5.0, -2.0], Direction::Maximize);
        problem.add_constraint("c1", vec![5.0, 5.0], ConstraintOp::Ge, -2.0);
        problem.add_constraint("c2", vec![-2.0, 0.0], ConstraintOp::Eq, 0.0);

        let solution = TwoPhaseSolver::new().solve_direct(&problem);

        assert!(solution.success, "{}", solution.message);
        assert_eq!(solution.values, Some(vec![0.0, 0.0]));
        assert!(solution.optimal_value.unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_redundant_equality_is_dropped() {
        // c2 repeats c1, so its artificial has no real column to pivot on
        let mut problem = LpProblem::with_default_names(2);
        problem.set_objective(vec![1.0, 2.0], Direction::Maximize);
        problem.add_constraint("c1", vec![1.0, 1.0], ConstraintOp::Eq, 3.0);
        problem.add_constraint("c2", vec![1.0, 1.0], ConstraintOp::Eq, 3.0);

        let solution = TwoPhaseSolver::new().solve_direct(&problem);

        assert!(solution.success, "{}", solution.message);
        assert!((solution.optimal_value.unwrap() - 6.0).abs() < 1e-6);
        assert!((solution.values.unwrap()[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_problem_is_reported() {
        let mut problem = LpProblem::with_default_names(2);
        problem.set_objective(vec![1.0], Direction::Maximize);
        let solution = TwoPhaseSolver::new().solve_direct(&problem);
        assert!(!solution.success);
        assert!(solution.message.contains("coefficients"));
    }
}
