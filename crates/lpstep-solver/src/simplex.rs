use thiserror::Error;

use crate::basis::{Basis, BasisError};
use crate::config::{BigM, SolverConfig, Tolerance};
use crate::format::ValueFormat;
use crate::problem::{LpProblem, ProblemError};
use crate::solution::{Solution, SolutionStatus, residual_artificial};
use crate::standard_form::StandardForm;
use crate::tableau::Tableau;
use crate::trace::Trace;
use crate::variables::{VariableCatalog, VariableKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimplexError {
    #[error("Invalid problem: {0}")]
    Problem(#[from] ProblemError),
    #[error("Inconsistent standard form: {0}")]
    Basis(#[from] BasisError),
}

/// Everything produced by one run of the tableau engine
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexRun {
    pub trace: Trace,
    pub solution: Solution,
    /// Pivots performed
    pub iterations: usize,
    pub catalog: VariableCatalog,
    /// Terminal (or, at the iteration limit, partial) tableau
    pub tableau: Tableau,
}

/// Big-M tableau simplex that explains every step
#[derive(Debug, Clone, Default)]
pub struct TableauSolver {
    config: SolverConfig,
}

impl TableauSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.config.tolerance = Tolerance::new(tol);
        self
    }

    pub fn with_big_m(mut self, big_m: BigM) -> Self {
        self.config.big_m = big_m;
        self
    }

    pub fn with_max_denominator(mut self, max: i64) -> Self {
        self.config.max_denominator = max;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve `problem`, returning the trace and the extracted solution.
    ///
    /// Unbounded, infeasible and iteration-limit outcomes are reported through
    /// [`SolutionStatus`]; `Err` is reserved for malformed input and internal
    /// inconsistencies.
    pub fn run(&self, problem: &LpProblem) -> Result<SimplexRun, SimplexError> {
        problem.validate()?;

        let tol = self.config.tolerance;
        let format = ValueFormat::from(&self.config);
        let direction = problem.objective.direction;
        let mut trace = Trace::new();
        trace.push("=== SIMPLEX METHOD ===");

        let form = StandardForm::build(problem, self.config.big_m);
        self.describe_standard_form(&form, &format, &mut trace);

        let basis = Basis::select(&form, tol)?;
        let mut tableau = Tableau::new(&form, basis);
        trace.push("\nInitial tableau:");
        trace.push(tableau.render(&form.catalog, &format));

        let outcome = tableau.iterate(&form.catalog, direction, &self.config, &mut trace);

        let solution = Solution::extract(&tableau, &form.catalog, outcome.termination, tol);
        self.describe_solution(&solution, &tableau, &form.catalog, &mut trace);

        Ok(SimplexRun {
            trace,
            solution,
            iterations: outcome.iterations,
            catalog: form.catalog,
            tableau,
        })
    }

    fn describe_standard_form(&self, form: &StandardForm, format: &ValueFormat, trace: &mut Trace) {
        let terms: Vec<String> = form
            .catalog
            .iter()
            .map(|v| format!("{}{}", format.format(form.costs[v.column]), v.name))
            .collect();
        let names: Vec<&str> = form.catalog.names().collect();
        let artificials = form.catalog.count(VariableKind::Artificial);

        trace.push("Standard form:");
        trace.push(format!("• Objective ({}): {}", form.direction, terms.join(" + ")));
        trace.push(format!("• Variables: {}", names.join(", ")));
        trace.push(format!("• Artificial variables added: {}", artificials));
        if artificials > 0 {
            trace.push(format!("• Big-M penalty: M = {}", format.format(form.big_m)));
        }
        for &row in &form.negated_rows {
            trace.push(format!(
                "• Constraint {} was multiplied by -1 to make its right-hand side non-negative",
                row + 1
            ));
        }
    }

    fn describe_solution(
        &self,
        solution: &Solution,
        tableau: &Tableau,
        catalog: &VariableCatalog,
        trace: &mut Trace,
    ) {
        trace.push("\n=== FINAL SOLUTION ===");

        match solution.status {
            SolutionStatus::Unbounded => {
                trace.push("The problem is unbounded");
                return;
            }
            SolutionStatus::Infeasible => {
                if let Some(residual) = residual_artificial(tableau, catalog, self.config.tolerance) {
                    tracing::warn!(artificial = %residual.name, value = residual.value, "infeasible problem");
                    trace.push(format!(
                        "The problem is infeasible: artificial variable {} remains basic with value {:.4}",
                        residual.name, residual.value
                    ));
                }
                return;
            }
            SolutionStatus::IterationLimit => {
                trace.push("Best basic solution reached before the iteration limit:");
            }
            SolutionStatus::Optimal => {}
        }

        trace.push("Variable values:");
        for (j, value) in solution.values.iter().enumerate() {
            trace.push(format!("• {} = {:.4}", catalog.name(j), value));
        }
        if let Some(value) = solution.objective_value {
            let label = if solution.is_optimal() {
                "Optimal value"
            } else {
                "Objective value"
            };
            trace.push(format!("\n{}: {:.4}", label, value));
        }
    }
}

/// Run the tableau engine with the default configuration
pub fn run_simplex(problem: &LpProblem) -> Result<SimplexRun, SimplexError> {
    TableauSolver::new().run(problem)
}
