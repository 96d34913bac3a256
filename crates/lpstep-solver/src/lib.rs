//! Big-M tableau simplex for small linear programs, with a step-by-step trace.

mod basis;
mod config;
mod direct;
mod format;
mod plot;
mod problem;
mod simplex;
mod solution;
mod standard_form;
mod tableau;
mod trace;
mod variables;

pub use basis::{Basis, BasisError};
pub use config::{BigM, SolverConfig, Tolerance};
pub use direct::{DirectSolution, DirectSolver, TwoPhaseSolver};
pub use format::{ValueFormat, best_rational, render_tableau};
pub use plot::render_feasible_region;
pub use problem::{
    Constraint, ConstraintOp, ConstraintViolation, Direction, LpProblem, Objective, ProblemError,
    ProblemLimits,
};
pub use simplex::{SimplexError, SimplexRun, TableauSolver, run_simplex};
pub use solution::{ResidualArtificial, Solution, SolutionStatus, residual_artificial};
pub use standard_form::StandardForm;
pub use tableau::{IterationOutcome, Tableau, Termination};
pub use trace::Trace;
pub use variables::{Variable, VariableCatalog, VariableKind};
