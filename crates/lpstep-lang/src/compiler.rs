use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use lpstep_solver::{LpProblem, ProblemError, ProblemLimits};
use thiserror::Error;

use crate::ast::*;
use crate::lexer::Span;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Duplicate constraint label '{label}' at position {span:?}")]
    DuplicateLabel { label: String, span: Span },
    #[error("Constraint '{0}' has no nonzero coefficients")]
    EmptyExpression(String),
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

/// Compiler for converting a parsed program into an LP problem
pub struct Compiler {
    limits: Option<ProblemLimits>,
}

impl Compiler {
    /// A compiler enforcing the default size limits
    pub fn new() -> Self {
        Self {
            limits: Some(ProblemLimits::default()),
        }
    }

    pub fn with_limits(limits: ProblemLimits) -> Self {
        Self {
            limits: Some(limits),
        }
    }

    /// A compiler that accepts problems of any size
    pub fn unbounded_size() -> Self {
        Self { limits: None }
    }

    pub fn compile(&self, program: &Program) -> Result<LpProblem, CompileError> {
        let variables = collect_variables(program);
        let index: HashMap<&str, usize> = variables
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut problem = LpProblem::new(variables.clone());
        problem.set_objective(
            coefficients(&program.objective.expr, &index),
            program.objective.direction,
        );

        let labels = self.constraint_labels(&program.constraints)?;
        for (decl, label) in program.constraints.iter().zip(labels) {
            let row = coefficients(&decl.expr, &index);
            if row.iter().all(|&c| c == 0.0) {
                return Err(CompileError::EmptyExpression(label));
            }
            problem.add_constraint(label, row, decl.op, decl.rhs);
        }

        problem.validate()?;
        if let Some(limits) = &self.limits {
            problem.check_limits(limits)?;
        }
        Ok(problem)
    }

    /// Explicit labels must be unique; unlabeled rows get the first free `c<k>`
    fn constraint_labels(&self, constraints: &[ConstraintDecl]) -> Result<Vec<String>, CompileError> {
        let mut taken = HashSet::new();
        for label in constraints.iter().filter_map(|c| c.label.as_ref()) {
            if !taken.insert(label.name.clone()) {
                return Err(CompileError::DuplicateLabel {
                    label: label.name.clone(),
                    span: label.span,
                });
            }
        }

        let mut labels = Vec::with_capacity(constraints.len());
        let mut next = 1;
        for (i, decl) in constraints.iter().enumerate() {
            match &decl.label {
                Some(label) => labels.push(label.name.clone()),
                None => {
                    next = next.max(i + 1);
                    while taken.contains(&format!("c{}", next)) {
                        next += 1;
                    }
                    let name = format!("c{}", next);
                    taken.insert(name.clone());
                    labels.push(name);
                }
            }
        }
        Ok(labels)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum repeated variables into one coefficient per column
fn coefficients(expr: &LinearExpr, index: &HashMap<&str, usize>) -> Vec<f64> {
    let mut row = vec![0.0; index.len()];
    for term in &expr.terms {
        if let Some(&column) = index.get(term.variable.as_str()) {
            row[column] += term.coefficient;
        }
    }
    row
}

fn collect_variables(program: &Program) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut variables: Vec<String> = program
        .mentioned_variables()
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect();
    variables.sort_by(|a, b| natural_cmp(a, b));
    variables
}

/// Alphabetic prefix first, then numeric suffix, so `x2` sorts before `x10`
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (prefix_a, suffix_a) = split_suffix(a);
    let (prefix_b, suffix_b) = split_suffix(b);
    prefix_a
        .cmp(prefix_b)
        .then_with(|| suffix_a.cmp(&suffix_b))
        .then_with(|| a.cmp(b))
}

fn split_suffix(name: &str) -> (&str, Option<u64>) {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (prefix, suffix) = name.split_at(name.len() - digits);
    (prefix, suffix.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use lpstep_solver::{ConstraintOp, Direction, SolutionStatus, run_simplex};

    fn compile(source: &str) -> Result<LpProblem, CompileError> {
        let program = Parser::parse(source).unwrap();
        Compiler::new().compile(&program)
    }

    #[test]
    fn test_compile_simple_problem() {
        let problem = compile(
            r#"
            maximize 3x1 + 2x2
            subject to
              c1: x1 + x2 <= 4
              x1 + 3x2 <= 6
            "#,
        )
        .unwrap();

        assert_eq!(problem.variables, vec!["x1", "x2"]);
        assert_eq!(problem.objective.coefficients, vec![3.0, 2.0]);
        assert_eq!(problem.objective.direction, Direction::Maximize);
        assert_eq!(problem.constraints[0].name, "c1");
        assert_eq!(problem.constraints[1].name, "c2");
        assert_eq!(problem.constraints[1].coefficients, vec![1.0, 3.0]);
        assert_eq!(problem.constraints[1].op, ConstraintOp::Le);
    }

    #[test]
    fn test_compile_and_solve() {
        let problem = compile(
            r#"
            min 2x1 + 3x2
            s.t.
              x1 + x2 >= 4
              x1 >= 1
            "#,
        )
        .unwrap();

        let run = run_simplex(&problem).unwrap();
        assert_eq!(run.solution.status, SolutionStatus::Optimal);
        assert!((run.solution.objective_value.unwrap() - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_natural_variable_order() {
        let problem = compile("max x10 + x2 + y + x1\nx1 + x2 <= 3\nx10 + y <= 2").unwrap();
        assert_eq!(problem.variables, vec!["x1", "x2", "x10", "y"]);
        assert_eq!(problem.objective.coefficients, vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_repeated_variables_are_summed() {
        let problem = compile("max x1 + x2 + 2x1\nx1 - x2 + x2 + x1 <= 4\nx2 <= 1").unwrap();
        assert_eq!(problem.objective.coefficients, vec![3.0, 1.0]);
        assert_eq!(problem.constraints[0].coefficients, vec![2.0, 0.0]);
    }

    #[test]
    fn test_constraint_only_variable_gets_zero_cost() {
        let problem = compile("max x1\nx1 + x2 <= 3\nx2 >= 1").unwrap();
        assert_eq!(problem.variables, vec!["x1", "x2"]);
        assert_eq!(problem.objective.coefficients, vec![1.0, 0.0]);
    }

    #[test]
    fn test_duplicate_label() {
        let err = compile("max x1 + x2\na: x1 <= 1\na: x2 <= 1").unwrap_err();
        assert!(matches!(err, CompileError::DuplicateLabel { ref label, .. } if label == "a"));
    }

    #[test]
    fn test_generated_labels_skip_explicit_ones() {
        let problem = compile("max x1 + x2\nx1 <= 1\nc1: x2 <= 1").unwrap();
        assert_eq!(problem.constraints[0].name, "c2");
        assert_eq!(problem.constraints[1].name, "c1");
    }

    #[test]
    fn test_empty_expression() {
        let err = compile("max x1 + x2\nx1 - x1 <= 1\nx2 <= 1").unwrap_err();
        assert_eq!(err, CompileError::EmptyExpression("c1".to_string()));
    }

    #[test]
    fn test_size_limits() {
        let err = compile("max x1 + x2\nx1 <= 1").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Problem(ProblemError::ConstraintCount { found: 1, .. })
        ));

        let program = Parser::parse("max x1 + x2\nx1 <= 1").unwrap();
        assert!(Compiler::unbounded_size().compile(&program).is_ok());
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("x2", "x10"), Ordering::Less);
        assert_eq!(natural_cmp("x", "x1"), Ordering::Less);
        assert_eq!(natural_cmp("a9", "b1"), Ordering::Less);
        assert_eq!(split_suffix("x12"), ("x", Some(12)));
        assert_eq!(split_suffix("y"), ("y", None));
    }
}
