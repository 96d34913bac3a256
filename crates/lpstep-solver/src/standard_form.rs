use crate::config::BigM;
use crate::problem::{ConstraintOp, Direction, LpProblem};
use crate::variables::{VariableCatalog, VariableKind};

/// A problem rewritten as equalities over decision, slack, surplus and artificial variables
#[derive(Debug, Clone, PartialEq)]
pub struct StandardForm {
    pub catalog: VariableCatalog,
    /// One row per constraint, one entry per catalog column
    pub rows: Vec<Vec<f64>>,
    pub rhs: Vec<f64>,
    /// Extended cost vector, one entry per catalog column
    pub costs: Vec<f64>,
    pub direction: Direction,
    /// Penalty magnitude given to artificial variables
    pub big_m: f64,
    /// Constraints that were multiplied by -1 to make their rhs non-negative
    pub negated_rows: Vec<usize>,
}

impl StandardForm {
    /// Convert `problem`, which must already have passed [`LpProblem::validate`].
    pub fn build(problem: &LpProblem, big_m: BigM) -> Self {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();
        let m = big_m.resolve(problem.input_scale());
        // The penalty always works against the objective
        let penalty = match problem.objective.direction {
            Direction::Minimize => m,
            Direction::Maximize => -m,
        };

        let mut catalog = VariableCatalog::new(&problem.variables);
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(n_constraints);
        let mut rhs = Vec::with_capacity(n_constraints);
        let mut costs = problem.objective.coefficients.clone();
        let mut negated_rows = Vec::new();
        let mut added: Vec<(usize, f64)> = Vec::new();

        for (i, c) in problem.constraints.iter().enumerate() {
            let mut row = c.coefficients.clone();
            let mut b = c.rhs;
            let mut op = c.op;
            if b < 0.0 {
                row.iter_mut().for_each(|v| *v = -*v);
                b = -b;
                op = op.flipped();
                negated_rows.push(i);
            }
            rows.push(row);
            rhs.push(b);

            match op {
                ConstraintOp::Le => {
                    added.push((i, 1.0));
                    catalog.add(VariableKind::Slack);
                    costs.push(0.0);
                }
                ConstraintOp::Ge => {
                    added.push((i, -1.0));
                    catalog.add(VariableKind::Surplus);
                    costs.push(0.0);

                    added.push((i, 1.0));
                    catalog.add(VariableKind::Artificial);
                    costs.push(penalty);
                }
                ConstraintOp::Eq => {
                    added.push((i, 1.0));
                    catalog.add(VariableKind::Artificial);
                    costs.push(penalty);
                }
            }
        }

        // Each added variable owns one column with a single nonzero entry
        for row in rows.iter_mut() {
            row.resize(n_vars + added.len(), 0.0);
        }
        for (k, &(row, value)) in added.iter().enumerate() {
            rows[row][n_vars + k] = value;
        }

        Self {
            catalog,
            rows,
            rhs,
            costs,
            direction: problem.objective.direction,
            big_m: m,
            negated_rows,
        }
    }

    pub fn num_constraints(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.catalog.len()
    }

    pub fn num_decision(&self) -> usize {
        self.catalog.decision_count()
    }

    pub fn column(&self, j: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row[j])
    }
}
