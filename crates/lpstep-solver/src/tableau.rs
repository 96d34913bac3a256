use crate::basis::Basis;
use crate::config::{SolverConfig, Tolerance};
use crate::format::{ValueFormat, render_tableau};
use crate::problem::Direction;
use crate::solution::residual_artificial;
use crate::standard_form::StandardForm;
use crate::trace::Trace;
use crate::variables::VariableCatalog;

/// Constraint rows followed by the objective row, each ending in the RHS.
///
/// The objective row holds `z_j - c_j` for the current basis, so its RHS is the
/// objective value of the current basic solution in the problem's own direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    rows: Vec<Vec<f64>>,
    basis: Basis,
}

/// How the pivoting loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Optimal,
    /// No row limits the entering column
    Unbounded { column: usize },
    IterationLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationOutcome {
    pub termination: Termination,
    /// Pivots performed
    pub iterations: usize,
}

impl Tableau {
    /// Stack the standard form with its objective row, priced out against `basis`
    pub fn new(form: &StandardForm, basis: Basis) -> Self {
        let width = form.num_columns() + 1;
        let mut rows: Vec<Vec<f64>> = form
            .rows
            .iter()
            .zip(&form.rhs)
            .map(|(row, &b)| {
                let mut r = row.clone();
                r.push(b);
                r
            })
            .collect();

        let mut objective = vec![0.0; width];
        for (i, row) in rows.iter().enumerate() {
            let cost = form.costs[basis.column(i)];
            if cost != 0.0 {
                for (z, &a) in objective.iter_mut().zip(row) {
                    *z += cost * a;
                }
            }
        }
        for (z, &c) in objective.iter_mut().zip(&form.costs) {
            *z -= c;
        }
        rows.push(objective);

        Self { rows, basis }
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn num_constraints(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn rhs_column(&self) -> usize {
        self.rows[0].len() - 1
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.rows[row][self.rhs_column()]
    }

    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.rows[row][column]
    }

    /// Objective row without the RHS
    pub fn objective_row(&self) -> &[f64] {
        let obj = &self.rows[self.num_constraints()];
        &obj[..obj.len() - 1]
    }

    /// RHS of the objective row
    pub fn objective_value(&self) -> f64 {
        self.rhs(self.num_constraints())
    }

    /// Maximize: every entry `>= -ε`. Minimize: every entry `<= ε`.
    pub fn is_optimal(&self, direction: Direction, tolerance: Tolerance) -> bool {
        let row = self.objective_row();
        match direction {
            Direction::Maximize => row.iter().all(|&v| !tolerance.is_negative(v)),
            Direction::Minimize => row.iter().all(|&v| !tolerance.is_positive(v)),
        }
    }

    /// Most negative (maximize) or most positive (minimize) entry; ties go to the lowest column.
    /// `None` when the tableau is optimal.
    pub fn entering_column(&self, direction: Direction, tolerance: Tolerance) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (j, &v) in self.objective_row().iter().enumerate() {
            let improves = match direction {
                Direction::Maximize => tolerance.is_negative(v),
                Direction::Minimize => tolerance.is_positive(v),
            };
            if !improves {
                continue;
            }
            let better = match (best, direction) {
                (None, _) => true,
                (Some((_, b)), Direction::Maximize) => v < b,
                (Some((_, b)), Direction::Minimize) => v > b,
            };
            if better {
                best = Some((j, v));
            }
        }
        best.map(|(j, _)| j)
    }

    /// Ratio test over rows with an entry `> ε` in `column`; ties go to the lowest row.
    /// `None` means the entering variable can grow without bound.
    pub fn leaving_row(&self, column: usize, tolerance: Tolerance) -> Option<usize> {
        let rhs_col = self.rhs_column();
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 0..self.num_constraints() {
            let val = self.rows[i][column];
            if tolerance.is_positive(val) {
                let ratio = self.rows[i][rhs_col] / val;
                if min_row.is_none() || ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    /// Make `column` basic in `row`; returns the pivot element
    pub fn pivot(&mut self, row: usize, column: usize) -> f64 {
        let pivot_val = self.rows[row][column];
        for v in self.rows[row].iter_mut() {
            *v /= pivot_val;
        }

        let pivot_row = self.rows[row].clone();
        for (i, other) in self.rows.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = other[column];
            if factor != 0.0 {
                for (v, &p) in other.iter_mut().zip(&pivot_row) {
                    *v -= factor * p;
                }
            }
        }

        self.basis.replace(row, column);
        pivot_val
    }

    /// Whether the basic columns form an identity matrix over the constraint rows
    pub fn basis_is_identity(&self, tolerance: Tolerance) -> bool {
        let m = self.num_constraints();
        (0..m).all(|k| {
            let col = self.basis.column(k);
            (0..m).all(|i| {
                let expected = if i == k { 1.0 } else { 0.0 };
                tolerance.approx_eq(self.rows[i][col], expected)
            })
        })
    }

    pub fn render(&self, catalog: &VariableCatalog, format: &ValueFormat) -> String {
        render_tableau(&self.rows, catalog, &self.basis, format)
    }

    /// Pivot until optimal, unbounded, or out of iterations, recording every step in `trace`
    pub fn iterate(
        &mut self,
        catalog: &VariableCatalog,
        direction: Direction,
        config: &SolverConfig,
        trace: &mut Trace,
    ) -> IterationOutcome {
        let tol = config.tolerance;
        let format = ValueFormat::from(config);
        let mut iterations = 0;

        let termination = loop {
            trace.push(format!("\nIteration {}:", iterations + 1));

            if self.is_optimal(direction, tol) {
                trace.push("Optimal solution found!");
                break Termination::Optimal;
            }
            if iterations >= config.max_iterations {
                trace.push(format!(
                    "Iteration limit of {} reached before an optimal tableau",
                    config.max_iterations
                ));
                tracing::warn!(iterations, "iteration limit reached");
                break Termination::IterationLimit;
            }

            let Some(entering) = self.entering_column(direction, tol) else {
                // Unreachable while is_optimal agrees with entering_column
                break Termination::Optimal;
            };
            trace.push(format!("Entering variable: {}", catalog.name(entering)));

            let Some(leaving) = self.leaving_row(entering, tol) else {
                match residual_artificial(self, catalog, tol) {
                    Some(residual) => trace.push(format!(
                        "No positive entry in column {} while artificial variable {} is still positive",
                        catalog.name(entering),
                        residual.name
                    )),
                    None => trace.push(format!(
                        "Problem is unbounded: no positive entry in column {}",
                        catalog.name(entering)
                    )),
                }
                break Termination::Unbounded { column: entering };
            };
            let leaving_var = self.basis.column(leaving);
            trace.push(format!("Leaving variable: {}", catalog.name(leaving_var)));
            trace.push(format!(
                "Pivot element: {:.4}",
                self.rows[leaving][entering]
            ));

            let pivot = self.pivot(leaving, entering);
            iterations += 1;
            tracing::debug!(
                iteration = iterations,
                entering = catalog.name(entering),
                leaving = catalog.name(leaving_var),
                pivot,
                objective = self.objective_value(),
                "pivot"
            );

            trace.push("Updated tableau:");
            trace.push(self.render(catalog, &format));
        };

        tracing::info!(?termination, iterations, "simplex finished");
        IterationOutcome {
            termination,
            iterations,
        }
    }
}
