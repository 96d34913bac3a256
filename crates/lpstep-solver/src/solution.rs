use crate::config::Tolerance;
use crate::tableau::{Tableau, Termination};
use crate::variables::VariableCatalog;

/// The result of running the tableau engine
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Value of each decision variable (empty when unbounded or infeasible)
    pub values: Vec<f64>,
    /// Objective value (present for optimal and iteration-limit outcomes)
    pub objective_value: Option<f64>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is unbounded
    Unbounded,
    /// An artificial variable stayed positive when the iteration stopped
    Infeasible,
    /// The pivot limit was hit; values are the last basic solution
    IterationLimit,
}

/// An artificial variable still basic at a positive level
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualArtificial {
    pub column: usize,
    pub name: String,
    pub value: f64,
}

impl Solution {
    pub fn unbounded() -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            objective_value: None,
        }
    }

    pub fn infeasible() -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: Vec::new(),
            objective_value: None,
        }
    }

    /// Read the terminal tableau.
    ///
    /// Decision variables basic in some row take that row's RHS; the others are zero.
    /// The objective value is the RHS of the objective row.
    pub fn extract(
        tableau: &Tableau,
        catalog: &VariableCatalog,
        termination: Termination,
        tolerance: Tolerance,
    ) -> Self {
        let residual = residual_artificial(tableau, catalog, tolerance);
        let status = match termination {
            Termination::Optimal | Termination::Unbounded { .. } if residual.is_some() => {
                return Self::infeasible();
            }
            Termination::Unbounded { .. } => return Self::unbounded(),
            Termination::Optimal => SolutionStatus::Optimal,
            Termination::IterationLimit => SolutionStatus::IterationLimit,
        };

        let mut values = vec![0.0; catalog.decision_count()];
        for (row, &column) in tableau.basis().columns().iter().enumerate() {
            if catalog.is_decision(column) {
                values[column] = tableau.rhs(row);
            }
        }

        Self {
            status,
            values,
            objective_value: Some(tableau.objective_value()),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}

/// First artificial variable that is basic with a value above the tolerance
pub fn residual_artificial(
    tableau: &Tableau,
    catalog: &VariableCatalog,
    tolerance: Tolerance,
) -> Option<ResidualArtificial> {
    tableau
        .basis()
        .columns()
        .iter()
        .enumerate()
        .find(|&(row, &column)| {
            catalog.is_artificial(column) && tolerance.is_positive(tableau.rhs(row))
        })
        .map(|(row, &column)| ResidualArtificial {
            column,
            name: catalog.name(column).to_string(),
            value: tableau.rhs(row),
        })
}
