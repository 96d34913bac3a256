use thiserror::Error;

use crate::config::Tolerance;
use crate::standard_form::StandardForm;
use crate::variables::VariableCatalog;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BasisError {
    #[error("No unit column covers constraint row {row}")]
    Uncovered { row: usize },
    #[error("Constraint row {row} is covered by more than one unit column: {columns:?}")]
    Ambiguous { row: usize, columns: Vec<usize> },
}

/// The column basic in each constraint row
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basis {
    columns: Vec<usize>,
}

impl Basis {
    pub fn new(columns: Vec<usize>) -> Self {
        Self { columns }
    }

    /// Pick the initial basis from the added columns of `form`.
    ///
    /// A column qualifies for a row when its only nonzero entry is a 1 in that row.
    /// Every row must end up with exactly one qualifying column.
    pub fn select(form: &StandardForm, tolerance: Tolerance) -> Result<Self, BasisError> {
        let mut candidates: Vec<(usize, usize)> = Vec::new();

        for j in form.num_decision()..form.num_columns() {
            let mut nonzero = form
                .column(j)
                .enumerate()
                .filter(|(_, v)| !tolerance.is_zero(*v));
            let (Some((row, value)), None) = (nonzero.next(), nonzero.next()) else {
                continue;
            };
            if tolerance.approx_eq(value, 1.0) {
                candidates.push((row, j));
            }
        }

        candidates.sort();

        let mut columns = Vec::with_capacity(form.num_constraints());
        for row in 0..form.num_constraints() {
            let matching: Vec<usize> = candidates
                .iter()
                .filter(|(r, _)| *r == row)
                .map(|(_, j)| *j)
                .collect();
            match matching.as_slice() {
                [] => return Err(BasisError::Uncovered { row }),
                [j] => columns.push(*j),
                _ => {
                    return Err(BasisError::Ambiguous {
                        row,
                        columns: matching,
                    });
                }
            }
        }

        Ok(Self { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Basic column of `row`
    pub fn column(&self, row: usize) -> usize {
        self.columns[row]
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Row in which `column` is basic, if it is basic at all
    pub fn row_of(&self, column: usize) -> Option<usize> {
        self.columns.iter().position(|&c| c == column)
    }

    pub fn replace(&mut self, row: usize, column: usize) -> usize {
        std::mem::replace(&mut self.columns[row], column)
    }

    pub fn names<'a>(&'a self, catalog: &'a VariableCatalog) -> impl Iterator<Item = &'a str> {
        self.columns.iter().map(move |&j| catalog.name(j))
    }
}
