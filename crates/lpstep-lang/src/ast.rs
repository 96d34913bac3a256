use crate::lexer::Span;
use lpstep_solver::{ConstraintOp, Direction};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub objective: ObjectiveDecl,
    pub constraints: Vec<ConstraintDecl>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveDecl {
    pub span: Span,
    pub direction: Direction,
    pub expr: LinearExpr,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDecl {
    pub span: Span,
    pub label: Option<Label>,
    pub expr: LinearExpr,
    pub op: ConstraintOp,
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub span: Span,
    pub name: String,
}

/// Sum of terms as written; repeated variables are not merged here
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinearExpr {
    pub span: Span,
    pub terms: Vec<Term>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub span: Span,
    /// Signed coefficient, 1 or -1 when omitted
    pub coefficient: f64,
    pub variable: String,
}

impl LinearExpr {
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.variable.as_str())
    }
}

impl Program {
    /// Every variable mentioned, objective first, in order of appearance
    pub fn mentioned_variables(&self) -> impl Iterator<Item = &str> {
        self.objective
            .expr
            .variables()
            .chain(self.constraints.iter().flat_map(|c| c.expr.variables()))
    }
}
