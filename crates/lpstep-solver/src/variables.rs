use std::fmt;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Decision,
    Slack,
    Surplus,
    Artificial,
}

impl VariableKind {
    /// True for the columns added by the standard-form conversion
    pub fn is_added(self) -> bool {
        !matches!(self, VariableKind::Decision)
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::Decision => write!(f, "decision"),
            VariableKind::Slack => write!(f, "slack"),
            VariableKind::Surplus => write!(f, "surplus"),
            VariableKind::Artificial => write!(f, "artificial"),
        }
    }
}

/// One tableau column
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub column: usize,
}

/// Every tableau column in order. A variable's `column` always equals its position.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableCatalog {
    variables: Vec<Variable>,
    slack_counter: usize,
    artificial_counter: usize,
}

impl VariableCatalog {
    pub fn new(decision_names: &[String]) -> Self {
        let mut catalog = Self::default();
        for name in decision_names {
            catalog.push(name.clone(), VariableKind::Decision);
        }
        catalog
    }

    /// Append a slack (`s<k>`), surplus (`e<k>`) or artificial (`a<j>`) variable and return its column.
    /// Slack and surplus variables share one counter. A name already taken by a decision
    /// variable gets primes appended until it is unique.
    pub fn add(&mut self, kind: VariableKind) -> usize {
        let mut name = match kind {
            VariableKind::Decision => format!("x{}", self.count(VariableKind::Decision) + 1),
            VariableKind::Slack | VariableKind::Surplus => {
                self.slack_counter += 1;
                let prefix = if kind == VariableKind::Slack { 's' } else { 'e' };
                format!("{}{}", prefix, self.slack_counter)
            }
            VariableKind::Artificial => {
                self.artificial_counter += 1;
                format!("a{}", self.artificial_counter)
            }
        };
        while self.names().any(|taken| taken == name) {
            name.push('\'');
        }
        self.push(name, kind)
    }

    fn push(&mut self, name: String, kind: VariableKind) -> usize {
        let column = self.variables.len();
        self.variables.push(Variable { name, kind, column });
        column
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<&Variable> {
        self.variables.get(column)
    }

    /// Name of the variable in `column`, or `?` for an out-of-range column
    pub fn name(&self, column: usize) -> &str {
        self.variables
            .get(column)
            .map(|v| v.name.as_str())
            .unwrap_or("?")
    }

    pub fn kind(&self, column: usize) -> Option<VariableKind> {
        self.variables.get(column).map(|v| v.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    pub fn count(&self, kind: VariableKind) -> usize {
        self.variables.iter().filter(|v| v.kind == kind).count()
    }

    pub fn decision_count(&self) -> usize {
        self.count(VariableKind::Decision)
    }

    pub fn is_decision(&self, column: usize) -> bool {
        self.kind(column) == Some(VariableKind::Decision)
    }

    pub fn is_artificial(&self, column: usize) -> bool {
        self.kind(column) == Some(VariableKind::Artificial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_follow_insertion_order() {
        let mut catalog = VariableCatalog::new(&["x1".to_string(), "x2".to_string()]);
        assert_eq!(catalog.add(VariableKind::Slack), 2);
        assert_eq!(catalog.add(VariableKind::Surplus), 3);
        assert_eq!(catalog.add(VariableKind::Artificial), 4);
        assert_eq!(catalog.add(VariableKind::Artificial), 5);

        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["x1", "x2", "s1", "e2", "a1", "a2"]);
        for (i, v) in catalog.iter().enumerate() {
            assert_eq!(v.column, i);
        }
    }

    #[test]
    fn test_added_names_avoid_decision_names() {
        let mut catalog = VariableCatalog::new(&["s1".to_string(), "a1".to_string()]);
        catalog.add(VariableKind::Slack);
        catalog.add(VariableKind::Artificial);
        catalog.add(VariableKind::Surplus);

        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["s1", "a1", "s1'", "a1'", "e2"]);
    }

    #[test]
    fn test_kind_queries() {
        let mut catalog = VariableCatalog::new(&["x1".to_string()]);
        catalog.add(VariableKind::Artificial);
        assert_eq!(catalog.decision_count(), 1);
        assert!(catalog.is_decision(0));
        assert!(catalog.is_artificial(1));
        assert!(!catalog.is_artificial(7));
        assert_eq!(catalog.name(7), "?");
    }
}
