use num_rational::Rational64;

use crate::basis::Basis;
use crate::config::{SolverConfig, Tolerance};
use crate::variables::VariableCatalog;

const MIN_CELL_WIDTH: usize = 8;

/// How tableau cells are turned into text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueFormat {
    pub tolerance: Tolerance,
    pub max_denominator: i64,
}

impl ValueFormat {
    pub fn new(tolerance: Tolerance, max_denominator: i64) -> Self {
        Self {
            tolerance,
            max_denominator: max_denominator.max(1),
        }
    }

    /// `0` near zero, `p/q` when a close fraction with a small denominator exists, else two decimals
    pub fn format(&self, value: f64) -> String {
        if self.tolerance.is_zero(value) {
            return "0".to_string();
        }
        match self.fraction(value) {
            Some(r) if *r.denom() == 1 => r.numer().to_string(),
            Some(r) => format!("{}/{}", r.numer(), r.denom()),
            None => format!("{:.2}", value),
        }
    }

    /// The best approximation of `value` within the denominator bound, if it is close enough
    pub fn fraction(&self, value: f64) -> Option<Rational64> {
        let r = best_rational(value, self.max_denominator)?;
        let approx = *r.numer() as f64 / *r.denom() as f64;
        let allowed = self.tolerance.epsilon() * value.abs().max(1.0);
        ((approx - value).abs() <= allowed).then_some(r)
    }
}

impl Default for ValueFormat {
    fn default() -> Self {
        Self::new(Tolerance::DEFAULT, 100)
    }
}

impl From<&SolverConfig> for ValueFormat {
    fn from(config: &SolverConfig) -> Self {
        Self::new(config.tolerance, config.max_denominator)
    }
}

/// Closest fraction to `value` with denominator at most `max_denominator`.
///
/// Walks the continued fraction expansion and, once the next convergent would exceed the
/// bound, compares the last convergent with the best semiconvergent. Returns `None` for
/// non-finite input or when the numerator would overflow.
pub fn best_rational(value: f64, max_denominator: i64) -> Option<Rational64> {
    if !value.is_finite() || max_denominator < 1 {
        return None;
    }

    // (p0/q0, p1/q1) are the two most recent convergents
    let (mut p0, mut q0, mut p1, mut q1) = (0_i64, 1_i64, 1_i64, 0_i64);
    let mut x = value;

    for _ in 0..64 {
        let a_float = x.floor();
        if a_float.abs() >= i64::MAX as f64 {
            return None;
        }
        let a = a_float as i64;

        let next_q = a.checked_mul(q1).and_then(|v| v.checked_add(q0));
        let Some(q2) = next_q.filter(|&q| q <= max_denominator) else {
            let k = (max_denominator - q0) / q1;
            let semi_p = k.checked_mul(p1)?.checked_add(p0)?;
            let semi_q = k * q1 + q0;
            let semi_err = (semi_p as f64 / semi_q as f64 - value).abs();
            let conv_err = (p1 as f64 / q1 as f64 - value).abs();
            return Some(if semi_err < conv_err {
                Rational64::new(semi_p, semi_q)
            } else {
                Rational64::new(p1, q1)
            });
        };
        let p2 = a.checked_mul(p1)?.checked_add(p0)?;
        (p0, q0, p1, q1) = (p1, q1, p2, q2);

        let frac = x - a_float;
        if frac <= f64::EPSILON * x.abs().max(1.0) {
            break;
        }
        x = 1.0 / frac;
    }

    Some(Rational64::new(p1, q1))
}

/// Render a tableau snapshot as an aligned table with basis labels and a final `Z` row.
///
/// `rows` holds the constraint rows followed by the objective row, each one entry per
/// catalog column plus the RHS.
pub fn render_tableau(
    rows: &[Vec<f64>],
    catalog: &VariableCatalog,
    basis: &Basis,
    format: &ValueFormat,
) -> String {
    let mut headers: Vec<String> = vec!["Basis".to_string()];
    headers.extend(catalog.names().map(str::to_string));
    headers.push("RHS".to_string());

    let n_constraints = rows.len().saturating_sub(1);
    let mut body: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let label = if i < n_constraints {
            catalog.name(basis.column(i)).to_string()
        } else {
            "Z".to_string()
        };
        let mut cells = vec![label];
        cells.extend(row.iter().map(|&v| format.format(v)));
        body.push(cells);
    }

    let label_width = body
        .iter()
        .map(|r| r[0].len())
        .chain(std::iter::once(headers[0].len()))
        .max()
        .unwrap_or(0);
    let cell_width = headers[1..]
        .iter()
        .map(String::len)
        .chain(body.iter().flat_map(|r| r[1..].iter().map(String::len)))
        .fold(MIN_CELL_WIDTH, usize::max);

    let join = |cells: &[String]| -> String {
        let mut line = format!("{:>w$} |", cells[0], w = label_width);
        let rest: Vec<String> = cells[1..]
            .iter()
            .map(|c| format!("{:>w$}", c, w = cell_width))
            .collect();
        line.push(' ');
        line.push_str(&rest.join(" | "));
        line
    };

    let header_line = join(&headers);
    let rule = "-".repeat(header_line.len());

    let mut lines = vec![header_line, rule.clone()];
    for (i, cells) in body.iter().enumerate() {
        if i == n_constraints {
            lines.push(rule.clone());
        }
        lines.push(join(cells));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_token() {
        let fmt = ValueFormat::default();
        assert_eq!(fmt.format(0.0), "0");
        assert_eq!(fmt.format(-3e-7), "0");
    }

    #[test]
    fn test_integers_and_fractions() {
        let fmt = ValueFormat::default();
        assert_eq!(fmt.format(12.0), "12");
        assert_eq!(fmt.format(-4.0), "-4");
        assert_eq!(fmt.format(0.5), "1/2");
        assert_eq!(fmt.format(-0.5), "-1/2");
        assert_eq!(fmt.format(1.0 / 3.0), "1/3");
        assert_eq!(fmt.format(-7.0 / 3.0), "-7/3");
        assert_eq!(fmt.format(2.0 / 97.0), "2/97");
        assert_eq!(fmt.format(999_998.0), "999998");
    }

    #[test]
    fn test_decimal_fallback() {
        let fmt = ValueFormat::default();
        // No fraction with denominator <= 100 is within tolerance of pi
        assert_eq!(fmt.format(std::f64::consts::PI), "3.14");
        assert_eq!(fmt.format(1.0 / 101.0), "0.01");
        assert_eq!(fmt.format(f64::INFINITY), "inf");
    }

    #[test]
    fn test_best_rational() {
        assert_eq!(best_rational(0.75, 100), Some(Rational64::new(3, 4)));
        assert_eq!(
            best_rational(std::f64::consts::PI, 100),
            Some(Rational64::new(311, 99))
        );
        assert_eq!(best_rational(std::f64::consts::PI, 10), Some(Rational64::new(22, 7)));
        assert_eq!(best_rational(f64::NAN, 100), None);
        assert_eq!(best_rational(1e30, 100), None);
    }

    #[test]
    fn test_render_tableau_layout() {
        let catalog = VariableCatalog::new(&["x1".to_string(), "x2".to_string()]);
        let basis = Basis::new(vec![0]);
        let rows = vec![vec![1.0, 0.5, 4.0], vec![0.0, -2.0, 12.0]];
        let text = render_tableau(&rows, &catalog, &basis, &ValueFormat::default());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Basis |"));
        assert!(lines[0].ends_with("RHS"));
        assert!(lines[2].trim_start().starts_with("x1 |"));
        assert!(lines[2].contains("1/2"));
        assert!(lines[4].trim_start().starts_with("Z |"));
        assert!(lines[4].ends_with("12"));
        // Every row lines up with the header
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
    }
}
