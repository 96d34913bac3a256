//! SVG rendering of the feasible region of a two-variable problem.

use crate::problem::{Constraint, ConstraintOp, LpProblem};

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN: f64 = 56.0;
const LEGEND_WIDTH: f64 = 220.0;
const EPS: f64 = 1e-9;

/// Matplotlib's default cycle, so constraint colours match the usual textbook plots
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

type Point = (f64, f64);

/// Render constraints, feasible polygon and optimum as an SVG document.
///
/// Returns `None` unless the problem has exactly two variables.
pub fn render_feasible_region(problem: &LpProblem, solution: Option<&[f64]>) -> Option<String> {
    if problem.num_variables() != 2
        || problem.constraints.iter().any(|c| c.coefficients.len() != 2)
    {
        return None;
    }

    let optimum = solution.filter(|s| s.len() == 2).map(|s| (s[0], s[1]));
    let (x_max, y_max) = view_bounds(&problem.constraints, optimum);
    let view = View { x_max, y_max };

    let region = problem
        .constraints
        .iter()
        .fold(view.corners(), |poly, c| clip_constraint(&poly, c));

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
        w = WIDTH + LEGEND_WIDTH,
        h = HEIGHT
    ));
    svg.push('\n');
    svg.push_str(&format!(
        "<rect width=\"{}\" height=\"{}\" fill=\"white\"/>\n",
        WIDTH + LEGEND_WIDTH,
        HEIGHT
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"24\" text-anchor=\"middle\" font-size=\"16\">Graphical method</text>\n",
        WIDTH / 2.0
    ));

    svg.push_str(&view.grid());
    svg.push_str(&view.axes(&problem.variables[0], &problem.variables[1]));

    if region.len() >= 3 {
        let points: Vec<String> = region
            .iter()
            .map(|&p| {
                let (sx, sy) = view.to_screen(p);
                format!("{:.2},{:.2}", sx, sy)
            })
            .collect();
        svg.push_str(&format!(
            "<polygon class=\"feasible\" points=\"{}\" fill=\"#4c72b0\" fill-opacity=\"0.25\" stroke=\"none\"/>\n",
            points.join(" ")
        ));
    }

    for (i, c) in problem.constraints.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        if let Some((p, q)) = view.clip_line(c) {
            let (x1, y1) = view.to_screen(p);
            let (x2, y2) = view.to_screen(q);
            let dash = if c.op == ConstraintOp::Eq {
                " stroke-dasharray=\"6 4\""
            } else {
                ""
            };
            svg.push_str(&format!(
                "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"2\"{}/>\n",
                x1, y1, x2, y2, color, dash
            ));
        }
        let ly = MARGIN + 18.0 * i as f64;
        svg.push_str(&format!(
            "<line x1=\"{lx}\" y1=\"{ly}\" x2=\"{lx2}\" y2=\"{ly}\" stroke=\"{color}\" stroke-width=\"2\"/>\n",
            lx = WIDTH + 8.0,
            lx2 = WIDTH + 28.0,
            ly = ly,
            color = color
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\">{}</text>\n",
            WIDTH + 34.0,
            ly + 4.0,
            escape(&constraint_label(c, &problem.variables))
        ));
    }

    if let Some(point) = optimum {
        let (cx, cy) = view.to_screen(point);
        let star: Vec<String> = star_points(cx, cy, 10.0, 4.0)
            .iter()
            .map(|(x, y)| format!("{:.2},{:.2}", x, y))
            .collect();
        svg.push_str(&format!(
            "<polygon class=\"optimum\" points=\"{}\" fill=\"red\"/>\n",
            star.join(" ")
        ));
        let ly = MARGIN + 18.0 * problem.constraints.len() as f64;
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" fill=\"red\">Optimal solution ({:.1}, {:.1})</text>\n",
            WIDTH + 8.0,
            ly + 4.0,
            point.0,
            point.1
        ));
    }

    svg.push_str("</svg>\n");
    Some(svg)
}

/// Largest positive axis intercept of any constraint, padded by 20%, at least 10
fn view_bounds(constraints: &[Constraint], optimum: Option<Point>) -> (f64, f64) {
    let mut x_max: f64 = 0.0;
    let mut y_max: f64 = 0.0;
    for c in constraints {
        let (a, b) = (c.coefficients[0], c.coefficients[1]);
        if a != 0.0 {
            x_max = x_max.max(c.rhs / a * 1.2);
        }
        if b != 0.0 {
            y_max = y_max.max(c.rhs / b * 1.2);
        }
    }
    if let Some((x, y)) = optimum {
        x_max = x_max.max(x * 1.2);
        y_max = y_max.max(y * 1.2);
    }
    (x_max.max(10.0), y_max.max(10.0))
}

struct View {
    x_max: f64,
    y_max: f64,
}

impl View {
    fn corners(&self) -> Vec<Point> {
        vec![
            (0.0, 0.0),
            (self.x_max, 0.0),
            (self.x_max, self.y_max),
            (0.0, self.y_max),
        ]
    }

    fn to_screen(&self, (x, y): Point) -> Point {
        let sx = MARGIN + x / self.x_max * (WIDTH - 2.0 * MARGIN);
        let sy = HEIGHT - MARGIN - y / self.y_max * (HEIGHT - 2.0 * MARGIN);
        (sx, sy)
    }

    fn contains(&self, (x, y): Point) -> bool {
        let tol = EPS * self.x_max.max(self.y_max);
        x >= -tol && x <= self.x_max + tol && y >= -tol && y <= self.y_max + tol
    }

    /// The part of `a x + b y = rhs` inside the view
    fn clip_line(&self, c: &Constraint) -> Option<(Point, Point)> {
        let (a, b, r) = (c.coefficients[0], c.coefficients[1], c.rhs);
        let mut hits: Vec<Point> = Vec::new();
        if b.abs() > EPS {
            hits.push((0.0, r / b));
            hits.push((self.x_max, (r - a * self.x_max) / b));
        }
        if a.abs() > EPS {
            hits.push((r / a, 0.0));
            hits.push(((r - b * self.y_max) / a, self.y_max));
        }
        hits.retain(|&p| self.contains(p));
        hits.sort_by(|p, q| p.0.total_cmp(&q.0).then(p.1.total_cmp(&q.1)));
        let first = *hits.first()?;
        let last = *hits.last()?;
        Some((first, last))
    }

    fn grid(&self) -> String {
        let mut out = String::new();
        for k in 0..=5 {
            let t = k as f64 / 5.0;
            let (gx, _) = self.to_screen((t * self.x_max, 0.0));
            let (_, gy) = self.to_screen((0.0, t * self.y_max));
            out.push_str(&format!(
                "<line x1=\"{gx:.2}\" y1=\"{top}\" x2=\"{gx:.2}\" y2=\"{bottom}\" stroke=\"#dddddd\" stroke-dasharray=\"4 3\"/>\n",
                gx = gx,
                top = MARGIN,
                bottom = HEIGHT - MARGIN
            ));
            out.push_str(&format!(
                "<line x1=\"{left}\" y1=\"{gy:.2}\" x2=\"{right}\" y2=\"{gy:.2}\" stroke=\"#dddddd\" stroke-dasharray=\"4 3\"/>\n",
                gy = gy,
                left = MARGIN,
                right = WIDTH - MARGIN
            ));
            out.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{}\" text-anchor=\"middle\">{}</text>\n",
                gx,
                HEIGHT - MARGIN + 16.0,
                tick(t * self.x_max)
            ));
            out.push_str(&format!(
                "<text x=\"{}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>\n",
                MARGIN - 6.0,
                gy + 4.0,
                tick(t * self.y_max)
            ));
        }
        out
    }

    fn axes(&self, x_label: &str, y_label: &str) -> String {
        format!(
            concat!(
                "<line x1=\"{m}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"black\"/>\n",
                "<line x1=\"{m}\" y1=\"{b}\" x2=\"{m}\" y2=\"{m}\" stroke=\"black\"/>\n",
                "<text x=\"{cx}\" y=\"{lx}\" text-anchor=\"middle\">{xl}</text>\n",
                "<text x=\"16\" y=\"{cy}\" text-anchor=\"middle\" transform=\"rotate(-90 16 {cy})\">{yl}</text>\n",
            ),
            m = MARGIN,
            b = HEIGHT - MARGIN,
            r = WIDTH - MARGIN,
            cx = WIDTH / 2.0,
            lx = HEIGHT - 12.0,
            cy = HEIGHT / 2.0,
            xl = escape(x_label),
            yl = escape(y_label),
        )
    }
}

/// Sutherland-Hodgman step: keep the part of `polygon` satisfying `c`
fn clip_constraint(polygon: &[Point], c: &Constraint) -> Vec<Point> {
    let (a, b, r) = (c.coefficients[0], c.coefficients[1], c.rhs);
    match c.op {
        ConstraintOp::Le => clip_half_plane(polygon, a, b, r),
        ConstraintOp::Ge => clip_half_plane(polygon, -a, -b, -r),
        ConstraintOp::Eq => {
            let below = clip_half_plane(polygon, a, b, r);
            clip_half_plane(&below, -a, -b, -r)
        }
    }
}

/// Keep the part of `polygon` where `a x + b y <= r`
fn clip_half_plane(polygon: &[Point], a: f64, b: f64, r: f64) -> Vec<Point> {
    let side = |(x, y): Point| a * x + b * y - r;
    let tol = EPS * (1.0 + r.abs());
    let mut out = Vec::with_capacity(polygon.len() + 1);

    for (i, &current) in polygon.iter().enumerate() {
        let previous = polygon[(i + polygon.len() - 1) % polygon.len()];
        let (fc, fp) = (side(current), side(previous));
        let current_in = fc <= tol;
        let previous_in = fp <= tol;

        if current_in != previous_in {
            let t = fp / (fp - fc);
            out.push((
                previous.0 + t * (current.0 - previous.0),
                previous.1 + t * (current.1 - previous.1),
            ));
        }
        if current_in {
            out.push(current);
        }
    }
    out
}

fn star_points(cx: f64, cy: f64, outer: f64, inner: f64) -> Vec<Point> {
    (0..10)
        .map(|k| {
            let radius = if k % 2 == 0 { outer } else { inner };
            let angle = std::f64::consts::PI * k as f64 / 5.0 - std::f64::consts::FRAC_PI_2;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

fn constraint_label(c: &Constraint, names: &[String]) -> String {
    let mut label = String::new();
    for (coef, name) in c.coefficients.iter().zip(names) {
        if *coef == 0.0 {
            continue;
        }
        if label.is_empty() {
            label.push_str(&format!("{}{}", coef, name));
        } else if *coef < 0.0 {
            label.push_str(&format!(" - {}{}", -coef, name));
        } else {
            label.push_str(&format!(" + {}{}", coef, name));
        }
    }
    if label.is_empty() {
        label.push('0');
    }
    format!("{} {} {}", label, c.op, c.rhs)
}

fn tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round())
    } else {
        format!("{:.1}", value)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Direction;

    fn two_var_problem() -> LpProblem {
        let mut problem = LpProblem::with_default_names(2);
        problem.set_objective(vec![3.0, 2.0], Direction::Maximize);
        problem.add_constraint("c1", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("c2", vec![1.0, 3.0], ConstraintOp::Le, 6.0);
        problem
    }

    #[test]
    fn test_only_two_variables_are_plotted() {
        let mut problem = LpProblem::with_default_names(3);
        problem.set_objective(vec![1.0, 1.0, 1.0], Direction::Maximize);
        problem.add_constraint("c1", vec![1.0, 1.0, 1.0], ConstraintOp::Le, 4.0);
        assert_eq!(render_feasible_region(&problem, None), None);
    }

    #[test]
    fn test_svg_contents() {
        let svg = render_feasible_region(&two_var_problem(), Some(&[4.0, 0.0])).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("class=\"feasible\""));
        assert!(svg.contains("class=\"optimum\""));
        assert!(svg.contains("1x1 + 1x2 &lt;= 4"));
        assert!(svg.contains("Optimal solution (4.0, 0.0)"));
    }

    #[test]
    fn test_feasible_polygon_vertices() {
        let problem = two_var_problem();
        let view = View {
            x_max: 10.0,
            y_max: 10.0,
        };
        let region = problem
            .constraints
            .iter()
            .fold(view.corners(), |poly, c| clip_constraint(&poly, c));

        // Vertices (0,0), (4,0), (3,1), (0,2) in some rotation
        let expected = [(0.0, 0.0), (4.0, 0.0), (3.0, 1.0), (0.0, 2.0)];
        assert_eq!(region.len(), 4);
        for e in expected {
            assert!(
                region
                    .iter()
                    .any(|p| (p.0 - e.0).abs() < 1e-9 && (p.1 - e.1).abs() < 1e-9),
                "missing vertex {:?} in {:?}",
                e,
                region
            );
        }
    }

    #[test]
    fn test_empty_region_has_no_polygon() {
        let mut problem = two_var_problem();
        problem.add_constraint("c3", vec![1.0, 1.0], ConstraintOp::Ge, 8.0);
        let svg = render_feasible_region(&problem, None).unwrap();
        assert!(!svg.contains("class=\"feasible\""));
        assert!(!svg.contains("class=\"optimum\""));
    }

    #[test]
    fn test_view_bounds() {
        let problem = two_var_problem();
        assert_eq!(view_bounds(&problem.constraints, None), (10.0, 10.0));
        let (x_max, y_max) = view_bounds(&problem.constraints, Some((20.0, 0.0)));
        assert!((x_max - 24.0).abs() < 1e-9);
        assert_eq!(y_max, 10.0);
    }

    #[test]
    fn test_clip_vertical_line() {
        let view = View {
            x_max: 10.0,
            y_max: 10.0,
        };
        let c = Constraint {
            name: "c".to_string(),
            coefficients: vec![1.0, 0.0],
            op: ConstraintOp::Le,
            rhs: 3.0,
        };
        assert_eq!(view.clip_line(&c), Some(((3.0, 0.0), (3.0, 10.0))));
    }
}
