use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lpstep_lang::Compiler;
use lpstep_solver::{
    BigM, DirectSolver, LpProblem, ProblemLimits, SolutionStatus, SolverConfig, TableauSolver,
    Tolerance, TwoPhaseSolver, render_feasible_region,
};

#[derive(Parser)]
#[command(name = "lpstep")]
#[command(about = "Step-by-step Big-M simplex for small linear programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    solver: SolverArgs,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

/// Tableau engine settings
#[derive(Args)]
struct SolverArgs {
    /// Tolerance for zero, optimality and ratio tests
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// Pivots allowed before stopping
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Penalty for artificial variables (a factor with --scaled-big-m)
    #[arg(long, global = true)]
    big_m: Option<f64>,

    /// Largest denominator shown as a fraction in tableaux
    #[arg(long, global = true)]
    max_denominator: Option<i64>,

    /// Scale the penalty by the largest input magnitude
    #[arg(long, global = true)]
    scaled_big_m: bool,

    /// Accept problems outside 2-5 variables and 2-5 constraints
    #[arg(long, global = true)]
    no_limits: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem directly and print the optimum
    Solve {
        /// Problem file (.json, or the text format)
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Run the Big-M tableau method and print every step
    Steps {
        /// Problem file (.json, or the text format)
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Draw the feasible region of a two-variable problem as SVG
    Plot {
        /// Problem file (.json, or the text format)
        file: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a problem file for errors
    Check {
        /// Problem file (.json, or the text format)
        file: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

impl SolverArgs {
    fn config(&self) -> SolverConfig {
        let mut config = SolverConfig::default();
        if let Some(tol) = self.tolerance {
            config.tolerance = Tolerance::new(tol);
        }
        if let Some(max) = self.max_iterations {
            config.max_iterations = max;
        }
        if let Some(max) = self.max_denominator {
            config.max_denominator = max;
        }
        let m = self.big_m.unwrap_or(1e6);
        config.big_m = if self.scaled_big_m {
            BigM::Scaled(m)
        } else {
            BigM::Fixed(m)
        };
        config
    }

    fn direct_solver(&self) -> TwoPhaseSolver {
        let mut solver = TwoPhaseSolver::new();
        if let Some(tol) = self.tolerance {
            solver = solver.with_tolerance(tol);
        }
        if let Some(max) = self.max_iterations {
            solver = solver.with_max_iterations(max);
        }
        solver
    }

    fn limits(&self) -> Option<ProblemLimits> {
        if self.no_limits {
            None
        } else {
            Some(ProblemLimits::default())
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, error);
    std::process::exit(1);
}

/// JSON when the extension says so, the text format otherwise
fn load_problem(file: &Path, limits: Option<ProblemLimits>) -> LpProblem {
    let is_json = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    debug!(file = %file.display(), is_json, "loading problem");

    if !is_json {
        let compiler = match limits {
            Some(limits) => Compiler::with_limits(limits),
            None => Compiler::unbounded_size(),
        };
        return lpstep_lang::load_file(file, &compiler).unwrap_or_else(|e| fail("Error", e));
    }

    let source = std::fs::read_to_string(file).unwrap_or_else(|e| fail("Error reading file", e));
    let mut problem: LpProblem =
        serde_json::from_str(&source).unwrap_or_else(|e| fail("Invalid problem JSON", e));
    problem.fill_default_names();
    if let Err(e) = problem.validate() {
        fail("Invalid problem", e);
    }
    if let Some(limits) = limits {
        if let Err(e) = problem.check_limits(&limits) {
            fail("Invalid problem", e);
        }
    }
    problem
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail("Error writing JSON", e),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let limits = cli.solver.limits();

    match cli.command {
        Commands::Solve { file, format } => {
            let problem = load_problem(&file, limits);
            let solution = cli.solver.direct_solver().solve_direct(&problem);

            if format == OutputFormat::Json {
                print_json(&solution);
            } else if let (true, Some(values), Some(value)) =
                (solution.success, &solution.values, solution.optimal_value)
            {
                println!("Status: OPTIMAL");
                println!("Objective ({}): {:.4}", problem.objective.direction, value);
                println!();
                println!("Variables:");
                for (name, v) in problem.variables.iter().zip(values) {
                    println!("  {:10} {:12.4}", name, v);
                }
            } else {
                println!("Status: FAILED");
                println!("{}", solution.message);
            }

            if !solution.success {
                std::process::exit(1);
            }
        }
        Commands::Steps { file, format } => {
            let problem = load_problem(&file, limits);
            let solver = TableauSolver::with_config(cli.solver.config());
            let run = solver.run(&problem).unwrap_or_else(|e| fail("Solver error", e));

            if format == OutputFormat::Json {
                print_json(&serde_json::json!({
                    "trace": run.trace,
                    "solution": run.solution,
                    "iterations": run.iterations,
                    "variables": problem.variables,
                }));
            } else {
                print!("{}", run.trace);
            }
        }
        Commands::Plot { file, output } => {
            let problem = load_problem(&file, limits);
            let solver = TableauSolver::with_config(cli.solver.config());
            let run = solver.run(&problem).unwrap_or_else(|e| fail("Solver error", e));
            let optimum = (run.solution.status == SolutionStatus::Optimal)
                .then_some(run.solution.values.as_slice());

            let Some(svg) = render_feasible_region(&problem, optimum) else {
                fail(
                    "Cannot plot",
                    format!(
                        "the graphical method needs exactly 2 variables, got {}",
                        problem.num_variables()
                    ),
                );
            };

            match output {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, svg) {
                        fail("Error writing file", e);
                    }
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", svg),
            }
        }
        Commands::Check { file } => {
            let problem = load_problem(&file, limits);
            println!("✓ {} is valid", file.display());
            println!(
                "  Objective: {} over {}",
                problem.objective.direction,
                problem.variables.join(", ")
            );
            println!("  Constraints: {}", problem.num_constraints());
            for c in &problem.constraints {
                let terms: Vec<String> = c
                    .coefficients
                    .iter()
                    .zip(&problem.variables)
                    .filter(|(coef, _)| **coef != 0.0)
                    .map(|(coef, name)| format!("{}{}", coef, name))
                    .collect();
                println!("    {}: {} {} {}", c.name, terms.join(" + "), c.op, c.rhs);
            }
        }
    }
}
