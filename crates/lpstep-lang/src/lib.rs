//! A small text format for linear programs.
//!
//! ```text
//! maximize 3x1 + 2x2
//! subject to
//!   c1: x1 + x2 <= 4
//!   x1 + 3x2 <= 6
//! ```

pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod parser;

use std::path::Path;

use lpstep_solver::LpProblem;
use thiserror::Error;

pub use ast::*;
pub use compiler::{CompileError, Compiler};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{ParseError, Parser};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Parse and compile `source` with the default size limits
pub fn load(source: &str) -> Result<LpProblem, Error> {
    load_with(source, &Compiler::new())
}

pub fn load_with(source: &str, compiler: &Compiler) -> Result<LpProblem, Error> {
    let program = Parser::parse(source)?;
    Ok(compiler.compile(&program)?)
}

pub fn load_file(path: impl AsRef<Path>, compiler: &Compiler) -> Result<LpProblem, Error> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_with(&source, compiler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load() {
        let problem = load("max 3x1 + 2x2\nx1 + x2 <= 4\nx1 + 3x2 <= 6").unwrap();
        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.num_constraints(), 2);
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(load("max"), Err(Error::Parse(_))));
        assert!(matches!(load("max x1 + x2\nx1 <= 1"), Err(Error::Compile(_))));
        assert!(matches!(
            load_file("/nonexistent/problem.lp", &Compiler::new()),
            Err(Error::Io { .. })
        ));
    }
}
