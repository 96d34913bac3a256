use crate::ast::*;
use crate::lexer::{Lexer, Span, Token, TokenKind};
use lpstep_solver::{ConstraintOp, Direction};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file: expected {0}")]
    UnexpectedEof(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<Program, ParseError> {
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_program()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    /// End offset of the last consumed token
    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            None => ParseError::UnexpectedEof(expected.to_string()),
            Some(t) if t.kind == TokenKind::Eof => ParseError::UnexpectedEof(expected.to_string()),
            Some(t) if t.kind == TokenKind::Error => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("'{}'", t.text),
                span: t.span,
            },
            Some(t) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?}", t.kind),
                span: t.span,
            },
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            self.advance()
                .ok_or_else(|| ParseError::UnexpectedEof(format!("{:?}", kind)))
        } else {
            Err(self.unexpected(&format!("{:?}", kind)))
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        self.skip_newlines();
        let objective = self.parse_objective()?;

        self.skip_newlines();
        match self.peek_kind() {
            TokenKind::SubjectTo => {
                self.advance();
            }
            TokenKind::Subject => {
                self.advance();
                self.skip_newlines();
                self.expect(TokenKind::To)?;
            }
            _ => {}
        }

        let mut constraints = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek_kind() == TokenKind::Eof {
                break;
            }
            constraints.push(self.parse_constraint()?);
            self.expect_line_end()?;
        }

        Ok(Program {
            objective,
            constraints,
        })
    }

    fn expect_line_end(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn parse_objective(&mut self) -> Result<ObjectiveDecl, ParseError> {
        let direction = match self.peek_kind() {
            TokenKind::Maximize => Direction::Maximize,
            TokenKind::Minimize => Direction::Minimize,
            _ => return Err(self.unexpected("maximize or minimize")),
        };
        let start = self.advance().map(|t| t.span.start).unwrap_or(0);
        let expr = self.parse_expr()?;

        Ok(ObjectiveDecl {
            span: Span::new(start, self.previous_end()),
            direction,
            expr,
        })
    }

    fn parse_constraint(&mut self) -> Result<ConstraintDecl, ParseError> {
        let start = self.current().map(|t| t.span.start).unwrap_or(0);

        let label = if self.peek_kind() == TokenKind::Ident
            && self.peek_kind_at(1) == TokenKind::Colon
        {
            let name = self.expect(TokenKind::Ident)?;
            self.expect(TokenKind::Colon)?;
            Some(Label {
                span: name.span,
                name: name.text,
            })
        } else {
            None
        };

        let expr = self.parse_expr()?;

        let op = match self.peek_kind() {
            TokenKind::Le => ConstraintOp::Le,
            TokenKind::Ge => ConstraintOp::Ge,
            TokenKind::Eq => ConstraintOp::Eq,
            _ => return Err(self.unexpected("<=, >= or =")),
        };
        self.advance();

        let rhs = self.parse_signed_number()?;

        Ok(ConstraintDecl {
            span: Span::new(start, self.previous_end()),
            label,
            expr,
            op,
            rhs,
        })
    }

    /// `term (('+' | '-') term)*`, continuing onto the next line only after an operator
    fn parse_expr(&mut self) -> Result<LinearExpr, ParseError> {
        let start = self.current().map(|t| t.span.start).unwrap_or(0);
        let mut terms = vec![self.parse_term()?];

        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            terms.push(self.parse_term()?);
        }

        Ok(LinearExpr {
            span: Span::new(start, self.previous_end()),
            terms,
        })
    }

    /// `[sign] [number ['*']] ident`
    fn parse_term(&mut self) -> Result<Term, ParseError> {
        let start = self.current().map(|t| t.span.start).unwrap_or(0);

        let sign = self.parse_sign();
        if sign.is_some() {
            self.skip_newlines();
        }

        let magnitude = if self.peek_kind() == TokenKind::Number {
            let value = self.parse_number()?;
            if self.peek_kind() == TokenKind::Star {
                self.advance();
            }
            value
        } else {
            1.0
        };

        if self.peek_kind() != TokenKind::Ident {
            return Err(self.unexpected("variable name"));
        }
        let variable = self.expect(TokenKind::Ident)?.text;

        Ok(Term {
            span: Span::new(start, self.previous_end()),
            coefficient: sign.unwrap_or(1.0) * magnitude,
            variable,
        })
    }

    fn parse_sign(&mut self) -> Option<f64> {
        let sign = match self.peek_kind() {
            TokenKind::Plus => 1.0,
            TokenKind::Minus => -1.0,
            _ => return None,
        };
        self.advance();
        Some(sign)
    }

    fn parse_signed_number(&mut self) -> Result<f64, ParseError> {
        let sign = self.parse_sign().unwrap_or(1.0);
        Ok(sign * self.parse_number()?)
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Number)?;
        token
            .text
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_program() {
        let source = r#"
            // classic two-variable example
            maximize 3x1 + 2x2
            subject to
              c1: x1 + x2 <= 4
              x1 + 3*x2 <= 6
        "#;
        let program = Parser::parse(source).unwrap();
        assert_eq!(program.objective.direction, Direction::Maximize);
        assert_eq!(program.objective.expr.terms.len(), 2);
        assert_eq!(program.objective.expr.terms[0].coefficient, 3.0);
        assert_eq!(program.objective.expr.terms[1].variable, "x2");

        assert_eq!(program.constraints.len(), 2);
        let c1 = &program.constraints[0];
        assert_eq!(c1.label.as_ref().map(|l| l.name.as_str()), Some("c1"));
        assert_eq!(c1.op, ConstraintOp::Le);
        assert_eq!(c1.rhs, 4.0);
        assert!(program.constraints[1].label.is_none());
        assert_eq!(program.constraints[1].expr.terms[1].coefficient, 3.0);
    }

    #[test]
    fn test_signs_and_negative_rhs() {
        let program = Parser::parse("min -x1 + 2.5 x2 - 3 * x3\ns.t.\n-x1 - x2 >= -3").unwrap();
        let coefficients: Vec<f64> = program
            .objective
            .expr
            .terms
            .iter()
            .map(|t| t.coefficient)
            .collect();
        assert_eq!(coefficients, vec![-1.0, 2.5, -3.0]);
        assert_eq!(program.constraints[0].op, ConstraintOp::Ge);
        assert_eq!(program.constraints[0].rhs, -3.0);
    }

    #[test]
    fn test_shorthand_keywords() {
        let program = Parser::parse("max x + y; st x <= 1; y == 2").unwrap();
        assert_eq!(program.constraints.len(), 2);
        assert_eq!(program.constraints[1].op, ConstraintOp::Eq);
    }

    #[test]
    fn test_subject_to_is_optional() {
        let program = Parser::parse("min x1 + x2\n-x1 + x2 >= 1").unwrap();
        assert_eq!(program.objective.expr.terms.len(), 2);
        assert_eq!(program.constraints.len(), 1);
        assert_eq!(program.constraints[0].expr.terms[0].coefficient, -1.0);
    }

    #[test]
    fn test_expression_continues_after_operator() {
        let program = Parser::parse("max x1 +\n  x2\nx1 <= 1").unwrap();
        assert_eq!(program.objective.expr.terms.len(), 2);
    }

    #[test]
    fn test_spans() {
        let program = Parser::parse("max 3x1\nc1: x1 <= 4").unwrap();
        assert_eq!(program.objective.span, Span::new(0, 7));
        assert_eq!(program.constraints[0].span, Span::new(8, 19));
        assert_eq!(program.objective.expr.terms[0].span, Span::new(4, 7));
    }

    #[test]
    fn test_missing_objective() {
        let err = Parser::parse("x1 <= 4").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_missing_operator() {
        let err = Parser::parse("max x1\nx1 4").unwrap_err();
        match err {
            ParseError::UnexpectedToken { expected, found, span } => {
                assert_eq!(expected, "<=, >= or =");
                assert_eq!(found, "Number");
                assert_eq!(span, Span::new(10, 11));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unexpected_eof() {
        assert!(matches!(
            Parser::parse("max x1\nx1 <="),
            Err(ParseError::UnexpectedEof(_))
        ));
        assert!(matches!(Parser::parse(""), Err(ParseError::UnexpectedEof(_))));
    }

    #[test]
    fn test_strict_inequality_is_rejected() {
        let err = Parser::parse("max x1\nx1 < 4").unwrap_err();
        match err {
            ParseError::UnexpectedToken { found, .. } => assert_eq!(found, "'<'"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(Parser::parse("max x1\nx1 <= 4 x2").is_err());
    }
}
