//! Formula parser
//!
//! A recursive descent parser for grade formulas with proper operator precedence.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};

/// Deepest nesting of parentheses, operators and calls a formula may have
pub const MAX_NESTING: usize = 100;

/// Parse a formula string into an AST
///
/// A leading `=` is accepted and ignored, so formulas copied from a
/// spreadsheet parse the same way. Error offsets are byte offsets into
/// `formula` as given.
///
/// # Example
/// ```rust
/// use gradebook_formula::parse_formula;
///
/// let ast = parse_formula("2+3*4").unwrap();
/// let ast = parse_formula("avg(Exam1, Exam2)").unwrap();
/// let ast = parse_formula("if(abs_td > 3, 0, note)").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let trimmed = formula.trim();
    let body = match trimmed.strip_prefix('=') {
        Some(rest) if !rest.starts_with('=') => rest,
        _ => trimmed,
    };
    let offset = formula.len() - formula.trim_start().len() + (trimmed.len() - body.len());

    parse_body(body).map_err(|e| match e {
        FormulaError::Parse { position, message } => FormulaError::Parse {
            position: position + offset,
            message,
        },
        other => other,
    })
}

fn parse_body(formula: &str) -> FormulaResult<FormulaExpr> {
    if formula.trim().is_empty() {
        return Err(FormulaError::parse(0, "Empty formula"));
    }

    let mut parser = FormulaParser::new(formula)?;
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::parse(
            parser.token_start,
            format!(
                "Unexpected characters after expression: '{}'",
                &parser.input[parser.token_start..]
            ),
        ));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    /// Byte offset where the current token starts
    token_start: usize,
    current_token: Token,
    /// Depth of the subtree being built, bounded by [`MAX_NESTING`]
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            token_start: 0,
            current_token: Token::Eof,
            depth: 0,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.skip_whitespace();
        self.token_start = self.pos;
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // One- or two-character operators
        match c {
            '<' => {
                self.advance();
                return Ok(match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::LessThan,
                });
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::GreaterEqual);
                }
                return Ok(Token::GreaterThan);
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                }
                return Ok(Token::Equal);
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::NotEqual);
                }
                return Err(FormulaError::parse(self.token_start, "Expected '=' after '!'"));
            }
            _ => {}
        }

        // Number
        if c.is_ascii_digit() || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier (variable or function name)
        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        Err(FormulaError::parse(
            self.token_start,
            format!("Unexpected character '{}'", c),
        ))
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let digits_at = match self.peek_char_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self.peek_char_at(digits_at).map_or(false, |c| c.is_ascii_digit()) {
                for _ in 0..digits_at {
                    self.advance();
                }
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| FormulaError::parse(start, format!("Invalid number '{}'", num_str)))
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }

        Token::Identifier(self.input[start..self.pos].to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::parse(
                self.token_start,
                format!("Expected {:?}, got {:?}", expected, self.current_token()),
            ))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: ==, !=, <, <=, >, >=
    // 2. Addition/Subtraction: +, -
    // 3. Multiplication/Division: *, /
    // 4. Exponentiation: ^
    // 5. Unary: -, +
    // 6. Primary: literals, variables, function calls, parentheses

    /// Go one level deeper into the tree
    fn descend(&mut self) -> FormulaResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(FormulaError::parse(
                self.token_start,
                format!("Formula is nested more than {} levels deep", MAX_NESTING),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let depth = self.depth;
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.descend()?;
            self.consume()?;
            let right = self.parse_additive()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = depth;
        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let depth = self.depth;
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.descend()?;
            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = depth;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let depth = self.depth;
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.descend()?;
            self.consume()?;
            let right = self.parse_exponent()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = depth;
        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let depth = self.depth;
        let left = self.parse_unary()?;

        if matches!(self.current_token(), Token::Caret) {
            self.descend()?;
            self.consume()?;
            let right = self.parse_exponent()?; // Right associative
            self.depth = depth;
            return Ok(FormulaExpr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        let depth = self.depth;
        self.descend()?;
        let expr = self.parse_prefixed();
        self.depth = depth;
        expr
    }

    fn parse_prefixed(&mut self) -> FormulaResult<FormulaExpr> {
        // Prefix unary minus
        if matches!(self.current_token(), Token::Minus) {
            self.consume()?;
            let operand = self.parse_unary()?;
            return Ok(FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        // Prefix plus (no-op)
        if matches!(self.current_token(), Token::Plus) {
            self.consume()?;
            return self.parse_unary();
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume()?;
                Ok(FormulaExpr::Number(n))
            }

            Token::LeftParen => {
                self.consume()?;
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Identifier(name) => {
                self.consume()?;
                // Check if it's a function call
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::Variable(name))
                }
            }

            Token::Eof => Err(FormulaError::parse(
                self.token_start,
                "Unexpected end of formula",
            )),

            token => Err(FormulaError::parse(
                self.token_start,
                format!("Unexpected token: {:?}", token),
            )),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume()?;
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function {
            name: name.to_lowercase(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> Box<FormulaExpr> {
        Box::new(FormulaExpr::Variable(name.into()))
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("42").unwrap(), FormulaExpr::Number(42.0));
        assert_eq!(parse_formula("3.14").unwrap(), FormulaExpr::Number(3.14));
        assert_eq!(parse_formula(".5").unwrap(), FormulaExpr::Number(0.5));
        assert_eq!(parse_formula("1e3").unwrap(), FormulaExpr::Number(1000.0));
    }

    #[test]
    fn test_leading_equals_is_ignored() {
        assert_eq!(parse_formula("=42").unwrap(), FormulaExpr::Number(42.0));
        assert!(parse_formula("==42").is_err());
    }

    #[test]
    fn test_parse_arithmetic_precedence() {
        // Should parse as 1+(2*3) due to precedence
        let ast = parse_formula("1+2*3").unwrap();
        if let FormulaExpr::BinaryOp { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Add);
            assert_eq!(*left, FormulaExpr::Number(1.0));
            assert!(matches!(
                *right,
                FormulaExpr::BinaryOp {
                    op: BinaryOperator::Multiply,
                    ..
                }
            ));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_parentheses() {
        let ast = parse_formula("(1+2)*3").unwrap();
        if let FormulaExpr::BinaryOp { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Multiply);
            assert!(matches!(
                *left,
                FormulaExpr::BinaryOp {
                    op: BinaryOperator::Add,
                    ..
                }
            ));
            assert_eq!(*right, FormulaExpr::Number(3.0));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_comparison_operators() {
        for (text, expected) in [
            ("a>5", BinaryOperator::GreaterThan),
            ("a<5", BinaryOperator::LessThan),
            ("a>=5", BinaryOperator::GreaterEqual),
            ("a<=5", BinaryOperator::LessEqual),
            ("a==5", BinaryOperator::Equal),
            ("a=5", BinaryOperator::Equal),
            ("a!=5", BinaryOperator::NotEqual),
            ("a<>5", BinaryOperator::NotEqual),
        ] {
            match parse_formula(text).unwrap() {
                FormulaExpr::BinaryOp { op, .. } => assert_eq!(op, expected, "{}", text),
                other => panic!("Expected BinaryOp for {}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_parse_variables() {
        let ast = parse_formula("abs_td + Contrôle1").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::BinaryOp {
                op: BinaryOperator::Add,
                left: var("abs_td"),
                right: var("Contrôle1"),
            }
        );
    }

    #[test]
    fn test_parse_unary() {
        let ast = parse_formula("-x").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: var("x"),
            }
        );
        assert_eq!(parse_formula("+5").unwrap(), FormulaExpr::Number(5.0));
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_formula("AVG(1, 2, 3)").unwrap();
        if let FormulaExpr::Function { name, args } = ast {
            assert_eq!(name, "avg");
            assert_eq!(args.len(), 3);
        } else {
            panic!("Expected Function");
        }
    }

    #[test]
    fn test_parse_nested_function() {
        let ast = parse_formula("if(x > 5, max(a, b), 0)").unwrap();
        if let FormulaExpr::Function { name, args } = ast {
            assert_eq!(name, "if");
            assert_eq!(args.len(), 3);
            assert!(matches!(&args[1], FormulaExpr::Function { name, .. } if name == "max"));
        } else {
            panic!("Expected Function");
        }
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        assert_eq!(
            parse_formula("  max( 1 ,2 )  ").unwrap(),
            parse_formula("max(1,2)").unwrap()
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_formula(""),
            Err(FormulaError::Parse { .. })
        ));
        assert!(matches!(
            parse_formula("(1+2"),
            Err(FormulaError::Parse { .. })
        ));
        assert!(matches!(
            parse_formula("1+2)"),
            Err(FormulaError::Parse { .. })
        ));
        assert!(matches!(
            parse_formula("1 + # 2"),
            Err(FormulaError::Parse { position: 4, .. })
        ));
        assert!(matches!(
            parse_formula("max(1,)"),
            Err(FormulaError::Parse { .. })
        ));
        assert!(matches!(
            parse_formula("2 3"),
            Err(FormulaError::Parse { .. })
        ));
    }

    #[test]
    fn test_error_offsets_count_the_prefix() {
        assert!(matches!(
            parse_formula(" =1 + #"),
            Err(FormulaError::Parse { position: 6, .. })
        ));
        assert!(matches!(
            parse_formula("  1 + # 2"),
            Err(FormulaError::Parse { position: 6, .. })
        ));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let depth = 100_000;
        let cases = [
            format!("{}1{}", "(".repeat(depth), ")".repeat(depth)),
            format!("{}1", "-".repeat(depth)),
            vec!["1"; depth].join("^"),
            vec!["1"; depth].join(" + "),
            format!("{}1{}", "abs(".repeat(depth), ")".repeat(depth)),
        ];
        for formula in &cases {
            assert!(matches!(
                parse_formula(formula),
                Err(FormulaError::Parse { .. })
            ));
        }

        let nested = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse_formula(&nested).unwrap(), FormulaExpr::Number(1.0));
        assert!(parse_formula(&vec!["1"; 50].join(" + ")).is_ok());
    }
}
