//! A Pratt (operator-precedence) parser: tokens to [ast::Program].

use crate::ast::{Block, Expression, Program, Statement};
use crate::lexer::Lexer;
use crate::token::Token;

/// Precedence rules, lowest to highest. Has a well-defined total ordering ([PartialOrd]), which
/// drives the `while peek_precedence > precedence` loop in [Parser::parse_expression].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord)]
enum Precedence {
    Lowest,
    Equals,      // == !=
    LessGreater, // < >
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x !x
    Call,        // f(x)
    Index,       // a[x]
}

fn precedence_of(token: Token) -> Precedence {
    use Token::*;
    match token {
        Eq | NotEq => Precedence::Equals,
        Lt | Gt => Precedence::LessGreater,
        Plus | Minus => Precedence::Sum,
        Slash | Asterisk => Precedence::Product,
        LParen => Precedence::Call,
        LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Parses Monkey-family source into an [ast::Program], accumulating errors rather than
/// aborting on the first one.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: crate::token::Lexeme<'a>,
    peek: crate::token::Lexeme<'a>,
    errors: Vec<String>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.scan_token();
        let peek = lexer.scan_token();
        Parser {
            lexer,
            current,
            peek,
            errors: Vec::new(),
        }
    }

    /// Errors accumulated so far. Check this before trusting the returned [Program].
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while self.current.token() != Token::Eof {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.next_token();
        }
        Program { statements }
    }

    fn next_token(&mut self) {
        self.current = self.peek.clone();
        self.peek = self.lexer.scan_token();
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.token() {
            Token::Let => self.parse_let_statement(),
            Token::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(Token::Ident) {
            return None;
        }
        let name = self.current.text().to_string();

        if !self.expect_peek(Token::Assign) {
            return None;
        }
        self.next_token();

        let mut value = self.parse_expression(Precedence::Lowest)?;
        if let Expression::FnLit { name: fn_name, .. } = &mut value {
            if fn_name.is_none() {
                *fn_name = Some(name.clone());
            }
        }

        if self.peek.token() == Token::Semicolon {
            self.next_token();
        }
        Some(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek.token() == Token::Semicolon {
            self.next_token();
        }
        Some(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek.token() == Token::Semicolon {
            self.next_token();
        }
        Some(Statement::Expression(expr))
    }

    fn parse_block_statement(&mut self) -> Block {
        let mut statements = Vec::new();
        self.next_token();
        while self.current.token() != Token::RBrace && self.current.token() != Token::Eof {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.next_token();
        }
        Block(statements)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while self.peek.token() != Token::Semicolon && precedence < precedence_of(self.peek.token())
        {
            if !is_infix_token(self.peek.token()) {
                return Some(left);
            }
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        match self.current.token() {
            Token::Ident => Some(Expression::Ident(self.current.text().to_string())),
            Token::Int => match self.current.text().parse::<i64>() {
                Ok(value) => Some(Expression::IntLit(value)),
                Err(_) => {
                    self.errors
                        .push(format!("could not parse {:?} as integer", self.current.text()));
                    None
                }
            },
            Token::Str => Some(Expression::StringLit(self.current.text().to_string())),
            Token::True => Some(Expression::BoolLit(true)),
            Token::False => Some(Expression::BoolLit(false)),
            Token::Bang | Token::Minus => self.parse_prefix_expression(),
            Token::LParen => self.parse_grouped_expression(),
            Token::If => self.parse_if_expression(),
            Token::Function => self.parse_function_literal(),
            Token::LBracket => self.parse_array_literal(),
            Token::LBrace => self.parse_hash_literal(),
            other => {
                self.errors
                    .push(format!("no prefix parse function for {:?} found", other));
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        match self.current.token() {
            Token::LParen => self.parse_call_expression(left),
            Token::LBracket => self.parse_index_expression(left),
            _ => self.parse_infix_expression(left),
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = self.current.text().to_string();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = self.current.text().to_string();
        let precedence = precedence_of(self.current.token());
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(Token::RParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(Token::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(Token::RParen) {
            return None;
        }
        if !self.expect_peek(Token::LBrace) {
            return None;
        }
        let consequence = self.parse_block_statement();

        let alternative = if self.peek.token() == Token::Else {
            self.next_token();
            if !self.expect_peek(Token::LBrace) {
                return None;
            }
            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(Token::LParen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(Token::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(Expression::FnLit {
            parameters,
            body,
            name: None,
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut params = Vec::new();

        if self.peek.token() == Token::RParen {
            self.next_token();
            return Some(params);
        }

        self.next_token();
        params.push(self.current.text().to_string());

        while self.peek.token() == Token::Comma {
            self.next_token();
            self.next_token();
            params.push(self.current.text().to_string());
        }

        if !self.expect_peek(Token::RParen) {
            return None;
        }
        Some(params)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(Token::RParen)?;
        Some(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(Token::RBracket) {
            return None;
        }
        Some(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(Token::RBracket)?;
        Some(Expression::ArrayLit(elements))
    }

    fn parse_hash_literal(&mut self) -> Option<Expression> {
        let mut pairs = Vec::new();

        while self.peek.token() != Token::RBrace {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(Token::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if self.peek.token() != Token::RBrace && !self.expect_peek(Token::Comma) {
                return None;
            }
        }

        if !self.expect_peek(Token::RBrace) {
            return None;
        }
        Some(Expression::HashLit(pairs))
    }

    fn parse_expression_list(&mut self, end: Token) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek.token() == end {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek.token() == Token::Comma {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn expect_peek(&mut self, expected: Token) -> bool {
        if self.peek.token() == expected {
            self.next_token();
            true
        } else {
            self.peek_error(expected);
            false
        }
    }

    fn peek_error(&mut self, expected: Token) {
        self.errors.push(format!(
            "expected next token to be {:?}, got {:?} instead",
            expected,
            self.peek.token()
        ));
    }
}

fn is_infix_token(token: Token) -> bool {
    use Token::*;
    matches!(
        token,
        Plus | Minus | Slash | Asterisk | Eq | NotEq | Lt | Gt | LParen | LBracket
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::{Expression as E, Statement as S};

    fn parse(source: &str) -> Program {
        let mut parser = Parser::new(source);
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "parser errors: {:?}",
            parser.errors()
        );
        program
    }

    #[test]
    fn let_statements() {
        let program = parse("let x = 5; let y = true; let foobar = y;");
        assert_eq!(3, program.statements.len());
        match &program.statements[0] {
            S::Let { name, value } => {
                assert_eq!("x", name);
                assert_eq!(&E::IntLit(5), value);
            }
            other => panic!("expected let statement, got {:?}", other),
        }
    }

    #[test]
    fn operator_precedence() {
        let cases = vec![
            ("-a * b", "((-a) * b)"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b * c", "(a + (b * c))"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([1, 2, 3, 4][(b * c)])) * d)"),
        ];

        for (input, expected) in cases {
            let program = parse(input);
            assert_eq!(expected, format_program(&program), "input: {input}");
        }
    }

    #[test]
    fn if_else_expression() {
        let program = parse("if (x < y) { x } else { y }");
        match &program.statements[0] {
            S::Expression(E::If {
                alternative: Some(alt),
                ..
            }) => assert_eq!(1, alt.0.len()),
            other => panic!("expected if/else, got {:?}", other),
        }
    }

    #[test]
    fn function_literal_parameters() {
        let program = parse("fn(x, y, z) {};");
        match &program.statements[0] {
            S::Expression(E::FnLit { parameters, .. }) => {
                assert_eq!(vec!["x", "y", "z"], *parameters);
            }
            other => panic!("expected function literal, got {:?}", other),
        }
    }

    #[test]
    fn let_bound_function_literal_gets_its_name() {
        let program = parse("let identity = fn(x) { x; };");
        match &program.statements[0] {
            S::Let {
                value: E::FnLit { name, .. },
                ..
            } => assert_eq!(Some("identity".to_string()), *name),
            other => panic!("expected named function literal, got {:?}", other),
        }
    }

    #[test]
    fn call_expression_arguments() {
        let program = parse("add(1, 2 * 3, 4 + 5);");
        match &program.statements[0] {
            S::Expression(E::Call { arguments, .. }) => assert_eq!(3, arguments.len()),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn hash_literal_with_expression_values() {
        let program = parse(r#"{"one": 0 + 1, "two": 10 - 8, "three": 15 / 5}"#);
        match &program.statements[0] {
            S::Expression(E::HashLit(pairs)) => assert_eq!(3, pairs.len()),
            other => panic!("expected hash literal, got {:?}", other),
        }
    }

    #[test]
    fn reports_missing_semicolon_is_not_an_error() {
        // trailing semicolons are optional on the final statement
        let program = parse("5");
        assert_eq!(1, program.statements.len());
    }

    #[test]
    fn accumulates_errors_instead_of_aborting() {
        let mut parser = Parser::new("let = 5; let y 10;");
        parser.parse_program();
        assert!(!parser.errors().is_empty());
    }

    /// Minimal re-printer used only to assert precedence groupings in tests.
    fn format_program(program: &Program) -> String {
        program
            .statements
            .iter()
            .map(format_statement)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn format_statement(statement: &S) -> String {
        match statement {
            S::Expression(expr) => format_expression(expr),
            S::Return(expr) => format!("return {}", format_expression(expr)),
            S::Let { name, value } => format!("let {} = {}", name, format_expression(value)),
            S::Block(block) => block
                .0
                .iter()
                .map(format_statement)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn format_expression(expr: &E) -> String {
        match expr {
            E::Ident(name) => name.clone(),
            E::IntLit(value) => value.to_string(),
            E::StringLit(value) => value.clone(),
            E::BoolLit(value) => value.to_string(),
            E::Prefix { operator, right } => format!("({}{})", operator, format_expression(right)),
            E::Infix {
                operator,
                left,
                right,
            } => format!(
                "({} {} {})",
                format_expression(left),
                operator,
                format_expression(right)
            ),
            E::Index { left, index } => {
                format!("({}[{}])", format_expression(left), format_expression(index))
            }
            E::ArrayLit(elements) => format!(
                "[{}]",
                elements
                    .iter()
                    .map(format_expression)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            E::If { .. } => "<if>".to_string(),
            E::FnLit { .. } => "<fn>".to_string(),
            E::Call { .. } => "<call>".to_string(),
            E::HashLit(_) => "<hash>".to_string(),
        }
    }
}
