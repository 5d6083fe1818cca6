use log::debug;
use thiserror::Error;

use crate::lexer::{Lexer, SpannedToken, Token};
use crate::parser::ast::*;
use crate::source::Source;

pub mod ast;

/// A fatal syntax error, no partial tree is produced alongside it
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: SourceSpan,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Formats the error as `<message> at <path>#<line>:<col>`
    pub fn render(&self, source: &Source) -> String {
        let loc = source.offset_to_line_col(self.span.start);
        format!("{} at {}#{}:{}", self.message, source.path(), loc.line, loc.col)
    }
}

/// Parses `source` into its tree and the symbol table of its bindings
pub fn parse(source: &Source) -> Result<(Program, SymbolTable), ParseError> {
    debug!("parsing {}", source.path());
    Parser::new(source.code())?.parse_program()
}

/// Statements and expressions may not nest deeper than this
const MAX_NESTING_DEPTH: usize = 256;

/// Upper bound on the depth of the finished tree, left-leaning chains such as
/// `a + b + c` or `a.b.c` count one level per link
const MAX_TREE_DEPTH: usize = 2048;

/// What the innermost enclosing function allows
#[derive(Debug, Clone, Copy)]
struct FnContext {
    is_async: bool,
    is_generator: bool,
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: SpannedToken,
    previous_end: usize,
    source_len: usize,
    symbol_table: SymbolTable,
    current_scope: ScopeId,
    functions: Vec<FnContext>,
    depth: usize,
    tree_depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        let symbol_table = SymbolTable::new();
        let current_scope = symbol_table.global_scope();

        Ok(Parser {
            lexer,
            current,
            previous_end: 0,
            source_len: source.len(),
            symbol_table,
            current_scope,
            functions: Vec::new(),
            depth: 0,
            tree_depth: 0,
        })
    }

    /// Consumes the current token and returns it
    fn advance(&mut self) -> Result<SpannedToken, ParseError> {
        let next = self.lexer.next_token()?;
        let previous = std::mem::replace(&mut self.current, next);
        self.previous_end = previous.span.end;
        Ok(previous)
    }

    /// The token after the current one
    fn peek(&self) -> Result<SpannedToken, ParseError> {
        self.lexer.clone().next_token()
    }

    fn check(&self, token_type: &Token) -> bool {
        &self.current.token == token_type
    }

    fn check_identifier(&self, name: &str) -> bool {
        matches!(&self.current.token, Token::Identifier(n) if n == name)
    }

    fn match_token(&mut self, token_type: &Token) -> Result<bool, ParseError> {
        if self.check(token_type) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn consume(&mut self, token_type: &Token, message: &str) -> Result<SpannedToken, ParseError> {
        if self.check(token_type) {
            self.advance()
        } else {
            Err(self.unexpected(message))
        }
    }

    fn unexpected(&self, message: &str) -> ParseError {
        ParseError::new(
            format!("{}, got {:?}", message, self.current.token),
            self.current.span,
        )
    }

    /// span from `start` to the end of the last consumed token
    fn span_from(&self, start: usize) -> SourceSpan {
        SourceSpan::new(start, self.previous_end.max(start))
    }

    /// Automatic semicolon insertion: a missing `;` is fine before `}`, at the end
    /// of input, or when the next token starts on a new line
    fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.match_token(&Token::Semicolon)? {
            return Ok(());
        }
        if self.check(&Token::RightBrace) || self.check(&Token::EOF) || self.current.newline_before
        {
            return Ok(());
        }
        Err(self.unexpected("Expected ';'"))
    }

    fn expect_identifier(&mut self, message: &str) -> Result<Identifier, ParseError> {
        if let Token::Identifier(name) = &self.current.token {
            let name = name.clone();
            let token = self.advance()?;
            Ok(Identifier {
                name,
                span: token.span,
            })
        } else {
            Err(self.unexpected(message))
        }
    }

    fn too_deep(&self) -> ParseError {
        ParseError::new("Maximum nesting depth exceeded", self.current.span)
    }

    /// Runs `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: fn(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH || self.tree_depth >= MAX_TREE_DEPTH {
            return Err(self.too_deep());
        }
        self.depth += 1;
        self.tree_depth += 1;
        let result = parse(self);
        self.depth -= 1;
        self.tree_depth -= 1;
        result
    }

    /// Accounts for one more link of a left-leaning chain. The caller resets
    /// `tree_depth` once the chain is complete.
    fn extend_chain(&mut self) -> Result<(), ParseError> {
        if self.tree_depth >= MAX_TREE_DEPTH {
            return Err(self.too_deep());
        }
        self.tree_depth += 1;
        Ok(())
    }

    fn in_async(&self) -> bool {
        self.functions.last().is_some_and(|f| f.is_async)
    }

    fn in_generator(&self) -> bool {
        self.functions.last().is_some_and(|f| f.is_generator)
    }

    fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let previous = self.current_scope;
        self.current_scope = self.symbol_table.create_scope(Some(previous), kind);
        previous
    }

    fn declare(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), ParseError> {
        let span = symbol.span();
        self.symbol_table
            .add_symbol(scope, symbol)
            .map_err(|msg| ParseError::new(msg, span))
    }

    fn declare_variable(&mut self, id: &Identifier, kind: DeclarationKind) -> Result<(), ParseError> {
        let symbol = Symbol::Variable(VariableSymbol {
            name: id.name.clone(),
            binding: kind.into(),
            span: id.span,
        });

        if kind != DeclarationKind::Var {
            return self.declare(self.current_scope, symbol);
        }

        // a hoisted var may not cross a block that binds the same name lexically
        let target = self.symbol_table.function_scope(self.current_scope);
        let mut scope = self.current_scope;
        while scope != target {
            if self
                .symbol_table
                .lookup_local(scope, &id.name)
                .is_some_and(|s| s.is_lexical())
            {
                return Err(ParseError::new(
                    format!("Identifier '{}' has already been declared", id.name),
                    id.span,
                ));
            }
            match self.symbol_table.get_parent_scope(scope) {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        self.declare(target, symbol)
    }

    pub fn parse_program(mut self) -> Result<(Program, SymbolTable), ParseError> {
        let mut body = Vec::new();

        // Parse statements until end of file
        while !self.check(&Token::EOF) {
            body.push(self.parse_statement()?);
        }

        let program = Program {
            body,
            span: SourceSpan::new(0, self.source_len),
        };
        Ok((program, self.symbol_table))
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, ParseError> {
        match &self.current.token {
            Token::Var | Token::Let | Token::Const => {
                let dec = self.parse_var_dec()?;
                self.consume_semicolon()?;
                Ok(Statement::VarDec(dec))
            }
            Token::Function => {
                let start = self.current.span.start;
                Ok(Statement::Function(self.parse_function(
                    FnForm::Declaration,
                    false,
                    start,
                )?))
            }
            Token::Identifier(name) if name == "async" && self.async_function_ahead()? => {
                let start = self.advance()?.span.start;
                Ok(Statement::Function(self.parse_function(
                    FnForm::Declaration,
                    true,
                    start,
                )?))
            }
            Token::LeftBrace => {
                let previous = self.enter_scope(ScopeKind::Block);
                let block = self.parse_block();
                self.current_scope = previous;
                Ok(Statement::Block(block?))
            }
            Token::Return => self.parse_return_statement(),
            Token::If => self.parse_if_statement(),
            Token::While => self.parse_while_statement(),
            Token::For => self.parse_for_statement(),
            Token::Semicolon => {
                let token = self.advance()?;
                Ok(Statement::Empty(EmptyStatement { span: token.span }))
            }
            _ => {
                let start = self.current.span.start;
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::Expression(ExpressionStatement {
                    expression,
                    span: self.span_from(start),
                }))
            }
        }
    }

    /// `async` immediately followed by `function` on the same line
    fn async_function_ahead(&self) -> Result<bool, ParseError> {
        let next = self.peek()?;
        Ok(next.token == Token::Function && !next.newline_before)
    }

    fn parse_var_dec(&mut self) -> Result<VarDecStatement, ParseError> {
        let keyword = self.advance()?;
        let kind = match keyword.token {
            Token::Var => DeclarationKind::Var,
            Token::Let => DeclarationKind::Let,
            _ => DeclarationKind::Const,
        };

        let mut declarations = Vec::new();
        loop {
            let id = self.expect_identifier("Expected variable name")?;
            self.declare_variable(&id, kind)?;

            let init = if self.match_token(&Token::Equal)? {
                Some(self.parse_assignment()?)
            } else if kind == DeclarationKind::Const {
                return Err(ParseError::new(
                    "Missing initializer in const declaration",
                    id.span,
                ));
            } else {
                None
            };

            declarations.push(VarDeclarator {
                span: self.span_from(id.span.start),
                id,
                init,
            });

            if !self.match_token(&Token::Comma)? {
                break;
            }
        }

        Ok(VarDecStatement {
            kind,
            declarations,
            span: self.span_from(keyword.span.start),
        })
    }

    /// Parses from the `function` keyword on, `start` is where the node begins
    /// (before `async` when there is one)
    fn parse_function(&mut self, form: FnForm, is_async: bool, start: usize) -> Result<FnDec, ParseError> {
        self.consume(&Token::Function, "Expected 'function'")?;
        let is_generator = self.match_token(&Token::Star)?;

        let id = match (&self.current.token, form) {
            (Token::Identifier(_), _) => Some(self.expect_identifier("Expected function name")?),
            (_, FnForm::Declaration) => {
                return Err(self.unexpected("Expected function name"));
            }
            (_, FnForm::Expression) => None,
        };

        if let (Some(id), FnForm::Declaration) = (&id, form) {
            self.declare(
                self.current_scope,
                Symbol::Function(FunctionSymbol {
                    name: id.name.clone(),
                    is_async,
                    is_generator,
                    span: id.span,
                }),
            )?;
        }

        let previous = self.enter_scope(ScopeKind::Function);
        self.functions.push(FnContext {
            is_async,
            is_generator,
        });
        let parts = self.parse_params_and_body();
        self.functions.pop();
        self.current_scope = previous;
        let (params, body) = parts?;

        Ok(FnDec {
            id,
            params,
            body,
            is_async,
            is_generator,
            form,
            span: self.span_from(start),
        })
    }

    fn parse_params_and_body(&mut self) -> Result<(Vec<Identifier>, BlockStatement), ParseError> {
        let params = self.parse_parameter_list()?;
        let body = self.parse_block()?;
        Ok((params, body))
    }

    /// `(a, b, c)`, binding each name in the current (function) scope
    fn parse_parameter_list(&mut self) -> Result<Vec<Identifier>, ParseError> {
        self.consume(&Token::LeftParen, "Expected '(' before parameters")?;

        let mut params = Vec::new();
        if !self.check(&Token::RightParen) {
            loop {
                let param = self.expect_identifier("Expected parameter name")?;
                self.declare_parameter(&param)?;
                params.push(param);

                if !self.match_token(&Token::Comma)? {
                    break;
                }
            }
        }

        self.consume(&Token::RightParen, "Expected ')' after parameters")?;
        Ok(params)
    }

    fn declare_parameter(&mut self, param: &Identifier) -> Result<(), ParseError> {
        self.declare(
            self.current_scope,
            Symbol::Variable(VariableSymbol {
                name: param.name.clone(),
                binding: BindingKind::Parameter,
                span: param.span,
            }),
        )
    }

    /// `{ statements }`, the caller decides which scope the statements live in
    fn parse_block(&mut self) -> Result<BlockStatement, ParseError> {
        let start = self
            .consume(&Token::LeftBrace, "Expected '{' at start of block")?
            .span
            .start;

        let mut body = Vec::new();
        while !self.check(&Token::RightBrace) && !self.check(&Token::EOF) {
            body.push(self.parse_statement()?);
        }

        self.consume(&Token::RightBrace, "Expected '}' at end of block")?;

        Ok(BlockStatement {
            body,
            span: self.span_from(start),
        })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.advance()?;
        if self.functions.is_empty() {
            return Err(ParseError::new("Illegal return statement", keyword.span));
        }

        let argument = if self.check(&Token::Semicolon)
            || self.check(&Token::RightBrace)
            || self.check(&Token::EOF)
            || self.current.newline_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;

        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.span_from(keyword.span.start),
        }))
    }

    fn parse_parenthesized(&mut self) -> Result<Expression, ParseError> {
        self.consume(&Token::LeftParen, "Expected '('")?;
        let expr = self.parse_expression()?;
        self.consume(&Token::RightParen, "Expected ')'")?;
        Ok(expr)
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.advance()?.span.start;
        let test = self.parse_parenthesized()?;
        let consequent = Box::new(self.parse_statement()?);

        let alternate = if self.match_token(&Token::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.advance()?.span.start;
        let test = self.parse_parenthesized()?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While(WhileStatement {
            test,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.advance()?.span.start;
        // `let` bindings in the head are scoped to the loop
        let previous = self.enter_scope(ScopeKind::Block);
        let result = self.parse_for_rest(start);
        self.current_scope = previous;
        result
    }

    fn parse_for_rest(&mut self, start: usize) -> Result<Statement, ParseError> {
        self.consume(&Token::LeftParen, "Expected '(' after 'for'")?;

        let init = match &self.current.token {
            Token::Semicolon => None,
            Token::Var | Token::Let | Token::Const => Some(ForInit::VarDec(self.parse_var_dec()?)),
            _ => Some(ForInit::Expression(self.parse_expression()?)),
        };
        self.consume(&Token::Semicolon, "Expected ';' after loop initializer")?;

        let test = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(&Token::Semicolon, "Expected ';' after loop condition")?;

        let update = if self.check(&Token::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(&Token::RightParen, "Expected ')' after loop header")?;

        let body = Box::new(self.parse_statement()?);

        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression, ParseError> {
        self.nested(Self::parse_assignment_inner)
    }

    fn parse_assignment_inner(&mut self) -> Result<Expression, ParseError> {
        if self.arrow_ahead()? {
            return self.parse_arrow_function();
        }
        if self.in_generator() && self.check_identifier("yield") {
            return self.parse_yield();
        }

        let left = self.parse_conditional()?;

        let operator = match self.current.token {
            Token::Equal => AssignmentOperator::Simple,
            Token::PlusEqual => AssignmentOperator::Add,
            Token::MinusEqual => AssignmentOperator::Subtract,
            Token::StarEqual => AssignmentOperator::Multiply,
            Token::SlashEqual => AssignmentOperator::Divide,
            _ => return Ok(left),
        };

        if !matches!(left, Expression::Identifier(_) | Expression::Member(_)) {
            return Err(ParseError::new(
                "Invalid assignment target",
                left.span(),
            ));
        }

        self.advance()?;
        let right = self.parse_assignment()?;

        Ok(Expression::Assignment(AssignmentExpression {
            span: left.span().to(right.span()),
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }))
    }

    /// Looks ahead for `x =>`, `(...) =>`, `async x =>` or `async (...) =>`
    fn arrow_ahead(&self) -> Result<bool, ParseError> {
        match &self.current.token {
            Token::Identifier(name) => {
                let mut ahead = self.lexer.clone();
                let next = ahead.next_token()?;
                if next.newline_before {
                    return Ok(false);
                }
                match next.token {
                    Token::Arrow => Ok(true),
                    Token::Identifier(_) if name == "async" => {
                        let after = ahead.next_token()?;
                        Ok(after.token == Token::Arrow && !after.newline_before)
                    }
                    Token::LeftParen if name == "async" => Self::closes_into_arrow(ahead),
                    _ => Ok(false),
                }
            }
            Token::LeftParen => Self::closes_into_arrow(self.lexer.clone()),
            _ => Ok(false),
        }
    }

    /// With `ahead` positioned just after an opening parenthesis, checks whether
    /// the matching `)` is followed by `=>`
    fn closes_into_arrow(mut ahead: Lexer<'src>) -> Result<bool, ParseError> {
        let mut depth = 1usize;
        while depth > 0 {
            match ahead.next_token()?.token {
                Token::LeftParen => depth += 1,
                Token::RightParen => depth -= 1,
                Token::EOF => return Ok(false),
                _ => {}
            }
        }
        let next = ahead.next_token()?;
        Ok(next.token == Token::Arrow && !next.newline_before)
    }

    fn parse_arrow_function(&mut self) -> Result<Expression, ParseError> {
        let start = self.current.span.start;
        let is_async = self.check_identifier("async") && !matches!(self.peek()?.token, Token::Arrow);
        if is_async {
            self.advance()?;
        }

        let previous = self.enter_scope(ScopeKind::Function);
        self.functions.push(FnContext {
            is_async,
            is_generator: false,
        });
        let parts = self.parse_arrow_rest();
        self.functions.pop();
        self.current_scope = previous;
        let (params, body) = parts?;

        Ok(Expression::Arrow(ArrowFn {
            params,
            body,
            is_async,
            span: self.span_from(start),
        }))
    }

    fn parse_arrow_rest(&mut self) -> Result<(Vec<Identifier>, ArrowBody), ParseError> {
        let params = if self.check(&Token::LeftParen) {
            self.parse_parameter_list()?
        } else {
            let param = self.expect_identifier("Expected parameter name")?;
            self.declare_parameter(&param)?;
            vec![param]
        };

        self.consume(&Token::Arrow, "Expected '=>'")?;

        let body = if self.check(&Token::LeftBrace) {
            ArrowBody::Block(self.parse_block()?)
        } else {
            ArrowBody::Expression(Box::new(self.parse_assignment()?))
        };

        Ok((params, body))
    }

    fn parse_yield(&mut self) -> Result<Expression, ParseError> {
        let keyword = self.advance()?;

        let ends_here = self.current.newline_before
            || matches!(
                self.current.token,
                Token::RightParen
                    | Token::RightBracket
                    | Token::RightBrace
                    | Token::Comma
                    | Token::Semicolon
                    | Token::Colon
                    | Token::EOF
            );
        let argument = if ends_here {
            None
        } else {
            Some(Box::new(self.parse_assignment()?))
        };

        Ok(Expression::Yield(YieldExpression {
            argument,
            span: self.span_from(keyword.span.start),
        }))
    }

    fn parse_conditional(&mut self) -> Result<Expression, ParseError> {
        let test = self.parse_logical_or()?;

        if !self.match_token(&Token::Question)? {
            return Ok(test);
        }

        let consequent = self.parse_assignment()?;
        self.consume(&Token::Colon, "Expected ':' in conditional expression")?;
        let alternate = self.parse_assignment()?;

        Ok(Expression::Conditional(ConditionalExpression {
            span: test.span().to(alternate.span()),
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    /// One left-associative precedence level
    fn parse_binary_level(
        &mut self,
        operand: fn(&mut Self) -> Result<Expression, ParseError>,
        operators: &[(Token, BinaryOperator)],
    ) -> Result<Expression, ParseError> {
        let chain_start = self.tree_depth;
        let mut expr = operand(self)?;

        'outer: loop {
            for (token, operator) in operators {
                if self.match_token(token)? {
                    self.extend_chain()?;
                    let right = operand(self)?;
                    expr = Expression::Binary(BinaryExpression {
                        span: expr.span().to(right.span()),
                        left: Box::new(expr),
                        operator: *operator,
                        right: Box::new(right),
                    });
                    continue 'outer;
                }
            }
            break;
        }

        self.tree_depth = chain_start;
        Ok(expr)
    }

    fn parse_logical_or(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(Self::parse_logical_and, &[(Token::Or, BinaryOperator::Or)])
    }

    fn parse_logical_and(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(Self::parse_equality, &[(Token::And, BinaryOperator::And)])
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(
            Self::parse_relational,
            &[
                (Token::EqualEqualEqual, BinaryOperator::StrictEqual),
                (Token::NotEqualEqual, BinaryOperator::StrictNotEqual),
                (Token::EqualEqual, BinaryOperator::Equal),
                (Token::NotEqual, BinaryOperator::NotEqual),
            ],
        )
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(
            Self::parse_additive,
            &[
                (Token::Less, BinaryOperator::LessThan),
                (Token::LessEqual, BinaryOperator::LessThanOrEqual),
                (Token::Greater, BinaryOperator::GreaterThan),
                (Token::GreaterEqual, BinaryOperator::GreaterThanOrEqual),
            ],
        )
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(
            Self::parse_multiplicative,
            &[
                (Token::Plus, BinaryOperator::Add),
                (Token::Minus, BinaryOperator::Subtract),
            ],
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_level(
            Self::parse_unary,
            &[
                (Token::Star, BinaryOperator::Multiply),
                (Token::Slash, BinaryOperator::Divide),
                (Token::Percent, BinaryOperator::Modulo),
            ],
        )
    }

    /// Only prefix operators recurse, a plain operand goes straight to
    /// `parse_postfix` without counting a level
    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let prefix = match &self.current.token {
            Token::PlusPlus
            | Token::MinusMinus
            | Token::Plus
            | Token::Minus
            | Token::Not
            | Token::Typeof => true,
            Token::Identifier(name) => name == "await" && self.in_async(),
            _ => false,
        };
        if prefix {
            self.nested(Self::parse_unary_inner)
        } else {
            self.parse_postfix()
        }
    }

    fn parse_unary_inner(&mut self) -> Result<Expression, ParseError> {
        let operator = match &self.current.token {
            Token::PlusPlus | Token::MinusMinus => {
                let token = self.advance()?;
                let argument = self.parse_unary()?;
                return self.update_expression(token, argument, true);
            }
            Token::Plus => UnaryOperator::Positive,
            Token::Minus => UnaryOperator::Negative,
            Token::Not => UnaryOperator::Not,
            Token::Typeof => UnaryOperator::Typeof,
            Token::Identifier(name) if name == "await" && self.in_async() => {
                let start = self.advance()?.span.start;
                let argument = self.parse_unary()?;
                return Ok(Expression::Await(AwaitExpression {
                    argument: Box::new(argument),
                    span: self.span_from(start),
                }));
            }
            _ => return self.parse_postfix(),
        };

        let start = self.advance()?.span.start;
        let argument = self.parse_unary()?;

        Ok(Expression::Unary(UnaryExpression {
            operator,
            argument: Box::new(argument),
            span: self.span_from(start),
        }))
    }

    /// `x++` and `x--`, the operator has to be on the same line as its operand
    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_call()?;
        if matches!(self.current.token, Token::PlusPlus | Token::MinusMinus)
            && !self.current.newline_before
        {
            let token = self.advance()?;
            return self.update_expression(token, expr, false);
        }
        Ok(expr)
    }

    fn update_expression(
        &self,
        token: SpannedToken,
        argument: Expression,
        prefix: bool,
    ) -> Result<Expression, ParseError> {
        if !matches!(argument, Expression::Identifier(_) | Expression::Member(_)) {
            return Err(ParseError::new(
                "Invalid increment or decrement target",
                argument.span(),
            ));
        }

        let operator = match token.token {
            Token::PlusPlus => UpdateOperator::Increment,
            _ => UpdateOperator::Decrement,
        };
        let span = if prefix {
            self.span_from(token.span.start)
        } else {
            argument.span().to(token.span)
        };

        Ok(Expression::Update(UpdateExpression {
            operator,
            prefix,
            argument: Box::new(argument),
            span,
        }))
    }

    fn parse_call(&mut self) -> Result<Expression, ParseError> {
        let chain_start = self.tree_depth;
        let mut expr = if self.check(&Token::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            if self.check(&Token::LeftParen) {
                self.extend_chain()?;
                let arguments = self.parse_arguments()?;
                expr = Expression::Call(CallExpression {
                    span: self.span_from(expr.span().start),
                    callee: Box::new(expr),
                    arguments,
                });
            } else if self.check(&Token::Dot) || self.check(&Token::LeftBracket) {
                self.extend_chain()?;
                expr = self.parse_member(expr)?;
            } else {
                break;
            }
        }

        self.tree_depth = chain_start;
        Ok(expr)
    }

    /// `new Callee(args)`, the argument list is optional
    fn parse_new(&mut self) -> Result<Expression, ParseError> {
        let start = self.advance()?.span.start;

        let chain_start = self.tree_depth;
        let mut callee = if self.check(&Token::New) {
            self.nested(Self::parse_new)?
        } else {
            self.parse_primary()?
        };
        while self.check(&Token::Dot) || self.check(&Token::LeftBracket) {
            self.extend_chain()?;
            callee = self.parse_member(callee)?;
        }
        self.tree_depth = chain_start;

        let arguments = if self.check(&Token::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
            span: self.span_from(start),
        }))
    }

    fn parse_member(&mut self, object: Expression) -> Result<Expression, ParseError> {
        let start = object.span().start;

        let (property, computed) = if self.match_token(&Token::Dot)? {
            let name = self.expect_identifier("Expected property name after '.'")?;
            (Expression::Identifier(name), false)
        } else {
            self.consume(&Token::LeftBracket, "Expected '['")?;
            let index = self.parse_expression()?;
            self.consume(&Token::RightBracket, "Expected ']' after index")?;
            (index, true)
        };

        Ok(Expression::Member(MemberExpression {
            object: Box::new(object),
            property: Box::new(property),
            computed,
            span: self.span_from(start),
        }))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.consume(&Token::LeftParen, "Expected '('")?;

        let mut arguments = Vec::new();
        if !self.check(&Token::RightParen) {
            loop {
                arguments.push(self.parse_assignment()?);

                if !self.match_token(&Token::Comma)? {
                    break;
                }
            }
        }

        self.consume(&Token::RightParen, "Expected ')' after arguments")?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let span = self.current.span;

        let literal = |value: LiteralValue| -> Result<Expression, ParseError> {
            Ok(Expression::Literal(Literal { value, span }))
        };

        match &self.current.token {
            Token::Identifier(name) if name == "async" && self.async_function_ahead()? => {
                self.advance()?;
                Ok(Expression::Function(self.parse_function(
                    FnForm::Expression,
                    true,
                    span.start,
                )?))
            }
            Token::Identifier(_) => Ok(Expression::Identifier(
                self.expect_identifier("Expected identifier")?,
            )),
            Token::Function => Ok(Expression::Function(self.parse_function(
                FnForm::Expression,
                false,
                span.start,
            )?)),
            Token::NumberLiteral(value) => {
                let value = *value;
                self.advance()?;
                literal(LiteralValue::Number(value))
            }
            Token::StringLiteral(value) => {
                let value = value.clone();
                self.advance()?;
                literal(LiteralValue::String(value))
            }
            Token::True => {
                self.advance()?;
                literal(LiteralValue::Boolean(true))
            }
            Token::False => {
                self.advance()?;
                literal(LiteralValue::Boolean(false))
            }
            Token::Null => {
                self.advance()?;
                literal(LiteralValue::Null)
            }
            Token::This => {
                self.advance()?;
                Ok(Expression::This(ThisExpression { span }))
            }
            Token::LeftParen => self.parse_parenthesized(),
            Token::LeftBracket => self.parse_array_literal(),
            Token::LeftBrace => self.parse_object_literal(),
            _ => Err(self.unexpected("Expected expression")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expression, ParseError> {
        let start = self.advance()?.span.start;

        let mut elements = Vec::new();
        while !self.check(&Token::RightBracket) {
            elements.push(self.parse_assignment()?);
            if !self.match_token(&Token::Comma)? {
                break;
            }
        }
        self.consume(&Token::RightBracket, "Expected ']' after array elements")?;

        Ok(Expression::Array(ArrayLiteral {
            elements,
            span: self.span_from(start),
        }))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, ParseError> {
        let start = self.advance()?.span.start;

        let mut properties = Vec::new();
        while !self.check(&Token::RightBrace) {
            let key_span = self.current.span;
            let key = match &self.current.token {
                Token::Identifier(_) => {
                    Expression::Identifier(self.expect_identifier("Expected property name")?)
                }
                Token::StringLiteral(value) => {
                    let value = LiteralValue::String(value.clone());
                    self.advance()?;
                    Expression::Literal(Literal { value, span: key_span })
                }
                Token::NumberLiteral(value) => {
                    let value = LiteralValue::Number(*value);
                    self.advance()?;
                    Expression::Literal(Literal { value, span: key_span })
                }
                _ => return Err(self.unexpected("Expected property name")),
            };

            self.consume(&Token::Colon, "Expected ':' after property name")?;
            let value = self.parse_assignment()?;

            properties.push(Property {
                span: key_span.to(value.span()),
                key,
                value,
            });

            if !self.match_token(&Token::Comma)? {
                break;
            }
        }
        self.consume(&Token::RightBrace, "Expected '}' after object properties")?;

        Ok(Expression::Object(ObjectLiteral {
            properties,
            span: self.span_from(start),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(code: &str) -> Result<(Program, SymbolTable), ParseError> {
        parse(&Source::new("test.js", code))
    }

    const TEST_PROGRAM: &str = r#"
// comments should be ignored
var counter = 0, limit = 10;

function isEven(n) {
    return n % 2 === 0
}

/* a block comment */
var obj = { name: "checker", 'quoted': [1, 2.5, .5,], nested: { ok: true } };

for (var i = 0; i < limit; i += 1) {
    if (isEven(i)) {
        counter = counter + 1;
    } else if (!i) {
        counter -= 1
    } else {
        ;
    }
}

while (counter > 0) counter = counter - 1

var f = function named(a, b) { return typeof a == "string" ? a : b; };
var inst = new Date(2020).getTime();
obj.nested["ok"] = null;
"#;

    #[test]
    fn test_parser() {
        let (program, table) = parse_str(TEST_PROGRAM).unwrap();
        assert_eq!(program.body.len(), 8);
        assert!(matches!(program.body[0], Statement::VarDec(_)));
        assert!(matches!(program.body[1], Statement::Function(_)));
        assert!(matches!(program.body[3], Statement::For(_)));
        assert!(matches!(program.body[4], Statement::While(_)));
        assert!(matches!(program.body[7], Statement::Expression(_)));

        let global = table.global_scope();
        for name in ["counter", "limit", "isEven", "obj", "i", "f", "inst"] {
            assert!(table.lookup_local(global, name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn test_declaration_kinds_and_spans() {
        let (program, _) = parse_str("let a = 1, b\nconst c = 2").unwrap();
        let Statement::VarDec(first) = &program.body[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(first.kind(), DeclarationKind::Let);
        assert_eq!(first.declarations.len(), 2);
        assert_eq!(first.span, SourceSpan::new(0, 12));
        assert_eq!(first.declarations[0].id.name, "a");
        assert!(first.declarations[1].init.is_none());

        let Statement::VarDec(second) = &program.body[1] else {
            panic!("expected a declaration");
        };
        assert_eq!(second.kind(), DeclarationKind::Const);
        assert_eq!(second.span.start, 13);
    }

    #[test]
    fn test_function_flags() {
        let (program, table) =
            parse_str("async function* f() { yield 1; let a = 1 }\nvar g = async function () { await f() }")
                .unwrap();

        let Statement::Function(f) = &program.body[0] else {
            panic!("expected a function declaration");
        };
        assert!(f.is_async() && f.is_generator() && f.is_declaration());
        assert_eq!(f.span.start, 0);

        let Statement::VarDec(dec) = &program.body[1] else {
            panic!("expected a declaration");
        };
        let Some(Expression::Function(g)) = &dec.declarations[0].init else {
            panic!("expected a function expression");
        };
        assert!(g.is_async() && !g.is_generator() && !g.is_declaration());
        assert!(g.id.is_none());

        let Some(Symbol::Function(sym)) = table.lookup_local(table.global_scope(), "f") else {
            panic!("expected f to be bound");
        };
        assert!(sym.is_async && sym.is_generator);
    }

    #[test]
    fn test_arrow_functions() {
        let (program, _) = parse_str(
            "var a = x => x * 2; var b = (x, y) => { return x + y }; var c = async () => 1; var d = (1 + 2) * 3;",
        )
        .unwrap();

        let init = |i: usize| match &program.body[i] {
            Statement::VarDec(dec) => dec.declarations[0].init.clone().unwrap(),
            _ => panic!("expected a declaration"),
        };

        assert!(matches!(init(0), Expression::Arrow(ArrowFn { is_async: false, .. })));
        let Expression::Arrow(b) = init(1) else {
            panic!("expected an arrow function");
        };
        assert_eq!(b.params.len(), 2);
        assert!(matches!(b.body, ArrowBody::Block(_)));
        assert!(matches!(init(2), Expression::Arrow(ArrowFn { is_async: true, .. })));
        assert!(matches!(init(3), Expression::Binary(_)));
    }

    #[test]
    fn test_async_is_an_identifier_elsewhere() {
        let (program, _) = parse_str("var async = 1; async(2); async\nfunction f() {}").unwrap();
        assert_eq!(program.body.len(), 4);
        let Statement::Function(f) = &program.body[3] else {
            panic!("expected a function declaration");
        };
        assert!(!f.is_async());
    }

    #[test]
    fn test_await_outside_async_is_an_identifier() {
        let (program, _) = parse_str("var await = 1; await + 1").unwrap();
        let Statement::Expression(stmt) = &program.body[1] else {
            panic!("expected an expression statement");
        };
        assert!(matches!(stmt.expression, Expression::Binary(_)));
    }

    #[test]
    fn test_scopes() {
        let (_, table) =
            parse_str("function f(a) { var v = 1; { let b = 2; var w } }\nlet top = 0").unwrap();
        let global = table.global_scope();
        assert!(table.lookup_local(global, "f").is_some());
        assert!(table.lookup_local(global, "top").is_some());
        assert!(table.lookup_local(global, "v").is_none());
        assert!(table.lookup_local(global, "w").is_none());
        // global, f, inner block
        assert_eq!(table.scope_count(), 3);
    }

    #[test]
    fn test_redeclaration_errors() {
        let err = parse_str("let a = 1\nlet a = 2").unwrap_err();
        assert_eq!(err.message, "Identifier 'a' has already been declared");
        assert_eq!(err.span, SourceSpan::new(14, 15));

        assert!(parse_str("var a; var a;").is_ok());
        assert!(parse_str("let a; { let a; }").is_ok());
        assert!(parse_str("{ let a; var a; }").is_err());
        assert!(parse_str("function f(a) { let a }").is_err());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_str("let = 1").is_err());
        assert!(parse_str("const a").is_err());
        assert!(parse_str("function () {}").is_err());
        assert!(parse_str("function f( {").is_err());
        assert!(parse_str("var a = 1 var b = 2").is_err());
        assert!(parse_str("1 = a").is_err());
        assert!(parse_str("return 1").is_err());
        assert!(parse_str("var a = (1, 2)").is_err());
    }

    fn expression(stmt: &Statement) -> &Expression {
        match stmt {
            Statement::Expression(stmt) => &stmt.expression,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_update_expressions() {
        let (program, _) = parse_str("var i = 0, o = { n: 1 }
i++
--o.n
i
++i").unwrap();
        assert_eq!(program.body.len(), 5);

        let Expression::Update(post) = expression(&program.body[1]) else {
            panic!("expected an update expression");
        };
        assert_eq!(post.operator, UpdateOperator::Increment);
        assert!(!post.prefix);
        assert_eq!(post.span, SourceSpan::new(24, 27));

        let Expression::Update(pre) = expression(&program.body[2]) else {
            panic!("expected an update expression");
        };
        assert_eq!(pre.operator, UpdateOperator::Decrement);
        assert!(pre.prefix);
        assert!(matches!(pre.argument.as_ref(), Expression::Member(_)));

        // `++` on the next line belongs to the following statement
        assert!(matches!(expression(&program.body[3]), Expression::Identifier(_)));
        assert!(matches!(
            expression(&program.body[4]),
            Expression::Update(UpdateExpression { prefix: true, .. })
        ));
    }

    #[test]
    fn test_invalid_update_target() {
        let err = parse_str("++1").unwrap_err();
        assert_eq!(err.message, "Invalid increment or decrement target");
        assert!(parse_str("f()--").is_err());
        assert!(parse_str("x++ = 1").is_err());
    }

    #[test]
    fn test_exponent_literal() {
        let (program, _) = parse_str("var s = 'a' + \"b\"; 1e3").unwrap();
        assert!(matches!(
            expression(&program.body[1]),
            Expression::Literal(Literal { value: LiteralValue::Number(n), .. }) if *n == 1000.0
        ));
    }

    /// Deep inputs run on a thread with a fixed 8 MiB stack
    fn on_big_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::Builder::new()
            .stack_size(8 << 20)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    fn nested(open: &str, inner: &str, close: &str, depth: usize) -> String {
        format!("{}{}{}", open.repeat(depth), inner, close.repeat(depth))
    }

    #[test]
    fn test_nesting_limit() {
        let results = on_big_stack(|| {
            [
                nested("var a = ", "", "", 1) + &nested("[", "1", "]", 10_000),
                nested("{", "", "}", 10_000),
                nested("(", "1", ")", 10_000),
                nested("!", "x", "", 10_000),
                nested("if (a) ", "b", "", 10_000),
                "var f = ".to_string() + &"x => ".repeat(10_000) + "x",
            ]
            .iter()
            .map(|code| parse_str(code).map(|_| ()).map_err(|e| e.message))
            .collect::<Vec<_>>()
        });

        for result in results {
            assert_eq!(result, Err("Maximum nesting depth exceeded".to_string()));
        }
    }

    #[test]
    fn test_long_chains() {
        let results = on_big_stack(|| {
            let long = vec!["'x'"; 1_500].join(" + ");
            let too_long = vec!["'x'"; 50_000].join(" + ");
            let members = "a".to_string() + &".b".repeat(50_000);
            let calls = "f".to_string() + &"()".repeat(50_000);
            [
                format!("{long};\n{long}"),
                too_long,
                members,
                calls,
            ]
            .iter()
            .map(|code| parse_str(code).map(|_| ()).map_err(|e| e.message))
            .collect::<Vec<_>>()
        });

        // the counter is reset after each chain, so two long ones in a row are fine
        assert_eq!(results[0], Ok(()));
        for result in &results[1..] {
            assert_eq!(result, &Err("Maximum nesting depth exceeded".to_string()));
        }
    }

    #[test]
    fn test_nesting_below_limit() {
        let result = on_big_stack(|| {
            let code = "var a = ".to_string() + &nested("[", "1", "]", 200);
            parse_str(&code).map(|(program, _)| program.body.len())
        });
        assert_eq!(result, Ok(1));
    }

    #[test]
    fn test_error_render() {
        let source = Source::new("bad.js", "var a = 1\nvar = 2");
        let err = parse(&source).unwrap_err();
        assert_eq!(
            err.render(&source),
            "Expected variable name, got Equal at bad.js#2:5"
        );
    }
}
