use std::iter::Peekable;
use std::str::CharIndices;

use crate::parser::ParseError;
use crate::parser::ast::SourceSpan;

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    // Keywords
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    While,
    For,
    New,
    This,
    True,
    False,
    Null,
    Typeof,

    // Identifiers and literals
    Identifier(String),
    StringLiteral(String),
    NumberLiteral(f64),

    // Operators and punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    EqualEqual,
    EqualEqualEqual,
    NotEqual,
    NotEqualEqual,
    PlusEqual,
    MinusEqual,
    PlusPlus,
    MinusMinus,
    StarEqual,
    SlashEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Semicolon,
    Question,
    Arrow,
    Or,
    And,
    Not,

    // misc symbols
    Dot,

    // End of file
    EOF,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: SourceSpan,
    /// set when a line terminator separates this token from the previous one
    pub newline_before: bool,
}

/// Cloning a lexer is cheap and gives the parser arbitrary lookahead
#[derive(Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    newline_seen: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source,
            chars: source.char_indices().peekable(),
            newline_seen: false,
        }
    }

    /// byte offset of the next unread character
    fn offset(&mut self) -> usize {
        match self.chars.peek() {
            Some(&(i, _)) => i,
            None => self.source.len(),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.newline_seen = true;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self, start: usize) -> Result<(), ParseError> {
        while let Some(c) = self.advance() {
            if c == '*' && self.peek() == Some('/') {
                self.advance();
                return Ok(());
            }
        }

        Err(ParseError::new(
            "Unterminated comment",
            SourceSpan::new(start, self.source.len()),
        ))
    }

    fn read_identifier(&mut self, first_char: char) -> String {
        let mut identifier = String::new();
        identifier.push(first_char);

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                identifier.push(c);
                self.advance();
            } else {
                break;
            }
        }

        identifier
    }

    fn read_number(&mut self, first_char: char, start: usize) -> Result<f64, ParseError> {
        if first_char == '0' && matches!(self.peek(), Some('x') | Some('X')) {
            self.advance();
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    digits.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            return u64::from_str_radix(&digits, 16)
                .map(|v| v as f64)
                .map_err(|e| {
                    ParseError::new(
                        format!("Invalid number: {}", e),
                        SourceSpan::new(start, self.offset()),
                    )
                });
        }

        let mut number = String::new();
        number.push(first_char);

        let mut has_decimal = first_char == '.';

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                number.push(c);
                self.advance();
            } else if c == '.' && !has_decimal {
                has_decimal = true;
                number.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            self.read_exponent(&mut number, start)?;
        }

        number.parse::<f64>().map_err(|e| {
            ParseError::new(
                format!("Invalid number: {}", e),
                SourceSpan::new(start, self.offset()),
            )
        })
    }

    /// `e`, an optional sign, then at least one digit
    fn read_exponent(&mut self, number: &mut String, start: usize) -> Result<(), ParseError> {
        self.advance();
        number.push('e');
        if let Some(sign @ ('+' | '-')) = self.peek() {
            number.push(sign);
            self.advance();
        }

        let mut has_digits = false;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            has_digits = true;
            number.push(c);
            self.advance();
        }

        if !has_digits {
            return Err(ParseError::new(
                "Invalid number: missing exponent digits",
                SourceSpan::new(start, self.offset()),
            ));
        }
        Ok(())
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<String, ParseError> {
        let mut string = String::new();

        while let Some(c) = self.advance() {
            if c == quote {
                return Ok(string);
            } else if c == '\n' {
                break;
            } else if c == '\\' {
                if let Some(escape) = self.advance() {
                    match escape {
                        'n' => string.push('\n'),
                        't' => string.push('\t'),
                        'r' => string.push('\r'),
                        '0' => string.push('\0'),
                        '\\' => string.push('\\'),
                        '\'' => string.push('\''),
                        '"' => string.push('"'),
                        // line continuation
                        '\n' => {}
                        _ => {
                            return Err(ParseError::new(
                                format!("Invalid escape sequence: \\{}", escape),
                                SourceSpan::new(start, self.offset()),
                            ));
                        }
                    }
                } else {
                    break;
                }
            } else {
                string.push(c);
            }
        }

        Err(ParseError::new(
            "Unterminated string literal",
            SourceSpan::new(start, self.offset()),
        ))
    }

    /// Consumes `=` if it is next and returns `with`, otherwise returns `without`
    fn with_equal(&mut self, with: Token, without: Token) -> Token {
        if self.peek() == Some('=') {
            self.advance();
            with
        } else {
            without
        }
    }

    pub fn next_token(&mut self) -> Result<SpannedToken, ParseError> {
        self.newline_seen = false;

        loop {
            self.skip_whitespace();

            let start = self.offset();

            // Check for EOF
            let c = match self.advance() {
                Some(c) => c,
                None => {
                    return Ok(SpannedToken {
                        token: Token::EOF,
                        span: SourceSpan::new(start, start),
                        newline_before: self.newline_seen,
                    });
                }
            };

            // Process the current character
            let token = match c {
                '{' => Token::LeftBrace,
                '}' => Token::RightBrace,
                '(' => Token::LeftParen,
                ')' => Token::RightParen,
                '[' => Token::LeftBracket,
                ']' => Token::RightBracket,
                ',' => Token::Comma,
                ':' => Token::Colon,
                ';' => Token::Semicolon,
                '?' => Token::Question,
                '+' if self.peek() == Some('+') => {
                    self.advance();
                    Token::PlusPlus
                }
                '-' if self.peek() == Some('-') => {
                    self.advance();
                    Token::MinusMinus
                }
                '+' => self.with_equal(Token::PlusEqual, Token::Plus),
                '-' => self.with_equal(Token::MinusEqual, Token::Minus),
                '*' => self.with_equal(Token::StarEqual, Token::Star),
                '%' => Token::Percent,
                '/' => match self.peek() {
                    Some('/') => {
                        self.skip_line_comment();
                        continue;
                    }
                    Some('*') => {
                        self.advance();
                        self.skip_block_comment(start)?;
                        continue;
                    }
                    _ => self.with_equal(Token::SlashEqual, Token::Slash),
                },
                '=' => match self.peek() {
                    Some('>') => {
                        self.advance();
                        Token::Arrow
                    }
                    Some('=') => {
                        self.advance();
                        self.with_equal(Token::EqualEqualEqual, Token::EqualEqual)
                    }
                    _ => Token::Equal,
                },
                '!' => {
                    if self.peek() == Some('=') {
                        self.advance();
                        self.with_equal(Token::NotEqualEqual, Token::NotEqual)
                    } else {
                        Token::Not
                    }
                }
                '>' => self.with_equal(Token::GreaterEqual, Token::Greater),
                '<' => self.with_equal(Token::LessEqual, Token::Less),
                '|' if self.peek() == Some('|') => {
                    self.advance();
                    Token::Or
                }
                '&' if self.peek() == Some('&') => {
                    self.advance();
                    Token::And
                }
                '.' => {
                    if self.peek().is_some_and(|n| n.is_ascii_digit()) {
                        Token::NumberLiteral(self.read_number(c, start)?)
                    } else {
                        Token::Dot
                    }
                }
                '"' | '\'' => Token::StringLiteral(self.read_string(c, start)?),
                '0'..='9' => Token::NumberLiteral(self.read_number(c, start)?),
                c if c.is_alphabetic() || c == '_' || c == '$' => {
                    let identifier = self.read_identifier(c);
                    match identifier.as_str() {
                        "var" => Token::Var,
                        "let" => Token::Let,
                        "const" => Token::Const,
                        "function" => Token::Function,
                        "return" => Token::Return,
                        "if" => Token::If,
                        "else" => Token::Else,
                        "while" => Token::While,
                        "for" => Token::For,
                        "new" => Token::New,
                        "this" => Token::This,
                        "true" => Token::True,
                        "false" => Token::False,
                        "null" => Token::Null,
                        "typeof" => Token::Typeof,
                        _ => Token::Identifier(identifier),
                    }
                }
                _ => {
                    return Err(ParseError::new(
                        format!("Unexpected character: {}", c),
                        SourceSpan::new(start, self.offset()),
                    ));
                }
            };

            return Ok(SpannedToken {
                token,
                span: SourceSpan::new(start, self.offset()),
                newline_before: self.newline_seen,
            });
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, ParseError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.token == Token::EOF;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            tokens("let a = 1;"),
            vec![
                Token::Let,
                Token::Identifier("a".to_string()),
                Token::Equal,
                Token::NumberLiteral(1.0),
                Token::Semicolon,
                Token::EOF,
            ]
        );
    }

    #[test]
    fn test_async_generator_header() {
        assert_eq!(
            tokens("async function* f() {}"),
            vec![
                Token::Identifier("async".to_string()),
                Token::Function,
                Token::Star,
                Token::Identifier("f".to_string()),
                Token::LeftParen,
                Token::RightParen,
                Token::LeftBrace,
                Token::RightBrace,
                Token::EOF,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("a === b !== c => d == e != f >= g && h || !i"),
            vec![
                Token::Identifier("a".to_string()),
                Token::EqualEqualEqual,
                Token::Identifier("b".to_string()),
                Token::NotEqualEqual,
                Token::Identifier("c".to_string()),
                Token::Arrow,
                Token::Identifier("d".to_string()),
                Token::EqualEqual,
                Token::Identifier("e".to_string()),
                Token::NotEqual,
                Token::Identifier("f".to_string()),
                Token::GreaterEqual,
                Token::Identifier("g".to_string()),
                Token::And,
                Token::Identifier("h".to_string()),
                Token::Or,
                Token::Not,
                Token::Identifier("i".to_string()),
                Token::EOF,
            ]
        );
    }

    #[test]
    fn test_comments_and_strings() {
        assert_eq!(
            tokens("/* block */ 'it\\'s' // line\n\"x\""),
            vec![
                Token::StringLiteral("it's".to_string()),
                Token::StringLiteral("x".to_string()),
                Token::EOF,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("0x1f 1.5 .25"),
            vec![
                Token::NumberLiteral(31.0),
                Token::NumberLiteral(1.5),
                Token::NumberLiteral(0.25),
                Token::EOF,
            ]
        );
    }

    #[test]
    fn test_exponents() {
        assert_eq!(
            tokens("1e3 2.5E-2 4e+1 .5e1"),
            vec![
                Token::NumberLiteral(1000.0),
                Token::NumberLiteral(0.025),
                Token::NumberLiteral(40.0),
                Token::NumberLiteral(5.0),
                Token::EOF,
            ]
        );
        let err = Lexer::new("1e+").tokenize().unwrap_err();
        assert_eq!(err.message, "Invalid number: missing exponent digits");
    }

    #[test]
    fn test_increment_and_decrement() {
        assert_eq!(
            tokens("++x; y--; a + +b; c -= 1"),
            vec![
                Token::PlusPlus,
                Token::Identifier("x".to_string()),
                Token::Semicolon,
                Token::Identifier("y".to_string()),
                Token::MinusMinus,
                Token::Semicolon,
                Token::Identifier("a".to_string()),
                Token::Plus,
                Token::Plus,
                Token::Identifier("b".to_string()),
                Token::Semicolon,
                Token::Identifier("c".to_string()),
                Token::MinusEqual,
                Token::NumberLiteral(1.0),
                Token::EOF,
            ]
        );
    }

    #[test]
    fn test_spans_and_newlines() {
        let toks = Lexer::new("var a\n  b").tokenize().unwrap();
        assert_eq!(toks[0].span, SourceSpan::new(0, 3));
        assert_eq!(toks[1].span, SourceSpan::new(4, 5));
        assert!(!toks[1].newline_before);
        assert_eq!(toks[2].span, SourceSpan::new(8, 9));
        assert!(toks[2].newline_before);
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("'open").tokenize().is_err());
        assert!(Lexer::new("/* open").tokenize().is_err());
        assert!(Lexer::new("a # b").tokenize().is_err());
        assert!(Lexer::new("`tpl`").tokenize().is_err());
    }
}
