//! Tokenizer for command scripts.

use super::error::{Position, ScriptError};

/// Maximum depth of strings interpolated inside interpolations
pub const MAX_INTERPOLATION_NESTING: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// `:name`, evaluates to the string `"name"`
    Symbol(String),
    Int(i64),
    Float(f64),
    /// Double-quoted string, possibly with `#{...}` interpolation
    Str(Vec<StrPart>),
    True,
    False,
    Nil,
    Let,
    If,
    Else,
    For,
    In,
    While,
    Return,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    /// `#{`, opens a map literal
    HashBrace,
    Comma,
    Colon,
    Semi,
    Dot,
    Pipe,
    PipePipe,
    AndAnd,
    Bang,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrPart {
    Lit(String),
    Code(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    nesting: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self::starting_at(source, Position::new(1, 1), 0)
    }

    fn starting_at(source: &str, start: Position, nesting: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: start.line,
            column: start.column,
            tokens: Vec::new(),
            nesting,
        }
    }

    /// Tokenize the whole source, ending with `Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>, ScriptError> {
        loop {
            self.skip_trivia()?;
            let start = self.position();
            let Some(c) = self.peek() else {
                self.tokens.push(Token {
                    kind: TokenKind::Eof,
                    position: start,
                });
                return Ok(self.tokens);
            };

            let kind = match c {
                '0'..='9' => self.number(start)?,
                '"' => self.string(start)?,
                '\'' => self.raw_string(start)?,
                c if is_ident_start(c) => self.ident(),
                ':' if self.symbol_allowed() && self.peek_at(1).is_some_and(is_ident_start) => {
                    self.bump();
                    match self.ident() {
                        TokenKind::Ident(name) => TokenKind::Symbol(name),
                        other => TokenKind::Symbol(keyword_text(&other).to_string()),
                    }
                }
                _ => self.punct(start)?,
            };
            self.tokens.push(Token {
                kind,
                position: start,
            });
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    // A `:` right after an identifier is a named-argument or map-key colon.
    fn symbol_allowed(&self) -> bool {
        !matches!(
            self.tokens.last().map(|t| &t.kind),
            Some(TokenKind::Ident(_))
                | Some(TokenKind::Str(_))
                | Some(TokenKind::RParen)
                | Some(TokenKind::RBracket)
        )
    }

    fn skip_trivia(&mut self) -> Result<(), ScriptError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.position();
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(ScriptError::syntax(start, "unterminated comment"))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn number(&mut self, start: Position) -> Result<TokenKind, ScriptError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c != '_' {
                break;
            }
            self.bump();
        }

        let is_float = self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.bump();
            text.push('.');
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                } else if c != '_' {
                    break;
                }
                self.bump();
            }
            return text
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|e| ScriptError::syntax(start, format!("invalid number `{}`: {}", text, e)));
        }

        text.parse::<i64>()
            .map(TokenKind::Int)
            .map_err(|e| ScriptError::syntax(start, format!("invalid number `{}`: {}", text, e)))
    }

    fn ident(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        // Predicate and bang suffixes: `setup?`, `reset!`
        match (self.peek(), self.peek_at(1)) {
            (Some('?'), _) => {
                self.bump();
                name.push('?');
            }
            (Some('!'), next) if next != Some('=') => {
                self.bump();
                name.push('!');
            }
            _ => {}
        }

        match name.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" => TokenKind::Nil,
            "let" => TokenKind::Let,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            _ => TokenKind::Ident(name),
        }
    }

    fn escape(&mut self, start: Position) -> Result<char, ScriptError> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some(c @ ('\\' | '"' | '\'' | '#')) => Ok(c),
            Some(c) => Err(ScriptError::syntax(start, format!("unknown escape `\\{}`", c))),
            None => Err(ScriptError::syntax(start, "unterminated string")),
        }
    }

    fn string(&mut self, start: Position) -> Result<TokenKind, ScriptError> {
        self.bump();
        let mut parts = Vec::new();
        let mut lit = String::new();
        loop {
            match self.peek() {
                None => return Err(ScriptError::syntax(start, "unterminated string")),
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    lit.push(self.escape(start)?);
                }
                Some('#') if self.peek_at(1) == Some('{') => {
                    if !lit.is_empty() {
                        parts.push(StrPart::Lit(std::mem::take(&mut lit)));
                    }
                    parts.push(StrPart::Code(self.interpolation()?));
                }
                Some(c) => {
                    self.bump();
                    lit.push(c);
                }
            }
        }
        if !lit.is_empty() || parts.is_empty() {
            parts.push(StrPart::Lit(lit));
        }
        Ok(TokenKind::Str(parts))
    }

    fn interpolation(&mut self) -> Result<Vec<Token>, ScriptError> {
        let open = self.position();
        if self.nesting >= MAX_INTERPOLATION_NESTING {
            return Err(ScriptError::syntax(open, "nesting too deep"));
        }
        self.bump();
        self.bump();
        let inner_start = self.position();
        let begin = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        loop {
            let Some(c) = self.peek() else {
                return Err(ScriptError::syntax(open, "unterminated interpolation"));
            };
            match (quote, c) {
                (Some(_), '\\') => {
                    self.bump();
                }
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '{') => depth += 1,
                (None, '}') if depth == 0 => break,
                (None, '}') => depth -= 1,
                _ => {}
            }
            self.bump();
        }
        let code: String = self.chars[begin..self.pos].iter().collect();
        self.bump();

        let mut tokens = Lexer::starting_at(&code, inner_start, self.nesting + 1).tokenize()?;
        if tokens.len() == 1 {
            return Err(ScriptError::syntax(open, "empty interpolation"));
        }
        // Drop the nested Eof; the parser appends its own.
        tokens.pop();
        Ok(tokens)
    }

    fn raw_string(&mut self, start: Position) -> Result<TokenKind, ScriptError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(ScriptError::syntax(start, "unterminated string")),
                Some('\'') => break,
                Some('\\') if matches!(self.peek(), Some('\'') | Some('\\')) => {
                    if let Some(c) = self.bump() {
                        text.push(c);
                    }
                }
                Some(c) => text.push(c),
            }
        }
        Ok(TokenKind::Str(vec![StrPart::Lit(text)]))
    }

    fn punct(&mut self, start: Position) -> Result<TokenKind, ScriptError> {
        let c = self.bump().unwrap_or('\0');
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semi,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '#' if self.eat('{') => TokenKind::HashBrace,
            '|' if self.eat('|') => TokenKind::PipePipe,
            '|' => TokenKind::Pipe,
            '&' if self.eat('&') => TokenKind::AndAnd,
            '=' if self.eat('=') => TokenKind::EqEq,
            '=' => TokenKind::Assign,
            '!' if self.eat('=') => TokenKind::NotEq,
            '!' => TokenKind::Bang,
            '<' if self.eat('=') => TokenKind::Le,
            '<' => TokenKind::Lt,
            '>' if self.eat('=') => TokenKind::Ge,
            '>' => TokenKind::Gt,
            other => {
                return Err(ScriptError::syntax(
                    start,
                    format!("unexpected character `{}`", other),
                ))
            }
        };
        Ok(kind)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword_text(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::Nil => "nil",
        TokenKind::Let => "let",
        TokenKind::If => "if",
        TokenKind::Else => "else",
        TokenKind::For => "for",
        TokenKind::In => "in",
        TokenKind::While => "while",
        TokenKind::Return => "return",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_symbols_and_named_arguments() {
        let tokens = kinds("argument(:name, default: :world)");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("argument".into()),
                TokenKind::LParen,
                TokenKind::Symbol("name".into()),
                TokenKind::Comma,
                TokenKind::Ident("default".into()),
                TokenKind::Colon,
                TokenKind::Symbol("world".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_predicate_identifiers() {
        let tokens = kinds("setup? != reset!");
        assert_eq!(tokens[0], TokenKind::Ident("setup?".into()));
        assert_eq!(tokens[1], TokenKind::NotEq);
        assert_eq!(tokens[2], TokenKind::Ident("reset!".into()));
    }

    #[test]
    fn test_interpolated_string() {
        let tokens = kinds(r#""Hello, #{options[:name]}!""#);
        match &tokens[0] {
            TokenKind::Str(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], StrPart::Lit("Hello, ".into()));
                assert!(matches!(parts[1], StrPart::Code(ref code) if code.len() == 4));
                assert_eq!(parts[2], StrPart::Lit("!".into()));
            }
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_string_keeps_hash_braces() {
        let tokens = kinds("'#{not code}'");
        assert_eq!(
            tokens[0],
            TokenKind::Str(vec![StrPart::Lit("#{not code}".into())])
        );
    }

    #[test]
    fn test_numbers_and_method_calls() {
        let tokens = kinds("1.5 2.to_string");
        assert_eq!(tokens[0], TokenKind::Float(1.5));
        assert_eq!(tokens[1], TokenKind::Int(2));
        assert_eq!(tokens[2], TokenKind::Dot);
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("// line\n/* block\n */ nil");
        assert_eq!(tokens, vec![TokenKind::Nil, TokenKind::Eof]);
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!(tokens[1].position, Position::new(2, 3));
    }

    #[test]
    fn test_unterminated_string_is_syntax_error() {
        let err = Lexer::new("\"open").tokenize().unwrap_err();
        assert!(err.message.starts_with("syntax error"));
    }

    #[test]
    fn test_unexpected_character() {
        assert!(Lexer::new("a @ b").tokenize().is_err());
    }

    #[test]
    fn test_nested_interpolation_is_bounded() {
        let shallow = format!("{}1{}", "\"#{".repeat(3), "}\"".repeat(3));
        assert!(Lexer::new(&shallow).tokenize().is_ok());

        let deep = format!("{}1{}", "\"#{".repeat(500), "}\"".repeat(500));
        let err = Lexer::new(&deep).tokenize().unwrap_err();
        assert!(err.message.contains("nesting too deep"));

        let unterminated = "\"#{".repeat(500);
        assert!(Lexer::new(&unterminated).tokenize().is_err());
    }
}
