use crate::diagnostics::{Diagnostics, Message};
use crate::token::{Kind, Token};

/// Pull-based producer of tokens consumed by the parser.
///
/// After the input is exhausted every call returns an `Eof` token. Lexical
/// errors never abort scanning: they are written to `diagnostics` and the
/// offending token is returned with a zero value.
pub trait TokenSource {
    fn next_token(&mut self, diagnostics: &mut Diagnostics) -> Token;
}

/// Scanner for MicroJava source text.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
            self.col = 1;
        } else if ch.is_some() {
            self.col += 1;
        }
        self.pos += 1;
        ch
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch == ' ' || ch == '\t' || ch == '\r' || ch == '\n' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skips a (possibly nested) `/* ... */` comment. The opening `/*` is
    /// the current input.
    fn skip_comment(&mut self, diagnostics: &mut Diagnostics) {
        let (line, col) = (self.line, self.col);
        self.advance();
        self.advance();
        let mut depth = 1;

        while depth > 0 {
            match (self.current(), self.peek()) {
                (None, _) => {
                    diagnostics.report(line, col, Message::EofInComment);
                    return;
                }
                (Some('/'), Some('*')) => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn read_name(&mut self, token: &mut Token) {
        let mut name = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match Kind::keyword(&name) {
            Some(kind) => token.kind = kind,
            None => {
                token.kind = Kind::Ident;
                token.text = Some(name);
            }
        }
    }

    fn read_number(&mut self, token: &mut Token, diagnostics: &mut Diagnostics) {
        let mut digits = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        token.kind = Kind::Number;
        match digits.parse::<i32>() {
            Ok(value) => token.value = value,
            Err(_) => {
                diagnostics.report(token.line, token.col, Message::BigNum(digits));
                token.value = 0;
            }
        }
    }

    /// Reads a character constant; the opening quote is the current input.
    fn read_char_const(&mut self, token: &mut Token, diagnostics: &mut Diagnostics) {
        token.kind = Kind::CharConst;
        self.advance();

        let value = match self.current() {
            None => {
                diagnostics.report(token.line, token.col, Message::EofInChar);
                return;
            }
            Some('\'') => {
                self.advance();
                diagnostics.report(token.line, token.col, Message::EmptyCharConst);
                return;
            }
            Some('\n') | Some('\r') => {
                diagnostics.report(token.line, token.col, Message::IllegalLineEnd);
                return;
            }
            Some('\\') => {
                self.advance();
                let escaped = match self.current() {
                    Some('n') => Some('\n'),
                    Some('r') => Some('\r'),
                    Some('\\') => Some('\\'),
                    Some('\'') => Some('\''),
                    Some(ch) => {
                        diagnostics.report(token.line, token.col, Message::UndefinedEscape(ch));
                        None
                    }
                    None => {
                        diagnostics.report(token.line, token.col, Message::EofInChar);
                        return;
                    }
                };
                self.advance();
                escaped
            }
            Some(ch) => {
                self.advance();
                Some(ch)
            }
        };

        if self.current() == Some('\'') {
            self.advance();
            token.value = value.map(|ch| ch as i32).unwrap_or(0);
        } else {
            diagnostics.report(token.line, token.col, Message::MissingQuote);
        }
    }

    /// Consumes `first` and, if the next character is `second`, that one too.
    fn one_or_two(&mut self, second: char, single: Kind, double: Kind) -> Kind {
        self.advance();
        if self.current() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn read_operator(&mut self, token: &mut Token, diagnostics: &mut Diagnostics) {
        let Some(ch) = self.current() else {
            return;
        };

        token.kind = match ch {
            '+' => {
                self.advance();
                match self.current() {
                    Some('+') => {
                        self.advance();
                        Kind::PPlus
                    }
                    Some('=') => {
                        self.advance();
                        Kind::PlusAs
                    }
                    _ => Kind::Plus,
                }
            }
            '-' => {
                self.advance();
                match self.current() {
                    Some('-') => {
                        self.advance();
                        Kind::MMinus
                    }
                    Some('=') => {
                        self.advance();
                        Kind::MinusAs
                    }
                    _ => Kind::Minus,
                }
            }
            '*' => {
                self.advance();
                match self.current() {
                    Some('*') => {
                        self.advance();
                        Kind::Exp
                    }
                    Some('=') => {
                        self.advance();
                        Kind::TimesAs
                    }
                    _ => Kind::Times,
                }
            }
            '/' => self.one_or_two('=', Kind::Slash, Kind::SlashAs),
            '%' => self.one_or_two('=', Kind::Rem, Kind::RemAs),
            '=' => self.one_or_two('=', Kind::Assign, Kind::Eql),
            '<' => self.one_or_two('=', Kind::Lss, Kind::Leq),
            '>' => self.one_or_two('=', Kind::Gtr, Kind::Geq),
            '!' => self.one_or_two('=', Kind::None, Kind::Neq),
            '&' => self.one_or_two('&', Kind::None, Kind::And),
            '|' => self.one_or_two('|', Kind::None, Kind::Or),
            ';' => self.single(Kind::Semicolon),
            ',' => self.single(Kind::Comma),
            '.' => self.single(Kind::Period),
            '(' => self.single(Kind::LPar),
            ')' => self.single(Kind::RPar),
            '[' => self.single(Kind::LBrack),
            ']' => self.single(Kind::RBrack),
            '{' => self.single(Kind::LBrace),
            '}' => self.single(Kind::RBrace),
            _ => self.single(Kind::None),
        };

        if token.kind == Kind::None {
            diagnostics.report(token.line, token.col, Message::InvalidChar(ch));
        }
    }

    fn single(&mut self, kind: Kind) -> Kind {
        self.advance();
        kind
    }

    /// Scans the whole input, including the final `Eof` token.
    pub fn tokenize(&mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token(diagnostics);
            let done = token.kind == Kind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}

impl TokenSource for Lexer {
    fn next_token(&mut self, diagnostics: &mut Diagnostics) -> Token {
        loop {
            self.skip_whitespace();
            if self.current() == Some('/') && self.peek() == Some('*') {
                self.skip_comment(diagnostics);
            } else {
                break;
            }
        }

        let mut token = Token::new(Kind::Eof, self.line, self.col);
        match self.current() {
            None => {}
            Some(ch) if ch.is_ascii_alphabetic() => self.read_name(&mut token),
            Some(ch) if ch.is_ascii_digit() => self.read_number(&mut token, diagnostics),
            Some('\'') => self.read_char_const(&mut token, diagnostics),
            Some(_) => self.read_operator(&mut token, diagnostics),
        }
        token
    }
}
