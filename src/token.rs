use std::fmt;

/// Terminal symbols of MicroJava.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    // Produced for characters the scanner cannot classify
    None,

    // Literals and names
    Ident,
    Number,
    CharConst,

    // Arithmetic
    Plus,
    Minus,
    Times,
    Slash,
    Rem,
    Exp,

    // Comparison
    Eql,
    Neq,
    Lss,
    Leq,
    Gtr,
    Geq,

    // Logic
    And,
    Or,

    // Assignment
    Assign,
    PlusAs,
    MinusAs,
    TimesAs,
    SlashAs,
    RemAs,
    PPlus,
    MMinus,

    // Delimiters
    Semicolon,
    Comma,
    Period,
    LPar,
    RPar,
    LBrack,
    RBrack,
    LBrace,
    RBrace,

    // Keywords
    Break,
    Class,
    Else,
    Final,
    If,
    New,
    Print,
    Program,
    Read,
    Return,
    Void,
    While,

    Eof,
}

impl Kind {
    /// Maps an identifier spelling to its keyword, if it is one.
    pub fn keyword(name: &str) -> Option<Kind> {
        Some(match name {
            "break" => Kind::Break,
            "class" => Kind::Class,
            "else" => Kind::Else,
            "final" => Kind::Final,
            "if" => Kind::If,
            "new" => Kind::New,
            "print" => Kind::Print,
            "program" => Kind::Program,
            "read" => Kind::Read,
            "return" => Kind::Return,
            "void" => Kind::Void,
            "while" => Kind::While,
            _ => return None,
        })
    }

    /// Human-readable spelling used in "expected" diagnostics.
    pub fn label(self) -> &'static str {
        use Kind::*;
        match self {
            None => "none",
            Ident => "identifier",
            Number => "number",
            CharConst => "character constant",
            Plus => "+",
            Minus => "-",
            Times => "*",
            Slash => "/",
            Rem => "%",
            Exp => "**",
            Eql => "==",
            Neq => "!=",
            Lss => "<",
            Leq => "<=",
            Gtr => ">",
            Geq => ">=",
            And => "&&",
            Or => "||",
            Assign => "=",
            PlusAs => "+=",
            MinusAs => "-=",
            TimesAs => "*=",
            SlashAs => "/=",
            RemAs => "%=",
            PPlus => "++",
            MMinus => "--",
            Semicolon => ";",
            Comma => ",",
            Period => ".",
            LPar => "(",
            RPar => ")",
            LBrack => "[",
            RBrack => "]",
            LBrace => "{",
            RBrace => "}",
            Break => "break",
            Class => "class",
            Else => "else",
            Final => "final",
            If => "if",
            New => "new",
            Print => "print",
            Program => "program",
            Read => "read",
            Return => "return",
            Void => "void",
            While => "while",
            Eof => "end of file",
        }
    }

    /// Returns true if this token kind is a reserved word.
    pub fn is_keyword(self) -> bool {
        use Kind::*;
        matches!(
            self,
            Break | Class | Else | Final | If | New | Print | Program | Read | Return | Void | While
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Ident | Kind::Number | Kind::CharConst | Kind::Eof | Kind::None => {
                write!(f, "{}", self.label())
            }
            _ => write!(f, "\"{}\"", self.label()),
        }
    }
}

/// A scanned token with its source position.
///
/// `text` is only set for identifiers; `value` holds the numeric value of
/// numbers and character constants and is 0 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: Kind,
    pub line: usize,
    pub col: usize,
    pub text: Option<String>,
    pub value: i32,
}

impl Token {
    pub fn new(kind: Kind, line: usize, col: usize) -> Self {
        Token {
            kind,
            line,
            col,
            text: None,
            value: 0,
        }
    }

    /// Identifier spelling, or an empty string for any other token.
    pub fn name(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}
