use std::io::{self, Write};

use owo_colors::{OwoColorize, Style};

use crate::token::{Kind, Token};

/// Prints a token stream one token per line, for `mjc --tokens`.
pub struct TokenDumper {
    pub color: bool,
    pub show_values: bool, // if false, only kind and position are printed
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self {
            color: true,
            show_values: true,
        }
    }
}

impl TokenDumper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn terse(mut self) -> Self {
        self.show_values = false;
        self
    }

    pub fn dump(&self, tokens: &[Token], out: &mut impl Write) -> io::Result<()> {
        for token in tokens {
            writeln!(out, "{}", self.format(token))?;
        }
        Ok(())
    }

    pub fn format(&self, token: &Token) -> String {
        let category = format!("{:<8}", Self::category(token.kind));
        let text = if self.show_values {
            Self::value(token)
        } else {
            String::new()
        };
        let line = format!("{} {}", category, text);
        let line = line.trim_end();

        if self.color {
            format!(
                "[{:02}:{:02}] {}",
                token.line,
                token.col,
                line.style(Self::style(token.kind))
            )
        } else {
            format!("[{:02}:{:02}] {}", token.line, token.col, line)
        }
    }

    fn value(token: &Token) -> String {
        match token.kind {
            Kind::Ident => token.name().to_string(),
            Kind::Number => token.value.to_string(),
            Kind::CharConst => match char::from_u32(token.value as u32) {
                Some(ch) => format!("{:?}", ch),
                None => token.value.to_string(),
            },
            Kind::None => "?".to_string(),
            kind => kind.label().to_string(),
        }
    }

    fn category(kind: Kind) -> &'static str {
        use Kind::*;
        match kind {
            None => "INVALID",
            Eof => "EOF",
            Ident => "IDENT",
            Number => "NUMBER",
            CharConst => "CHAR",

            Eql | Neq | Lss | Leq | Gtr | Geq | And | Or => "CMP",
            Assign | PlusAs | MinusAs | TimesAs | SlashAs | RemAs => "ASSIGN",
            Plus | Minus | Times | Slash | Rem | Exp | PPlus | MMinus => "OP",

            k if k.is_keyword() => "KEYWORD",
            _ => "PUNCT",
        }
    }

    fn style(kind: Kind) -> Style {
        use Kind::*;
        match kind {
            None => Style::new().red().bold(),
            Eof => Style::new().dimmed(),
            Ident => Style::new().yellow(),
            Number | CharConst => Style::new().cyan(),
            k if k.is_keyword() => Style::new().green(),
            Semicolon | Comma | Period | LPar | RPar | LBrack | RBrack | LBrace | RBrace => {
                Style::new()
            }
            _ => Style::new().magenta(),
        }
    }
}
