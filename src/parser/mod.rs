//! Single-pass recursive-descent parser for MicroJava.
//!
//! There is no syntax tree: every production declares names in the symbol
//! table, type-checks its operands and emits code as soon as it is
//! recognised. Errors are collected through a [`Reporter`] and the parser
//! always runs to the end of the input.

mod expressions;
mod statements;

use tracing::debug;

use crate::bytecode::{Code, DebugInfo, MethodInfo, OpCode};
use crate::compiler::CompilerOptions;
use crate::diagnostics::{Diagnostics, Message, Reporter};
use crate::lexer::TokenSource;
use crate::symtab::{ObjKind, Tab, TypeId, TypeKind};
use crate::token::{Kind, Token};

const MAX_GLOBALS: usize = 32767;
const MAX_FIELDS: usize = 32767;
const MAX_LOCALS: usize = 127;
const MAX_EXPONENT: i32 = 255;

pub struct Parser<S: TokenSource> {
    scanner: S,
    /// Last recognised token.
    t: Token,
    /// Lookahead token, not yet recognised.
    la: Token,

    tab: Tab,
    code: Code,
    reporter: Reporter,
    debug_info: DebugInfo,
}

impl<S: TokenSource> Parser<S> {
    pub fn new(scanner: S, options: &CompilerOptions) -> Self {
        // Pseudo token so that an error on the very first symbol has a position.
        let start = Token::new(Kind::None, 1, 1);
        Parser {
            scanner,
            t: start.clone(),
            la: start,
            tab: Tab::new(),
            code: Code::new(),
            reporter: Reporter::new(options.min_error_distance),
            debug_info: DebugInfo::default(),
        }
    }

    /// Parses and compiles the whole translation unit.
    pub fn parse(&mut self) {
        self.scan();
        self.program();
        self.check(Kind::Eof);
    }

    pub fn tab(&self) -> &Tab {
        &self.tab
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.reporter.diagnostics()
    }

    pub fn finish(self) -> (Code, Diagnostics, DebugInfo) {
        (self.code, self.reporter.into_diagnostics(), self.debug_info)
    }

    // ----- token handling

    fn sym(&self) -> Kind {
        self.la.kind
    }

    fn scan(&mut self) {
        let next = self.scanner.next_token(self.reporter.diagnostics_mut());
        self.t = std::mem::replace(&mut self.la, next);
        self.reporter.advance(self.la.line, self.la.col);
    }

    fn check(&mut self, expected: Kind) {
        if self.sym() == expected {
            self.scan();
        } else {
            self.error(Message::TokenExpected(expected));
        }
    }

    /// Recognises an identifier and returns its spelling (empty if missing).
    fn ident(&mut self) -> String {
        if self.sym() == Kind::Ident {
            self.scan();
            self.t.name().to_string()
        } else {
            self.error(Message::TokenExpected(Kind::Ident));
            String::new()
        }
    }

    /// Recognises a number literal and returns its value (`fallback` if missing).
    fn number(&mut self, fallback: i32) -> i32 {
        if self.sym() == Kind::Number {
            self.scan();
            self.t.value
        } else {
            self.error(Message::TokenExpected(Kind::Number));
            fallback
        }
    }

    fn error(&mut self, message: Message) {
        self.reporter.error(message);
    }

    // ----- declarations

    // Program = "program" ident { ConstDecl | VarDecl | ClassDecl } "{" { MethodDecl } "}".
    fn program(&mut self) {
        self.check(Kind::Program);
        let name = self.ident();
        let prog = self.tab.insert(ObjKind::Program, &name, TypeId::NONE, &mut self.reporter);
        self.debug_info.program = name;
        self.tab.open_scope();

        loop {
            match self.sym() {
                Kind::Final => self.const_decl(),
                Kind::Ident => self.var_decl(),
                Kind::Class => self.class_decl(),
                Kind::LBrace | Kind::Eof => break,
                _ => self.recover_decl(),
            }
        }

        let n_globals = self.tab.current_var_count();
        if n_globals > MAX_GLOBALS {
            self.error(Message::TooManyGlobals);
        }
        self.code.data_size = n_globals;
        self.debug_info.globals = self
            .tab
            .current_locals()
            .into_iter()
            .map(|id| self.tab.obj(id))
            .filter(|o| o.kind == ObjKind::Variable)
            .map(|o| o.name.clone())
            .collect();
        debug!(globals = n_globals, "global declarations done");

        self.check(Kind::LBrace);
        loop {
            match self.sym() {
                Kind::Ident | Kind::Void => self.method_decl(),
                Kind::RBrace | Kind::Eof => break,
                _ => self.recover_method(),
            }
        }
        self.check(Kind::RBrace);

        let globals = self.tab.current_locals();
        self.tab.obj_mut(prog).locals = globals;
        self.tab.close_scope();

        if self.code.main_pc.is_none() {
            self.error(Message::MethNotFound("main".to_string()));
        }
    }

    // ConstDecl = "final" Type ident "=" ( number | charConst ) ";".
    fn const_decl(&mut self) {
        self.check(Kind::Final);
        let ty = self.ty();
        let name = self.ident();
        let con = self.tab.insert(ObjKind::Constant, &name, ty, &mut self.reporter);
        self.check(Kind::Assign);

        let expected = match self.sym() {
            Kind::Number => Some(TypeKind::Int),
            Kind::CharConst => Some(TypeKind::Char),
            _ => None,
        };
        match expected {
            Some(kind) => {
                if self.tab.kind(ty) != kind {
                    self.error(Message::ConstType);
                }
                self.scan();
                self.tab.obj_mut(con).val = self.t.value;
            }
            None => self.error(Message::ConstDecl),
        }
        self.check(Kind::Semicolon);
    }

    // VarDecl = Type ident { "," ident } ";".
    fn var_decl(&mut self) {
        let ty = self.ty();
        loop {
            let name = self.ident();
            self.tab.insert(ObjKind::Variable, &name, ty, &mut self.reporter);
            if self.sym() != Kind::Comma {
                break;
            }
            self.scan();
        }
        self.check(Kind::Semicolon);
    }

    // ClassDecl = "class" ident "{" { VarDecl } "}".
    fn class_decl(&mut self) {
        self.check(Kind::Class);
        let name = self.ident();
        let class = self.tab.new_class();
        self.tab.insert(ObjKind::Type, &name, class, &mut self.reporter);
        self.check(Kind::LBrace);

        self.tab.open_scope();
        while self.sym() == Kind::Ident {
            self.var_decl();
        }
        if self.tab.current_var_count() > MAX_FIELDS {
            self.error(Message::TooManyFields);
        }
        let fields = self.tab.current_locals();
        self.tab.close_scope();
        self.tab.set_fields(class, fields);

        self.check(Kind::RBrace);
    }

    // MethodDecl = ( Type | "void" ) ident "(" [ FormPars ] ")" { VarDecl } Block.
    fn method_decl(&mut self) {
        let mut ty = TypeId::NONE;
        match self.sym() {
            Kind::Ident => {
                ty = self.ty();
                if self.tab.is_ref_type(ty) {
                    self.error(Message::InvalidMethReturnType);
                }
            }
            Kind::Void => self.scan(),
            _ => self.error(Message::InvalidMethDecl),
        }

        let name = self.ident();
        let meth = self.tab.insert(ObjKind::Method, &name, ty, &mut self.reporter);
        let entry = self.code.pc();
        self.tab.obj_mut(meth).adr = entry as i32;
        self.check(Kind::LPar);

        self.tab.open_scope();
        if self.sym() == Kind::Ident {
            self.form_pars();
        }
        let n_pars = self.tab.current_var_count();
        self.tab.obj_mut(meth).n_pars = n_pars;
        self.check(Kind::RPar);

        if name == "main" {
            self.code.main_pc = Some(entry);
            if ty != TypeId::NONE {
                self.error(Message::MainNotVoid);
            }
            if n_pars != 0 {
                self.error(Message::MainWithParams);
            }
        }

        while self.sym() == Kind::Ident {
            self.var_decl();
        }
        let n_vars = self.tab.current_var_count();
        if n_vars > MAX_LOCALS {
            self.error(Message::TooManyLocals);
        }

        self.code.put(OpCode::Enter);
        self.code.put_byte(n_pars as i32);
        self.code.put_byte(n_vars as i32);
        self.tab.obj_mut(meth).locals = self.tab.current_locals();
        debug!(method = %name, entry, n_pars, n_vars, "method");
        self.debug_info.methods.push(MethodInfo {
            name,
            entry: entry as u32,
            n_pars: n_pars as u32,
            n_locals: n_vars as u32,
        });

        self.block(None, ty);
        self.tab.close_scope();
        if self.code.take_far_jumps() > 0 {
            self.error(Message::MethodTooLarge);
        }

        if ty == TypeId::NONE {
            self.code.put(OpCode::Exit);
            self.code.put(OpCode::Return);
        } else {
            // falling off the end of a function is a runtime error
            self.code.put(OpCode::Trap);
            self.code.put_byte(1);
        }
    }

    // FormPars = Type ident { "," Type ident }.
    fn form_pars(&mut self) {
        loop {
            let ty = self.ty();
            let name = self.ident();
            self.tab.insert(ObjKind::Variable, &name, ty, &mut self.reporter);
            if self.sym() != Kind::Comma {
                break;
            }
            self.scan();
        }
    }

    // Type = ident [ "[" "]" ].
    fn ty(&mut self) -> TypeId {
        let name = self.ident();
        let obj = self.tab.find(&name, &mut self.reporter);
        if self.tab.obj(obj).kind != ObjKind::Type {
            self.error(Message::NoType);
        }
        let mut ty = self.tab.obj(obj).ty;
        if self.sym() == Kind::LBrack {
            self.scan();
            self.check(Kind::RBrack);
            ty = self.tab.new_array(ty);
        }
        ty
    }

    // ----- error recovery

    fn recover_decl(&mut self) {
        self.error(Message::InvalidDecl);
        loop {
            self.scan();
            if matches!(
                self.sym(),
                Kind::Final | Kind::Ident | Kind::Class | Kind::RBrace | Kind::Eof
            ) {
                break;
            }
        }
        self.reporter.resync();
    }

    fn recover_method(&mut self) {
        self.error(Message::InvalidMethDecl);
        loop {
            self.scan();
            if matches!(self.sym(), Kind::Ident | Kind::Void | Kind::Eof) {
                break;
            }
        }
        self.reporter.resync();
    }

    fn recover_statement(&mut self) {
        self.error(Message::InvalidStat);
        loop {
            self.scan();
            if matches!(
                self.sym(),
                Kind::If
                    | Kind::While
                    | Kind::Break
                    | Kind::Return
                    | Kind::Read
                    | Kind::Print
                    | Kind::Semicolon
                    | Kind::Eof
            ) {
                break;
            }
        }
        self.reporter.resync();
    }
}
