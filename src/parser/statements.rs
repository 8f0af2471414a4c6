use crate::bytecode::{Label, OpCode, Operand, OperandKind};
use crate::diagnostics::Message;
use crate::lexer::TokenSource;
use crate::parser::Parser;
use crate::symtab::TypeId;
use crate::token::Kind;

/// Tokens that may begin a statement.
fn starts_statement(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Ident
            | Kind::If
            | Kind::While
            | Kind::Break
            | Kind::Return
            | Kind::Read
            | Kind::Print
            | Kind::LBrace
            | Kind::Semicolon
    )
}

impl<S: TokenSource> Parser<S> {
    // Block = "{" { Statement } "}".
    //
    // `end_loop` is the exit label of the innermost enclosing loop, `ret`
    // the declared return type of the enclosing method.
    pub(super) fn block(&mut self, end_loop: Option<Label>, ret: TypeId) {
        self.check(Kind::LBrace);
        loop {
            let sym = self.sym();
            if starts_statement(sym) {
                self.statement(end_loop, ret);
            } else if matches!(sym, Kind::RBrace | Kind::Eof) {
                break;
            } else {
                self.recover_statement();
            }
        }
        self.check(Kind::RBrace);
    }

    fn statement(&mut self, end_loop: Option<Label>, ret: TypeId) {
        match self.sym() {
            Kind::Ident => self.designator_statement(),
            Kind::If => self.if_statement(end_loop, ret),
            Kind::While => self.while_statement(ret),
            Kind::Break => {
                self.scan();
                match end_loop {
                    Some(label) => self.code.jump(label),
                    None => self.error(Message::NoLoop),
                }
                self.check(Kind::Semicolon);
            }
            Kind::Return => self.return_statement(ret),
            Kind::Read => self.read_statement(),
            Kind::Print => self.print_statement(),
            Kind::LBrace => self.block(end_loop, ret),
            Kind::Semicolon => self.scan(),
            _ => self.error(Message::InvalidStat),
        }
    }

    // Designator ( Assignop Expr | ActPars | "++" | "--" ) ";".
    fn designator_statement(&mut self) {
        let x = self.designator();
        match self.sym() {
            Kind::Assign
            | Kind::PlusAs
            | Kind::MinusAs
            | Kind::TimesAs
            | Kind::SlashAs
            | Kind::RemAs => {
                if !x.can_be_assigned_to() {
                    self.error(Message::CannotAssignTo(x.kind_name().to_string()));
                }
                match self.assignop() {
                    None => {
                        let mut y = self.expr();
                        if !self.tab.assignable(y.ty, x.ty) {
                            self.error(Message::IncompTypes);
                        }
                        self.code.assign(&x, &mut y, &mut self.reporter);
                    }
                    Some(op) => {
                        self.code.compound_assignment_prepare(&x, &mut self.reporter);
                        let mut y = self.expr();
                        if x.ty != TypeId::INT || y.ty != TypeId::INT {
                            self.error(Message::NoIntOperand);
                        }
                        self.code.compound_assignment(&x, &mut y, op, &mut self.reporter);
                    }
                }
            }
            Kind::LPar => {
                self.act_pars(&x);
                self.code.method_call(&x, &self.tab);
                if matches!(x.kind, OperandKind::Method(_)) && x.ty != TypeId::NONE {
                    // discard the unused function result
                    self.code.put(OpCode::Pop);
                }
            }
            Kind::PPlus => self.increment(&x, 1),
            Kind::MMinus => self.increment(&x, -1),
            _ => self.error(Message::DesignFollow),
        }
        self.check(Kind::Semicolon);
    }

    fn increment(&mut self, x: &Operand, delta: i32) {
        if x.ty != TypeId::INT {
            self.error(Message::NoIntOperand);
        }
        if !x.can_be_assigned_to() {
            self.error(Message::CannotAssignTo(x.kind_name().to_string()));
        }
        self.scan();
        self.code.inc(x, delta, &mut self.reporter);
    }

    // "if" "(" Condition ")" Statement [ "else" Statement ].
    fn if_statement(&mut self, end_loop: Option<Label>, ret: TypeId) {
        self.scan();
        self.check(Kind::LPar);
        let cond = self.condition();
        let Some((op, t_label, f_label)) = cond.as_condition() else {
            return;
        };
        self.code.f_jump(op, f_label);
        self.code.here(t_label);
        self.check(Kind::RPar);
        self.statement(end_loop, ret);

        if self.sym() == Kind::Else {
            self.scan();
            let end = self.code.new_label();
            self.code.jump(end);
            self.code.here(f_label);
            self.statement(end_loop, ret);
            self.code.here(end);
        } else {
            self.code.here(f_label);
        }
    }

    // "while" "(" Condition ")" Statement.
    fn while_statement(&mut self, ret: TypeId) {
        self.scan();
        let top = self.code.new_label();
        self.code.here(top);
        self.check(Kind::LPar);
        let cond = self.condition();
        let Some((op, t_label, f_label)) = cond.as_condition() else {
            return;
        };
        self.code.f_jump(op, f_label);
        self.code.here(t_label);
        self.check(Kind::RPar);
        self.statement(Some(f_label), ret);
        self.code.jump(top);
        self.code.here(f_label);
    }

    // "return" [ Expr ] ";".
    fn return_statement(&mut self, ret: TypeId) {
        self.scan();
        if self.starts_expr() {
            if ret == TypeId::NONE {
                self.error(Message::ReturnVoid);
            }
            let mut value = self.expr();
            if !self.tab.assignable(value.ty, ret) {
                self.error(Message::NonMatchingReturnType);
            }
            self.code.load(&mut value, &mut self.reporter);
        } else if ret != TypeId::NONE {
            self.error(Message::ReturnNoVal);
        }
        self.code.put(OpCode::Exit);
        self.code.put(OpCode::Return);
        self.check(Kind::Semicolon);
    }

    // "read" "(" Designator ")" ";".
    fn read_statement(&mut self) {
        self.scan();
        self.check(Kind::LPar);
        let x = self.designator();
        if !x.can_be_assigned_to() {
            self.error(Message::CannotAssignTo(x.kind_name().to_string()));
        }
        match x.ty {
            TypeId::INT => self.code.put(OpCode::Read),
            TypeId::CHAR => self.code.put(OpCode::BRead),
            _ => self.error(Message::ReadValue),
        }
        let mut input = Operand::stack(x.ty);
        self.code.assign(&x, &mut input, &mut self.reporter);
        self.check(Kind::RPar);
        self.check(Kind::Semicolon);
    }

    // "print" "(" Expr [ "," number ] ")" ";".
    fn print_statement(&mut self) {
        self.scan();
        self.check(Kind::LPar);
        let mut x = self.expr();
        let op = match x.ty {
            TypeId::INT => OpCode::Print,
            TypeId::CHAR => OpCode::BPrint,
            _ => {
                self.error(Message::PrintValue);
                OpCode::Print
            }
        };
        self.code.load(&mut x, &mut self.reporter);

        let width = if self.sym() == Kind::Comma {
            self.scan();
            self.number(0)
        } else {
            0
        };
        self.code.load_const(width);
        self.code.put(op);

        self.check(Kind::RPar);
        self.check(Kind::Semicolon);
    }
}

#[cfg(test)]
mod tests {
    use crate::bytecode::OpCode::{self, *};
    use crate::compiler::CompilerOptions;
    use crate::diagnostics::Message;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(source: &str) -> (Vec<u8>, Vec<Message>) {
        let mut parser = Parser::new(Lexer::new(source), &CompilerOptions::default());
        parser.parse();
        let messages = parser.diagnostics().iter().map(|d| d.message.clone()).collect();
        (parser.code().bytes().to_vec(), messages)
    }

    /// Compiles `body` as the body of `void main()` with an int global `g`
    /// and int locals `a` and `b`, and returns the code between `enter` and
    /// the final `exit return`.
    fn body(stats: &str) -> Vec<u8> {
        let source = format!("program P int g; {{ void main() int a, b; {{ {} }} }}", stats);
        let (code, messages) = compile(&source);
        assert!(messages.is_empty(), "unexpected diagnostics: {:?}", messages);
        code[3..code.len() - 2].to_vec()
    }

    fn ops(ops: &[OpCode]) -> Vec<u8> {
        ops.iter().map(|op| op.code()).collect()
    }

    fn errors(stats: &str) -> Vec<Message> {
        let source = format!("program P int g; {{ void main() int a; {{ {} }} }}", stats);
        compile(&source).1
    }

    #[test]
    fn test_assignment_to_local() {
        assert_eq!(body("a = 7;"), vec![Const.code(), 0, 0, 0, 7, Store0.code()]);
    }

    #[test]
    fn test_compound_assignment_on_local() {
        assert_eq!(body("b *= a;"), ops(&[Load1, Load0, Mul, Store1]));
    }

    #[test]
    fn test_increment_and_decrement() {
        assert_eq!(body("a++; b--;"), vec![Inc.code(), 0, 1, Inc.code(), 1, 0xff]);
        assert_eq!(
            body("g++;"),
            vec![GetStatic.code(), 0, 0, Const1.code(), Add.code(), PutStatic.code(), 0, 0]
        );
    }

    #[test]
    fn test_if_without_else() {
        // load a, const 0, jle over the store, store
        assert_eq!(
            body("if (a > 0) b = 1;"),
            vec![Load0.code(), Const0.code(), Jle.code(), 0, 5, Const1.code(), Store1.code()]
        );
    }

    #[test]
    fn test_if_with_else() {
        assert_eq!(
            body("if (a == b) a = 1; else a = 2;"),
            vec![
                Load0.code(),
                Load1.code(),
                Jne.code(),
                0,
                8,
                Const1.code(),
                Store0.code(),
                Jmp.code(),
                0,
                5,
                Const2.code(),
                Store0.code(),
            ]
        );
    }

    #[test]
    fn test_while_loop_jumps_back() {
        assert_eq!(
            body("while (a < 3) a++;"),
            vec![
                Load0.code(),
                Const3.code(),
                Jge.code(),
                0,
                9,
                Inc.code(),
                0,
                1,
                Jmp.code(),
                0xff,
                0xf8,
            ]
        );
    }

    #[test]
    fn test_break_leaves_innermost_loop() {
        let code = body("while (a < 3) { break; }");
        // jge at 2 and the break at 5 both land after the back jump at 8
        assert_eq!(&code[2..5], &[Jge.code(), 0, 9]);
        assert_eq!(&code[5..8], &[Jmp.code(), 0, 6]);
        assert_eq!(&code[8..11], &[Jmp.code(), 0xff, 0xf8]);
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(errors("break;"), vec![Message::NoLoop]);
    }

    #[test]
    fn test_short_circuit_or() {
        // a == 1 || b == 2: the first comparison jumps straight into the body
        let code = body("if (a == 1 || b == 2) g = 0;");
        assert_eq!(&code[..5], &[Load0.code(), Const1.code(), Jeq.code(), 0, 8]);
        assert_eq!(&code[5..10], &[Load1.code(), Const2.code(), Jne.code(), 0, 7]);
        assert_eq!(&code[10..], &[Const0.code(), PutStatic.code(), 0, 0]);
    }

    #[test]
    fn test_short_circuit_and() {
        let code = body("if (a == 1 && b == 2) g = 0;");
        assert_eq!(&code[..5], &[Load0.code(), Const1.code(), Jne.code(), 0, 12]);
        assert_eq!(&code[5..10], &[Load1.code(), Const2.code(), Jne.code(), 0, 7]);
    }

    #[test]
    fn test_read_and_print() {
        assert_eq!(body("read(a);"), ops(&[Read, Store0]));
        assert_eq!(body("print(a, 4);"), ops(&[Load0, Const4, Print]));
        assert_eq!(body("print('x');"), vec![Const.code(), 0, 0, 0, 120, Const0.code(), BPrint.code()]);
    }

    #[test]
    fn test_call_statement_discards_result() {
        let (code, messages) = compile("program P { int f() { return 1; } void main() { f(); } }");
        assert!(messages.is_empty());
        // f occupies 0..8; main's call at 11 jumps back to 0
        assert_eq!(&code[11..15], &[Call.code(), 0xff, 0xf5, Pop.code()]);
    }

    #[test]
    fn test_return_checks() {
        let (_, messages) = compile("program P { void main() { return 1; } }");
        assert_eq!(messages, vec![Message::ReturnVoid]);
        let (_, messages) = compile("program P { int f() { return; } void main() { } }");
        assert_eq!(messages, vec![Message::ReturnNoVal]);
        let (_, messages) = compile("program P { int f() { return 'c'; } void main() { } }");
        assert_eq!(messages, vec![Message::NonMatchingReturnType]);
    }

    #[test]
    fn test_assignment_type_errors() {
        assert_eq!(errors("a = 'c';"), vec![Message::IncompTypes]);
        assert_eq!(errors("5 = a;"), vec![Message::InvalidStat]);
        assert_eq!(
            errors("len = a;"),
            vec![Message::CannotAssignTo("method".to_string())]
        );
    }

    #[test]
    fn test_invalid_statement_recovers() {
        assert_eq!(errors("+ + ; a = 1; g = 2;"), vec![Message::InvalidStat]);
        let source = "program P { void main() int a; { + ; a = 1; a = 1; a = 1; ) ; } }";
        assert_eq!(compile(source).1, vec![Message::InvalidStat, Message::InvalidStat]);
    }
}
