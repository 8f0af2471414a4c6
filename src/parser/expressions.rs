use crate::bytecode::{CompOp, Label, OpCode, Operand, OperandKind};
use crate::diagnostics::Message;
use crate::lexer::TokenSource;
use crate::parser::{MAX_EXPONENT, Parser};
use crate::symtab::{ObjKind, TypeId, TypeKind};
use crate::token::Kind;

impl<S: TokenSource> Parser<S> {
    /// Whether the lookahead can begin an expression.
    pub(super) fn starts_expr(&self) -> bool {
        matches!(
            self.sym(),
            Kind::Minus | Kind::Ident | Kind::Number | Kind::CharConst | Kind::New | Kind::LPar
        )
    }

    // Assignop = "=" | "+=" | "-=" | "*=" | "/=" | "%=".
    //
    // Returns the arithmetic instruction of a compound assignment, `None`
    // for a plain one.
    pub(super) fn assignop(&mut self) -> Option<OpCode> {
        let op = match self.sym() {
            Kind::Assign => None,
            Kind::PlusAs => Some(OpCode::Add),
            Kind::MinusAs => Some(OpCode::Sub),
            Kind::TimesAs => Some(OpCode::Mul),
            Kind::SlashAs => Some(OpCode::Div),
            Kind::RemAs => Some(OpCode::Rem),
            _ => {
                self.error(Message::AssignOp);
                return None;
            }
        };
        self.scan();
        op
    }

    // ActPars = "(" [ Expr { "," Expr } ] ")".
    pub(super) fn act_pars(&mut self, m: &Operand) {
        self.check(Kind::LPar);
        let meth = match m.kind {
            OperandKind::Method(id) => id,
            _ => {
                self.error(Message::NoMeth);
                self.tab.no_obj()
            }
        };
        let formals: Vec<TypeId> = self
            .tab
            .obj(meth)
            .params()
            .iter()
            .map(|p| self.tab.obj(*p).ty)
            .collect();

        let mut n_actual = 0;
        if self.starts_expr() {
            loop {
                let mut ap = self.expr();
                self.code.load(&mut ap, &mut self.reporter);
                match formals.get(n_actual) {
                    Some(&formal) => {
                        if !self.tab.assignable(ap.ty, formal) {
                            self.error(Message::ParamType);
                        }
                    }
                    None => self.error(Message::MoreActualParams),
                }
                n_actual += 1;
                if self.sym() != Kind::Comma {
                    break;
                }
                self.scan();
            }
        }
        if n_actual < formals.len() {
            self.error(Message::LessActualParams);
        }
        self.check(Kind::RPar);
    }

    // Condition = CondTerm { "||" CondTerm }.
    //
    // Each `||` jumps to the true label when its left side holds; the false
    // label of the left side is placed just before the right side.
    pub(super) fn condition(&mut self) -> Operand {
        let t_label = self.code.new_label();
        let mut f_label = self.code.new_label();
        let mut op = self.cond_term(f_label);
        while self.sym() == Kind::Or {
            self.code.t_jump(op, t_label);
            self.scan();
            self.code.here(f_label);
            f_label = self.code.new_label();
            op = self.cond_term(f_label);
        }
        Operand::condition(op, t_label, f_label)
    }

    // CondTerm = CondFact { "&&" CondFact }.
    fn cond_term(&mut self, f_label: Label) -> CompOp {
        let mut op = self.cond_fact();
        while self.sym() == Kind::And {
            self.code.f_jump(op, f_label);
            self.scan();
            op = self.cond_fact();
        }
        op
    }

    // CondFact = Expr Relop Expr.
    fn cond_fact(&mut self) -> CompOp {
        let mut left = self.expr();
        self.code.load(&mut left, &mut self.reporter);
        let op = self.relop();
        let mut right = self.expr();
        self.code.load(&mut right, &mut self.reporter);

        if !self.tab.compatible(left.ty, right.ty) {
            self.error(Message::IncompTypes);
        }
        let is_ref = self.tab.is_ref_type(left.ty) || self.tab.is_ref_type(right.ty);
        if is_ref && !matches!(op, CompOp::Eq | CompOp::Ne) {
            self.error(Message::EqCheck);
        }
        op
    }

    // Relop = "==" | "!=" | ">" | ">=" | "<" | "<=".
    fn relop(&mut self) -> CompOp {
        let op = match self.sym() {
            Kind::Eql => CompOp::Eq,
            Kind::Neq => CompOp::Ne,
            Kind::Gtr => CompOp::Gt,
            Kind::Geq => CompOp::Ge,
            Kind::Lss => CompOp::Lt,
            Kind::Leq => CompOp::Le,
            _ => {
                self.error(Message::RelOp);
                return CompOp::Eq;
            }
        };
        self.scan();
        op
    }

    // Expr = [ "-" ] Term { Addop Term }.
    pub(super) fn expr(&mut self) -> Operand {
        let negate = self.sym() == Kind::Minus;
        if negate {
            self.scan();
        }
        let mut x = self.term();
        if negate {
            if x.ty != TypeId::INT {
                self.error(Message::NoIntOperand);
            }
            match x.kind {
                OperandKind::Constant(val) => x.kind = OperandKind::Constant(val.wrapping_neg()),
                _ => {
                    self.code.load(&mut x, &mut self.reporter);
                    self.code.put(OpCode::Neg);
                }
            }
        }

        while matches!(self.sym(), Kind::Plus | Kind::Minus) {
            let op = self.addop();
            self.code.load(&mut x, &mut self.reporter);
            let mut y = self.term();
            self.code.load(&mut y, &mut self.reporter);
            if x.ty != TypeId::INT || y.ty != TypeId::INT {
                self.error(Message::NoIntOperand);
            }
            self.code.put(op);
        }
        x
    }

    // Term = Factor { Mulop Factor | "**" number }.
    fn term(&mut self) -> Operand {
        let mut x = self.factor();
        loop {
            match self.sym() {
                Kind::Times | Kind::Slash | Kind::Rem => {
                    let op = self.mulop();
                    self.code.load(&mut x, &mut self.reporter);
                    let mut y = self.factor();
                    self.code.load(&mut y, &mut self.reporter);
                    if x.ty != TypeId::INT || y.ty != TypeId::INT {
                        self.error(Message::NoIntOperand);
                    }
                    self.code.put(op);
                }
                Kind::Exp => {
                    self.scan();
                    let mut k = self.number(1);
                    if x.ty != TypeId::INT {
                        self.error(Message::NoIntOperand);
                    }
                    if k > MAX_EXPONENT {
                        self.error(Message::ExponentTooLarge);
                        k = 1;
                    }
                    self.code.load(&mut x, &mut self.reporter);
                    self.power(k);
                }
                _ => break,
            }
        }
        x
    }

    /// Raises the value on top of the stack to the constant power `k`.
    fn power(&mut self, k: i32) {
        if k == 0 {
            self.code.put(OpCode::Pop);
            self.code.put(OpCode::Const1);
            return;
        }
        for _ in 1..k {
            self.code.put(OpCode::Dup);
        }
        for _ in 1..k {
            self.code.put(OpCode::Mul);
        }
    }

    // Factor = Designator [ ActPars ] | number | charConst
    //        | "new" ident [ "[" Expr "]" ] | "(" Expr ")".
    fn factor(&mut self) -> Operand {
        match self.sym() {
            Kind::Ident => {
                let mut x = self.designator();
                if self.sym() == Kind::LPar {
                    self.act_pars(&x);
                    if matches!(x.kind, OperandKind::Method(_)) && x.ty == TypeId::NONE {
                        self.error(Message::InvalidCall);
                    }
                    self.code.method_call(&x, &self.tab);
                    x.kind = OperandKind::Stack;
                }
                x
            }
            Kind::Number => {
                self.scan();
                Operand::constant(self.t.value, TypeId::INT)
            }
            Kind::CharConst => {
                self.scan();
                Operand::constant(self.t.value, TypeId::CHAR)
            }
            Kind::New => {
                self.scan();
                let name = self.ident();
                let obj = self.tab.find(&name, &mut self.reporter);
                if self.tab.obj(obj).kind != ObjKind::Type {
                    self.error(Message::NoType);
                }
                let ty = self.tab.obj(obj).ty;

                if self.sym() == Kind::LBrack {
                    self.scan();
                    let mut len = self.expr();
                    if len.ty != TypeId::INT {
                        self.error(Message::ArraySize);
                    }
                    self.code.load(&mut len, &mut self.reporter);
                    self.code.put(OpCode::NewArray);
                    self.code.put_byte(if ty == TypeId::CHAR { 0 } else { 1 });
                    self.check(Kind::RBrack);
                    Operand::stack(self.tab.new_array(ty))
                } else {
                    if self.tab.kind(ty) != TypeKind::Class {
                        self.error(Message::NoClassType);
                    }
                    self.code.put(OpCode::New);
                    self.code.put2(self.tab.ty(ty).n_fields() as i32);
                    Operand::stack(ty)
                }
            }
            Kind::LPar => {
                self.scan();
                let x = self.expr();
                self.check(Kind::RPar);
                x
            }
            _ => {
                self.error(Message::InvalidFact);
                Operand::stack(TypeId::NONE)
            }
        }
    }

    // Designator = ident { "." ident | "[" Expr "]" }.
    pub(super) fn designator(&mut self) -> Operand {
        let name = self.ident();
        let obj = self.tab.find(&name, &mut self.reporter);
        let mut x = Operand::from_obj(obj, &self.tab, &mut self.reporter);
        loop {
            match self.sym() {
                Kind::Period => {
                    if self.tab.kind(x.ty) != TypeKind::Class {
                        self.error(Message::NoClass);
                    }
                    self.scan();
                    self.code.load(&mut x, &mut self.reporter);
                    let field_name = self.ident();
                    let field = self.tab.find_field(&field_name, x.ty, &mut self.reporter);
                    let field = self.tab.obj(field);
                    x = Operand {
                        kind: OperandKind::Field(field.adr),
                        ty: field.ty,
                    };
                }
                Kind::LBrack => {
                    self.scan();
                    self.code.load(&mut x, &mut self.reporter);
                    if self.tab.kind(x.ty) != TypeKind::Array {
                        self.error(Message::NoArray);
                    }
                    let mut index = self.expr();
                    if index.ty != TypeId::INT {
                        self.error(Message::ArrayIndex);
                    }
                    self.code.load(&mut index, &mut self.reporter);
                    x = Operand {
                        kind: OperandKind::Element,
                        ty: self.tab.elem_type(x.ty),
                    };
                    self.check(Kind::RBrack);
                }
                _ => break,
            }
        }
        x
    }

    // Addop = "+" | "-".
    fn addop(&mut self) -> OpCode {
        let op = match self.sym() {
            Kind::Plus => OpCode::Add,
            Kind::Minus => OpCode::Sub,
            _ => {
                self.error(Message::AddOp);
                return OpCode::Add;
            }
        };
        self.scan();
        op
    }

    // Mulop = "*" | "/" | "%".
    fn mulop(&mut self) -> OpCode {
        let op = match self.sym() {
            Kind::Times => OpCode::Mul,
            Kind::Slash => OpCode::Div,
            Kind::Rem => OpCode::Rem,
            _ => {
                self.error(Message::MulOp);
                return OpCode::Mul;
            }
        };
        self.scan();
        op
    }
}
