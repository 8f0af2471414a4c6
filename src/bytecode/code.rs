use tracing::trace;

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::{CompOp, Image, OpCode, Operand, OperandKind};
use crate::diagnostics::{Message, Reporter};
use crate::symtab::{Tab, TypeId};

/// A jump target whose address may not be known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Default)]
struct LabelSlot {
    adr: Option<usize>,
    /// Positions of 2-byte jump operands waiting for `adr`.
    fixups: Vec<usize>,
}

/// Code buffer and instruction emitter.
pub struct Code {
    buf: Vec<u8>,
    /// Entry address of `main`, set by the parser.
    pub main_pc: Option<usize>,
    /// Number of global variables (words), set by the parser.
    pub data_size: usize,
    labels: Vec<LabelSlot>,
    /// Jump and call offsets emitted since the last check that do not fit
    /// into their 2-byte operand.
    far_jumps: usize,
}

impl Code {
    /// Creates an empty buffer with no entry point and no globals.
    pub fn new() -> Self {
        Code {
            buf: Vec::with_capacity(128),
            main_pc: None,
            data_size: 0,
            labels: Vec::new(),
            far_jumps: 0,
        }
    }

    /// Address of the next free byte.
    pub fn pc(&self) -> usize {
        self.buf.len()
    }

    /// Code emitted so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    // ----- raw emission

    /// Emits an opcode byte.
    pub fn put(&mut self, op: OpCode) {
        self.buf.push(op.code());
    }

    /// Emits the low byte of `x`.
    pub fn put_byte(&mut self, x: i32) {
        self.buf.push(x as u8);
    }

    /// Emits the low 16 bits of `x`, big-endian.
    pub fn put2(&mut self, x: i32) {
        self.buf.extend_from_slice(&(x as i16).to_be_bytes());
    }

    /// Emits `x` as a big-endian word.
    pub fn put4(&mut self, x: i32) {
        self.buf.extend_from_slice(&x.to_be_bytes());
    }

    /// Overwrites two already emitted bytes at `pos`.
    fn put2_at(&mut self, pos: usize, x: i32) {
        let [hi, lo] = (x as i16).to_be_bytes();
        self.buf[pos] = hi;
        self.buf[pos + 1] = lo;
    }

    /// Emits a relative jump or call offset, counting it if it overflows.
    fn put_offset(&mut self, offset: i32) {
        self.check_offset(offset);
        self.put2(offset);
    }

    fn check_offset(&mut self, offset: i32) {
        if i16::try_from(offset).is_err() {
            self.far_jumps += 1;
        }
    }

    /// Returns the number of out-of-range offsets emitted since the last
    /// call and resets the count.
    pub fn take_far_jumps(&mut self) -> usize {
        std::mem::take(&mut self.far_jumps)
    }

    // ----- loads and stores

    /// Pushes the value of `x`; afterwards `x` lives on the stack.
    pub fn load(&mut self, x: &mut Operand, reporter: &mut Reporter) {
        match x.kind {
            OperandKind::Constant(val) => self.load_const(val),
            OperandKind::Local(adr) => match adr {
                0 => self.put(OpCode::Load0),
                1 => self.put(OpCode::Load1),
                2 => self.put(OpCode::Load2),
                3 => self.put(OpCode::Load3),
                _ => {
                    self.put(OpCode::Load);
                    self.put_byte(adr);
                }
            },
            OperandKind::Static(adr) => {
                self.put(OpCode::GetStatic);
                self.put2(adr);
            }
            OperandKind::Stack => {}
            OperandKind::Field(adr) => {
                self.put(OpCode::GetField);
                self.put2(adr);
            }
            OperandKind::Element => {
                if x.ty == TypeId::CHAR {
                    self.put(OpCode::BALoad);
                } else {
                    self.put(OpCode::ALoad);
                }
            }
            OperandKind::Method(_) | OperandKind::Condition { .. } => {
                reporter.error(Message::NoVal);
            }
        }
        x.kind = OperandKind::Stack;
    }

    /// Pushes `n`, using the one-byte `const_n` forms where possible.
    pub fn load_const(&mut self, n: i32) {
        match n {
            -1 => self.put(OpCode::ConstM1),
            0 => self.put(OpCode::Const0),
            1 => self.put(OpCode::Const1),
            2 => self.put(OpCode::Const2),
            3 => self.put(OpCode::Const3),
            4 => self.put(OpCode::Const4),
            5 => self.put(OpCode::Const5),
            _ => {
                self.put(OpCode::Const);
                self.put4(n);
            }
        }
    }

    /// Stores the value on top of the stack into `x`.
    fn store(&mut self, x: &Operand, reporter: &mut Reporter) {
        match x.kind {
            OperandKind::Local(adr) => match adr {
                0 => self.put(OpCode::Store0),
                1 => self.put(OpCode::Store1),
                2 => self.put(OpCode::Store2),
                3 => self.put(OpCode::Store3),
                _ => {
                    self.put(OpCode::Store);
                    self.put_byte(adr);
                }
            },
            OperandKind::Static(adr) => {
                self.put(OpCode::PutStatic);
                self.put2(adr);
            }
            OperandKind::Field(adr) => {
                self.put(OpCode::PutField);
                self.put2(adr);
            }
            OperandKind::Element => {
                if x.ty == TypeId::CHAR {
                    self.put(OpCode::BAStore);
                } else {
                    self.put(OpCode::AStore);
                }
            }
            _ => reporter.error(Message::NoVal),
        }
    }

    /// `x = y`
    pub fn assign(&mut self, x: &Operand, y: &mut Operand, reporter: &mut Reporter) {
        self.load(y, reporter);
        self.store(x, reporter);
    }

    /// Loads the current value of `x` for a read-modify-write, duplicating
    /// the object reference (fields) or array reference and index
    /// (elements) first so the final store can reuse them. `x` itself
    /// keeps its kind.
    pub fn compound_assignment_prepare(&mut self, x: &Operand, reporter: &mut Reporter) {
        match x.kind {
            OperandKind::Field(_) => self.put(OpCode::Dup),
            OperandKind::Element => self.put(OpCode::Dup2),
            _ => {}
        }
        let mut current = *x;
        self.load(&mut current, reporter);
    }

    /// Finishes `x op= y` after [`Code::compound_assignment_prepare`].
    pub fn compound_assignment(
        &mut self,
        x: &Operand,
        y: &mut Operand,
        op: OpCode,
        reporter: &mut Reporter,
    ) {
        self.load(y, reporter);
        self.put(op);
        self.store(x, reporter);
    }

    /// `x += n`
    pub fn inc(&mut self, x: &Operand, n: i32, reporter: &mut Reporter) {
        match x.kind {
            OperandKind::Local(adr) if (-128..=127).contains(&n) => {
                self.put(OpCode::Inc);
                self.put_byte(adr);
                self.put_byte(n);
            }
            _ => {
                self.compound_assignment_prepare(x, reporter);
                let mut delta = Operand::constant(n, TypeId::INT);
                self.compound_assignment(x, &mut delta, OpCode::Add, reporter);
            }
        }
    }

    /// Emits the call of method operand `x`; arguments are already pushed.
    pub fn method_call(&mut self, x: &Operand, tab: &Tab) {
        let OperandKind::Method(meth) = x.kind else {
            return;
        };
        if meth == tab.ord_obj() || meth == tab.chr_obj() {
            // pure type conversions
        } else if meth == tab.len_obj() {
            self.put(OpCode::ArrayLength);
        } else {
            let at = self.pc() as i32;
            self.put(OpCode::Call);
            self.put_offset(tab.obj(meth).adr - at);
        }
    }

    // ----- labels and jumps

    /// A new, unplaced label.
    pub fn new_label(&mut self) -> Label {
        self.labels.push(LabelSlot::default());
        Label(self.labels.len() - 1)
    }

    /// Places `label` at the current pc and patches every pending jump.
    ///
    /// # Panics
    /// If the label was already placed.
    pub fn here(&mut self, label: Label) {
        let adr = self.pc();
        let slot = &mut self.labels[label.0];
        assert!(slot.adr.is_none(), "label {} placed twice", label.0);
        slot.adr = Some(adr);
        let fixups = std::mem::take(&mut slot.fixups);

        trace!(label = label.0, adr, patched = fixups.len(), "label placed");
        for pos in fixups {
            let offset = adr as i32 - (pos as i32 - 1);
            self.check_offset(offset);
            self.put2_at(pos, offset);
        }
    }

    fn put_jump(&mut self, op: OpCode, label: Label) {
        let at = self.pc();
        self.put(op);
        match self.labels[label.0].adr {
            Some(adr) => self.put_offset(adr as i32 - at as i32),
            None => {
                let pos = self.pc();
                self.labels[label.0].fixups.push(pos);
                self.put2(0);
            }
        }
    }

    /// Unconditional jump.
    pub fn jump(&mut self, label: Label) {
        self.put_jump(OpCode::Jmp, label);
    }

    /// Jump to `label` if the comparison `op` holds.
    pub fn t_jump(&mut self, op: CompOp, label: Label) {
        self.put_jump(op.jump(), label);
    }

    /// Jump to `label` if the comparison `op` does not hold.
    pub fn f_jump(&mut self, op: CompOp, label: Label) {
        self.put_jump(op.invert().jump(), label);
    }

    /// Number of emitted jumps still waiting for their label.
    pub fn pending_fixups(&self) -> usize {
        self.labels
            .iter()
            .filter(|l| l.adr.is_none())
            .map(|l| l.fixups.len())
            .sum()
    }

    /// Seals the buffer into an image.
    pub fn finish(self) -> Result<Image, CompileError> {
        let pending = self.pending_fixups();
        if pending > 0 {
            return Err(CompileError::DanglingLabel { pending });
        }
        Ok(Image {
            data_size: self.data_size as i32,
            main_pc: self.main_pc.map(|pc| pc as i32).unwrap_or(-1),
            code: self.buf,
        })
    }
}

impl Default for Code {
    fn default() -> Self {
        Self::new()
    }
}
