// =============================================================================
// OpCode - MicroJava VM instructions
// =============================================================================

/// Instruction opcodes. The byte value of an opcode is its discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // locals
    Load = 1,
    Load0,
    Load1,
    Load2,
    Load3,
    Store,
    Store0,
    Store1,
    Store2,
    Store3,

    // globals and fields
    GetStatic,
    PutStatic,
    GetField,
    PutField,

    // constants
    Const0,
    Const1,
    Const2,
    Const3,
    Const4,
    Const5,
    ConstM1,
    Const,

    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    Shl,
    Shr,
    Inc,

    // objects and arrays
    New,
    NewArray,
    ALoad,
    AStore,
    BALoad,
    BAStore,
    ArrayLength,

    // stack
    Pop,
    Dup,
    Dup2,

    // ==========================================================================
    // Jumps: 2-byte offset relative to the address of the jump opcode
    // ==========================================================================
    Jmp,
    Jeq,
    Jne,
    Jlt,
    Jle,
    Jgt,
    Jge,

    // methods
    Call,
    Return,
    Enter,
    Exit,

    // I/O
    Read,
    Print,
    BRead,
    BPrint,

    Trap,
    Nop,
}

const ALL: [OpCode; 58] = {
    use OpCode::*;
    [
        Load, Load0, Load1, Load2, Load3, Store, Store0, Store1, Store2, Store3, GetStatic,
        PutStatic, GetField, PutField, Const0, Const1, Const2, Const3, Const4, Const5, ConstM1,
        Const, Add, Sub, Mul, Div, Rem, Neg, Shl, Shr, Inc, New, NewArray, ALoad, AStore, BALoad,
        BAStore, ArrayLength, Pop, Dup, Dup2, Jmp, Jeq, Jne, Jlt, Jle, Jgt, Jge, Call, Return,
        Enter, Exit, Read, Print, BRead, BPrint, Trap, Nop,
    ]
};

impl OpCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<OpCode> {
        if byte == 0 {
            return None;
        }
        ALL.get(byte as usize - 1).copied()
    }

    /// Widths in bytes of the immediate operands following the opcode.
    pub fn operand_widths(self) -> &'static [usize] {
        use OpCode::*;
        match self {
            Load | Store | NewArray | Trap => &[1],
            Inc | Enter => &[1, 1],
            GetStatic | PutStatic | GetField | PutField | New => &[2],
            Jmp | Jeq | Jne | Jlt | Jle | Jgt | Jge | Call => &[2],
            Const => &[4],
            _ => &[],
        }
    }

    /// Total encoded size of the instruction.
    pub fn size(self) -> usize {
        1 + self.operand_widths().iter().sum::<usize>()
    }

    pub fn is_jump(self) -> bool {
        use OpCode::*;
        matches!(self, Jmp | Jeq | Jne | Jlt | Jle | Jgt | Jge)
    }

    pub fn name(self) -> &'static str {
        use OpCode::*;
        match self {
            Load => "load",
            Load0 => "load_0",
            Load1 => "load_1",
            Load2 => "load_2",
            Load3 => "load_3",
            Store => "store",
            Store0 => "store_0",
            Store1 => "store_1",
            Store2 => "store_2",
            Store3 => "store_3",
            GetStatic => "getstatic",
            PutStatic => "putstatic",
            GetField => "getfield",
            PutField => "putfield",
            Const0 => "const_0",
            Const1 => "const_1",
            Const2 => "const_2",
            Const3 => "const_3",
            Const4 => "const_4",
            Const5 => "const_5",
            ConstM1 => "const_m1",
            Const => "const",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => "div",
            Rem => "rem",
            Neg => "neg",
            Shl => "shl",
            Shr => "shr",
            Inc => "inc",
            New => "new",
            NewArray => "newarray",
            ALoad => "aload",
            AStore => "astore",
            BALoad => "baload",
            BAStore => "bastore",
            ArrayLength => "arraylength",
            Pop => "pop",
            Dup => "dup",
            Dup2 => "dup2",
            Jmp => "jmp",
            Jeq => "jeq",
            Jne => "jne",
            Jlt => "jlt",
            Jle => "jle",
            Jgt => "jgt",
            Jge => "jge",
            Call => "call",
            Return => "return",
            Enter => "enter",
            Exit => "exit",
            Read => "read",
            Print => "print",
            BRead => "bread",
            BPrint => "bprint",
            Trap => "trap",
            Nop => "nop",
        }
    }
}

/// Relational operators of conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    /// The operator that holds exactly when `self` does not.
    pub fn invert(self) -> CompOp {
        match self {
            CompOp::Eq => CompOp::Ne,
            CompOp::Ne => CompOp::Eq,
            CompOp::Lt => CompOp::Ge,
            CompOp::Le => CompOp::Gt,
            CompOp::Gt => CompOp::Le,
            CompOp::Ge => CompOp::Lt,
        }
    }

    /// Conditional jump taken when the comparison holds.
    pub fn jump(self) -> OpCode {
        match self {
            CompOp::Eq => OpCode::Jeq,
            CompOp::Ne => OpCode::Jne,
            CompOp::Lt => OpCode::Jlt,
            CompOp::Le => OpCode::Jle,
            CompOp::Gt => OpCode::Jgt,
            CompOp::Ge => OpCode::Jge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_numbering() {
        assert_eq!(OpCode::Load.code(), 1);
        assert_eq!(OpCode::Const.code(), 22);
        assert_eq!(OpCode::Jmp.code(), 42);
        assert_eq!(OpCode::Enter.code(), 51);
        assert_eq!(OpCode::Nop.code(), 58);
    }

    #[test]
    fn test_from_byte_matches_code() {
        for op in ALL {
            assert_eq!(OpCode::from_byte(op.code()), Some(op));
        }
        assert_eq!(OpCode::from_byte(0), None);
        assert_eq!(OpCode::from_byte(59), None);
    }

    #[test]
    fn test_instruction_sizes() {
        assert_eq!(OpCode::Load0.size(), 1);
        assert_eq!(OpCode::Load.size(), 2);
        assert_eq!(OpCode::Const.size(), 5);
        assert_eq!(OpCode::Inc.size(), 3);
        assert_eq!(OpCode::Jge.size(), 3);
        assert_eq!(OpCode::Enter.size(), 3);
    }

    #[test]
    fn test_invert_is_an_involution() {
        for op in [CompOp::Eq, CompOp::Ne, CompOp::Lt, CompOp::Le, CompOp::Gt, CompOp::Ge] {
            assert_ne!(op.invert(), op);
            assert_eq!(op.invert().invert(), op);
        }
        assert_eq!(CompOp::Lt.invert(), CompOp::Ge);
        assert_eq!(CompOp::Le.invert(), CompOp::Gt);
    }

    #[test]
    fn test_jump_opcodes() {
        assert_eq!(CompOp::Eq.jump(), OpCode::Jeq);
        assert_eq!(CompOp::Ge.jump(), OpCode::Jge);
        assert!(CompOp::Gt.jump().is_jump());
        assert!(!OpCode::Call.is_jump());
    }
}
