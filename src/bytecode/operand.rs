use crate::bytecode::{CompOp, Label};
use crate::diagnostics::{Message, Reporter};
use crate::symtab::{ObjId, ObjKind, Tab, TypeId};

/// Where the value of an expression lives at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Compile-time constant, not yet emitted.
    Constant(i32),
    /// Local variable slot.
    Local(i32),
    /// Global variable address.
    Static(i32),
    /// Already on the expression stack.
    Stack,
    /// Field offset; the object reference is on the stack.
    Field(i32),
    /// Array element; array reference and index are on the stack.
    Element,
    Method(ObjId),
    /// Result of a relational comparison, expressed as pending jumps.
    Condition {
        op: CompOp,
        t_label: Label,
        f_label: Label,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub kind: OperandKind,
    pub ty: TypeId,
}

impl Operand {
    pub fn constant(val: i32, ty: TypeId) -> Self {
        Operand {
            kind: OperandKind::Constant(val),
            ty,
        }
    }

    pub fn stack(ty: TypeId) -> Self {
        Operand {
            kind: OperandKind::Stack,
            ty,
        }
    }

    pub fn condition(op: CompOp, t_label: Label, f_label: Label) -> Self {
        Operand {
            kind: OperandKind::Condition {
                op,
                t_label,
                f_label,
            },
            ty: TypeId::NONE,
        }
    }

    /// Operand for a name reference.
    pub fn from_obj(id: ObjId, tab: &Tab, reporter: &mut Reporter) -> Self {
        let obj = tab.obj(id);
        let kind = match obj.kind {
            ObjKind::Constant => OperandKind::Constant(obj.val),
            ObjKind::Variable if obj.level == 0 => OperandKind::Static(obj.adr),
            ObjKind::Variable => OperandKind::Local(obj.adr),
            ObjKind::Method => OperandKind::Method(id),
            ObjKind::Type | ObjKind::Program => {
                reporter.error(Message::NoOperand);
                return Operand::constant(0, TypeId::NONE);
            }
        };
        Operand { kind, ty: obj.ty }
    }

    pub fn can_be_assigned_to(&self) -> bool {
        matches!(
            self.kind,
            OperandKind::Local(_)
                | OperandKind::Static(_)
                | OperandKind::Field(_)
                | OperandKind::Element
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            OperandKind::Constant(_) => "constant",
            OperandKind::Local(_) => "local variable",
            OperandKind::Static(_) => "global variable",
            OperandKind::Stack => "value",
            OperandKind::Field(_) => "field",
            OperandKind::Element => "array element",
            OperandKind::Method(_) => "method",
            OperandKind::Condition { .. } => "condition",
        }
    }

    /// The operator and jump targets of a condition operand.
    pub fn as_condition(&self) -> Option<(CompOp, Label, Label)> {
        match self.kind {
            OperandKind::Condition {
                op,
                t_label,
                f_label,
            } => Some((op, t_label, f_label)),
            _ => None,
        }
    }
}
