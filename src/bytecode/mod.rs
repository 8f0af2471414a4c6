pub mod code;
pub mod compile_error;
pub mod disasm;
pub mod image;
pub mod op;
pub mod operand;

pub use code::{Code, Label};
pub use compile_error::CompileError;
pub use image::{DebugInfo, Image, MethodInfo};
pub use op::{CompOp, OpCode};
pub use operand::{Operand, OperandKind};
