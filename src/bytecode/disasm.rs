use std::fmt::Write;

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::{DebugInfo, Image, OpCode};

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub pc: usize,
    pub op: OpCode,
    /// Immediate operands; jump and call offsets are already converted to
    /// absolute target addresses.
    pub operands: Vec<i32>,
}

impl Instruction {
    /// Absolute target of a jump or call.
    pub fn target(&self) -> Option<usize> {
        if self.op.is_jump() || self.op == OpCode::Call {
            self.operands.first().map(|t| *t as usize)
        } else {
            None
        }
    }
}

/// Decodes a code buffer into instructions.
pub fn decode(code: &[u8]) -> Result<Vec<Instruction>, CompileError> {
    let mut instructions = Vec::new();
    let mut pc = 0;

    while pc < code.len() {
        let op = OpCode::from_byte(code[pc])
            .ok_or_else(|| CompileError::invalid_image(format!("unknown opcode {} at {}", code[pc], pc)))?;
        if pc + op.size() > code.len() {
            return Err(CompileError::invalid_image(format!(
                "{} at {} runs past the end of the code",
                op.name(),
                pc
            )));
        }

        let mut at = pc + 1;
        let mut operands = Vec::with_capacity(op.operand_widths().len());
        for (i, width) in op.operand_widths().iter().enumerate() {
            let value = match *width {
                1 if op == OpCode::Inc && i == 1 => code[at] as i8 as i32,
                1 => code[at] as i32,
                2 if op.is_jump() || op == OpCode::Call => {
                    pc as i32 + i16::from_be_bytes([code[at], code[at + 1]]) as i32
                }
                2 => u16::from_be_bytes([code[at], code[at + 1]]) as i32,
                _ => i32::from_be_bytes([code[at], code[at + 1], code[at + 2], code[at + 3]]),
            };
            operands.push(value);
            at += width;
        }

        instructions.push(Instruction { pc, op, operands });
        pc = at;
    }

    Ok(instructions)
}

fn collect_jump_targets(instructions: &[Instruction]) -> Vec<usize> {
    let mut targets = Vec::new();
    for ins in instructions {
        if ins.op.is_jump() {
            if let Some(target) = ins.target() {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
    }
    targets
}

/// Renders a listing of `image`, naming methods when debug info is given.
pub fn disassemble(image: &Image, debug: Option<&DebugInfo>) -> Result<String, CompileError> {
    let instructions = decode(&image.code)?;
    let jump_targets = collect_jump_targets(&instructions);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "; code {} bytes, data {} words, entry {}",
        image.code.len(),
        image.data_size,
        image.main_pc
    );

    for ins in &instructions {
        if let Some(name) = debug.and_then(|d| d.method_at(ins.pc)) {
            let _ = writeln!(out, "\n{}:", name);
        }
        if jump_targets.contains(&ins.pc) {
            let _ = writeln!(out, "      ┌──────────────────────────────────");
        }

        let marker = if jump_targets.contains(&ins.pc) { "► " } else { "  " };
        let _ = write!(out, "{:04} {}{:<12}", ins.pc, marker, ins.op.name());
        let _ = writeln!(out, "{}", format_operands(ins, debug).trim_end());
    }

    Ok(out)
}

fn format_operands(ins: &Instruction, debug: Option<&DebugInfo>) -> String {
    match ins.op {
        OpCode::Call => {
            let target = ins.target().unwrap_or_default();
            match debug.and_then(|d| d.method_at(target)) {
                Some(name) => format!("-> {:04} ; {}", target, name),
                None => format!("-> {:04}", target),
            }
        }
        op if op.is_jump() => format!("-> {:04}", ins.target().unwrap_or_default()),
        OpCode::GetStatic | OpCode::PutStatic => {
            let adr = ins.operands[0];
            match debug.and_then(|d| d.globals.get(adr as usize)) {
                Some(name) => format!("{} ; {}", adr, name),
                None => adr.to_string(),
            }
        }
        _ => ins
            .operands
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Print disassembly of an image
pub fn print_image(image: &Image, debug: Option<&DebugInfo>) -> Result<(), CompileError> {
    print!("{}", disassemble(image, debug)?);
    Ok(())
}
