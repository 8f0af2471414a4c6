//! `mjc`: a single-pass compiler for MicroJava.
//!
//! Source text is scanned ([`lexer`]), parsed and type-checked against the
//! symbol table ([`symtab`]) while bytecode for the MicroJava VM is emitted
//! directly ([`bytecode`]). [`compiler::compile`] ties the phases together.

pub mod bytecode;
pub mod compiler;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod symtab;
pub mod token;
pub mod token_dumper;

pub use bytecode::{CompileError, DebugInfo, Image};
pub use compiler::{Compilation, CompilerOptions, compile, compile_file, compile_with};
pub use diagnostics::{Diagnostic, Message};
