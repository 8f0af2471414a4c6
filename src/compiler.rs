//! Compiler driver: source text in, object image and diagnostics out.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::bytecode::{CompileError, DebugInfo, Image};
use crate::diagnostics::Diagnostic;
use crate::lexer::Lexer;
use crate::parser::Parser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Number of tokens that must be consumed after an error before the
    /// next one is reported.
    pub min_error_distance: u32,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            min_error_distance: 3,
        }
    }
}

/// Result of compiling one translation unit.
#[derive(Debug)]
pub struct Compilation {
    pub image: Image,
    pub diagnostics: Vec<Diagnostic>,
    pub debug_info: DebugInfo,
}

impl Compilation {
    /// An image is only usable if no diagnostic was reported.
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub fn compile(source: &str) -> Result<Compilation, CompileError> {
    compile_with(source, &CompilerOptions::default())
}

pub fn compile_with(source: &str, options: &CompilerOptions) -> Result<Compilation, CompileError> {
    debug!(bytes = source.len(), ?options, "compiling");
    let mut parser = Parser::new(Lexer::new(source), options);
    parser.parse();
    let (code, diagnostics, debug_info) = parser.finish();
    let image = code.finish()?;

    info!(
        program = %debug_info.program,
        code_size = image.code_size(),
        data_size = image.data_size,
        main_pc = image.main_pc,
        errors = diagnostics.len(),
        "compilation finished"
    );

    Ok(Compilation {
        image,
        diagnostics: diagnostics.into_vec(),
        debug_info,
    })
}

pub fn compile_file(path: &Path, options: &CompilerOptions) -> Result<Compilation, CompileError> {
    let source = fs::read_to_string(path)?;
    compile_with(&source, options)
}
