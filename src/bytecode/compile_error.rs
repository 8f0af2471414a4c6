use thiserror::Error;

/// Failures outside the user's program, such as I/O errors or corrupt
/// images. Problems in the compiled source are reported as
/// [`crate::diagnostics::Diagnostic`]s instead.
#[derive(Error, Debug)]
pub enum CompileError {
    /// Reading the source or writing the image failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A byte sequence that is not a valid MicroJava image
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Jumps still waiting for a label that was never placed
    #[error("internal error: {pending} jump(s) to an unresolved label")]
    DanglingLabel { pending: usize },

    /// Debug info could not be encoded or decoded
    #[error("debug info: {0}")]
    DebugInfo(#[from] postcard::Error),
}

impl CompileError {
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        CompileError::InvalidImage(msg.into())
    }
}
