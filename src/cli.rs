//! Command line interface of the `mjc` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// mjc - MicroJava compiler
#[derive(Parser, Debug)]
#[command(name = "mjc")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// MicroJava source file (.mj)
    pub file: Option<PathBuf>,

    /// Object file to write (default: source name with .obj extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only scan the source and print its tokens
    #[arg(long)]
    pub tokens: bool,

    /// With --tokens, print only token kinds and positions
    #[arg(long, requires = "tokens")]
    pub terse: bool,

    /// Print a listing of the generated code
    #[arg(long)]
    pub disasm: bool,

    /// Also write a .dbg file with method and global names
    #[arg(long)]
    pub debug_info: bool,

    /// Tokens to consume after an error before reporting the next one
    #[arg(long, default_value_t = 3)]
    pub min_error_distance: u32,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a listing of a compiled object file
    Disasm(DisasmArgs),
}

#[derive(Args, Debug)]
pub struct DisasmArgs {
    /// Object file produced by mjc
    pub image: PathBuf,

    /// Debug info file (default: the image name with .dbg extension, if present)
    #[arg(long)]
    pub debug: Option<PathBuf>,
}
