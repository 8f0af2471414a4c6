mod cli;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mjc::bytecode::disasm::print_image;
use mjc::diagnostics::Diagnostics;
use mjc::lexer::Lexer;
use mjc::token_dumper::TokenDumper;
use mjc::{CompileError, CompilerOptions, DebugInfo, Diagnostic, Image};

use cli::{Cli, Commands, DisasmArgs};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Some(Commands::Disasm(args)) => run_disasm(args),
        None => match &cli.file {
            Some(file) => run_compile(&cli, file),
            None => {
                println!("{}", "Usage: mjc <file.mj> [options]".yellow());
                println!();
                println!("Run {} for more information", "mjc --help".cyan());
                Ok(ExitCode::SUCCESS)
            }
        },
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            if cli.no_color {
                eprintln!("error: {}", e);
            } else {
                eprintln!("{} {}", "error:".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run_compile(cli: &Cli, file: &Path) -> Result<ExitCode, CompileError> {
    if cli.tokens {
        return dump_tokens(file, cli.terse, cli.no_color);
    }

    let options = CompilerOptions {
        min_error_distance: cli.min_error_distance,
    };
    let compilation = mjc::compile_file(file, &options)?;

    if !compilation.is_valid() {
        print_diagnostics(&compilation.diagnostics, cli.no_color);
        let summary = format!("{} error(s), no object file written", compilation.diagnostics.len());
        if cli.no_color {
            eprintln!("{}", summary);
        } else {
            eprintln!("{}", summary.red());
        }
        return Ok(ExitCode::FAILURE);
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| file.with_extension("obj"));
    let mut out = io::BufWriter::new(fs::File::create(&output)?);
    compilation.image.write(&mut out)?;
    debug!(path = %output.display(), "object file written");

    if cli.debug_info {
        let path = output.with_extension("dbg");
        fs::write(&path, compilation.debug_info.encode()?)?;
        debug!(path = %path.display(), "debug info written");
    }

    if cli.disasm {
        print_image(&compilation.image, Some(&compilation.debug_info))?;
    }

    Ok(ExitCode::SUCCESS)
}

fn dump_tokens(file: &Path, terse: bool, no_color: bool) -> Result<ExitCode, CompileError> {
    let source = fs::read_to_string(file)?;
    let mut diagnostics = Diagnostics::new();
    let tokens = Lexer::new(&source).tokenize(&mut diagnostics);

    let mut dumper = TokenDumper::new();
    if no_color {
        dumper = dumper.no_color();
    }
    if terse {
        dumper = dumper.terse();
    }
    dumper.dump(&tokens, &mut io::stdout().lock())?;

    let diagnostics = diagnostics.into_vec();
    print_diagnostics(&diagnostics, no_color);
    Ok(if diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_disasm(args: &DisasmArgs) -> Result<ExitCode, CompileError> {
    let image = Image::from_bytes(&fs::read(&args.image)?)?;

    let debug_path: Option<PathBuf> = match &args.debug {
        Some(path) => Some(path.clone()),
        None => {
            let sidecar = args.image.with_extension("dbg");
            sidecar.exists().then_some(sidecar)
        }
    };
    let debug_info = match debug_path {
        Some(path) => Some(DebugInfo::decode(&fs::read(path)?)?),
        None => None,
    };

    print_image(&image, debug_info.as_ref())?;
    Ok(ExitCode::SUCCESS)
}

fn print_diagnostics(diagnostics: &[Diagnostic], no_color: bool) {
    for diagnostic in diagnostics {
        if no_color {
            eprintln!("{}", diagnostic);
        } else {
            eprintln!("{}", diagnostic.bright_red());
        }
    }
}
