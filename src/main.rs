//! # Rae Compiler (raec) Executable
//!
//! Command-line entry point. Subcommands mirror the pipeline stages:
//! `lex`, `parse`, `format`, `run`, `build`.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use raec::compiler::Driver;

#[derive(Parser)]
#[command(name = "raec", version, about = "Rae compiler and VM toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the token list for a source file.
    Lex {
        file: PathBuf,
    },
    /// Dump the parsed AST as pretty-printed JSON.
    Parse {
        file: PathBuf,
    },
    /// Pretty-print a source file's AST back to source text.
    Format {
        file: PathBuf,
        /// Rewrite the file in place.
        #[arg(short, long)]
        write: bool,
        /// Write the formatted output to a different path.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Compile and execute a source file under the VM.
    Run {
        file: PathBuf,
        /// Keep running, hot-patching on source changes.
        #[arg(short, long)]
        watch: bool,
    },
    /// Experimental build pipeline (interface-level stub).
    Build {
        file: PathBuf,
        #[arg(long)]
        emit_c: bool,
        /// Target triple, e.g. "x86_64-pc-windows-msvc" or "aarch64-apple-darwin".
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lex { file } => Driver::new(file).lex(),
        Commands::Parse { file } => Driver::new(file).parse_cmd(),
        Commands::Format { file, write, out } => Driver::new(file).format_cmd(write, out.as_deref()),
        Commands::Run { file, watch } => Driver::new(file).run(watch),
        Commands::Build { file, emit_c, target, out } => {
            Driver::new(file).build(emit_c, target.as_deref(), out.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}
