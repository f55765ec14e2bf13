//! `vylc` CLI: compile a `.vyl` source file to an executable.

use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use vylc::driver::{self, CompileOptions};

#[derive(ClapParser)]
#[command(name = "vylc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vyl compiler - compile .vyl programs to executables", long_about = None)]
struct Cli {
    /// Input .vyl source file
    input: PathBuf,

    /// Emit assembly only; do not invoke the toolchain
    #[arg(short = 'c', long = "compile")]
    compile_only: bool,

    /// Output executable path (defaults to the input file's stem)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep the generated .s file after linking
    #[arg(long)]
    keep_asm: bool,

    /// Print each pipeline stage as it runs
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let opts = CompileOptions {
        output: cli.output,
        compile_only: cli.compile_only,
        keep_asm: cli.keep_asm,
        verbose: cli.verbose,
    };

    let compile_only = cli.compile_only;
    match driver::compile_file(&cli.input, &opts) {
        Ok(path) => {
            if cli.verbose {
                eprintln!("vylc: wrote {}", path.display());
            }
            if compile_only {
                return;
            }
            // `-c`/`--compile` is the only thing that suppresses running the
            // built binary; otherwise vylc's exit status mirrors it.
            let abs_path = if path.is_absolute() {
                path.clone()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(&path))
                    .unwrap_or(path.clone())
            };
            match process::Command::new(&abs_path).status() {
                Ok(status) => process::exit(status.code().unwrap_or(1)),
                Err(e) => {
                    eprintln!("error: failed to run {}: {e}", path.display());
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
