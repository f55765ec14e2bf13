//! CLI pipeline orchestration: read source, parse, generate assembly, write
//! the `.s` file, hand it plus the embedded runtime to `gcc`, and produce a
//! linked executable.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::DriverError;
use crate::{codegen, parser};

/// The runtime static library, baked into the compiler binary at build time
/// (see `build.rs`) so `vylc` never depends on a sibling file being present
/// at runtime.
static RUNTIME_LIB: &[u8] = include_bytes!(env!("VYL_RUNTIME_LIB_PATH"));

pub struct CompileOptions {
    /// Write the finished binary here. Defaults to the source file's stem.
    pub output: Option<PathBuf>,
    /// Stop after emitting the `.s` file; do not invoke the toolchain.
    pub compile_only: bool,
    /// Keep the generated `.s` file around after a successful link.
    pub keep_asm: bool,
    pub verbose: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            output: None,
            compile_only: false,
            keep_asm: false,
            verbose: false,
        }
    }
}

/// Runs the full pipeline for a single source file. Returns the path to the
/// produced artifact (the `.s` file in `compile_only` mode, otherwise the
/// linked executable).
pub fn compile_file(source_path: &Path, opts: &CompileOptions) -> Result<PathBuf, DriverError> {
    let source = fs::read_to_string(source_path).map_err(|source_err| DriverError::ReadSource {
        path: source_path.display().to_string(),
        source: source_err,
    })?;

    if opts.verbose {
        eprintln!("vylc: parsing {}", source_path.display());
    }
    let program = parser::parse_file(&source, source_path)?;

    if opts.verbose {
        eprintln!("vylc: generating assembly");
    }
    let (asm, diagnostics) = codegen::generate(&program);
    if !diagnostics.is_empty() {
        for diag in &diagnostics {
            eprintln!("error: {diag}");
        }
        return Err(DriverError::Codegen(diagnostics.len()));
    }

    let stem = source_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "out".to_string());
    let asm_path = source_path.with_file_name(format!("{stem}.s"));
    fs::write(&asm_path, &asm).map_err(|source_err| DriverError::WriteAsm {
        path: asm_path.display().to_string(),
        source: source_err,
    })?;

    if opts.compile_only {
        return Ok(asm_path);
    }

    let output_path = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&stem));
    link(&asm_path, &output_path, opts)?;

    if !opts.keep_asm {
        let _ = fs::remove_file(&asm_path);
    }

    Ok(output_path)
}

/// Extracts the embedded runtime staticlib to a temp file and invokes `gcc`
/// to assemble and link `asm_path` against it.
fn link(asm_path: &Path, output_path: &Path, opts: &CompileOptions) -> Result<(), DriverError> {
    let runtime_path = std::env::temp_dir().join(format!("libvyl_runtime-{}.a", std::process::id()));
    fs::write(&runtime_path, RUNTIME_LIB).map_err(DriverError::RuntimeExtraction)?;

    let gcc = which_toolchain()?;
    if opts.verbose {
        eprintln!(
            "vylc: {} {} {} -> {}",
            gcc,
            asm_path.display(),
            runtime_path.display(),
            output_path.display()
        );
    }

    let status = Command::new(&gcc)
        .arg(asm_path)
        .arg(&runtime_path)
        .arg("-o")
        .arg(output_path)
        .arg("-lm")
        .status();

    let _ = fs::remove_file(&runtime_path);

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(DriverError::ToolchainFailed(format!(
            "{gcc} exited with {status}"
        ))),
        Err(e) => Err(DriverError::ToolchainFailed(e.to_string())),
    }
}

fn which_toolchain() -> Result<String, DriverError> {
    for candidate in ["gcc", "cc"] {
        if Command::new(candidate)
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
        {
            return Ok(candidate.to_string());
        }
    }
    Err(DriverError::ToolchainNotFound("gcc, cc".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reports_read_error_for_missing_source() {
        let result = compile_file(Path::new("/nonexistent/does-not-exist.vyl"), &CompileOptions::default());
        assert!(matches!(result, Err(DriverError::ReadSource { .. })));
    }

    #[test]
    fn compile_only_produces_assembly_without_invoking_toolchain() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("prog.vyl");
        let mut f = fs::File::create(&source_path).unwrap();
        writeln!(f, "Main() {{ Print(1) }}").unwrap();

        let opts = CompileOptions {
            compile_only: true,
            ..CompileOptions::default()
        };
        let result = compile_file(&source_path, &opts);
        assert!(result.is_ok());
        let asm_path = result.unwrap();
        assert!(asm_path.ends_with("prog.s"));
        let contents = fs::read_to_string(&asm_path).unwrap();
        assert!(contents.contains(".global main"));
    }
}
