//! Shared source-position type and the per-stage error enums.
//!
//! Every stage (lexer, parser, codegen, driver) reports failures through a
//! `thiserror`-derived enum so the CLI boundary can match on `Display`
//! without string-sniffing.

use std::fmt;

/// A 1-based source line number. Columns are not tracked: the source
/// language's diagnostics have never needed them, and the original
/// implementation only ever reports lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Line(pub u32);

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("line {line}: unexpected byte {byte:?}")]
    UnexpectedByte { byte: char, line: Line },
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: Line },
    #[error("line {line}: '&' must be followed by '&'")]
    DanglingAmpersand { line: Line },
    #[error("line {line}: '|' must be followed by '|'")]
    DanglingPipe { line: Line },
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found {found}")]
    Unexpected {
        expected: String,
        found: String,
        line: Line,
    },
    #[error("line {line}: invalid assignment target")]
    InvalidAssignTarget { line: Line },
    #[error("line {line}: include cycle detected: {path} is already being parsed")]
    IncludeCycle { path: String, line: Line },
    #[error("line {line}: included file not found: {path}")]
    IncludeNotFound { path: String, line: Line },
    #[error(transparent)]
    Lex(#[from] LexError),
}

/// A single codegen diagnostic. Unlike lex/parse errors, codegen errors do
/// not abort the pass: they are recorded and surfaced at the end, while the
/// generator keeps emitting a best-effort `.s` (annotated with a comment at
/// the failure site) so the caller can see exactly what went wrong in
/// context.
#[derive(Debug, Clone)]
pub struct CodegenError {
    pub message: String,
    pub function: String,
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in {}: {}", self.function, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("reading {path}: {source}")]
    ReadSource {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("writing {path}: {source}")]
    WriteAsm {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("code generation produced {0} diagnostic(s); see above")]
    Codegen(usize),
    #[error("could not locate a C toolchain (tried: {0})")]
    ToolchainNotFound(String),
    #[error("toolchain invocation failed: {0}")]
    ToolchainFailed(String),
    #[error("extracting embedded runtime library: {0}")]
    RuntimeExtraction(#[source] std::io::Error),
}
