//! Owned AST node definitions.
//!
//! The original implementation threads every sequence (statements,
//! arguments, struct fields) through an intrusive `next` pointer on a common
//! base struct. This reimplementation uses ordinary owned `Vec<_>` fields
//! instead (SPEC_FULL.md §9): the tagged-variant shape carries over
//! directly onto a Rust sum type, each variant owning only the fields it
//! needs.

use crate::error::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Str,
    Dec,
    Bool,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone)]
pub struct StructField {
    pub ty: Type,
    pub name: String,
    pub custom_type_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub custom_type_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct MatchCase {
    /// `None` is the wildcard `_` case; otherwise an expression compared by
    /// equality against the match target.
    pub label: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(i64),
    Decimal(f64),
    Str(String),
    /// The `/n` literal-newline sentinel, kept distinct from `Str("\n")` so
    /// `Print` can special-case it exactly as the original does.
    NewlineLiteral,
    Var(String, Line),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        line: Line,
    },
    New {
        type_name: String,
        line: Line,
    },
    MemberAccess {
        base: Box<Expr>,
        member: String,
        line: Line,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        line: Line,
    },
}

#[derive(Debug, Clone)]
pub enum LValue {
    Var(String, Line),
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        line: Line,
    },
    Member {
        base: Box<Expr>,
        member: String,
        line: Line,
    },
}

#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl {
        name: String,
        ty: Type,
        custom_type_name: Option<String>,
        array_size: u32,
        init: Option<Expr>,
        line: Line,
    },
    Assign {
        target: LValue,
        value: Expr,
        line: Line,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        var: String,
        start: Expr,
        end: Expr,
        body: Vec<Stmt>,
    },
    Match {
        target: Expr,
        cases: Vec<MatchCase>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
}

/// A top-level item. `Import` is carried through as a no-op marker, matching
/// the original's treatment (the compiler never loads external modules);
/// `Include` never survives parsing (it is spliced in at parse time).
#[derive(Debug, Clone)]
pub enum Item {
    StructDef(StructDef),
    FunctionDef(FunctionDef),
    Import(String),
    /// A top-level statement, collected in emission order into the
    /// synthetic `main`.
    TopStmt(Stmt),
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub items: Vec<Item>,
}
