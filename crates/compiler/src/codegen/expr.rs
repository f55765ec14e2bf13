use crate::ast::{BinOp, Expr, Type};

use super::builtins::gen_call;
use super::state::CodeGen;

/// Builtins whose result lands in `xmm0` as a double (SPEC_FULL.md §4.3's
/// libm group, plus `Clock` and `ToDecimal`), used so `Print` and the
/// decimal/int binary-op promotion pick the right representation.
const DEC_RESULT_BUILTINS: &[&str] = &[
    "Clock", "Sqrt", "Sin", "Cos", "Tan", "Abs", "Floor", "Ceil", "Power", "ToDecimal",
];

/// Builtins that hand back a `char*` the same way a string literal does.
const STR_RESULT_BUILTINS: &[&str] = &["Read", "ReadLine", "Concat", "Substring", "ToString"];

/// Infers an expression's static type using the same shallow rules as the
/// original `get_expr_type`: literals carry their obvious type, a `Var`
/// looks up its declared local, a binary op is `DEC` if either operand is,
/// otherwise `INT`, and a call is `DEC` only for the one builtin
/// (`Clock`) that is known to return a double.
pub fn expr_type(cg: &CodeGen, expr: &Expr) -> Type {
    match expr {
        Expr::Number(_) => Type::Int,
        Expr::Str(_) | Expr::NewlineLiteral => Type::Str,
        Expr::Decimal(_) => Type::Dec,
        Expr::Var(name, _) => cg
            .find_local(name)
            .map(|l| l.ty)
            .unwrap_or(Type::Int),
        Expr::Call { callee, .. } if DEC_RESULT_BUILTINS.contains(&callee.as_str()) => Type::Dec,
        Expr::Call { callee, .. } if STR_RESULT_BUILTINS.contains(&callee.as_str()) => Type::Str,
        Expr::Call { .. } => Type::Int,
        Expr::Binary { left, right, .. } => {
            if expr_type(cg, left) == Type::Dec || expr_type(cg, right) == Type::Dec {
                Type::Dec
            } else {
                Type::Int
            }
        }
        Expr::New { .. } | Expr::MemberAccess { .. } | Expr::Index { .. } => Type::Int,
    }
}

/// Resolves the custom struct type name of an expression, walking through
/// variables, `new` expressions, and member accesses (recursively, now that
/// `StructField` carries its own type). Returns `None` when the expression
/// is not struct-typed or the type cannot be determined.
pub fn expr_custom_type_name(cg: &CodeGen, expr: &Expr) -> Option<String> {
    match expr {
        Expr::Var(name, _) => cg.find_local(name).and_then(|l| l.custom_type_name.clone()),
        Expr::New { type_name, .. } => Some(type_name.clone()),
        Expr::MemberAccess { base, member, .. } => {
            let struct_name = expr_custom_type_name(cg, base)?;
            let info = cg.struct_info(&struct_name)?;
            let field = info.field(member)?;
            field.custom_type_name.clone()
        }
        _ => None,
    }
}

/// Evaluates `expr`, leaving an integer/bool/pointer result in `rax` or a
/// decimal result in `xmm0`, per the expression evaluation contract.
pub fn gen_expr(cg: &mut CodeGen, expr: &Expr) {
    match expr {
        Expr::Number(n) => cg.emit(&format!("mov rax, {n}")),
        Expr::Decimal(d) => {
            let id = cg.intern_double(*d);
            cg.emit(&format!("movsd xmm0, [rip + dec_const_{id}]"));
        }
        Expr::Str(s) => {
            let id = cg.intern_string(s);
            cg.emit(&format!("lea rax, [rip + str_{id}]"));
        }
        Expr::NewlineLiteral => {
            let id = cg.intern_string("\n");
            cg.emit(&format!("lea rax, [rip + str_{id}]"));
        }
        Expr::Var(name, _line) => gen_var_load(cg, name),
        Expr::New { type_name, .. } => {
            let Some(info) = cg.struct_info(type_name).cloned() else {
                cg.error(format!("undefined struct {type_name}"));
                return;
            };
            cg.emit(&format!("mov rdi, {}", info.fields.len() * 8));
            cg.emit("call malloc@plt");
        }
        Expr::MemberAccess { base, member, .. } => {
            gen_expr(cg, base); // base pointer now in rax
            let Some(struct_name) = expr_custom_type_name(cg, base) else {
                cg.error("could not resolve struct type for member access");
                return;
            };
            let Some(info) = cg.struct_info(&struct_name).cloned() else {
                cg.error(format!("undefined struct {struct_name}"));
                return;
            };
            let Some(offset) = info.field_offset(member) else {
                cg.error(format!("field {member} not found in struct {struct_name}"));
                return;
            };
            cg.emit(&format!("mov rax, [rax + {offset}]"));
        }
        Expr::Index { base, index, .. } => gen_index_load(cg, base, index),
        Expr::Binary { op, left, right } => gen_binary(cg, *op, left, right),
        Expr::Call { callee, args, .. } => gen_call(cg, callee, args, true),
    }
}

fn gen_var_load(cg: &mut CodeGen, name: &str) {
    let Some(local) = cg.find_local(name).cloned() else {
        cg.error(format!("undefined variable {name}"));
        return;
    };
    if let Some(reg) = local.reg {
        cg.emit(&format!("mov rax, {reg}"));
    } else if local.ty == Type::Dec {
        cg.emit(&format!("movsd xmm0, [rbp - {}]", local.offset));
    } else {
        cg.emit(&format!("mov rax, [rbp - {}]", local.offset));
    }
}

/// Array read with the same bounds check as a write (symmetric per
/// SPEC_FULL.md §4.3; the original only checked writes).
fn gen_index_load(cg: &mut CodeGen, base: &Expr, index: &Expr) {
    let Expr::Var(name, _) = base else {
        cg.error("array indexing requires a simple variable base");
        return;
    };
    let Some(local) = cg.find_local(name).cloned() else {
        cg.error(format!("undefined variable {name}"));
        return;
    };
    gen_expr(cg, index);
    cg.emit("mov r10, rax"); // index
    emit_bounds_check(cg, local.array_size as i64, "read");
    cg.emit(&format!(
        "mov rax, [rbp - {} - r10 * 8]",
        local.offset
    ));
}

pub fn emit_bounds_check(cg: &mut CodeGen, len: i64, kind: &str) {
    let ok_label = cg.next_label("idx_ok");
    let panic_label = cg.next_label("idx_panic");
    cg.emit("cmp r10, 0");
    cg.emit(&format!("jl {panic_label}"));
    cg.emit(&format!("cmp r10, {len}"));
    cg.emit(&format!("jl {ok_label}"));
    cg.emit_label(&panic_label);
    let id = cg.intern_string(&format!("index out of bounds ({kind})\n"));
    cg.emit(&format!("lea rdi, [rip + str_{id}]"));
    cg.emit("call vyl_panic");
    cg.emit_label(&ok_label);
}

fn gen_binary(cg: &mut CodeGen, op: BinOp, left: &Expr, right: &Expr) {
    let result_is_dec = expr_type(cg, left) == Type::Dec || expr_type(cg, right) == Type::Dec;

    if !result_is_dec {
        if let Expr::Number(n) = right {
            if let Some(()) = gen_immediate_binary(cg, op, left, *n) {
                return;
            }
        }
    }

    if result_is_dec {
        gen_decimal_binary(cg, op, left, right);
        return;
    }

    gen_expr(cg, left);
    cg.emit("push rax");
    gen_expr(cg, right);
    cg.emit("mov r11, rax");
    cg.emit("pop rax");
    match op {
        BinOp::Add => cg.emit("add rax, r11"),
        BinOp::Sub => cg.emit("sub rax, r11"),
        BinOp::Mul => cg.emit("imul rax, r11"),
        BinOp::Div => {
            cg.emit("cqo");
            cg.emit("idiv r11");
        }
        BinOp::Mod => {
            cg.emit("cqo");
            cg.emit("idiv r11");
            cg.emit("mov rax, rdx");
        }
        BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
            cg.emit("cmp rax, r11");
            emit_setcc(cg, op);
        }
        BinOp::And => {
            cg.emit("and rax, r11");
            cg.emit("cmp rax, 0");
            cg.emit("setne al");
            cg.emit("movzx rax, al");
        }
        BinOp::Or => {
            cg.emit("or rax, r11");
            cg.emit("cmp rax, 0");
            cg.emit("setne al");
            cg.emit("movzx rax, al");
        }
    }
}

/// The immediate-operand fast path recovered from the original's
/// `codegen.c` (SPEC_FULL.md §4.3): when the right operand is an integer
/// literal and the result is `INT`, the operator is emitted directly
/// against the accumulator, skipping the push/pop dance. Returns `None`
/// (falling back to the general path) for operators with no safe immediate
/// form, namely division and modulo.
fn gen_immediate_binary(cg: &mut CodeGen, op: BinOp, left: &Expr, n: i64) -> Option<()> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Eq | BinOp::Lt | BinOp::Gt => {
            gen_expr(cg, left);
            match op {
                BinOp::Add => cg.emit(&format!("add rax, {n}")),
                BinOp::Sub => cg.emit(&format!("sub rax, {n}")),
                BinOp::Mul => cg.emit(&format!("imul rax, rax, {n}")),
                BinOp::Eq | BinOp::Lt | BinOp::Gt => {
                    cg.emit(&format!("cmp rax, {n}"));
                    emit_setcc(cg, op);
                }
                _ => unreachable!(),
            }
            Some(())
        }
        _ => None,
    }
}

fn emit_setcc(cg: &mut CodeGen, op: BinOp) {
    let set = match op {
        BinOp::Eq => "sete",
        BinOp::NotEq => "setne",
        BinOp::Lt => "setl",
        BinOp::Gt => "setg",
        BinOp::LtEq => "setle",
        BinOp::GtEq => "setge",
        _ => unreachable!("emit_setcc called with non-comparison op"),
    };
    cg.emit(&format!("{set} al"));
    cg.emit("movzx rax, al");
}

fn gen_decimal_binary(cg: &mut CodeGen, op: BinOp, left: &Expr, right: &Expr) {
    gen_expr(cg, left);
    promote_to_dec_if_needed(cg, left);
    cg.emit("sub rsp, 8");
    cg.emit("movsd [rsp], xmm0");
    gen_expr(cg, right);
    promote_to_dec_if_needed(cg, right);
    cg.emit("movsd xmm1, xmm0");
    cg.emit("movsd xmm0, [rsp]");
    cg.emit("add rsp, 8");
    match op {
        BinOp::Add => cg.emit("addsd xmm0, xmm1"),
        BinOp::Sub => cg.emit("subsd xmm0, xmm1"),
        BinOp::Mul => cg.emit("mulsd xmm0, xmm1"),
        BinOp::Div => cg.emit("divsd xmm0, xmm1"),
        BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
            cg.emit("comisd xmm0, xmm1");
            let set = match op {
                BinOp::Eq => "sete",
                BinOp::NotEq => "setne",
                BinOp::Lt => "setb",
                BinOp::Gt => "seta",
                BinOp::LtEq => "setbe",
                BinOp::GtEq => "setae",
                _ => unreachable!(),
            };
            cg.emit(&format!("{set} al"));
            cg.emit("movzx rax, al");
        }
        BinOp::And | BinOp::Or => cg.error("logical operator applied to decimal operands"),
    }
}

pub(super) fn promote_to_dec_if_needed(cg: &mut CodeGen, operand: &Expr) {
    if expr_type(cg, operand) != Type::Dec {
        cg.emit("cvtsi2sd xmm0, rax");
    }
}
