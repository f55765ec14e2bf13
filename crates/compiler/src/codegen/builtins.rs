use crate::ast::{Expr, Type};
use crate::error::Line;

use super::expr::{expr_type, gen_expr, promote_to_dec_if_needed};
use super::state::CodeGen;

const ARG_REGS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

/// Friendly names from SPEC_FULL.md §4.3's builtin summary that are not
/// literally their own runtime/libc symbol. `Print` and `Clock` get real
/// dedicated codegen (variadic type-aware formatting, and the
/// `clock`-then-`cvtsi2sd`-then-`divsd` sequence); every other builtin here
/// is just `gen_plain_call` against a different literal name, so a Vyl
/// program can spell the friendly name instead of the exact C symbol the
/// original required callers to know. Anything not listed here (including
/// calls to user-defined functions) falls through unchanged, matching the
/// original's flat `strcmp`-chain-with-literal-fallthrough dispatch.
const DIRECT_SYMBOL_BUILTINS: &[(&str, &str)] = &[
    ("Open", "fopen"),
    ("Close", "fclose"),
    ("Read", "vyl_read_file"),
    ("ReadLine", "vyl_readline_file"),
    ("ReadSize", "vyl_filesize"),
    ("System", "system"),
    ("Exec", "system"),
    ("Exit", "exit"),
    ("Len", "strlen"),
    ("Concat", "vyl_string_concat"),
    ("Substring", "vyl_substring"),
    ("StringCompare", "strcmp"),
    ("StringSplit", "vyl_stringsplit"),
    ("ToInt", "vyl_to_int"),
    ("ToDecimal", "vyl_to_decimal"),
    ("Free", "vyl_free_ptr"),
];

/// One- or two-argument libm wrappers (SPEC_FULL.md §4.3's "Sqrt/Sin/Cos/
/// Tan/Abs/Floor/Ceil/Power" group): every operand is promoted to a double
/// and passed in `xmm0`/`xmm1` rather than the integer argument registers,
/// with the result coming back in `xmm0`. `Abs` and `Power` are spelled
/// differently from the libc symbols they wrap.
const MATH_BUILTINS: &[(&str, &str)] = &[
    ("Sqrt", "sqrt"),
    ("Sin", "sin"),
    ("Cos", "cos"),
    ("Tan", "tan"),
    ("Abs", "fabs"),
    ("Floor", "floor"),
    ("Ceil", "ceil"),
    ("Power", "pow"),
];

pub fn gen_call(cg: &mut CodeGen, callee: &str, args: &[Expr], _as_expr: bool) {
    if let Some(&(_, symbol)) = MATH_BUILTINS.iter().find(|(name, _)| *name == callee) {
        gen_math_call(cg, symbol, args);
        return;
    }
    match callee {
        "Print" => gen_print(cg, args),
        "Clock" => gen_clock(cg),
        "ArrayLen" => gen_array_len(cg, args),
        "ToString" => gen_to_string(cg, args),
        "Exists" => gen_call_with_trailing_literal(cg, "access", args, 0),
        "CreateFolder" => gen_call_with_trailing_literal(cg, "mkdir", args, 0o777),
        "Write" => gen_write(cg, args),
        _ => {
            let symbol = DIRECT_SYMBOL_BUILTINS
                .iter()
                .find(|(name, _)| *name == callee)
                .map_or(callee, |&(_, symbol)| symbol);
            gen_plain_call(cg, symbol, args);
        }
    }
}

/// Statement-position call: identical to expression-position except it
/// never needs the result, matching `gen_statement`'s `NODE_CALL` handling
/// in the original (which special-cases `Print`/`Clock` directly rather
/// than routing through `gen_expr`).
pub fn gen_call_stmt(cg: &mut CodeGen, callee: &str, args: &[Expr], _line: Line) {
    gen_call(cg, callee, args, false);
}

fn gen_print(cg: &mut CodeGen, args: &[Expr]) {
    for arg in args {
        if matches!(arg, Expr::NewlineLiteral) {
            let id = cg.intern_string("\n");
            cg.emit(&format!("lea rdi, [rip + str_{id}]"));
            cg.emit("xor eax, eax");
            cg.emit("call printf@plt");
            continue;
        }
        let ty = expr_type(cg, arg);
        gen_expr(cg, arg);
        match ty {
            Type::Str => {
                let fmt_id = cg.intern_string("%s ");
                cg.emit("mov rsi, rax");
                cg.emit(&format!("lea rdi, [rip + str_{fmt_id}]"));
                cg.emit("xor eax, eax");
                cg.emit("call printf@plt");
            }
            Type::Bool => {
                let fmt_id = cg.intern_string("%s ");
                let true_id = cg.intern_string("true");
                let false_id = cg.intern_string("false");
                let true_label = cg.next_label("print_bool_true");
                let done_label = cg.next_label("print_bool_done");
                cg.emit("cmp rax, 0");
                cg.emit(&format!("jne {true_label}"));
                cg.emit(&format!("lea rsi, [rip + str_{false_id}]"));
                cg.emit(&format!("jmp {done_label}"));
                cg.emit_label(&true_label);
                cg.emit(&format!("lea rsi, [rip + str_{true_id}]"));
                cg.emit_label(&done_label);
                cg.emit(&format!("lea rdi, [rip + str_{fmt_id}]"));
                cg.emit("xor eax, eax");
                cg.emit("call printf@plt");
            }
            Type::Dec => {
                let fmt_id = cg.intern_string("%.6g ");
                cg.emit(&format!("lea rdi, [rip + str_{fmt_id}]"));
                cg.emit("mov eax, 1");
                cg.emit("call printf@plt");
            }
            Type::Int | Type::Custom => {
                let fmt_id = cg.intern_string("%d ");
                cg.emit("mov rsi, rax");
                cg.emit(&format!("lea rdi, [rip + str_{fmt_id}]"));
                cg.emit("xor eax, eax");
                cg.emit("call printf@plt");
            }
        }
    }
    let nl_id = cg.intern_string("\n");
    cg.emit(&format!("lea rdi, [rip + str_{nl_id}]"));
    cg.emit("xor eax, eax");
    cg.emit("call printf@plt");
}

fn gen_clock(cg: &mut CodeGen) {
    cg.emit("call clock@plt");
    cg.emit("cvtsi2sd xmm0, rax");
    let id = cg.intern_double(1_000_000.0);
    cg.emit(&format!("divsd xmm0, [rip + dec_const_{id}]"));
}

/// `ArrayLen(x)` resolves at compile time to the declared size of `x` when
/// `x` is a simple variable (SPEC_FULL.md §4.3), avoiding a call entirely;
/// any other argument shape falls back to the runtime helper, which always
/// answers -1 since a bare pointer carries no length header.
fn gen_array_len(cg: &mut CodeGen, args: &[Expr]) {
    if let [Expr::Var(name, _)] = args {
        if let Some(local) = cg.find_local(name) {
            let size = local.array_size;
            cg.emit(&format!("mov rax, {size}"));
            return;
        }
    }
    gen_plain_call(cg, "vyl_array_len", args);
}

/// `ToString(x)` dispatches on `x`'s static type to the matching runtime
/// formatter, since `vyl_to_string_int` and `vyl_to_string_dec` take their
/// argument in different register classes (integer vs. `xmm0`).
fn gen_to_string(cg: &mut CodeGen, args: &[Expr]) {
    let [arg] = args else {
        cg.error("ToString expects exactly one argument");
        return;
    };
    if expr_type(cg, arg) == Type::Dec {
        gen_expr(cg, arg);
        promote_to_dec_if_needed(cg, arg);
        cg.emit("call vyl_to_string_dec");
    } else {
        gen_plain_call(cg, "vyl_to_string_int", args);
    }
}

/// `Exists(path)` / `CreateFolder(path)` take one Vyl-level argument but
/// their C counterparts (`access`, `mkdir`) take two; the second is a fixed
/// constant (`F_OK` = 0, or mode `0777`) that the Vyl surface never
/// specifies, so it is appended here rather than exposed to the caller.
fn gen_call_with_trailing_literal(cg: &mut CodeGen, symbol: &str, args: &[Expr], literal: i64) {
    let [path] = args else {
        cg.error(format!("{symbol} expects exactly one argument"));
        return;
    };
    gen_expr(cg, path);
    cg.emit("mov rdi, rax");
    cg.emit(&format!("mov rsi, {literal}"));
    cg.emit(&format!("call {symbol}"));
}

/// `Write(file, text)` mirrors `Open`/`Close`'s file-handle-first argument
/// order, but `fputs`'s C signature takes the string first and the stream
/// second, so the two evaluated operands are swapped into place rather than
/// handed to `gen_plain_call` in source order.
fn gen_write(cg: &mut CodeGen, args: &[Expr]) {
    let [file, text] = args else {
        cg.error("Write expects exactly two arguments (file, text)");
        return;
    };
    gen_expr(cg, file);
    cg.emit("push rax");
    gen_expr(cg, text);
    cg.emit("mov rdi, rax");
    cg.emit("pop rsi");
    cg.emit("call fputs");
}

/// Evaluates a one- or two-argument libm call, promoting each operand to a
/// double and passing it in `xmm0`/`xmm1` (System V's floating-point
/// argument registers), rather than the integer registers `gen_plain_call`
/// uses.
fn gen_math_call(cg: &mut CodeGen, symbol: &str, args: &[Expr]) {
    match args {
        [a] => {
            gen_expr(cg, a);
            promote_to_dec_if_needed(cg, a);
            cg.emit(&format!("call {symbol}"));
        }
        [a, b] => {
            gen_expr(cg, a);
            promote_to_dec_if_needed(cg, a);
            cg.emit("sub rsp, 8");
            cg.emit("movsd [rsp], xmm0");
            gen_expr(cg, b);
            promote_to_dec_if_needed(cg, b);
            cg.emit("movsd xmm1, xmm0");
            cg.emit("movsd xmm0, [rsp]");
            cg.emit("add rsp, 8");
            cg.emit(&format!("call {symbol}"));
        }
        _ => cg.error(format!("{symbol} expects one or two arguments")),
    }
}

/// Evaluates arguments left to right into a contiguous stack buffer (slot
/// `i` at `[rsp + 8*i]`), then loads the first six slots into the integer
/// argument registers and, if there are more than six arguments, drops the
/// register-arg slots so the remaining slots land exactly where the System
/// V stack-argument convention expects them (slot 6 at `[rsp + 0]` once the
/// register slots are gone, slot 7 at `[rsp + 8]`, and so on). The original
/// generator silently discarded the seventh-and-beyond argument instead
/// (SPEC_FULL.md §4.3 / §9); this spills them per the ABI.
fn gen_plain_call(cg: &mut CodeGen, callee: &str, args: &[Expr]) {
    let n = args.len();
    if n == 0 {
        cg.emit(&format!("call {callee}"));
        return;
    }

    let raw_size = n * 8;
    let padded_size = raw_size.div_ceil(16) * 16;
    cg.emit(&format!("sub rsp, {padded_size}"));
    for (i, arg) in args.iter().enumerate() {
        gen_expr(cg, arg);
        cg.emit(&format!("mov [rsp + {}], rax", i * 8));
    }

    let reg_count = n.min(ARG_REGS.len());
    for (i, reg) in ARG_REGS.iter().enumerate().take(reg_count) {
        cg.emit(&format!("mov {reg}, [rsp + {}]", i * 8));
    }

    let register_bytes = reg_count * 8;
    if register_bytes > 0 {
        cg.emit(&format!("add rsp, {register_bytes}"));
    }
    cg.emit(&format!("call {callee}"));
    let remaining = padded_size - register_bytes;
    if remaining > 0 {
        cg.emit(&format!("add rsp, {remaining}"));
    }
}
