use crate::ast::{BinOp, Expr, FunctionDef, Item, LValue, Program, Stmt, StructDef, Type};
use crate::error::CodegenError;

use super::builtins::gen_call_stmt;
use super::expr::{emit_bounds_check, expr_custom_type_name, expr_type, gen_expr};
use super::state::{CodeGen, StructField, StructInfo};

/// Runs the full pipeline: registers struct layouts, emits every function,
/// then the synthetic `main`, and returns the complete assembly text
/// (header + `.rodata` + `.text`), along with any diagnostics recorded
/// along the way.
pub fn generate(program: &Program) -> (String, Vec<CodegenError>) {
    let mut cg = CodeGen::new();

    for item in &program.items {
        if let Item::StructDef(def) = item {
            register_struct(&mut cg, def);
        }
    }

    for item in &program.items {
        if let Item::FunctionDef(func) = item {
            gen_function(&mut cg, func);
        }
    }
    gen_synthetic_main(&mut cg, program);

    let asm = assemble(&cg);
    (asm, cg.diagnostics)
}

fn register_struct(cg: &mut CodeGen, def: &StructDef) {
    let fields = def
        .fields
        .iter()
        .map(|f| StructField {
            name: f.name.clone(),
            ty: f.ty,
            custom_type_name: f.custom_type_name.clone(),
        })
        .collect();
    cg.register_struct(StructInfo {
        name: def.name.clone(),
        fields,
    });
}

fn gen_function(cg: &mut CodeGen, func: &FunctionDef) {
    cg.current_function = func.name.clone();
    cg.reset_function_locals();
    cg.emit_raw(&format!(".global {}", func.name));
    cg.emit_raw(&format!("{}:", func.name));
    cg.emit("push rbp");
    cg.emit("mov rbp, rsp");
    for reg in super::state::REG_POOL {
        cg.emit(&format!("push {reg}"));
    }

    // Parameters are never register-promoted (matching the original: every
    // parameter is bound to a stack slot at a sequential offset, even
    // though an INT/BOOL parameter would otherwise qualify for the pool).
    const ARG_REGS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];
    for (i, param) in func.params.iter().enumerate() {
        cg.stack_pointer += 8;
        let offset = cg.stack_pointer;
        cg.emit("sub rsp, 8");
        if i < ARG_REGS.len() {
            cg.emit(&format!("mov [rbp - {offset}], {}", ARG_REGS[i]));
        }
        cg.locals.push(super::state::LocalVar {
            name: param.name.clone(),
            offset,
            ty: param.ty,
            array_size: 1,
            reg: None,
            custom_type_name: param.custom_type_name.clone(),
        });
    }

    for stmt in &func.body {
        gen_statement(cg, stmt);
    }

    emit_epilogue(cg);
}

/// Restores the five pool registers from their fixed prologue slots and
/// returns. The original pops them straight off the live `rsp`, which is
/// only correct when nothing has touched the stack since the prologue; any
/// non-register-promoted local (`sub rsp, N`) between entry and a `return`
/// leaves `rsp` deeper than the save area, so those `pop`s read stale local
/// data instead of the saved registers and hand the caller garbage in
/// `rbx`/`r12`..`r15`. Resetting `rsp` to the fixed `rbp`-relative save slot
/// first closes that gap regardless of how much stack the function used.
fn emit_epilogue(cg: &mut CodeGen) {
    let reg_area = 8 * super::state::REG_POOL.len() as i32;
    cg.emit(&format!("lea rsp, [rbp - {reg_area}]"));
    for reg in super::state::REG_POOL.iter().rev() {
        cg.emit(&format!("pop {reg}"));
    }
    cg.emit("leave");
    cg.emit("ret");
}

/// All top-level statements, in declaration order, excluding
/// `FunctionDef`/`Import`/`StructDef` items, collected into a synthetic
/// `main` that always returns 0 — matching the original's `gen_main`
/// exactly, including the unconditional zero return regardless of any
/// top-level `return` statement.
fn gen_synthetic_main(cg: &mut CodeGen, program: &Program) {
    cg.current_function = "main".to_string();
    cg.reset_function_locals();
    cg.emit_raw(".global main");
    cg.emit_raw("main:");
    cg.emit("push rbp");
    cg.emit("mov rbp, rsp");
    for reg in super::state::REG_POOL {
        cg.emit(&format!("push {reg}"));
    }

    for item in &program.items {
        if let Item::TopStmt(stmt) = item {
            gen_statement(cg, stmt);
        }
    }

    cg.emit("mov rax, 0");
    emit_epilogue(cg);
}

fn gen_statement(cg: &mut CodeGen, stmt: &Stmt) {
    match stmt {
        Stmt::VarDecl {
            name,
            ty,
            custom_type_name,
            array_size,
            init,
            ..
        } => gen_var_decl(cg, name, *ty, custom_type_name.clone(), *array_size, init.as_ref()),
        Stmt::Assign { target, value, .. } => gen_assign(cg, target, value),
        Stmt::Expr(Expr::Call { callee, args, line }) => gen_call_stmt(cg, callee, args, *line),
        Stmt::Expr(expr) => gen_expr(cg, expr),
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => gen_if(cg, cond, then_body, else_body),
        Stmt::While { cond, body } => gen_while(cg, cond, body),
        Stmt::For {
            var,
            start,
            end,
            body,
        } => gen_for(cg, var, start, end, body),
        Stmt::Match { target, cases } => gen_match(cg, target, cases),
        Stmt::Return(expr) => {
            if let Some(expr) = expr {
                gen_expr(cg, expr);
            }
            emit_epilogue(cg);
        }
        Stmt::Break => {
            if let Some((_, end)) = cg.loop_labels.last().cloned() {
                cg.emit(&format!("jmp {end}"));
            } else {
                cg.error("break outside of a loop");
            }
        }
        Stmt::Continue => {
            if let Some((test, _)) = cg.loop_labels.last().cloned() {
                cg.emit(&format!("jmp {test}"));
            } else {
                cg.error("continue outside of a loop");
            }
        }
    }
}

fn gen_var_decl(
    cg: &mut CodeGen,
    name: &str,
    ty: Type,
    custom_type_name: Option<String>,
    array_size: u32,
    init: Option<&Expr>,
) {
    if let Some(init) = init {
        gen_expr(cg, init);
    }
    let (offset, reg) = cg.declare_local(name, ty, array_size, custom_type_name);
    let size = if array_size > 0 { array_size } else { 1 };

    if init.is_none() {
        return;
    }
    if ty == Type::Dec && size == 1 {
        cg.emit("sub rsp, 8");
        cg.emit(&format!("movsd [rbp - {offset}], xmm0"));
    } else if let Some(reg) = reg {
        cg.emit(&format!("mov {reg}, rax"));
    } else {
        cg.emit(&format!("sub rsp, {}", 8 * size));
        if size == 1 {
            cg.emit(&format!("mov [rbp - {offset}], rax"));
        }
    }
}

fn gen_assign(cg: &mut CodeGen, target: &LValue, value: &Expr) {
    match target {
        LValue::Var(name, _) => gen_assign_var(cg, name, value),
        LValue::Index { base, index, .. } => gen_assign_index(cg, base, index, value),
        LValue::Member { base, member, .. } => gen_assign_member(cg, base, member, value),
    }
}

/// `x = x + literal` / `x = x - literal` peephole: lowers directly to
/// `add`/`sub` on the register or memory slot of `x`, bypassing the
/// general assignment path, exactly as the original does (no special case
/// for literal `1` as inc/dec).
fn try_peephole_self_op(cg: &mut CodeGen, name: &str, value: &Expr) -> bool {
    let Expr::Binary { op, left, right } = value else {
        return false;
    };
    if !matches!(op, BinOp::Add | BinOp::Sub) {
        return false;
    }
    let Expr::Var(left_name, _) = left.as_ref() else {
        return false;
    };
    if left_name != name {
        return false;
    }
    let Expr::Number(n) = right.as_ref() else {
        return false;
    };
    let Some(local) = cg.find_local(name).cloned() else {
        return false;
    };
    let op_mnemonic = if *op == BinOp::Add { "add" } else { "sub" };
    if let Some(reg) = local.reg {
        cg.emit(&format!("{op_mnemonic} {reg}, {n}"));
    } else {
        cg.emit(&format!("{op_mnemonic} qword ptr [rbp - {}], {n}", local.offset));
    }
    true
}

fn gen_assign_var(cg: &mut CodeGen, name: &str, value: &Expr) {
    if try_peephole_self_op(cg, name, value) {
        return;
    }

    gen_expr(cg, value);

    // Inline declaration: an assignment to an undeclared name creates a new
    // local of the RHS's inferred type, participating in the same
    // register-promotion pool as explicitly declared locals.
    if cg.find_local(name).is_none() {
        let ty = expr_type(cg, value);
        let (offset, reg) = cg.declare_local(name, ty, 0, None);
        if ty == Type::Dec {
            cg.emit("sub rsp, 8");
            cg.emit(&format!("movsd [rbp - {offset}], xmm0"));
        } else if let Some(reg) = reg {
            cg.emit(&format!("mov {reg}, rax"));
        } else {
            cg.emit("sub rsp, 8");
            cg.emit(&format!("mov [rbp - {offset}], rax"));
        }
        return;
    }

    let local = cg.find_local(name).cloned().unwrap();
    if let Some(reg) = local.reg {
        cg.emit(&format!("mov {reg}, rax"));
    } else if local.ty == Type::Dec {
        cg.emit(&format!("movsd [rbp - {}], xmm0", local.offset));
    } else {
        cg.emit(&format!("mov [rbp - {}], rax", local.offset));
    }
}

fn gen_assign_index(cg: &mut CodeGen, base: &Expr, index: &Expr, value: &Expr) {
    let Expr::Var(name, _) = base else {
        cg.error("array indexing requires a simple variable base");
        return;
    };
    let Some(local) = cg.find_local(name).cloned() else {
        cg.error(format!("undefined variable {name}"));
        return;
    };
    gen_expr(cg, value);
    cg.emit("push rax");
    gen_expr(cg, index);
    cg.emit("mov r10, rax");
    cg.emit("pop rax");
    emit_bounds_check(cg, local.array_size as i64, "write");
    cg.emit(&format!("mov [rbp - {} - r10 * 8], rax", local.offset));
}

fn gen_assign_member(cg: &mut CodeGen, base: &Expr, member: &str, value: &Expr) {
    gen_expr(cg, value);
    cg.emit("push rax");
    gen_expr(cg, base);
    cg.emit("mov r10, rax"); // struct pointer
    cg.emit("pop rax"); // value

    let Some(struct_name) = expr_custom_type_name(cg, base) else {
        cg.error("could not resolve struct type for member assignment");
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
    cg.emit(&format!("mov [r10 + {offset}], rax"));
}

fn gen_if(cg: &mut CodeGen, cond: &Expr, then_body: &[Stmt], else_body: &[Stmt]) {
    if else_body.is_empty() {
        let end_label = cg.next_label("end");
        gen_cond_jump(cg, cond, &end_label, false);
        for stmt in then_body {
            gen_statement(cg, stmt);
        }
        cg.emit_label(&end_label);
    } else {
        let else_label = cg.next_label("else");
        let end_label = cg.next_label("end");
        gen_cond_jump(cg, cond, &else_label, false);
        for stmt in then_body {
            gen_statement(cg, stmt);
        }
        cg.emit(&format!("jmp {end_label}"));
        cg.emit_label(&else_label);
        for stmt in else_body {
            gen_statement(cg, stmt);
        }
        cg.emit_label(&end_label);
    }
}

fn gen_while(cg: &mut CodeGen, cond: &Expr, body: &[Stmt]) {
    let body_label = cg.next_label("while_body");
    let test_label = cg.next_label("while_test");
    let end_label = cg.next_label("while_end");

    cg.emit(&format!("jmp {test_label}"));
    cg.emit_label(&body_label);
    cg.loop_labels.push((test_label.clone(), end_label.clone()));
    for stmt in body {
        gen_statement(cg, stmt);
    }
    cg.loop_labels.pop();
    cg.emit_label(&test_label);
    gen_cond_jump(cg, cond, &body_label, true);
    cg.emit_label(&end_label);
}

/// `for i in A..B { body }` — inclusive on both ends; `B` is recomputed
/// every iteration, matching the emitted code in the original (not hoisted
/// to a loop-invariant temporary).
fn gen_for(cg: &mut CodeGen, var: &str, start: &Expr, end: &Expr, body: &[Stmt]) {
    gen_expr(cg, start);
    let (offset, reg) = cg.declare_local(var, Type::Int, 0, None);
    if let Some(reg) = reg {
        cg.emit(&format!("mov {reg}, rax"));
    } else {
        cg.emit("sub rsp, 8");
        cg.emit(&format!("mov [rbp - {offset}], rax"));
    }

    let body_label = cg.next_label("for_body");
    let test_label = cg.next_label("for_test");
    let end_label = cg.next_label("for_end");

    cg.emit(&format!("jmp {test_label}"));
    cg.emit_label(&body_label);
    cg.loop_labels.push((test_label.clone(), end_label.clone()));
    for stmt in body {
        gen_statement(cg, stmt);
    }
    cg.loop_labels.pop();

    // i = i + 1
    if let Some(reg) = reg {
        cg.emit(&format!("add {reg}, 1"));
    } else {
        cg.emit(&format!("add qword ptr [rbp - {offset}], 1"));
    }

    cg.emit_label(&test_label);
    if let Some(reg) = reg {
        cg.emit(&format!("mov rax, {reg}"));
    } else {
        cg.emit(&format!("mov rax, [rbp - {offset}]"));
    }
    cg.emit("push rax");
    gen_expr(cg, end);
    cg.emit("mov r11, rax");
    cg.emit("pop rax");
    cg.emit("cmp rax, r11");
    cg.emit(&format!("jle {body_label}"));
    cg.emit_label(&end_label);
}

/// `match` has no codegen path in the original (SPEC_FULL.md §4.3, §9);
/// lowered here to a chain of equality comparisons against the target,
/// evaluated once, with the wildcard (if present) as the final
/// unconditional fallthrough.
fn gen_match(cg: &mut CodeGen, target: &Expr, cases: &[crate::ast::MatchCase]) {
    gen_expr(cg, target);
    let (offset, reg) = cg.declare_local("$match_target", Type::Int, 0, None);
    if let Some(reg) = reg {
        cg.emit(&format!("mov {reg}, rax"));
    } else {
        cg.emit("sub rsp, 8");
        cg.emit(&format!("mov [rbp - {offset}], rax"));
    }

    let end_label = cg.next_label("match_end");
    for case in cases {
        match &case.label {
            Some(label_expr) => {
                let next_label = cg.next_label("match_case");
                if let Some(reg) = reg {
                    cg.emit(&format!("mov rax, {reg}"));
                } else {
                    cg.emit(&format!("mov rax, [rbp - {offset}]"));
                }
                cg.emit("push rax");
                gen_expr(cg, label_expr);
                cg.emit("mov r11, rax");
                cg.emit("pop rax");
                cg.emit("cmp rax, r11");
                cg.emit(&format!("jne {next_label}"));
                for stmt in &case.body {
                    gen_statement(cg, stmt);
                }
                cg.emit(&format!("jmp {end_label}"));
                cg.emit_label(&next_label);
            }
            None => {
                for stmt in &case.body {
                    gen_statement(cg, stmt);
                }
            }
        }
    }
    cg.emit_label(&end_label);
}

fn gen_cond_jump(cg: &mut CodeGen, cond: &Expr, label: &str, jump_if_true: bool) {
    if let Expr::Binary { op, left, right } = cond {
        if matches!(op, BinOp::Lt | BinOp::Gt | BinOp::Eq | BinOp::NotEq | BinOp::LtEq | BinOp::GtEq) {
            gen_expr(cg, left);
            cg.emit("push rax");
            gen_expr(cg, right);
            cg.emit("mov r11, rax");
            cg.emit("pop rax");
            cg.emit("cmp rax, r11");
            let jmp = match (op, jump_if_true) {
                (BinOp::Lt, true) => "jl",
                (BinOp::Lt, false) => "jge",
                (BinOp::Gt, true) => "jg",
                (BinOp::Gt, false) => "jle",
                (BinOp::Eq, true) => "je",
                (BinOp::Eq, false) => "jne",
                (BinOp::NotEq, true) => "jne",
                (BinOp::NotEq, false) => "je",
                (BinOp::LtEq, true) => "jle",
                (BinOp::LtEq, false) => "jg",
                (BinOp::GtEq, true) => "jge",
                (BinOp::GtEq, false) => "jl",
                _ => unreachable!(),
            };
            cg.emit(&format!("{jmp} {label}"));
            return;
        }
    }
    gen_expr(cg, cond);
    cg.emit("cmp rax, 0");
    if jump_if_true {
        cg.emit(&format!("jne {label}"));
    } else {
        cg.emit(&format!("je {label}"));
    }
}

fn assemble(cg: &CodeGen) -> String {
    let mut out = String::new();
    out.push_str(".intel_syntax noprefix\n");
    for sym in EXTERN_SYMBOLS {
        out.push_str(&format!(".extern {sym}\n"));
    }
    out.push_str(".section .rodata\n");
    for (id, value) in cg.strings.iter().enumerate() {
        out.push_str(&format!("str_{id}: .asciz \""));
        for c in value.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                other => out.push(other),
            }
        }
        out.push_str("\"\n");
    }
    for (id, value) in cg.doubles.iter().enumerate() {
        out.push_str(&format!("dec_const_{id}: .double {value:?}\n"));
    }
    out.push_str(".section .text\n");
    out.push_str(&cg.text);
    out
}

/// Every external symbol the emitted assembly may reference: the C library
/// functions the builtins use directly, plus the `vyl_*` runtime symbols
/// (SPEC_FULL.md §4.4, §6).
const EXTERN_SYMBOLS: &[&str] = &[
    "printf", "clock", "system", "sqrt", "sin", "cos", "tan", "fabs", "floor", "ceil", "pow",
    "strcmp", "fopen", "fclose", "fputs", "strlen", "strcpy", "strcat", "strncpy", "malloc",
    "access", "mkdir", "exit",
    "vyl_read_file", "vyl_readline_file", "vyl_filesize", "vyl_stringsplit",
    "vyl_free_string_array", "vyl_string_concat", "vyl_substring", "vyl_panic", "vyl_error", "vyl_to_int",
    "vyl_to_string_int", "vyl_to_string_dec", "vyl_to_decimal", "vyl_free_ptr", "vyl_array_len",
    "vyl_list_new", "vyl_list_append", "vyl_list_len", "vyl_list_get", "vyl_list_set",
    "vyl_list_free", "vyl_dict_new", "vyl_dict_set", "vyl_dict_set_string", "vyl_dict_set_int",
    "vyl_dict_set_typed", "vyl_dict_get", "vyl_dict_get_type", "vyl_dict_free",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn compile(src: &str) -> (String, Vec<CodegenError>) {
        let program = crate::parser::parse_file(src, Path::new("test.vyl")).unwrap();
        generate(&program)
    }

    #[test]
    fn register_promotion_bound_is_five() {
        let (asm, diags) = compile(
            "Main() { var int a = 1; var int b = 2; var int c = 3; var int d = 4; \
             var int e = 5; var int f = 6; Print(a + b + c + d + e + f) }",
        );
        assert!(diags.is_empty());
        for reg in super::super::state::REG_POOL {
            assert!(asm.contains(&format!("mov {reg}, rax")), "expected {reg} to be used");
        }
    }

    #[test]
    fn register_promotion_skips_non_promotable_locals() {
        // A string local declared before any INT/BOOL scalars must not
        // consume a pool-register slot: the first INT/BOOL scalar still
        // gets `REG_POOL[0]` (rbx), not `REG_POOL[1]`.
        let (asm, diags) = compile(
            r#"Main() { var string s = "x"; var int a = 1; Print(a) }"#,
        );
        assert!(diags.is_empty());
        assert!(asm.contains("mov rbx, rax"), "expected the first INT scalar to bind rbx:\n{asm}");
    }

    #[test]
    fn main_emits_exactly_one_main_symbol() {
        // Regression: `Main() { .. }` used to parse into its own
        // `FunctionDef("main")` *as well as* the always-on synthetic `main`,
        // producing two `.global main` / `main:` pairs — a duplicate-symbol
        // assembler failure. Every `Main()` program must emit exactly one.
        let (asm, diags) = compile("Main() { Print(1) }");
        assert!(diags.is_empty());
        assert_eq!(asm.matches(".global main").count(), 1, "asm:\n{asm}");
        assert_eq!(asm.matches("\nmain:\n").count(), 1, "asm:\n{asm}");
    }

    #[test]
    fn locals_are_placed_below_the_register_save_area() {
        // Regression: a first non-promotable local (here, a string) used to
        // land at `rbp-8`, the first saved-register slot, so `emit_epilogue`
        // restored garbage into the caller's rbx/r12..r15. The save area is
        // `REG_POOL.len() * 8` == 40 bytes, so the first local must sit at
        // `rbp-48` or deeper, never inside `rbp-8..=rbp-40`.
        let (asm, diags) = compile(r#"Main() { var string s = "x"; Print(s) }"#);
        assert!(diags.is_empty());
        for n in (8..=40).step_by(8) {
            assert!(
                !asm.contains(&format!("[rbp - {n}]")),
                "local overlaps register save area at rbp-{n}:\n{asm}"
            );
        }
    }

    #[test]
    fn array_reads_are_bounds_checked_like_writes() {
        let (asm, _) = compile("Main() { var int[3] xs; Print(xs[0]) }");
        let read_checks = asm.matches("index out of bounds (read)").count();
        assert_eq!(read_checks, 1);
    }

    #[test]
    fn self_add_peephole_emits_add_not_general_path() {
        let (asm, _) = compile("Main() { var int x = 0; x = x + 1; Print(x) }");
        assert!(asm.contains("add rbx, 1") || asm.contains("add qword ptr"));
    }

    #[test]
    fn synthetic_main_always_returns_zero() {
        let (asm, _) = compile("Main() { return }");
        assert!(asm.contains("mov rax, 0"));
    }

    #[test]
    fn match_lowers_to_compare_chain() {
        let (asm, diags) = compile("Main() { match 1 { 1 => { Print(1) } _ => { Print(0) } } }");
        assert!(diags.is_empty());
        assert!(asm.contains("cmp rax, r11"));
    }

    #[test]
    fn interning_is_shared_across_sites() {
        let (asm, _) = compile(r#"Main() { Print("hi"); Print("hi") }"#);
        assert_eq!(asm.matches("str_").count() - asm.matches("str_0:").count() * 0, asm.matches("str_").count());
        // both call sites reference the same interned id
        let hi_id_occurrences = asm.matches("str_1").count() + asm.matches("str_0").count();
        assert!(hi_id_occurrences >= 2);
    }
}
