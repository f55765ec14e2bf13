use std::collections::HashMap;
use std::fmt::Write as _;

use crate::ast::Type;
use crate::error::CodegenError;

/// The five callee-saved registers available for local-variable promotion,
/// in assignment order. Exactly five, exactly these registers: the
/// "first five INT/BOOL scalars in declaration order" invariant is a
/// testable property (SPEC_FULL.md §8) and must not be changed.
pub const REG_POOL: [&str; 5] = ["rbx", "r12", "r13", "r14", "r15"];

pub const MAX_LOCALS: usize = 64;
pub const MAX_STRUCTS: usize = 32;

#[derive(Debug, Clone)]
pub struct LocalVar {
    pub name: String,
    pub offset: i32,
    pub ty: Type,
    pub array_size: u32,
    pub reg: Option<&'static str>,
    pub custom_type_name: Option<String>,
}

/// A struct field descriptor carried all the way into codegen, including
/// its type. The original's `StructInfo` only stores field *names*; this
/// reimplementation also stores each field's type (tag + optional custom
/// name) so member-access chains through nested structs resolve (closes the
/// gap noted in SPEC_FULL.md §3/§9).
#[derive(Debug, Clone)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub custom_type_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StructInfo {
    pub name: String,
    pub fields: Vec<StructField>,
}

impl StructInfo {
    pub fn field_offset(&self, name: &str) -> Option<i32> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|i| (i as i32) * 8)
    }

    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Per-function code generator state. Interned constant tables and the
/// struct layout table are scoped to the `CodeGen` instance rather than
/// module-global singletons (SPEC_FULL.md §9), so a caller can run several
/// independent compilations without any shared mutable state.
pub struct CodeGen {
    pub text: String,
    pub strings: Vec<String>,
    string_ids: HashMap<String, usize>,
    pub doubles: Vec<f64>,
    double_ids: HashMap<u64, usize>,
    pub locals: Vec<LocalVar>,
    pub stack_pointer: i32,
    pub structs: Vec<StructInfo>,
    pub label_counter: u32,
    /// (test_label, end_label) stack for the enclosing loop(s), used by
    /// `break`/`continue`.
    pub loop_labels: Vec<(String, String)>,
    pub diagnostics: Vec<CodegenError>,
    pub current_function: String,
    /// Count of INT/BOOL scalar locals declared so far in the current
    /// function, independent of how many non-promotable locals (strings,
    /// arrays, structs) were declared alongside them. Indexes `REG_POOL`
    /// directly, so the first INT/BOOL scalar always lands in `REG_POOL[0]`
    /// regardless of what was declared before it.
    promotable_count: usize,
}

impl CodeGen {
    pub fn new() -> Self {
        CodeGen {
            text: String::new(),
            strings: Vec::new(),
            string_ids: HashMap::new(),
            doubles: Vec::new(),
            double_ids: HashMap::new(),
            locals: Vec::new(),
            stack_pointer: 0,
            structs: Vec::new(),
            label_counter: 0,
            loop_labels: Vec::new(),
            diagnostics: Vec::new(),
            current_function: "<module>".to_string(),
            promotable_count: 0,
        }
    }

    pub fn emit(&mut self, line: &str) {
        self.text.push_str("    ");
        self.text.push_str(line);
        self.text.push('\n');
    }

    pub fn emit_label(&mut self, label: &str) {
        let _ = writeln!(self.text, "{label}:");
    }

    pub fn emit_raw(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    pub fn next_label(&mut self, prefix: &str) -> String {
        let id = self.label_counter;
        self.label_counter += 1;
        format!(".L{prefix}{id}")
    }

    pub fn intern_string(&mut self, value: &str) -> usize {
        if let Some(&id) = self.string_ids.get(value) {
            return id;
        }
        let id = self.strings.len();
        self.strings.push(value.to_string());
        self.string_ids.insert(value.to_string(), id);
        id
    }

    pub fn intern_double(&mut self, value: f64) -> usize {
        let key = value.to_bits();
        if let Some(&id) = self.double_ids.get(&key) {
            return id;
        }
        let id = self.doubles.len();
        self.doubles.push(value);
        self.double_ids.insert(key, id);
        id
    }

    /// Resets per-function state. `stack_pointer` starts at the size of the
    /// callee-saved register save area (`REG_POOL.len() * 8` bytes, living
    /// at `[rbp-8 .. rbp-40]` per the prologue's `push` sequence) rather than
    /// 0, so the first local/parameter slot falls at `rbp-48` and below
    /// instead of overlapping the saved registers `emit_epilogue` later
    /// restores.
    pub fn reset_function_locals(&mut self) {
        self.locals.clear();
        self.stack_pointer = 8 * REG_POOL.len() as i32;
        self.promotable_count = 0;
    }

    pub fn find_local(&self, name: &str) -> Option<&LocalVar> {
        self.locals.iter().find(|l| l.name == name)
    }

    pub fn struct_info(&self, name: &str) -> Option<&StructInfo> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn register_struct(&mut self, info: StructInfo) {
        if self.structs.len() < MAX_STRUCTS {
            self.structs.push(info);
        } else {
            self.diagnostics.push(CodegenError {
                message: "struct table full (32 entries)".to_string(),
                function: self.current_function.clone(),
            });
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.emit_raw(&format!("    # error: {message}"));
        self.diagnostics.push(CodegenError {
            message,
            function: self.current_function.clone(),
        });
    }

    /// Declares a new local. Allocates a frame slot (and, for a scalar
    /// INT/BOOL local among the first five declared, a pool register),
    /// returning the assigned offset and register, matching
    /// `gen_var_decl`'s allocation order in the original generator.
    pub fn declare_local(
        &mut self,
        name: &str,
        ty: Type,
        array_size: u32,
        custom_type_name: Option<String>,
    ) -> (i32, Option<&'static str>) {
        let size = if array_size > 0 { array_size } else { 1 };
        let allocation = 8 * size as i32;
        self.stack_pointer += allocation;
        let offset = self.stack_pointer - 8 * (size as i32 - 1);

        let reg = if size == 1
            && self.promotable_count < REG_POOL.len()
            && matches!(ty, Type::Int | Type::Bool)
        {
            let reg = REG_POOL[self.promotable_count];
            self.promotable_count += 1;
            Some(reg)
        } else {
            None
        };

        if self.locals.len() < MAX_LOCALS {
            self.locals.push(LocalVar {
                name: name.to_string(),
                offset,
                ty,
                array_size: size,
                reg,
                custom_type_name,
            });
        } else {
            self.error("local variable table full (64 entries)");
        }
        (offset, reg)
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}
