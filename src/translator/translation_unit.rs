use crate::backends::bytecode::reader::{BytecodeError, disassemble};
use crate::compiler_frontend::dialect::ShaderStage;
use crate::compiler_frontend::hir::hir_nodes::HirModule;
use crate::compiler_frontend::symbols::{Function, Structure, Variable};
use crate::settings::GLOBAL_INIT_LABEL;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt::Write;

/// Everything one successful parse produced, apart from the bytecode itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TranslationUnit {
    pub stage: Option<ShaderStage>,
    pub entry_point: String,

    /// Stage inputs and outputs. Global index `i` is `builtins[i]`,
    /// user globals follow at `builtins.len() + i`.
    pub builtins: Vec<Variable>,
    pub globals: Vec<Variable>,
    pub structures: Vec<Structure>,
    pub functions: Vec<Function>,

    /// Function name to body locals, only for functions that declare any
    pub locals: FxHashMap<String, Vec<String>>,

    /// Routine that runs the global initialisers, called before the entry point
    pub global_init_address: usize,
}

impl TranslationUnit {
    pub(crate) fn from_module(
        module: HirModule,
        stage: ShaderStage,
        entry_point: &str,
        global_init_address: usize,
    ) -> Self {
        let mut locals = FxHashMap::default();
        let mut functions = Vec::with_capacity(module.functions.len());

        for function in module.functions {
            if !function.locals.is_empty() {
                locals.insert(function.signature.name.clone(), function.locals);
            }
            functions.push(function.signature);
        }

        TranslationUnit {
            stage: Some(stage),
            entry_point: entry_point.to_string(),
            builtins: module.builtins,
            globals: module.globals.into_iter().map(|global| global.variable).collect(),
            structures: module.structures,
            functions,
            locals,
            global_init_address,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stage.is_none()
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn locals(&self, function: &str) -> Option<&[String]> {
        self.locals.get(function).map(Vec::as_slice)
    }

    /// Address the interpreter starts the entry point at.
    pub fn entry_address(&self) -> Option<usize> {
        self.function(&self.entry_point).map(|function| function.address)
    }

    /// Index of a global in the bytecode's global space, builtins included.
    pub fn global_index(&self, name: &str) -> Option<u32> {
        self.builtins
            .iter()
            .chain(&self.globals)
            .position(|variable| variable.name == name)
            .map(|index| index as u32)
    }

    /// Metadata as JSON for a debugger front end.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Listing of `bytecode` with a label at the start of every function and of the global initialiser.
    pub fn disassemble(&self, bytecode: &[u8]) -> Result<String, BytecodeError> {
        let listing = disassemble(bytecode)?;

        let mut labels: FxHashMap<usize, Vec<String>> = FxHashMap::default();
        for function in &self.functions {
            labels
                .entry(function.address)
                .or_default()
                .push(function.to_string());
        }
        labels
            .entry(self.global_init_address)
            .or_default()
            .push(GLOBAL_INIT_LABEL.to_string());

        let mut text = String::new();
        for entry in &listing.entries {
            if let Some(names) = labels.get(&entry.offset) {
                for name in names {
                    let _ = writeln!(text, "{name}:");
                }
            }
            let _ = writeln!(text, "{:>6}  {}", entry.offset, entry.instruction);
        }

        Ok(text)
    }
}
