//! Lowers the parsed AST into the typed HIR and fills the symbol registries.
//!
//! Declarations are visited in source order. A name only becomes visible once its
//! declaration has been lowered, which gives the declare-before-use rule of both dialects.
//! Errors are collected per declaration so one bad function doesn't hide problems in the next.

use crate::compiler_frontend::ast::ast_nodes::{
    CBufferDeclaration, Declaration, FunctionDeclaration, ShaderAst, StructDeclaration, TypeName,
    VariableDeclaration,
};
use crate::compiler_frontend::builtins::{Intrinsic, stage_variables};
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
use crate::compiler_frontend::hir::hir_nodes::{
    FunctionId, GlobalId, HirExpression, HirFunction, HirGlobal, HirModule, LocalSlot,
};
use crate::compiler_frontend::string_interning::{StringId, StringTable};
use crate::compiler_frontend::symbols::{
    BufferBinding, Function, Parameter, StorageQualifier, StructMember, Structure, Variable,
};
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::settings::TranslatorConfig;
use crate::{
    hir_log, return_compiler_error, return_duplicate_error, return_rule_error, return_type_error,
    return_unresolved_error,
};
use rustc_hash::FxHashMap;

pub struct HirContext<'a> {
    pub language: ShadingLanguage,
    pub stage: ShaderStage,
    pub config: &'a TranslatorConfig,
    pub string_table: &'a StringTable,
}

pub struct HirBuildOutput {
    pub module: HirModule,
    pub warnings: Vec<CompilerWarning>,
}

/// A parameter or local while its function is being lowered.
pub(crate) struct FrameVariable {
    pub name: String,
    pub data_type: DataType,
    pub read_only: bool,
    pub used: bool,
    pub is_parameter: bool,
    pub location: TextLocation,
}

pub(crate) struct FunctionState {
    pub id: FunctionId,
    pub return_type: DataType,

    /// Indexed by slot, parameters first
    pub frame: Vec<FrameVariable>,
    pub scopes: Vec<FxHashMap<String, LocalSlot>>,
    pub loop_depth: u32,
}

/// What a name in an expression refers to.
pub(crate) enum ResolvedVariable {
    Local(LocalSlot),
    Global(GlobalId),
}

pub struct HirBuilder<'a> {
    pub(crate) context: HirContext<'a>,
    pub(crate) module: HirModule,

    pub(crate) globals_by_name: FxHashMap<String, GlobalId>,
    pub(crate) structs_by_name: FxHashMap<String, usize>,
    pub(crate) functions_by_name: FxHashMap<String, FunctionId>,

    /// Call edges per function, for recursion detection
    pub(crate) call_graph: Vec<Vec<(FunctionId, TextLocation)>>,

    pub(crate) function_state: Option<FunctionState>,

    pub(crate) errors: Vec<CompilerError>,
    pub(crate) warnings: Vec<CompilerWarning>,
}

/// Builds the HIR for a whole translation unit.
pub fn build_hir_module(
    ast: ShaderAst,
    context: HirContext,
) -> Result<HirBuildOutput, CompilerMessages> {
    let max_errors = context.config.max_errors;
    let mut builder = HirBuilder::new(context);

    for declaration in &ast.declarations {
        if builder.errors.len() >= max_errors {
            break;
        }

        let result = match declaration {
            Declaration::Struct(structure) => builder.lower_struct(structure),
            Declaration::Variables(variables) => builder.lower_global_variables(variables),
            Declaration::CBuffer(cbuffer) => builder.lower_cbuffer(cbuffer),
            Declaration::Function(function) => builder.lower_function(function),
        };

        if let Err(error) = result {
            builder.errors.push(error);
            builder.function_state = None;
        }
    }

    // Whole module checks only make sense on a module that lowered cleanly
    if builder.errors.is_empty() {
        builder.validate_module();
    }

    let mut errors = builder.errors;
    if !errors.is_empty() {
        errors.truncate(max_errors);
        return Err(CompilerMessages {
            errors,
            warnings: builder.warnings,
        });
    }

    Ok(HirBuildOutput {
        module: builder.module,
        warnings: builder.warnings,
    })
}

impl<'a> HirBuilder<'a> {
    pub fn new(context: HirContext<'a>) -> Self {
        let builtins = stage_variables(context.language, context.stage);

        let mut globals_by_name = FxHashMap::default();
        for (index, variable) in builtins.iter().enumerate() {
            globals_by_name.insert(variable.name.clone(), GlobalId(index as u32));
        }

        HirBuilder {
            context,
            module: HirModule {
                builtins,
                ..HirModule::default()
            },
            globals_by_name,
            structs_by_name: FxHashMap::default(),
            functions_by_name: FxHashMap::default(),
            call_graph: Vec::new(),
            function_state: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn resolve_name(&self, id: StringId) -> String {
        self.context.string_table.resolve(id).to_string()
    }

    pub(crate) fn warn(&mut self, msg: impl Into<String>, location: TextLocation, kind: WarningKind) {
        if self.context.config.warnings_enabled {
            self.warnings.push(CompilerWarning::new(msg, location, kind));
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Resolves a type name, wrapping it in an array if the declarator had a size.
    pub(crate) fn resolve_type(
        &self,
        type_name: &TypeName,
        array_length: Option<u32>,
    ) -> Result<DataType, CompilerError> {
        let name = self.context.string_table.resolve(type_name.name);

        let element = match self.context.language.builtin_type(name) {
            Some(data_type) => data_type,
            None if self.structs_by_name.contains_key(name) => DataType::Struct(name.to_string()),
            None => {
                return_unresolved_error!(
                    format!("Unknown type '{name}'"),
                    type_name.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        PrimarySuggestion => "Structs must be declared before they are used",
                    }
                )
            }
        };

        match array_length {
            Some(_) if element.is_void() => {
                return_type_error!(
                    "Arrays of 'void' are not allowed",
                    type_name.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                    }
                )
            }
            Some(length) => Ok(DataType::Array(Box::new(element), length)),
            None => Ok(element),
        }
    }

    /// Resolves a type that must hold a value.
    pub(crate) fn resolve_value_type(
        &self,
        type_name: &TypeName,
        array_length: Option<u32>,
        what: &str,
    ) -> Result<DataType, CompilerError> {
        let data_type = self.resolve_type(type_name, array_length)?;
        if data_type.is_void() {
            return_type_error!(
                format!("{what} can't have type 'void'"),
                type_name.location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                    FoundType => "void",
                }
            )
        }

        Ok(data_type)
    }

    pub(crate) fn structure(&self, name: &str) -> Option<&Structure> {
        self.structs_by_name
            .get(name)
            .map(|index| &self.module.structures[*index])
    }

    /// Type spelling in the dialect being translated, for messages.
    pub(crate) fn type_name(&self, data_type: &DataType) -> String {
        self.context.language.type_name(data_type)
    }

    // =========================================================================
    // Names
    // =========================================================================

    /// Checks a new global, struct or function name against everything already in the unit.
    fn check_unit_name(&self, name: &str, location: &TextLocation) -> Result<(), CompilerError> {
        if self.context.language == ShadingLanguage::Glsl && name.starts_with("gl_") {
            return_rule_error!(
                format!("'{name}' uses the reserved 'gl_' prefix"),
                location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                    VariableName => name,
                }
            )
        }

        if self.context.language.builtin_type(name).is_some() {
            return_duplicate_error!(
                format!("'{name}' is already the name of a built-in type"),
                location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                    VariableName => name,
                }
            )
        }

        let existing = if self.structs_by_name.contains_key(name) {
            Some("struct")
        } else if self.globals_by_name.contains_key(name) {
            Some("global variable")
        } else if self.functions_by_name.contains_key(name) {
            Some("function")
        } else {
            None
        };

        if let Some(existing) = existing {
            return_duplicate_error!(
                format!("'{name}' is already declared as a {existing}"),
                location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                    VariableName => name,
                }
            )
        }

        Ok(())
    }

    pub(crate) fn lookup_variable(&mut self, name: &str) -> Option<ResolvedVariable> {
        if let Some(state) = &mut self.function_state {
            for scope in state.scopes.iter().rev() {
                if let Some(slot) = scope.get(name) {
                    let slot = *slot;
                    state.frame[slot.0 as usize].used = true;
                    return Some(ResolvedVariable::Local(slot));
                }
            }
        }

        self.globals_by_name
            .get(name)
            .map(|id| ResolvedVariable::Global(*id))
    }

    /// Innermost local with this name, without marking it used.
    pub(crate) fn local_in_scope(&self, name: &str) -> Option<LocalSlot> {
        let state = self.function_state.as_ref()?;
        state
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub(crate) fn global(&self, id: GlobalId) -> &Variable {
        let index = id.0 as usize;
        match index.checked_sub(self.module.builtins.len()) {
            Some(user_index) => &self.module.globals[user_index].variable,
            None => &self.module.builtins[index],
        }
    }

    pub(crate) fn global_is_read_only(&self, id: GlobalId) -> bool {
        let is_builtin = (id.0 as usize) < self.module.builtins.len();
        let variable = self.global(id);

        match variable.storage {
            Some(StorageQualifier::Const)
            | Some(StorageQualifier::Uniform)
            | Some(StorageQualifier::In)
            | Some(StorageQualifier::Attribute) => true,
            Some(StorageQualifier::Varying) => self.context.stage == ShaderStage::Pixel,
            Some(StorageQualifier::Out)
            | Some(StorageQualifier::Static)
            | Some(StorageQualifier::GroupShared) => false,

            // HLSL globals without a qualifier are uniforms
            None => self.context.language == ShadingLanguage::Hlsl && !is_builtin,
        }
    }

    // =========================================================================
    // Structs
    // =========================================================================

    fn lower_struct(&mut self, declaration: &StructDeclaration) -> Result<(), CompilerError> {
        let name = self.resolve_name(declaration.name);
        self.check_unit_name(&name, &declaration.location)?;

        let mut members: Vec<StructMember> = Vec::with_capacity(declaration.members.len());
        for member in &declaration.members {
            let member_name = self.resolve_name(member.declarator.name);
            let data_type = self.resolve_value_type(
                &member.type_name,
                member.declarator.array_length,
                "A struct member",
            )?;

            if data_type == DataType::Sampler2D {
                return_rule_error!(
                    format!("Struct member '{member_name}' can't be a sampler"),
                    member.declarator.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                    }
                )
            }

            if members.iter().any(|existing| existing.name == member_name) {
                return_duplicate_error!(
                    format!("Struct '{name}' already has a member called '{member_name}'"),
                    member.declarator.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        VariableName => member_name,
                    }
                )
            }

            members.push(StructMember {
                name: member_name,
                data_type,
                semantic: member.declarator.semantic.map(|id| self.resolve_name(id)),
            });
        }

        hir_log!(format!("[HIR] struct {name} with {} members", members.len()));

        self.structs_by_name
            .insert(name.clone(), self.module.structures.len());
        self.module.structures.push(Structure { name, members });
        Ok(())
    }

    // =========================================================================
    // Globals
    // =========================================================================

    fn lower_global_variables(
        &mut self,
        declaration: &VariableDeclaration,
    ) -> Result<(), CompilerError> {
        for declarator in &declaration.declarators {
            let name = self.resolve_name(declarator.name);
            let data_type = self.resolve_value_type(
                &declaration.type_name,
                declarator.array_length,
                "A variable",
            )?;

            self.check_unit_name(&name, &declarator.location)?;
            self.check_global_storage(
                &name,
                &data_type,
                declaration.storage,
                declarator.initializer.is_some(),
                &declarator.location,
            )?;

            // Initializers can't see the variable they initialize
            let initializer = match &declarator.initializer {
                Some(expression) => {
                    let value = self.lower_expression(expression)?;
                    Some(self.coerce(value, &data_type, "the initializer")?)
                }
                None => None,
            };

            let variable = Variable {
                name: name.clone(),
                data_type,
                storage: declaration.storage,
                semantic: declarator.semantic.map(|id| self.resolve_name(id)),
                layout: declaration.layout.clone(),
                buffer: None,
            };

            self.register_global(variable, initializer, declarator.location.clone());
        }

        Ok(())
    }

    fn lower_cbuffer(&mut self, declaration: &CBufferDeclaration) -> Result<(), CompilerError> {
        let buffer = BufferBinding {
            name: self.resolve_name(declaration.name),
            register: declaration.register.map(|id| self.resolve_name(id)),
        };
        hir_log!(format!("[HIR] cbuffer {}", buffer.name));

        for member in &declaration.members {
            let name = self.resolve_name(member.declarator.name);
            let data_type = self.resolve_value_type(
                &member.type_name,
                member.declarator.array_length,
                "A cbuffer member",
            )?;
            self.check_unit_name(&name, &member.declarator.location)?;

            let variable = Variable {
                name,
                data_type,
                storage: Some(StorageQualifier::Uniform),
                semantic: member.declarator.semantic.map(|id| self.resolve_name(id)),
                layout: Vec::new(),
                buffer: Some(buffer.clone()),
            };

            self.register_global(variable, None, member.declarator.location.clone());
        }

        Ok(())
    }

    fn register_global(
        &mut self,
        variable: Variable,
        initializer: Option<HirExpression>,
        location: TextLocation,
    ) {
        let id = self.module.global_id(self.module.globals.len());
        self.globals_by_name.insert(variable.name.clone(), id);
        self.module.globals.push(HirGlobal {
            variable,
            initializer,
            location,
        });
    }

    /// Which storage qualifiers each dialect and stage accepts on a global.
    fn check_global_storage(
        &self,
        name: &str,
        data_type: &DataType,
        storage: Option<StorageQualifier>,
        has_initializer: bool,
        location: &TextLocation,
    ) -> Result<(), CompilerError> {
        let language = self.context.language;
        let stage = self.context.stage;

        let stage_error = match (language, storage) {
            (ShadingLanguage::Glsl, Some(StorageQualifier::Attribute))
                if stage != ShaderStage::Vertex =>
            {
                Some("'attribute' variables only exist in the vertex stage")
            }
            (ShadingLanguage::Glsl, Some(StorageQualifier::Varying))
                if !matches!(stage, ShaderStage::Vertex | ShaderStage::Pixel) =>
            {
                Some("'varying' variables only exist in the vertex and pixel stages")
            }
            (ShadingLanguage::Hlsl, Some(StorageQualifier::In | StorageQualifier::Out)) => {
                Some("HLSL stage inputs and outputs are entry point parameters with semantics")
            }
            (ShadingLanguage::Hlsl, Some(StorageQualifier::GroupShared))
                if stage != ShaderStage::Compute =>
            {
                Some("'groupshared' variables only exist in the compute stage")
            }
            _ => None,
        };

        if let Some(message) = stage_error {
            return_rule_error!(
                format!("{message} ('{name}' in a {stage} shader)"),
                location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                    VariableName => name,
                }
            )
        }

        if *data_type == DataType::Sampler2D {
            let allowed = match language {
                ShadingLanguage::Glsl => storage == Some(StorageQualifier::Uniform),
                ShadingLanguage::Hlsl => storage.is_none(),
            };
            if !allowed {
                return_rule_error!(
                    format!("Sampler '{name}' must be a uniform"),
                    location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        VariableName => name,
                    }
                )
            }
        }

        if storage == Some(StorageQualifier::Const) && !has_initializer {
            return_rule_error!(
                format!("Constant '{name}' must be initialized"),
                location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                    VariableName => name,
                    SuggestedInsertion => " = ...",
                }
            )
        }

        let can_initialize = match storage {
            Some(StorageQualifier::Const) | Some(StorageQualifier::Static) => true,
            Some(StorageQualifier::Out) => language == ShadingLanguage::Glsl,
            None => language == ShadingLanguage::Glsl,
            Some(_) => false,
        };

        if has_initializer && !can_initialize {
            let qualifier = match storage {
                Some(storage) => format!("'{storage}' variables"),
                None => "HLSL globals without 'static'".to_string(),
            };
            return_rule_error!(
                format!("{qualifier} can't have an initializer ('{name}')"),
                location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                    VariableName => name,
                }
            )
        }

        Ok(())
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn lower_function(&mut self, declaration: &FunctionDeclaration) -> Result<(), CompilerError> {
        let name = self.resolve_name(declaration.name);
        let return_type = self.resolve_type(&declaration.return_type, None)?;

        let mut parameters: Vec<Parameter> = Vec::with_capacity(declaration.parameters.len());
        for parameter in &declaration.parameters {
            let data_type = self.resolve_value_type(
                &parameter.type_name,
                parameter.array_length,
                "A parameter",
            )?;

            if data_type == DataType::Sampler2D && parameter.qualifier.by_reference() {
                return_rule_error!(
                    "Sampler parameters can't be 'out' or 'inout'",
                    parameter.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                    }
                )
            }

            let parameter_name = parameter
                .name
                .map(|id| self.resolve_name(id))
                .unwrap_or_default();

            if !parameter_name.is_empty()
                && parameters.iter().any(|existing| existing.name == parameter_name)
            {
                return_duplicate_error!(
                    format!("Parameter '{parameter_name}' is declared twice in '{name}'"),
                    parameter.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        VariableName => parameter_name,
                    }
                )
            }

            parameters.push(Parameter {
                name: parameter_name,
                data_type,
                qualifier: parameter.qualifier,
                semantic: parameter.semantic.map(|id| self.resolve_name(id)),
            });
        }

        let signature = Function {
            name: name.clone(),
            return_type,
            parameters,
            return_semantic: declaration.return_semantic.map(|id| self.resolve_name(id)),
            address: 0,
        };

        let id = match self.functions_by_name.get(&name) {
            Some(&id) => {
                let existing = &self.module.functions[id.0 as usize];

                if !existing.signature.same_signature(&signature) {
                    return_duplicate_error!(
                        format!(
                            "'{signature}' doesn't match the earlier declaration '{}', overloading is not supported",
                            existing.signature
                        ),
                        declaration.location.clone(),
                        {
                            CompilationStage => "HIR Lowering",
                            VariableName => name,
                        }
                    )
                }

                if existing.body.is_some() && declaration.body.is_some() {
                    return_duplicate_error!(
                        format!("Function '{name}' is already defined"),
                        declaration.location.clone(),
                        {
                            CompilationStage => "HIR Lowering",
                            VariableName => name,
                        }
                    )
                }

                id
            }

            None => {
                self.check_unit_name(&name, &declaration.location)?;
                if (0..=3).any(|count| Intrinsic::lookup(self.context.language, &name, count).is_some()) {
                    return_duplicate_error!(
                        format!("'{name}' redefines a built-in function"),
                        declaration.location.clone(),
                        {
                            CompilationStage => "HIR Lowering",
                            VariableName => name,
                        }
                    )
                }

                // A prototype reserves the registry slot
                let id = FunctionId(self.module.functions.len() as u32);
                self.functions_by_name.insert(name.clone(), id);
                self.call_graph.push(Vec::new());
                self.module.functions.push(HirFunction {
                    signature: signature.clone(),
                    locals: Vec::new(),
                    body: None,
                    missing_return: false,
                    location: declaration.location.clone(),
                });

                id
            }
        };

        let Some(body) = &declaration.body else {
            return Ok(());
        };

        hir_log!(format!("[HIR] function {signature}"));

        // Parameter names come from the definition
        let mut frame = Vec::with_capacity(signature.parameters.len());
        let mut parameter_scope = FxHashMap::default();
        for (index, (parameter, parsed)) in signature
            .parameters
            .iter()
            .zip(&declaration.parameters)
            .enumerate()
        {
            frame.push(FrameVariable {
                name: parameter.name.clone(),
                data_type: parameter.data_type.clone(),
                read_only: parsed.is_const,
                used: true,
                is_parameter: true,
                location: parsed.location.clone(),
            });

            if !parameter.name.is_empty() {
                parameter_scope.insert(parameter.name.clone(), LocalSlot(index as u32));
            }
        }

        self.function_state = Some(FunctionState {
            id,
            return_type: signature.return_type.clone(),
            frame,
            scopes: vec![parameter_scope],
            loop_depth: 0,
        });

        let statements = self.lower_block(body)?;

        let Some(state) = self.function_state.take() else {
            return_compiler_error!("Function state for '{}' was lost while lowering", name);
        };

        let parameter_count = signature.parameters.len();
        let mut locals = Vec::with_capacity(state.frame.len() - parameter_count);
        for variable in state.frame {
            if !variable.used && !variable.is_parameter {
                self.warn(
                    format!("Local variable '{}' is never used", variable.name),
                    variable.location.clone(),
                    WarningKind::UnusedVariable,
                );
            }

            if !variable.is_parameter {
                locals.push(variable.name);
            }
        }

        let missing_return =
            !signature.return_type.is_void() && !Self::definitely_returns(&statements);
        if missing_return {
            self.warn(
                format!(
                    "Function '{name}' can reach the end without returning a value, it will return a zero value"
                ),
                body.location.clone(),
                WarningKind::MissingReturn,
            );
        }

        let function = &mut self.module.functions[id.0 as usize];
        function.signature = signature;
        function.locals = locals;
        function.body = Some(statements);
        function.missing_return = missing_return;
        function.location = declaration.location.clone();

        Ok(())
    }
}
