use crate::compiler_frontend::ast::ast_nodes::{
    Block, Expression, Statement, StatementKind, VariableDeclaration,
};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::dialect::ShaderStage;
use crate::compiler_frontend::hir::hir_builder::{FrameVariable, FunctionState, HirBuilder};
use crate::compiler_frontend::hir::hir_nodes::{HirStatement, HirStatementKind, LocalSlot};
use crate::compiler_frontend::symbols::StorageQualifier;
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::{
    hir_log, return_compiler_error, return_duplicate_error, return_rule_error, return_type_error,
};
use rustc_hash::FxHashMap;

impl<'a> HirBuilder<'a> {
    fn state(&mut self) -> Result<&mut FunctionState, CompilerError> {
        match self.function_state.as_mut() {
            Some(state) => Ok(state),
            None => return_compiler_error!("Statement lowered outside of a function body"),
        }
    }

    fn push_scope(&mut self) -> Result<(), CompilerError> {
        self.state()?.scopes.push(FxHashMap::default());
        Ok(())
    }

    fn pop_scope(&mut self) -> Result<(), CompilerError> {
        self.state()?.scopes.pop();
        Ok(())
    }

    /// Lowers a `{ ... }` in its own scope.
    pub(crate) fn lower_block(&mut self, block: &Block) -> Result<Vec<HirStatement>, CompilerError> {
        self.push_scope()?;

        let mut statements = Vec::with_capacity(block.statements.len());
        for statement in &block.statements {
            statements.push(self.lower_statement(statement)?);
        }

        self.pop_scope()?;
        Ok(statements)
    }

    /// Branch and loop bodies get a scope even without braces.
    fn lower_scoped(&mut self, statement: &Statement) -> Result<Vec<HirStatement>, CompilerError> {
        if let StatementKind::Block(block) = &statement.kind {
            return self.lower_block(block);
        }

        self.push_scope()?;
        let lowered = self.lower_statement(statement)?;
        self.pop_scope()?;

        Ok(vec![lowered])
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<HirStatement, CompilerError> {
        let location = statement.location.clone();

        let kind = match &statement.kind {
            StatementKind::Block(block) => HirStatementKind::Block(self.lower_block(block)?),

            StatementKind::Declaration(declaration) => self.lower_local_declaration(declaration)?,

            StatementKind::Expression(expression) => {
                HirStatementKind::Expression(self.lower_expression(expression)?)
            }

            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.lower_expression(condition)?;
                let condition = self.expect_condition(condition)?;
                let then_branch = self.lower_scoped(then_branch)?;
                let else_branch = match else_branch {
                    Some(else_branch) => self.lower_scoped(else_branch)?,
                    None => Vec::new(),
                };

                HirStatementKind::If {
                    condition,
                    then_branch,
                    else_branch,
                }
            }

            StatementKind::For {
                init,
                condition,
                step,
                body,
            } => {
                // The init declaration is only visible inside the loop
                self.push_scope()?;

                let mut statements = Vec::with_capacity(2);
                if let Some(init) = init {
                    statements.push(self.lower_statement(init)?);
                }

                let condition = match condition {
                    Some(condition) => {
                        let condition = self.lower_expression(condition)?;
                        Some(self.expect_condition(condition)?)
                    }
                    None => None,
                };
                let step = match step {
                    Some(step) => Some(self.lower_expression(step)?),
                    None => None,
                };
                let body = self.lower_loop_body(body)?;

                self.pop_scope()?;

                statements.push(HirStatement {
                    kind: HirStatementKind::Loop {
                        condition,
                        step,
                        body,
                        check_first: true,
                    },
                    location: location.clone(),
                });

                HirStatementKind::Block(statements)
            }

            StatementKind::While { condition, body } => {
                let condition = self.lower_expression(condition)?;
                let condition = self.expect_condition(condition)?;
                let body = self.lower_loop_body(body)?;

                HirStatementKind::Loop {
                    condition: Some(condition),
                    step: None,
                    body,
                    check_first: true,
                }
            }

            StatementKind::DoWhile { body, condition } => {
                let body = self.lower_loop_body(body)?;
                let condition = self.lower_expression(condition)?;
                let condition = self.expect_condition(condition)?;

                HirStatementKind::Loop {
                    condition: Some(condition),
                    step: None,
                    body,
                    check_first: false,
                }
            }

            StatementKind::Return(value) => self.lower_return(value.as_ref(), &location)?,

            StatementKind::Break | StatementKind::Continue => {
                let is_break = matches!(statement.kind, StatementKind::Break);
                if self.state()?.loop_depth == 0 {
                    let keyword = if is_break { "break" } else { "continue" };
                    return_rule_error!(
                        format!("'{keyword}' can only be used inside a loop"),
                        location,
                        {
                            CompilationStage => "HIR Lowering",
                        }
                    )
                }

                if is_break {
                    HirStatementKind::Break
                } else {
                    HirStatementKind::Continue
                }
            }

            StatementKind::Discard => {
                if self.context.stage != ShaderStage::Pixel {
                    return_rule_error!(
                        format!(
                            "'discard' can only be used in pixel shaders, this is a {} shader",
                            self.context.stage
                        ),
                        location,
                        {
                            CompilationStage => "HIR Lowering",
                        }
                    )
                }

                HirStatementKind::Discard
            }

            StatementKind::Empty => HirStatementKind::Block(Vec::new()),
        };

        Ok(HirStatement { kind, location })
    }

    fn lower_loop_body(&mut self, body: &Statement) -> Result<Vec<HirStatement>, CompilerError> {
        self.state()?.loop_depth += 1;
        let body = self.lower_scoped(body)?;
        self.state()?.loop_depth -= 1;
        Ok(body)
    }

    fn lower_return(
        &mut self,
        value: Option<&Expression>,
        location: &TextLocation,
    ) -> Result<HirStatementKind, CompilerError> {
        let return_type = self.state()?.return_type.clone();

        match value {
            Some(value) => {
                if return_type.is_void() {
                    return_type_error!(
                        "A void function can't return a value",
                        location.clone(),
                        {
                            CompilationStage => "HIR Lowering",
                            ExpectedType => "void",
                        }
                    )
                }

                let value = self.lower_expression(value)?;
                let value = self.coerce(value, &return_type, "the return value")?;
                Ok(HirStatementKind::Return(Some(value)))
            }

            None if !return_type.is_void() => {
                let expected = self.type_name(&return_type);
                return_type_error!(
                    format!("This function must return a value of type '{expected}'"),
                    location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        ExpectedType => expected,
                    }
                )
            }

            None => Ok(HirStatementKind::Return(None)),
        }
    }

    // =========================================================================
    // Local variables
    // =========================================================================

    fn lower_local_declaration(
        &mut self,
        declaration: &VariableDeclaration,
    ) -> Result<HirStatementKind, CompilerError> {
        let is_const = match declaration.storage {
            None => false,
            Some(StorageQualifier::Const) => true,
            Some(storage) => {
                return_rule_error!(
                    format!("Local variables can't be declared '{storage}'"),
                    declaration.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        PrimarySuggestion => "Move the declaration to global scope",
                    }
                )
            }
        };

        if !declaration.layout.is_empty() {
            return_rule_error!(
                "layout qualifiers can only be used on globals",
                declaration.location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                }
            )
        }

        let mut declares = Vec::with_capacity(declaration.declarators.len());
        for declarator in &declaration.declarators {
            let name = self.resolve_name(declarator.name);
            let data_type = self.resolve_value_type(
                &declaration.type_name,
                declarator.array_length,
                "A local variable",
            )?;

            if data_type == DataType::Sampler2D {
                return_rule_error!(
                    format!("Local variable '{name}' can't be a sampler"),
                    declarator.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                    }
                )
            }

            if declarator.semantic.is_some() {
                return_rule_error!(
                    format!("Local variable '{name}' can't have a semantic"),
                    declarator.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                    }
                )
            }

            if is_const && declarator.initializer.is_none() {
                return_rule_error!(
                    format!("Constant '{name}' must be initialized"),
                    declarator.location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        VariableName => name,
                        SuggestedInsertion => " = ...",
                    }
                )
            }

            // `float x = x;` reads the outer x
            let initializer = match &declarator.initializer {
                Some(expression) => {
                    let value = self.lower_expression(expression)?;
                    Some(self.coerce(value, &data_type, "the initializer")?)
                }
                None => None,
            };

            let slot = self.declare_local(&name, &data_type, is_const, &declarator.location)?;
            hir_log!(format!("[HIR] local {name} in slot {}", slot.0));

            declares.push(HirStatement {
                kind: HirStatementKind::Declare {
                    slot,
                    data_type,
                    initializer,
                },
                location: declarator.location.clone(),
            });
        }

        if declares.len() == 1
            && let Some(declare) = declares.pop()
        {
            return Ok(declare.kind);
        }

        Ok(HirStatementKind::Block(declares))
    }

    /// Adds a local to the innermost scope and gives it the next frame slot.
    fn declare_local(
        &mut self,
        name: &str,
        data_type: &DataType,
        is_const: bool,
        location: &TextLocation,
    ) -> Result<LocalSlot, CompilerError> {
        let shadows_global = self.globals_by_name.contains_key(name);
        let state = self.state()?;

        // The outermost body scope shares its names with the parameters
        let scope_count = state.scopes.len();
        let conflicts = match scope_count {
            0 => false,
            2 => state.scopes[0].contains_key(name) || state.scopes[1].contains_key(name),
            _ => state.scopes[scope_count - 1].contains_key(name),
        };

        if conflicts {
            return_duplicate_error!(
                format!("'{name}' is already declared in this scope"),
                location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                    VariableName => name,
                }
            )
        }

        let slot = LocalSlot(state.frame.len() as u32);
        state.frame.push(FrameVariable {
            name: name.to_string(),
            data_type: data_type.clone(),
            read_only: is_const,
            used: false,
            is_parameter: false,
            location: location.clone(),
        });

        if let Some(scope) = state.scopes.last_mut() {
            scope.insert(name.to_string(), slot);
        }

        if shadows_global {
            self.warn(
                format!("Local variable '{name}' hides the global of the same name"),
                location.clone(),
                WarningKind::ShadowedGlobal,
            );
        }

        Ok(slot)
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    /// True if every path through `statements` ends in a return or discard.
    /// Loops never count, their body might not run.
    pub(crate) fn definitely_returns(statements: &[HirStatement]) -> bool {
        let Some(last) = statements.last() else {
            return false;
        };

        match &last.kind {
            HirStatementKind::Return(_) | HirStatementKind::Discard => true,
            HirStatementKind::If {
                then_branch,
                else_branch,
                ..
            } => Self::definitely_returns(then_branch) && Self::definitely_returns(else_branch),
            HirStatementKind::Block(statements) => Self::definitely_returns(statements),
            _ => false,
        }
    }
}
