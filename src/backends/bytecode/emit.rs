//! Walks a checked HIR module and writes its bytecode.
//!
//! Layout of the finished program:
//! every function body in registry order, then the global initialiser block.
//! A function's address is the offset of the first instruction of its body.

use crate::backends::bytecode::generator::{BytecodeGenerator, PendingJump};
use crate::backends::bytecode::instructions::{Instruction, Opcode, TypeCode};
use crate::compiler_frontend::ast::ast_nodes::{BinaryOperator, StepOperator, UnaryOperator};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::hir::hir_nodes::{
    HirArgument, HirExpression, HirExpressionKind, HirModule, HirPlace, HirStatement,
    HirStatementKind, PlaceRoot, Projection,
};
use crate::settings::TranslatorConfig;
use crate::{codegen_log, return_compiler_error};
use rustc_hash::FxHashMap;

pub(crate) struct EmittedModule {
    pub global_init_address: usize,
}

/// Jumps inside one loop that wait for targets only known once the body is written.
#[derive(Default)]
struct LoopTargets {
    breaks: Vec<PendingJump>,
    continues: Vec<PendingJump>,
}

pub(crate) struct BytecodeEmitter<'a> {
    generator: &'a mut BytecodeGenerator,
    struct_indices: FxHashMap<String, u32>,
    emit_line_markers: bool,
    loops: Vec<LoopTargets>,
}

/// Emits every function and the global initialiser.
/// Function addresses are written back into the module's signatures.
pub(crate) fn emit_module(
    module: &mut HirModule,
    generator: &mut BytecodeGenerator,
    config: &TranslatorConfig,
) -> Result<EmittedModule, CompilerError> {
    let struct_indices = module
        .structures
        .iter()
        .enumerate()
        .map(|(index, structure)| (structure.name.clone(), index as u32))
        .collect();

    let mut emitter = BytecodeEmitter {
        generator,
        struct_indices,
        emit_line_markers: config.emit_line_markers,
        loops: Vec::new(),
    };

    for function in module.functions.iter_mut() {
        let Some(body) = &function.body else {
            return_compiler_error!(
                "Function '{}' reached code generation without a body",
                function.signature.name
            );
        };

        function.signature.address = emitter.generator.position();
        codegen_log!(format!(
            "{} @{}",
            function.signature.name, function.signature.address
        ));

        emitter.emit_function_body(body, &function.signature.return_type)?;
    }

    let global_init_address = emitter.generator.position();
    codegen_log!(format!("global init @{global_init_address}"));

    for (index, global) in module.globals.iter().enumerate() {
        if let Some(initializer) = &global.initializer {
            emitter.line_marker(global.location.line());
            emitter.emit_expression(initializer)?;
            let id = module.builtins.len() + index;
            emitter.generator.emit(Instruction::SetGlobal(id as u32));
        }
    }
    emitter.generator.emit(Instruction::Return);

    Ok(EmittedModule {
        global_init_address,
    })
}

impl BytecodeEmitter<'_> {
    fn line_marker(&mut self, line: u32) {
        if self.emit_line_markers {
            self.generator.emit(Instruction::Line(line));
        }
    }

    fn type_code(&self, data_type: &DataType) -> Result<TypeCode, CompilerError> {
        match TypeCode::from_data_type(data_type, &|name| self.struct_indices.get(name).copied()) {
            Some(code) => Ok(code),
            None => return_compiler_error!("No type code for '{}'", data_type),
        }
    }

    fn emit_function_body(
        &mut self,
        body: &[HirStatement],
        return_type: &DataType,
    ) -> Result<(), CompilerError> {
        for statement in body {
            self.emit_statement(statement)?;
        }

        // Every body ends in a return so the address of the next one is never reached by falling through.
        // A non-void function that runs off the end returns the zero value.
        let ends_in_return = matches!(
            body.last().map(|statement| &statement.kind),
            Some(HirStatementKind::Return(_))
        );

        if !ends_in_return {
            if return_type.is_void() {
                self.generator.emit(Instruction::Return);
            } else {
                let code = self.type_code(return_type)?;
                self.generator.emit(Instruction::Construct(code, 0));
                self.generator.emit(Instruction::ReturnValue);
            }
        }

        Ok(())
    }

    fn emit_block(&mut self, statements: &[HirStatement]) -> Result<(), CompilerError> {
        for statement in statements {
            self.emit_statement(statement)?;
        }
        Ok(())
    }

    fn emit_statement(&mut self, statement: &HirStatement) -> Result<(), CompilerError> {
        if !matches!(statement.kind, HirStatementKind::Block(_)) {
            self.line_marker(statement.location.line());
        }

        match &statement.kind {
            HirStatementKind::Expression(expression) => {
                self.emit_expression(expression)?;
                if !expression.data_type.is_void() {
                    self.generator.emit(Instruction::Pop);
                }
            }

            HirStatementKind::Declare {
                slot,
                data_type,
                initializer,
            } => {
                match initializer {
                    Some(value) => self.emit_expression(value)?,
                    None => {
                        let code = self.type_code(data_type)?;
                        self.generator.emit(Instruction::Construct(code, 0));
                    }
                }
                self.generator.emit(Instruction::SetLocal(slot.0));
            }

            HirStatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.emit_expression(condition)?;
                let to_else = self.generator.emit_forward_jump(Opcode::JumpIfFalse)?;
                self.emit_block(then_branch)?;

                if else_branch.is_empty() {
                    self.generator.patch_to_here(to_else)?;
                } else {
                    let to_end = self.generator.emit_forward_jump(Opcode::Jump)?;
                    self.generator.patch_to_here(to_else)?;
                    self.emit_block(else_branch)?;
                    self.generator.patch_to_here(to_end)?;
                }
            }

            HirStatementKind::Loop {
                condition,
                step,
                body,
                check_first,
            } => {
                if *check_first {
                    self.emit_checked_loop(condition.as_ref(), step.as_ref(), body)?;
                } else {
                    self.emit_do_loop(condition.as_ref(), body)?;
                }
            }

            HirStatementKind::Return(value) => match value {
                Some(value) => {
                    self.emit_expression(value)?;
                    self.generator.emit(Instruction::ReturnValue);
                }
                None => self.generator.emit(Instruction::Return),
            },

            HirStatementKind::Break => {
                let jump = self.generator.emit_forward_jump(Opcode::Jump)?;
                match self.loops.last_mut() {
                    Some(targets) => targets.breaks.push(jump),
                    None => return_compiler_error!("break reached code generation outside a loop"),
                }
            }

            HirStatementKind::Continue => {
                let jump = self.generator.emit_forward_jump(Opcode::Jump)?;
                match self.loops.last_mut() {
                    Some(targets) => targets.continues.push(jump),
                    None => {
                        return_compiler_error!("continue reached code generation outside a loop")
                    }
                }
            }

            HirStatementKind::Discard => self.generator.emit(Instruction::Discard),

            HirStatementKind::Block(statements) => self.emit_block(statements)?,
        }

        Ok(())
    }

    /// `for` and `while`:
    /// start: condition, exit if false, body, continue target: step, back to start.
    fn emit_checked_loop(
        &mut self,
        condition: Option<&HirExpression>,
        step: Option<&HirExpression>,
        body: &[HirStatement],
    ) -> Result<(), CompilerError> {
        let start = self.generator.position();

        let exit = match condition {
            Some(condition) => {
                self.emit_expression(condition)?;
                Some(self.generator.emit_forward_jump(Opcode::JumpIfFalse)?)
            }
            None => None,
        };

        let targets = self.emit_loop_body(body)?;

        for jump in targets.continues {
            self.generator.patch_to_here(jump)?;
        }

        if let Some(step) = step {
            self.emit_expression(step)?;
            if !step.data_type.is_void() {
                self.generator.emit(Instruction::Pop);
            }
        }

        self.emit_backward_jump(Instruction::Jump, start)?;

        if let Some(exit) = exit {
            self.generator.patch_to_here(exit)?;
        }
        for jump in targets.breaks {
            self.generator.patch_to_here(jump)?;
        }

        Ok(())
    }

    /// `do { } while (condition)`:
    /// start: body, continue target: condition, back to start if true.
    fn emit_do_loop(
        &mut self,
        condition: Option<&HirExpression>,
        body: &[HirStatement],
    ) -> Result<(), CompilerError> {
        let start = self.generator.position();
        let targets = self.emit_loop_body(body)?;

        for jump in targets.continues {
            self.generator.patch_to_here(jump)?;
        }

        match condition {
            Some(condition) => {
                self.emit_expression(condition)?;
                self.emit_backward_jump(Instruction::JumpIfTrue, start)?;
            }
            None => self.emit_backward_jump(Instruction::Jump, start)?,
        }

        for jump in targets.breaks {
            self.generator.patch_to_here(jump)?;
        }

        Ok(())
    }

    fn emit_loop_body(&mut self, body: &[HirStatement]) -> Result<LoopTargets, CompilerError> {
        self.loops.push(LoopTargets::default());
        let result = self.emit_block(body);
        let targets = self.loops.pop().unwrap_or_default();
        result.map(|_| targets)
    }

    fn emit_backward_jump(
        &mut self,
        jump: fn(u32) -> Instruction,
        target: usize,
    ) -> Result<(), CompilerError> {
        let Ok(target) = u32::try_from(target) else {
            return_compiler_error!("Jump target {} doesn't fit the operand", target);
        };
        self.generator.emit(jump(target));
        Ok(())
    }

    fn emit_expression(&mut self, expression: &HirExpression) -> Result<(), CompilerError> {
        match &expression.kind {
            HirExpressionKind::Int(value) => self.generator.emit(Instruction::PushInt(*value)),
            HirExpressionKind::Float(value) => self.generator.emit(Instruction::PushFloat(*value)),
            HirExpressionKind::Bool(value) => self.generator.emit(Instruction::PushBool(*value)),

            HirExpressionKind::Local(slot) => self.generator.emit(Instruction::GetLocal(slot.0)),
            HirExpressionKind::Global(id) => self.generator.emit(Instruction::GetGlobal(id.0)),

            HirExpressionKind::Member { base, index } => {
                self.emit_expression(base)?;
                self.generator.emit(Instruction::GetMember(*index));
            }

            HirExpressionKind::Swizzle { base, components } => {
                self.emit_expression(base)?;
                self.generator.emit(Instruction::Swizzle(components.clone()));
            }

            HirExpressionKind::Index { base, index } => {
                self.emit_expression(base)?;
                self.emit_expression(index)?;
                self.generator.emit(Instruction::Index);
            }

            HirExpressionKind::Unary { operator, operand } => {
                self.emit_expression(operand)?;
                self.generator.emit(match operator {
                    UnaryOperator::Negate => Instruction::Neg,
                    UnaryOperator::Not => Instruction::Not,
                });
            }

            HirExpressionKind::Binary {
                operator,
                left,
                right,
            } => match operator {
                BinaryOperator::And => self.emit_short_circuit(left, right, Opcode::JumpIfFalse)?,
                BinaryOperator::Or => self.emit_short_circuit(left, right, Opcode::JumpIfTrue)?,
                _ => {
                    self.emit_expression(left)?;
                    self.emit_expression(right)?;
                    self.generator.emit(binary_instruction(*operator)?);
                }
            },

            HirExpressionKind::Ternary {
                condition,
                then_value,
                else_value,
            } => {
                self.emit_expression(condition)?;
                let to_else = self.generator.emit_forward_jump(Opcode::JumpIfFalse)?;
                self.emit_expression(then_value)?;
                let to_end = self.generator.emit_forward_jump(Opcode::Jump)?;
                self.generator.patch_to_here(to_else)?;
                self.emit_expression(else_value)?;
                self.generator.patch_to_here(to_end)?;
            }

            HirExpressionKind::Assign {
                target,
                operator,
                value,
            } => self.emit_assignment(target, *operator, value)?,

            HirExpressionKind::Step { operator, target } => {
                self.emit_place_reference(target)?;
                self.generator.emit(match operator {
                    StepOperator::PreIncrement => Instruction::PreInc,
                    StepOperator::PreDecrement => Instruction::PreDec,
                    StepOperator::PostIncrement => Instruction::PostInc,
                    StepOperator::PostDecrement => Instruction::PostDec,
                });
            }

            HirExpressionKind::Call {
                function,
                arguments,
            } => {
                for argument in arguments {
                    match argument {
                        HirArgument::Value(value) => self.emit_expression(value)?,
                        HirArgument::Reference(place) => self.emit_place_reference(place)?,
                    }
                }
                self.generator.emit(Instruction::Call {
                    function: function.0,
                    argument_count: arguments.len() as u32,
                });
            }

            HirExpressionKind::Intrinsic {
                intrinsic,
                arguments,
            } => {
                for argument in arguments {
                    self.emit_expression(argument)?;
                }
                self.generator.emit(Instruction::CallBuiltin {
                    intrinsic: intrinsic.id(),
                    argument_count: arguments.len() as u32,
                });
            }

            HirExpressionKind::Construct { arguments } => {
                for argument in arguments {
                    self.emit_expression(argument)?;
                }
                let code = self.type_code(&expression.data_type)?;
                self.generator
                    .emit(Instruction::Construct(code, arguments.len() as u32));
            }
        }

        Ok(())
    }

    /// Leaves the left value when it decides the result, otherwise the right value.
    fn emit_short_circuit(
        &mut self,
        left: &HirExpression,
        right: &HirExpression,
        jump: Opcode,
    ) -> Result<(), CompilerError> {
        self.emit_expression(left)?;
        self.generator.emit(Instruction::Dup);
        let to_end = self.generator.emit_forward_jump(jump)?;
        self.generator.emit(Instruction::Pop);
        self.emit_expression(right)?;
        self.generator.patch_to_here(to_end)
    }

    fn emit_assignment(
        &mut self,
        target: &HirPlace,
        operator: Option<BinaryOperator>,
        value: &HirExpression,
    ) -> Result<(), CompilerError> {
        // Whole variables are written directly, anything projected goes through a reference
        if target.projections.is_empty() {
            if let Some(operator) = operator {
                self.emit_root_get(target.root);
                self.emit_expression(value)?;
                self.generator.emit(binary_instruction(operator)?);
            } else {
                self.emit_expression(value)?;
            }

            self.generator.emit(Instruction::Dup);
            self.generator.emit(match target.root {
                PlaceRoot::Local(slot) => Instruction::SetLocal(slot.0),
                PlaceRoot::Global(id) => Instruction::SetGlobal(id.0),
            });
            return Ok(());
        }

        self.emit_place_reference(target)?;
        if let Some(operator) = operator {
            self.generator.emit(Instruction::Dup);
            self.generator.emit(Instruction::Load);
            self.emit_expression(value)?;
            self.generator.emit(binary_instruction(operator)?);
        } else {
            self.emit_expression(value)?;
        }
        self.generator.emit(Instruction::Store);

        Ok(())
    }

    fn emit_root_get(&mut self, root: PlaceRoot) {
        self.generator.emit(match root {
            PlaceRoot::Local(slot) => Instruction::GetLocal(slot.0),
            PlaceRoot::Global(id) => Instruction::GetGlobal(id.0),
        });
    }

    /// Pushes a reference to the place, for `Store`, the step operators and out arguments.
    fn emit_place_reference(&mut self, place: &HirPlace) -> Result<(), CompilerError> {
        self.generator.emit(match place.root {
            PlaceRoot::Local(slot) => Instruction::RefLocal(slot.0),
            PlaceRoot::Global(id) => Instruction::RefGlobal(id.0),
        });

        for projection in &place.projections {
            match projection {
                Projection::Member(index) => self.generator.emit(Instruction::RefMember(*index)),
                Projection::Swizzle(components) => self
                    .generator
                    .emit(Instruction::RefSwizzle(components.clone())),
                Projection::Index(index) => {
                    self.emit_expression(index)?;
                    self.generator.emit(Instruction::RefIndex);
                }
            }
        }

        Ok(())
    }
}

fn binary_instruction(operator: BinaryOperator) -> Result<Instruction, CompilerError> {
    let instruction = match operator {
        BinaryOperator::Add => Instruction::Add,
        BinaryOperator::Subtract => Instruction::Sub,
        BinaryOperator::Multiply => Instruction::Mul,
        BinaryOperator::Divide => Instruction::Div,
        BinaryOperator::Modulus => Instruction::Mod,
        BinaryOperator::Equal => Instruction::Eq,
        BinaryOperator::NotEqual => Instruction::Ne,
        BinaryOperator::LessThan => Instruction::Lt,
        BinaryOperator::LessThanOrEqual => Instruction::Le,
        BinaryOperator::GreaterThan => Instruction::Gt,
        BinaryOperator::GreaterThanOrEqual => Instruction::Ge,
        BinaryOperator::And | BinaryOperator::Or => {
            return_compiler_error!("Logical operators short circuit and have no single instruction")
        }
    };

    Ok(instruction)
}
