//! Expression lowering: name resolution, typing and implicit conversions.

use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, Expression, ExpressionKind, StepOperator, UnaryOperator,
};
use crate::compiler_frontend::builtins::{Intrinsic, IntrinsicShape};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::datatypes::{DataType, ScalarKind};
use crate::compiler_frontend::dialect::ShadingLanguage;
use crate::compiler_frontend::hir::hir_builder::{HirBuilder, ResolvedVariable};
use crate::compiler_frontend::hir::hir_nodes::{
    FunctionId, HirArgument, HirExpression, HirExpressionKind, HirPlace, PlaceRoot, Projection,
};
use crate::compiler_frontend::string_interning::StringId;
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::{
    hir_log, return_compiler_error, return_rule_error, return_type_error,
    return_unresolved_error,
};

impl<'a> HirBuilder<'a> {
    pub(crate) fn lower_expression(
        &mut self,
        expression: &Expression,
    ) -> Result<HirExpression, CompilerError> {
        let location = expression.location.clone();

        match &expression.kind {
            // Only hex and 'u' suffixed literals go above i32::MAX, keep their bit pattern
            ExpressionKind::IntLiteral(value) => Ok(HirExpression::new(
                HirExpressionKind::Int(*value as u32 as i32),
                DataType::INT,
                location,
            )),
            ExpressionKind::FloatLiteral(value) => Ok(HirExpression::new(
                HirExpressionKind::Float(*value as f32),
                DataType::FLOAT,
                location,
            )),
            ExpressionKind::BoolLiteral(value) => Ok(HirExpression::new(
                HirExpressionKind::Bool(*value),
                DataType::BOOL,
                location,
            )),

            ExpressionKind::Identifier(name) => self.lower_identifier(*name, location),

            ExpressionKind::Call { callee, arguments } => {
                self.lower_call(*callee, arguments, location)
            }

            ExpressionKind::Member { base, member } => self.lower_member(base, *member, location),

            ExpressionKind::Index { base, index } => {
                let base = self.lower_expression(base)?;
                let index = self.lower_index_value(index, &base.data_type)?;
                let element = self.indexed_type(&base.data_type, &location)?;

                Ok(HirExpression::new(
                    HirExpressionKind::Index {
                        base: Box::new(base),
                        index: Box::new(index),
                    },
                    element,
                    location,
                ))
            }

            ExpressionKind::Unary { operator, operand } => {
                self.lower_unary(*operator, operand, location)
            }

            ExpressionKind::Binary {
                operator,
                left,
                right,
            } => self.lower_binary(*operator, left, right, location),

            ExpressionKind::Assign {
                operator,
                target,
                value,
            } => self.lower_assignment(*operator, target, value, location),

            ExpressionKind::Ternary {
                condition,
                then_value,
                else_value,
            } => self.lower_ternary(condition, then_value, else_value, location),

            ExpressionKind::Step { operator, operand } => {
                let target = self.lower_place(operand)?;
                if !target.data_type.is_numeric() {
                    return_type_error!(
                        format!(
                            "Operator '{}' needs a numeric operand, found '{}'",
                            step_symbol(*operator),
                            self.type_name(&target.data_type)
                        ),
                        location,
                        {
                            CompilationStage => "HIR Lowering",
                            FoundType => self.type_name(&target.data_type),
                        }
                    )
                }

                let data_type = target.data_type.clone();
                Ok(HirExpression::new(
                    HirExpressionKind::Step {
                        operator: *operator,
                        target,
                    },
                    data_type,
                    location,
                ))
            }
        }
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    fn convert(expression: HirExpression, target: DataType) -> HirExpression {
        let location = expression.location.clone();
        HirExpression::new(
            HirExpressionKind::Construct {
                arguments: vec![expression],
            },
            target,
            location,
        )
    }

    /// Makes `expression` usable where `target` is expected, promoting int to float if allowed.
    pub(crate) fn coerce(
        &self,
        expression: HirExpression,
        target: &DataType,
        what: &str,
    ) -> Result<HirExpression, CompilerError> {
        if expression.data_type == *target {
            return Ok(expression);
        }

        if expression
            .data_type
            .converts_to(target, self.context.config.implicit_int_to_float)
        {
            return Ok(Self::convert(expression, target.clone()));
        }

        let expected = self.type_name(target);
        let found = self.type_name(&expression.data_type);
        return_type_error!(
            format!("Expected '{expected}' for {what}, found '{found}'"),
            expression.location,
            {
                CompilationStage => "HIR Lowering",
                ExpectedType => expected,
                FoundType => found,
            }
        )
    }

    /// Promotes the int side of a mixed int and float operation.
    fn promote_operands(
        &self,
        left: HirExpression,
        right: HirExpression,
    ) -> (HirExpression, HirExpression) {
        if !self.context.config.implicit_int_to_float {
            return (left, right);
        }

        let left_float = left.data_type.scalar_kind() == Some(ScalarKind::Float);
        let right_float = right.data_type.scalar_kind() == Some(ScalarKind::Float);

        if left.data_type.is_int_based() && right_float {
            let target = left.data_type.to_float_based();
            return (Self::convert(left, target), right);
        }

        if right.data_type.is_int_based() && left_float {
            let target = right.data_type.to_float_based();
            return (left, Self::convert(right, target));
        }

        (left, right)
    }

    /// Float scalar or vector argument of an intrinsic, after promotion.
    fn generic_float_argument(
        &self,
        argument: HirExpression,
        intrinsic: Intrinsic,
        position: usize,
    ) -> Result<HirExpression, CompilerError> {
        let argument = if self.context.config.implicit_int_to_float && argument.data_type.is_int_based()
        {
            let target = argument.data_type.to_float_based();
            Self::convert(argument, target)
        } else {
            argument
        };

        if argument.data_type.is_float_scalar_or_vector() {
            return Ok(argument);
        }

        let found = self.type_name(&argument.data_type);
        return_type_error!(
            format!(
                "Argument {} of '{}' must be a float scalar or vector, found '{found}'",
                position + 1,
                intrinsic.name()
            ),
            argument.location,
            {
                CompilationStage => "HIR Lowering",
                ExpectedType => "float",
                FoundType => found,
            }
        )
    }

    /// Argument that must match `like`, or optionally be a plain float.
    fn matching_float_argument(
        &self,
        argument: HirExpression,
        like: &DataType,
        allow_scalar: bool,
        intrinsic: Intrinsic,
        position: usize,
    ) -> Result<HirExpression, CompilerError> {
        let argument = self.generic_float_argument(argument, intrinsic, position)?;
        if argument.data_type == *like || (allow_scalar && argument.data_type == DataType::FLOAT) {
            return Ok(argument);
        }

        let expected = self.type_name(like);
        let found = self.type_name(&argument.data_type);
        return_type_error!(
            format!(
                "Argument {} of '{}' must be '{expected}', found '{found}'",
                position + 1,
                intrinsic.name()
            ),
            argument.location,
            {
                CompilationStage => "HIR Lowering",
                ExpectedType => expected,
                FoundType => found,
            }
        )
    }

    // =========================================================================
    // Names, members and indexing
    // =========================================================================

    fn lower_identifier(
        &mut self,
        name: StringId,
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let text = self.resolve_name(name);

        match self.lookup_variable(&text) {
            Some(ResolvedVariable::Local(slot)) => {
                let data_type = self.local_type(slot.0)?;
                Ok(HirExpression::new(
                    HirExpressionKind::Local(slot),
                    data_type,
                    location,
                ))
            }
            Some(ResolvedVariable::Global(id)) => {
                let data_type = self.global(id).data_type.clone();
                Ok(HirExpression::new(
                    HirExpressionKind::Global(id),
                    data_type,
                    location,
                ))
            }
            None => self.unresolved_variable(&text, location),
        }
    }

    fn local_type(&self, slot: u32) -> Result<DataType, CompilerError> {
        match self
            .function_state
            .as_ref()
            .and_then(|state| state.frame.get(slot as usize))
        {
            Some(variable) => Ok(variable.data_type.clone()),
            None => return_compiler_error!("Local slot {} has no frame entry", slot),
        }
    }

    fn unresolved_variable<T>(&self, name: &str, location: TextLocation) -> Result<T, CompilerError> {
        let hint = if self.functions_by_name.contains_key(name) {
            format!("'{name}' is a function, call it with '{name}(...)'")
        } else {
            "Variables must be declared before they are used".to_string()
        };

        return_unresolved_error!(
            format!("Undeclared identifier '{name}'"),
            location,
            {
                CompilationStage => "HIR Lowering",
                VariableName => name,
                PrimarySuggestion => hint,
            }
        )
    }

    fn lower_member(
        &mut self,
        base: &Expression,
        member: StringId,
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let base = self.lower_expression(base)?;
        let member_name = self.resolve_name(member);

        if let DataType::Struct(struct_name) = &base.data_type {
            let (index, member_type) = self.struct_member(struct_name, &member_name, &location)?;
            return Ok(HirExpression::new(
                HirExpressionKind::Member {
                    base: Box::new(base),
                    index,
                },
                member_type,
                location,
            ));
        }

        let components = self.parse_swizzle(&member_name, &base.data_type, &location)?;
        let data_type = self.swizzle_type(&base.data_type, components.len());

        Ok(HirExpression::new(
            HirExpressionKind::Swizzle {
                base: Box::new(base),
                components,
            },
            data_type,
            location,
        ))
    }

    fn struct_member(
        &self,
        struct_name: &str,
        member_name: &str,
        location: &TextLocation,
    ) -> Result<(u32, DataType), CompilerError> {
        let found = self
            .structure(struct_name)
            .and_then(|structure| structure.member(member_name))
            .map(|(index, member)| (index, member.data_type.clone()));

        match found {
            Some(found) => Ok(found),
            None => {
                return_unresolved_error!(
                    format!("Struct '{struct_name}' has no member '{member_name}'"),
                    location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        VariableName => member_name,
                    }
                )
            }
        }
    }

    /// Component indices of a swizzle like `.xzy` on a scalar or vector.
    fn parse_swizzle(
        &self,
        swizzle: &str,
        base_type: &DataType,
        location: &TextLocation,
    ) -> Result<Vec<u8>, CompilerError> {
        let size = match base_type {
            DataType::Scalar(_) => 1,
            DataType::Vector(_, size) => *size,
            _ => {
                return_type_error!(
                    format!(
                        "'{}' has no member '{swizzle}'",
                        self.type_name(base_type)
                    ),
                    location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        FoundType => self.type_name(base_type),
                    }
                )
            }
        };

        if swizzle.is_empty() || swizzle.len() > 4 {
            return_type_error!(
                format!("Swizzle '.{swizzle}' must have between one and four components"),
                location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                }
            )
        }

        let mut components = Vec::with_capacity(swizzle.len());
        let mut set = None;

        for letter in swizzle.chars() {
            let Some((component, letter_set)) = self.context.language.swizzle_component(letter)
            else {
                return_type_error!(
                    format!(
                        "'{}' has no member '{swizzle}'",
                        self.type_name(base_type)
                    ),
                    location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                    }
                )
            };

            if set.is_some_and(|set| set != letter_set) {
                return_type_error!(
                    format!("Swizzle '.{swizzle}' mixes component sets"),
                    location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        PrimarySuggestion => "Use only one of xyzw, rgba or stpq in a swizzle",
                    }
                )
            }
            set = Some(letter_set);

            if component >= size {
                return_type_error!(
                    format!(
                        "Swizzle component '{letter}' is out of range for '{}'",
                        self.type_name(base_type)
                    ),
                    location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                    }
                )
            }

            components.push(component);
        }

        Ok(components)
    }

    fn swizzle_type(&self, base_type: &DataType, count: usize) -> DataType {
        let kind = base_type.scalar_kind().unwrap_or(ScalarKind::Float);
        DataType::with_components(kind, count as u8)
    }

    /// Type of `base[i]`.
    fn indexed_type(
        &self,
        base_type: &DataType,
        location: &TextLocation,
    ) -> Result<DataType, CompilerError> {
        match base_type {
            DataType::Array(element, _) => Ok((**element).clone()),
            DataType::Vector(kind, _) => Ok(DataType::Scalar(*kind)),
            DataType::Matrix { rows, .. } => Ok(DataType::float_vector(*rows)),
            _ => {
                return_type_error!(
                    format!("'{}' can't be indexed", self.type_name(base_type)),
                    location.clone(),
                    {
                        CompilationStage => "HIR Lowering",
                        FoundType => self.type_name(base_type),
                    }
                )
            }
        }
    }

    /// The index expression of `base[i]`. Constant indices are range checked.
    fn lower_index_value(
        &mut self,
        index: &Expression,
        base_type: &DataType,
    ) -> Result<HirExpression, CompilerError> {
        let index = self.lower_expression(index)?;
        if index.data_type != DataType::INT {
            let found = self.type_name(&index.data_type);
            return_type_error!(
                format!("Array and vector indices must be 'int', found '{found}'"),
                index.location,
                {
                    CompilationStage => "HIR Lowering",
                    ExpectedType => "int",
                    FoundType => found,
                }
            )
        }

        let bound = match base_type {
            DataType::Array(_, length) => Some(*length as i64),
            DataType::Vector(_, size) => Some(*size as i64),
            DataType::Matrix { columns, .. } => Some(*columns as i64),
            _ => None,
        };

        if let (HirExpressionKind::Int(value), Some(bound)) = (&index.kind, bound)
            && (*value < 0 || *value as i64 >= bound)
        {
            return_type_error!(
                format!(
                    "Index {value} is out of range for '{}'",
                    self.type_name(base_type)
                ),
                index.location.clone(),
                {
                    CompilationStage => "HIR Lowering",
                }
            )
        }

        Ok(index)
    }

    // =========================================================================
    // Places
    // =========================================================================

    /// Lowers an expression that is written to. Fails if it isn't a variable or
    /// part of one, or if the variable is read only.
    pub(crate) fn lower_place(&mut self, expression: &Expression) -> Result<HirPlace, CompilerError> {
        let location = expression.location.clone();

        match &expression.kind {
            ExpressionKind::Identifier(name) => {
                let text = self.resolve_name(*name);
                match self.lookup_variable(&text) {
                    Some(ResolvedVariable::Local(slot)) => {
                        let read_only = self
                            .function_state
                            .as_ref()
                            .and_then(|state| state.frame.get(slot.0 as usize))
                            .is_some_and(|variable| variable.read_only);

                        if read_only {
                            return_rule_error!(
                                format!("Can't assign to '{text}', it is const"),
                                location,
                                {
                                    CompilationStage => "HIR Lowering",
                                    VariableName => text,
                                }
                            )
                        }

                        Ok(HirPlace {
                            root: PlaceRoot::Local(slot),
                            projections: Vec::new(),
                            data_type: self.local_type(slot.0)?,
                        })
                    }

                    Some(ResolvedVariable::Global(id)) => {
                        if self.global_is_read_only(id) {
                            let qualifier = match self.global(id).storage {
                                Some(storage) => format!("'{storage}'"),
                                None => "uniform".to_string(),
                            };
                            return_rule_error!(
                                format!("Can't assign to '{text}', {qualifier} variables are read only in a {} shader", self.context.stage),
                                location,
                                {
                                    CompilationStage => "HIR Lowering",
                                    VariableName => text,
                                }
                            )
                        }

                        Ok(HirPlace {
                            root: PlaceRoot::Global(id),
                            projections: Vec::new(),
                            data_type: self.global(id).data_type.clone(),
                        })
                    }

                    None => self.unresolved_variable(&text, location),
                }
            }

            ExpressionKind::Member { base, member } => {
                let mut place = self.lower_place(base)?;
                let member_name = self.resolve_name(*member);

                if let DataType::Struct(struct_name) = &place.data_type {
                    let (index, member_type) =
                        self.struct_member(struct_name, &member_name, &location)?;
                    place.projections.push(Projection::Member(index));
                    place.data_type = member_type;
                    return Ok(place);
                }

                let components = self.parse_swizzle(&member_name, &place.data_type, &location)?;
                let has_repeats = components
                    .iter()
                    .enumerate()
                    .any(|(index, component)| components[..index].contains(component));

                if has_repeats {
                    return_rule_error!(
                        format!("Can't assign to swizzle '.{member_name}', it repeats a component"),
                        location,
                        {
                            CompilationStage => "HIR Lowering",
                        }
                    )
                }

                place.data_type = self.swizzle_type(&place.data_type, components.len());
                place.projections.push(Projection::Swizzle(components));
                Ok(place)
            }

            ExpressionKind::Index { base, index } => {
                let mut place = self.lower_place(base)?;
                let index = self.lower_index_value(index, &place.data_type)?;
                place.data_type = self.indexed_type(&place.data_type, &location)?;
                place.projections.push(Projection::Index(index));
                Ok(place)
            }

            _ => {
                return_rule_error!(
                    "This expression can't be assigned to",
                    location,
                    {
                        CompilationStage => "HIR Lowering",
                        PrimarySuggestion => "Only variables, struct members, swizzles and array elements can be written",
                    }
                )
            }
        }
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn lower_unary(
        &mut self,
        operator: UnaryOperator,
        operand: &Expression,
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let operand = self.lower_expression(operand)?;

        let valid = match operator {
            UnaryOperator::Negate => operand.data_type.is_numeric(),
            UnaryOperator::Not => operand.data_type.is_bool(),
        };

        if !valid {
            let symbol = match operator {
                UnaryOperator::Negate => "-",
                UnaryOperator::Not => "!",
            };
            let found = self.type_name(&operand.data_type);
            return_type_error!(
                format!("Operator '{symbol}' can't be applied to '{found}'"),
                location,
                {
                    CompilationStage => "HIR Lowering",
                    FoundType => found,
                }
            )
        }

        // Negated literals fold, so constant index checks see `-1` as a constant
        let folded = match (operator, &operand.kind) {
            (UnaryOperator::Negate, HirExpressionKind::Int(value)) => {
                Some(HirExpressionKind::Int(value.wrapping_neg()))
            }
            (UnaryOperator::Negate, HirExpressionKind::Float(value)) => {
                Some(HirExpressionKind::Float(-value))
            }
            _ => None,
        };

        let data_type = operand.data_type.clone();
        let kind = folded.unwrap_or_else(|| HirExpressionKind::Unary {
            operator,
            operand: Box::new(operand),
        });

        Ok(HirExpression::new(kind, data_type, location))
    }

    /// Result type of an arithmetic operator, None if the operands don't combine.
    pub(crate) fn arithmetic_type(
        &self,
        operator: BinaryOperator,
        left: &DataType,
        right: &DataType,
    ) -> Option<DataType> {
        if !left.is_numeric() || !right.is_numeric() || left.scalar_kind() != right.scalar_kind() {
            return None;
        }

        if operator == BinaryOperator::Modulus {
            let valid = match self.context.language {
                ShadingLanguage::Glsl => left.scalar_kind() == Some(ScalarKind::Int),
                ShadingLanguage::Hlsl => {
                    !matches!(left, DataType::Matrix { .. })
                        && !matches!(right, DataType::Matrix { .. })
                }
            };
            if !valid {
                return None;
            }
        }

        if operator == BinaryOperator::Multiply {
            match (left, right) {
                (DataType::Matrix { columns, rows }, DataType::Vector(ScalarKind::Float, size))
                    if size == columns =>
                {
                    return Some(DataType::float_vector(*rows));
                }
                (DataType::Vector(ScalarKind::Float, size), DataType::Matrix { columns, rows })
                    if size == rows =>
                {
                    return Some(DataType::float_vector(*columns));
                }
                (
                    DataType::Matrix {
                        columns: left_columns,
                        rows: left_rows,
                    },
                    DataType::Matrix {
                        columns: right_columns,
                        rows: right_rows,
                    },
                ) if left_columns == right_rows => {
                    return Some(DataType::Matrix {
                        columns: *right_columns,
                        rows: *left_rows,
                    });
                }
                _ => {}
            }
        }

        if left == right {
            return Some(left.clone());
        }

        if left.is_scalar() {
            return Some(right.clone());
        }

        if right.is_scalar() {
            return Some(left.clone());
        }

        None
    }

    fn lower_binary(
        &mut self,
        operator: BinaryOperator,
        left: &Expression,
        right: &Expression,
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let left = self.lower_expression(left)?;
        let right = self.lower_expression(right)?;

        let (left, right) = if operator.is_logical() {
            (left, right)
        } else {
            self.promote_operands(left, right)
        };

        let result = if operator.is_logical() {
            (left.data_type.is_bool() && right.data_type.is_bool()).then_some(DataType::BOOL)
        } else if matches!(operator, BinaryOperator::Equal | BinaryOperator::NotEqual) {
            let comparable = !matches!(
                left.data_type,
                DataType::Void | DataType::Sampler2D | DataType::Array(..)
            );
            (comparable && left.data_type == right.data_type).then_some(DataType::BOOL)
        } else if operator.is_comparison() {
            let ordered = matches!(left.data_type, DataType::Scalar(ScalarKind::Int | ScalarKind::Float));
            (ordered && left.data_type == right.data_type).then_some(DataType::BOOL)
        } else {
            self.arithmetic_type(operator, &left.data_type, &right.data_type)
        };

        let Some(data_type) = result else {
            let left_name = self.type_name(&left.data_type);
            let right_name = self.type_name(&right.data_type);
            return_type_error!(
                format!(
                    "Operator '{}' can't be applied to '{left_name}' and '{right_name}'",
                    operator.symbol()
                ),
                location,
                {
                    CompilationStage => "HIR Lowering",
                    ExpectedType => left_name,
                    FoundType => right_name,
                }
            )
        };

        Ok(HirExpression::new(
            HirExpressionKind::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            data_type,
            location,
        ))
    }

    fn lower_ternary(
        &mut self,
        condition: &Expression,
        then_value: &Expression,
        else_value: &Expression,
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let condition = self.lower_expression(condition)?;
        let condition = self.expect_condition(condition)?;

        let then_value = self.lower_expression(then_value)?;
        let else_value = self.lower_expression(else_value)?;
        let (then_value, else_value) = self.promote_operands(then_value, else_value);

        if then_value.data_type != else_value.data_type {
            let then_name = self.type_name(&then_value.data_type);
            let else_name = self.type_name(&else_value.data_type);
            return_type_error!(
                format!("Both sides of '?:' must have the same type, found '{then_name}' and '{else_name}'"),
                location,
                {
                    CompilationStage => "HIR Lowering",
                    ExpectedType => then_name,
                    FoundType => else_name,
                }
            )
        }

        let data_type = then_value.data_type.clone();
        Ok(HirExpression::new(
            HirExpressionKind::Ternary {
                condition: Box::new(condition),
                then_value: Box::new(then_value),
                else_value: Box::new(else_value),
            },
            data_type,
            location,
        ))
    }

    /// Conditions of `if`, loops and `?:` must be a single bool.
    pub(crate) fn expect_condition(
        &self,
        condition: HirExpression,
    ) -> Result<HirExpression, CompilerError> {
        if condition.data_type.is_bool() {
            return Ok(condition);
        }

        let found = self.type_name(&condition.data_type);
        return_type_error!(
            format!("Conditions must be 'bool', found '{found}'"),
            condition.location,
            {
                CompilationStage => "HIR Lowering",
                ExpectedType => "bool",
                FoundType => found,
            }
        )
    }

    fn lower_assignment(
        &mut self,
        operator: Option<BinaryOperator>,
        target: &Expression,
        value: &Expression,
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let target = self.lower_place(target)?;
        let value = self.lower_expression(value)?;

        let value = match operator {
            None => self.coerce(value, &target.data_type, "the assigned value")?,

            Some(operator) => {
                let value = if self.context.config.implicit_int_to_float
                    && value.data_type.is_int_based()
                    && target.data_type.scalar_kind() == Some(ScalarKind::Float)
                {
                    let promoted = value.data_type.to_float_based();
                    Self::convert(value, promoted)
                } else {
                    value
                };

                let result = self.arithmetic_type(operator, &target.data_type, &value.data_type);
                if result.as_ref() != Some(&target.data_type) {
                    let target_name = self.type_name(&target.data_type);
                    let value_name = self.type_name(&value.data_type);
                    return_type_error!(
                        format!(
                            "Operator '{}=' can't combine '{target_name}' with '{value_name}'",
                            operator.symbol()
                        ),
                        location,
                        {
                            CompilationStage => "HIR Lowering",
                            ExpectedType => target_name,
                            FoundType => value_name,
                        }
                    )
                }

                value
            }
        };

        hir_log!(format!("[HIR][Expr] assign to {target}"));

        let data_type = target.data_type.clone();
        Ok(HirExpression::new(
            HirExpressionKind::Assign {
                target,
                operator,
                value: Box::new(value),
            },
            data_type,
            location,
        ))
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// A call is a constructor, a user function or an intrinsic, in that order.
    /// A local variable with the callee's name hides all of them.
    fn lower_call(
        &mut self,
        callee: StringId,
        arguments: &[Expression],
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let name = self.resolve_name(callee);

        if let Some(slot) = self.local_in_scope(&name) {
            let found = self.type_name(&self.local_type(slot.0)?);
            return_type_error!(
                format!("'{name}' is a local variable of type '{found}' and can't be called"),
                location,
                {
                    CompilationStage => "HIR Lowering",
                    VariableName => name,
                    FoundType => found,
                    PrimarySuggestion => "Rename the variable, it hides the function with the same name",
                }
            )
        }

        if let Some(data_type) = self.context.language.builtin_type(&name) {
            return self.lower_constructor(data_type, arguments, location);
        }

        if self.structs_by_name.contains_key(&name) {
            return self.lower_struct_constructor(&name, arguments, location);
        }

        if let Some(&function) = self.functions_by_name.get(&name) {
            return self.lower_function_call(function, arguments, location);
        }

        if let Some(intrinsic) = Intrinsic::lookup(self.context.language, &name, arguments.len()) {
            return self.lower_intrinsic_call(intrinsic, arguments, location);
        }

        return_unresolved_error!(
            format!("Call to undeclared function '{name}'"),
            location,
            {
                CompilationStage => "HIR Lowering",
                VariableName => name,
                PrimarySuggestion => "Functions must be declared or prototyped before they are called",
            }
        )
    }

    fn lower_arguments(
        &mut self,
        arguments: &[Expression],
    ) -> Result<Vec<HirExpression>, CompilerError> {
        arguments
            .iter()
            .map(|argument| self.lower_expression(argument))
            .collect()
    }

    fn lower_constructor(
        &mut self,
        data_type: DataType,
        arguments: &[Expression],
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let type_name = self.type_name(&data_type);

        let Some(needed) = data_type.component_count() else {
            return_type_error!(
                format!("'{type_name}' values can't be constructed"),
                location,
                {
                    CompilationStage => "HIR Lowering",
                }
            )
        };

        if arguments.is_empty() {
            return_type_error!(
                format!("Constructor '{type_name}' needs at least one argument"),
                location,
                {
                    CompilationStage => "HIR Lowering",
                }
            )
        }

        let arguments = self.lower_arguments(arguments)?;
        let mut counts = Vec::with_capacity(arguments.len());
        for argument in &arguments {
            match argument.data_type.component_count() {
                Some(count) => counts.push(count),
                None => {
                    let found = self.type_name(&argument.data_type);
                    return_type_error!(
                        format!("'{found}' can't be used to construct '{type_name}'"),
                        argument.location.clone(),
                        {
                            CompilationStage => "HIR Lowering",
                            FoundType => found,
                        }
                    )
                }
            }
        }

        // One scalar fills or converts, one matrix resizes into another matrix
        let single_fill = arguments.len() == 1
            && (arguments[0].data_type.is_scalar()
                || (matches!(data_type, DataType::Matrix { .. })
                    && matches!(arguments[0].data_type, DataType::Matrix { .. })));

        if !single_fill && !data_type.is_scalar() {
            let total: u32 = counts.iter().sum();
            let last = counts.last().copied().unwrap_or(0);

            if total < needed {
                return_type_error!(
                    format!("Not enough components to construct '{type_name}': needs {needed}, found {total}"),
                    location,
                    {
                        CompilationStage => "HIR Lowering",
                    }
                )
            }

            if total - last >= needed {
                return_type_error!(
                    format!("Too many arguments to construct '{type_name}'"),
                    location,
                    {
                        CompilationStage => "HIR Lowering",
                    }
                )
            }
        }

        if data_type.is_scalar() && arguments.len() != 1 {
            return_type_error!(
                format!("Constructor '{type_name}' takes exactly one argument"),
                location,
                {
                    CompilationStage => "HIR Lowering",
                }
            )
        }

        Ok(HirExpression::new(
            HirExpressionKind::Construct { arguments },
            data_type,
            location,
        ))
    }

    fn lower_struct_constructor(
        &mut self,
        name: &str,
        arguments: &[Expression],
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let member_types: Vec<DataType> = match self.structure(name) {
            Some(structure) => structure
                .members
                .iter()
                .map(|member| member.data_type.clone())
                .collect(),
            None => return_compiler_error!("Struct '{}' vanished from the registry", name),
        };

        if member_types.len() != arguments.len() {
            return_type_error!(
                format!(
                    "Constructor '{name}' expects {} arguments, found {}",
                    member_types.len(),
                    arguments.len()
                ),
                location,
                {
                    CompilationStage => "HIR Lowering",
                }
            )
        }

        let mut lowered = Vec::with_capacity(arguments.len());
        for (index, (argument, member_type)) in arguments.iter().zip(&member_types).enumerate() {
            let value = self.lower_expression(argument)?;
            let what = format!("argument {} of '{name}'", index + 1);
            lowered.push(self.coerce(value, member_type, &what)?);
        }

        Ok(HirExpression::new(
            HirExpressionKind::Construct { arguments: lowered },
            DataType::Struct(name.to_string()),
            location,
        ))
    }

    fn lower_function_call(
        &mut self,
        function: FunctionId,
        arguments: &[Expression],
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        let signature = match self.module.functions.get(function.0 as usize) {
            Some(entry) => entry.signature.clone(),
            None => return_compiler_error!("Function id {} is not registered", function.0),
        };

        if signature.parameters.len() != arguments.len() {
            return_type_error!(
                format!(
                    "'{}' expects {} arguments, found {}",
                    signature.name,
                    signature.parameters.len(),
                    arguments.len()
                ),
                location,
                {
                    CompilationStage => "HIR Lowering",
                    VariableName => signature.name,
                }
            )
        }

        let mut lowered = Vec::with_capacity(arguments.len());
        for (index, (argument, parameter)) in arguments.iter().zip(&signature.parameters).enumerate()
        {
            if parameter.qualifier.by_reference() {
                let place = self.lower_place(argument)?;
                if place.data_type != parameter.data_type {
                    let expected = self.type_name(&parameter.data_type);
                    let found = self.type_name(&place.data_type);
                    return_type_error!(
                        format!(
                            "Argument {} of '{}' is an out parameter of type '{expected}', found '{found}'",
                            index + 1,
                            signature.name
                        ),
                        argument.location.clone(),
                        {
                            CompilationStage => "HIR Lowering",
                            ExpectedType => expected,
                            FoundType => found,
                        }
                    )
                }
                lowered.push(HirArgument::Reference(place));
                continue;
            }

            let value = self.lower_expression(argument)?;
            let what = format!("argument {} of '{}'", index + 1, signature.name);
            lowered.push(HirArgument::Value(self.coerce(
                value,
                &parameter.data_type,
                &what,
            )?));
        }

        if let Some(state) = &self.function_state
            && let Some(edges) = self.call_graph.get_mut(state.id.0 as usize)
        {
            edges.push((function, location.clone()));
        }

        Ok(HirExpression::new(
            HirExpressionKind::Call {
                function,
                arguments: lowered,
            },
            signature.return_type,
            location,
        ))
    }

    fn lower_intrinsic_call(
        &mut self,
        intrinsic: Intrinsic,
        arguments: &[Expression],
        location: TextLocation,
    ) -> Result<HirExpression, CompilerError> {
        if let Some(stage) = intrinsic.required_stage()
            && stage != self.context.stage
        {
            return_rule_error!(
                format!(
                    "'{}' is only available in {stage} shaders",
                    intrinsic.name()
                ),
                location,
                {
                    CompilationStage => "HIR Lowering",
                }
            )
        }

        if arguments.len() != intrinsic.argument_count() {
            return_type_error!(
                format!(
                    "'{}' expects {} arguments, found {}",
                    intrinsic.name(),
                    intrinsic.argument_count(),
                    arguments.len()
                ),
                location,
                {
                    CompilationStage => "HIR Lowering",
                }
            )
        }

        let mut lowered = self.lower_arguments(arguments)?.into_iter();
        let mut next = || lowered.next();
        let (arguments, data_type) = match intrinsic.shape() {
            IntrinsicShape::Void => (Vec::new(), DataType::Void),

            IntrinsicShape::Unary | IntrinsicShape::Length => {
                let Some(a) = next() else {
                    return_compiler_error!("Missing argument for '{}'", intrinsic.name())
                };
                let a = self.generic_float_argument(a, intrinsic, 0)?;
                let data_type = match intrinsic.shape() {
                    IntrinsicShape::Length => DataType::FLOAT,
                    _ => a.data_type.clone(),
                };
                (vec![a], data_type)
            }

            IntrinsicShape::Binary
            | IntrinsicShape::BinaryScalarRight
            | IntrinsicShape::Dot
            | IntrinsicShape::Cross => {
                let (Some(a), Some(b)) = (next(), next()) else {
                    return_compiler_error!("Missing argument for '{}'", intrinsic.name())
                };
                let a = self.generic_float_argument(a, intrinsic, 0)?;
                let allow_scalar = intrinsic.shape() == IntrinsicShape::BinaryScalarRight;
                let b = self.matching_float_argument(b, &a.data_type, allow_scalar, intrinsic, 1)?;

                let data_type = match intrinsic.shape() {
                    IntrinsicShape::Dot => DataType::FLOAT,
                    IntrinsicShape::Cross if a.data_type != DataType::float_vector(3) => {
                        let found = self.type_name(&a.data_type);
                        return_type_error!(
                            format!("'cross' needs 3 component vectors, found '{found}'"),
                            a.location,
                            {
                                CompilationStage => "HIR Lowering",
                                ExpectedType => self.type_name(&DataType::float_vector(3)),
                                FoundType => found,
                            }
                        )
                    }
                    _ => a.data_type.clone(),
                };
                (vec![a, b], data_type)
            }

            IntrinsicShape::Clamp | IntrinsicShape::Mix | IntrinsicShape::Refract => {
                let (Some(a), Some(b), Some(c)) = (next(), next(), next()) else {
                    return_compiler_error!("Missing argument for '{}'", intrinsic.name())
                };
                let a = self.generic_float_argument(a, intrinsic, 0)?;
                let shape = intrinsic.shape();

                let b = self.matching_float_argument(
                    b,
                    &a.data_type,
                    shape == IntrinsicShape::Clamp,
                    intrinsic,
                    1,
                )?;
                let c = match shape {
                    IntrinsicShape::Refract => {
                        self.matching_float_argument(c, &DataType::FLOAT, false, intrinsic, 2)?
                    }
                    _ => self.matching_float_argument(c, &a.data_type, true, intrinsic, 2)?,
                };

                let data_type = a.data_type.clone();
                (vec![a, b, c], data_type)
            }

            IntrinsicShape::Step => {
                let (Some(edge), Some(x)) = (next(), next()) else {
                    return_compiler_error!("Missing argument for '{}'", intrinsic.name())
                };
                let x = self.generic_float_argument(x, intrinsic, 1)?;
                let edge = self.matching_float_argument(edge, &x.data_type, true, intrinsic, 0)?;
                let data_type = x.data_type.clone();
                (vec![edge, x], data_type)
            }

            IntrinsicShape::Smoothstep => {
                let (Some(low), Some(high), Some(x)) = (next(), next(), next()) else {
                    return_compiler_error!("Missing argument for '{}'", intrinsic.name())
                };
                let x = self.generic_float_argument(x, intrinsic, 2)?;
                let low = self.matching_float_argument(low, &x.data_type, true, intrinsic, 0)?;
                let high = self.matching_float_argument(high, &x.data_type, true, intrinsic, 1)?;
                let data_type = x.data_type.clone();
                (vec![low, high, x], data_type)
            }

            IntrinsicShape::Texture => {
                let (Some(sampler), Some(coordinates)) = (next(), next()) else {
                    return_compiler_error!("Missing argument for '{}'", intrinsic.name())
                };
                if sampler.data_type != DataType::Sampler2D {
                    let found = self.type_name(&sampler.data_type);
                    return_type_error!(
                        format!("The first argument of a texture lookup must be a sampler, found '{found}'"),
                        sampler.location,
                        {
                            CompilationStage => "HIR Lowering",
                            ExpectedType => "sampler2D",
                            FoundType => found,
                        }
                    )
                }
                let coordinates =
                    self.coerce(coordinates, &DataType::float_vector(2), "texture coordinates")?;
                (vec![sampler, coordinates], DataType::float_vector(4))
            }

            IntrinsicShape::MatrixMultiply => {
                let (Some(a), Some(b)) = (next(), next()) else {
                    return_compiler_error!("Missing argument for '{}'", intrinsic.name())
                };
                let (a, b) = self.promote_operands(a, b);
                let Some(data_type) =
                    self.arithmetic_type(BinaryOperator::Multiply, &a.data_type, &b.data_type)
                else {
                    let left = self.type_name(&a.data_type);
                    let right = self.type_name(&b.data_type);
                    return_type_error!(
                        format!("'mul' can't multiply '{left}' by '{right}'"),
                        location,
                        {
                            CompilationStage => "HIR Lowering",
                            ExpectedType => left,
                            FoundType => right,
                        }
                    )
                };
                (vec![a, b], data_type)
            }
        };

        Ok(HirExpression::new(
            HirExpressionKind::Intrinsic {
                intrinsic,
                arguments,
            },
            data_type,
            location,
        ))
    }
}

fn step_symbol(operator: StepOperator) -> &'static str {
    match operator {
        StepOperator::PreIncrement | StepOperator::PostIncrement => "++",
        StepOperator::PreDecrement | StepOperator::PostDecrement => "--",
    }
}
