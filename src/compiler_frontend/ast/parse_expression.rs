use crate::compiler_frontend::ast::ast::ParseContext;
use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, Expression, ExpressionKind, StepOperator, UnaryOperator,
};
use crate::compiler_frontend::ast::statements::declarations::{expect_symbol, expect_token};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{ShaderTokens, TokenKind};
use crate::{ast_log, return_syntax_error};

/// Full expression. The translator has no comma operator so this is an assignment expression.
pub fn parse_expression(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Expression, CompilerError> {
    parse_assignment(token_stream, context)
}

/// Assignment is right associative: `a = b = c` assigns `c` to `b` first.
pub fn parse_assignment(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Expression, CompilerError> {
    let _nesting = context.nest(token_stream)?;
    let target = parse_ternary(token_stream, context)?;

    let operator = match token_stream.current_token_kind() {
        TokenKind::Assign => None,
        TokenKind::AddAssign => Some(BinaryOperator::Add),
        TokenKind::SubtractAssign => Some(BinaryOperator::Subtract),
        TokenKind::MultiplyAssign => Some(BinaryOperator::Multiply),
        TokenKind::DivideAssign => Some(BinaryOperator::Divide),
        TokenKind::ModulusAssign => Some(BinaryOperator::Modulus),
        _ => return Ok(target),
    };
    token_stream.advance();

    let value = parse_assignment(token_stream, context)?;
    let location = target.location.to(&value.location);

    Ok(Expression::new(
        ExpressionKind::Assign {
            operator,
            target: Box::new(target),
            value: Box::new(value),
        },
        location,
    ))
}

fn parse_ternary(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Expression, CompilerError> {
    let condition = parse_binary(token_stream, context, 1)?;

    if !token_stream.eat(&TokenKind::QuestionMark) {
        return Ok(condition);
    }
    let _nesting = context.nest(token_stream)?;

    let then_value = parse_expression(token_stream, context)?;
    expect_token(token_stream, context, &TokenKind::Colon)?;
    let else_value = parse_ternary(token_stream, context)?;
    let location = condition.location.to(&else_value.location);

    Ok(Expression::new(
        ExpressionKind::Ternary {
            condition: Box::new(condition),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
        },
        location,
    ))
}

fn binary_operator(kind: &TokenKind) -> Option<BinaryOperator> {
    let operator = match kind {
        TokenKind::Add => BinaryOperator::Add,
        TokenKind::Subtract => BinaryOperator::Subtract,
        TokenKind::Multiply => BinaryOperator::Multiply,
        TokenKind::Divide => BinaryOperator::Divide,
        TokenKind::Modulus => BinaryOperator::Modulus,
        TokenKind::Equal => BinaryOperator::Equal,
        TokenKind::NotEqual => BinaryOperator::NotEqual,
        TokenKind::LessThan => BinaryOperator::LessThan,
        TokenKind::LessThanOrEqual => BinaryOperator::LessThanOrEqual,
        TokenKind::GreaterThan => BinaryOperator::GreaterThan,
        TokenKind::GreaterThanOrEqual => BinaryOperator::GreaterThanOrEqual,
        TokenKind::And => BinaryOperator::And,
        TokenKind::Or => BinaryOperator::Or,
        _ => return None,
    };

    Some(operator)
}

/// Precedence climbing over the left associative binary operators.
fn parse_binary(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
    minimum_precedence: u8,
) -> Result<Expression, CompilerError> {
    let mut left = parse_unary(token_stream, context)?;

    // Every operator in a chain adds a level to the left leaning tree
    let mut chain = Vec::new();

    while let Some(operator) = binary_operator(token_stream.current_token_kind()) {
        let precedence = operator.precedence();
        if precedence < minimum_precedence {
            break;
        }

        chain.push(context.nest(token_stream)?);
        token_stream.advance();
        let right = parse_binary(token_stream, context, precedence + 1)?;
        let location = left.location.to(&right.location);

        left = Expression::new(
            ExpressionKind::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            location,
        );
    }

    Ok(left)
}

fn parse_unary(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Expression, CompilerError> {
    let location = token_stream.current_location();

    let prefix = match token_stream.current_token_kind() {
        TokenKind::Subtract => Some(Prefix::Unary(UnaryOperator::Negate)),
        TokenKind::Not => Some(Prefix::Unary(UnaryOperator::Not)),
        TokenKind::Increment => Some(Prefix::Step(StepOperator::PreIncrement)),
        TokenKind::Decrement => Some(Prefix::Step(StepOperator::PreDecrement)),

        // Unary plus does nothing
        TokenKind::Add => {
            let _nesting = context.nest(token_stream)?;
            token_stream.advance();
            return parse_unary(token_stream, context);
        }
        _ => None,
    };

    let Some(prefix) = prefix else {
        return parse_postfix(token_stream, context);
    };

    let _nesting = context.nest(token_stream)?;
    token_stream.advance();
    let operand = Box::new(parse_unary(token_stream, context)?);
    let location = location.to(&operand.location);

    let kind = match prefix {
        Prefix::Unary(operator) => ExpressionKind::Unary { operator, operand },
        Prefix::Step(operator) => ExpressionKind::Step { operator, operand },
    };

    Ok(Expression::new(kind, location))
}

enum Prefix {
    Unary(UnaryOperator),
    Step(StepOperator),
}

/// Member access, swizzles, indexing and postfix `++`/`--`.
fn parse_postfix(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Expression, CompilerError> {
    let mut expression = parse_primary(token_stream, context)?;
    let mut chain = Vec::new();

    loop {
        if matches!(
            token_stream.current_token_kind(),
            TokenKind::Dot | TokenKind::OpenBracket | TokenKind::Increment | TokenKind::Decrement
        ) {
            chain.push(context.nest(token_stream)?);
        }

        match token_stream.current_token_kind() {
            TokenKind::Dot => {
                token_stream.advance();
                let (member, member_location) =
                    expect_symbol(token_stream, context, "a member name or swizzle")?;
                let location = expression.location.to(&member_location);

                expression = Expression::new(
                    ExpressionKind::Member {
                        base: Box::new(expression),
                        member,
                    },
                    location,
                );
            }

            TokenKind::OpenBracket => {
                token_stream.advance();
                let index = parse_expression(token_stream, context)?;
                let end = expect_token(token_stream, context, &TokenKind::CloseBracket)?;
                let location = expression.location.to(&end);

                expression = Expression::new(
                    ExpressionKind::Index {
                        base: Box::new(expression),
                        index: Box::new(index),
                    },
                    location,
                );
            }

            TokenKind::Increment | TokenKind::Decrement => {
                let operator = match token_stream.current_token_kind() {
                    TokenKind::Increment => StepOperator::PostIncrement,
                    _ => StepOperator::PostDecrement,
                };
                let location = expression.location.to(&token_stream.current_location());
                token_stream.advance();

                expression = Expression::new(
                    ExpressionKind::Step {
                        operator,
                        operand: Box::new(expression),
                    },
                    location,
                );
            }

            _ => return Ok(expression),
        }
    }
}

fn parse_primary(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Expression, CompilerError> {
    let location = token_stream.current_location();
    ast_log!("Parsing token (expression): ", #token_stream.current_token_kind());

    let kind = match token_stream.current_token_kind() {
        TokenKind::IntLiteral(value) => ExpressionKind::IntLiteral(*value),
        TokenKind::FloatLiteral(value) => ExpressionKind::FloatLiteral(*value),
        TokenKind::BoolLiteral(value) => ExpressionKind::BoolLiteral(*value),

        TokenKind::OpenParenthesis => {
            token_stream.advance();
            let inner = parse_expression(token_stream, context)?;
            expect_token(token_stream, context, &TokenKind::CloseParenthesis)?;
            return Ok(inner);
        }

        TokenKind::Symbol(name) => {
            let name = *name;
            token_stream.advance();

            if token_stream.current_token_kind() != &TokenKind::OpenParenthesis {
                return Ok(Expression::new(ExpressionKind::Identifier(name), location));
            }

            token_stream.advance();
            let arguments = parse_arguments(token_stream, context)?;
            let location = location.to(&token_stream.previous_location());

            return Ok(Expression::new(
                ExpressionKind::Call {
                    callee: name,
                    arguments,
                },
                location,
            ));
        }

        _ => {
            return_syntax_error!(
                format!(
                    "Expected an expression, found {}",
                    context.describe_current(token_stream)
                ),
                location,
                {
                    CompilationStage => "Expression Parsing",
                }
            )
        }
    };

    token_stream.advance();
    Ok(Expression::new(kind, location))
}

/// Call arguments after the `(`, including the `)`.
fn parse_arguments(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Vec<Expression>, CompilerError> {
    let mut arguments = Vec::new();

    if token_stream.eat(&TokenKind::CloseParenthesis) {
        return Ok(arguments);
    }

    loop {
        arguments.push(parse_assignment(token_stream, context)?);

        if !token_stream.eat(&TokenKind::Comma) {
            break;
        }
    }

    expect_token(token_stream, context, &TokenKind::CloseParenthesis)?;
    Ok(arguments)
}
