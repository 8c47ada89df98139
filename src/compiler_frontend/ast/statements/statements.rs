use crate::compiler_frontend::ast::ast::ParseContext;
use crate::compiler_frontend::ast::ast_nodes::{Block, Expression, Statement, StatementKind};
use crate::compiler_frontend::ast::parse_expression::parse_expression;
use crate::compiler_frontend::ast::statements::declarations::{
    expect_token, parse_declaration_head, parse_variable_declarators,
};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{ShaderTokens, TokenKind};
use crate::{ast_log, return_syntax_error};

/// `{ ... }`
pub fn parse_block(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Block, CompilerError> {
    let start = expect_token(token_stream, context, &TokenKind::OpenCurly)?;
    let mut statements = Vec::new();

    loop {
        match token_stream.current_token_kind() {
            TokenKind::CloseCurly => break,
            TokenKind::Eof => {
                return_syntax_error!(
                    "Unexpected end of file inside a block, expected '}'",
                    token_stream.current_location(),
                    {
                        CompilationStage => "Parsing",
                        SuggestedInsertion => "}",
                    }
                )
            }
            _ => statements.push(parse_statement(token_stream, context)?),
        }
    }

    let end = token_stream.current_location();
    token_stream.advance();

    Ok(Block {
        statements,
        location: start.to(&end),
    })
}

pub fn parse_statement(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Statement, CompilerError> {
    let location = token_stream.current_location();
    let _nesting = context.nest(token_stream)?;

    let kind = match token_stream.current_token_kind() {
        TokenKind::OpenCurly => StatementKind::Block(parse_block(token_stream, context)?),

        TokenKind::Semicolon => {
            token_stream.advance();
            StatementKind::Empty
        }

        TokenKind::If => {
            ast_log!("Creating If Statement");
            token_stream.advance();
            let condition = parse_condition(token_stream, context)?;
            let then_branch = Box::new(parse_statement(token_stream, context)?);
            let else_branch = if token_stream.eat(&TokenKind::Else) {
                Some(Box::new(parse_statement(token_stream, context)?))
            } else {
                None
            };

            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            }
        }

        TokenKind::While => {
            token_stream.advance();
            let condition = parse_condition(token_stream, context)?;
            let body = Box::new(parse_statement(token_stream, context)?);
            StatementKind::While { condition, body }
        }

        TokenKind::Do => {
            token_stream.advance();
            let body = Box::new(parse_statement(token_stream, context)?);
            expect_token(token_stream, context, &TokenKind::While)?;
            let condition = parse_condition(token_stream, context)?;
            expect_token(token_stream, context, &TokenKind::Semicolon)?;
            StatementKind::DoWhile { body, condition }
        }

        TokenKind::For => parse_for(token_stream, context)?,

        TokenKind::Return => {
            token_stream.advance();
            let value = if token_stream.current_token_kind() == &TokenKind::Semicolon {
                None
            } else {
                Some(parse_expression(token_stream, context)?)
            };
            expect_token(token_stream, context, &TokenKind::Semicolon)?;
            StatementKind::Return(value)
        }

        TokenKind::Break => {
            token_stream.advance();
            expect_token(token_stream, context, &TokenKind::Semicolon)?;
            StatementKind::Break
        }

        TokenKind::Continue => {
            token_stream.advance();
            expect_token(token_stream, context, &TokenKind::Semicolon)?;
            StatementKind::Continue
        }

        TokenKind::Discard => {
            token_stream.advance();
            expect_token(token_stream, context, &TokenKind::Semicolon)?;
            StatementKind::Discard
        }

        TokenKind::Else => {
            return_syntax_error!(
                "'else' without a matching 'if'",
                location,
                {
                    CompilationStage => "Parsing",
                }
            )
        }

        _ => parse_simple_statement(token_stream, context)?,
    };

    Ok(Statement {
        kind,
        location: location.to(&token_stream.previous_location()),
    })
}

/// Declaration or expression statement, including the `;`.
/// Also the only statements allowed in a `for` initializer.
fn parse_simple_statement(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<StatementKind, CompilerError> {
    if starts_declaration(token_stream) {
        let head = parse_declaration_head(token_stream, context)?;
        let declaration = parse_variable_declarators(token_stream, context, head)?;
        return Ok(StatementKind::Declaration(declaration));
    }

    let expression = parse_expression(token_stream, context)?;
    expect_token(token_stream, context, &TokenKind::Semicolon)?;
    Ok(StatementKind::Expression(expression))
}

/// A type name followed by a name, or any qualifier, starts a declaration.
fn starts_declaration(token_stream: &ShaderTokens) -> bool {
    let current = token_stream.current_token_kind();
    if current.is_storage_qualifier()
        || matches!(current, TokenKind::PrecisionQualifier | TokenKind::Layout)
    {
        return true;
    }

    matches!(current, TokenKind::Symbol(_))
        && matches!(token_stream.peek_next_token(), Some(TokenKind::Symbol(_)))
}

/// `( expression )`
fn parse_condition(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Expression, CompilerError> {
    expect_token(token_stream, context, &TokenKind::OpenParenthesis)?;
    let condition = parse_expression(token_stream, context)?;
    expect_token(token_stream, context, &TokenKind::CloseParenthesis)?;
    Ok(condition)
}

/// `for (init; condition; step) body`. Any of the three header parts can be empty.
fn parse_for(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<StatementKind, CompilerError> {
    expect_token(token_stream, context, &TokenKind::For)?;
    expect_token(token_stream, context, &TokenKind::OpenParenthesis)?;

    let init = if token_stream.eat(&TokenKind::Semicolon) {
        None
    } else {
        let location = token_stream.current_location();
        let kind = parse_simple_statement(token_stream, context)?;
        Some(Box::new(Statement {
            kind,
            location: location.to(&token_stream.previous_location()),
        }))
    };

    let condition = if token_stream.current_token_kind() == &TokenKind::Semicolon {
        None
    } else {
        Some(parse_expression(token_stream, context)?)
    };
    expect_token(token_stream, context, &TokenKind::Semicolon)?;

    let step = if token_stream.current_token_kind() == &TokenKind::CloseParenthesis {
        None
    } else {
        Some(parse_expression(token_stream, context)?)
    };
    expect_token(token_stream, context, &TokenKind::CloseParenthesis)?;

    let body = Box::new(parse_statement(token_stream, context)?);

    Ok(StatementKind::For {
        init,
        condition,
        step,
        body,
    })
}
