use crate::compiler_frontend::ast::ast::ParseContext;
use crate::compiler_frontend::ast::ast_nodes::{FunctionDeclaration, ParameterDeclaration};
use crate::compiler_frontend::ast::statements::declarations::{
    DeclarationHead, expect_token, parse_array_suffix, parse_semantic, parse_type_name,
};
use crate::compiler_frontend::ast::statements::statements::parse_block;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::symbols::ParameterQualifier;
use crate::compiler_frontend::tokenizer::tokens::{ShaderTokens, TokenKind};
use crate::return_syntax_error;

/// Parses the parameter list and body of a function whose return type and name are in `head`.
/// Ending in `;` instead of a body makes it a prototype.
pub fn parse_function(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
    head: DeclarationHead,
) -> Result<FunctionDeclaration, CompilerError> {
    if let Some(storage) = head.storage {
        return_syntax_error!(
            format!("Functions can't be declared '{storage}'"),
            head.type_name.location,
            {
                CompilationStage => "Parsing",
            }
        )
    }

    if !head.layout.is_empty() {
        return_syntax_error!(
            "layout qualifiers can't be applied to functions",
            head.type_name.location,
            {
                CompilationStage => "Parsing",
            }
        )
    }

    expect_token(token_stream, context, &TokenKind::OpenParenthesis)?;
    let parameters = parse_parameters(token_stream, context)?;
    let return_semantic = parse_semantic(token_stream, context)?;

    let body = if token_stream.eat(&TokenKind::Semicolon) {
        None
    } else if token_stream.current_token_kind() == &TokenKind::OpenCurly {
        Some(parse_block(token_stream, context)?)
    } else {
        return_syntax_error!(
            format!(
                "Expected a function body or ';', found {}",
                context.describe_current(token_stream)
            ),
            token_stream.current_location(),
            {
                CompilationStage => "Parsing",
            }
        )
    };

    Ok(FunctionDeclaration {
        return_type: head.type_name,
        name: head.name,
        parameters,
        return_semantic,
        body,
        location: head.name_location,
    })
}

/// Everything after the opening parenthesis, including the closing one.
fn parse_parameters(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Vec<ParameterDeclaration>, CompilerError> {
    let mut parameters = Vec::new();

    if token_stream.eat(&TokenKind::CloseParenthesis) {
        return Ok(parameters);
    }

    // f(void)
    if let TokenKind::Symbol(id) = token_stream.current_token_kind()
        && id.eq_str(context.string_table, "void")
        && token_stream.peek_next_token() == Some(&TokenKind::CloseParenthesis)
    {
        token_stream.advance();
        token_stream.advance();
        return Ok(parameters);
    }

    loop {
        let location = token_stream.current_location();
        let mut is_const = false;
        let mut qualifier: Option<ParameterQualifier> = None;

        loop {
            let next = match token_stream.current_token_kind() {
                TokenKind::Const => {
                    is_const = true;
                    token_stream.advance();
                    continue;
                }
                TokenKind::PrecisionQualifier => {
                    token_stream.advance();
                    continue;
                }
                TokenKind::In => ParameterQualifier::In,
                TokenKind::Out => ParameterQualifier::Out,
                TokenKind::InOut => ParameterQualifier::InOut,
                _ => break,
            };

            if qualifier.is_some() {
                return_syntax_error!(
                    "A parameter can only have one of 'in', 'out' or 'inout'",
                    token_stream.current_location(),
                    {
                        CompilationStage => "Parsing",
                    }
                )
            }

            qualifier = Some(next);
            token_stream.advance();
        }

        let qualifier = qualifier.unwrap_or_default();
        if is_const && qualifier.by_reference() {
            return_syntax_error!(
                "A 'const' parameter can't be 'out' or 'inout'",
                location,
                {
                    CompilationStage => "Parsing",
                }
            )
        }

        let type_name = parse_type_name(token_stream, context)?;

        let name = match token_stream.current_token_kind() {
            TokenKind::Symbol(id) => {
                let id = *id;
                token_stream.advance();
                Some(id)
            }
            _ => None,
        };

        let array_length = parse_array_suffix(token_stream, context)?;
        let semantic = parse_semantic(token_stream, context)?;

        parameters.push(ParameterDeclaration {
            qualifier,
            is_const,
            type_name,
            name,
            array_length,
            semantic,
            location: location.to(&token_stream.previous_location()),
        });

        if !token_stream.eat(&TokenKind::Comma) {
            break;
        }
    }

    expect_token(token_stream, context, &TokenKind::CloseParenthesis)?;
    Ok(parameters)
}
