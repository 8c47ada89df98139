use crate::compiler_frontend::ast::ast::ParseContext;
use crate::compiler_frontend::ast::ast_nodes::{
    CBufferDeclaration, Declarator, MemberDeclaration, StructDeclaration,
};
use crate::compiler_frontend::ast::statements::declarations::{
    expect_symbol, expect_token, parse_array_suffix, parse_semantic, parse_type_name,
};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{ShaderTokens, TokenKind};
use crate::{ast_log, return_syntax_error};

/// `struct Light { vec3 pos; float radius; };`
pub fn parse_struct(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<StructDeclaration, CompilerError> {
    let location = expect_token(token_stream, context, &TokenKind::Struct)?;
    let (name, _) = expect_symbol(token_stream, context, "a struct name")?;

    let members = parse_member_block(token_stream, context, "struct")?;
    if members.is_empty() {
        return_syntax_error!(
            format!(
                "Struct '{}' must declare at least one member",
                context.string_table.resolve(name)
            ),
            location,
            {
                CompilationStage => "Parsing",
            }
        )
    }

    if token_stream.current_token_kind() != &TokenKind::Semicolon {
        return_syntax_error!(
            format!(
                "Expected ';' after the struct definition, found {}",
                context.describe_current(token_stream)
            ),
            token_stream.previous_location(),
            {
                CompilationStage => "Parsing",
                PrimarySuggestion => "Declare variables of the struct type in a separate declaration",
                SuggestedInsertion => ";",
            }
        )
    }
    token_stream.advance();

    Ok(StructDeclaration {
        name,
        members,
        location,
    })
}

/// `cbuffer PerFrame : register(b0) { float4x4 view; };`
pub fn parse_cbuffer(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<CBufferDeclaration, CompilerError> {
    expect_token(token_stream, context, &TokenKind::CBuffer)?;
    let (name, _) = expect_symbol(token_stream, context, "a cbuffer name")?;

    let mut register = None;
    if token_stream.eat(&TokenKind::Colon) {
        let (keyword, keyword_location) = expect_symbol(token_stream, context, "'register'")?;
        if !keyword.eq_str(context.string_table, "register") {
            return_syntax_error!(
                format!(
                    "Expected 'register' after ':' on a cbuffer, found '{}'",
                    context.string_table.resolve(keyword)
                ),
                keyword_location,
                {
                    CompilationStage => "Parsing",
                }
            )
        }

        expect_token(token_stream, context, &TokenKind::OpenParenthesis)?;
        let (slot, _) = expect_symbol(token_stream, context, "a register slot")?;
        expect_token(token_stream, context, &TokenKind::CloseParenthesis)?;
        register = Some(slot);
    }

    let members = parse_member_block(token_stream, context, "cbuffer")?;

    // The trailing semicolon is optional on a cbuffer
    token_stream.eat(&TokenKind::Semicolon);

    ast_log!("Parsed cbuffer with ", members.len(), " members");

    Ok(CBufferDeclaration {
        name,
        register,
        members,
    })
}

/// `{ type a, b[2] : SEM; ... }` without initializers.
fn parse_member_block(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
    owner: &str,
) -> Result<Vec<MemberDeclaration>, CompilerError> {
    expect_token(token_stream, context, &TokenKind::OpenCurly)?;

    let mut members = Vec::new();
    while !token_stream.eat(&TokenKind::CloseCurly) {
        if token_stream.current_token_kind() == &TokenKind::Eof {
            return_syntax_error!(
                format!("Unterminated {owner} body, expected '}}'"),
                token_stream.current_location(),
                {
                    CompilationStage => "Parsing",
                    SuggestedInsertion => "}",
                }
            )
        }

        let type_name = parse_type_name(token_stream, context)?;

        loop {
            let (name, location) = expect_symbol(token_stream, context, "a member name")?;
            let array_length = parse_array_suffix(token_stream, context)?;
            let semantic = parse_semantic(token_stream, context)?;

            if token_stream.current_token_kind() == &TokenKind::Assign {
                return_syntax_error!(
                    format!("Members of a {owner} can't have initializers"),
                    token_stream.current_location(),
                    {
                        CompilationStage => "Parsing",
                    }
                )
            }

            members.push(MemberDeclaration {
                type_name: type_name.clone(),
                declarator: Declarator {
                    name,
                    array_length,
                    semantic,
                    initializer: None,
                    location,
                },
            });

            if !token_stream.eat(&TokenKind::Comma) {
                break;
            }
        }

        expect_token(token_stream, context, &TokenKind::Semicolon)?;
    }

    Ok(members)
}
