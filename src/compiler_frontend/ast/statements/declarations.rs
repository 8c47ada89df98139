use crate::compiler_frontend::ast::ast::ParseContext;
use crate::compiler_frontend::ast::ast_nodes::{Declarator, TypeName, VariableDeclaration};
use crate::compiler_frontend::ast::parse_expression::parse_assignment;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::string_interning::StringId;
use crate::compiler_frontend::symbols::{LayoutEntry, StorageQualifier};
use crate::compiler_frontend::tokenizer::tokens::{ShaderTokens, TextLocation, TokenKind};
use crate::return_syntax_error;

/// Everything in front of the declared name: `layout(location = 0) out vec4 colour`
pub struct DeclarationHead {
    pub storage: Option<StorageQualifier>,
    pub layout: Vec<LayoutEntry>,
    pub type_name: TypeName,
    pub name: StringId,
    pub name_location: TextLocation,
}

pub fn expect_token(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
    expected: &TokenKind,
) -> Result<TextLocation, CompilerError> {
    if token_stream.current_token_kind() == expected {
        let location = token_stream.current_location();
        token_stream.advance();
        return Ok(location);
    }

    let expected_text = expected.describe(context.string_table);

    // Point at the end of the previous token for a missing terminator
    let location = match expected {
        TokenKind::Semicolon | TokenKind::CloseParenthesis | TokenKind::CloseBracket => {
            token_stream.previous_location()
        }
        _ => token_stream.current_location(),
    };

    return_syntax_error!(
        format!(
            "Expected {expected_text}, found {}",
            context.describe_current(token_stream)
        ),
        location,
        {
            CompilationStage => "Parsing",
            SuggestedInsertion => expected_text.trim_matches('\''),
        }
    )
}

pub fn expect_symbol(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
    what: &str,
) -> Result<(StringId, TextLocation), CompilerError> {
    if let TokenKind::Symbol(id) = token_stream.current_token_kind() {
        let id = *id;
        let location = token_stream.current_location();
        token_stream.advance();
        return Ok((id, location));
    }

    return_syntax_error!(
        format!(
            "Expected {what}, found {}",
            context.describe_current(token_stream)
        ),
        token_stream.current_location(),
        {
            CompilationStage => "Parsing",
        }
    )
}

/// Type name, skipping any GLSL precision qualifier in front of it.
pub fn parse_type_name(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<TypeName, CompilerError> {
    token_stream.eat(&TokenKind::PrecisionQualifier);
    let (name, location) = expect_symbol(token_stream, context, "a type name")?;
    Ok(TypeName { name, location })
}

/// `layout(location = 0, std140)`
pub fn parse_layout(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Vec<LayoutEntry>, CompilerError> {
    let mut entries = Vec::new();
    if !token_stream.eat(&TokenKind::Layout) {
        return Ok(entries);
    }

    expect_token(token_stream, context, &TokenKind::OpenParenthesis)?;

    loop {
        let (name, _) = expect_symbol(token_stream, context, "a layout qualifier")?;
        let mut value = None;

        if token_stream.eat(&TokenKind::Assign) {
            match token_stream.current_token_kind() {
                TokenKind::IntLiteral(number) => value = Some(*number),
                _ => {
                    return_syntax_error!(
                        format!(
                            "Layout qualifier values must be integer literals, found {}",
                            context.describe_current(token_stream)
                        ),
                        token_stream.current_location(),
                        {
                            CompilationStage => "Parsing",
                        }
                    )
                }
            }
            token_stream.advance();
        }

        entries.push(LayoutEntry {
            name: context.string_table.resolve(name).to_string(),
            value,
        });

        if !token_stream.eat(&TokenKind::Comma) {
            break;
        }
    }

    expect_token(token_stream, context, &TokenKind::CloseParenthesis)?;
    Ok(entries)
}

/// Storage qualifiers in front of a declaration.
/// HLSL `static const` collapses to `const`, any other combination is rejected.
pub fn parse_storage_qualifier(
    token_stream: &mut ShaderTokens,
) -> Result<Option<StorageQualifier>, CompilerError> {
    let mut found: Option<StorageQualifier> = None;

    loop {
        let qualifier = match token_stream.current_token_kind() {
            TokenKind::Const => StorageQualifier::Const,
            TokenKind::Uniform => StorageQualifier::Uniform,
            TokenKind::In => StorageQualifier::In,
            TokenKind::Out => StorageQualifier::Out,
            TokenKind::Attribute => StorageQualifier::Attribute,
            TokenKind::Varying => StorageQualifier::Varying,
            TokenKind::Static => StorageQualifier::Static,
            TokenKind::GroupShared => StorageQualifier::GroupShared,
            TokenKind::PrecisionQualifier => {
                token_stream.advance();
                continue;
            }
            _ => return Ok(found),
        };

        found = match (found, qualifier) {
            (None, qualifier) => Some(qualifier),
            (Some(StorageQualifier::Static), StorageQualifier::Const)
            | (Some(StorageQualifier::Const), StorageQualifier::Static) => {
                Some(StorageQualifier::Const)
            }
            (Some(previous), qualifier) => {
                return_syntax_error!(
                    format!("'{qualifier}' can't be combined with '{previous}'"),
                    token_stream.current_location(),
                    {
                        CompilationStage => "Parsing",
                    }
                )
            }
        };

        token_stream.advance();
    }
}

pub fn parse_declaration_head(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<DeclarationHead, CompilerError> {
    let layout = parse_layout(token_stream, context)?;
    let storage = parse_storage_qualifier(token_stream)?;

    if token_stream.current_token_kind() == &TokenKind::InOut {
        return_syntax_error!(
            "'inout' is only valid on function parameters",
            token_stream.current_location(),
            {
                CompilationStage => "Parsing",
            }
        )
    }

    let type_name = parse_type_name(token_stream, context)?;
    let (name, name_location) = expect_symbol(token_stream, context, "a declaration name")?;

    Ok(DeclarationHead {
        storage,
        layout,
        type_name,
        name,
        name_location,
    })
}

/// `[4]` after a declared name. Sizes must be positive integer literals.
pub fn parse_array_suffix(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Option<u32>, CompilerError> {
    if !token_stream.eat(&TokenKind::OpenBracket) {
        return Ok(None);
    }

    let length = match token_stream.current_token_kind() {
        TokenKind::IntLiteral(length) if *length > 0 => *length as u32,
        _ => {
            return_syntax_error!(
                format!(
                    "Array sizes must be positive integer literals, found {}",
                    context.describe_current(token_stream)
                ),
                token_stream.current_location(),
                {
                    CompilationStage => "Parsing",
                }
            )
        }
    };

    token_stream.advance();
    expect_token(token_stream, context, &TokenKind::CloseBracket)?;
    Ok(Some(length))
}

/// HLSL `: SEMANTIC` annotation.
pub fn parse_semantic(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
) -> Result<Option<StringId>, CompilerError> {
    if !context.language.has_semantics() || !token_stream.eat(&TokenKind::Colon) {
        return Ok(None);
    }

    let (semantic, _) = expect_symbol(token_stream, context, "a semantic name")?;
    Ok(Some(semantic))
}

/// The rest of a declaration list after the first name, up to and including the `;`.
pub fn parse_variable_declarators(
    token_stream: &mut ShaderTokens,
    context: &ParseContext,
    head: DeclarationHead,
) -> Result<VariableDeclaration, CompilerError> {
    let location = head.type_name.location.clone();
    let mut declarators = Vec::with_capacity(1);

    let mut name = head.name;
    let mut name_location = head.name_location;

    loop {
        let array_length = parse_array_suffix(token_stream, context)?;
        let semantic = parse_semantic(token_stream, context)?;

        let initializer = if token_stream.eat(&TokenKind::Assign) {
            Some(parse_assignment(token_stream, context)?)
        } else {
            None
        };

        declarators.push(Declarator {
            name,
            array_length,
            semantic,
            initializer,
            location: name_location,
        });

        if !token_stream.eat(&TokenKind::Comma) {
            break;
        }

        (name, name_location) = expect_symbol(token_stream, context, "a declaration name")?;
    }

    expect_token(token_stream, context, &TokenKind::Semicolon)?;

    Ok(VariableDeclaration {
        storage: head.storage,
        layout: head.layout,
        type_name: head.type_name,
        declarators,
        location,
    })
}
