use crate::compiler_frontend::ast::ast_nodes::{Declaration, ShaderAst};
use crate::compiler_frontend::ast::statements::declarations::{
    expect_token, parse_declaration_head, parse_variable_declarators,
};
use crate::compiler_frontend::ast::statements::functions::parse_function;
use crate::compiler_frontend::ast::statements::structs::{parse_cbuffer, parse_struct};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::dialect::ShadingLanguage;
use crate::compiler_frontend::string_interning::StringTable;
use crate::compiler_frontend::tokenizer::tokens::{ShaderTokens, TokenKind};
use crate::settings::{MAX_NESTING_DEPTH, TOKEN_TO_DECLARATION_RATIO};
use crate::{ast_log, return_syntax_error};
use std::cell::Cell;

/// What every parse function needs besides the token cursor.
pub struct ParseContext<'a> {
    pub language: ShadingLanguage,
    pub string_table: &'a StringTable,
    depth: Cell<usize>,
}

/// One level of nesting, released when dropped.
pub struct NestingGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for NestingGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

impl<'a> ParseContext<'a> {
    pub fn new(language: ShadingLanguage, string_table: &'a StringTable) -> Self {
        ParseContext {
            language,
            string_table,
            depth: Cell::new(0),
        }
    }

    /// Enters a nested expression or statement.
    /// Fails once the source nests deeper than MAX_NESTING_DEPTH.
    pub fn nest(&self, token_stream: &ShaderTokens) -> Result<NestingGuard<'_>, CompilerError> {
        let depth = self.depth.get() + 1;
        if depth > MAX_NESTING_DEPTH {
            return_syntax_error!(
                format!("Expression or block nests deeper than {MAX_NESTING_DEPTH} levels"),
                token_stream.current_location(),
                {
                    CompilationStage => "Parsing",
                    PrimarySuggestion => "Split it into smaller expressions or helper functions",
                }
            )
        }

        self.depth.set(depth);
        Ok(NestingGuard { depth: &self.depth })
    }

    /// Found token, in the form error messages quote it.
    pub fn describe_current(&self, token_stream: &ShaderTokens) -> String {
        token_stream
            .current_token_kind()
            .describe(self.string_table)
    }
}

impl ShaderAst {
    /// Parses a whole translation unit. Declarations keep their textual order,
    /// lowering relies on it for declare-before-use.
    pub fn new(
        token_stream: &mut ShaderTokens,
        context: &ParseContext,
    ) -> Result<ShaderAst, CompilerError> {
        let mut declarations =
            Vec::with_capacity(token_stream.tokens.len() / TOKEN_TO_DECLARATION_RATIO);

        loop {
            match token_stream.current_token_kind() {
                TokenKind::Eof => break,

                // Stray semicolons between declarations are legal
                TokenKind::Semicolon => token_stream.advance(),

                // Default precision statements don't change anything the translator tracks
                TokenKind::Precision => {
                    token_stream.advance();
                    token_stream.eat(&TokenKind::PrecisionQualifier);
                    if !matches!(token_stream.current_token_kind(), TokenKind::Symbol(_)) {
                        return_syntax_error!(
                            format!(
                                "Expected a type name after 'precision', found {}",
                                context.describe_current(token_stream)
                            ),
                            token_stream.current_location(),
                            {
                                CompilationStage => "Parsing",
                            }
                        )
                    }
                    token_stream.advance();
                    expect_token(token_stream, context, &TokenKind::Semicolon)?;
                }

                TokenKind::Struct => {
                    let structure = parse_struct(token_stream, context)?;
                    ast_log!("Parsed struct ", structure.name);
                    declarations.push(Declaration::Struct(structure));
                }

                TokenKind::CBuffer => {
                    let cbuffer = parse_cbuffer(token_stream, context)?;
                    declarations.push(Declaration::CBuffer(cbuffer));
                }

                _ => {
                    let head = parse_declaration_head(token_stream, context)?;

                    if token_stream.current_token_kind() == &TokenKind::OpenParenthesis {
                        let function = parse_function(token_stream, context, head)?;
                        ast_log!("Parsed function ", function.name);
                        declarations.push(Declaration::Function(function));
                        continue;
                    }

                    let variables = parse_variable_declarators(token_stream, context, head)?;
                    declarations.push(Declaration::Variables(variables));
                }
            }
        }

        Ok(ShaderAst { declarations })
    }
}
