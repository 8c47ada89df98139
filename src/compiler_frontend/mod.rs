pub(crate) mod ast;
pub(crate) mod tokenizer;

pub(crate) mod compiler_messages {
    pub(crate) mod compiler_dev_logging;
    pub(crate) mod compiler_errors;
    pub(crate) mod compiler_warnings;
    pub(crate) mod display_messages;
}
pub(crate) use compiler_messages::compiler_errors;
pub(crate) use compiler_messages::compiler_warnings;
pub(crate) use compiler_messages::display_messages;

pub(crate) mod builtins;
pub(crate) mod datatypes;
pub(crate) mod dialect;
pub(crate) mod string_interning;
pub(crate) mod symbols;

pub(crate) mod hir;

use crate::compiler_frontend::ast::ast::ParseContext;
use crate::compiler_frontend::ast::ast_nodes::ShaderAst;
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
use crate::compiler_frontend::hir::hir_builder::{HirBuildOutput, HirContext, build_hir_module};
use crate::compiler_frontend::string_interning::StringTable;
use crate::compiler_frontend::tokenizer::tokenizer::{Tokenized, tokenize};
use crate::compiler_frontend::tokenizer::tokens::ShaderTokens;
use crate::settings::{MINIMUM_STRING_TABLE_CAPACITY, SRC_TO_TOKEN_RATIO, TranslatorConfig};

/// The front half of one translation: source text to a checked HIR module.
/// Each phase can be run on its own, which the tests rely on.
pub struct CompilerFrontend<'a> {
    pub(crate) language: ShadingLanguage,
    pub(crate) stage: ShaderStage,
    pub(crate) config: &'a TranslatorConfig,
    pub(crate) string_table: StringTable,
}

impl<'a> CompilerFrontend<'a> {
    pub(crate) fn new(
        language: ShadingLanguage,
        stage: ShaderStage,
        config: &'a TranslatorConfig,
        source_length: usize,
    ) -> Self {
        let capacity = (source_length / SRC_TO_TOKEN_RATIO).max(MINIMUM_STRING_TABLE_CAPACITY);

        Self {
            language,
            stage,
            config,
            string_table: StringTable::with_capacity(capacity),
        }
    }

    /// -----------------------------
    /// TOKENIZER
    /// -----------------------------
    pub fn source_to_tokens(&mut self, source_code: &str) -> Result<Tokenized, CompilerError> {
        tokenize(source_code, self.language, &mut self.string_table)
    }

    /// -----------------------------
    /// AST CREATION
    /// -----------------------------
    /// Recursive descent over the token stream. Stops at the first syntax error,
    /// the token stream after it can't be trusted.
    pub fn tokens_to_ast(&self, tokens: &mut ShaderTokens) -> Result<ShaderAst, CompilerError> {
        let context = ParseContext::new(self.language, &self.string_table);
        ShaderAst::new(tokens, &context)
    }

    /// -----------------------------
    /// HIR GENERATION
    /// -----------------------------
    /// Resolves every name, types every expression and fills the symbol registries.
    /// Errors are collected per declaration up to the configured limit.
    pub fn generate_hir(&self, ast: ShaderAst) -> Result<HirBuildOutput, CompilerMessages> {
        let context = HirContext {
            language: self.language,
            stage: self.stage,
            config: self.config,
            string_table: &self.string_table,
        };

        build_hir_module(ast, context)
    }
}
