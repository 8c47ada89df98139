//! The translator contract a bytecode debugger is written against.
//!
//! A translator turns one shader source into a translation unit:
//! the bytecode plus the global, structure, function and locals registries that describe it.
//! Each dialect gets its own translator type, all of them share [`TranslatorCore`].

mod batch;
mod glsl;
mod hlsl;
mod translation_unit;

#[cfg(test)]
mod tests;

pub use batch::{TranslatedShader, TranslationJob, TranslationOutcome, translate_batch};
pub use glsl::GlslTranslator;
pub use hlsl::HlslTranslator;
pub use translation_unit::TranslationUnit;

use crate::backends::bytecode::emit::emit_module;
use crate::backends::bytecode::generator::BytecodeGenerator;
use crate::compiler_frontend::CompilerFrontend;
use crate::compiler_frontend::compiler_errors::{
    CompilerError, CompilerMessages, ErrorMetaDataKey, ErrorType,
};
use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
use crate::compiler_frontend::symbols::{Function, Structure, Variable};
use crate::settings::{DEFAULT_ENTRY_POINT, TranslatorConfig};
use crate::timer_log;
use std::time::Instant;

/// Translates shader source into bytecode and debugger metadata.
///
/// Every `parse` replaces the whole translation unit. Before the first parse and after a failed
/// one the unit is empty: no bytecode and no registry entries.
pub trait Translator: Send {
    fn language(&self) -> ShadingLanguage;

    fn core(&self) -> &TranslatorCore;

    fn core_mut(&mut self) -> &mut TranslatorCore;

    fn parse(
        &mut self,
        stage: ShaderStage,
        source: &str,
        entry_point: &str,
    ) -> Result<(), CompilerMessages> {
        let language = self.language();
        self.core_mut().translate(language, stage, source, entry_point)
    }

    fn parse_main(&mut self, stage: ShaderStage, source: &str) -> Result<(), CompilerMessages> {
        self.parse(stage, source, DEFAULT_ENTRY_POINT)
    }

    /// The generator `parse` emits into.
    fn bytecode_generator(&mut self) -> &mut BytecodeGenerator {
        &mut self.core_mut().generator
    }

    /// Copy of the finished program.
    fn bytecode(&self) -> Vec<u8> {
        self.core().generator.bytes().to_vec()
    }

    /// Variables the stage provides, numbered before the user globals.
    fn builtins(&self) -> &[Variable] {
        &self.core().unit.builtins
    }

    fn globals(&self) -> &[Variable] {
        &self.core().unit.globals
    }

    fn structures(&self) -> &[Structure] {
        &self.core().unit.structures
    }

    fn functions(&self) -> &[Function] {
        &self.core().unit.functions
    }

    /// Local variable names of a function body in slot order.
    /// None when the function doesn't exist or declares no locals.
    fn locals(&self, function: &str) -> Option<&[String]> {
        self.core().unit.locals(function)
    }

    fn translation_unit(&self) -> &TranslationUnit {
        &self.core().unit
    }

    /// Warnings from the last successful parse.
    fn warnings(&self) -> &[CompilerWarning] {
        &self.core().warnings
    }
}

/// State shared by every dialect translator.
#[derive(Debug, Default)]
pub struct TranslatorCore {
    pub(crate) config: TranslatorConfig,
    pub(crate) generator: BytecodeGenerator,
    pub(crate) unit: TranslationUnit,
    pub(crate) warnings: Vec<CompilerWarning>,
}

impl TranslatorCore {
    pub fn new(config: TranslatorConfig) -> Self {
        TranslatorCore {
            config,
            generator: BytecodeGenerator::new(),
            unit: TranslationUnit::default(),
            warnings: Vec::new(),
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    fn clear(&mut self) {
        self.generator.reset();
        self.unit = TranslationUnit::default();
        self.warnings.clear();
    }

    fn translate(
        &mut self,
        language: ShadingLanguage,
        stage: ShaderStage,
        source: &str,
        entry_point: &str,
    ) -> Result<(), CompilerMessages> {
        self.clear();

        match self.run_pipeline(language, stage, source, entry_point) {
            Ok((unit, warnings)) => {
                self.unit = unit;
                if self.config.warnings_enabled {
                    self.warnings = warnings;
                }
                Ok(())
            }
            Err(mut messages) => {
                self.generator.reset();
                if !self.config.warnings_enabled {
                    messages.warnings.clear();
                }
                Err(messages)
            }
        }
    }

    fn run_pipeline(
        &mut self,
        language: ShadingLanguage,
        stage: ShaderStage,
        source: &str,
        entry_point: &str,
    ) -> Result<(TranslationUnit, Vec<CompilerWarning>), CompilerMessages> {
        if !language.supports_stage(stage) {
            return Err(CompilerMessages::from_error(
                CompilerError::new(
                    format!("{language} has no {stage} stage"),
                    Default::default(),
                    ErrorType::UnsupportedStage,
                )
                .with_metadata(ErrorMetaDataKey::CompilationStage, "Translation"),
            ));
        }

        let config = self.config.clone();
        let mut frontend = CompilerFrontend::new(language, stage, &config, source.len());

        // ----------------------------------
        //         Token generation
        // ----------------------------------
        let time = Instant::now();
        let mut tokenized = frontend
            .source_to_tokens(source)
            .map_err(CompilerMessages::from_error)?;
        let mut warnings = tokenized.warnings;
        timer_log!(time, "Tokenized in: ");

        // ----------------------------------
        //          AST generation
        // ----------------------------------
        let time = Instant::now();
        let ast = frontend
            .tokens_to_ast(&mut tokenized.tokens)
            .map_err(|error| CompilerMessages {
                errors: vec![error],
                warnings: warnings.clone(),
            })?;
        timer_log!(time, "AST created in: ");

        // ----------------------------------
        //          HIR generation
        // ----------------------------------
        let time = Instant::now();
        let mut hir = match frontend.generate_hir(ast) {
            Ok(output) => output,
            Err(mut messages) => {
                warnings.append(&mut messages.warnings);
                messages.warnings = warnings;
                return Err(messages);
            }
        };
        warnings.append(&mut hir.warnings);
        timer_log!(time, "HIR generated in: ");

        // ----------------------------------
        //        Bytecode generation
        // ----------------------------------
        let time = Instant::now();
        let emitted = emit_module(&mut hir.module, &mut self.generator, &config).map_err(|error| {
            CompilerMessages {
                errors: vec![error],
                warnings: warnings.clone(),
            }
        })?;
        timer_log!(time, "Bytecode generated in: ");

        let unit = TranslationUnit::from_module(
            hir.module,
            stage,
            entry_point,
            emitted.global_init_address,
        );

        if unit.function(entry_point).is_none() {
            let defined: Vec<&str> = unit
                .functions
                .iter()
                .map(|function| function.name.as_str())
                .collect();

            let mut error = CompilerError::new(
                format!("Entry point '{entry_point}' not found"),
                Default::default(),
                ErrorType::EntryPointNotFound,
            )
            .with_metadata(ErrorMetaDataKey::VariableName, entry_point)
            .with_metadata(ErrorMetaDataKey::CompilationStage, "Translation");

            if !defined.is_empty() {
                error = error.with_metadata(
                    ErrorMetaDataKey::PrimarySuggestion,
                    format!("Defined functions: {}", defined.join(", ")),
                );
            }

            return Err(CompilerMessages {
                errors: vec![error],
                warnings,
            });
        }

        Ok((unit, warnings))
    }
}

/// A translator for `language` behind the trait, for callers that pick the dialect at runtime.
pub fn translator_for(language: ShadingLanguage, config: TranslatorConfig) -> Box<dyn Translator> {
    match language {
        ShadingLanguage::Glsl => Box::new(GlslTranslator::with_config(config)),
        ShadingLanguage::Hlsl => Box::new(HlslTranslator::with_config(config)),
    }
}
