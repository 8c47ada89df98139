use crate::compiler_frontend::CompilerFrontend;
use crate::compiler_frontend::compiler_errors::{CompilerMessages, ErrorType};
use crate::compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
use crate::compiler_frontend::hir::hir_builder::HirBuildOutput;
use crate::compiler_frontend::hir::hir_nodes::HirFunction;
use crate::settings::TranslatorConfig;

pub(crate) fn lower_with(
    source: &str,
    language: ShadingLanguage,
    stage: ShaderStage,
    config: &TranslatorConfig,
) -> Result<HirBuildOutput, CompilerMessages> {
    let mut frontend = CompilerFrontend::new(language, stage, config, source.len());
    let mut tokenized = frontend
        .source_to_tokens(source)
        .expect("tokenization should succeed");
    let ast = frontend
        .tokens_to_ast(&mut tokenized.tokens)
        .expect("source should parse");

    frontend.generate_hir(ast)
}

pub(crate) fn lower_glsl(source: &str) -> HirBuildOutput {
    match lower_with(
        source,
        ShadingLanguage::Glsl,
        ShaderStage::Pixel,
        &TranslatorConfig::default(),
    ) {
        Ok(output) => output,
        Err(messages) => panic!("expected {source:?} to lower, got {:?}", messages.errors),
    }
}

/// Lowers a pixel shader that must fail, returning its messages.
pub(crate) fn lowering_errors(source: &str, language: ShadingLanguage) -> CompilerMessages {
    lowering_errors_in(source, language, ShaderStage::Pixel)
}

pub(crate) fn lowering_errors_in(
    source: &str,
    language: ShadingLanguage,
    stage: ShaderStage,
) -> CompilerMessages {
    match lower_with(source, language, stage, &TranslatorConfig::default()) {
        Ok(_) => panic!("expected {source:?} to fail lowering"),
        Err(messages) => messages,
    }
}

pub(crate) fn first_error_type(source: &str) -> ErrorType {
    lowering_errors(source, ShadingLanguage::Glsl).errors[0].error_type
}

pub(crate) fn function<'a>(output: &'a HirBuildOutput, name: &str) -> &'a HirFunction {
    output
        .module
        .functions
        .iter()
        .find(|function| function.signature.name == name)
        .unwrap_or_else(|| panic!("function '{name}' should be registered"))
}
