use crate::backends::bytecode::reader::disassemble;
use crate::compiler_frontend::compiler_errors::{ErrorMetaDataKey, ErrorType};
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
use crate::settings::{GLOBAL_INIT_LABEL, TranslatorConfig};
use crate::translator::{GlslTranslator, HlslTranslator, Translator, translator_for};

const LIGHT_SHADER: &str = "struct Light { vec3 pos; };
uniform Light light;
float intensity = 0.5;

float attenuate(float distance) {
    return intensity / (distance * distance);
}

void main() {
    float d = length(light.pos);
    gl_FragColor = vec4(attenuate(d));
}";

fn translated_light() -> GlslTranslator {
    let mut translator = GlslTranslator::new();
    translator
        .parse_main(ShaderStage::Pixel, LIGHT_SHADER)
        .expect("light shader should translate");
    translator
}

#[test]
fn unsupported_stage_is_reported() {
    let mut translator = HlslTranslator::new();
    let messages = translator
        .parse_main(ShaderStage::Geometry, "void main() { }")
        .unwrap_err();

    assert_eq!(messages.errors[0].error_type, ErrorType::UnsupportedStage);
    assert!(translator.bytecode().is_empty());
}

#[test]
fn entry_point_error_lists_defined_functions() {
    let mut translator = GlslTranslator::new();
    let messages = translator
        .parse(ShaderStage::Pixel, "void helper() { } void main() { }", "start")
        .unwrap_err();

    let error = &messages.errors[0];
    assert_eq!(error.error_type, ErrorType::EntryPointNotFound);
    assert_eq!(
        error.metadata.get(&ErrorMetaDataKey::VariableName).map(String::as_str),
        Some("start")
    );
    let suggestion = &error.metadata[&ErrorMetaDataKey::PrimarySuggestion];
    assert!(suggestion.contains("helper") && suggestion.contains("main"));
}

#[test]
fn warnings_are_kept_after_success() {
    let mut translator = GlslTranslator::new();
    translator
        .parse_main(ShaderStage::Pixel, "void main() { int unused; }")
        .expect("should translate");

    assert_eq!(translator.warnings().len(), 1);
    assert_eq!(translator.warnings()[0].warning_kind, WarningKind::UnusedVariable);
}

#[test]
fn warnings_can_be_disabled() {
    let config = TranslatorConfig {
        warnings_enabled: false,
        ..TranslatorConfig::default()
    };
    let mut translator = GlslTranslator::with_config(config);
    translator
        .parse_main(ShaderStage::Pixel, "void main() { int unused; }")
        .expect("should translate");

    assert!(translator.warnings().is_empty());
}

#[test]
fn generator_holds_the_finished_program() {
    let mut translator = translated_light();
    let bytecode = translator.bytecode();

    assert_eq!(translator.bytecode_generator().bytes(), bytecode.as_slice());
}

#[test]
fn runtime_dialect_choice() {
    let glsl = translator_for(ShadingLanguage::Glsl, TranslatorConfig::default());
    let hlsl = translator_for(ShadingLanguage::Hlsl, TranslatorConfig::default());

    assert_eq!(glsl.language(), ShadingLanguage::Glsl);
    assert_eq!(hlsl.language(), ShadingLanguage::Hlsl);
    assert!(glsl.translation_unit().is_empty());
}

#[test]
fn global_indices_follow_the_builtins() {
    let translator = translated_light();
    let unit = translator.translation_unit();

    let builtins = unit.builtins.len() as u32;
    assert_eq!(unit.global_index("gl_FragCoord"), Some(0));
    assert_eq!(unit.global_index("light"), Some(builtins));
    assert_eq!(unit.global_index("intensity"), Some(builtins + 1));
    assert_eq!(unit.global_index("missing"), None);
}

#[test]
fn entry_address_points_at_main() {
    let translator = translated_light();
    let unit = translator.translation_unit();

    let main = unit.function("main").expect("main is registered");
    assert_eq!(unit.entry_point, "main");
    assert_eq!(unit.entry_address(), Some(main.address));
    assert_eq!(unit.stage, Some(ShaderStage::Pixel));
}

#[test]
fn listing_labels_functions_and_global_init() {
    let translator = translated_light();
    let text = translator
        .translation_unit()
        .disassemble(&translator.bytecode())
        .expect("bytecode decodes");

    assert!(text.contains("float attenuate(float distance):"));
    assert!(text.contains("void main():"));
    assert!(text.contains(&format!("{GLOBAL_INIT_LABEL}:")));
}

#[test]
fn global_init_runs_the_initialisers() {
    let translator = translated_light();
    let unit = translator.translation_unit();
    let bytecode = translator.bytecode();

    let listing = disassemble(&bytecode).expect("bytecode decodes");
    assert!(listing.is_instruction_start(unit.global_init_address));
    assert!(unit.global_init_address > unit.function("main").map_or(0, |main| main.address));
}

#[test]
fn metadata_exports_as_json() {
    let translator = translated_light();
    let json = translator
        .translation_unit()
        .to_json()
        .expect("metadata serializes");

    assert_eq!(json["structures"][0]["name"], "Light");
    assert_eq!(json["structures"][0]["members"][0]["name"], "pos");
    assert_eq!(json["functions"][1]["name"], "main");
    assert_eq!(json["locals"]["main"][0], "d");
    assert_eq!(json["entry_point"], "main");
}

#[test]
fn diagnostics_export_as_json() {
    let mut translator = GlslTranslator::new();
    let messages = translator
        .parse(ShaderStage::Pixel, "void main() { }", "start")
        .unwrap_err();

    let json = messages.to_json().expect("diagnostics serialize");
    assert_eq!(json["errors"][0]["error_type"], "EntryPointNotFound");
    assert_eq!(json["errors"][0]["metadata"]["VariableName"], "start");
}
