use shader_translator::{
    ErrorType, GlslTranslator, HlslTranslator, Instruction, ShaderStage, ShadingLanguage,
    TranslationJob, Translator, TranslatorConfig, disassemble, translate_batch,
};

const LIGHT_GLSL: &str = "struct Light { vec3 pos; }; void main() { int x; }";
const LIGHT_HLSL: &str = "struct Light { float3 pos; }; void main() { int x; }";

fn assert_unit_is_empty(translator: &dyn Translator) {
    assert!(translator.bytecode().is_empty());
    assert!(translator.globals().is_empty());
    assert!(translator.structures().is_empty());
    assert!(translator.functions().is_empty());
    assert!(translator.translation_unit().locals.is_empty());
}

fn assert_addresses_are_valid(translator: &dyn Translator) {
    let bytecode = translator.bytecode();
    let listing = disassemble(&bytecode).expect("bytecode should decode");

    for function in translator.functions() {
        assert!(
            function.address < bytecode.len(),
            "{} starts past the end of the code",
            function.name
        );
        assert!(
            listing.is_instruction_start(function.address),
            "{} starts inside an instruction",
            function.name
        );
    }
}

#[test]
fn light_scenario() {
    let mut translator = GlslTranslator::new();
    translator
        .parse(ShaderStage::Pixel, LIGHT_GLSL, "main")
        .expect("light scenario should translate");

    let structures = translator.structures();
    assert_eq!(structures.len(), 1);
    assert_eq!(structures[0].name, "Light");
    assert_eq!(structures[0].members.len(), 1);
    assert_eq!(structures[0].members[0].name, "pos");

    let functions = translator.functions();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name, "main");

    assert_eq!(translator.locals("main"), Some(&["x".to_string()][..]));
    assert!(!translator.bytecode().is_empty());
    assert_addresses_are_valid(&translator);
}

#[test]
fn empty_before_any_parse() {
    assert_unit_is_empty(&GlslTranslator::new());
    assert_unit_is_empty(&HlslTranslator::new());
}

#[test]
fn undeclared_function_fails_with_empty_bytecode() {
    let mut translator = GlslTranslator::new();
    let messages = translator
        .parse_main(ShaderStage::Pixel, "void main() { foo(); }")
        .unwrap_err();

    assert!(messages.contains(ErrorType::UnresolvedSymbol));
    assert!(messages.errors[0].msg.contains("foo"));
    assert_unit_is_empty(&translator);
}

#[test]
fn missing_entry_point_fails() {
    let mut translator = GlslTranslator::new();
    let messages = translator
        .parse(ShaderStage::Pixel, LIGHT_GLSL, "start")
        .unwrap_err();

    assert_eq!(messages.errors.len(), 1);
    assert_eq!(messages.errors[0].error_type, ErrorType::EntryPointNotFound);
    assert_unit_is_empty(&translator);
}

#[test]
fn each_failure_kind_is_classified() {
    let cases = [
        ("void main() { float a = 1.0 $ 2.0; }", ErrorType::Lexical),
        ("void main() { float a = ; }", ErrorType::Syntax),
        ("void main() { float a = b; }", ErrorType::UnresolvedSymbol),
        ("void main() { float a = true; }", ErrorType::Type),
        ("float a; float a; void main() { }", ErrorType::DuplicateDefinition),
        ("void helper() { }", ErrorType::EntryPointNotFound),
    ];

    for (source, expected) in cases {
        let mut translator = GlslTranslator::new();
        let messages = translator
            .parse_main(ShaderStage::Pixel, source)
            .expect_err(source);
        assert_eq!(messages.errors[0].error_type, expected, "{source}");
        assert_unit_is_empty(&translator);
    }
}

#[test]
fn second_parse_replaces_the_first() {
    let mut translator = GlslTranslator::new();
    translator
        .parse_main(
            ShaderStage::Pixel,
            "uniform float scale; struct A { float a; }; void helper() { } void main() { float y; }",
        )
        .expect("first shader should translate");

    translator
        .parse_main(ShaderStage::Pixel, LIGHT_GLSL)
        .expect("second shader should translate");

    assert!(translator.globals().is_empty());
    assert_eq!(translator.structures().len(), 1);
    assert_eq!(translator.structures()[0].name, "Light");
    assert_eq!(translator.functions().len(), 1);
    assert_eq!(translator.locals("helper"), None);
    assert_eq!(translator.locals("main"), Some(&["x".to_string()][..]));
}

#[test]
fn failure_after_success_leaves_nothing_usable() {
    let mut translator = GlslTranslator::new();
    translator
        .parse_main(ShaderStage::Pixel, LIGHT_GLSL)
        .expect("first shader should translate");

    assert!(
        translator
            .parse_main(ShaderStage::Pixel, "void main() { foo(); }")
            .is_err()
    );
    assert_unit_is_empty(&translator);
}

#[test]
fn same_program_in_hlsl_gives_the_same_metadata() {
    let mut glsl = GlslTranslator::new();
    glsl.parse_main(ShaderStage::Pixel, LIGHT_GLSL)
        .expect("GLSL should translate");

    let mut hlsl = HlslTranslator::new();
    hlsl.parse_main(ShaderStage::Pixel, LIGHT_HLSL)
        .expect("HLSL should translate");

    assert_eq!(glsl.structures(), hlsl.structures());
    assert_eq!(glsl.functions(), hlsl.functions());
    assert_eq!(glsl.locals("main"), hlsl.locals("main"));
    assert!(hlsl.builtins().is_empty());
    assert_addresses_are_valid(&hlsl);
}

#[test]
fn locals_keys_are_functions() {
    let mut translator = GlslTranslator::new();
    translator
        .parse_main(
            ShaderStage::Pixel,
            "float square(float v) { float r = v * v; return r; }
             float identity(float v) { return v; }
             void main() {
                 float a = square(2.0);
                 for (int i = 0; i < 2; i++) { float a2 = identity(a); a = a2; }
                 gl_FragDepth = a;
             }",
        )
        .expect("shader should translate");

    let unit = translator.translation_unit();
    for name in unit.locals.keys() {
        assert!(unit.function(name).is_some(), "{name} is not a function");
    }
    assert_eq!(translator.locals("identity"), None);
    assert_eq!(
        translator.locals("main"),
        Some(&["a".to_string(), "i".to_string(), "a2".to_string()][..])
    );
    assert_addresses_are_valid(&translator);
}

#[test]
fn registries_have_no_duplicate_names() {
    let mut translator = GlslTranslator::new();
    translator
        .parse_main(
            ShaderStage::Vertex,
            "struct A { float x; }; struct B { A inner; };
             uniform mat4 view; uniform mat4 projection; in vec3 position;
             vec4 transform(vec3 p) { return projection * view * vec4(p, 1.0); }
             void main() { gl_Position = transform(position); }",
        )
        .expect("vertex shader should translate");

    let mut names: Vec<&str> = translator.globals().iter().map(|v| v.name.as_str()).collect();
    let count = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), count);

    assert_eq!(translator.structures().len(), 2);
    assert_eq!(translator.functions().len(), 2);
    assert_addresses_are_valid(&translator);
}

#[test]
fn compute_stage_builtins_are_reachable() {
    let mut translator = GlslTranslator::new();
    translator
        .parse_main(
            ShaderStage::Compute,
            "void main() { int index = gl_GlobalInvocationID.x; }",
        )
        .expect("compute shader should translate");

    let bytecode = translator.bytecode();
    let listing = disassemble(&bytecode).expect("bytecode should decode");
    assert!(
        listing
            .entries
            .iter()
            .any(|entry| entry.instruction == Instruction::GetGlobal(0))
    );
}

#[test]
fn batch_translation_keeps_job_order() {
    let jobs = vec![
        TranslationJob::new("light.frag", ShadingLanguage::Glsl, ShaderStage::Pixel, LIGHT_GLSL),
        TranslationJob::new(
            "broken.frag",
            ShadingLanguage::Glsl,
            ShaderStage::Pixel,
            "void main() { foo(); }",
        ),
        TranslationJob::new("light.hlsl", ShadingLanguage::Hlsl, ShaderStage::Pixel, LIGHT_HLSL),
        TranslationJob::new("light.frag", ShadingLanguage::Glsl, ShaderStage::Pixel, LIGHT_GLSL)
            .with_entry_point("start"),
    ];

    let outcomes = translate_batch(&jobs, &TranslatorConfig::default());
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[1].name, "broken.frag");

    let light = outcomes[0].result.as_ref().expect("light should translate");
    assert!(!light.bytecode.is_empty());
    assert_eq!(light.unit.structures[0].name, "Light");

    assert!(outcomes[1].result.is_err());
    assert!(outcomes[2].result.is_ok());

    let missing = outcomes[3].result.as_ref().unwrap_err();
    assert!(missing.contains(ErrorType::EntryPointNotFound));
}

#[test]
fn config_file_controls_line_markers() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "emit_line_markers = false").expect("write config");
    let config = TranslatorConfig::load(file.path()).expect("config should load");

    let mut translator = GlslTranslator::with_config(config);
    translator
        .parse_main(ShaderStage::Pixel, LIGHT_GLSL)
        .expect("should translate");

    let bytecode = translator.bytecode();
    let listing = disassemble(&bytecode).expect("bytecode should decode");
    assert!(
        listing
            .entries
            .iter()
            .all(|entry| !matches!(entry.instruction, Instruction::Line(_)))
    );
}

#[test]
fn runaway_nesting_is_reported_instead_of_crashing() {
    let parentheses = format!(
        "void main() {{ float a = {}1.0{}; }}",
        "(".repeat(20_000),
        ")".repeat(20_000)
    );
    let blocks = format!("void main() {{ {}{} }}", "{".repeat(20_000), "}".repeat(20_000));
    let sum = format!("void main() {{ float a = 1.0{}; }}", " + 1.0".repeat(20_000));

    for source in [parentheses, blocks, sum] {
        let mut translator = GlslTranslator::new();
        let messages = translator
            .parse_main(ShaderStage::Pixel, &source)
            .unwrap_err();
        assert_eq!(messages.errors[0].error_type, ErrorType::Syntax);
        assert_unit_is_empty(&translator);
    }
}

#[test]
fn moderate_nesting_still_translates() {
    let source = format!(
        "void main() {{ {} float a = {}1.0{}; gl_FragDepth = a; {} }}",
        "{".repeat(16),
        "(".repeat(32),
        ")".repeat(32),
        "}".repeat(16)
    );

    let mut translator = GlslTranslator::new();
    translator
        .parse_main(ShaderStage::Pixel, &source)
        .expect("nested shader should translate");
    assert_addresses_are_valid(&translator);
}

#[test]
fn integer_literals_keep_their_meaning() {
    let mut translator = GlslTranslator::new();
    let messages = translator
        .parse_main(ShaderStage::Pixel, "void main() { int x = 3000000000; }")
        .unwrap_err();
    assert_eq!(messages.errors[0].error_type, ErrorType::Lexical);
    assert_unit_is_empty(&translator);

    translator
        .parse_main(
            ShaderStage::Pixel,
            "void main() { int mask = 0xFFFFFFFF; int big = 3000000000u; }",
        )
        .expect("unsigned constants should translate");

    let bytecode = translator.bytecode();
    let listing = disassemble(&bytecode).expect("bytecode should decode");
    let pushed: Vec<i32> = listing
        .entries
        .iter()
        .filter_map(|entry| match entry.instruction {
            Instruction::PushInt(value) => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(pushed, vec![-1, 3_000_000_000u32 as i32]);
}
