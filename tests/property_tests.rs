use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use shader_translator::{GlslTranslator, ShaderStage, Translator, disassemble};

/// A pixel shader with the given uniforms, helper functions with `locals[i]` locals each,
/// and a main that calls every helper.
fn build_shader(uniforms: &[String], locals: &[usize]) -> String {
    let mut source = String::new();

    for name in uniforms {
        source.push_str(&format!("uniform float u_{name};\n"));
    }

    for (index, count) in locals.iter().enumerate() {
        source.push_str(&format!("float helper{index}(float x) {{\n"));
        for local in 0..*count {
            source.push_str(&format!("    float l{local} = x * {local}.0;\n"));
            source.push_str(&format!("    x = x + l{local};\n"));
        }
        source.push_str("    return x;\n}\n");
    }

    source.push_str("void main() {\n    float total = 0.0;\n");
    for index in 0..locals.len() {
        source.push_str(&format!("    total += helper{index}(total);\n"));
    }
    source.push_str("    gl_FragDepth = total;\n}\n");

    source
}

fn identifiers() -> impl Strategy<Value = Vec<String>> {
    btree_set("[a-z]{1,8}", 0..6).prop_map(|names| names.into_iter().collect())
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic_the_reader(bytes in vec(any::<u8>(), 0..256)) {
        let _ = disassemble(&bytes);
    }

    #[test]
    fn generated_shaders_keep_their_invariants(
        uniforms in identifiers(),
        locals in vec(0usize..4, 0..5),
    ) {
        let source = build_shader(&uniforms, &locals);
        let mut translator = GlslTranslator::new();
        prop_assert!(translator.parse_main(ShaderStage::Pixel, &source).is_ok(), "{}", source);

        let bytecode = translator.bytecode();
        let listing = disassemble(&bytecode).expect("emitted bytecode decodes");

        prop_assert_eq!(translator.globals().len(), uniforms.len());
        prop_assert_eq!(translator.functions().len(), locals.len() + 1);

        for function in translator.functions() {
            prop_assert!(function.address < bytecode.len());
            prop_assert!(listing.is_instruction_start(function.address));
        }

        let unit = translator.translation_unit();
        for name in unit.locals.keys() {
            prop_assert!(unit.function(name).is_some());
        }
        for (index, count) in locals.iter().enumerate() {
            let names = translator.locals(&format!("helper{index}"));
            prop_assert_eq!(names.map_or(0, <[String]>::len), *count);
        }
    }

    #[test]
    fn reparsing_matches_a_fresh_translator(
        first_uniforms in identifiers(),
        second_uniforms in identifiers(),
        second_locals in vec(0usize..3, 0..3),
    ) {
        let first = build_shader(&first_uniforms, &[1, 2]);
        let second = build_shader(&second_uniforms, &second_locals);

        let mut reused = GlslTranslator::new();
        reused.parse_main(ShaderStage::Pixel, &first).expect("first shader translates");
        reused.parse_main(ShaderStage::Pixel, &second).expect("second shader translates");

        let mut fresh = GlslTranslator::new();
        fresh.parse_main(ShaderStage::Pixel, &second).expect("second shader translates");

        prop_assert_eq!(reused.bytecode(), fresh.bytecode());
        prop_assert_eq!(reused.translation_unit(), fresh.translation_unit());
    }
}
