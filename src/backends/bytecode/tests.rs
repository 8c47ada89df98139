use crate::backends::bytecode::emit::emit_module;
use crate::backends::bytecode::generator::BytecodeGenerator;
use crate::backends::bytecode::instructions::{Instruction, TypeCode};
use crate::backends::bytecode::reader::disassemble;
use crate::compiler_frontend::CompilerFrontend;
use crate::compiler_frontend::datatypes::ScalarKind;
use crate::compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
use crate::compiler_frontend::hir::hir_nodes::HirModule;
use crate::settings::TranslatorConfig;

struct Emitted {
    module: HirModule,
    bytes: Vec<u8>,
    global_init_address: usize,
}

fn emit_with(source: &str, config: &TranslatorConfig) -> Emitted {
    let mut frontend =
        CompilerFrontend::new(ShadingLanguage::Glsl, ShaderStage::Pixel, config, source.len());
    let mut tokenized = frontend
        .source_to_tokens(source)
        .expect("tokenization should succeed");
    let ast = frontend
        .tokens_to_ast(&mut tokenized.tokens)
        .expect("source should parse");
    let mut module = match frontend.generate_hir(ast) {
        Ok(output) => output.module,
        Err(messages) => panic!("expected {source:?} to lower, got {:?}", messages.errors),
    };

    let mut generator = BytecodeGenerator::new();
    let emitted = emit_module(&mut module, &mut generator, config).expect("emission succeeds");

    Emitted {
        module,
        bytes: generator.into_bytes(),
        global_init_address: emitted.global_init_address,
    }
}

/// Emits without line markers so the expected instruction lists stay short.
fn emit(source: &str) -> Emitted {
    let config = TranslatorConfig {
        emit_line_markers: false,
        ..TranslatorConfig::default()
    };
    emit_with(source, &config)
}

/// Instructions of one function, from its address up to the next function or the global init block.
fn function_code(emitted: &Emitted, name: &str) -> Vec<Instruction> {
    let functions = &emitted.module.functions;
    let index = functions
        .iter()
        .position(|function| function.signature.name == name)
        .unwrap_or_else(|| panic!("function '{name}' should be registered"));

    let start = functions[index].signature.address;
    let end = functions
        .get(index + 1)
        .map_or(emitted.global_init_address, |next| next.signature.address);

    disassemble(&emitted.bytes)
        .expect("emitted code decodes")
        .entries
        .into_iter()
        .filter(|entry| (start..end).contains(&entry.offset))
        .map(|entry| entry.instruction)
        .collect()
}

#[test]
fn uninitialised_local_starts_at_zero() {
    let emitted = emit("struct Light { vec3 pos; }; void main() { int x; }");

    assert_eq!(emitted.module.functions[0].signature.address, 0);
    assert_eq!(
        function_code(&emitted, "main"),
        vec![
            Instruction::Construct(TypeCode::Scalar(ScalarKind::Int), 0),
            Instruction::SetLocal(0),
            Instruction::Return,
        ]
    );
}

#[test]
fn global_init_block_comes_last() {
    let emitted = emit("float scale = 2.0; float bias; void main() { }");
    let first_user_global = emitted.module.builtins.len() as u32;

    let global_init: Vec<Instruction> = disassemble(&emitted.bytes)
        .expect("emitted code decodes")
        .entries
        .into_iter()
        .filter(|entry| entry.offset >= emitted.global_init_address)
        .map(|entry| entry.instruction)
        .collect();

    assert_eq!(
        global_init,
        vec![
            Instruction::PushFloat(2.0),
            Instruction::SetGlobal(first_user_global),
            Instruction::Return,
        ]
    );
}

#[test]
fn every_address_is_inside_the_code() {
    let emitted = emit(
        "float half_of(float x) { return x * 0.5; }
         void main() { gl_FragDepth = half_of(1.0); }",
    );
    let listing = disassemble(&emitted.bytes).expect("emitted code decodes");

    for function in &emitted.module.functions {
        assert!(function.signature.address < emitted.bytes.len());
        assert!(listing.is_instruction_start(function.signature.address));
    }
    assert!(listing.is_instruction_start(emitted.global_init_address));
}

#[test]
fn non_void_function_without_return_yields_zero() {
    let emitted = emit("float f() { } void main() { }");

    assert_eq!(
        function_code(&emitted, "f"),
        vec![
            Instruction::Construct(TypeCode::Scalar(ScalarKind::Float), 0),
            Instruction::ReturnValue,
        ]
    );
}

#[test]
fn explicit_return_is_not_doubled() {
    let emitted = emit("float f() { return 1.0; } void main() { }");

    assert_eq!(
        function_code(&emitted, "f"),
        vec![Instruction::PushFloat(1.0), Instruction::ReturnValue]
    );
}

#[test]
fn line_markers_precede_statements() {
    let emitted = emit_with(
        "void main()\n{\n    float a = 1.0;\n    a = 2.0;\n}",
        &TranslatorConfig::default(),
    );
    let code = function_code(&emitted, "main");

    assert_eq!(code[0], Instruction::Line(3));
    assert!(code.contains(&Instruction::Line(4)));
}

#[test]
fn expression_statements_drop_their_value() {
    let emitted = emit("void main() { float a; a = 2.0; }");

    assert_eq!(
        function_code(&emitted, "main")[2..],
        [
            Instruction::PushFloat(2.0),
            Instruction::Dup,
            Instruction::SetLocal(0),
            Instruction::Pop,
            Instruction::Return,
        ]
    );
}

#[test]
fn swizzle_assignment_goes_through_a_reference() {
    let emitted = emit("void main() { vec3 v; v.xy = vec2(1.0, 2.0); }");
    let code = function_code(&emitted, "main");

    let reference = code
        .iter()
        .position(|instruction| *instruction == Instruction::RefLocal(0))
        .expect("assignment takes a reference");
    assert_eq!(code[reference + 1], Instruction::RefSwizzle(vec![0, 1]));
    assert!(code[reference..].contains(&Instruction::Store));
}

#[test]
fn compound_assignment_on_a_member_loads_first() {
    let emitted = emit(
        "struct Light { vec3 pos; float power; };
         void main() { Light light; light.power += 1.0; }",
    );
    let code = function_code(&emitted, "main");

    let reference = code
        .iter()
        .position(|instruction| *instruction == Instruction::RefMember(1))
        .expect("member reference");
    assert_eq!(
        code[reference + 1..reference + 6],
        [
            Instruction::Dup,
            Instruction::Load,
            Instruction::PushFloat(1.0),
            Instruction::Add,
            Instruction::Store,
        ]
    );
}

#[test]
fn struct_types_use_registry_indices() {
    let emitted = emit(
        "struct A { float a; }; struct B { float b; };
         void main() { B value; }",
    );

    assert_eq!(
        function_code(&emitted, "main")[0],
        Instruction::Construct(TypeCode::Struct(1), 0)
    );
}

#[test]
fn logical_and_short_circuits() {
    let emitted = emit("void main() { bool a = true && false; }");
    let code = function_code(&emitted, "main");

    assert_eq!(code[0], Instruction::PushBool(true));
    assert_eq!(code[1], Instruction::Dup);
    assert!(matches!(code[2], Instruction::JumpIfFalse(_)));
    assert_eq!(code[3], Instruction::Pop);
    assert_eq!(code[4], Instruction::PushBool(false));
}

#[test]
fn for_loop_jumps_back_to_its_condition() {
    let emitted = emit(
        "void main() {
             for (int i = 0; i < 4; i++) {
                 if (i == 2) { break; }
             }
         }",
    );
    let entries = disassemble(&emitted.bytes)
        .expect("emitted code decodes")
        .entries;

    // `int i = 0` takes two instructions, the condition starts right after
    let condition_start = entries[2].offset as u32;
    let back = entries
        .iter()
        .position(|entry| entry.instruction == Instruction::Jump(condition_start))
        .expect("loop closes with a jump to its condition");

    let after_loop = entries[back + 1].offset as u32;
    assert_eq!(entries[5].instruction, Instruction::JumpIfFalse(after_loop));
    assert!(
        entries
            .iter()
            .any(|entry| entry.instruction == Instruction::Jump(after_loop)),
        "break should jump past the loop"
    );
}

#[test]
fn do_while_checks_after_the_body() {
    let emitted = emit("void main() { int i = 0; do { i++; } while (i < 3); }");
    let entries = disassemble(&emitted.bytes)
        .expect("emitted code decodes")
        .entries;

    let body_start = entries[2].offset as u32;
    assert_eq!(entries[2].instruction, Instruction::RefLocal(0));
    assert!(
        entries
            .iter()
            .any(|entry| entry.instruction == Instruction::JumpIfTrue(body_start))
    );
}

#[test]
fn out_arguments_pass_references() {
    let emitted = emit(
        "void set_one(out float x) { x = 1.0; }
         void main() { float y; set_one(y); }",
    );
    let code = function_code(&emitted, "main");

    let call = code
        .iter()
        .position(|instruction| {
            *instruction
                == Instruction::Call {
                    function: 0,
                    argument_count: 1,
                }
        })
        .expect("call to set_one");
    assert_eq!(code[call - 1], Instruction::RefLocal(0));
}

#[test]
fn intrinsics_use_their_ids() {
    let emitted = emit("void main() { float d = dot(vec3(1.0), vec3(2.0)); }");
    let code = function_code(&emitted, "main");

    assert!(code.iter().any(|instruction| matches!(
        instruction,
        Instruction::CallBuiltin {
            argument_count: 2,
            ..
        }
    )));
}
