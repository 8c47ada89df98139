use super::hir_test_support::{
    first_error_type, function, lower_glsl, lower_with, lowering_errors, lowering_errors_in,
};
use crate::compiler_frontend::builtins::Intrinsic;
use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
use crate::compiler_frontend::hir::hir_nodes::{
    HirArgument, HirExpressionKind, HirStatementKind, LocalSlot, PlaceRoot, Projection,
};
use crate::settings::TranslatorConfig;

const LIGHT_SHADER: &str = "
struct Light { vec3 pos; float intensity; };
uniform Light light;
void main() {
    float brightness = light.intensity * 2.0;
    gl_FragColor = vec4(light.pos * brightness, 1.0);
}
";

#[test]
fn light_shader_fills_the_registries() {
    let output = lower_glsl(LIGHT_SHADER);
    let module = &output.module;

    assert_eq!(module.structures.len(), 1);
    assert_eq!(module.structures[0].name, "Light");
    assert_eq!(module.structures[0].members[1].name, "intensity");

    assert_eq!(module.globals.len(), 1);
    assert_eq!(module.globals[0].variable.name, "light");
    assert_eq!(
        module.globals[0].variable.data_type,
        DataType::Struct("Light".to_string())
    );

    let main = function(&output, "main");
    assert_eq!(main.locals.len(), 1);
    assert_eq!(main.locals[0], "brightness");
    assert!(!main.missing_return);
    assert!(output.warnings.is_empty());
}

#[test]
fn globals_are_numbered_after_builtins() {
    let output = lower_glsl(LIGHT_SHADER);
    let builtin_count = output.module.builtins.len() as u32;
    assert!(builtin_count > 0);

    let main = function(&output, "main");
    let body = main.body.as_ref().expect("main is defined");
    let HirStatementKind::Declare {
        initializer: Some(initializer),
        ..
    } = &body[0].kind
    else {
        panic!("expected the brightness declaration");
    };

    let HirExpressionKind::Binary { left, .. } = &initializer.kind else {
        panic!("expected a multiply");
    };
    let HirExpressionKind::Member { base, index } = &left.kind else {
        panic!("expected a member access");
    };
    assert_eq!(*index, 1);
    assert!(matches!(base.kind, HirExpressionKind::Global(id) if id.0 == builtin_count));
}

#[test]
fn parameters_take_the_first_slots() {
    let output = lower_glsl(
        "float scale(float value, float amount) { float result = value * amount; return result; }
         void main() { gl_FragColor = vec4(scale(1.0, 2.0)); }",
    );

    let scale = function(&output, "scale");
    assert_eq!(scale.locals.len(), 1);

    let body = scale.body.as_ref().expect("scale is defined");
    assert!(matches!(
        body[0].kind,
        HirStatementKind::Declare { slot: LocalSlot(2), .. }
    ));
}

#[test]
fn undeclared_call_is_unresolved() {
    let messages = lowering_errors("void main() { foo(); }", ShadingLanguage::Glsl);
    assert_eq!(messages.errors.len(), 1);
    assert_eq!(messages.errors[0].error_type, ErrorType::UnresolvedSymbol);
    assert!(messages.errors[0].msg.contains("foo"));
}

#[test]
fn undeclared_variable_is_unresolved() {
    assert_eq!(
        first_error_type("void main() { float x = missing; }"),
        ErrorType::UnresolvedSymbol
    );
}

#[test]
fn unknown_struct_member_is_unresolved() {
    assert_eq!(
        first_error_type(
            "struct Light { vec3 pos; }; uniform Light light; void main() { float x = light.colour.x; }"
        ),
        ErrorType::UnresolvedSymbol
    );
}

#[test]
fn int_initializer_is_promoted_to_float() {
    let output = lower_glsl("void main() { float x = 1; gl_FragDepth = x; }");
    let body = function(&output, "main").body.as_ref().expect("defined");

    let HirStatementKind::Declare {
        initializer: Some(initializer),
        ..
    } = &body[0].kind
    else {
        panic!("expected a declaration");
    };
    assert_eq!(initializer.data_type, DataType::FLOAT);
    assert!(matches!(initializer.kind, HirExpressionKind::Construct { .. }));
}

#[test]
fn promotion_can_be_disabled() {
    let config = TranslatorConfig {
        implicit_int_to_float: false,
        ..TranslatorConfig::default()
    };

    let Err(messages) = lower_with(
        "void main() { float x = 1; gl_FragDepth = x; }",
        ShadingLanguage::Glsl,
        ShaderStage::Pixel,
        &config,
    ) else {
        panic!("expected a type error");
    };
    assert_eq!(messages.errors[0].error_type, ErrorType::Type);
}

#[test]
fn float_never_narrows_to_int() {
    assert_eq!(
        first_error_type("void main() { int i = 1.5; }"),
        ErrorType::Type
    );
}

#[test]
fn bool_arithmetic_is_a_type_error() {
    assert_eq!(
        first_error_type("void main() { float x = true + 1.0; }"),
        ErrorType::Type
    );
}

#[test]
fn matrix_times_vector_is_a_vector() {
    let output = lower_glsl(
        "uniform mat4 model;
         void main() { vec4 p = model * vec4(1.0, 2.0, 3.0, 1.0); gl_FragColor = p; }",
    );

    let body = function(&output, "main").body.as_ref().expect("defined");
    let HirStatementKind::Declare {
        initializer: Some(initializer),
        ..
    } = &body[0].kind
    else {
        panic!("expected a declaration");
    };
    assert_eq!(initializer.data_type, DataType::float_vector(4));
}

#[test]
fn swizzles_are_typed_by_their_length() {
    let output = lower_glsl("void main() { vec4 c = vec4(1.0); vec2 uv = c.zx; gl_FragColor = vec4(uv, c.ba); }");
    let body = function(&output, "main").body.as_ref().expect("defined");

    let HirStatementKind::Declare {
        initializer: Some(initializer),
        ..
    } = &body[1].kind
    else {
        panic!("expected a declaration");
    };
    let HirExpressionKind::Swizzle { components, .. } = &initializer.kind else {
        panic!("expected a swizzle");
    };
    assert_eq!(components, &vec![2, 0]);
}

#[test]
fn swizzle_errors() {
    // Mixed sets
    assert_eq!(
        first_error_type("void main() { vec4 c = vec4(1.0); vec2 v = c.xg; }"),
        ErrorType::Type
    );
    // Past the end of a vec2
    assert_eq!(
        first_error_type("void main() { vec2 c = vec2(1.0); float z = c.z; }"),
        ErrorType::Type
    );
    // Writing the same component twice
    assert_eq!(
        first_error_type("void main() { vec2 c = vec2(1.0); c.xx = vec2(0.0); }"),
        ErrorType::Rule
    );
}

#[test]
fn writes_to_read_only_storage_are_rejected() {
    assert_eq!(
        first_error_type("uniform float time; void main() { time = 1.0; }"),
        ErrorType::Rule
    );
    assert_eq!(
        first_error_type("const float k = 1.0; void main() { k += 1.0; }"),
        ErrorType::Rule
    );
    assert_eq!(
        first_error_type("void main() { gl_FragCoord.x = 1.0; }"),
        ErrorType::Rule
    );
    assert_eq!(
        first_error_type("void f(const float x) { x = 2.0; } void main() { f(1.0); }"),
        ErrorType::Rule
    );
}

#[test]
fn hlsl_globals_without_a_qualifier_are_uniforms() {
    let messages = lowering_errors(
        "float time; float4 main() : SV_Target { time = 1.0; return float4(time, 0, 0, 1); }",
        ShadingLanguage::Hlsl,
    );
    assert_eq!(messages.errors[0].error_type, ErrorType::Rule);

    let output = lower_with(
        "static float counter = 0.0; float4 main() : SV_Target { counter += 1.0; return float4(counter, 0, 0, 1); }",
        ShadingLanguage::Hlsl,
        ShaderStage::Pixel,
        &TranslatorConfig::default(),
    );
    assert!(output.is_ok());
}

#[test]
fn out_arguments_are_passed_as_places() {
    let output = lower_glsl(
        "void fill(out float value) { value = 1.0; }
         void main() { float x; fill(x); gl_FragDepth = x; }",
    );

    let body = function(&output, "main").body.as_ref().expect("defined");
    let HirStatementKind::Expression(call) = &body[1].kind else {
        panic!("expected the call statement");
    };
    let HirExpressionKind::Call { arguments, .. } = &call.kind else {
        panic!("expected a call");
    };
    let HirArgument::Reference(place) = &arguments[0] else {
        panic!("out arguments are references");
    };
    assert!(matches!(place.root, PlaceRoot::Local(LocalSlot(0))));
}

#[test]
fn out_arguments_must_be_assignable() {
    assert_eq!(
        first_error_type(
            "void fill(out float value) { value = 1.0; } void main() { fill(2.0); }"
        ),
        ErrorType::Rule
    );
}

#[test]
fn indexed_writes_keep_their_projection() {
    let output = lower_glsl(
        "void main() { float weights[3]; weights[1] = 0.5; gl_FragDepth = weights[1]; }",
    );

    let body = function(&output, "main").body.as_ref().expect("defined");
    let HirStatementKind::Expression(assign) = &body[1].kind else {
        panic!("expected an assignment");
    };
    let HirExpressionKind::Assign { target, .. } = &assign.kind else {
        panic!("expected an assignment");
    };
    assert!(matches!(target.projections.as_slice(), [Projection::Index(_)]));
    assert_eq!(target.data_type, DataType::FLOAT);
}

#[test]
fn constant_index_out_of_range_is_a_type_error() {
    assert_eq!(
        first_error_type("void main() { float weights[3]; weights[3] = 0.5; }"),
        ErrorType::Type
    );
    assert_eq!(
        first_error_type("void main() { float a[2]; a[-1] = 1.0; }"),
        ErrorType::Type
    );
    assert_eq!(
        first_error_type("void main() { vec3 v; float x = v[-(1)]; }"),
        ErrorType::Type
    );
}

#[test]
fn negated_literals_fold_to_constants() {
    let output = lower_glsl("void main() { int i = -3; float f = -0.5; gl_FragDepth = f * float(i); }");
    let main = function(&output, "main");

    let initializers: Vec<&HirExpressionKind> = main
        .body
        .as_ref()
        .expect("main is defined")
        .iter()
        .filter_map(|statement| match &statement.kind {
            HirStatementKind::Declare {
                initializer: Some(value),
                ..
            } => Some(&value.kind),
            _ => None,
        })
        .collect();

    assert!(matches!(initializers[0], HirExpressionKind::Int(-3)));
    assert!(matches!(initializers[1], HirExpressionKind::Float(value) if *value == -0.5));
}

#[test]
fn constructor_component_counts() {
    lower_glsl("void main() { vec4 a = vec4(vec2(1.0), 0.0, 1.0); mat2 m = mat2(1.0); gl_FragColor = a * m[0].x; }");

    // Too few
    assert_eq!(
        first_error_type("void main() { vec4 a = vec4(vec2(1.0), 0.0); }"),
        ErrorType::Type
    );
    // An argument left over
    assert_eq!(
        first_error_type("void main() { vec3 a = vec3(vec2(1.0), vec2(1.0), 1.0); }"),
        ErrorType::Type
    );
}

#[test]
fn struct_constructor_checks_members() {
    lower_glsl(
        "struct Light { vec3 pos; float intensity; };
         void main() { Light l = Light(vec3(0.0), 1); gl_FragDepth = l.intensity; }",
    );

    assert_eq!(
        first_error_type(
            "struct Light { vec3 pos; float intensity; }; void main() { Light l = Light(vec3(0.0)); }"
        ),
        ErrorType::Type
    );
}

#[test]
fn intrinsics_are_typed_by_shape() {
    let output = lower_glsl(
        "void main() { vec3 n = normalize(vec3(1.0)); float d = dot(n, n); float a = atan(d, 1.0); gl_FragColor = vec4(n, d + a); }",
    );

    let body = function(&output, "main").body.as_ref().expect("defined");
    let HirStatementKind::Declare {
        initializer: Some(dot),
        ..
    } = &body[1].kind
    else {
        panic!("expected a declaration");
    };
    assert_eq!(dot.data_type, DataType::FLOAT);

    let HirStatementKind::Declare {
        initializer: Some(atan),
        ..
    } = &body[2].kind
    else {
        panic!("expected a declaration");
    };
    assert!(matches!(
        atan.kind,
        HirExpressionKind::Intrinsic {
            intrinsic: Intrinsic::Atan2,
            ..
        }
    ));
}

#[test]
fn intrinsic_arity_is_checked() {
    assert_eq!(
        first_error_type("void main() { vec3 n = normalize(vec3(1.0), 2.0); }"),
        ErrorType::Type
    );
}

#[test]
fn geometry_intrinsics_need_the_geometry_stage() {
    let messages = lowering_errors("void main() { EmitVertex(); }", ShadingLanguage::Glsl);
    assert_eq!(messages.errors[0].error_type, ErrorType::Rule);

    let output = lower_with(
        "void main() { gl_Position = vec4(0.0); EmitVertex(); EndPrimitive(); }",
        ShadingLanguage::Glsl,
        ShaderStage::Geometry,
        &TranslatorConfig::default(),
    );
    assert!(output.is_ok());
}

#[test]
fn loop_control_outside_a_loop_is_rejected() {
    assert_eq!(first_error_type("void main() { break; }"), ErrorType::Rule);
    assert_eq!(
        first_error_type("void main() { if (true) { continue; } }"),
        ErrorType::Rule
    );

    lower_glsl(
        "void main() { for (int i = 0; i < 4; i++) { if (i == 2) { continue; } if (i == 3) break; } }",
    );
}

#[test]
fn discard_is_pixel_only() {
    let messages = lowering_errors_in(
        "void main() { discard; }",
        ShadingLanguage::Glsl,
        ShaderStage::Vertex,
    );
    assert_eq!(messages.errors[0].error_type, ErrorType::Rule);

    lower_glsl("void main() { if (gl_FragCoord.x > 0.5) discard; }");
}

#[test]
fn for_loops_scope_their_counter() {
    let output = lower_glsl(
        "void main() { for (int i = 0; i < 2; ++i) { } for (int i = 0; i < 2; ++i) { } }",
    );

    // Each loop gets its own slot for `i`
    let main = function(&output, "main");
    assert_eq!(main.locals.len(), 2);

    let body = main.body.as_ref().expect("defined");
    let HirStatementKind::Block(statements) = &body[0].kind else {
        panic!("a for loop lowers to a block");
    };
    assert!(matches!(
        statements[1].kind,
        HirStatementKind::Loop {
            check_first: true,
            step: Some(_),
            ..
        }
    ));
}

#[test]
fn conditions_must_be_bool() {
    assert_eq!(
        first_error_type("void main() { if (1) { } }"),
        ErrorType::Type
    );
    assert_eq!(
        first_error_type("void main() { while (1.0) { } }"),
        ErrorType::Type
    );
}

#[test]
fn return_values_are_checked() {
    assert_eq!(
        first_error_type("void main() { return 1.0; }"),
        ErrorType::Type
    );
    assert_eq!(
        first_error_type("float f() { return; } void main() { f(); }"),
        ErrorType::Type
    );
}

#[test]
fn duplicate_locals() {
    assert_eq!(
        first_error_type("void main() { float x; float x; }"),
        ErrorType::DuplicateDefinition
    );
    assert_eq!(
        first_error_type("void f(float x) { float x = 1.0; } void main() { f(1.0); }"),
        ErrorType::DuplicateDefinition
    );

    // Inner scopes may shadow
    let output = lower_glsl("void main() { float x = 1.0; { float x = 2.0; gl_FragDepth = x; } gl_FragDepth = x; }");
    assert_eq!(function(&output, "main").locals.len(), 2);
}

#[test]
fn duplicate_unit_names() {
    assert_eq!(
        first_error_type("uniform float a; uniform vec2 a; void main() { }"),
        ErrorType::DuplicateDefinition
    );
    assert_eq!(
        first_error_type("struct S { float a; }; float S; void main() { }"),
        ErrorType::DuplicateDefinition
    );
    assert_eq!(
        first_error_type("void main() { } void main() { }"),
        ErrorType::DuplicateDefinition
    );
    assert_eq!(
        first_error_type("float f(float x) { return x; } float f(int x) { return 1.0; } void main() { }"),
        ErrorType::DuplicateDefinition
    );
    assert_eq!(
        first_error_type("float normalize(float x) { return x; } void main() { }"),
        ErrorType::DuplicateDefinition
    );
}

#[test]
fn reserved_prefix_is_rejected() {
    assert_eq!(
        first_error_type("uniform float gl_Mine; void main() { }"),
        ErrorType::Rule
    );
}

#[test]
fn warnings_for_unused_shadowing_and_missing_returns() {
    let output = lower_glsl(
        "uniform float time;
         float f(float x) { if (x > 0.0) { return x; } }
         void main() { float unused; float time = 1.0; gl_FragDepth = f(time); }",
    );

    let kinds: Vec<WarningKind> = output.warnings.iter().map(|w| w.warning_kind).collect();
    assert!(kinds.contains(&WarningKind::MissingReturn));
    assert!(kinds.contains(&WarningKind::UnusedVariable));
    assert!(kinds.contains(&WarningKind::ShadowedGlobal));
    assert!(function(&output, "f").missing_return);
}

#[test]
fn warnings_can_be_disabled() {
    let config = TranslatorConfig {
        warnings_enabled: false,
        ..TranslatorConfig::default()
    };
    let output = lower_with(
        "void main() { float unused; }",
        ShadingLanguage::Glsl,
        ShaderStage::Pixel,
        &config,
    )
    .expect("should lower");
    assert!(output.warnings.is_empty());
}

#[test]
fn errors_are_collected_per_declaration() {
    let messages = lowering_errors(
        "void a() { foo(); } void b() { int x = 1.5; } void main() { }",
        ShadingLanguage::Glsl,
    );
    assert_eq!(messages.errors.len(), 2);
    assert_eq!(messages.errors[0].error_type, ErrorType::UnresolvedSymbol);
    assert_eq!(messages.errors[1].error_type, ErrorType::Type);
}

#[test]
fn max_errors_caps_the_report() {
    let config = TranslatorConfig {
        max_errors: 1,
        ..TranslatorConfig::default()
    };
    let Err(messages) = lower_with(
        "void a() { foo(); } void b() { bar(); } void main() { }",
        ShadingLanguage::Glsl,
        ShaderStage::Pixel,
        &config,
    ) else {
        panic!("expected errors");
    };
    assert_eq!(messages.errors.len(), 1);
}

#[test]
fn global_storage_rules() {
    // attribute is vertex only
    assert_eq!(
        first_error_type("attribute vec3 position; void main() { }"),
        ErrorType::Rule
    );
    // const needs a value
    assert_eq!(
        first_error_type("const float k; void main() { }"),
        ErrorType::Rule
    );
    // uniforms can't be initialised
    assert_eq!(
        first_error_type("uniform float k = 1.0; void main() { }"),
        ErrorType::Rule
    );
    // samplers must be uniforms
    assert_eq!(
        first_error_type("sampler2D tex; void main() { }"),
        ErrorType::Rule
    );
}

#[test]
fn hlsl_semantics_are_recorded() {
    let output = lower_with(
        "struct VSOut { float4 pos : SV_Position; float2 uv : TEXCOORD0; };
         VSOut main(float3 position : POSITION) {
             VSOut o;
             o.pos = float4(position, 1.0);
             o.uv = position.xy;
             return o;
         }",
        ShadingLanguage::Hlsl,
        ShaderStage::Vertex,
        &TranslatorConfig::default(),
    )
    .expect("should lower");

    let main = function(&output, "main");
    assert_eq!(main.signature.parameters[0].semantic.as_deref(), Some("POSITION"));
    assert_eq!(
        output.module.structures[0].members[0].semantic.as_deref(),
        Some("SV_Position")
    );
}

#[test]
fn hlsl_mul_follows_matrix_rules() {
    let output = lower_with(
        "float4x4 world;
         float4 main(float4 position : POSITION) : SV_Position { return mul(world, position); }",
        ShadingLanguage::Hlsl,
        ShaderStage::Vertex,
        &TranslatorConfig::default(),
    )
    .expect("should lower");

    let body = function(&output, "main").body.as_ref().expect("defined");
    let HirStatementKind::Return(Some(value)) = &body[0].kind else {
        panic!("expected a return");
    };
    assert_eq!(value.data_type, DataType::float_vector(4));
}

#[test]
fn cbuffer_members_remember_their_buffer() {
    let source = "cbuffer PerFrame : register(b0) { float4x4 view; float time; }\n\
                  cbuffer Tint { float3 color; };\n\
                  static float scale = 2.0;\n\
                  void main() { }";
    let output = lower_with(
        source,
        ShadingLanguage::Hlsl,
        ShaderStage::Pixel,
        &TranslatorConfig::default(),
    )
    .expect("cbuffers should lower");
    let globals = &output.module.globals;

    assert_eq!(globals.len(), 4);
    let view = globals[0].variable.buffer.as_ref().expect("view is in PerFrame");
    assert_eq!(view.name, "PerFrame");
    assert_eq!(view.register.as_deref(), Some("b0"));
    assert_eq!(globals[1].variable.buffer, globals[0].variable.buffer);

    let color = globals[2].variable.buffer.as_ref().expect("color is in Tint");
    assert_eq!(color.name, "Tint");
    assert_eq!(color.register, None);
    assert_eq!(globals[3].variable.buffer, None);
}

#[test]
fn locals_hide_functions_with_the_same_name() {
    let messages = lowering_errors(
        "void f() { } void main() { int f = 1; f(); }",
        ShadingLanguage::Glsl,
    );
    assert_eq!(messages.errors[0].error_type, ErrorType::Type);
    assert!(messages.errors[0].msg.contains("'f'"));

    // Parameters hide intrinsics too
    assert_eq!(
        first_error_type("float g(float length) { return length(vec2(length)); } void main() { }"),
        ErrorType::Type
    );

    // Once the local's scope ends the function is visible again
    lower_glsl("void f() { } void main() { { int f = 1; f += 1; } f(); }");
}
