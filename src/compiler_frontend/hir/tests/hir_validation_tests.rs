use super::hir_test_support::{first_error_type, function, lower_glsl, lowering_errors};
use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::dialect::ShadingLanguage;

#[test]
fn prototype_reserves_the_registry_slot() {
    let output = lower_glsl(
        "float helper(float x);
         void main() { gl_FragDepth = helper(1.0); }
         float helper(float x) { return x * 0.5; }",
    );

    let functions = &output.module.functions;
    assert_eq!(functions.len(), 2);
    assert_eq!(functions[0].signature.name, "helper");
    assert_eq!(functions[1].signature.name, "main");
    assert!(function(&output, "helper").body.is_some());
}

#[test]
fn prototype_parameter_names_can_differ() {
    let output = lower_glsl(
        "float helper(float);
         float helper(float amount) { return amount; }
         void main() { gl_FragDepth = helper(1.0); }",
    );
    assert_eq!(
        function(&output, "helper").signature.parameters[0].name,
        "amount"
    );
}

#[test]
fn undefined_prototype_is_unresolved() {
    let messages = lowering_errors(
        "float helper(float x); void main() { gl_FragDepth = helper(1.0); }",
        ShadingLanguage::Glsl,
    );
    assert_eq!(messages.errors.len(), 1);
    assert_eq!(messages.errors[0].error_type, ErrorType::UnresolvedSymbol);
    assert!(messages.errors[0].msg.contains("helper"));
}

#[test]
fn prototype_mismatch_is_a_duplicate() {
    assert_eq!(
        first_error_type("float helper(float x); int helper(float x) { return 1; } void main() { }"),
        ErrorType::DuplicateDefinition
    );
}

#[test]
fn direct_recursion_is_rejected() {
    let messages = lowering_errors(
        "float f(float x) { return f(x); } void main() { gl_FragDepth = f(1.0); }",
        ShadingLanguage::Glsl,
    );
    assert_eq!(messages.errors[0].error_type, ErrorType::Rule);
    assert!(messages.errors[0].msg.contains("calls itself"));
}

#[test]
fn mutual_recursion_through_a_prototype_is_rejected() {
    assert_eq!(
        first_error_type(
            "float b(float x);
             float a(float x) { return b(x); }
             float b(float x) { return a(x); }
             void main() { gl_FragDepth = a(1.0); }"
        ),
        ErrorType::Rule
    );
}

#[test]
fn shared_callees_are_not_cycles() {
    lower_glsl(
        "float leaf(float x) { return x; }
         float left(float x) { return leaf(x); }
         float right(float x) { return leaf(x) + left(x); }
         void main() { gl_FragDepth = left(1.0) + right(2.0); }",
    );
}
