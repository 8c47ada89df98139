use super::*;
use crate::compiler_frontend::compiler_errors::ErrorType;

fn token_kinds(source: &str, language: ShadingLanguage) -> (Vec<TokenKind>, StringTable) {
    let mut string_table = StringTable::new();
    let tokenized =
        tokenize(source, language, &mut string_table).expect("tokenization should succeed");

    let kinds = tokenized
        .tokens
        .tokens
        .into_iter()
        .map(|token| token.kind)
        .collect();
    (kinds, string_table)
}

fn lexical_error(source: &str) -> CompilerError {
    let mut string_table = StringTable::new();
    match tokenize(source, ShadingLanguage::Glsl, &mut string_table) {
        Ok(_) => panic!("expected a lexical error for {source:?}"),
        Err(error) => error,
    }
}

#[test]
fn struct_declaration_tokens() {
    let (kinds, table) = token_kinds("struct Light { vec3 pos; };", ShadingLanguage::Glsl);

    assert_eq!(kinds.len(), 9);
    assert_eq!(kinds[0], TokenKind::Struct);
    assert_eq!(kinds[1].get_name(&table), "Light");
    assert_eq!(kinds[2], TokenKind::OpenCurly);
    assert_eq!(kinds[3].get_name(&table), "vec3");
    assert_eq!(kinds[4].get_name(&table), "pos");
    assert_eq!(kinds[5], TokenKind::Semicolon);
    assert_eq!(kinds[6], TokenKind::CloseCurly);
    assert_eq!(kinds[7], TokenKind::Semicolon);
    assert_eq!(kinds[8], TokenKind::Eof);
}

#[test]
fn numeric_literals() {
    let (kinds, _) = token_kinds("1 0x1F 7u 1.5 .25 2. 1e3 3.0f 4f", ShadingLanguage::Glsl);

    assert_eq!(
        kinds,
        vec![
            TokenKind::IntLiteral(1),
            TokenKind::IntLiteral(31),
            TokenKind::IntLiteral(7),
            TokenKind::FloatLiteral(1.5),
            TokenKind::FloatLiteral(0.25),
            TokenKind::FloatLiteral(2.0),
            TokenKind::FloatLiteral(1000.0),
            TokenKind::FloatLiteral(3.0),
            TokenKind::FloatLiteral(4.0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn compound_operators_are_single_tokens() {
    let (kinds, _) = token_kinds("+= -= *= /= %= ++ -- == != <= >= && ||", ShadingLanguage::Glsl);

    assert_eq!(
        kinds,
        vec![
            TokenKind::AddAssign,
            TokenKind::SubtractAssign,
            TokenKind::MultiplyAssign,
            TokenKind::DivideAssign,
            TokenKind::ModulusAssign,
            TokenKind::Increment,
            TokenKind::Decrement,
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::LessThanOrEqual,
            TokenKind::GreaterThanOrEqual,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_are_skipped() {
    let source = "a // line comment\n/* block\ncomment */ b / c";
    let (kinds, table) = token_kinds(source, ShadingLanguage::Glsl);

    assert_eq!(kinds.len(), 5);
    assert_eq!(kinds[0].get_name(&table), "a");
    assert_eq!(kinds[1].get_name(&table), "b");
    assert_eq!(kinds[2], TokenKind::Divide);
    assert_eq!(kinds[3].get_name(&table), "c");
}

#[test]
fn known_directives_are_skipped() {
    let source = "#version 330 core\n#extension GL_foo : enable\n  #line 4\nvoid";
    let mut string_table = StringTable::new();
    let tokenized = tokenize(source, ShadingLanguage::Glsl, &mut string_table)
        .expect("tokenization should succeed");

    assert_eq!(tokenized.tokens.tokens.len(), 2);
    assert!(tokenized.warnings.is_empty());
}

#[test]
fn pragma_is_skipped_with_a_warning() {
    let mut string_table = StringTable::new();
    let tokenized = tokenize("#pragma optimize(off)\nvoid", ShadingLanguage::Glsl, &mut string_table)
        .expect("tokenization should succeed");

    assert_eq!(tokenized.warnings.len(), 1);
    assert_eq!(tokenized.warnings[0].warning_kind, WarningKind::IgnoredDirective);
}

#[test]
fn unsupported_directive_is_a_lexical_error() {
    let error = lexical_error("#define LIGHTS 4\nvoid main() {}");
    assert_eq!(error.error_type, ErrorType::Lexical);
    assert!(error.msg.contains("#define"));
}

#[test]
fn unterminated_block_comment_is_a_lexical_error() {
    let error = lexical_error("void main() { /* never closed");
    assert_eq!(error.error_type, ErrorType::Lexical);
}

#[test]
fn unknown_characters_and_bitwise_operators_are_rejected() {
    assert_eq!(lexical_error("int a = 1 @ 2;").error_type, ErrorType::Lexical);
    assert_eq!(lexical_error("int a = 1 & 2;").error_type, ErrorType::Lexical);
    assert_eq!(lexical_error("int a = 1 << 2;").error_type, ErrorType::Lexical);
    assert_eq!(lexical_error("int a = ~1;").error_type, ErrorType::Lexical);
}

#[test]
fn malformed_numbers_are_rejected() {
    assert_eq!(lexical_error("1e+").error_type, ErrorType::Lexical);
    assert_eq!(lexical_error("12abc").error_type, ErrorType::Lexical);
    assert_eq!(lexical_error("99999999999").error_type, ErrorType::Lexical);
}

#[test]
fn only_unsigned_literals_use_the_top_bit() {
    let error = lexical_error("int x = 3000000000;");
    assert_eq!(error.error_type, ErrorType::Lexical);
    assert!(error.msg.contains("3000000000"));
    assert_eq!(lexical_error("2147483648").error_type, ErrorType::Lexical);

    let (kinds, _) = token_kinds(
        "2147483647 3000000000u 0xFFFFFFFF 0x80000000u",
        ShadingLanguage::Glsl,
    );
    assert_eq!(
        kinds[..4],
        [
            TokenKind::IntLiteral(2147483647),
            TokenKind::IntLiteral(3000000000),
            TokenKind::IntLiteral(0xFFFF_FFFF),
            TokenKind::IntLiteral(0x8000_0000),
        ]
    );
}

#[test]
fn keywords_depend_on_the_dialect() {
    let (glsl, _) = token_kinds("varying cbuffer", ShadingLanguage::Glsl);
    assert_eq!(glsl[0], TokenKind::Varying);
    assert!(matches!(glsl[1], TokenKind::Symbol(_)));

    let (hlsl, _) = token_kinds("varying cbuffer", ShadingLanguage::Hlsl);
    assert!(matches!(hlsl[0], TokenKind::Symbol(_)));
    assert_eq!(hlsl[1], TokenKind::CBuffer);
}

#[test]
fn locations_track_lines_and_columns() {
    let mut string_table = StringTable::new();
    let tokenized = tokenize("void\n  main", ShadingLanguage::Glsl, &mut string_table)
        .expect("tokenization should succeed");

    let main = &tokenized.tokens.tokens[1];
    assert_eq!(main.location.start_pos.line_number, 1);
    assert_eq!(main.location.start_pos.char_column, 2);
    assert_eq!(main.location.line(), 2);
}
