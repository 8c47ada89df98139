use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::dialect::ShadingLanguage;
use crate::compiler_frontend::string_interning::StringTable;
use crate::compiler_frontend::tokenizer::tokens::{ShaderTokens, Token, TokenKind, TokenStream};
use crate::{return_lexical_error, settings, token_log};

#[macro_export]
macro_rules! return_token {
    ($kind:expr, $stream:expr $(,)?) => {
        return Ok(Some(Token::new($kind, $stream.new_location())))
    };
}

/// Preprocessor lines the translator can safely step over.
const SKIPPED_DIRECTIVES: [&str; 3] = ["version", "extension", "line"];

pub struct Tokenized {
    pub tokens: ShaderTokens,
    pub warnings: Vec<CompilerWarning>,
}

pub fn tokenize(
    source_code: &str,
    language: ShadingLanguage,
    string_table: &mut StringTable,
) -> Result<Tokenized, CompilerError> {
    let initial_capacity = source_code.len() / settings::SRC_TO_TOKEN_RATIO;

    let mut tokens: Vec<Token> = Vec::with_capacity(initial_capacity);
    let mut warnings = Vec::new();
    let mut stream = TokenStream::new(source_code);

    loop {
        match get_token_kind(&mut stream, language, string_table, &mut warnings)? {
            Some(token) => {
                token_log!(#token.kind);
                tokens.push(token);
            }
            None => break,
        }
    }

    stream.update_start_position();
    tokens.push(Token::new(TokenKind::Eof, stream.new_location()));

    Ok(Tokenized {
        tokens: ShaderTokens::new(tokens),
        warnings,
    })
}

/// Returns the next token, or None at the end of the source.
pub fn get_token_kind(
    stream: &mut TokenStream,
    language: ShadingLanguage,
    string_table: &mut StringTable,
    warnings: &mut Vec<CompilerWarning>,
) -> Result<Option<Token>, CompilerError> {
    skip_trivia(stream, warnings)?;

    // To ignore leading whitespace for the next token position
    stream.update_start_position();

    let current_char = match stream.next() {
        Some(ch) => ch,
        None => return Ok(None),
    };

    if current_char.is_ascii_alphabetic() || current_char == '_' {
        let mut word = String::from(current_char);
        while let Some(&ch) = stream.peek() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            word.push(ch);
            stream.next();
        }

        if let Some(keyword) = language.keyword(&word) {
            return_token!(keyword, stream);
        }

        return_token!(TokenKind::Symbol(string_table.intern(&word)), stream);
    }

    if current_char.is_ascii_digit()
        || (current_char == '.' && stream.peek().is_some_and(|ch| ch.is_ascii_digit()))
    {
        let kind = tokenize_number(current_char, stream)?;
        return_token!(kind, stream);
    }

    match current_char {
        '(' => return_token!(TokenKind::OpenParenthesis, stream),
        ')' => return_token!(TokenKind::CloseParenthesis, stream),
        '{' => return_token!(TokenKind::OpenCurly, stream),
        '}' => return_token!(TokenKind::CloseCurly, stream),
        '[' => return_token!(TokenKind::OpenBracket, stream),
        ']' => return_token!(TokenKind::CloseBracket, stream),
        ';' => return_token!(TokenKind::Semicolon, stream),
        ',' => return_token!(TokenKind::Comma, stream),
        '.' => return_token!(TokenKind::Dot, stream),
        ':' => return_token!(TokenKind::Colon, stream),
        '?' => return_token!(TokenKind::QuestionMark, stream),

        '+' => {
            if stream.next_if_eq('+') {
                return_token!(TokenKind::Increment, stream);
            }
            if stream.next_if_eq('=') {
                return_token!(TokenKind::AddAssign, stream);
            }
            return_token!(TokenKind::Add, stream);
        }

        '-' => {
            if stream.next_if_eq('-') {
                return_token!(TokenKind::Decrement, stream);
            }
            if stream.next_if_eq('=') {
                return_token!(TokenKind::SubtractAssign, stream);
            }
            return_token!(TokenKind::Subtract, stream);
        }

        '*' => {
            if stream.next_if_eq('=') {
                return_token!(TokenKind::MultiplyAssign, stream);
            }
            return_token!(TokenKind::Multiply, stream);
        }

        // Comments were already skipped as trivia
        '/' => {
            if stream.next_if_eq('=') {
                return_token!(TokenKind::DivideAssign, stream);
            }
            return_token!(TokenKind::Divide, stream);
        }

        '%' => {
            if stream.next_if_eq('=') {
                return_token!(TokenKind::ModulusAssign, stream);
            }
            return_token!(TokenKind::Modulus, stream);
        }

        '=' => {
            if stream.next_if_eq('=') {
                return_token!(TokenKind::Equal, stream);
            }
            return_token!(TokenKind::Assign, stream);
        }

        '!' => {
            if stream.next_if_eq('=') {
                return_token!(TokenKind::NotEqual, stream);
            }
            return_token!(TokenKind::Not, stream);
        }

        '<' => {
            if stream.next_if_eq('=') {
                return_token!(TokenKind::LessThanOrEqual, stream);
            }
            if stream.peek() == Some(&'<') {
                return unsupported_bitwise_operator(stream);
            }
            return_token!(TokenKind::LessThan, stream);
        }

        '>' => {
            if stream.next_if_eq('=') {
                return_token!(TokenKind::GreaterThanOrEqual, stream);
            }
            if stream.peek() == Some(&'>') {
                return unsupported_bitwise_operator(stream);
            }
            return_token!(TokenKind::GreaterThan, stream);
        }

        '&' => {
            if stream.next_if_eq('&') {
                return_token!(TokenKind::And, stream);
            }
            unsupported_bitwise_operator(stream)
        }

        '|' => {
            if stream.next_if_eq('|') {
                return_token!(TokenKind::Or, stream);
            }
            unsupported_bitwise_operator(stream)
        }

        '^' | '~' => unsupported_bitwise_operator(stream),

        _ => {
            return_lexical_error!(
                format!("Unexpected character '{current_char}' in shader source"),
                stream.new_location(),
                {
                    CompilationStage => "Tokenization",
                }
            )
        }
    }
}

/// Whitespace, comments and preprocessor lines.
fn skip_trivia(
    stream: &mut TokenStream,
    warnings: &mut Vec<CompilerWarning>,
) -> Result<(), CompilerError> {
    // Directives must be the first thing on their line
    let mut at_line_start = stream.position.char_column == 0;

    loop {
        let Some(&ch) = stream.peek() else {
            return Ok(());
        };

        if ch == '\n' {
            stream.next();
            at_line_start = true;
            continue;
        }

        if ch.is_whitespace() {
            stream.next();
            continue;
        }

        if ch == '#' && at_line_start {
            skip_directive(stream, warnings)?;
            continue;
        }

        if ch != '/' {
            return Ok(());
        }

        // Could be a comment, or a divide operator
        let mut lookahead = stream.chars.clone();
        lookahead.next();
        match lookahead.peek() {
            Some('/') => {
                while let Some(&ch) = stream.peek() {
                    if ch == '\n' {
                        break;
                    }
                    stream.next();
                }
            }

            Some('*') => {
                stream.update_start_position();
                stream.next();
                stream.next();

                let mut previous = '\0';
                let mut closed = false;
                while let Some(ch) = stream.next() {
                    if previous == '*' && ch == '/' {
                        closed = true;
                        break;
                    }
                    previous = ch;
                }

                if !closed {
                    return_lexical_error!(
                        "Unterminated block comment - missing closing '*/'",
                        stream.new_location(),
                        {
                            CompilationStage => "Tokenization",
                            SuggestedInsertion => "*/",
                        }
                    )
                }
            }

            _ => return Ok(()),
        }
    }
}

fn skip_directive(
    stream: &mut TokenStream,
    warnings: &mut Vec<CompilerWarning>,
) -> Result<(), CompilerError> {
    stream.update_start_position();
    stream.next();

    while stream.peek().is_some_and(|ch| *ch == ' ' || *ch == '\t') {
        stream.next();
    }

    let mut directive = String::new();
    while let Some(&ch) = stream.peek() {
        if !ch.is_ascii_alphabetic() {
            break;
        }
        directive.push(ch);
        stream.next();
    }

    let is_pragma = directive == "pragma";
    if !is_pragma && !SKIPPED_DIRECTIVES.contains(&directive.as_str()) {
        return_lexical_error!(
            format!("Preprocessor directive '#{directive}' is not supported"),
            stream.new_location(),
            {
                CompilationStage => "Tokenization",
                PrimarySuggestion => "Run the shader through a preprocessor before translating it",
            }
        )
    }

    while let Some(&ch) = stream.peek() {
        if ch == '\n' {
            break;
        }
        stream.next();
    }

    if is_pragma {
        warnings.push(CompilerWarning::new(
            "#pragma has no effect on translation",
            stream.new_location(),
            WarningKind::IgnoredDirective,
        ));
    }

    Ok(())
}

fn tokenize_number(first_char: char, stream: &mut TokenStream) -> Result<TokenKind, CompilerError> {
    let mut digits = String::from(first_char);

    // Hexadecimal integers
    if first_char == '0' && matches!(stream.peek(), Some('x') | Some('X')) {
        stream.next();
        digits.clear();
        while let Some(&ch) = stream.peek() {
            if !ch.is_ascii_hexdigit() {
                break;
            }
            digits.push(ch);
            stream.next();
        }
        stream.next_if_eq('u');
        stream.next_if_eq('U');

        return match u32::from_str_radix(&digits, 16) {
            Ok(value) => Ok(TokenKind::IntLiteral(value as i64)),
            Err(_) => invalid_number(&format!("0x{digits}"), stream),
        };
    }

    let mut is_float = first_char == '.';

    while let Some(&ch) = stream.peek() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if ch == '.' && !is_float {
            is_float = true;
            digits.push(ch);
        } else {
            break;
        }
        stream.next();
    }

    // Exponent
    if matches!(stream.peek(), Some('e') | Some('E')) {
        is_float = true;
        digits.push('e');
        stream.next();

        if let Some(&sign) = stream.peek()
            && (sign == '+' || sign == '-')
        {
            digits.push(sign);
            stream.next();
        }

        let mut has_exponent_digits = false;
        while let Some(&ch) = stream.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            has_exponent_digits = true;
            digits.push(ch);
            stream.next();
        }

        if !has_exponent_digits {
            return invalid_number(&digits, stream);
        }
    }

    let mut is_unsigned = false;
    if matches!(stream.peek(), Some('f') | Some('F')) {
        is_float = true;
        stream.next();
    } else if !is_float && matches!(stream.peek(), Some('u') | Some('U')) {
        is_unsigned = true;
        stream.next();
    }

    if stream.peek().is_some_and(|ch| ch.is_ascii_alphanumeric() || *ch == '_') {
        while stream.peek().is_some_and(|ch| ch.is_ascii_alphanumeric() || *ch == '_') {
            if let Some(ch) = stream.next() {
                digits.push(ch);
            }
        }
        return invalid_number(&digits, stream);
    }

    if is_float {
        return match digits.parse::<f64>() {
            Ok(value) => Ok(TokenKind::FloatLiteral(value)),
            Err(_) => invalid_number(&digits, stream),
        };
    }

    if is_unsigned {
        return match digits.parse::<u32>() {
            Ok(value) => Ok(TokenKind::IntLiteral(value as i64)),
            Err(_) => invalid_number(&digits, stream),
        };
    }

    // Only unsigned constants may use the top bit, a plain decimal has to fit an int
    match digits.parse::<i32>() {
        Ok(value) => Ok(TokenKind::IntLiteral(value as i64)),
        Err(_) => {
            return_lexical_error!(
                format!("Integer literal '{digits}' does not fit in a 32 bit int"),
                stream.new_location(),
                {
                    CompilationStage => "Tokenization",
                    PrimarySuggestion => "Add a 'u' suffix for an unsigned constant",
                }
            )
        }
    }
}

fn invalid_number(text: &str, stream: &mut TokenStream) -> Result<TokenKind, CompilerError> {
    return_lexical_error!(
        format!("Invalid numeric literal '{text}'"),
        stream.new_location(),
        {
            CompilationStage => "Tokenization",
        }
    )
}

fn unsupported_bitwise_operator(stream: &mut TokenStream) -> Result<Option<Token>, CompilerError> {
    return_lexical_error!(
        "Bitwise operators are not supported by the translator",
        stream.new_location(),
        {
            CompilationStage => "Tokenization",
        }
    )
}

#[cfg(test)]
#[path = "tests/tokenizer_tests.rs"]
mod tokenizer_tests;
