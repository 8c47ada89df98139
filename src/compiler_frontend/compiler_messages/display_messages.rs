use crate::compiler_frontend::compiler_errors::{
    CompilerError, CompilerMessages, ErrorType, error_type_to_str,
};
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, warning_kind_to_str};
use saying::say;

/// Prints every error and warning, with the offending line pulled out of `source`.
pub fn print_compiler_messages(messages: &CompilerMessages, source: &str) {
    for err in &messages.errors {
        print_formatted_error(err, source);
    }

    for warning in &messages.warnings {
        print_formatted_warning(warning, source);
    }
}

pub fn print_formatted_error(e: &CompilerError, source: &str) {
    let line_number = e.location.start_pos.line_number as usize;

    match e.error_type {
        ErrorType::Compiler => {
            say!(Yellow "TRANSLATOR BUG - ");
            say!(Dark Yellow "translator developer skill issue (not your fault)");
        }

        ErrorType::Config => {
            say!(Yellow "CONFIG ISSUE - ", Red { e.msg.as_str() });
            return;
        }

        error_type => {
            say!(Red { error_type_to_str(error_type) });
            say!(Dark Magenta "Line ", Bright {line_number + 1});
        }
    }

    say!(Red { e.msg.as_str() });

    if let Some(suggestion) = e
        .metadata
        .get(&crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::PrimarySuggestion)
    {
        say!(Dark Yellow "Suggestion: ", { suggestion.as_str() });
    }

    print_source_underline(source, &e.location);
}

pub fn print_formatted_warning(w: &CompilerWarning, source: &str) {
    let line_number = w.location.start_pos.line_number as usize;

    say!(Yellow "WARNING: ", { warning_kind_to_str(w.warning_kind) });
    say!(Dark Magenta "Line ", Bright {line_number + 1});
    say!({ w.msg.as_str() });

    print_source_underline(source, &w.location);
}

fn print_source_underline(
    source: &str,
    location: &crate::compiler_frontend::tokenizer::tokens::TextLocation,
) {
    let line = source
        .lines()
        .nth(location.start_pos.line_number as usize)
        .unwrap_or_default();

    println!("\n{line}");

    // spaces before the relevant part of the line
    print!("{}", " ".repeat(location.start_pos.char_column.max(0) as usize));

    let length_of_underline = if location.end_pos.line_number == location.start_pos.line_number {
        (location.end_pos.char_column - location.start_pos.char_column).max(1) as usize
    } else {
        1
    };

    say!(Red { "^".repeat(length_of_underline) });
}
