use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use serde::Serialize;
use std::collections::HashMap;

// The final set of errors and warnings emitted from one translation
#[derive(Clone, Debug, Default, Serialize)]
pub struct CompilerMessages {
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerWarning>,
}

impl CompilerMessages {
    pub fn new() -> Self {
        CompilerMessages {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn from_error(error: CompilerError) -> Self {
        CompilerMessages {
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True if any error is of the given type.
    pub fn contains(&self, error_type: ErrorType) -> bool {
        self.errors.iter().any(|error| error.error_type == error_type)
    }

    /// Structured form for tools (debugger front ends, editors) that consume diagnostics.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum ErrorMetaDataKey {
    VariableName,
    CompilationStage,

    // Optional suggestions
    PrimarySuggestion,    // One-line fix or top-level idea
    SuggestedReplacement, // Text that could replace the offending code
    SuggestedInsertion,   // Text that could be inserted

    // Data type information
    ExpectedType,
    FoundType,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompilerError {
    pub msg: String,
    pub location: TextLocation,
    pub error_type: ErrorType,

    // For more structured error messages and tooling
    pub metadata: HashMap<ErrorMetaDataKey, String>,
}

impl CompilerError {
    pub fn new(msg: impl Into<String>, location: TextLocation, error_type: ErrorType) -> Self {
        CompilerError {
            msg: msg.into(),
            location,
            error_type,
            metadata: HashMap::new(),
        }
    }

    pub fn with_error_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = error_type;
        self
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: impl Into<String>) {
        self.metadata.insert(key, value.into());
    }

    pub fn with_metadata(mut self, key: ErrorMetaDataKey, value: impl Into<String>) -> Self {
        self.new_metadata_entry(key, value);
        self
    }

    /// Create a compiler error (internal bug, not the shader author's fault)
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, TextLocation::default(), ErrorType::Compiler)
    }
}

/// What kind of problem stopped the translation.
/// The first six mirror the failure taxonomy callers are expected to branch on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum ErrorType {
    Lexical,
    Syntax,
    UnresolvedSymbol,
    Type,
    DuplicateDefinition,
    EntryPointNotFound,
    UnsupportedStage,
    Rule,
    Config,
    Compiler,
}

pub fn error_type_to_str(e_type: ErrorType) -> &'static str {
    match e_type {
        ErrorType::Lexical => "Lexical Error",
        ErrorType::Syntax => "Syntax Error",
        ErrorType::UnresolvedSymbol => "Unresolved Symbol",
        ErrorType::Type => "Type Mismatch",
        ErrorType::DuplicateDefinition => "Duplicate Definition",
        ErrorType::EntryPointNotFound => "Entry Point Not Found",
        ErrorType::UnsupportedStage => "Unsupported Shader Stage",
        ErrorType::Rule => "Language Rule Violation",
        ErrorType::Config => "Malformed Config",
        ErrorType::Compiler => "Translator Bug",
    }
}

/// Builds a CompilerError with an optional metadata map.
/// Shared by the `return_*_error!` macros below.
#[doc(hidden)]
#[macro_export]
macro_rules! new_compiler_error {
    ($error_type:ident, $msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        $crate::compiler_frontend::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::$error_type,
            metadata: {
                #[allow(unused_mut)]
                let mut map = std::collections::HashMap::new();
                $(
                    map.insert(
                        $crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key,
                        ($value).to_string(),
                    );
                )*
                map
            },
        }
    };
}

/// Returns a new CompilerError for malformed characters, numbers and comments.
///
/// Usage: `return_lexical_error!("message", location, { PrimarySuggestion => "..." })`;
#[macro_export]
macro_rules! return_lexical_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::new_compiler_error!(Lexical, $msg, $location, { $( $key => $value ),* }))
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::new_compiler_error!(Lexical, $msg, $location, {}))
    };
}

/// Returns a new CompilerError for syntax violations.
///
/// Syntax errors indicate token sequences the dialect grammar does not accept.
/// Include a suggestion when the fix is obvious (a missing semicolon, a missing brace).
///
/// Usage:
/// `return_syntax_error!("message", location, {
///     CompilationStage => "Parsing",
///     SuggestedInsertion => ";",
/// })`;
#[macro_export]
macro_rules! return_syntax_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::new_compiler_error!(Syntax, $msg, $location, { $( $key => $value ),* }))
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::new_compiler_error!(Syntax, $msg, $location, {}))
    };
}

/// Returns a new CompilerError for type system violations.
/// Should mention both expected and found types.
///
/// Usage: `return_type_error!("Cannot add x and y", location, { ExpectedType => "float", FoundType => "bool" })`;
#[macro_export]
macro_rules! return_type_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::new_compiler_error!(Type, $msg, $location, { $( $key => $value ),* }))
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::new_compiler_error!(Type, $msg, $location, {}))
    };
}

/// Returns a new CompilerError for identifiers that don't name anything in scope.
#[macro_export]
macro_rules! return_unresolved_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::new_compiler_error!(UnresolvedSymbol, $msg, $location, { $( $key => $value ),* }))
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::new_compiler_error!(UnresolvedSymbol, $msg, $location, {}))
    };
}

/// Returns a new CompilerError for a second declaration of an existing name.
#[macro_export]
macro_rules! return_duplicate_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::new_compiler_error!(DuplicateDefinition, $msg, $location, { $( $key => $value ),* }))
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::new_compiler_error!(DuplicateDefinition, $msg, $location, {}))
    };
}

/// Returns a new CompilerError for semantic rule violations.
///
/// Rule errors are valid syntax used in a way the dialect forbids:
/// writing to a uniform, `break` outside a loop, recursion.
#[macro_export]
macro_rules! return_rule_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::new_compiler_error!(Rule, $msg, $location, { $( $key => $value ),* }))
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::new_compiler_error!(Rule, $msg, $location, {}))
    };
}

/// Returns a new CompilerError for internal translator bugs.
/// These are never the shader author's fault.
#[macro_export]
macro_rules! return_compiler_error {
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::compiler_error(
            format!($fmt, $($arg),+),
        ));
    }};
    ($msg:expr) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::compiler_error($msg));
    }};
}
